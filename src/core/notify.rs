//! Change notification and dirty tracking.
//!
//! Every element holds a [`ChangeHandler`] handed to it by its owner. Handlers
//! created for nested elements are clones of the root's handler, so a mutation
//! at any depth reaches the top-level [`DirtyState`] in one call.
//! The handler only holds a weak reference to that state; elements never own
//! their root.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use glam::{Vec2, Vec3, Vec4};
use tracing::trace;

/// Callback invoked whenever an element's value actually changes.
#[derive(Clone, Default)]
pub struct ChangeHandler(Option<Rc<dyn Fn()>>);

impl ChangeHandler {
    /// Wrap a callback.
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Some(Rc::new(f)))
    }

    /// A handler that ignores notifications (detached elements).
    pub fn none() -> Self {
        Self(None)
    }

    /// Check if a callback is attached.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.0.is_some()
    }

    /// Fire the callback, if any.
    #[inline]
    pub fn notify(&self) {
        if let Some(f) = &self.0 {
            f();
        }
    }
}

// Handlers never affect element equality.
impl PartialEq for ChangeHandler {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for ChangeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_bound() {
            "ChangeHandler(bound)"
        } else {
            "ChangeHandler(none)"
        })
    }
}

/// Equality as seen on the wire.
///
/// Floats compare by bit pattern: rewriting the same NaN is a no-op, while
/// `0.0` and `-0.0` are different values.
pub trait BitEq {
    fn bit_eq(&self, other: &Self) -> bool;
}

macro_rules! bit_eq_by_value {
    ($($ty:ty),*) => {
        $(impl BitEq for $ty {
            #[inline]
            fn bit_eq(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

bit_eq_by_value!(bool, u8, i8, u16, i16, u32, i32, u64, String);

impl BitEq for f32 {
    #[inline]
    fn bit_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl BitEq for Vec2 {
    fn bit_eq(&self, other: &Self) -> bool {
        self.x.bit_eq(&other.x) && self.y.bit_eq(&other.y)
    }
}

impl BitEq for Vec3 {
    fn bit_eq(&self, other: &Self) -> bool {
        self.truncate().bit_eq(&other.truncate()) && self.z.bit_eq(&other.z)
    }
}

impl BitEq for Vec4 {
    fn bit_eq(&self, other: &Self) -> bool {
        self.truncate().bit_eq(&other.truncate()) && self.w.bit_eq(&other.w)
    }
}

/// Assign `value` to `slot` and notify, unless it already holds that value.
///
/// Returns true when the value changed.
pub fn update<T: BitEq>(slot: &mut T, value: T, handler: &ChangeHandler) -> bool {
    if slot.bit_eq(&value) {
        return false;
    }
    *slot = value;
    handler.notify();
    true
}

/// Root-side dirty flag plus cached encoded form.
#[derive(Debug, Default)]
pub struct DirtyState {
    dirty: Cell<bool>,
    changes: Cell<u64>,
    cache: RefCell<Option<Vec<u8>>>,
}

impl DirtyState {
    /// Create a clean state with no cached bytes.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Handler bound (weakly) to this state.
    pub fn handler(self: &Rc<Self>) -> ChangeHandler {
        let state: Weak<Self> = Rc::downgrade(self);
        ChangeHandler::new(move || {
            if let Some(state) = state.upgrade() {
                state.mark_dirty();
            }
        })
    }

    /// Record a mutation: set dirty and drop the cached buffer.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
        self.changes.set(self.changes.get() + 1);
        self.cache.borrow_mut().take();
        trace!(changes = self.changes.get(), "resource marked dirty");
    }

    /// Check if the cached encoding is stale.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Number of notifications received so far.
    #[inline]
    pub fn changes(&self) -> u64 {
        self.changes.get()
    }

    /// Cached bytes, if clean.
    pub fn cached(&self) -> Option<Vec<u8>> {
        if self.is_dirty() {
            return None;
        }
        self.cache.borrow().clone()
    }

    /// Store a fresh encoding and clear the dirty flag.
    pub fn store(&self, bytes: Vec<u8>) {
        *self.cache.borrow_mut() = Some(bytes);
        self.dirty.set(false);
    }
}

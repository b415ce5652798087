//! Element base traits.
//!
//! An element is any unit of resource state: a scalar record, a list, a
//! version-gated composite. Elements are created three ways (decoded,
//! built fresh, or rebound from a basis) and always through an
//! [`ElementContext`] supplied by their owner.

use std::fmt;

use super::ChangeHandler;
use crate::stream::Cursor;
use crate::util::{ReadOptions, Result};

/// What an owner hands to every element it creates.
///
/// Contexts never take part in element equality: two trees holding the same
/// values compare equal whatever their handlers or decode options.
#[derive(Clone, Debug, Default)]
pub struct ElementContext {
    version: u32,
    handler: ChangeHandler,
    options: ReadOptions,
}

impl ElementContext {
    /// Context for `version`, reporting changes to `handler`.
    pub fn new(version: u32, handler: ChangeHandler) -> Self {
        Self {
            version,
            handler,
            options: ReadOptions::default(),
        }
    }

    /// Context with no change handler.
    pub fn detached(version: u32) -> Self {
        Self::new(version, ChangeHandler::none())
    }

    /// Replace the decode options.
    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Same handler and options, different version.
    pub fn with_version(&self, version: u32) -> Self {
        Self {
            version,
            handler: self.handler.clone(),
            options: self.options,
        }
    }

    /// Format version elements created from this context inherit.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Update the version in place.
    #[inline]
    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    /// Change handler of the ultimate owner.
    #[inline]
    pub fn handler(&self) -> &ChangeHandler {
        &self.handler
    }

    /// Decode options.
    #[inline]
    pub fn options(&self) -> ReadOptions {
        self.options
    }

    /// Report a change to the owner.
    #[inline]
    pub fn notify(&self) {
        self.handler.notify();
    }
}

impl PartialEq for ElementContext {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// Lifecycle shared by every element.
pub trait Element: Sized + PartialEq + fmt::Debug {
    /// Build a default instance (list factories use this).
    fn fresh(ctx: &ElementContext) -> Self;

    /// Deep copy bound to a new owner. Every nested element must be rebound
    /// to `ctx`'s handler, never the original tree's.
    fn rebind(&self, ctx: &ElementContext) -> Self;

    /// Names of the fields currently readable on this element.
    fn field_names(&self) -> Vec<&'static str>;

    /// Adopt a new format version from the owner without notifying.
    /// Version-independent elements ignore it.
    fn set_inherited_version(&mut self, _version: u32) {}
}

/// Elements whose state sits behind notifying setters.
///
/// Only these can be borrowed mutably inside a [`DependentList`](super::DependentList);
/// plain values such as keys change through the list's own mutators.
pub trait Editable: Element {}

/// Elements with a self-contained wire form.
pub trait Codec: Element {
    /// Decode one element at the cursor.
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self>;

    /// Encode this element at the cursor.
    fn write(&self, cursor: &mut Cursor) -> Result<()>;
}

/// Elements whose sequences end with a designated terminal value instead of a count.
pub trait Terminated: Codec {
    /// Check if this value is the end-of-sequence marker.
    fn is_terminal(&self) -> bool;

    /// The end-of-sequence marker.
    fn terminal(ctx: &ElementContext) -> Self;
}

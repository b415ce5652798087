//! Dependent element container.
//!
//! An ordered list of elements sharing the owner's change handler. The
//! container has no dirty state of its own: structural changes notify the
//! owner, and element setters notify it directly through the same handler.

use std::fmt;
use std::ops::{Index, IndexMut};

use tracing::trace;

use super::{Codec, Editable, Element, ElementContext, Terminated};
use crate::stream::Cursor;
use crate::util::{Error, Result};

/// Width of a list count on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountWidth {
    U8,
    U16,
    U32,
}

impl CountWidth {
    /// Largest count this width can encode.
    pub const fn max(self) -> usize {
        match self {
            Self::U8 => u8::MAX as usize,
            Self::U16 => u16::MAX as usize,
            Self::U32 => u32::MAX as usize,
        }
    }

    /// Encoded size in bytes.
    pub const fn size(self) -> u64 {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Read a count.
    pub fn read(self, cursor: &mut Cursor) -> Result<usize> {
        Ok(match self {
            Self::U8 => cursor.read_u8()? as usize,
            Self::U16 => cursor.read_u16()? as usize,
            Self::U32 => cursor.read_u32()? as usize,
        })
    }

    /// Write a count, failing if it does not fit.
    pub fn write(self, cursor: &mut Cursor, count: usize) -> Result<()> {
        if count > self.max() {
            return Err(Error::CountOverflow {
                count,
                max: self.max(),
            });
        }
        match self {
            Self::U8 => cursor.write_u8(count as u8),
            Self::U16 => cursor.write_u16(count as u16),
            Self::U32 => cursor.write_u32(count as u32),
        }
    }
}

/// How a list's length is carried on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountMode {
    /// Count written immediately before the elements.
    Inline(CountWidth),
    /// Count written by the owner somewhere earlier in the stream.
    External(CountWidth),
    /// No count; the sequence ends with a terminal element.
    Terminated,
}

impl CountMode {
    fn limit(self) -> usize {
        match self {
            Self::Inline(w) | Self::External(w) => w.max(),
            Self::Terminated => usize::MAX,
        }
    }
}

/// Ordered list of elements bound to one owner.
pub struct DependentList<T> {
    ctx: ElementContext,
    mode: CountMode,
    max_count: Option<usize>,
    items: Vec<T>,
}

impl<T: Element> DependentList<T> {
    /// Empty list for `ctx`'s owner.
    pub fn new(ctx: &ElementContext, mode: CountMode) -> Self {
        Self {
            ctx: ctx.clone(),
            mode,
            max_count: None,
            items: Vec::new(),
        }
    }

    /// Cap the list below what the count width allows.
    pub fn with_max_count(mut self, max: usize) -> Self {
        self.max_count = Some(max);
        self
    }

    /// Count encoding.
    #[inline]
    pub fn mode(&self) -> CountMode {
        self.mode
    }

    /// Largest number of elements this list may hold.
    pub fn limit(&self) -> usize {
        match self.max_count {
            Some(max) => max.min(self.mode.limit()),
            None => self.mode.limit(),
        }
    }

    /// Context handed to contained elements.
    #[inline]
    pub fn context(&self) -> &ElementContext {
        &self.ctx
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn check_room(&self, extra: usize) -> Result<()> {
        let count = self.items.len() + extra;
        if count > self.limit() {
            return Err(Error::CountOverflow {
                count,
                max: self.limit(),
            });
        }
        Ok(())
    }

    /// Append a copy of `item` bound to this list's owner.
    pub fn push(&mut self, item: &T) -> Result<()> {
        self.check_room(1)?;
        self.items.push(item.rebind(&self.ctx));
        self.ctx.notify();
        Ok(())
    }

    /// Append a factory-built element and return it.
    pub fn add_default(&mut self) -> Result<&mut T> {
        self.check_room(1)?;
        self.items.push(T::fresh(&self.ctx));
        self.ctx.notify();
        let last = self.items.len() - 1;
        Ok(&mut self.items[last])
    }

    /// Insert a copy of `item` at `index`.
    pub fn insert(&mut self, index: usize, item: &T) -> Result<()> {
        if index > self.items.len() {
            return Err(Error::invalid_state(format!(
                "insert index {} out of bounds (len {})",
                index,
                self.items.len()
            )));
        }
        self.check_room(1)?;
        self.items.insert(index, item.rebind(&self.ctx));
        self.ctx.notify();
        Ok(())
    }

    /// Replace the element at `index` with a copy of `item`.
    pub fn replace(&mut self, index: usize, item: &T) -> Result<()> {
        let slot = self.items.get_mut(index).ok_or_else(|| {
            Error::invalid_state(format!("replace index {} out of bounds", index))
        })?;
        if slot == item {
            return Ok(());
        }
        *slot = item.rebind(&self.ctx);
        self.ctx.notify();
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.ctx.notify();
        Some(item)
    }

    /// Remove every element. No notification if already empty.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.ctx.notify();
    }

    /// Push a new version down into every element without notifying.
    pub fn set_version(&mut self, version: u32) {
        self.ctx.set_version(version);
        for item in &mut self.items {
            item.set_inherited_version(version);
        }
    }

    /// Deep copy bound to a new owner.
    pub fn rebind(&self, ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            mode: self.mode,
            max_count: self.max_count,
            items: self.items.iter().map(|item| item.rebind(ctx)).collect(),
        }
    }

    /// Replace the contents with `count` elements read by `read_one`.
    ///
    /// This is the building block for lists whose elements need extra
    /// per-list state to decode (key order, payload anchors).
    pub fn decode_with<F>(&mut self, cursor: &mut Cursor, count: usize, mut read_one: F) -> Result<()>
    where
        F: FnMut(&ElementContext, &mut Cursor) -> Result<T>,
    {
        if count > self.limit() {
            return Err(Error::format(
                cursor.position(),
                format!("list count {} exceeds maximum of {}", count, self.limit()),
            ));
        }
        let mut items = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            items.push(read_one(&self.ctx, cursor)?);
        }
        self.items = items;
        Ok(())
    }

    /// Encode every element with `write_one`, after the count if it is inline.
    pub fn encode_with<F>(&self, cursor: &mut Cursor, mut write_one: F) -> Result<()>
    where
        F: FnMut(&T, &mut Cursor) -> Result<()>,
    {
        self.check_room(0)?;
        match self.mode {
            CountMode::Inline(width) => width.write(cursor, self.items.len())?,
            CountMode::External(_) => {}
            CountMode::Terminated => {
                return Err(Error::invariant("terminated list encoded as a counted list"));
            }
        }
        for item in &self.items {
            write_one(item, cursor)?;
        }
        Ok(())
    }

    /// Write the count for an externally counted list (owner's header).
    pub fn write_count(&self, cursor: &mut Cursor) -> Result<()> {
        self.check_room(0)?;
        match self.mode {
            CountMode::External(width) | CountMode::Inline(width) => {
                width.write(cursor, self.items.len())
            }
            CountMode::Terminated => Err(Error::invariant("terminated list has no count")),
        }
    }
}

impl<T: Editable> DependentList<T> {
    /// Mutable access for calling element setters; those notify on their own.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T: Codec> DependentList<T> {
    /// Decode a list carrying its own count.
    pub fn decode(&mut self, cursor: &mut Cursor) -> Result<()> {
        let count = match self.mode {
            CountMode::Inline(width) => width.read(cursor)?,
            CountMode::External(_) => {
                return Err(Error::invariant("externally counted list decoded without a count"));
            }
            CountMode::Terminated => {
                return Err(Error::invariant("terminated list decoded as a counted list"));
            }
        };
        trace!(count, "decoding dependent list");
        self.decode_with(cursor, count, T::read)
    }

    /// Decode a list whose count the owner already read.
    pub fn decode_counted(&mut self, cursor: &mut Cursor, count: usize) -> Result<()> {
        self.decode_with(cursor, count, T::read)
    }

    /// Encode count (if inline) and elements.
    pub fn encode(&self, cursor: &mut Cursor) -> Result<()> {
        self.encode_with(cursor, |item, cursor| item.write(cursor))
    }
}

impl<T: Terminated> DependentList<T> {
    /// Decode elements until the terminal marker. The marker is consumed, not stored.
    pub fn decode_terminated(&mut self, cursor: &mut Cursor) -> Result<()> {
        let mut items = Vec::new();
        loop {
            let item = T::read(&self.ctx, cursor)?;
            if item.is_terminal() {
                break;
            }
            if items.len() >= self.limit() {
                return Err(Error::format(
                    cursor.position(),
                    format!("sequence exceeds maximum of {} elements", self.limit()),
                ));
            }
            items.push(item);
        }
        self.items = items;
        Ok(())
    }

    /// Encode elements followed by the terminal marker.
    pub fn encode_terminated(&self, cursor: &mut Cursor) -> Result<()> {
        self.check_room(0)?;
        for item in &self.items {
            if item.is_terminal() {
                return Err(Error::invalid_state(
                    "terminal marker stored inside a terminated sequence",
                ));
            }
            item.write(cursor)?;
        }
        T::terminal(&self.ctx).write(cursor)
    }
}

impl<T: PartialEq> PartialEq for DependentList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: fmt::Debug> fmt::Debug for DependentList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T> Index<usize> for DependentList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T: Editable> IndexMut<usize> for DependentList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a DependentList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

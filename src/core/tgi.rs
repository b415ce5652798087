//! Resource keys (type, group, instance) and key lists.
//!
//! Keys are plain values: structural equality, hashable, never mutated in
//! place. A [`TgiList`] is a dependent list of keys with a per-format wire
//! order, usually stored after every other field of its owner and located
//! through an offset + length header.

use std::fmt;

use super::{CountMode, CountWidth, DependentList, Element, ElementContext, Codec};
use crate::stream::{Cursor, RangeHeader, RangePointer};
use crate::util::Result;

/// Encoded size of one key.
pub const TGI_SIZE: u64 = 16;

/// Resource key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tgi {
    pub type_id: u32,
    pub group: u32,
    pub instance: u64,
}

impl Tgi {
    pub const fn new(type_id: u32, group: u32, instance: u64) -> Self {
        Self {
            type_id,
            group,
            instance,
        }
    }

    /// Check if every component is zero.
    pub fn is_null(&self) -> bool {
        *self == Self::default()
    }

    /// Read a key in the given component order.
    pub fn read_ordered(cursor: &mut Cursor, order: TgiOrder) -> Result<Self> {
        Ok(match order {
            TgiOrder::Tgi => {
                let type_id = cursor.read_u32()?;
                let group = cursor.read_u32()?;
                let instance = cursor.read_u64()?;
                Self::new(type_id, group, instance)
            }
            TgiOrder::Itg => {
                let instance = cursor.read_u64()?;
                let type_id = cursor.read_u32()?;
                let group = cursor.read_u32()?;
                Self::new(type_id, group, instance)
            }
        })
    }

    /// Write a key in the given component order.
    pub fn write_ordered(&self, cursor: &mut Cursor, order: TgiOrder) -> Result<()> {
        match order {
            TgiOrder::Tgi => {
                cursor.write_u32(self.type_id)?;
                cursor.write_u32(self.group)?;
                cursor.write_u64(self.instance)
            }
            TgiOrder::Itg => {
                cursor.write_u64(self.instance)?;
                cursor.write_u32(self.type_id)?;
                cursor.write_u32(self.group)
            }
        }
    }
}

impl fmt::Display for Tgi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}:{:08X}:{:016X}", self.type_id, self.group, self.instance)
    }
}

impl Element for Tgi {
    fn fresh(_ctx: &ElementContext) -> Self {
        Self::default()
    }

    fn rebind(&self, _ctx: &ElementContext) -> Self {
        *self
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["type_id", "group", "instance"]
    }
}

impl Codec for Tgi {
    fn read(_ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        Self::read_ordered(cursor, TgiOrder::Tgi)
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        self.write_ordered(cursor, TgiOrder::Tgi)
    }
}

/// Component order of keys inside a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TgiOrder {
    /// type u32, group u32, instance u64
    Tgi,
    /// instance u64, type u32, group u32
    Itg,
}

/// Dependent list of resource keys.
#[derive(Debug, PartialEq)]
pub struct TgiList {
    order: TgiOrder,
    keys: DependentList<Tgi>,
}

impl TgiList {
    /// Empty list with an inline count of `width`.
    pub fn new(ctx: &ElementContext, width: CountWidth, order: TgiOrder) -> Self {
        Self {
            order,
            keys: DependentList::new(ctx, CountMode::Inline(width)),
        }
    }

    /// Wire order of key components.
    #[inline]
    pub fn order(&self) -> TgiOrder {
        self.order
    }

    /// Underlying container, read-only. Keys change only through the
    /// notifying methods below.
    #[inline]
    pub fn keys(&self) -> &DependentList<Tgi> {
        &self.keys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Tgi> {
        self.keys.get(index).copied()
    }

    /// Append a key and return its index.
    pub fn push(&mut self, key: Tgi) -> Result<usize> {
        self.keys.push(&key)?;
        Ok(self.keys.len() - 1)
    }

    /// Insert a key at `index`.
    pub fn insert(&mut self, index: usize, key: Tgi) -> Result<()> {
        self.keys.insert(index, &key)
    }

    /// Replace the key at `index`. No notification if it is unchanged.
    pub fn set(&mut self, index: usize, key: Tgi) -> Result<()> {
        self.keys.replace(index, &key)
    }

    /// Remove and return the key at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Tgi> {
        self.keys.remove(index)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tgi> {
        self.keys.iter()
    }

    /// Index of `key`, appending it if absent.
    pub fn index_of_or_insert(&mut self, key: Tgi) -> Result<usize> {
        match self.keys.iter().position(|k| *k == key) {
            Some(i) => Ok(i),
            None => self.push(key),
        }
    }

    /// Encoded size in bytes, including the count.
    pub fn encoded_len(&self) -> u64 {
        let width = match self.keys.mode() {
            CountMode::Inline(w) | CountMode::External(w) => w.size(),
            CountMode::Terminated => 0,
        };
        width + TGI_SIZE * self.keys.len() as u64
    }

    /// Decode an inline list at the cursor.
    pub fn decode(&mut self, cursor: &mut Cursor) -> Result<()> {
        let count = match self.keys.mode() {
            CountMode::Inline(w) | CountMode::External(w) => w.read(cursor)?,
            CountMode::Terminated => 0,
        };
        let order = self.order;
        self.keys
            .decode_with(cursor, count, |_, cursor| Tgi::read_ordered(cursor, order))
    }

    /// Decode a trailing list located by `ptr`.
    ///
    /// The list is read where the cursor is. Under strict validation the cursor
    /// must sit exactly at the header's computed start and the list must span
    /// exactly the header's length.
    pub fn decode_at(&mut self, cursor: &mut Cursor, ptr: &RangePointer) -> Result<()> {
        let options = self.keys.context().options();
        ptr.expect_start(cursor, options)?;
        let started_at = cursor.position();
        self.decode(cursor)?;
        ptr.expect_end(started_at, cursor, options)
    }

    /// Encode count and keys at the cursor.
    pub fn encode(&self, cursor: &mut Cursor) -> Result<()> {
        let order = self.order;
        self.keys
            .encode_with(cursor, |key, cursor| key.write_ordered(cursor, order))
    }

    /// Encode as the trailing block of `header`, then patch the header.
    pub fn encode_trailing(&self, cursor: &mut Cursor, mut header: RangeHeader) -> Result<()> {
        header.begin(cursor)?;
        self.encode(cursor)?;
        header.finish(cursor)?;
        Ok(())
    }

    /// Deep copy bound to a new owner.
    pub fn rebind(&self, ctx: &ElementContext) -> Self {
        Self {
            order: self.order,
            keys: self.keys.rebind(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DirtyState;
    use crate::util::{Error, ReadOptions};

    #[test]
    fn test_key_orders() -> Result<()> {
        let key = Tgi::new(0x0102_0304, 0x0A0B_0C0D, 0x1112_1314_1516_1718);
        let mut c = Cursor::new();
        key.write_ordered(&mut c, TgiOrder::Itg)?;
        assert_eq!(&c.as_bytes()[..8], &0x1112_1314_1516_1718u64.to_le_bytes());
        assert_eq!(&c.as_bytes()[8..12], &[4, 3, 2, 1]);
        c.seek(0)?;
        assert_eq!(Tgi::read_ordered(&mut c, TgiOrder::Itg)?, key);
        assert_eq!(key.to_string(), "01020304:0A0B0C0D:1112131415161718");
        Ok(())
    }

    #[test]
    fn test_trailing_list_header() -> Result<()> {
        let ctx = ElementContext::detached(1);
        let mut list = TgiList::new(&ctx, CountWidth::U8, TgiOrder::Tgi);
        list.push(Tgi::new(1, 2, 3))?;
        assert_eq!(list.index_of_or_insert(Tgi::new(1, 2, 3))?, 0);
        assert_eq!(list.index_of_or_insert(Tgi::new(4, 5, 6))?, 1);

        let mut c = Cursor::new();
        let header = RangeHeader::reserve(&mut c)?;
        c.write_u16(0xFFFF)?;
        list.encode_trailing(&mut c, header)?;
        assert_eq!(c.len(), 8 + 2 + list.encoded_len());

        c.seek(0)?;
        let ptr = RangePointer::read(&mut c)?;
        assert_eq!(ptr.offset(), 2);
        assert_eq!(ptr.length() as u64, list.encoded_len());
        c.read_u16()?;

        let mut back = TgiList::new(&ctx, CountWidth::U8, TgiOrder::Tgi);
        back.decode_at(&mut c, &ptr)?;
        assert_eq!(back, list);
        Ok(())
    }

    #[test]
    fn test_key_edits_notify() -> Result<()> {
        let state = DirtyState::new();
        let ctx = ElementContext::new(1, state.handler());
        let mut list = TgiList::new(&ctx, CountWidth::U8, TgiOrder::Tgi);
        list.push(Tgi::new(1, 1, 1))?;
        list.set(0, Tgi::new(1, 1, 1))?;
        assert_eq!(state.changes(), 1);

        list.set(0, Tgi::new(9, 9, 9))?;
        list.insert(0, Tgi::new(2, 2, 2))?;
        assert_eq!(list.remove(1), Some(Tgi::new(9, 9, 9)));
        assert!(list.set(3, Tgi::default()).is_err());
        assert_eq!(state.changes(), 4);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![Tgi::new(2, 2, 2)]);

        list.clear();
        list.clear();
        assert_eq!(state.changes(), 5);
        Ok(())
    }

    #[test]
    fn test_misplaced_list_strictness() -> Result<()> {
        // header says the list starts 4 bytes later than it does
        let bytes = vec![4u8, 0, 0, 0, 1, 0, 0, 0, 0];
        let strict = ElementContext::detached(1).with_options(ReadOptions::STRICT);
        let mut c = Cursor::from_bytes(bytes.clone());
        let ptr = RangePointer::read(&mut c)?;
        let mut list = TgiList::new(&strict, CountWidth::U8, TgiOrder::Tgi);
        let err = list.decode_at(&mut c, &ptr).unwrap_err();
        assert!(matches!(err, Error::Mismatch { position: 8, expected: 12, actual: 8, .. }));

        let lenient = ElementContext::detached(1).with_options(ReadOptions::LENIENT);
        let mut c = Cursor::from_bytes(bytes);
        let ptr = RangePointer::read(&mut c)?;
        let mut list = TgiList::new(&lenient, CountWidth::U8, TgiOrder::Tgi);
        list.decode_at(&mut c, &ptr)?;
        assert!(list.is_empty());
        Ok(())
    }
}

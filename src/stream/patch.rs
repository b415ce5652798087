//! Two-pass back-patching.
//!
//! Some values (offsets to trailing blocks, block lengths) are only known once
//! everything after them has been written. The writer reserves a zeroed slot,
//! keeps encoding, then seeks back, fills the slot and returns to where it was
//! so sibling fields continue contiguously.
//!
//! ```text
//! header_pos
//! |  offset u32 | length u32 |  ...owner fields...  |  trailing list  |
//!               ^ header_end                         ^ start           ^ end
//! offset = start - header_end, length = end - start
//! ```

use super::Cursor;
use crate::util::{Error, ReadOptions, Result};

/// Size of an offset + length range header.
pub const RANGE_HEADER_SIZE: u64 = 8;

/// A reserved u32 slot awaiting its real value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pos: u64,
}

impl Placeholder {
    /// Write a zero u32 at the current position and remember where it is.
    pub fn reserve_u32(cursor: &mut Cursor) -> Result<Self> {
        let pos = cursor.position();
        cursor.write_u32(0)?;
        Ok(Self { pos })
    }

    /// Position of the reserved slot.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Overwrite the slot with `value`, leaving the cursor where it was.
    pub fn patch(&self, cursor: &mut Cursor, value: u32) -> Result<()> {
        let resume = cursor.position();
        if self.pos + 4 > cursor.len() {
            return Err(Error::invariant(format!(
                "placeholder at {} lies outside the written buffer",
                self.pos
            )));
        }
        cursor.seek(self.pos)?;
        cursor.write_u32(value)?;
        cursor.seek(resume)?;
        Ok(())
    }
}

/// Convert a stream distance to a u32 slot value.
fn to_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invariant(format!("{what} {value} exceeds 32 bits")))
}

/// Writer side of an offset + length header pointing at a later block.
#[derive(Debug)]
pub struct RangeHeader {
    offset: Placeholder,
    length: Placeholder,
    start: Option<u64>,
}

impl RangeHeader {
    /// Write a zeroed header at the current position.
    pub fn reserve(cursor: &mut Cursor) -> Result<Self> {
        let offset = Placeholder::reserve_u32(cursor)?;
        let length = Placeholder::reserve_u32(cursor)?;
        Ok(Self {
            offset,
            length,
            start: None,
        })
    }

    /// Position right after the header; offsets are relative to it.
    #[inline]
    pub fn header_end(&self) -> u64 {
        self.offset.position() + RANGE_HEADER_SIZE
    }

    /// Mark the current position as the start of the target block.
    pub fn begin(&mut self, cursor: &Cursor) -> Result<()> {
        if self.start.is_some() {
            return Err(Error::invariant("range header target started twice"));
        }
        let start = cursor.position();
        if start < self.header_end() {
            return Err(Error::invariant(format!(
                "range target at {} precedes its header end {}",
                start,
                self.header_end()
            )));
        }
        self.start = Some(start);
        Ok(())
    }

    /// Patch offset and length now that the target block ends at the current position.
    pub fn finish(self, cursor: &mut Cursor) -> Result<RangePointer> {
        let start = self
            .start
            .ok_or_else(|| Error::invariant("range header finished without a recorded start"))?;
        let end = cursor.position();
        if end < start {
            return Err(Error::invariant("range target ends before it starts"));
        }
        let offset = to_u32(start - self.header_end(), "range offset")?;
        let length = to_u32(end - start, "range length")?;
        self.offset.patch(cursor, offset)?;
        self.length.patch(cursor, length)?;
        Ok(RangePointer {
            header_end: self.header_end(),
            offset,
            length,
        })
    }
}

/// Reader side of an offset + length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePointer {
    header_end: u64,
    offset: u32,
    length: u32,
}

impl RangePointer {
    /// Read an offset + length header at the current position.
    pub fn read(cursor: &mut Cursor) -> Result<Self> {
        let offset = cursor.read_u32()?;
        let length = cursor.read_u32()?;
        Ok(Self {
            header_end: cursor.position(),
            offset,
            length,
        })
    }

    /// Stored offset, relative to the end of the header.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Stored block length.
    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Absolute position the block should start at.
    #[inline]
    pub fn start(&self) -> u64 {
        self.header_end + self.offset as u64
    }

    /// Absolute position the block should end at.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start() + self.length as u64
    }

    /// Under strict validation, the cursor must sit exactly at the block start.
    pub fn expect_start(&self, cursor: &Cursor, options: ReadOptions) -> Result<()> {
        if options.strict && cursor.position() != self.start() {
            return Err(Error::Mismatch {
                what: "block start",
                position: cursor.position(),
                expected: self.start(),
                actual: cursor.position(),
            });
        }
        Ok(())
    }

    /// Under strict validation, the block read from `started_at` must span exactly `length` bytes.
    pub fn expect_end(&self, started_at: u64, cursor: &Cursor, options: ReadOptions) -> Result<()> {
        let actual = cursor.position().saturating_sub(started_at);
        if options.strict && actual != self.length as u64 {
            return Err(Error::Mismatch {
                what: "block length",
                position: cursor.position(),
                expected: self.length as u64,
                actual,
            });
        }
        Ok(())
    }
}

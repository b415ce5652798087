//! Byte-level plumbing shared by every element.
//!
//! - [`Cursor`] - seekable little-endian buffer
//! - [`Placeholder`] / [`RangeHeader`] - reserve-then-patch helpers
//! - [`RangePointer`] - decoded offset + length header

mod cursor;
mod patch;

pub use cursor::*;
pub use patch::*;

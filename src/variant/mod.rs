//! Tagged variant families.
//!
//! Each family is a closed enum decoded by reading a discriminant first and
//! dispatching through a fixed match. Families differ in how the shape is
//! selected and where the payload lives:
//!
//! | Family | Discriminant | Terminal | Payload |
//! |---|---|---|---|
//! | [`AreaShape`] | u8 | none (0 is invalid) | inline |
//! | [`CompositorValue`] | u8 | 0 ends the sequence | inline |
//! | [`ShaderValue`] | (type code u32, arity u32) + field id | none | indirected from block anchor |

mod shape;
mod compositor;
mod shader;

pub use shape::*;
pub use compositor::*;
pub use shader::*;

use crate::stream::Cursor;
use crate::util::{Error, Result};

/// Error for a discriminant no decoder is registered for.
pub fn unknown_discriminant(family: &'static str, value: u64, position: u64) -> Error {
    Error::UnknownDiscriminant {
        family,
        value,
        position,
    }
}

/// Read a one-byte discriminant along with the position it was read at.
pub fn read_tag(cursor: &mut Cursor) -> Result<(u8, u64)> {
    let position = cursor.position();
    Ok((cursor.read_u8()?, position))
}

//! Reference formats built from the element primitives.
//!
//! Each schema is laid out by hand against the primitive contracts:
//! which container, in which order, under which version gate.

mod footprint;
mod material;
mod compositor;

pub use footprint::*;
pub use material::*;
pub use compositor::*;

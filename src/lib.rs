//! # Resource Elements
//!
//! Generic binary element engine for game-asset resource formats.
//!
//! Concrete formats are declarative schemas built from a handful of
//! primitives: dependent element lists with pluggable count encodings,
//! resource key (TGI) lists placed through back-patched offset headers,
//! tagged variants, version-gated fields, and a change notification chain
//! that invalidates the top-level resource's cached encoding.
//!
//! ## Modules
//!
//! - [`util`] - Errors and decode options
//! - [`stream`] - Little-endian cursor and back-patch helpers
//! - [`core`] - Element traits, lists, keys, version gates, resources
//! - [`variant`] - Tagged variant families
//! - [`schema`] - Reference formats (footprint, shader material, texture compositor)
//!
//! ## Example
//!
//! ```ignore
//! use resource_elements::prelude::*;
//!
//! let mut res: Resource<Footprint> = Resource::from_bytes(&bytes)?;
//! res.content_mut().set_max_height(4.0)?;
//! assert!(res.is_dirty());
//! let encoded = res.bytes()?;
//! ```

pub mod util;
pub mod stream;
pub mod core;
pub mod variant;
pub mod schema;

// Re-export commonly used types
pub use util::{Error, ErrorKind, Result, ReadOptions, set_strict_validation, strict_validation};
pub use stream::Cursor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, ErrorKind, Result, ReadOptions};
    pub use crate::stream::{Cursor, RangeHeader, RangePointer, Placeholder};
    pub use crate::core::{
        BitEq, ChangeHandler, Codec, CountMode, CountWidth, DependentList, Editable, Element,
        ElementContext, Resource, Schema, Terminated, Tgi, TgiList, TgiOrder, VersionGate,
    };
    pub use crate::variant::*;
    pub use crate::schema::*;
}

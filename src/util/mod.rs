//! Utility types shared by every layer.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`ReadOptions`] - strict validation toggle

mod error;
mod settings;

pub use error::*;
pub use settings::*;

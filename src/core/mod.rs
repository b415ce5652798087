//! Element primitives shared by every format.
//!
//! - [`Element`] / [`Codec`] - base element contracts
//! - [`DependentList`] - ordered container with pluggable count encoding
//! - [`Tgi`] / [`TgiList`] - resource keys
//! - [`VersionGate`] - version-gated fields
//! - [`ChangeHandler`] / [`Resource`] - change propagation and cached encoding

mod notify;
mod element;
mod list;
mod tgi;
mod version;
mod resource;

pub use notify::*;
pub use element::*;
pub use list::*;
pub use tgi::*;
pub use version::*;
pub use resource::*;

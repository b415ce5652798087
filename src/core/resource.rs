//! Top-level resource: owner of an element tree and its cached encoding.

use std::rc::Rc;

use tracing::debug;

use super::{Codec, DirtyState, ElementContext};
use crate::stream::Cursor;
use crate::util::{Error, ReadOptions, Result};

/// A top-level format: a codec that carries its own version.
pub trait Schema: Codec {
    /// Format name for diagnostics.
    const NAME: &'static str;

    /// Oldest version this crate can read and write.
    const MIN_VERSION: u32;

    /// Version used when building a resource from scratch.
    const DEFAULT_VERSION: u32;

    /// Current format version.
    fn version(&self) -> u32;
}

/// A decoded resource plus the bytes it was decoded from.
///
/// Reading [`bytes`](Self::bytes) returns the cached buffer until some
/// element in the tree changes; then it is re-encoded once and cached again.
pub struct Resource<T: Schema> {
    state: Rc<DirtyState>,
    content: T,
}

impl<T: Schema> Resource<T> {
    /// Decode with the process-wide validation setting.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with(bytes, ReadOptions::default())
    }

    /// Decode with explicit options. On error no resource is produced.
    pub fn from_bytes_with(bytes: &[u8], options: ReadOptions) -> Result<Self> {
        let state = DirtyState::new();
        let ctx = ElementContext::new(T::DEFAULT_VERSION, state.handler()).with_options(options);
        let mut cursor = Cursor::from_bytes(bytes);
        let content = T::read(&ctx, &mut cursor)?;

        if options.strict && cursor.remaining() != 0 {
            return Err(Error::Mismatch {
                what: "resource length",
                position: cursor.position(),
                expected: cursor.position(),
                actual: cursor.len(),
            });
        }

        debug!(
            schema = T::NAME,
            version = content.version(),
            size = bytes.len(),
            "decoded resource"
        );
        state.store(bytes.to_vec());
        Ok(Self { state, content })
    }

    /// Empty resource at the default version.
    pub fn new() -> Self {
        Self::fresh(T::DEFAULT_VERSION)
    }

    /// Empty resource at `version`. Versions below the format's minimum
    /// could not be read back and are rejected.
    pub fn with_version(version: u32) -> Result<Self> {
        if version < T::MIN_VERSION {
            return Err(Error::invalid_state(format!(
                "{} version {:#x} is below the minimum {:#x}",
                T::NAME,
                version,
                T::MIN_VERSION
            )));
        }
        Ok(Self::fresh(version))
    }

    fn fresh(version: u32) -> Self {
        let state = DirtyState::new();
        let ctx = ElementContext::new(version, state.handler());
        let content = T::fresh(&ctx);
        Self { state, content }
    }

    #[inline]
    pub fn content(&self) -> &T {
        &self.content
    }

    /// Mutable access; setters on the tree mark the resource dirty.
    #[inline]
    pub fn content_mut(&mut self) -> &mut T {
        &mut self.content
    }

    /// Check if the cached encoding is stale.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Number of change notifications received.
    #[inline]
    pub fn change_count(&self) -> u64 {
        self.state.changes()
    }

    /// Encode the tree without touching the cache.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new();
        self.content.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Encoded form, re-encoding only if something changed.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        if let Some(bytes) = self.state.cached() {
            return Ok(bytes);
        }
        let bytes = self.encode()?;
        debug!(schema = T::NAME, size = bytes.len(), "re-encoded resource");
        self.state.store(bytes.clone());
        Ok(bytes)
    }

    /// Deep copy with its own root: changes to the copy never dirty `self`.
    pub fn duplicate(&self) -> Self {
        let state = DirtyState::new();
        let ctx = ElementContext::new(self.content.version(), state.handler());
        let content = self.content.rebind(&ctx);
        if let Some(bytes) = self.state.cached() {
            state.store(bytes);
        }
        Self { state, content }
    }

    /// Drop the cache and return the tree.
    pub fn into_content(self) -> T {
        self.content
    }
}

impl<T: Schema> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

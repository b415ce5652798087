//! Decode-time configuration.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide default for strict position validation.
static STRICT_VALIDATION: AtomicBool = AtomicBool::new(true);

/// Enable or disable strict validation for decodes that don't override it.
pub fn set_strict_validation(enabled: bool) {
    STRICT_VALIDATION.store(enabled, Ordering::Relaxed);
}

/// Current process-wide strict validation setting.
#[inline]
pub fn strict_validation() -> bool {
    STRICT_VALIDATION.load(Ordering::Relaxed)
}

/// Options threaded through one decode.
///
/// `Default` samples the process-wide flag at construction time, so a decode
/// keeps the setting it started with even if the global changes midway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadOptions {
    /// Verify computed-vs-stored stream positions and lengths.
    pub strict: bool,
}

impl ReadOptions {
    /// Options with strict validation on.
    pub const STRICT: Self = Self { strict: true };

    /// Options with strict validation off (best effort for damaged data).
    pub const LENIENT: Self = Self { strict: false };
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            strict: strict_validation(),
        }
    }
}

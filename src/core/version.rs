//! Version-gated fields.
//!
//! A gated field exists on the wire and in the accessor surface only when the
//! owning structure's version is at least the gate's minimum. Gates of one
//! structure must be listed in non-decreasing order: a field gated at V8 is
//! only reachable after the V7 gate has passed.

use crate::util::{Error, Result};

/// Minimum version for one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionGate {
    pub field: &'static str,
    pub min: u32,
}

impl VersionGate {
    pub const fn new(field: &'static str, min: u32) -> Self {
        Self { field, min }
    }

    /// Check if the field exists at `version`.
    #[inline]
    pub const fn is_open(&self, version: u32) -> bool {
        version >= self.min
    }

    /// Fail with [`Error::FieldNotAvailable`] unless the field exists at `version`.
    pub fn check(&self, version: u32) -> Result<()> {
        if self.is_open(version) {
            Ok(())
        } else {
            Err(Error::FieldNotAvailable {
                field: self.field,
                required: self.min,
                actual: version,
            })
        }
    }
}

/// Verify that a gate table nests consistently.
pub fn check_gate_order(gates: &[VersionGate]) -> Result<()> {
    for pair in gates.windows(2) {
        if pair[1].min < pair[0].min {
            return Err(Error::invariant(format!(
                "gate for `{}` (v{:#x}) follows `{}` (v{:#x})",
                pair[1].field, pair[1].min, pair[0].field, pair[0].min
            )));
        }
    }
    Ok(())
}

/// Property surface at `version`: always-present fields, then every open gate.
pub fn unlocked_fields(
    version: u32,
    always: &[&'static str],
    gates: &[VersionGate],
) -> Vec<&'static str> {
    always
        .iter()
        .copied()
        .chain(gates.iter().filter(|g| g.is_open(version)).map(|g| g.field))
        .collect()
}

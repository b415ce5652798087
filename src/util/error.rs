//! Error types for resource element decoding and encoding.

use thiserror::Error;

/// Broad classification of an [`Error`].
///
/// Format errors come from malformed bytes and abort decoding of the whole
/// resource. Invalid-state errors are caller-induced and surfaced as-is.
/// Invariant errors indicate a bug in an encode routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    InvalidState,
    Invariant,
}

/// Main error type for element operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Read past the end of the buffer
    #[error("Unexpected end of data at position {0}")]
    UnexpectedEof(u64),

    /// Malformed or inconsistent bytes
    #[error("Invalid data at position {position}: {message}")]
    Format { position: u64, message: String },

    /// No decoder is registered for a discriminant
    #[error("Unrecognized {family} discriminant {value:#x} at position {position}")]
    UnknownDiscriminant {
        family: &'static str,
        value: u64,
        position: u64,
    },

    /// Element count does not fit the count encoding or the configured maximum
    #[error("Element count {count} exceeds maximum of {max}")]
    CountOverflow { count: usize, max: usize },

    /// Computed stream position disagrees with the stored one (strict validation)
    #[error("{what} mismatch at position {position}: expected {expected:#x}, got {actual:#x}")]
    Mismatch {
        what: &'static str,
        position: u64,
        expected: u64,
        actual: u64,
    },

    /// Wrong number of values supplied for a fixed-size array
    #[error("{what} requires exactly {expected} values, got {actual}")]
    FixedLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Field is gated above the structure's current version
    #[error("Field `{field}` requires version {required:#x} (structure is version {actual:#x})")]
    FieldNotAvailable {
        field: &'static str,
        required: u32,
        actual: u32,
    },

    /// Operation not valid for the current state
    #[error("Invalid operation: {0}")]
    InvalidState(String),

    /// Internal invariant broken by an encode routine
    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a format error at a stream position.
    pub fn format(position: u64, msg: impl Into<String>) -> Self {
        Self::Format {
            position,
            message: msg.into(),
        }
    }

    /// Create an invalid-state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create an invariant-violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FieldNotAvailable { .. } | Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Invariant(_) => ErrorKind::Invariant,
            _ => ErrorKind::Format,
        }
    }

    /// Byte position the error was raised at, when known.
    pub fn position(&self) -> Option<u64> {
        match self {
            Self::UnexpectedEof(pos) => Some(*pos),
            Self::Format { position, .. }
            | Self::UnknownDiscriminant { position, .. }
            | Self::Mismatch { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Result type alias for element operations.
pub type Result<T> = std::result::Result<T, Error>;

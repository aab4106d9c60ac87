//! Error taxonomy for range map operations.

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn already_initialized() -> Error {
        Error(ErrorKind::AlreadyInitialized.into())
    }

    pub fn already_destroyed() -> Error {
        Error(ErrorKind::AlreadyDestroyed.into())
    }

    pub fn invalid_bounds(start: u64, end: u64) -> Error {
        Error(ErrorKind::InvalidBounds { start, end }.into())
    }

    pub fn insufficient_space(requested: u64, available: u64) -> Error {
        Error(
            ErrorKind::InsufficientSpace {
                requested,
                available,
            }
            .into(),
        )
    }

    pub fn out_of_range(start: u64, end: u64) -> Error {
        Error(ErrorKind::OutOfRange { start, end }.into())
    }

    pub fn out_of_bounds(position: u64) -> Error {
        Error(ErrorKind::OutOfBounds { position }.into())
    }

    pub fn invalid_range(start: u64, end: u64) -> Error {
        Error(ErrorKind::InvalidRange { start, end }.into())
    }

    pub fn invalid_length(length: u64) -> Error {
        Error(ErrorKind::InvalidLength { length }.into())
    }

    pub fn invalid_snapshot(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidSnapshot {
                message: message.into(),
            }
            .into(),
        )
    }
}

/// Failure categories surfaced by [`RangeMap`](crate::RangeMap) operations.
///
/// Every failure is synchronous and leaves the chain untouched: argument and
/// lifecycle validation runs before any structural surgery begins. A corrupted
/// chain (impossible overlap shape, broken links) is a panic, not a variant
/// here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("range map is already initialized")]
    AlreadyInitialized,

    #[error("range map is already destroyed")]
    AlreadyDestroyed,

    #[error("invalid bounds: start {start} must be less than end {end}")]
    InvalidBounds { start: u64, end: u64 },

    #[error("unable to allocate {requested} units, {available} unallocated")]
    InsufficientSpace { requested: u64, available: u64 },

    #[error("range [{start}, {end}] is outside the managed range")]
    OutOfRange { start: u64, end: u64 },

    #[error("position {position} is outside the managed range")]
    OutOfBounds { position: u64 },

    #[error("invalid range: [{start}, {end}] has negative length")]
    InvalidRange { start: u64, end: u64 },

    #[error("allocation length must be at least 1, got {length}")]
    InvalidLength { length: u64 },

    #[error("invalid snapshot: {message}")]
    InvalidSnapshot { message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

//! Error types for type construction and lookup.
//!
//! `NotFound` is the only recoverable error: finder chains continue past it
//! and callers may retry once the missing type becomes available. Everything
//! else aborts the operation that produced it.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A type, member or name could not currently be located.
    #[error("{0}")]
    NotFound(String),

    /// A construction precondition was violated (e.g. an enum compatible type
    /// that isn't an integer, or a type from a different program).
    #[error("{0}")]
    InvalidArgument(String),

    /// A size computation does not fit in 64 bits.
    #[error("{0}")]
    Overflow(String),

    /// An error raised by a thunk or type finder, passed through verbatim.
    #[error("{0}")]
    External(#[source] Box<dyn core::error::Error + Send + Sync + 'static>),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Error::Overflow(message.into())
    }

    pub fn external(error: impl Into<Box<dyn core::error::Error + Send + Sync + 'static>>) -> Self {
        Error::External(error.into())
    }

    /// Whether this is the recoverable "not found" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// A failed builder finalization.
///
/// The builder is handed back with every entry it had accumulated, so the
/// caller can fix the input and retry `create`, or drop it (which releases any
/// unevaluated thunks it still owns).
pub struct BuildError<B> {
    builder: B,
    error: Error,
}

impl<B> BuildError<B> {
    pub(crate) fn new(builder: B, error: Error) -> Self {
        Self { builder, error }
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn into_builder(self) -> B {
        self.builder
    }

    pub fn into_parts(self) -> (B, Error) {
        (self.builder, self.error)
    }
}

impl<B> fmt::Debug for BuildError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<B> fmt::Display for BuildError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<B> From<BuildError<B>> for Error {
    fn from(err: BuildError<B>) -> Self {
        err.error
    }
}

//! Error types for the `augtree` engine.
//!
//! Mirrors the shape of a conventional Rust error type: a small `ErrorKind`
//! enum for programmatic matching, a `TreeError` that carries a message, the
//! kind, an optional cause chain, and a captured backtrace for the error
//! classes that indicate a bug rather than a caller mistake (see
//! [`ErrorKind::InvariantViolated`] and [`ErrorKind::ResourceExhausted`]).

use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds produced by engine operations.
///
/// These map directly onto spec §7: caller-fault kinds
/// ([`ErrorKind::DuplicateKey`], [`ErrorKind::OutOfRange`]) leave the tree
/// strictly unchanged; [`ErrorKind::NotFound`] is returned rather than
/// treated as exceptional; [`ErrorKind::InvariantViolated`] and
/// [`ErrorKind::ResourceExhausted`] taint the tree and should not be
/// recovered from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Insert-by-key collided with an existing value and the set forbids duplicates.
    DuplicateKey,
    /// A rank argument fell outside `[0, n)` (or `[0, n]` for insertion).
    OutOfRange,
    /// A handle or key was absent at the time of the operation.
    NotFound,
    /// A structural check failed: a bad satellite comparator, or a fixup
    /// invariant that did not hold. Indicates a bug in the caller's
    /// comparator or in the engine itself.
    InvariantViolated,
    /// An iterator observed that the tree's version counter advanced since
    /// the iterator was created.
    ConcurrentMutation,
    /// The slab's handle space (~2^31 nodes) is exhausted.
    ResourceExhausted,
    /// Fallback for conditions that should be unreachable.
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::DuplicateKey => write!(f, "duplicate key"),
            ErrorKind::OutOfRange => write!(f, "rank out of range"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::InvariantViolated => write!(f, "invariant violated"),
            ErrorKind::ConcurrentMutation => write!(f, "concurrent mutation"),
            ErrorKind::ResourceExhausted => write!(f, "resource exhausted"),
            ErrorKind::InternalError => write!(f, "internal error"),
        }
    }
}

/// The engine's error type.
///
/// Carries a human-readable message, an [`ErrorKind`] for programmatic
/// matching, an optional cause for error chaining, and — for the two kinds
/// that indicate a bug rather than ordinary caller misuse — a captured
/// backtrace, so that an `InvariantViolated` surfaced deep inside a fixup
/// still points back at where the tree went wrong.
pub struct TreeError {
    message: String,
    kind: ErrorKind,
    cause: Option<Box<TreeError>>,
    backtrace: Option<Backtrace>,
}

impl TreeError {
    /// Creates a new error with the given message and kind.
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        let backtrace = matches!(
            kind,
            ErrorKind::InvariantViolated | ErrorKind::ResourceExhausted | ErrorKind::InternalError
        )
        .then(Backtrace::new);
        TreeError {
            message: message.into(),
            kind,
            cause: None,
            backtrace,
        }
    }

    /// Creates a new error wrapping an underlying cause.
    pub fn with_cause(message: impl Into<String>, kind: ErrorKind, cause: TreeError) -> Self {
        let mut err = TreeError::new(message, kind);
        err.cause = Some(Box::new(cause));
        err
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error kind, for programmatic matching.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The underlying cause, if any.
    pub fn cause(&self) -> Option<&TreeError> {
        self.cause.as_deref()
    }

    /// `DuplicateKey` convenience constructor.
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        TreeError::new(message, ErrorKind::DuplicateKey)
    }

    /// `OutOfRange` convenience constructor.
    pub fn out_of_range(message: impl Into<String>) -> Self {
        TreeError::new(message, ErrorKind::OutOfRange)
    }

    /// `NotFound` convenience constructor.
    pub fn not_found(message: impl Into<String>) -> Self {
        TreeError::new(message, ErrorKind::NotFound)
    }

    /// `InvariantViolated` convenience constructor. Logs at error level
    /// since this kind always indicates a bug somewhere.
    pub fn invariant_violated(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("invariant violated: {message}");
        TreeError::new(message, ErrorKind::InvariantViolated)
    }

    /// `ConcurrentMutation` convenience constructor.
    pub fn concurrent_mutation(message: impl Into<String>) -> Self {
        TreeError::new(message, ErrorKind::ConcurrentMutation)
    }

    /// `ResourceExhausted` convenience constructor. Logs at error level
    /// since this kind is always fatal for the tree.
    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("resource exhausted: {message}");
        TreeError::new(message, ErrorKind::ResourceExhausted)
    }
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl Debug for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.cause, &self.backtrace) {
            (Some(cause), _) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            (None, Some(bt)) => write!(f, "{}\n{:?}", self.message, bt),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl Error for TreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type TreeResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_error_without_cause() {
        let err = TreeError::new("bad rank", ErrorKind::OutOfRange);
        assert_eq!(err.message(), "bad rank");
        assert_eq!(err.kind(), &ErrorKind::OutOfRange);
        assert!(err.cause().is_none());
    }

    #[test]
    fn with_cause_chains_errors() {
        let cause = TreeError::new("root cause", ErrorKind::InternalError);
        let err = TreeError::with_cause("wrapped", ErrorKind::InvariantViolated, cause);
        assert_eq!(err.message(), "wrapped");
        assert!(err.cause().is_some());
        assert_eq!(err.cause().unwrap().message(), "root cause");
    }

    #[test]
    fn bug_class_kinds_capture_backtrace() {
        let err = TreeError::invariant_violated("ambiguous satellite order");
        assert!(err.backtrace.is_some());
        let err = TreeError::out_of_range("rank 5 not in [0, 3)");
        assert!(err.backtrace.is_none());
    }

    #[test]
    fn display_includes_kind() {
        let err = TreeError::duplicate_key("25 already present");
        assert_eq!(format!("{err}"), "25 already present (duplicate key)");
    }
}

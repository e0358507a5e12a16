use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for strata operations.
///
/// Each kind describes a category of failure so callers can branch on it
/// without parsing messages. The validation-class kinds are grouped by
/// [`ErrorKind::is_validation`].
///
/// # Examples
///
/// ```rust
/// use strata::errors::{ErrorKind, StrataError, StrataResult};
///
/// fn example() -> StrataResult<()> {
///     Err(StrataError::new("Field 'age' is not declared", ErrorKind::UnknownField))
/// }
/// assert!(example().unwrap_err().kind().is_validation());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Validation Errors - raised while checking a document against a schema
    /// Generic validation error
    ValidationError,
    /// A document field is not declared by the schema
    UnknownField,
    /// A required field is missing
    MissingRequiredField,
    /// Invalid data type for the declared field
    InvalidDataType,
    /// Invalid field name or path
    InvalidFieldName,

    // ID and lookup Errors
    /// The provided ID is invalid
    InvalidId,
    /// The requested document was not found
    NotFound,
    /// A reference could not be resolved to a target document
    ReferenceResolution,

    // Collection registry Errors
    /// Collection does not exist
    CollectionNotFound,
    /// Collection with the same name is already registered
    CollectionAlreadyExists,

    // Schema and operation Errors
    /// Schema version is not newer than the bound one
    SchemaVersionError,
    /// The operation is not valid in the current context
    InvalidOperation,

    // Store Errors
    /// The database handle has been closed
    StoreClosed,

    /// Internal error (usually indicates a bug or a panicking callback)
    InternalError,
}

impl ErrorKind {
    /// Returns `true` for the kinds produced by schema validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorKind::ValidationError
                | ErrorKind::UnknownField
                | ErrorKind::MissingRequiredField
                | ErrorKind::InvalidDataType
                | ErrorKind::InvalidFieldName
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::UnknownField => write!(f, "Unknown field"),
            ErrorKind::MissingRequiredField => write!(f, "Missing required field"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::ReferenceResolution => write!(f, "Reference resolution error"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::CollectionAlreadyExists => write!(f, "Collection already exists"),
            ErrorKind::SchemaVersionError => write!(f, "Schema version error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::StoreClosed => write!(f, "Store closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom strata error type.
///
/// `StrataError` carries a message, a kind and an optional cause. It is `Clone`
/// because a failed [`crate::future::Future`] hands the same error to every
/// continuation attached to it.
///
/// # Type alias
///
/// `StrataResult<T>` is equivalent to `Result<T, StrataError>`.
#[derive(Clone)]
pub struct StrataError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StrataError>>,
    backtrace: Atomic<Backtrace>,
}

impl StrataError {
    /// Creates a new `StrataError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StrataError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new_unresolved()),
        }
    }

    /// Creates a new `StrataError` wrapping a cause.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StrataError) -> Self {
        StrataError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new_unresolved()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StrataError> {
        self.cause.as_deref()
    }
}

impl Display for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = self.backtrace.write();
                backtrace.resolve();
                write!(f, "{}\n{:?}", self.message, *backtrace)
            }
        }
    }
}

impl Error for StrataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for strata operations.
pub type StrataResult<T> = Result<T, StrataError>;

impl From<std::num::ParseIntError> for StrataError {
    fn from(err: std::num::ParseIntError) -> Self {
        StrataError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

impl From<std::num::ParseFloatError> for StrataError {
    fn from(err: std::num::ParseFloatError) -> Self {
        StrataError::new(
            &format!("Float parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        log::error!("IO error: {}", err);
        StrataError::new(&format!("IO error: {}", err), ErrorKind::InternalError)
    }
}

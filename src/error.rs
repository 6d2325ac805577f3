//! Error types for the ClickHouse DB-API adapter.
//!
//! Every failure surfaced to callers is an [`Error`]. Each variant belongs to
//! one [`ErrorKind`], and the kinds form the standard DB-API hierarchy:
//!
//! ```text
//! Warning
//! Error
//!  ├── Interface
//!  └── Database
//!       ├── Internal
//!       ├── Operational
//!       ├── Programming
//!       ├── Integrity
//!       ├── Data
//!       └── NotSupported
//! ```

use crate::client::DriverError;
use std::fmt;
use thiserror::Error;

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for adapter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The cursor was closed and can no longer execute or fetch.
    #[error("Cursor is closed")]
    CursorClosed,

    /// A fetch was attempted before any query was executed.
    #[error("No query yet")]
    NoQueryYet,

    /// Important warning raised by the adapter.
    #[error("Warning: {message}")]
    Warning { message: String },

    /// Misuse of the adapter interface.
    #[error("Interface error: {message}")]
    Interface { message: String },

    /// Malformed connection descriptor.
    #[error("Invalid DSN: {message}")]
    InvalidDsn { message: String },

    /// Database error without a more specific kind.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Internal database error.
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Failure reported by the underlying client.
    #[error("Operational error: {source}")]
    Operational {
        #[source]
        source: DriverError,
    },

    /// Programming error such as a bad query.
    #[error("Programming error: {message}")]
    Programming { message: String },

    /// Relational integrity violation.
    #[error("Integrity error: {message}")]
    Integrity { message: String },

    /// Problem with the processed data.
    #[error("Data error: {message}")]
    Data { message: String },

    /// Operation the database does not support.
    #[error("Not supported: {message}")]
    NotSupported { message: String },
}

impl Error {
    /// Create an interface error.
    pub fn interface(message: impl Into<String>) -> Self {
        Self::Interface {
            message: message.into(),
        }
    }

    /// Create an invalid DSN error.
    pub fn invalid_dsn(message: impl Into<String>) -> Self {
        Self::InvalidDsn {
            message: message.into(),
        }
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CursorClosed | Error::NoQueryYet => ErrorKind::Error,
            Error::Warning { .. } => ErrorKind::Warning,
            Error::Interface { .. } | Error::InvalidDsn { .. } => ErrorKind::Interface,
            Error::Database { .. } => ErrorKind::Database,
            Error::Internal { .. } => ErrorKind::Internal,
            Error::Operational { .. } => ErrorKind::Operational,
            Error::Programming { .. } => ErrorKind::Programming,
            Error::Integrity { .. } => ErrorKind::Integrity,
            Error::Data { .. } => ErrorKind::Data,
            Error::NotSupported { .. } => ErrorKind::NotSupported,
        }
    }

    /// Whether this error is a database error or one of its subkinds.
    pub fn is_database_error(&self) -> bool {
        self.kind().is_a(ErrorKind::Database)
    }

    /// The underlying client error, if this error wraps one.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Error::Operational { source } => Some(source),
            _ => None,
        }
    }
}

/// Translate a failure of the underlying client into the adapter taxonomy.
///
/// This is the only place a [`DriverError`] becomes an [`Error`].
pub fn translate_driver_error(err: DriverError) -> Error {
    Error::Operational { source: err }
}

/// Position of an error in the DB-API exception hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Warning,
    Error,
    Interface,
    Database,
    Internal,
    Operational,
    Programming,
    Integrity,
    Data,
    NotSupported,
}

impl ErrorKind {
    /// The immediate parent kind, `None` for the roots.
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Warning | ErrorKind::Error => None,
            ErrorKind::Interface | ErrorKind::Database => Some(ErrorKind::Error),
            ErrorKind::Internal
            | ErrorKind::Operational
            | ErrorKind::Programming
            | ErrorKind::Integrity
            | ErrorKind::Data
            | ErrorKind::NotSupported => Some(ErrorKind::Database),
        }
    }

    /// Whether this kind is `ancestor` or descends from it.
    pub fn is_a(self, ancestor: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// DB-API class name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Warning => "Warning",
            ErrorKind::Error => "Error",
            ErrorKind::Interface => "InterfaceError",
            ErrorKind::Database => "DatabaseError",
            ErrorKind::Internal => "InternalError",
            ErrorKind::Operational => "OperationalError",
            ErrorKind::Programming => "ProgrammingError",
            ErrorKind::Integrity => "IntegrityError",
            ErrorKind::Data => "DataError",
            ErrorKind::NotSupported => "NotSupportedError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

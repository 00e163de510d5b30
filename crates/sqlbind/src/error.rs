//! Error types for sqlbind

use thiserror::Error;

/// Result type alias for sqlbind operations
pub type BindResult<T> = Result<T, BindError>;

/// Boxed error produced by a row cursor or a custom unmarshaler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for statement construction and row binding
#[derive(Debug, Error)]
pub enum BindError {
    /// Absent input value
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Unsupported input shape
    #[error("Invalid input shape: {0}")]
    InvalidShape(String),

    /// A later row in a batch does not carry a column fixed by the first row
    #[error("Column mismatch: values[{row}] has no value for column '{column}'")]
    ColumnMismatch { row: usize, column: String },

    /// A VALUES row does not match the column count
    #[error("Argument count mismatch on row {row}: expected {expected} values, got {got}")]
    ArgCountMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// Build called without any VALUES row
    #[error("No data: at least one VALUES row is required")]
    NoData,

    /// Zero rows when a single destination was requested
    #[error("Empty result")]
    EmptyResult,

    /// Destination cannot be written
    #[error("Target is not settable: {0}")]
    NotSettable(String),

    /// Value could not be converted into the destination field
    #[error("Conversion failed on column '{column}': {message}")]
    Conversion { column: String, message: String },

    /// Cursor reference was absent
    #[error("Rows can't be nil")]
    NilCursor,

    /// Error raised by the row cursor itself
    #[error("Cursor error: {0}")]
    Cursor(#[source] BoxError),

    /// Dialect name not present in the registry
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),
}

impl BindError {
    /// Create a conversion error for a specific column
    pub fn conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a column mismatch error
    pub fn column_mismatch(row: usize, column: impl Into<String>) -> Self {
        Self::ColumnMismatch {
            row,
            column: column.into(),
        }
    }

    /// Wrap a cursor error
    pub fn cursor(err: impl Into<BoxError>) -> Self {
        Self::Cursor(err.into())
    }

    /// Check if this is a conversion error
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Check if this is an empty result error
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }

    /// Check if this error came from the normalizer or builder
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput(_)
                | Self::InvalidShape(_)
                | Self::ColumnMismatch { .. }
                | Self::ArgCountMismatch { .. }
                | Self::NoData
        )
    }

    /// Attach column context to a conversion error raised without one.
    pub(crate) fn with_column(self, column: &str) -> Self {
        match self {
            Self::Conversion { column: c, message } if c.is_empty() => Self::Conversion {
                column: column.to_string(),
                message,
            },
            other => other,
        }
    }
}

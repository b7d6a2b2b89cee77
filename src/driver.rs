//! The seam to the native driver handle.
//!
//! The driver executes SQL text, walks rows and columns one at a time, and
//! reports completion asynchronously. Each call returns a [`DriverStep`]:
//! [`DriverStep::Pending`] means the call has not truly finished and the same
//! call must be re-issued; [`DriverStep::Completed`] carries the real outcome.
//! [`crate::CompletionAdapter`] hides that retry contract from the rest of the
//! crate.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::SqlValue;

/// Outcome of one driver call invocation.
#[derive(Debug)]
pub enum DriverStep<T> {
    /// Scheduling artifact, not true completion; re-issue the same call.
    Pending,
    /// The call finished with this outcome.
    Completed(Result<T, DriverError>),
}

impl<T> DriverStep<T> {
    /// Successful terminal step.
    pub fn done(value: T) -> Self {
        Self::Completed(Ok(value))
    }

    /// Failed terminal step.
    pub fn fail(error: DriverError) -> Self {
        Self::Completed(Err(error))
    }
}

/// An error surfaced by the driver (constraint violation, syntax error,
/// truncation, connectivity loss, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Driver error: {message}")]
pub struct DriverError {
    pub message: String,
    /// Five-character state code, when the driver supplies one.
    pub sql_state: Option<String>,
    pub native_code: Option<i32>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            native_code: None,
        }
    }

    #[must_use]
    pub fn with_state(mut self, sql_state: impl Into<String>, native_code: i32) -> Self {
        self.sql_state = Some(sql_state.into());
        self.native_code = Some(native_code);
        self
    }
}

/// Logical type of a result column as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Number,
    Binary,
}

/// Descriptor for one result column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    pub size: u64,
    pub nullable: bool,
    pub col_type: ColumnType,
    /// Backend type name (e.g. `varchar`), when the driver supplies it.
    pub source_type: Option<String>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            size: 0,
            nullable: true,
            col_type,
            source_type: None,
        }
    }
}

/// One chunk of one column value. `more` signals that further chunks of the
/// same value follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunk {
    pub data: SqlValue,
    pub more: bool,
}

/// Outcome of advancing past a drained result set.
#[derive(Debug, Clone, PartialEq)]
pub enum NextResultSet {
    /// Another result set follows, with this metadata.
    More(Vec<ColumnMeta>),
    EndOfResults,
}

/// Contract the relay layer needs from a native driver handle.
///
/// A handle is exclusively owned by one [`crate::Connection`]; the operation
/// queue guarantees no two calls are ever in flight at once, so implementations
/// can keep cursor state in `&mut self` without further synchronization.
#[async_trait]
pub trait Driver: Send {
    async fn open(&mut self, connection_string: &str) -> DriverStep<()>;

    async fn close(&mut self) -> DriverStep<()>;

    /// Execute SQL text; completes with the first result set's metadata
    /// (empty when the statement produced no cursor).
    async fn execute(&mut self, sql: &str) -> DriverStep<Vec<ColumnMeta>>;

    /// Advance to the next row; completes with `false` once the current
    /// result set has no more rows.
    async fn read_row(&mut self) -> DriverStep<bool>;

    /// Read (the next chunk of) one column of the current row.
    async fn read_column(&mut self, column: usize) -> DriverStep<ColumnChunk>;

    /// Affected-row count of the current result set. Only meaningful for
    /// result sets without metadata.
    fn row_count(&self) -> i64;

    /// Advance past the current result set.
    async fn next_result_set(&mut self) -> DriverStep<NextResultSet>;

    async fn begin(&mut self) -> DriverStep<()>;

    async fn commit(&mut self) -> DriverStep<()>;

    async fn rollback(&mut self) -> DriverStep<()>;
}

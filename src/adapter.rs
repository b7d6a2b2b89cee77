use crate::driver::{ColumnChunk, ColumnMeta, Driver, DriverStep, NextResultSet};
use crate::error::SqlRelayError;

/// Re-issue the same driver call until it reports true completion.
///
/// The first notification from the driver may be a scheduling artifact rather
/// than a real outcome; retries must never be reordered or merged with other
/// queued requests, which holds here because the caller keeps exclusive `&mut`
/// access to the driver for the whole loop.
macro_rules! complete {
    ($call:expr) => {
        loop {
            match $call {
                DriverStep::Pending => {}
                DriverStep::Completed(outcome) => break outcome,
            }
        }
    };
}

/// Owns a [`Driver`] handle and collapses its retry-until-completed callback
/// contract into one terminal `Result` per call.
pub struct CompletionAdapter<D: Driver> {
    driver: D,
}

impl<D: Driver> CompletionAdapter<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn into_inner(self) -> D {
        self.driver
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when the driver rejects the
    /// connection attempt.
    pub async fn open(&mut self, connection_string: &str) -> Result<(), SqlRelayError> {
        complete!(self.driver.open(connection_string).await).map_err(SqlRelayError::from)
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when releasing the handle fails.
    pub async fn close(&mut self) -> Result<(), SqlRelayError> {
        complete!(self.driver.close().await).map_err(SqlRelayError::from)
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when statement execution fails.
    pub async fn execute(&mut self, sql: &str) -> Result<Vec<ColumnMeta>, SqlRelayError> {
        complete!(self.driver.execute(sql).await).map_err(SqlRelayError::from)
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when the row fetch fails.
    pub async fn read_row(&mut self) -> Result<bool, SqlRelayError> {
        complete!(self.driver.read_row().await).map_err(SqlRelayError::from)
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when the column read fails.
    pub async fn read_column(&mut self, column: usize) -> Result<ColumnChunk, SqlRelayError> {
        complete!(self.driver.read_column(column).await).map_err(SqlRelayError::from)
    }

    pub fn row_count(&self) -> i64 {
        self.driver.row_count()
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when advancing fails.
    pub async fn next_result_set(&mut self) -> Result<NextResultSet, SqlRelayError> {
        complete!(self.driver.next_result_set().await).map_err(SqlRelayError::from)
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when the driver cannot start
    /// a transaction.
    pub async fn begin(&mut self) -> Result<(), SqlRelayError> {
        complete!(self.driver.begin().await).map_err(SqlRelayError::from)
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when the commit fails.
    pub async fn commit(&mut self) -> Result<(), SqlRelayError> {
        complete!(self.driver.commit().await).map_err(SqlRelayError::from)
    }

    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when the rollback fails.
    pub async fn rollback(&mut self) -> Result<(), SqlRelayError> {
        complete!(self.driver.rollback().await).map_err(SqlRelayError::from)
    }
}

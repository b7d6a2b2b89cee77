//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::ConnectionConfig;
pub use crate::connection::Connection;
pub use crate::driver::{
    ColumnChunk, ColumnMeta, ColumnType, Driver, DriverError, DriverStep, NextResultSet,
};
pub use crate::error::SqlRelayError;
pub use crate::events::{QueryStream, RecordStream, StreamEvent};
pub use crate::results::{RecordSet, ResultPackage, SqlRow, objectify};
pub use crate::types::SqlValue;

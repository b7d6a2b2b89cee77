//! Serialized operation queue and result streaming over an ODBC-style
//! asynchronous database driver.
//!
//! A [`Connection`] owns one driver handle exclusively and runs every
//! driver-affecting call (queries, transaction control, close) strictly in
//! submission order, one at a time. Query results can be consumed as a live
//! [`StreamEvent`] stream or buffered into one package per result set.

mod adapter;
mod connection;
mod engine;
mod events;
mod helpers;
mod params;
mod results;

pub mod config;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use adapter::CompletionAdapter;
pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use connection::Connection;
pub use driver::{
    ColumnChunk, ColumnMeta, ColumnType, Driver, DriverError, DriverStep, NextResultSet,
};
pub use error::SqlRelayError;
pub use events::{QueryStream, RecordStream, StreamEvent};
pub use helpers::{query, query_raw};
pub use params::inline_params;
pub use results::{RecordSet, ResultPackage, SqlRow, objectify};
pub use types::SqlValue;

//! One-shot helpers: open a throwaway connection, run exactly one query,
//! close once the last buffered package has been delivered.

use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::SqlRelayError;
use crate::results::{RecordSet, ResultPackage};
use crate::types::SqlValue;

/// Run one query on a fresh connection and return its buffered packages.
///
/// # Errors
/// Returns open, inlining, or driver failures; the connection is closed on
/// both paths.
pub async fn query_raw<D>(
    driver: D,
    config: &ConnectionConfig,
    sql: &str,
    params: &[SqlValue],
) -> Result<Vec<ResultPackage>, SqlRelayError>
where
    D: Driver + 'static,
{
    let connection = Connection::open(driver, config).await?;
    let packages = connection.query_raw(sql, params).collect_results().await;
    let closed = connection.close().await;
    let packages = packages?;
    closed?;
    Ok(packages)
}

/// Run one query on a fresh connection and return objectified record sets.
///
/// # Errors
/// Returns open, inlining, or driver failures; the connection is closed on
/// both paths.
pub async fn query<D>(
    driver: D,
    config: &ConnectionConfig,
    sql: &str,
    params: &[SqlValue],
) -> Result<Vec<RecordSet>, SqlRelayError>
where
    D: Driver + 'static,
{
    let connection = Connection::open(driver, config).await?;
    let records = connection.query(sql, params).collect_records().await;
    let closed = connection.close().await;
    let records = records?;
    closed?;
    Ok(records)
}

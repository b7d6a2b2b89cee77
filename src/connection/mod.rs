//! Connection facade: the public surface over one driver handle and its
//! operation queue.

mod worker;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};

use crate::adapter::CompletionAdapter;
use crate::config::ConnectionConfig;
use crate::driver::Driver;
use crate::error::SqlRelayError;
use crate::events::{QueryStream, RecordStream, StreamEvent};
use crate::params::inline_params;
use crate::types::SqlValue;

use worker::Operation;

/// An open database connection.
///
/// Owns one driver handle through a dedicated worker task; every operation
/// submitted here queues behind the ones before it and runs alone. Cloning
/// yields another handle on the same connection and queue.
#[derive(Clone)]
pub struct Connection {
    operations: mpsc::UnboundedSender<Operation>,
    /// Set the moment close() is submitted; later submissions fail without
    /// reaching the driver.
    closed: Arc<AtomicBool>,
}

impl Connection {
    /// Open a connection over the given driver handle.
    ///
    /// Returns only after the driver has confirmed the connection succeeded.
    ///
    /// # Errors
    /// Returns the wrapped [`crate::DriverError`] when the driver rejects the
    /// connection attempt.
    pub async fn open<D>(driver: D, config: &ConnectionConfig) -> Result<Self, SqlRelayError>
    where
        D: Driver + 'static,
    {
        let mut adapter = CompletionAdapter::new(driver);
        adapter.open(config.connection_string()).await?;

        let (operations, receiver) = mpsc::unbounded_channel();
        tokio::spawn(worker::run(adapter, receiver));

        Ok(Self {
            operations,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Submit a query and return its event stream synchronously.
    ///
    /// Inlining and submission failures are delivered through the stream as a
    /// terminal `Error` event, so the returned handle is always usable.
    pub fn query_raw(&self, sql: &str, params: &[SqlValue]) -> QueryStream {
        let (events, stream) = QueryStream::channel();

        if self.closed.load(Ordering::SeqCst) {
            let _ = events.send(StreamEvent::Error(SqlRelayError::ConnectionClosed));
            return stream;
        }

        let text = match inline_params(sql, params) {
            Ok(text) => text,
            Err(err) => {
                let _ = events.send(StreamEvent::Error(err));
                return stream;
            }
        };

        if self
            .operations
            .send(Operation::Query { sql: text, events: events.clone() })
            .is_err()
        {
            let _ = events.send(StreamEvent::Error(SqlRelayError::ConnectionClosed));
        }

        stream
    }

    /// Submit a query whose buffered result sets are objectified into
    /// name-keyed records.
    pub fn query(&self, sql: &str, params: &[SqlValue]) -> RecordStream {
        RecordStream::new(self.query_raw(sql, params))
    }

    /// Queue a BEGIN TRANSACTION.
    ///
    /// # Errors
    /// Returns [`SqlRelayError::ConnectionClosed`] after close, or the driver
    /// failure otherwise.
    pub async fn begin_transaction(&self) -> Result<(), SqlRelayError> {
        self.control(|respond_to| Operation::Begin { respond_to })
            .await
    }

    /// Queue a COMMIT.
    ///
    /// # Errors
    /// Returns [`SqlRelayError::ConnectionClosed`] after close, or the driver
    /// failure otherwise.
    pub async fn commit(&self) -> Result<(), SqlRelayError> {
        self.control(|respond_to| Operation::Commit { respond_to })
            .await
    }

    /// Queue a ROLLBACK.
    ///
    /// # Errors
    /// Returns [`SqlRelayError::ConnectionClosed`] after close, or the driver
    /// failure otherwise.
    pub async fn rollback(&self) -> Result<(), SqlRelayError> {
        self.control(|respond_to| Operation::Rollback { respond_to })
            .await
    }

    /// Queue the close; operations already queued still run first, and every
    /// operation submitted afterwards fails with
    /// [`SqlRelayError::ConnectionClosed`] without reaching the driver.
    ///
    /// # Errors
    /// Returns [`SqlRelayError::ConnectionClosed`] on a second close, or the
    /// driver failure from releasing the handle.
    pub async fn close(&self) -> Result<(), SqlRelayError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(SqlRelayError::ConnectionClosed);
        }
        let (respond_to, outcome) = oneshot::channel();
        self.operations
            .send(Operation::Close { respond_to })
            .map_err(|_| SqlRelayError::ConnectionClosed)?;
        outcome.await.map_err(|_| SqlRelayError::ConnectionClosed)?
    }

    /// Whether close has been submitted on this connection.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn control<F>(&self, make: F) -> Result<(), SqlRelayError>
    where
        F: FnOnce(oneshot::Sender<Result<(), SqlRelayError>>) -> Operation,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SqlRelayError::ConnectionClosed);
        }
        let (respond_to, outcome) = oneshot::channel();
        self.operations
            .send(make(respond_to))
            .map_err(|_| SqlRelayError::ConnectionClosed)?;
        outcome.await.map_err(|_| SqlRelayError::ConnectionClosed)?
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .finish()
    }
}

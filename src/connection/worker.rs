use tokio::sync::{mpsc, oneshot};

use crate::adapter::CompletionAdapter;
use crate::driver::Driver;
use crate::engine;
use crate::error::SqlRelayError;
use crate::events::{EventSink, StreamEvent};

/// One queued unit of driver work.
pub(crate) enum Operation {
    Query {
        /// Literal SQL text, parameters already inlined.
        sql: String,
        events: mpsc::UnboundedSender<StreamEvent>,
    },
    Begin {
        respond_to: oneshot::Sender<Result<(), SqlRelayError>>,
    },
    Commit {
        respond_to: oneshot::Sender<Result<(), SqlRelayError>>,
    },
    Rollback {
        respond_to: oneshot::Sender<Result<(), SqlRelayError>>,
    },
    Close {
        respond_to: oneshot::Sender<Result<(), SqlRelayError>>,
    },
}

/// Per-connection operation queue.
///
/// The channel is the FIFO; this loop is the sole owner of the adapter (and
/// thus the driver handle), and it runs each operation to full completion,
/// including every result set of a query, before receiving the next. That is
/// the whole enforcement mechanism for the one-in-flight invariant, and it
/// advances the queue exactly once per operation.
pub(crate) async fn run<D: Driver>(
    mut adapter: CompletionAdapter<D>,
    mut operations: mpsc::UnboundedReceiver<Operation>,
) {
    while let Some(operation) = operations.recv().await {
        match operation {
            Operation::Query { sql, events } => {
                tracing::debug!(sql = %sql, "executing query");
                let sink = EventSink::new(events);
                engine::run_query(&mut adapter, &sql, &sink).await;
            }
            Operation::Begin { respond_to } => {
                tracing::debug!("beginning transaction");
                respond(respond_to, adapter.begin().await);
            }
            Operation::Commit { respond_to } => {
                tracing::debug!("committing transaction");
                respond(respond_to, adapter.commit().await);
            }
            Operation::Rollback { respond_to } => {
                tracing::debug!("rolling back transaction");
                respond(respond_to, adapter.rollback().await);
            }
            Operation::Close { respond_to } => {
                tracing::debug!("closing connection");
                respond(respond_to, adapter.close().await);
                tracing::debug!("connection worker stopped");
                return;
            }
        }
    }

    // Every handle was dropped without close; release the driver handle anyway.
    tracing::debug!("connection abandoned, releasing driver handle");
    if let Err(err) = adapter.close().await {
        tracing::error!(error = %err, "failed to release abandoned driver handle");
    }
}

/// Route an operation outcome to its caller; a failure nobody is waiting on
/// is logged rather than dropped.
fn respond(
    respond_to: oneshot::Sender<Result<(), SqlRelayError>>,
    outcome: Result<(), SqlRelayError>,
) {
    if let Err(unrouted) = respond_to.send(outcome) {
        if let Err(err) = unrouted {
            tracing::error!(error = %err, "operation failed with no caller waiting");
        }
    }
}

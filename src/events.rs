//! Per-query event stream and the two consumption modes layered on it.
//!
//! The stream engine always emits [`StreamEvent`]s; buffered consumption is a
//! fold over that same stream ([`QueryStream::next_result`]), not a separate
//! code path inside the state machine.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

use crate::driver::ColumnMeta;
use crate::error::SqlRelayError;
use crate::results::{RecordSet, ResultPackage, objectify};
use crate::types::SqlValue;

/// One structured event of a query in flight.
#[derive(Debug)]
pub enum StreamEvent {
    /// Column metadata for a result set that has a cursor.
    Meta(Arc<Vec<ColumnMeta>>),
    /// A row is about to stream; the index is a single counter that runs
    /// across chained result sets.
    Row(usize),
    /// One chunk of one column value; `more` signals further chunks.
    Column {
        index: usize,
        data: SqlValue,
        more: bool,
    },
    /// Affected-row count of a result set without a cursor.
    RowCount(i64),
    /// Terminal: every result set fully drained.
    Done,
    /// Terminal: the query aborted; no further packages are delivered.
    Error(SqlRelayError),
}

/// Emitter side of a query's event stream, owned by the connection worker.
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl EventSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event to the stream. A dropped receiver is tolerated for
    /// data events, but a terminal error with nobody listening is logged so
    /// the failure is never silently swallowed.
    pub(crate) fn emit(&self, event: StreamEvent) {
        if let Err(unrouted) = self.tx.send(event) {
            if let StreamEvent::Error(err) = unrouted.0 {
                tracing::error!(error = %err, "query failed with no remaining consumer");
            }
        }
    }
}

/// Live handle on one query's results, returned synchronously at submit time.
///
/// Streaming mode: consume raw [`StreamEvent`]s via [`Self::next_event`] or
/// the [`Stream`] impl. Buffered mode: [`Self::next_result`] folds events into
/// one [`ResultPackage`] per result set. The handle is finished once the
/// terminal `Done` or `Error` event has been observed.
pub struct QueryStream {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    /// Result set assembled but not yet released; its `more` flag is only
    /// known once the next boundary event arrives.
    current: Option<ResultPackage>,
    finished: bool,
}

impl QueryStream {
    pub(crate) fn channel() -> (mpsc::UnboundedSender<StreamEvent>, QueryStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            QueryStream {
                events: rx,
                current: None,
                finished: false,
            },
        )
    }

    /// Next raw event, or `None` once the stream is exhausted.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Assemble and return the next complete result set.
    ///
    /// Returns `None` after the query has finished. A query error surfaces
    /// exactly once as `Some(Err(..))`; a partially assembled result set is
    /// discarded rather than delivered as complete.
    pub async fn next_result(&mut self) -> Option<Result<ResultPackage, SqlRelayError>> {
        if self.finished {
            return None;
        }

        while let Some(event) = self.events.recv().await {
            match event {
                StreamEvent::Meta(meta) => {
                    let fresh = ResultPackage::with_meta(meta);
                    if let Some(done) = self.current.replace(fresh) {
                        return Some(Ok(done.finish(true)));
                    }
                }
                StreamEvent::Row(_) => {
                    if let Some(package) = self.current.as_mut() {
                        package.rows.push(Vec::new());
                    }
                }
                StreamEvent::Column { index, data, .. } => {
                    if let Some(row) = self
                        .current
                        .as_mut()
                        .and_then(|package| package.rows.last_mut())
                    {
                        if index == row.len() {
                            row.push(data);
                        } else if let Some(slot) = row.get_mut(index) {
                            slot.append_chunk(data);
                        }
                    }
                }
                StreamEvent::RowCount(n) => {
                    let fresh = ResultPackage::rowcount(n);
                    if let Some(done) = self.current.replace(fresh) {
                        return Some(Ok(done.finish(true)));
                    }
                }
                StreamEvent::Done => {
                    self.finished = true;
                    return self.current.take().map(|done| Ok(done.finish(false)));
                }
                StreamEvent::Error(err) => {
                    self.finished = true;
                    self.current = None;
                    return Some(Err(err));
                }
            }
        }

        // Worker went away without a terminal event.
        self.finished = true;
        self.current = None;
        Some(Err(SqlRelayError::ConnectionError(
            "event stream ended before the query completed".to_owned(),
        )))
    }

    /// Drain the query into one package per result set.
    ///
    /// # Errors
    /// Returns the first query error; earlier complete packages are dropped
    /// with it since the query did not finish.
    pub async fn collect_results(mut self) -> Result<Vec<ResultPackage>, SqlRelayError> {
        let mut packages = Vec::new();
        while let Some(outcome) = self.next_result().await {
            packages.push(outcome?);
        }
        Ok(packages)
    }
}

impl Stream for QueryStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().events.poll_recv(cx)
    }
}

/// Objectified counterpart of [`QueryStream`]: yields name-keyed records per
/// result set, with the same `more` chaining.
pub struct RecordStream {
    inner: QueryStream,
}

impl RecordStream {
    pub(crate) fn new(inner: QueryStream) -> Self {
        Self { inner }
    }

    /// Next objectified result set, or `None` once the query has finished.
    pub async fn next_records(&mut self) -> Option<Result<RecordSet, SqlRelayError>> {
        Some(self.inner.next_result().await?.map(objectify))
    }

    /// Drain the query into one record set per result set.
    ///
    /// # Errors
    /// Returns the first query error encountered.
    pub async fn collect_records(mut self) -> Result<Vec<RecordSet>, SqlRelayError> {
        let mut sets = Vec::new();
        while let Some(outcome) = self.next_records().await {
            sets.push(outcome?);
        }
        Ok(sets)
    }

    /// Drop down to the raw event stream.
    #[must_use]
    pub fn into_raw(self) -> QueryStream {
        self.inner
    }
}

//! Result stream engine: drives one query from SQL text to a fully drained
//! chain of result sets.
//!
//! Walks metadata, rows, column chunks, and next-result-set through the
//! completion adapter, emitting structured events as data arrives. Any driver
//! error aborts the remaining machine; the terminal `Done`/`Error` event is
//! the signal on which the operation queue advances.

use std::sync::Arc;

use crate::adapter::CompletionAdapter;
use crate::driver::{Driver, NextResultSet};
use crate::error::SqlRelayError;
use crate::events::{EventSink, StreamEvent};

/// Run one query to its terminal event.
pub(crate) async fn run_query<D: Driver>(
    adapter: &mut CompletionAdapter<D>,
    sql: &str,
    sink: &EventSink,
) {
    match stream_result_sets(adapter, sql, sink).await {
        Ok(()) => sink.emit(StreamEvent::Done),
        Err(err) => {
            tracing::debug!(error = %err, "query aborted");
            sink.emit(StreamEvent::Error(err));
        }
    }
}

async fn stream_result_sets<D: Driver>(
    adapter: &mut CompletionAdapter<D>,
    sql: &str,
    sink: &EventSink,
) -> Result<(), SqlRelayError> {
    let mut meta = adapter.execute(sql).await?;

    // Single counter across chained result sets, matching the wire behavior
    // callers already depend on.
    let mut row_index = 0usize;

    loop {
        if meta.is_empty() {
            // No cursor: this result set only carries an affected-row count.
            sink.emit(StreamEvent::RowCount(adapter.row_count()));
        } else {
            let shared = Arc::new(meta);
            sink.emit(StreamEvent::Meta(Arc::clone(&shared)));

            while adapter.read_row().await? {
                sink.emit(StreamEvent::Row(row_index));
                row_index += 1;
                for column in 0..shared.len() {
                    stream_column_chunks(adapter, column, sink).await?;
                }
            }
        }

        match adapter.next_result_set().await? {
            NextResultSet::More(next) => meta = next,
            NextResultSet::EndOfResults => {
                tracing::debug!(rows = row_index, "query drained");
                return Ok(());
            }
        }
    }
}

async fn stream_column_chunks<D: Driver>(
    adapter: &mut CompletionAdapter<D>,
    column: usize,
    sink: &EventSink,
) -> Result<(), SqlRelayError> {
    loop {
        let chunk = adapter.read_column(column).await?;
        let more = chunk.more;
        sink.emit(StreamEvent::Column {
            index: column,
            data: chunk.data,
            more,
        });
        if !more {
            return Ok(());
        }
    }
}

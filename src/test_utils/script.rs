use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::driver::{
    ColumnChunk, ColumnMeta, ColumnType, Driver, DriverError, DriverStep, NextResultSet,
};
use crate::types::SqlValue;

/// One scripted result set served by [`ScriptedDriver`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedResultSet {
    meta: Vec<ColumnMeta>,
    /// row -> column -> chunks of that column's value
    rows: Vec<Vec<Vec<SqlValue>>>,
    rows_affected: i64,
}

impl ScriptedResultSet {
    /// Result set with the given column names and one chunk per cell.
    #[must_use]
    pub fn rows(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
        Self::chunked(
            columns,
            rows.into_iter()
                .map(|row| row.into_iter().map(|cell| vec![cell]).collect())
                .collect(),
        )
    }

    /// Result set with explicit per-cell chunk lists.
    #[must_use]
    pub fn chunked(columns: &[&str], rows: Vec<Vec<Vec<SqlValue>>>) -> Self {
        let meta = columns
            .iter()
            .map(|name| ColumnMeta::new(*name, ColumnType::Text))
            .collect();
        Self::with_meta(meta, rows)
    }

    #[must_use]
    pub fn with_meta(meta: Vec<ColumnMeta>, rows: Vec<Vec<Vec<SqlValue>>>) -> Self {
        Self {
            meta,
            rows,
            rows_affected: 0,
        }
    }

    /// Cursor-less result set carrying only an affected-row count.
    #[must_use]
    pub fn rowcount(rows_affected: i64) -> Self {
        Self {
            meta: Vec::new(),
            rows: Vec::new(),
            rows_affected,
        }
    }
}

#[derive(Debug, Clone)]
struct ScriptedQuery {
    expect_sql: Option<String>,
    outcome: Result<Vec<ScriptedResultSet>, DriverError>,
}

struct ActiveQuery {
    sets: VecDeque<ScriptedResultSet>,
    rows: VecDeque<Vec<Vec<SqlValue>>>,
    current_row: Vec<VecDeque<SqlValue>>,
}

impl ActiveQuery {
    fn new(sets: Vec<ScriptedResultSet>) -> Self {
        let mut active = Self {
            sets: sets.into(),
            rows: VecDeque::new(),
            current_row: Vec::new(),
        };
        active.load_front();
        active
    }

    fn load_front(&mut self) {
        self.rows = self
            .sets
            .front()
            .map(|set| set.rows.clone().into())
            .unwrap_or_default();
        self.current_row = Vec::new();
    }
}

/// Replay driver: serves scripted queries in order and records every call.
///
/// Refuses overlapping queries and out-of-script calls with a [`DriverError`],
/// which makes queue-ordering violations loud in tests.
pub struct ScriptedDriver {
    queries: VecDeque<ScriptedQuery>,
    active: Option<ActiveQuery>,
    commit_failure: Option<DriverError>,
    stall_once_per_call: bool,
    mid_call: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queries: VecDeque::new(),
            active: None,
            commit_failure: None,
            stall_once_per_call: false,
            mid_call: false,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the call log; clone it before moving the driver into a
    /// connection.
    #[must_use]
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }

    /// Expect this exact SQL text next and serve the given result sets.
    #[must_use]
    pub fn expect_query(mut self, sql: impl Into<String>, sets: Vec<ScriptedResultSet>) -> Self {
        self.queries.push_back(ScriptedQuery {
            expect_sql: Some(sql.into()),
            outcome: Ok(sets),
        });
        self
    }

    /// Serve the given result sets for the next query, whatever its text.
    #[must_use]
    pub fn expect_any_query(mut self, sets: Vec<ScriptedResultSet>) -> Self {
        self.queries.push_back(ScriptedQuery {
            expect_sql: None,
            outcome: Ok(sets),
        });
        self
    }

    /// Fail the next query at the execute stage.
    #[must_use]
    pub fn expect_failure(mut self, sql: impl Into<String>, error: DriverError) -> Self {
        self.queries.push_back(ScriptedQuery {
            expect_sql: Some(sql.into()),
            outcome: Err(error),
        });
        self
    }

    /// Fail the next commit call.
    #[must_use]
    pub fn fail_on_commit(mut self, error: DriverError) -> Self {
        self.commit_failure = Some(error);
        self
    }

    /// Report `Pending` once per driver call before completing, exercising
    /// the adapter's retry loop.
    #[must_use]
    pub fn stall_once_per_call(mut self) -> Self {
        self.stall_once_per_call = true;
        self
    }

    fn record(&self, entry: impl Into<String>) {
        if let Ok(mut log) = self.log.lock() {
            log.push(entry.into());
        }
    }

    /// True when this invocation should report `Pending`.
    fn stall(&mut self) -> bool {
        if self.stall_once_per_call && !self.mid_call {
            self.mid_call = true;
            return true;
        }
        self.mid_call = false;
        false
    }
}

#[async_trait]
impl Driver for ScriptedDriver {
    async fn open(&mut self, connection_string: &str) -> DriverStep<()> {
        if self.stall() {
            return DriverStep::Pending;
        }
        self.record(format!("open:{connection_string}"));
        DriverStep::done(())
    }

    async fn close(&mut self) -> DriverStep<()> {
        if self.stall() {
            return DriverStep::Pending;
        }
        self.record("close");
        DriverStep::done(())
    }

    async fn execute(&mut self, sql: &str) -> DriverStep<Vec<ColumnMeta>> {
        if self.stall() {
            return DriverStep::Pending;
        }
        self.record(format!("execute:{sql}"));

        if self.active.is_some() {
            return DriverStep::fail(DriverError::new(
                "execute while another query is still in flight",
            ));
        }
        let Some(script) = self.queries.pop_front() else {
            return DriverStep::fail(DriverError::new(format!("unscripted query: {sql}")));
        };
        if let Some(expected) = &script.expect_sql {
            if expected != sql {
                return DriverStep::fail(DriverError::new(format!(
                    "expected query {expected:?}, got {sql:?}"
                )));
            }
        }
        match script.outcome {
            Ok(sets) => {
                let active = ActiveQuery::new(sets);
                let meta = active
                    .sets
                    .front()
                    .map(|set| set.meta.clone())
                    .unwrap_or_default();
                self.active = Some(active);
                DriverStep::done(meta)
            }
            Err(error) => DriverStep::fail(error),
        }
    }

    async fn read_row(&mut self) -> DriverStep<bool> {
        if self.stall() {
            return DriverStep::Pending;
        }
        let Some(active) = self.active.as_mut() else {
            return DriverStep::fail(DriverError::new("read_row with no query in flight"));
        };
        match active.rows.pop_front() {
            Some(row) => {
                active.current_row = row.into_iter().map(VecDeque::from).collect();
                DriverStep::done(true)
            }
            None => DriverStep::done(false),
        }
    }

    async fn read_column(&mut self, column: usize) -> DriverStep<ColumnChunk> {
        if self.stall() {
            return DriverStep::Pending;
        }
        let Some(active) = self.active.as_mut() else {
            return DriverStep::fail(DriverError::new("read_column with no query in flight"));
        };
        let Some(chunks) = active.current_row.get_mut(column) else {
            return DriverStep::fail(DriverError::new(format!(
                "read_column {column} out of range"
            )));
        };
        match chunks.pop_front() {
            Some(data) => DriverStep::done(ColumnChunk {
                data,
                more: !chunks.is_empty(),
            }),
            None => DriverStep::fail(DriverError::new(format!(
                "column {column} already fully read"
            ))),
        }
    }

    fn row_count(&self) -> i64 {
        self.active
            .as_ref()
            .and_then(|active| active.sets.front())
            .map_or(0, |set| set.rows_affected)
    }

    async fn next_result_set(&mut self) -> DriverStep<NextResultSet> {
        if self.stall() {
            return DriverStep::Pending;
        }
        let Some(active) = self.active.as_mut() else {
            return DriverStep::fail(DriverError::new(
                "next_result_set with no query in flight",
            ));
        };
        active.sets.pop_front();
        if let Some(next) = active.sets.front() {
            let meta = next.meta.clone();
            active.load_front();
            DriverStep::done(NextResultSet::More(meta))
        } else {
            self.active = None;
            self.record("end_of_results");
            DriverStep::done(NextResultSet::EndOfResults)
        }
    }

    async fn begin(&mut self) -> DriverStep<()> {
        if self.stall() {
            return DriverStep::Pending;
        }
        self.record("begin");
        DriverStep::done(())
    }

    async fn commit(&mut self) -> DriverStep<()> {
        if self.stall() {
            return DriverStep::Pending;
        }
        self.record("commit");
        match self.commit_failure.take() {
            Some(error) => DriverStep::fail(error),
            None => DriverStep::done(()),
        }
    }

    async fn rollback(&mut self) -> DriverStep<()> {
        if self.stall() {
            return DriverStep::Pending;
        }
        self.record("rollback");
        DriverStep::done(())
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use crate::driver::ColumnMeta;
use crate::results::row::SqlRow;
use crate::types::SqlValue;

/// One fully buffered result set, positional form.
///
/// A query yields a chain of these; every package but the last carries
/// `more == true`. Result sets without a cursor (DML) have no metadata and
/// report an affected-row count instead of rows.
#[derive(Debug, Clone, Default)]
pub struct ResultPackage {
    /// Column descriptors, shared with any `Meta` stream event for this set.
    pub meta: Option<Arc<Vec<ColumnMeta>>>,
    /// Positional rows, present when `meta` is.
    pub rows: Vec<Vec<SqlValue>>,
    /// Affected-row count, present when `meta` is not.
    pub rows_affected: Option<i64>,
    /// Whether further result sets follow this one.
    pub more: bool,
}

impl ResultPackage {
    pub(crate) fn with_meta(meta: Arc<Vec<ColumnMeta>>) -> Self {
        Self {
            meta: Some(meta),
            ..Self::default()
        }
    }

    pub(crate) fn rowcount(rows_affected: i64) -> Self {
        Self {
            rows_affected: Some(rows_affected),
            ..Self::default()
        }
    }

    pub(crate) fn finish(mut self, more: bool) -> Self {
        self.more = more;
        self
    }

    /// True for affected-rows-only packages (no cursor).
    #[must_use]
    pub fn is_rowcount(&self) -> bool {
        self.meta.is_none()
    }
}

/// One objectified result set: rows keyed by resolved column names.
#[derive(Debug, Clone)]
pub struct RecordSet {
    /// Resolved, collision-free column names in metadata order.
    pub column_names: Arc<Vec<String>>,
    pub records: Vec<SqlRow>,
    /// Affected-row count for packages without metadata.
    pub rows_affected: Option<i64>,
    /// Whether further result sets follow this one.
    pub more: bool,
}

/// Assign each column a unique name.
///
/// Driver-supplied non-empty names win on first use. Blank and duplicate
/// names synthesize `Column<index>`, falling back to `Column<index>_<n>` for
/// increasing `n` until the candidate collides with neither a driver-supplied
/// name nor an earlier synthesized one.
pub(crate) fn assign_column_names(meta: &[ColumnMeta]) -> Vec<String> {
    let mut names = vec![String::new(); meta.len()];
    let mut taken: HashSet<String> = HashSet::with_capacity(meta.len());

    for (idx, column) in meta.iter().enumerate() {
        if !column.name.is_empty() && taken.insert(column.name.clone()) {
            names[idx] = column.name.clone();
        }
    }

    for (idx, slot) in names.iter_mut().enumerate() {
        if slot.is_empty() {
            let mut extra = 0;
            let mut candidate = format!("Column{idx}");
            while !taken.insert(candidate.clone()) {
                candidate = format!("Column{idx}_{extra}");
                extra += 1;
            }
            *slot = candidate;
        }
    }

    names
}

/// Project a positional package into name-keyed records.
///
/// Pure post-processing over a completed package; rowcount-only packages pass
/// through with no records.
#[must_use]
pub fn objectify(package: ResultPackage) -> RecordSet {
    match package.meta {
        Some(meta) => {
            let column_names = Arc::new(assign_column_names(&meta));
            let records = package
                .rows
                .into_iter()
                .map(|values| SqlRow::new(Arc::clone(&column_names), values))
                .collect();
            RecordSet {
                column_names,
                records,
                rows_affected: None,
                more: package.more,
            }
        }
        None => RecordSet {
            column_names: Arc::new(Vec::new()),
            records: Vec::new(),
            rows_affected: package.rows_affected,
            more: package.more,
        },
    }
}

//! Buffered result packages and name-keyed row records.

mod result_set;
mod row;

pub use result_set::{RecordSet, ResultPackage, objectify};
pub use row::SqlRow;

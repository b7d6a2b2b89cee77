//! Test helpers: a scripted replay [`crate::Driver`] for exercising the
//! operation queue and stream engine without a real database.

mod script;

pub use script::{ScriptedDriver, ScriptedResultSet};

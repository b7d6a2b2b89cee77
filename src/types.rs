use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Values that can appear in a result row or be inlined as query parameters.
///
/// This enum provides a unified representation of database values independent
/// of the underlying driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Boolean accessor; the driver reports bit columns as 0/1 numbers, so
    /// those coerce here.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Timestamp accessor; text values in the common datetime formats are
    /// parsed on the fly since the driver reads datetimes as text.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            // `%.f` also matches an absent fraction, covering whole seconds.
            Self::Text(text) => {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok()
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Merge a later chunk of a chunked column read into this slot.
    ///
    /// Text and binary values accumulate by append; the driver only chunks
    /// those two kinds, so any other pairing replaces the slot.
    pub(crate) fn append_chunk(&mut self, chunk: SqlValue) {
        match (&mut *self, chunk) {
            (SqlValue::Text(acc), SqlValue::Text(next)) => acc.push_str(&next),
            (SqlValue::Blob(acc), SqlValue::Blob(next)) => acc.extend_from_slice(&next),
            (slot, next) => {
                tracing::warn!("chunk continuation with mismatched value kinds; replacing slot");
                *slot = next;
            }
        }
    }
}

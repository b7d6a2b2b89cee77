use std::fmt::Write as _;

use crate::error::SqlRelayError;
use crate::types::SqlValue;

/// Inline typed parameters into a `?`-placeholder query template as literal
/// SQL text.
///
/// An empty parameter list returns the template verbatim, so queries may
/// contain literal `?` characters only when no parameters are supplied.
/// Placeholder and parameter counts must otherwise match exactly.
///
/// # Errors
/// Returns [`SqlRelayError::ParameterError`] on a placeholder/parameter count
/// mismatch and [`SqlRelayError::InvalidParameterType`] for values with no SQL
/// literal form.
pub fn inline_params(template: &str, params: &[SqlValue]) -> Result<String, SqlRelayError> {
    if params.is_empty() {
        return Ok(template.to_owned());
    }

    let segments: Vec<&str> = template.split('?').collect();
    let placeholders = segments.len() - 1;
    if placeholders != params.len() {
        return Err(SqlRelayError::ParameterError(format!(
            "query has {placeholders} placeholders but {} parameters were supplied",
            params.len()
        )));
    }

    let mut combined = String::with_capacity(template.len());
    for (segment, value) in segments.iter().zip(params) {
        combined.push_str(segment);
        combined.push_str(&literal(value)?);
    }
    combined.push_str(segments[placeholders]);
    Ok(combined)
}

fn literal(value: &SqlValue) -> Result<String, SqlRelayError> {
    match value {
        // Embedded quotes are doubled globally; a single replace would leave
        // an injection hole on values with more than one quote.
        SqlValue::Text(text) => Ok(format!("'{}'", text.replace('\'', "''"))),
        SqlValue::Int(n) => Ok(n.to_string()),
        SqlValue::Float(f) if f.is_finite() => Ok(f.to_string()),
        SqlValue::Float(f) => Err(SqlRelayError::InvalidParameterType(format!(
            "non-finite float {f} has no SQL literal form"
        ))),
        SqlValue::Bool(b) => Ok(if *b { "1" } else { "0" }.to_owned()),
        SqlValue::Blob(bytes) => {
            let mut encoded = String::with_capacity(2 + bytes.len() * 2);
            encoded.push_str("0x");
            for byte in bytes {
                let _ = write!(encoded, "{byte:02x}");
            }
            Ok(encoded)
        }
        SqlValue::Timestamp(ts) => Ok(format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f"))),
        SqlValue::Null => Ok("NULL".to_owned()),
        SqlValue::Json(_) => Err(SqlRelayError::InvalidParameterType(
            "JSON values cannot be inlined as SQL literals".to_owned(),
        )),
    }
}

use crate::core::Record;
use serde_json::Value;

pub const ADDRESS_SEPARATOR: &str = ", ";

/// Joins the named fields of `record`, in order, into one query string.
/// A missing field contributes an empty segment.
pub fn build_address<S: AsRef<str>>(record: &Record, field_order: &[S]) -> String {
    field_order
        .iter()
        .map(|field| {
            record
                .data
                .get(field.as_ref())
                .map(value_text)
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(ADDRESS_SEPARATOR)
}

/// Plain text for a field value: strings verbatim, `null` empty, everything
/// else as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

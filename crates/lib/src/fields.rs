//! # Field List Handling
//!
//! Field names arrive either as a comma-separated string or as a JSON array.
//! Both forms end up as an ordered list of distinct, trimmed, non-empty names.

use crate::errors::DocfieldError;
use std::collections::HashSet;

/// Parses a raw field list, accepting `a, b, c` as well as `["a", "b", "c"]`.
pub fn parse_field_list(raw: &str) -> Result<Vec<String>, DocfieldError> {
    let trimmed = raw.trim();
    let names: Vec<String> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| {
            DocfieldError::InvalidFieldList(format!("field list is not a JSON array of strings: {e}"))
        })?
    } else {
        trimmed.split(',').map(str::to_string).collect()
    };
    normalize_fields(names)
}

/// Trims each name, drops blanks and duplicates while keeping first-seen order.
pub fn normalize_fields<I, S>(names: I) -> Result<Vec<String>, DocfieldError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let fields: Vec<String> = names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect();

    if fields.is_empty() {
        return Err(DocfieldError::EmptyFieldList);
    }
    Ok(fields)
}

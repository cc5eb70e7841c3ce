//! Raw filter token coercion.
//!
//! Turns the right-hand side of a `field:value` group into a typed value:
//! - `42` → `Int`
//! - `4.2` → `Float` (a literal `.` is required)
//! - `[1|2|3]` → `IntList`, `[1.5|2]` → `FloatList`, anything else → `StringList`
//! - everything else → `String`, verbatim

use std::fmt;

use serde::Serialize;

use super::error::QueryError;

const LIST_OPEN: char = '[';
const LIST_CLOSE: char = ']';
const LIST_SEPARATOR: char = '|';

/// Typed filter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Int(i64),
    Float(f64),
    String(String),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    StringList(Vec<String>),
}

impl FilterValue {
    /// True for the list variants.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            FilterValue::IntList(_) | FilterValue::FloatList(_) | FilterValue::StringList(_)
        )
    }

    /// Name of the value's type, used in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            FilterValue::Int(_) => "int",
            FilterValue::Float(_) => "float",
            FilterValue::String(_) => "string",
            FilterValue::IntList(_) => "list<int>",
            FilterValue::FloatList(_) => "list<float>",
            FilterValue::StringList(_) => "list<string>",
        }
    }
}

/// Renders the value back into filter-string syntax.
///
/// Floats always keep a `.` so the rendered token coerces to the same type.
impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Int(i) => write!(f, "{i}"),
            FilterValue::Float(x) => f.write_str(&render_float(*x)),
            FilterValue::String(s) => f.write_str(s),
            FilterValue::IntList(items) => {
                write_list(f, items.iter().map(ToString::to_string))
            }
            FilterValue::FloatList(items) => write_list(f, items.iter().map(|x| render_float(*x))),
            FilterValue::StringList(items) => write_list(f, items.iter().cloned()),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = String>) -> fmt::Result {
    let joined: Vec<String> = items.collect();
    write!(
        f,
        "{LIST_OPEN}{}{LIST_CLOSE}",
        joined.join(&LIST_SEPARATOR.to_string())
    )
}

fn render_float(x: f64) -> String {
    let rendered = x.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

/// Coerce a single raw token into a [`FilterValue`].
///
/// The token is never empty; the filter parser rejects empty values first.
pub fn coerce_value(raw: &str) -> Result<FilterValue, QueryError> {
    if let Some(inner) = raw
        .strip_prefix(LIST_OPEN)
        .and_then(|rest| rest.strip_suffix(LIST_CLOSE))
    {
        return coerce_list(inner);
    }

    if let Some(value) = coerce_int(raw) {
        return Ok(FilterValue::Int(value));
    }
    if let Some(value) = coerce_float(raw) {
        return Ok(FilterValue::Float(value));
    }

    if has_bracket(raw) {
        return Err(QueryError::InvalidListSyntax {
            fragment: raw.to_string(),
        });
    }

    Ok(FilterValue::String(raw.to_string()))
}

fn coerce_list(inner: &str) -> Result<FilterValue, QueryError> {
    if has_bracket(inner) {
        return Err(QueryError::InvalidListSyntax {
            fragment: inner.to_string(),
        });
    }

    if inner.is_empty() {
        return Ok(FilterValue::StringList(Vec::new()));
    }

    let elements: Vec<&str> = inner.split(LIST_SEPARATOR).collect();

    if let Some(ints) = elements
        .iter()
        .map(|e| coerce_int(e))
        .collect::<Option<Vec<i64>>>()
    {
        return Ok(FilterValue::IntList(ints));
    }

    // Int elements widen to float inside a float list.
    if let Some(floats) = elements
        .iter()
        .map(|e| coerce_int(e).map(|i| i as f64).or_else(|| coerce_float(e)))
        .collect::<Option<Vec<f64>>>()
    {
        return Ok(FilterValue::FloatList(floats));
    }

    Ok(FilterValue::StringList(
        elements.into_iter().map(str::to_string).collect(),
    ))
}

fn coerce_int(token: &str) -> Option<i64> {
    token.parse::<i64>().ok()
}

fn coerce_float(token: &str) -> Option<f64> {
    if !token.contains('.') {
        return None;
    }
    token.parse::<f64>().ok()
}

fn has_bracket(token: &str) -> bool {
    token.contains(LIST_OPEN) || token.contains(LIST_CLOSE)
}

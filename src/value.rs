//! Runtime values flowing through properties, bindings and pipes.

use alloc::collections::BTreeMap;
use core::fmt;

use serde_json::Number;

use crate::data_source::DataSource;
use crate::tree::NodeId;

/// A resolved property or binding value.
///
/// Simple bindings keep the native type of whatever they reference; only
/// composite bindings and text properties flatten to strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value; renders as the empty string.
    Null,
    /// Boolean.
    Bool(bool),
    /// Any number; whole numbers print without a fraction.
    Number(f64),
    /// Plain text. Escaped when written into literal output.
    Text(String),
    /// Pre-rendered markup that is written verbatim.
    Markup(String),
    /// Ordered list.
    List(Vec<Value>),
    /// String keyed record.
    Map(BTreeMap<String, Value>),
    /// A subtree owned by the node tree (sub-content and parameter lists).
    Content(NodeId),
    /// A lazy record sequence.
    Data(DataSource),
}

impl Value {
    /// Truthiness: null, `false`, zero, NaN, empty strings and empty
    /// collections are false; everything else is true.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) | Self::Markup(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Content(_) | Self::Data(_) => true,
        }
    }

    /// Whether the value is present: neither null nor the empty string.
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Text(s) | Self::Markup(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Look up one path segment: a key of a map or an index into a list.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(map) => map.get(key),
            Self::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Walk a dotted sub-path. Missing segments yield `Null`.
    #[must_use]
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Self {
        let mut current = self;
        for segment in path {
            match current.get(segment.as_ref()) {
                Some(next) => current = next,
                None => return Self::Null,
            }
        }
        current.clone()
    }

    /// Short lowercase name of the variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Markup(_) => "markup",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Content(_) => "content",
            Self::Data(_) => "data source",
        }
    }

    /// The string form of the value, as it would be written to output.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Numeric view of the value if it has one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert into JSON. Content and data handles become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null | Self::Content(_) | Self::Data(_) => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Number(n) => whole_number(*n).map_or_else(
                || Number::from_f64(*n).map_or(Json::Null, Json::Number),
                Json::from,
            ),
            Self::Text(s) | Self::Markup(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole_number(n: f64) -> Option<i64> {
    (n.fract() == 0.0 && n.abs() < 1e15).then_some(n as i64)
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    match whole_number(n) {
        Some(whole) => write!(f, "{whole}"),
        None => write!(f, "{n}"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::Content(_) | Self::Data(_) => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write_number(f, *n),
            Self::Text(s) | Self::Markup(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl From<DataSource> for Value {
    fn from(source: DataSource) -> Self {
        Self::Data(source)
    }
}

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The current values of one step's form state, keyed by field name.
pub type ValueMap = AHashMap<String, Value>;

/// Runtime value types held by form state and compared by condition rules.
///
/// The backend is loose about types ("5" where 5 is meant), so equality and
/// ordering deliberately coerce between `Number`, `Text` and `Bool` instead
/// of failing on a variant mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// Whether the value counts as absent for required-ness: `Null`, an
    /// empty or whitespace-only string, or an empty selection list.
    pub fn is_absent(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion. `Bool` maps to 0/1 and `Text` is parsed; values
    /// that cannot be read as a number yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// String coercion used by the text-shaped condition operations.
    pub fn coerce_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::coerce_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Loose equality: same-variant values compare structurally, while
    /// `Number`/`Text`/`Bool` cross-compare after numeric coercion.
    /// `Null` equals only `Null`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::List(_), _) | (_, Value::List(_)) => false,
            // Mixed Number/Text/Bool (and Number/Number, Bool/Bool):
            // both sides coerce to a number or the comparison fails.
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// The number of characters, for length constraints. Non-text values
    /// are measured through their string coercion.
    pub fn text_len(&self) -> usize {
        match self {
            Value::Text(s) => s.chars().count(),
            other => other.coerce_text().chars().count(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Formats whole numbers without a trailing `.0` so that `5.0` and `"5"`
/// coerce to the same text.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

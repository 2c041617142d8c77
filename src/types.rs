use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored entry: the plain mapping shape the store accepts and returns.
pub type Item = Map<String, Value>;

/// Name of the primary key field on every record and stored item.
pub const KEY_FIELD: &str = "key";

/// Maximum number of items accepted by a single `put_many` store call.
pub const PUT_MANY_LIMIT: usize = 25;

/// The filter shape understood by the store's `fetch` primitive.
///
/// A single mapping selects items matching every entry (AND); a list of
/// mappings selects items matching any one of them (OR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    All(Map<String, Value>),
    Any(Vec<Map<String, Value>>),
}

impl Filter {
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::All(m) => Value::Object(m.clone()),
            Self::Any(ms) => Value::Array(ms.iter().cloned().map(Value::Object).collect()),
        }
    }
}

/// Short display name of a JSON value's type, used in error messages.
#[must_use]
pub const fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

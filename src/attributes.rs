//! Schema-free attribute storage shared by branch and property records.
//!
//! Keys are whatever the feed sent. Reads go through [`Attributes::get`], which
//! always sees the current mapping, so a key that was merged in later is
//! readable straight away and a key removed by address consolidation simply
//! reads as `None`.

use serde::Serialize;
use serde_json::{Map, Value};

/// Location fields that enrichment folds into a nested `address` value.
pub const ADDRESS_FIELDS: [&str; 4] = ["street", "town", "county", "postcode"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Current value for `key`, or `None` if the feed never sent it (or it was
    /// moved under `address`).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Scalar value rendered as text. Strings, numbers and booleans qualify;
    /// null, nested mappings and arrays do not.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_to_text)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Last writer wins: incoming keys replace existing ones, keys absent from
    /// `incoming` are left alone. No type reconciliation happens.
    pub fn merge(&mut self, incoming: Map<String, Value>) {
        for (key, value) in incoming {
            self.0.insert(key, value);
        }
    }

    /// Moves `street`, `town`, `county` and `postcode` off the top level into a
    /// nested `address` mapping. All four keys are always present in the
    /// result; missing ones are null.
    pub fn consolidate_address(&mut self) {
        let mut address = Map::new();
        for field in ADDRESS_FIELDS {
            let value = self.0.remove(field).unwrap_or(Value::Null);
            address.insert(field.to_string(), value);
        }
        self.0.insert("address".to_string(), Value::Object(address));
    }

    /// The attribute set after an enrichment payload: merge, then consolidate.
    pub fn enriched(&self, incoming: Map<String, Value>) -> Attributes {
        let mut next = self.clone();
        next.merge(incoming);
        next.consolidate_address();
        next
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Typed view over the nested `address` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: Option<String>,
    pub town: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
}

impl Address {
    /// Reads an `address` mapping. Returns `None` if `value` is not a mapping.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let field = |name: &str| map.get(name).and_then(value_to_text);
        Some(Self {
            street: field("street"),
            town: field("town"),
            county: field("county"),
            postcode: field("postcode"),
        })
    }
}

pub(crate) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

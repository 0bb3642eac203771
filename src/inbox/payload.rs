use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// A decoded payload value. Closed over the shapes a JSON document can take.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Present means usable as a heuristic signal: not null and not a blank string.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(s) => !s.trim().is_empty(),
            _ => true,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedPayload {
    pub root: FieldValue,
    pub fields: BTreeMap<String, FieldValue>,
}

impl DecodedPayload {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(FieldValue::is_present)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(FieldValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Verbatim pretty dump of the document as decoded.
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.root).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Plain,
    Structured(DecodedPayload),
}

impl Payload {
    pub fn is_structured(&self) -> bool {
        matches!(self, Payload::Structured(_))
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            Payload::Plain => None,
            Payload::Structured(decoded) => Some(&decoded.fields),
        }
    }
}

pub fn parse_payload(raw: &str) -> Payload {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return Payload::Plain;
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Payload::Plain;
    };
    let fields = match &value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::from(v.clone())))
            .collect(),
        // Array roots are keyed by position.
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, v)| (idx.to_string(), FieldValue::from(v.clone())))
            .collect(),
        _ => return Payload::Plain,
    };
    Payload::Structured(DecodedPayload {
        root: value.into(),
        fields,
    })
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A protocol message: a JSON object with two reserved fields.
///
/// `id` correlates requests with replies — the server echoes the id it
/// received, the client assigns a UUID when none is set. `type` selects a
/// named server handler; messages without one route to the default handler.
/// Every other field passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Correlation id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Handler selector.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Application payload fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Message {
    /// Create an empty untyped message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message with the given `type` tag.
    pub fn typed(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Add an application field (builder style).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up an application field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The correlation id, assigning a fresh UUID first if none is set.
    pub fn ensure_id(&mut self) -> &str {
        self.id.get_or_insert_with(|| Uuid::new_v4().to_string())
    }

    /// Deserialize from a decoded JSON value.
    ///
    /// Fails for anything that is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serialize into a JSON value for the frame codec.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

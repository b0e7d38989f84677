//! Data types for nodes and scalar metadata.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A scalar metadata value, the only kind of value Chroma stores per key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A string value.
    Str(String),
}

impl MetadataValue {
    /// Convert a JSON scalar into a metadata value.
    ///
    /// Returns `None` for `null`, arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<MetadataValue> for Value {
    fn from(value: MetadataValue) -> Self {
        match value {
            MetadataValue::Bool(b) => Value::Bool(b),
            MetadataValue::Int(i) => Value::from(i),
            MetadataValue::Float(x) => Value::from(x),
            MetadataValue::Str(s) => Value::String(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A flat, scalar-valued metadata record as stored by the backend.
pub type Metadata = HashMap<String, MetadataValue>;

/// Controls how much metadata [`Node::content`] renders alongside the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataMode {
    /// Prefix the text with `key: value` lines.
    #[default]
    All,
    /// Render the bare text only.
    None,
}

/// A unit of indexed content: id, text, optional embedding and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Unique identifier for the node.
    pub id: String,
    /// The text content of the node.
    pub text: String,
    /// The vector embedding for this node's text, if computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Structured metadata. Values may be nested until flattened for storage.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// The ID of the source document this node was derived from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_doc_id: Option<String>,
}

impl Node {
    /// Create a node with a random UUID v4 id.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), text)
    }

    /// Create a node with the given id.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: None,
            metadata: Map::new(),
            ref_doc_id: None,
        }
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Insert a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the source document id.
    pub fn with_ref_doc_id(mut self, ref_doc_id: impl Into<String>) -> Self {
        self.ref_doc_id = Some(ref_doc_id.into());
        self
    }

    /// Render the node's content under the given [`MetadataMode`].
    pub fn content(&self, mode: MetadataMode) -> String {
        if mode == MetadataMode::None || self.metadata.is_empty() {
            return self.text.clone();
        }
        let header: Vec<String> = self
            .metadata
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}: {s}"),
                other => format!("{k}: {other}"),
            })
            .collect();
        format!("{}\n\n{}", header.join("\n"), self.text)
    }
}

//! Flattening of node metadata into backend records.
//!
//! Chroma stores one scalar per metadata key. [`node_to_metadata`] turns a
//! [`Node`]'s structured metadata into a flat [`Metadata`] record and injects
//! the bookkeeping keys that let the node be recognised on the way back.

use serde_json::{Map, Value};

use crate::error::{ChromaError, Result};
use crate::node::{Metadata, MetadataValue, Node};

/// Default key under which the node text is serialized.
pub const DEFAULT_TEXT_KEY: &str = "text";

/// Key holding the JSON-serialized node (without metadata and embedding).
pub const NODE_CONTENT_KEY: &str = "_node_content";

/// Key holding the node type name.
pub const NODE_TYPE_KEY: &str = "_node_type";

const TEXT_NODE_TYPE: &str = "TextNode";
const NO_REF_DOC: &str = "None";
const REF_DOC_KEYS: [&str; 3] = ["document_id", "doc_id", "ref_doc_id"];

/// Flatten a node's metadata into a scalar-valued record.
///
/// - `remove_text` blanks the text inside `_node_content`; use it when the
///   backend already stores the text as the record's document.
/// - `text_key` is the field name the text is serialized under.
/// - `flat_metadata` rejects nested values (objects and arrays) instead of
///   stringifying them. `null` values are dropped either way.
///
/// # Errors
///
/// Returns [`ChromaError::InvalidMetadata`] if `flat_metadata` is set and a
/// value is not a scalar.
pub fn node_to_metadata(
    node: &Node,
    remove_text: bool,
    text_key: &str,
    flat_metadata: bool,
) -> Result<Metadata> {
    let mut metadata = Metadata::with_capacity(node.metadata.len() + 5);

    for (key, value) in &node.metadata {
        if let Some(scalar) = MetadataValue::from_json(value) {
            metadata.insert(key.clone(), scalar);
        } else if value.is_null() {
            continue;
        } else if flat_metadata {
            return Err(ChromaError::InvalidMetadata {
                key: key.clone(),
                message: "value must be one of (string, number, boolean, null)".to_string(),
            });
        } else {
            metadata.insert(key.clone(), MetadataValue::Str(value.to_string()));
        }
    }

    let ref_doc_id = node.ref_doc_id.as_deref().unwrap_or(NO_REF_DOC);

    let mut content = Map::new();
    content.insert("id_".to_string(), Value::String(node.id.clone()));
    let text = if remove_text { String::new() } else { node.text.clone() };
    content.insert(text_key.to_string(), Value::String(text));
    content.insert("ref_doc_id".to_string(), Value::String(ref_doc_id.to_string()));

    metadata.insert(
        NODE_CONTENT_KEY.to_string(),
        MetadataValue::Str(serde_json::to_string(&Value::Object(content))?),
    );
    metadata.insert(NODE_TYPE_KEY.to_string(), MetadataValue::from(TEXT_NODE_TYPE));
    for key in REF_DOC_KEYS {
        metadata.insert(key.to_string(), MetadataValue::from(ref_doc_id));
    }

    Ok(metadata)
}

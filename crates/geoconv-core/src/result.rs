//! Successful conversion output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Converted payload, text for text formats and bytes for binary ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 output (SVG, EPS, DXF, ASCII STL).
    Text(String),
    /// Binary output (binary STL, BMP, ICO).
    Binary(Vec<u8>),
}

impl Payload {
    /// View the payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Binary(b) => b,
        }
    }

    /// Text content, if this is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Binary(_) => None,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True for an empty payload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume into raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Text(s) => s.into_bytes(),
            Payload::Binary(b) => b,
        }
    }
}

/// Descriptive metadata attached to a conversion result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Target format extension, e.g. `svg`.
    pub format: String,
    /// Payload size in bytes.
    pub size: usize,
    /// Output width in the target's native units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Output height in the target's native units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Decoded DXF entities or written DXF entities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_count: Option<usize>,
    /// Mesh triangles read or written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triangle_count: Option<usize>,
    /// Projected faces drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_count: Option<usize>,
    /// Vector elements consumed or produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_count: Option<usize>,
    /// Pipeline-specific extras.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Metadata for a payload of the given format and size.
    pub fn new(format: impl Into<String>, size: usize) -> Self {
        Self {
            format: format.into(),
            size,
            ..Default::default()
        }
    }

    /// Set output dimensions.
    pub fn with_dimensions(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Add a pipeline-specific entry.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra.insert(key.into(), value.to_string());
        self
    }
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    /// Output data.
    pub data: Payload,
    /// Mime type of `data`.
    pub mime_type: &'static str,
    /// Descriptive metadata.
    pub metadata: Metadata,
}

impl Converted {
    /// Build a result, filling `metadata.size` from the payload.
    pub fn new(data: Payload, mime_type: &'static str, mut metadata: Metadata) -> Self {
        metadata.size = data.len();
        Self {
            data,
            mime_type,
            metadata,
        }
    }

    /// Metadata rendered as JSON.
    pub fn metadata_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.metadata)
    }
}

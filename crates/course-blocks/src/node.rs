//! Raw content nodes as delivered by the content source.
//!
//! Every node kind the pipeline understands is a variant of [`NodeKind`].
//! Payloads are validated when they cross the ingestion boundary: a node whose
//! shape does not match its kind is dropped (and logged) instead of failing the
//! whole fetch, and unknown kinds become [`NodeKind::Unsupported`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// One span of rich text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub plain_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl RichText {
    /// Create an unlinked span
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            href: None,
        }
    }
}

/// Concatenate the plain text of a rich text run.
pub fn plain_text(spans: &[RichText]) -> String {
    spans.iter().map(|span| span.plain_text.as_str()).collect()
}

/// Kind tag and kind-specific payload of a source node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Paragraph {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    BulletedListItem {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    NumberedListItem {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Toggle {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Quote {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Code {
        #[serde(default)]
        rich_text: Vec<RichText>,
        #[serde(default)]
        language: Option<String>,
    },
    Image {
        url: String,
        #[serde(default)]
        caption: Vec<RichText>,
    },
    Video {
        url: String,
        #[serde(default)]
        caption: Vec<RichText>,
    },
    Divider,
    Callout {
        #[serde(default)]
        rich_text: Vec<RichText>,
        #[serde(default)]
        icon: Option<String>,
    },
    ToDo {
        #[serde(default)]
        rich_text: Vec<RichText>,
        #[serde(default)]
        checked: bool,
    },
    Table {
        #[serde(default)]
        has_column_header: bool,
    },
    TableRow {
        #[serde(default)]
        cells: Vec<Vec<RichText>>,
    },
    /// Any kind this pipeline does not classify
    #[serde(other)]
    Unsupported,
}

impl NodeKind {
    /// Source tag of this kind, as it appears on the wire
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Paragraph { .. } => "paragraph",
            Self::Heading1 { .. } => "heading_1",
            Self::Heading2 { .. } => "heading_2",
            Self::Heading3 { .. } => "heading_3",
            Self::BulletedListItem { .. } => "bulleted_list_item",
            Self::NumberedListItem { .. } => "numbered_list_item",
            Self::Toggle { .. } => "toggle",
            Self::Quote { .. } => "quote",
            Self::Code { .. } => "code",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Divider => "divider",
            Self::Callout { .. } => "callout",
            Self::ToDo { .. } => "to_do",
            Self::Table { .. } => "table",
            Self::TableRow { .. } => "table_row",
            Self::Unsupported => "unsupported",
        }
    }
}

/// A raw content node with its ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalNode {
    /// External id, stable across fetches
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Whether the source reports children for this node, fetched or not
    #[serde(default)]
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExternalNode>,
}

/// Wire shape used to validate one node at a time.
#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(default)]
    has_children: bool,
    #[serde(default)]
    children: Vec<Value>,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl ExternalNode {
    /// Create a leaf node
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            has_children: false,
            children: Vec::new(),
        }
    }

    /// Attach children, marking the node as having children
    pub fn with_children(mut self, children: Vec<ExternalNode>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    /// Validate one JSON value into a node.
    ///
    /// Returns `None` when the value does not have the shape of a node or its
    /// payload does not match its kind. Children that fail validation are
    /// dropped individually; their siblings are kept.
    pub fn from_value(value: Value) -> Option<Self> {
        let raw: RawNode = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping node without a valid envelope");
                return None;
            }
        };

        let kind: NodeKind = match serde_json::from_value(Value::Object(raw.payload)) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(node_id = %raw.id, error = %e, "Dropping node with invalid payload");
                return None;
            }
        };

        let children: Vec<ExternalNode> = raw
            .children
            .into_iter()
            .filter_map(ExternalNode::from_value)
            .collect();

        Some(Self {
            id: raw.id,
            kind,
            has_children: raw.has_children || !children.is_empty(),
            children,
        })
    }

    /// Count this node and all of its descendants
    pub fn tree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Parse a JSON array of nodes, dropping invalid elements.
///
/// # Errors
///
/// Returns an error if `json` is not valid JSON or is not an array.
pub fn parse_nodes(json: &str) -> Result<Vec<ExternalNode>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(values) => Ok(values.into_iter().filter_map(ExternalNode::from_value).collect()),
        other => Err(Error::invalid_shape(format!(
            "expected an array of nodes, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

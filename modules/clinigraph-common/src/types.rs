use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::vocabulary::{EdgeType, NodeType};

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Primitive value stored in a node's open attribute map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(Number),
    Text(String),
}

pub type Attributes = BTreeMap<String, AttributeValue>;

impl AttributeValue {
    /// Convert a model-supplied JSON value.
    ///
    /// `null` yields `None`. Arrays and objects are kept as their compact JSON text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(AttributeValue::Bool(*b)),
            Value::Number(n) => Some(AttributeValue::Number(n.clone())),
            Value::String(s) => Some(AttributeValue::Text(s.clone())),
            other => Some(AttributeValue::Text(other.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Number(n) => write!(f, "{n}"),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Literal excerpt the node was extracted from. Provenance only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_span: Option<String>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: label.into(),
            attributes: Attributes::new(),
            source_span: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttributeValue::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type,
        }
    }
}

/// Provenance stamped on a document by the extraction run that built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMeta {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_model: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_projection: Option<RiskProjection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ExtractionMeta>,
}

impl GraphDocument {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn risk_factors(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes
            .iter()
            .filter(|n| n.node_type == NodeType::RiskFactor)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            risk_factors: self.risk_factors().count(),
        }
    }
}

/// Node/edge counts for a short acknowledgment of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub risk_factors: usize,
}

// ---------------------------------------------------------------------------
// Risk projection
// ---------------------------------------------------------------------------

/// Whether a transcript shows a risk factor being discussed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum CoverageStatus {
    Addressed,
    NotAddressed,
    #[default]
    Uncertain,
}

impl CoverageStatus {
    /// Parse a status string. Anything outside the three known values is `Uncertain`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "addressed" => CoverageStatus::Addressed,
            "not_addressed" => CoverageStatus::NotAddressed,
            _ => CoverageStatus::Uncertain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Addressed => "addressed",
            CoverageStatus::NotAddressed => "not_addressed",
            CoverageStatus::Uncertain => "uncertain",
        }
    }
}

impl From<String> for CoverageStatus {
    fn from(value: String) -> Self {
        CoverageStatus::parse(&value)
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCoverage {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub status: CoverageStatus,
    #[serde(default)]
    pub doctor_quote: String,
    #[serde(default)]
    pub patient_quote: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskProjection {
    pub risk_factors: Vec<RiskCoverage>,
    #[serde(default)]
    pub summary: String,
}

impl RiskProjection {
    pub fn get(&self, id: &str) -> Option<&RiskCoverage> {
        self.risk_factors.iter().find(|r| r.id == id)
    }
}

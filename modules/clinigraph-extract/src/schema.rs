//! Node/edge contract checks.
//!
//! Validation is binary: the first violation class found is reported with the
//! path of its first offending element, and nothing is repaired.

use std::collections::HashSet;

use clinigraph_common::{
    AttributeValue, Attributes, EdgeType, GraphDocument, GraphEdge, GraphNode, NodeType,
};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Check a decoded document and hand it back unchanged.
///
/// Classes are checked in order: top-level fields, nodes, edges, node id
/// uniqueness, edge endpoints.
pub fn validate(document: Value) -> Result<Value, SchemaError> {
    check(&document)?;
    Ok(document)
}

fn check(document: &Value) -> Result<(), SchemaError> {
    let (nodes, edges) = top_level(document)?;

    let mut node_ids = Vec::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        node_ids.push(check_node(i, node)?);
    }

    let mut endpoints = Vec::with_capacity(edges.len());
    for (i, edge) in edges.iter().enumerate() {
        endpoints.push(check_edge(i, edge)?);
    }

    let declared = unique_ids(node_ids.iter().copied())?;
    check_endpoints(&declared, endpoints.iter().copied())
}

/// Re-check referential integrity of a typed document.
///
/// Vocabulary membership is guaranteed by the types; ids, uniqueness and
/// endpoints are not.
pub fn validate_document(document: &GraphDocument) -> Result<(), SchemaError> {
    for (i, node) in document.nodes.iter().enumerate() {
        if node.id.trim().is_empty() {
            return Err(SchemaError::structure(
                format!("$.nodes[{i}].id"),
                "node id must be a non-empty string",
            ));
        }
    }
    for (i, edge) in document.edges.iter().enumerate() {
        for (endpoint, id) in [("source", &edge.source), ("target", &edge.target)] {
            if id.trim().is_empty() {
                return Err(SchemaError::structure(
                    format!("$.edges[{i}].{endpoint}"),
                    format!("edge {endpoint} must be a non-empty string"),
                ));
            }
        }
    }

    let declared = unique_ids(document.nodes.iter().map(|n| n.id.as_str()))?;
    check_endpoints(
        &declared,
        document
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str())),
    )
}

/// Validate, then convert into a typed document.
///
/// Blank labels stay blank here; label backfill belongs to the extractor.
pub fn to_document(document: &Value) -> Result<GraphDocument, SchemaError> {
    check(document)?;
    let (nodes, edges) = top_level(document)?;

    let nodes = nodes.iter().filter_map(typed_node).collect();
    let edges = edges.iter().filter_map(typed_edge).collect();
    let summary = match document.get("summary") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    };

    Ok(GraphDocument {
        nodes,
        edges,
        summary,
        risk_projection: None,
        meta: None,
    })
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn top_level(document: &Value) -> Result<(&Vec<Value>, &Vec<Value>), SchemaError> {
    let root = document
        .as_object()
        .ok_or_else(|| SchemaError::structure("$", "document must be a JSON object"))?;

    let array = |field: &str| match root.get(field) {
        None => Err(SchemaError::structure(
            format!("$.{field}"),
            format!("missing required field `{field}`"),
        )),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(SchemaError::structure(
            format!("$.{field}"),
            format!("`{field}` must be an array"),
        )),
    };

    Ok((array("nodes")?, array("edges")?))
}

fn check_node(i: usize, node: &Value) -> Result<&str, SchemaError> {
    let path = format!("$.nodes[{i}]");
    let object = node
        .as_object()
        .ok_or_else(|| SchemaError::structure(&path, "node must be an object"))?;

    let id = non_empty_str(object, "id").ok_or_else(|| {
        SchemaError::structure(format!("{path}.id"), "node id must be a non-empty string")
    })?;

    match object.get("type").and_then(Value::as_str) {
        Some(t) if NodeType::parse(t).is_some() => Ok(id),
        Some(t) => Err(SchemaError::UnknownNodeType {
            path: format!("{path}.type"),
            value: t.to_string(),
        }),
        None => Err(SchemaError::structure(
            format!("{path}.type"),
            "node type must be a string",
        )),
    }
}

fn check_edge(i: usize, edge: &Value) -> Result<(&str, &str), SchemaError> {
    let path = format!("$.edges[{i}]");
    let object = edge
        .as_object()
        .ok_or_else(|| SchemaError::structure(&path, "edge must be an object"))?;

    let endpoint = |field: &str| {
        non_empty_str(object, field).ok_or_else(|| {
            SchemaError::structure(
                format!("{path}.{field}"),
                format!("edge {field} must be a non-empty string"),
            )
        })
    };
    let source = endpoint("source")?;
    let target = endpoint("target")?;

    match object.get("type").and_then(Value::as_str) {
        Some(t) if EdgeType::parse(t).is_some() => Ok((source, target)),
        Some(t) => Err(SchemaError::UnknownEdgeType {
            path: format!("{path}.type"),
            value: t.to_string(),
        }),
        None => Err(SchemaError::structure(
            format!("{path}.type"),
            "edge type must be a string",
        )),
    }
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<HashSet<&'a str>, SchemaError> {
    let mut seen = HashSet::new();
    for (i, id) in ids.enumerate() {
        if !seen.insert(id) {
            return Err(SchemaError::DuplicateNodeId {
                path: format!("$.nodes[{i}].id"),
                id: id.to_string(),
            });
        }
    }
    Ok(seen)
}

fn check_endpoints<'a>(
    declared: &HashSet<&str>,
    endpoints: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<(), SchemaError> {
    for (i, (source, target)) in endpoints.enumerate() {
        for (endpoint, id) in [("source", source), ("target", target)] {
            if !declared.contains(id) {
                return Err(SchemaError::DanglingEndpoint {
                    path: format!("$.edges[{i}].{endpoint}"),
                    endpoint,
                    id: id.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

fn typed_node(node: &Value) -> Option<GraphNode> {
    let id = node.get("id")?.as_str()?.to_string();
    let node_type = NodeType::parse(node.get("type")?.as_str()?)?;
    let label = node
        .get("label")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let attributes: Attributes = node
        .get("attributes")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| AttributeValue::from_json(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    let source_span = node
        .get("source_span")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    Some(GraphNode {
        id,
        node_type,
        label,
        attributes,
        source_span,
    })
}

fn typed_edge(edge: &Value) -> Option<GraphEdge> {
    Some(GraphEdge {
        source: edge.get("source")?.as_str()?.to_string(),
        target: edge.get("target")?.as_str()?.to_string(),
        edge_type: EdgeType::parse(edge.get("type")?.as_str()?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "nodes": [
                {"id": "o1", "type": "Outcome", "label": "Systolic BP reduction",
                 "attributes": {"metric_name": "SBP", "value": 12, "direction": "decrease",
                                "unit": "mmHg", "timeframe": "12 weeks"}},
                {"id": "r1", "type": "RiskFactor", "label": "Angioedema",
                 "source_span": "rare risk of angioedema"}
            ],
            "edges": [{"source": "r1", "target": "o1", "type": "qualifies"}],
            "summary": "Thesis: lisinopril lowers BP."
        })
    }

    #[test]
    fn valid_document_passes_unchanged() {
        assert_eq!(validate(valid()).unwrap(), valid());
    }

    #[test]
    fn validation_is_idempotent() {
        let once = validate(valid()).unwrap();
        let twice = validate(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_edges_field_is_reported() {
        let err = validate(json!({"nodes": []})).unwrap_err();
        assert_eq!(err.path(), "$.edges");
    }

    #[test]
    fn non_object_root_is_reported() {
        let err = validate(json!([])).unwrap_err();
        assert_eq!(err.path(), "$");
    }

    #[test]
    fn blank_node_id_is_reported() {
        let mut doc = valid();
        doc["nodes"][1]["id"] = json!("  ");
        let err = validate(doc).unwrap_err();
        assert_eq!(err.path(), "$.nodes[1].id");
    }

    #[test]
    fn unknown_node_type_is_reported() {
        let mut doc = valid();
        doc["nodes"][0]["type"] = json!("Biomarker");
        assert_eq!(
            validate(doc).unwrap_err(),
            SchemaError::UnknownNodeType {
                path: "$.nodes[0].type".into(),
                value: "Biomarker".into()
            }
        );
    }

    #[test]
    fn unknown_edge_type_is_reported() {
        let mut doc = valid();
        doc["edges"][0]["type"] = json!("related_to");
        assert!(matches!(
            validate(doc).unwrap_err(),
            SchemaError::UnknownEdgeType { ref value, .. } if value == "related_to"
        ));
    }

    #[test]
    fn duplicate_node_id_is_reported() {
        let mut doc = valid();
        doc["nodes"][1]["id"] = json!("o1");
        doc["edges"] = json!([]);
        assert_eq!(
            validate(doc).unwrap_err(),
            SchemaError::DuplicateNodeId {
                path: "$.nodes[1].id".into(),
                id: "o1".into()
            }
        );
    }

    #[test]
    fn dangling_target_is_reported() {
        let mut doc = valid();
        doc["edges"][0]["target"] = json!("ghost");
        assert_eq!(
            validate(doc).unwrap_err(),
            SchemaError::DanglingEndpoint {
                path: "$.edges[0].target".into(),
                endpoint: "target",
                id: "ghost".into()
            }
        );
    }

    #[test]
    fn dangling_source_is_reported() {
        let mut doc = valid();
        doc["edges"][0]["source"] = json!("ghost");
        assert_eq!(
            validate(doc).unwrap_err(),
            SchemaError::DanglingEndpoint {
                path: "$.edges[0].source".into(),
                endpoint: "source",
                id: "ghost".into()
            }
        );
    }

    #[test]
    fn node_errors_are_reported_before_edge_errors() {
        let mut doc = valid();
        doc["nodes"][0]["type"] = json!("Nope");
        doc["edges"][0]["type"] = json!("nope");
        assert_eq!(validate(doc).unwrap_err().path(), "$.nodes[0].type");
    }

    #[test]
    fn duplicates_are_reported_before_dangling_edges() {
        let mut doc = valid();
        doc["nodes"][1]["id"] = json!("o1");
        assert!(matches!(
            validate(doc).unwrap_err(),
            SchemaError::DuplicateNodeId { .. }
        ));
    }

    #[test]
    fn converts_to_typed_document() {
        let doc = to_document(&valid()).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].node_type, NodeType::Outcome);
        assert_eq!(doc.nodes[0].attribute_str("unit"), Some("mmHg"));
        assert_eq!(doc.nodes[1].source_span.as_deref(), Some("rare risk of angioedema"));
        assert_eq!(doc.edges[0].edge_type, EdgeType::Qualifies);
        assert_eq!(doc.summary, "Thesis: lisinopril lowers BP.");
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn structured_summary_is_kept_as_text() {
        let mut raw = valid();
        raw["summary"] = json!({"thesis": "x"});
        let doc = to_document(&raw).unwrap();
        assert_eq!(doc.summary, "{\"thesis\":\"x\"}");
    }

    #[test]
    fn typed_dangling_edge_is_rejected() {
        let mut doc = to_document(&valid()).unwrap();
        doc.edges.push(GraphEdge::new("o1", "missing", EdgeType::Supports));
        assert_eq!(validate_document(&doc).unwrap_err().path(), "$.edges[1].target");
    }
}

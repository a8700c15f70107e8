//! Risk-coverage projection: classify each RiskFactor node against a transcript
//! and fold the result back into the graph.

use std::collections::HashSet;
use std::sync::Arc;

use ai_client::{GenerationRequest, ResponseFormat, TextGenerator};
use clinigraph_common::{
    AttributeValue, CoverageStatus, GraphDocument, NodeType, RiskCoverage, RiskProjection,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::decode::decode;
use crate::error::ProjectionError;
use crate::prompts::build_projection_prompt;

pub const NO_RISK_FACTORS_SUMMARY: &str = "No risk factors detected in the knowledge graph.";

/// Model parameters for the projection call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParams {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

pub struct RiskCoverageProjector {
    generator: Arc<dyn TextGenerator>,
    params: ProjectionParams,
}

impl RiskCoverageProjector {
    pub fn new(generator: Arc<dyn TextGenerator>, params: ProjectionParams) -> Self {
        Self { generator, params }
    }

    /// Classify the document's risk factors against `transcript`.
    ///
    /// A blank transcript yields `None`; a document without RiskFactor nodes
    /// yields an empty projection. Neither case calls the model.
    pub async fn project(
        &self,
        transcript: &str,
        document: &GraphDocument,
    ) -> Result<Option<RiskProjection>, ProjectionError> {
        if transcript.trim().is_empty() {
            debug!("Empty transcript, skipping risk projection");
            return Ok(None);
        }

        let risk_nodes = minimized_risk_factors(document);
        if risk_nodes.is_empty() {
            debug!("No risk factors in graph, skipping risk projection call");
            return Ok(Some(RiskProjection {
                risk_factors: Vec::new(),
                summary: NO_RISK_FACTORS_SUMMARY.to_string(),
            }));
        }

        let prompt = build_projection_prompt(transcript, &Value::Array(risk_nodes));
        let mut request = GenerationRequest::new(&self.params.model, prompt)
            .response_format(ResponseFormat::JsonObject);
        request.temperature = self.params.temperature;
        request.max_output_tokens = self.params.max_output_tokens;

        let text = self.generator.generate(request).await?;
        let raw = decode(&text, "risk projection")?;
        let projection = normalize_projection(&raw, document)?;

        info!(
            model = %self.params.model,
            classified = projection.risk_factors.len(),
            "Risk projection complete"
        );
        Ok(Some(projection))
    }
}

/// Only the fields the classifier needs, never the whole document.
fn minimized_risk_factors(document: &GraphDocument) -> Vec<Value> {
    document
        .risk_factors()
        .map(|node| {
            json!({
                "id": node.id,
                "label": node.label,
                "attributes": node.attributes,
                "source_span": node.source_span,
            })
        })
        .collect()
}

/// Coerce a decoded reply into a `RiskProjection`.
///
/// Only entries naming a RiskFactor node of `document` are kept, the first
/// one per id. Unknown statuses become `uncertain`, and non-string
/// quote/rationale fields become empty strings.
pub fn normalize_projection(
    raw: &Value,
    document: &GraphDocument,
) -> Result<RiskProjection, ProjectionError> {
    let root = raw
        .as_object()
        .ok_or_else(|| ProjectionError::Shape("expected a JSON object".into()))?;
    let entries = root
        .get("risk_factors")
        .and_then(Value::as_array)
        .ok_or_else(|| ProjectionError::Shape("missing `risk_factors` array".into()))?;

    let mut seen = HashSet::new();
    let mut risk_factors = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(id) = entry
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            continue;
        };

        let Some(node) = document
            .node(id)
            .filter(|n| n.node_type == NodeType::RiskFactor)
        else {
            debug!(id, "Dropping projection entry for unknown risk factor");
            continue;
        };
        if !seen.insert(id) {
            debug!(id, "Dropping duplicate projection entry");
            continue;
        }

        let label = match string_field(entry, "label") {
            label if !label.is_empty() => label,
            _ => node.label.clone(),
        };

        risk_factors.push(RiskCoverage {
            id: id.to_string(),
            label,
            status: entry
                .get("status")
                .and_then(Value::as_str)
                .map(CoverageStatus::parse)
                .unwrap_or_default(),
            doctor_quote: string_field(entry, "doctor_quote"),
            patient_quote: string_field(entry, "patient_quote"),
            rationale: string_field(entry, "rationale"),
        });
    }

    Ok(RiskProjection {
        risk_factors,
        summary: string_field(raw, "summary"),
    })
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Attach the projection to the document and annotate matching RiskFactor nodes.
///
/// Nodes without a matching entry are left untouched.
pub fn merge_projection(document: &mut GraphDocument, projection: RiskProjection) {
    for node in document
        .nodes
        .iter_mut()
        .filter(|n| n.node_type == NodeType::RiskFactor)
    {
        let Some(coverage) = projection.get(&node.id) else {
            continue;
        };

        node.attributes.insert(
            "coverage_status".to_string(),
            AttributeValue::from(coverage.status.as_str()),
        );
        for (key, value) in [
            ("doctor_quote", &coverage.doctor_quote),
            ("patient_quote", &coverage.patient_quote),
            ("coverage_rationale", &coverage.rationale),
        ] {
            if !value.is_empty() {
                node.attributes
                    .insert(key.to_string(), AttributeValue::from(value.clone()));
            }
        }
    }

    document.risk_projection = Some(projection);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;
    use clinigraph_common::{GraphNode, NodeType};

    fn params() -> ProjectionParams {
        ProjectionParams {
            model: "gpt-4o-mini".into(),
            temperature: Some(0.0),
            max_output_tokens: Some(1600),
        }
    }

    fn two_risks() -> GraphDocument {
        GraphDocument {
            nodes: vec![
                GraphNode::new("r1", NodeType::RiskFactor, "Angioedema")
                    .with_attribute("severity", "high"),
                GraphNode::new("r2", NodeType::RiskFactor, "Hyperkalemia")
                    .with_attribute("severity", "moderate"),
                GraphNode::new("m1", NodeType::Medication, "Lisinopril"),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_transcript_skips_model() {
        let generator = Arc::new(ScriptedGenerator::new());
        let projector = RiskCoverageProjector::new(generator.clone(), params());

        let result = projector.project("  \n", &two_risks()).await.unwrap();

        assert!(result.is_none());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn no_risk_nodes_returns_empty_projection_without_call() {
        let generator = Arc::new(ScriptedGenerator::new());
        let projector = RiskCoverageProjector::new(generator.clone(), params());
        let doc = GraphDocument {
            nodes: vec![GraphNode::new("m1", NodeType::Medication, "Lisinopril")],
            ..Default::default()
        };

        let result = projector.project("Doctor: hello", &doc).await.unwrap().unwrap();

        assert!(result.risk_factors.is_empty());
        assert!(!result.summary.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn sends_only_risk_nodes_with_json_hint() {
        let generator = Arc::new(ScriptedGenerator::new().reply(
            r#"{"risk_factors": [{"id": "r1", "status": "addressed"}], "summary": "ok"}"#,
        ));
        let projector = RiskCoverageProjector::new(generator.clone(), params());

        projector
            .project("Doctor: report any swelling.", &two_risks())
            .await
            .unwrap();

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.response_format, Some(ResponseFormat::JsonObject));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_output_tokens, Some(1600));
        assert!(request.input.contains("Angioedema"));
        assert!(request.input.contains("Hyperkalemia"));
        assert!(!request.input.contains("Lisinopril"));
    }

    #[tokio::test]
    async fn gateway_failure_is_a_projection_error() {
        let generator = Arc::new(ScriptedGenerator::new().fail("upstream down"));
        let projector = RiskCoverageProjector::new(generator, params());

        let err = projector.project("Doctor: hi", &two_risks()).await.unwrap_err();

        assert!(matches!(err, ProjectionError::Gateway(_)));
    }

    #[test]
    fn normalization_coerces_and_drops() {
        let raw = json!({
            "risk_factors": [
                {"id": "r1", "status": "partially_addressed", "doctor_quote": 7},
                {"id": "", "status": "addressed"},
                {"status": "addressed"},
                {"id": "r2", "status": "not_addressed", "rationale": "never mentioned"}
            ],
            "summary": null
        });

        let projection = normalize_projection(&raw, &two_risks()).unwrap();

        assert_eq!(projection.risk_factors.len(), 2);
        let r1 = &projection.risk_factors[0];
        assert_eq!(r1.status, CoverageStatus::Uncertain);
        assert_eq!(r1.doctor_quote, "");
        assert_eq!(r1.label, "Angioedema");
        assert_eq!(projection.risk_factors[1].status, CoverageStatus::NotAddressed);
        assert_eq!(projection.summary, "");
    }

    #[test]
    fn normalization_keeps_only_known_risk_factors_once() {
        let raw = json!({
            "risk_factors": [
                {"id": "r1", "status": "addressed"},
                {"id": "r1", "status": "not_addressed"},
                {"id": "m1", "status": "addressed"},
                {"id": "ghost", "status": "addressed"},
                {"id": " r2 ", "status": "uncertain"}
            ],
            "summary": "ok"
        });

        let projection = normalize_projection(&raw, &two_risks()).unwrap();

        let kept: Vec<_> = projection
            .risk_factors
            .iter()
            .map(|r| (r.id.as_str(), r.status))
            .collect();
        assert_eq!(
            kept,
            vec![
                ("r1", CoverageStatus::Addressed),
                ("r2", CoverageStatus::Uncertain)
            ]
        );
        assert_eq!(projection.risk_factors[1].label, "Hyperkalemia");
    }

    #[test]
    fn normalization_rejects_wrong_shape() {
        assert!(matches!(
            normalize_projection(&json!({"summary": "x"}), &two_risks()),
            Err(ProjectionError::Shape(_))
        ));
        assert!(matches!(
            normalize_projection(&json!([]), &two_risks()),
            Err(ProjectionError::Shape(_))
        ));
    }

    #[test]
    fn merge_annotates_only_matching_nodes() {
        let mut doc = two_risks();
        let untouched = doc.nodes[1].attributes.clone();
        let projection = RiskProjection {
            risk_factors: vec![RiskCoverage {
                id: "r1".into(),
                label: "Angioedema".into(),
                status: CoverageStatus::Addressed,
                doctor_quote: "Call us if your lips swell.".into(),
                patient_quote: String::new(),
                rationale: "Clinician warned about swelling.".into(),
            }],
            summary: "One of two risks discussed.".into(),
        };

        merge_projection(&mut doc, projection);

        let r1 = doc.node("r1").unwrap();
        assert_eq!(r1.attribute_str("coverage_status"), Some("addressed"));
        assert_eq!(r1.attribute_str("doctor_quote"), Some("Call us if your lips swell."));
        assert_eq!(r1.attribute_str("patient_quote"), None);
        assert_eq!(
            r1.attribute_str("coverage_rationale"),
            Some("Clinician warned about swelling.")
        );
        assert_eq!(doc.node("r2").unwrap().attributes, untouched);
        assert_eq!(
            doc.risk_projection.as_ref().map(|p| p.summary.as_str()),
            Some("One of two risks discussed.")
        );
    }
}

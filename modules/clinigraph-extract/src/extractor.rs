use std::path::PathBuf;
use std::sync::Arc;

use ai_client::{GenerationRequest, TextGenerator};
use chrono::Utc;
use clinigraph_common::{ExtractionMeta, GraphDocument, GraphStats};
use serde_json::Value;
use tracing::{info, warn};

use crate::decode::decode;
use crate::error::ExtractError;
use crate::prompts::build_extraction_prompt;
use crate::risk::{merge_projection, ProjectionParams, RiskCoverageProjector};
use crate::schema::{to_document, validate};
use crate::sink::{DocumentSink, JsonFileSink};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OUTPUT_PATH: &str = "data/knowledge_graph.json";

/// Fields tried, in order, when a node arrives without a label.
const LABEL_FALLBACKS: [&str; 4] = ["name", "title", "text", "value"];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub project_risk_coverage: bool,
    pub risk: RiskOptions,
    pub output: OutputOptions,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(0.2),
            max_output_tokens: Some(4000),
            project_risk_coverage: true,
            risk: RiskOptions::default(),
            output: OutputOptions::default(),
        }
    }
}

impl ExtractOptions {
    /// Projection parameters; the risk model falls back to the extraction model.
    pub fn projection_params(&self) -> ProjectionParams {
        ProjectionParams {
            model: self
                .risk
                .model
                .clone()
                .unwrap_or_else(|| self.model.clone()),
            temperature: self.risk.temperature,
            max_output_tokens: self.risk.max_output_tokens,
        }
    }
}

/// Overrides for the risk-coverage pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for RiskOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: Some(0.0),
            max_output_tokens: Some(1600),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub write_file: bool,
    pub base_dir: PathBuf,
    /// Absolute, or relative to `base_dir`. Defaults to `DEFAULT_OUTPUT_PATH`.
    pub path: Option<PathBuf>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            write_file: true,
            base_dir: PathBuf::from("."),
            path: None,
        }
    }
}

impl OutputOptions {
    pub fn resolve_path(&self) -> PathBuf {
        match self.path {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => self.base_dir.join(path),
            None => self.base_dir.join(DEFAULT_OUTPUT_PATH),
        }
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// A finished extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: GraphDocument,
    pub stats: GraphStats,
    pub written_to: Option<PathBuf>,
}

pub struct GraphExtractor {
    generator: Arc<dyn TextGenerator>,
    projector: RiskCoverageProjector,
    options: ExtractOptions,
    sink: Option<Arc<dyn DocumentSink>>,
}

impl GraphExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, options: ExtractOptions) -> Self {
        let projector = RiskCoverageProjector::new(generator.clone(), options.projection_params());
        let sink = options.output.write_file.then(|| {
            Arc::new(JsonFileSink::new(options.output.resolve_path())) as Arc<dyn DocumentSink>
        });
        Self {
            generator,
            projector,
            options,
            sink,
        }
    }

    /// Replace the configured persistence target.
    pub fn with_sink(mut self, sink: Arc<dyn DocumentSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn without_sink(mut self) -> Self {
        self.sink = None;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract a graph, treating the source text itself as the transcript.
    pub async fn extract(&self, source_text: &str) -> Result<Extraction, ExtractError> {
        self.extract_with_transcript(source_text, source_text).await
    }

    pub async fn extract_with_transcript(
        &self,
        source_text: &str,
        transcript: &str,
    ) -> Result<Extraction, ExtractError> {
        let mut document = self.extract_graph(source_text).await?;

        // Set only when the risk model actually classified something.
        let mut risk_model = None;
        if self.options.project_risk_coverage {
            match self.projector.project(transcript, &document).await {
                Ok(Some(projection)) => {
                    if document.risk_factors().next().is_some() {
                        risk_model = Some(self.options.projection_params().model);
                    }
                    merge_projection(&mut document, projection);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Risk projection failed, keeping base graph"),
            }
        }

        document.meta = Some(ExtractionMeta {
            model: self.options.model.clone(),
            risk_model,
            extracted_at: Utc::now(),
        });

        let written_to = match self.sink {
            Some(ref sink) => Some(sink.write(&document).await?),
            None => None,
        };

        let stats = document.stats();
        info!(
            nodes = stats.nodes,
            edges = stats.edges,
            risk_factors = stats.risk_factors,
            projected = document.risk_projection.is_some(),
            "Extracted knowledge graph"
        );

        Ok(Extraction {
            document,
            stats,
            written_to,
        })
    }

    async fn extract_graph(&self, source_text: &str) -> Result<GraphDocument, ExtractError> {
        let mut request =
            GenerationRequest::new(&self.options.model, build_extraction_prompt(source_text));
        request.temperature = self.options.temperature;
        request.max_output_tokens = self.options.max_output_tokens;

        let text = self.generator.generate(request).await?;
        let raw = decode(&text, "graph extraction")?;
        let mut raw = validate(raw)?;
        backfill_labels(&mut raw);
        Ok(to_document(&raw)?)
    }
}

/// Give every node a trimmed, non-empty label.
///
/// Missing labels come from `name`, `title`, `text` or `value` on the node,
/// then the same keys under `attributes`, then the node id. Only non-blank
/// string fallbacks count; a numeric `value` such as a measured `12` is
/// skipped.
pub fn backfill_labels(document: &mut Value) {
    let Some(nodes) = document.get_mut("nodes").and_then(Value::as_array_mut) else {
        return;
    };

    for node in nodes.iter_mut().filter_map(Value::as_object_mut) {
        let existing = node
            .get("label")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(label) = existing {
            let label = label.to_string();
            node.insert("label".to_string(), Value::String(label));
            continue;
        }

        let attributes = node.get("attributes").and_then(Value::as_object);
        let label = LABEL_FALLBACKS
            .iter()
            .filter_map(|key| node.get(*key))
            .chain(
                LABEL_FALLBACKS
                    .iter()
                    .filter_map(|key| attributes.and_then(|a| a.get(*key))),
            )
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .or_else(|| node.get("id").and_then(Value::as_str).map(str::trim))
            .unwrap_or_default()
            .to_string();

        node.insert("label".to_string(), Value::String(label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_backfill_uses_attribute_name() {
        let mut raw = json!({
            "nodes": [{"id": "m1", "type": "Medication", "attributes": {"name": "Lisinopril"}}],
            "edges": []
        });
        backfill_labels(&mut raw);
        assert_eq!(raw["nodes"][0]["label"], "Lisinopril");
    }

    #[test]
    fn label_backfill_prefers_top_level_fields() {
        let mut raw = json!({
            "nodes": [{"id": "c1", "type": "Claim", "label": "  ", "title": " ACE inhibitors help ",
                       "attributes": {"name": "ignored"}}],
            "edges": []
        });
        backfill_labels(&mut raw);
        assert_eq!(raw["nodes"][0]["label"], "ACE inhibitors help");
    }

    #[test]
    fn label_backfill_skips_numeric_values_and_falls_back_to_id() {
        let mut raw = json!({
            "nodes": [{"id": "o7", "type": "Outcome", "value": 3.5, "attributes": {"value": 12}}],
            "edges": []
        });
        backfill_labels(&mut raw);
        assert_eq!(raw["nodes"][0]["label"], "o7");
    }

    #[test]
    fn existing_labels_are_trimmed() {
        let mut raw = json!({"nodes": [{"id": "a", "type": "Claim", "label": " x \n"}], "edges": []});
        backfill_labels(&mut raw);
        assert_eq!(raw["nodes"][0]["label"], "x");
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.model, DEFAULT_MODEL);
        assert_eq!(options.temperature, Some(0.2));
        assert_eq!(options.max_output_tokens, Some(4000));
        assert!(options.project_risk_coverage);
        assert!(options.output.write_file);

        let params = options.projection_params();
        assert_eq!(params.model, DEFAULT_MODEL);
        assert_eq!(params.temperature, Some(0.0));
        assert_eq!(params.max_output_tokens, Some(1600));
    }

    #[test]
    fn risk_model_override_is_used() {
        let mut options = ExtractOptions::default();
        options.risk.model = Some("gpt-4.1".into());
        assert_eq!(options.projection_params().model, "gpt-4.1");
    }

    #[test]
    fn output_path_resolution() {
        let mut output = OutputOptions {
            base_dir: PathBuf::from("/srv/viewer"),
            ..Default::default()
        };
        assert_eq!(
            output.resolve_path(),
            PathBuf::from("/srv/viewer/data/knowledge_graph.json")
        );

        output.path = Some(PathBuf::from("graphs/run1.json"));
        assert_eq!(output.resolve_path(), PathBuf::from("/srv/viewer/graphs/run1.json"));

        output.path = Some(PathBuf::from("/tmp/graph.json"));
        assert_eq!(output.resolve_path(), PathBuf::from("/tmp/graph.json"));
    }
}

// Test doubles for the extraction pipeline.
//
// - ScriptedGenerator (TextGenerator) plays back queued replies in order
// - MemorySink (DocumentSink) keeps written documents in memory
//
// Plus helpers that build the model replies used across tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use ai_client::{AiError, GenerationRequest, TextGenerator};
use async_trait::async_trait;
use clinigraph_common::GraphDocument;
use serde_json::{json, Value};

use crate::error::PersistError;
use crate::sink::DocumentSink;

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// Returns queued replies one per call. Errors once the script runs out.
/// Builder pattern: `.reply()`, `.reply_json()`, `.fail()`.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, AiError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(text.to_string()));
        self
    }

    pub fn reply_json(self, value: &Value) -> Self {
        self.push(Ok(value.to_string()));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(AiError::Network(message.to_string())));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, entry: Result<String, AiError>) {
        self.script.lock().unwrap().push_back(entry);
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Network("script exhausted".to_string())))
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Records every written document. Reports `path` as the write location.
pub struct MemorySink {
    path: PathBuf,
    written: Mutex<Vec<GraphDocument>>,
}

impl MemorySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn written(&self) -> Vec<GraphDocument> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn write(&self, document: &GraphDocument) -> Result<PathBuf, PersistError> {
        self.written.lock().unwrap().push(document.clone());
        Ok(self.path.clone())
    }
}

// ---------------------------------------------------------------------------
// Reply fixtures
// ---------------------------------------------------------------------------

/// One Outcome, one RiskFactor and a `supports` edge between them.
pub fn hypertension_graph() -> Value {
    json!({
        "nodes": [
            {
                "id": "o1",
                "type": "Outcome",
                "label": "Systolic BP reduction",
                "attributes": {
                    "metric_name": "systolic blood pressure",
                    "value": 12,
                    "direction": "decrease",
                    "unit": "mmHg",
                    "timeframe": "12 weeks"
                }
            },
            {
                "id": "r1",
                "type": "RiskFactor",
                "label": "Hyperkalemia",
                "attributes": {
                    "severity": "moderate",
                    "likelihood": "low",
                    "diagnostics_needed": "serum potassium",
                    "mitigation": "monitor electrolytes"
                }
            }
        ],
        "edges": [
            {"source": "o1", "target": "r1", "type": "supports"}
        ],
        "summary": "Lisinopril lowers blood pressure with a hyperkalemia risk."
    })
}

/// Projection reply marking `risk_id` as not addressed in the visit.
pub fn not_addressed_projection(risk_id: &str, label: &str) -> Value {
    json!({
        "risk_factors": [{
            "id": risk_id,
            "label": label,
            "status": "not_addressed",
            "doctor_quote": "",
            "patient_quote": "",
            "rationale": "Potassium monitoring never came up."
        }],
        "summary": "One risk factor was not discussed."
    })
}

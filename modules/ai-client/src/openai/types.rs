use serde::Serialize;
use serde_json::{json, Value};

// =============================================================================
// Request Parameters
// =============================================================================

/// Optional request parameters a backend may reject for a given model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestParam {
    Temperature,
    MaxOutputTokens,
    ResponseFormat,
}

impl RequestParam {
    pub const ALL: [RequestParam; 3] = [
        RequestParam::Temperature,
        RequestParam::MaxOutputTokens,
        RequestParam::ResponseFormat,
    ];

    /// Wire name of the parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestParam::Temperature => "temperature",
            RequestParam::MaxOutputTokens => "max_output_tokens",
            RequestParam::ResponseFormat => "text.format",
        }
    }

    /// Map a parameter name reported by a backend to a known parameter.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "temperature" => Some(RequestParam::Temperature),
            "max_output_tokens" | "max_tokens" | "max_completion_tokens" => {
                Some(RequestParam::MaxOutputTokens)
            }
            "text" | "text.format" | "response_format" | "text.format.type" => {
                Some(RequestParam::ResponseFormat)
            }
            _ => None,
        }
    }
}

/// Desired shape of the reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Ask the backend to emit a single JSON object.
    JsonObject,
    Text,
}

impl ResponseFormat {
    fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::JsonObject => "json_object",
            ResponseFormat::Text => "text",
        }
    }
}

// =============================================================================
// Generation Request
// =============================================================================

/// Declarative parameter set for one text-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub input: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub response_format: Option<ResponseFormat>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            temperature: None,
            max_output_tokens: None,
            response_format: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn has_param(&self, param: RequestParam) -> bool {
        match param {
            RequestParam::Temperature => self.temperature.is_some(),
            RequestParam::MaxOutputTokens => self.max_output_tokens.is_some(),
            RequestParam::ResponseFormat => self.response_format.is_some(),
        }
    }

    /// Remove `param` from the request. Returns whether it was set.
    pub fn drop_param(&mut self, param: RequestParam) -> bool {
        match param {
            RequestParam::Temperature => self.temperature.take().is_some(),
            RequestParam::MaxOutputTokens => self.max_output_tokens.take().is_some(),
            RequestParam::ResponseFormat => self.response_format.take().is_some(),
        }
    }

    /// Request body for the Responses endpoint.
    pub fn to_wire(&self) -> Value {
        let wire = ResponsesRequest {
            model: &self.model,
            input: &self.input,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            text: self.response_format.map(|format| {
                json!({
                    "format": { "type": format.as_str() }
                })
            }),
        };
        // Serializing plain strings, numbers and a json! value cannot fail.
        serde_json::to_value(wire).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_body_omits_unset_params() {
        let body = GenerationRequest::new("gpt-4o-mini", "hello").to_wire();
        assert_eq!(body, json!({"model": "gpt-4o-mini", "input": "hello"}));
    }

    #[test]
    fn wire_body_carries_all_params() {
        let body = GenerationRequest::new("gpt-4o-mini", "hello")
            .temperature(0.5)
            .max_output_tokens(1600)
            .response_format(ResponseFormat::JsonObject)
            .to_wire();
        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["max_output_tokens"], json!(1600));
        assert_eq!(body["text"]["format"]["type"], "json_object");
    }

    #[test]
    fn drop_param_reports_presence() {
        let mut request = GenerationRequest::new("m", "x").temperature(0.2);
        assert!(request.drop_param(RequestParam::Temperature));
        assert!(!request.drop_param(RequestParam::Temperature));
        assert!(!request.has_param(RequestParam::Temperature));
        assert!(!request.drop_param(RequestParam::MaxOutputTokens));
    }

    #[test]
    fn wire_names_map_to_params() {
        assert_eq!(
            RequestParam::from_wire_name("max_tokens"),
            Some(RequestParam::MaxOutputTokens)
        );
        assert_eq!(
            RequestParam::from_wire_name("response_format"),
            Some(RequestParam::ResponseFormat)
        );
        assert_eq!(RequestParam::from_wire_name("Temperature"), Some(RequestParam::Temperature));
        assert_eq!(RequestParam::from_wire_name("top_p"), None);
    }
}

use std::sync::LazyLock;

use regex::Regex;

use super::types::{GenerationRequest, RequestParam};
use crate::error::AiError;

static RE_PARAM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(temperature|max_output_tokens|max_completion_tokens|max_tokens|response_format|text\.format(?:\.type)?)\b",
    )
    .unwrap()
});

/// Find the request parameter an API error rejects, if it is one we can drop.
///
/// The structured `param` field is consulted first. Otherwise any known
/// parameter name mentioned in the message counts, even when the message
/// mentions it for an unrelated reason. Only parameters still present in
/// `request` are returned.
pub(crate) fn rejected_param(error: &AiError, request: &GenerationRequest) -> Option<RequestParam> {
    let AiError::Api { message, param, .. } = error else {
        return None;
    };

    if let Some(param) = param.as_deref().and_then(RequestParam::from_wire_name) {
        if request.has_param(param) {
            return Some(param);
        }
    }

    RE_PARAM_NAME
        .find_iter(message)
        .filter_map(|m| RequestParam::from_wire_name(m.as_str()))
        .find(|param| request.has_param(*param))
}

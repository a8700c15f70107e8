use clinigraph_common::{EdgeType, NodeType};
use serde_json::Value;

/// Instruction block for the primary extraction call. The source text is appended verbatim.
pub fn build_extraction_prompt(source_text: &str) -> String {
    let node_types = NodeType::ALL
        .iter()
        .map(|t| format!("`{t}`"))
        .collect::<Vec<_>>()
        .join(", ");
    let edge_types = EdgeType::ALL
        .iter()
        .map(|t| format!("`{t}`"))
        .collect::<Vec<_>>()
        .join(", ");
    let attribute_rules = NodeType::ALL
        .iter()
        .filter(|t| !t.expected_attributes().is_empty())
        .map(|t| format!("- **{t}**: {}", t.expected_attributes().join(", ")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a clinical argument analyst. Read the source text and extract a knowledge graph of the clinical argument it makes.

## Node types (use exactly these strings)
{node_types}

## Edge types (use exactly these strings)
{edge_types}

Edges are directed from `source` to `target`. Every `source` and `target` must be the `id` of a node you declared.

## Node attributes
Put type-specific details in `attributes` as strings, numbers or booleans:
{attribute_rules}

For **Outcome** nodes always give metric_name, value, direction ("increase", "decrease" or "no_change"), unit and timeframe; use "unspecified" when the text does not say.
For **RiskFactor** nodes give severity ("low", "moderate", "high"), likelihood ("rare", "uncommon", "common") and diagnostics_needed (true/false: whether tests or monitoring are required before or during treatment).

## Node fields
- `id`: short unique identifier such as "c1", "o2", "r1"
- `type`: one of the node types above
- `label`: concise human-readable name (never empty)
- `attributes`: object as described above
- `source_span`: the literal excerpt from the source text this node comes from

## Summary
`summary` is one string structured as:
"Thesis: <main claim>. Key evidence: <strongest support>. Risks: <caveats and adverse effects>. Open questions: <what remains uncertain>."

## Output
Return ONLY a JSON object, no prose and no code fences:
{{"nodes": [{{"id": "...", "type": "...", "label": "...", "attributes": {{}}, "source_span": "..."}}], "edges": [{{"source": "...", "target": "...", "type": "..."}}], "summary": "..."}}

## Source text
{source_text}"#
    )
}

/// Instruction block for the risk-coverage pass.
///
/// `risk_factors` is the minimized projection of the document's RiskFactor nodes.
pub fn build_projection_prompt(transcript: &str, risk_factors: &Value) -> String {
    let risk_json =
        serde_json::to_string_pretty(risk_factors).unwrap_or_else(|_| risk_factors.to_string());

    format!(
        r#"You review a clinician-patient conversation against a list of risk factors extracted from a clinical argument.

For each risk factor decide whether the conversation shows it being discussed:
- "addressed": the clinician raised or explained this risk, or the patient acknowledged it
- "not_addressed": the risk never comes up
- "uncertain": it is touched on only indirectly or the transcript is ambiguous

Quote the transcript literally. Leave a quote empty when there is none.

## Risk factors
{risk_json}

## Transcript
{transcript}

## Output
Return ONLY a JSON object:
{{"risk_factors": [{{"id": "<risk factor id>", "label": "...", "status": "addressed" | "not_addressed" | "uncertain", "doctor_quote": "...", "patient_quote": "...", "rationale": "..."}}], "summary": "<one or two sentences on overall risk coverage>"}}
Include every risk factor id from the list exactly once."#
    )
}

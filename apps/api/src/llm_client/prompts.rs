// Cross-cutting prompt fragments used by the model backend.
// Flow-specific templates live in flows/prompts.rs.

use serde_json::Value;

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Builds the system prompt for a structured call: the flow's own instruction,
/// the JSON-only rule, and the schema the reply must satisfy.
pub fn structured_output_system(flow_system: &str, output_hint: &Value) -> String {
    let schema = serde_json::to_string_pretty(output_hint).unwrap_or_else(|_| output_hint.to_string());
    let mut system = String::new();
    if !flow_system.trim().is_empty() {
        system.push_str(flow_system.trim());
        system.push_str("\n\n");
    }
    system.push_str(JSON_ONLY_SYSTEM);
    system.push_str("\n\nReturn a JSON object with this EXACT schema (no extra fields):\n");
    system.push_str(&schema);
    system
}

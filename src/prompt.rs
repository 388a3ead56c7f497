use crate::schema::FieldSchema;

/// Builds the text half of the request: policy, the rendered schema, and the
/// JSON-only instruction. Deterministic for a given input pair.
pub fn build_prompt(policy: &str, schema: &FieldSchema) -> String {
    let rendered = serde_json::to_string_pretty(&schema.to_json_schema())
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "{policy}\n\n\
         Please extract the information according to this JSON schema:\n\
         {rendered}\n\n\
         Return ONLY valid JSON that matches this schema. Do not include any explanatory text."
    )
}

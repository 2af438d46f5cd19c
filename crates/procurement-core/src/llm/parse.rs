//! Locating structured payloads inside free-form model output

/// Extract the outermost JSON object from a model response.
///
/// Handles markdown code fences and leading/trailing prose. Returns `None`
/// when no `{ ... }` span exists.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let body = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response)
    } else {
        response
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&body[start..=end])
}

//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in prose or code fences, so the first
//! `{` through the last `}` is taken as the object.

use crate::error::{Error, Result};

use super::types::GeneratedInsights;

/// Fewest insights a usable response carries
pub const MIN_INSIGHTS: usize = 2;
/// Insights beyond this are dropped
pub const MAX_INSIGHTS: usize = 3;

fn truncate_raw(raw: &str) -> String {
    if raw.chars().count() > 200 {
        format!("{}...", raw.chars().take(200).collect::<String>())
    } else {
        raw.to_string()
    }
}

/// Slice out the JSON object embedded in a model response
pub fn extract_json(response: &str) -> Result<&str> {
    let response = response.trim();
    match (response.find('{'), response.rfind('}')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate_raw(response)
        ))),
    }
}

/// Parse and validate a dashboard insights response
///
/// Blank insights are dropped and more than [`MAX_INSIGHTS`] are truncated.
/// An empty summary or fewer than [`MIN_INSIGHTS`] insights is malformed.
pub fn parse_generated_insights(response: &str) -> Result<GeneratedInsights> {
    let json_str = extract_json(response)?;
    let parsed: GeneratedInsights = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate_raw(json_str)
        ))
    })?;

    let summary_text = parsed.summary_text.trim().to_string();
    if summary_text.is_empty() {
        return Err(Error::InvalidData("AI response has an empty summary_text".into()));
    }

    let top_insights: Vec<String> = parsed
        .top_insights
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .take(MAX_INSIGHTS)
        .collect();
    if top_insights.len() < MIN_INSIGHTS {
        return Err(Error::InvalidData(format!(
            "AI response has {} insights, expected at least {}",
            top_insights.len(),
            MIN_INSIGHTS
        )));
    }

    Ok(GeneratedInsights {
        summary_text,
        top_insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_insights_with_surrounding_text() {
        let response = r#"Sure! Here you go:
```json
{"summary_text": "You saved $12.50 this month.", "top_insights": ["Dining leads", "Uber saved you $3"]}
```"#;
        let parsed = parse_generated_insights(response).unwrap();
        assert_eq!(parsed.summary_text, "You saved $12.50 this month.");
        assert_eq!(parsed.top_insights.len(), 2);
    }

    #[test]
    fn test_parse_insights_truncates_extra() {
        let response = r#"{"summary_text": "ok", "top_insights": ["a", "b", "c", "d", "e"]}"#;
        let parsed = parse_generated_insights(response).unwrap();
        assert_eq!(parsed.top_insights, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_insights_rejects_malformed() {
        assert!(parse_generated_insights("no json here").is_err());
        assert!(parse_generated_insights(r#"{"summary_text": 5}"#).is_err());
        assert!(parse_generated_insights(r#"{"summary_text": "  ", "top_insights": ["a", "b"]}"#).is_err());
        assert!(parse_generated_insights(r#"{"summary_text": "ok", "top_insights": ["a", " "]}"#).is_err());
        assert!(parse_generated_insights(r#"{"summary_text": "ok"}"#).is_err());
    }

    #[test]
    fn test_error_message_truncates_raw() {
        let long = format!("{{\"summary_text\": {}}}", "x".repeat(500));
        let err = parse_generated_insights(&long).unwrap_err().to_string();
        assert!(err.contains("..."));
        assert!(err.len() < 400);
    }
}

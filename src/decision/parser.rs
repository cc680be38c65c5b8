//! Parse LLM completions into decision records
//!
//! Completions routinely wrap the JSON payload in prose; extraction finds
//! the outermost object, then serde does the rest. Parse failures are
//! classified as Schema errors carrying the rule name and agent id so
//! strict-mode aborts are actionable.

use serde::de::DeserializeOwned;

use crate::core::error::{DecisionFailure, Result, SugarError};
use crate::core::types::AgentId;

/// Extract a JSON object from an LLM response (handles surrounding text)
pub fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

/// Parse a completion into the rule's decision type
pub fn parse_decision<T: DeserializeOwned>(
    rule: &'static str,
    agent: AgentId,
    response: &str,
) -> Result<T> {
    let json = extract_json(response).ok_or_else(|| {
        SugarError::decision(
            rule,
            agent,
            "response",
            DecisionFailure::Schema,
            format!("no JSON object in response: {response}"),
        )
    })?;
    serde_json::from_str(json).map_err(|e| {
        SugarError::decision(
            rule,
            agent,
            "response",
            DecisionFailure::Schema,
            format!("failed to parse decision: {e} - response: {response}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::types::{CombatDecision, MovementDecision};

    #[test]
    fn test_extract_json_simple() {
        let response = r#"{"move": false, "target": null}"#;
        assert_eq!(extract_json(response), Some(response));
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = r#"Here is my decision:
{"move": true, "target": {"x": 2, "y": 5}}
Hope that helps."#;
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
    }

    #[test]
    fn test_extract_json_no_json() {
        assert!(extract_json("I cannot decide").is_none());
    }

    #[test]
    fn test_parse_decision_success() {
        let decision: MovementDecision = parse_decision(
            "movement",
            AgentId(3),
            r#"Moving: {"move": true, "target": {"x": 1, "y": 1}}"#,
        )
        .unwrap();
        assert!(decision.move_to);
    }

    #[test]
    fn test_parse_decision_schema_error_names_rule_and_agent() {
        let result: Result<CombatDecision> =
            parse_decision("combat", AgentId(7), r#"{"attack": "maybe"}"#);
        let err = result.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("combat"));
        assert!(msg.contains('7'));
        assert!(msg.contains("Schema"));
    }
}

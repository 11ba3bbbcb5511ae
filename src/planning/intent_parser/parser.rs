use crate::planning::types::{Complexity, IntentType, QueryEntity, QueryIntent};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Validated completion output. Anything not fully well-formed is
/// `ParseFailed`; partially valid lists are never trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum AiIntentResponse {
    Intents(Vec<QueryIntent>),
    ParseFailed { reason: String },
}

impl AiIntentResponse {
    fn failed(reason: impl Into<String>) -> Self {
        AiIntentResponse::ParseFailed {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEntities {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    technologies: Vec<String>,
    #[serde(default)]
    concepts: Vec<String>,
    #[serde(default)]
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    intent_type: IntentType,
    action: String,
    confidence: f64,
    #[serde(default)]
    complexity: Option<Complexity>,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    entities: Option<RawEntities>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    List(Vec<RawIntent>),
    Wrapped { intents: Vec<RawIntent> },
}

/// Strips a surrounding markdown code fence, if any
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    // The info string ("json") may share a line with the body
    let info_len = after_fence
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
        .unwrap_or(after_fence.len());
    let body = &after_fence[info_len..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn clean_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Parses and validates a completion. Intents without entities inherit
/// `fallback_entities`; intents without a complexity use
/// `fallback_complexity`.
pub fn parse_ai_intents(
    response: &str,
    fallback_entities: &QueryEntity,
    fallback_complexity: Complexity,
) -> AiIntentResponse {
    let content = strip_code_fence(response);
    if content.is_empty() {
        return AiIntentResponse::failed("empty response");
    }

    let raw = match serde_json::from_str::<Envelope>(content) {
        Ok(Envelope::List(list)) | Ok(Envelope::Wrapped { intents: list }) => list,
        Err(e) => return AiIntentResponse::failed(format!("invalid intent json: {e}")),
    };
    if raw.is_empty() {
        return AiIntentResponse::failed("no intents returned");
    }

    let mut intents = Vec::with_capacity(raw.len());
    for (index, item) in raw.into_iter().enumerate() {
        let action = item.action.trim().to_lowercase();
        if action.is_empty() {
            return AiIntentResponse::failed(format!("intent {index} has an empty action"));
        }
        if !(0.0..=1.0).contains(&item.confidence) {
            return AiIntentResponse::failed(format!(
                "intent {index} confidence {} is outside [0, 1]",
                item.confidence
            ));
        }
        let priority = item.priority.unwrap_or(index as u32 + 1);
        if priority == 0 {
            return AiIntentResponse::failed(format!("intent {index} has priority 0"));
        }

        let entities = match item.entities {
            Some(raw) => QueryEntity {
                files: clean_set(raw.files),
                technologies: clean_set(raw.technologies),
                concepts: clean_set(raw.concepts),
                patterns: clean_set(raw.patterns),
            },
            None => fallback_entities.clone(),
        };

        intents.push(QueryIntent {
            id: item
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("ai-intent-{}", index + 1)),
            intent_type: item.intent_type,
            action,
            confidence: item.confidence,
            complexity: item.complexity.unwrap_or(fallback_complexity),
            priority,
            entities,
        });
    }

    let unique_ids: BTreeSet<&str> = intents.iter().map(|i| i.id.as_str()).collect();
    if unique_ids.len() != intents.len() {
        return AiIntentResponse::failed("duplicate intent ids");
    }

    AiIntentResponse::Intents(intents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  [1]  "), "[1]");
        assert_eq!(strip_code_fence("Here you go:\n```json\n[]\n```\nDone"), "[]");
        assert_eq!(strip_code_fence("```json [1] ```"), "[1]");
        assert_eq!(strip_code_fence("```[1]```"), "[1]");
    }

    #[test]
    fn test_single_line_fenced_reply_parses() {
        let response = r#"```json [{"type":"testing","action":"test","confidence":0.9}] ```"#;
        match parse_ai_intents(response, &QueryEntity::default(), Complexity::Low) {
            AiIntentResponse::Intents(intents) => {
                assert_eq!(intents.len(), 1);
                assert_eq!(intents[0].intent_type, IntentType::Testing);
                assert_eq!(intents[0].action, "test");
            }
            other => panic!("expected intents, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_fenced_response() {
        let response = r#"```json
[
  {"id": "i1", "type": "implementation", "action": "Create", "confidence": 0.9,
   "complexity": "medium", "priority": 1,
   "entities": {"files": ["login.ts"], "technologies": ["express"], "concepts": ["login"]}},
  {"type": "testing", "action": "test", "confidence": 0.85}
]
```"#;
        let fallback = QueryEntity::default();
        match parse_ai_intents(response, &fallback, Complexity::Low) {
            AiIntentResponse::Intents(intents) => {
                assert_eq!(intents.len(), 2);
                assert_eq!(intents[0].id, "i1");
                assert_eq!(intents[0].action, "create");
                assert!(intents[0].entities.files.contains("login.ts"));
                assert_eq!(intents[1].id, "ai-intent-2");
                assert_eq!(intents[1].priority, 2);
                assert_eq!(intents[1].complexity, Complexity::Low);
            }
            other => panic!("expected intents, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_wrapped_object() {
        let response = r#"{"intents": [{"type": "analysis", "action": "review", "confidence": 0.7}]}"#;
        let result = parse_ai_intents(response, &QueryEntity::default(), Complexity::Medium);
        assert!(matches!(result, AiIntentResponse::Intents(ref v) if v.len() == 1));
    }

    #[test]
    fn test_missing_entities_use_fallback() {
        let mut fallback = QueryEntity::default();
        fallback.files.insert("auth.ts".to_string());
        let response = r#"[{"type": "modification", "action": "fix", "confidence": 0.6}]"#;
        match parse_ai_intents(response, &fallback, Complexity::Low) {
            AiIntentResponse::Intents(intents) => {
                assert!(intents[0].entities.files.contains("auth.ts"));
            }
            other => panic!("expected intents, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_responses() {
        let fallback = QueryEntity::default();
        let cases = [
            "not json at all",
            "[]",
            r#"[{"type": "teleport", "action": "x", "confidence": 0.5}]"#,
            r#"[{"type": "testing", "action": "test", "confidence": 1.5}]"#,
            r#"[{"type": "testing", "action": "   ", "confidence": 0.5}]"#,
            r#"[{"type": "testing", "action": "test", "confidence": 0.5, "priority": 0}]"#,
            r#"[{"id": "a", "type": "testing", "action": "t", "confidence": 0.5},
                {"id": "a", "type": "analysis", "action": "r", "confidence": 0.5}]"#,
        ];
        for case in cases {
            assert!(
                matches!(
                    parse_ai_intents(case, &fallback, Complexity::Low),
                    AiIntentResponse::ParseFailed { .. }
                ),
                "expected parse failure for {case}"
            );
        }
    }
}

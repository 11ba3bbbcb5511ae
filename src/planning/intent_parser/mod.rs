mod complexity;
mod parser;
mod patterns;
mod prompt;

use crate::config::DecompositionConfig;
use crate::llm::{CompletionOptions, CompletionProvider};
use crate::planning::types::{
    Complexity, IntentSource, IntentType, QueryEntity, QueryIntent,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use complexity::*;
use patterns::*;
use prompt::*;

pub use parser::{AiIntentResponse, parse_ai_intents};

const FALLBACK_CONFIDENCE: f64 = 0.8;
const GENERAL_CONFIDENCE: f64 = 0.5;

/// Intents of one query plus where they came from
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedIntents {
    pub intents: Vec<QueryIntent>,
    pub source: IntentSource,
}

/// Turns raw query text into typed intents. Completion output is tried
/// first when a provider is configured; the regex fallback always yields
/// at least one intent.
#[derive(Clone)]
pub struct IntentParser {
    patterns: IntentPatterns,
    provider: Option<Arc<dyn CompletionProvider>>,
    options: CompletionOptions,
    high_threshold: f64,
}

impl IntentParser {
    pub fn new(
        config: &DecompositionConfig,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Result<Self, regex::Error> {
        let provider = if config.enable_ai_analysis {
            provider
        } else {
            None
        };
        Ok(Self {
            patterns: IntentPatterns::new()?,
            provider,
            options: CompletionOptions {
                temperature: config.ai_temperature,
                max_tokens: config.ai_max_tokens,
            },
            high_threshold: config.high_complexity_threshold,
        })
    }

    pub fn uses_ai(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn parse_intents(&self, query: &str, context: &serde_json::Value) -> ParsedIntents {
        if let Some(provider) = &self.provider {
            let prompt = build_intent_prompt(query, context);
            debug!(provider = provider.name(), "requesting intent analysis");

            match provider.complete(&prompt, &self.options).await {
                Ok(response) => {
                    let entities = self.extract_entities(query);
                    let complexity = self.estimate_complexity(query);
                    match parse_ai_intents(&response, &entities, complexity) {
                        AiIntentResponse::Intents(intents) => {
                            info!("AI intent analysis produced {} intents", intents.len());
                            return ParsedIntents {
                                intents,
                                source: IntentSource::Ai,
                            };
                        }
                        AiIntentResponse::ParseFailed { reason } => {
                            warn!(%reason, "AI intent response rejected, using pattern fallback");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "AI intent analysis failed, using pattern fallback");
                }
            }
        }

        ParsedIntents {
            intents: self.parse_with_patterns(query),
            source: IntentSource::PatternFallback,
        }
    }

    /// Deterministic regex classification, never empty
    pub fn parse_with_patterns(&self, query: &str) -> Vec<QueryIntent> {
        let query_lower = query.to_lowercase();
        let matches = self.patterns.match_actions(&query_lower);
        let entities = self.patterns.extract_entities(query);
        let architecture = self.patterns.has_architecture_vocabulary(&query_lower);
        let complexity = classify_complexity(
            complexity_score(query, &matches, architecture),
            self.high_threshold,
        );

        if matches.is_empty() {
            debug!("no action family matched, using general intent");
            return vec![QueryIntent {
                id: "intent-1".to_string(),
                intent_type: IntentType::General,
                action: "general".to_string(),
                confidence: GENERAL_CONFIDENCE,
                complexity,
                priority: 1,
                entities,
            }];
        }

        matches
            .iter()
            .enumerate()
            .map(|(index, m)| QueryIntent {
                id: format!("intent-{}", index + 1),
                intent_type: m.intent_type,
                action: m.action.to_string(),
                confidence: FALLBACK_CONFIDENCE,
                complexity,
                priority: m.priority,
                entities: entities.clone(),
            })
            .collect()
    }

    pub fn extract_entities(&self, query: &str) -> QueryEntity {
        self.patterns.extract_entities(query)
    }

    pub fn estimate_complexity(&self, query: &str) -> Complexity {
        let query_lower = query.to_lowercase();
        let matches = self.patterns.match_actions(&query_lower);
        let architecture = self.patterns.has_architecture_vocabulary(&query_lower);
        classify_complexity(
            complexity_score(query, &matches, architecture),
            self.high_threshold,
        )
    }
}

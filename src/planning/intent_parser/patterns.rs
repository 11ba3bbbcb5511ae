use crate::planning::types::{IntentType, QueryEntity};
use regex::Regex;

/// (action, pattern, intent type, workflow priority)
const ACTION_FAMILIES: [(&str, &str, IntentType, u32); 7] = [
    (
        "analyze",
        r"\b(analy[sz]e|analysis|review|inspect|investigate|audit|explain|understand)\b",
        IntentType::Analysis,
        1,
    ),
    (
        "create",
        r"\b(create|build|implement|add|make|develop|write|generate|scaffold)\b",
        IntentType::Implementation,
        2,
    ),
    (
        "fix",
        r"\b(fix|debug|repair|resolve|patch)\b",
        IntentType::Modification,
        3,
    ),
    (
        "update",
        r"\b(update|modify|change|edit|rename|upgrade|refactor|migrate)\b",
        IntentType::Modification,
        4,
    ),
    (
        "optimize",
        r"\b(optimi[sz]e|optimization|improve|speed up|tune)\b",
        IntentType::Optimization,
        5,
    ),
    (
        "test",
        r"\b(test|tests|testing|verify|validate|unit test|e2e)\b",
        IntentType::Testing,
        6,
    ),
    (
        "deploy",
        r"\b(deploy|deployment|release|publish|ship|roll out)\b",
        IntentType::Deployment,
        7,
    ),
];

const FILE_PATTERN: &str = r"(?:[\w-]+/)*[\w.-]*\w\.(?:tsx?|jsx?|mjs|py|rs|go|java|kt|rb|php|cs|cpp|c|h|json|ya?ml|toml|md|css|scss|html|sql|sh)\b";

const TECHNOLOGY_PATTERN: &str = r"\b(react|vue|angular|svelte|node(?:\.js)?|express|next\.?js|typescript|javascript|python|rust|golang|java|kotlin|swift|docker|kubernetes|k8s|postgres(?:ql)?|mysql|sqlite|mongodb|redis|graphql|grpc|aws|gcp|azure|terraform|django|flask|fastapi|spring|rails|tokio|webpack|vite|jest)\b";

const CONCEPT_PATTERN: &str = r"\b(api|endpoint|authentication|authorization|auth|login|logout|database|cache|caching|security|performance|ui|frontend|backend|middleware|microservices?|component|service|model|schema|migration|pipeline|session|logging|monitoring|validation|routing)\b";

const DESIGN_PATTERN_PATTERN: &str = r"\b(singleton|factory|observer|mvc|mvvm|repository pattern|dependency injection|pub/?sub|event sourcing|cqrs|adapter pattern|strategy pattern)\b";

const ARCHITECTURE_PATTERN: &str = r"\b(architecture|architectural|scalab\w*|distributed|microservices?|system design|infrastructure|large[- ]scale|enterprise|multi[- ]tenant)\b";

/// Names that look like files but are technologies
const DOTTED_TECHNOLOGIES: [&str; 4] = ["node.js", "next.js", "vue.js", "express.js"];

#[derive(Debug, Clone)]
pub(crate) struct ActionFamily {
    pub action: &'static str,
    pub intent_type: IntentType,
    pub priority: u32,
    regex: Regex,
}

/// A family that matched a query, with how many keyword hits it had
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActionMatch {
    pub action: &'static str,
    pub intent_type: IntentType,
    pub priority: u32,
    pub hits: usize,
}

/// Compiled regular expressions of the pattern-matching fallback
#[derive(Debug, Clone)]
pub(crate) struct IntentPatterns {
    families: Vec<ActionFamily>,
    files: Regex,
    technologies: Regex,
    concepts: Regex,
    design_patterns: Regex,
    architecture: Regex,
}

impl IntentPatterns {
    pub fn new() -> Result<Self, regex::Error> {
        let families = ACTION_FAMILIES
            .iter()
            .map(|(action, pattern, intent_type, priority)| {
                Ok(ActionFamily {
                    action: *action,
                    intent_type: *intent_type,
                    priority: *priority,
                    regex: Regex::new(pattern)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            families,
            files: Regex::new(FILE_PATTERN)?,
            technologies: Regex::new(TECHNOLOGY_PATTERN)?,
            concepts: Regex::new(CONCEPT_PATTERN)?,
            design_patterns: Regex::new(DESIGN_PATTERN_PATTERN)?,
            architecture: Regex::new(ARCHITECTURE_PATTERN)?,
        })
    }

    /// Matched action families in workflow-priority order
    pub fn match_actions(&self, query_lower: &str) -> Vec<ActionMatch> {
        let mut matches: Vec<ActionMatch> = self
            .families
            .iter()
            .filter_map(|family| {
                let hits = family.regex.find_iter(query_lower).count();
                (hits > 0).then_some(ActionMatch {
                    action: family.action,
                    intent_type: family.intent_type,
                    priority: family.priority,
                    hits,
                })
            })
            .collect();
        matches.sort_by_key(|m| m.priority);
        matches
    }

    pub fn has_architecture_vocabulary(&self, query_lower: &str) -> bool {
        self.architecture.is_match(query_lower)
    }

    /// Files keep their original case; everything else is matched lower-cased
    pub fn extract_entities(&self, query: &str) -> QueryEntity {
        let query_lower = query.to_lowercase();
        let mut entities = QueryEntity::default();

        for m in self.files.find_iter(query) {
            let file = m.as_str().trim_start_matches("./");
            if !DOTTED_TECHNOLOGIES.contains(&file.to_lowercase().as_str()) {
                entities.files.insert(file.to_string());
            }
        }
        for m in self.technologies.find_iter(&query_lower) {
            entities
                .technologies
                .insert(m.as_str().trim_end_matches(".js").to_string());
        }
        for m in self.concepts.find_iter(&query_lower) {
            entities.concepts.insert(m.as_str().to_string());
        }
        for m in self.design_patterns.find_iter(&query_lower) {
            entities.patterns.insert(m.as_str().to_string());
        }

        entities
    }
}

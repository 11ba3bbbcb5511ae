use crate::planning::intent_parser::patterns::ActionMatch;
use crate::planning::types::Complexity;

const HIT_WEIGHT: f64 = 0.1;
const MAX_COUNTED_HITS: usize = 5;
const EXTRA_FAMILY_WEIGHT: f64 = 0.15;
const LONG_QUERY_CHARS: usize = 100;
const LONG_QUERY_WEIGHT: f64 = 0.2;
const ARCHITECTURE_WEIGHT: f64 = 0.3;
const MEDIUM_THRESHOLD: f64 = 0.4;

/// Weighted complexity score of a query in [0, 1]
pub(crate) fn complexity_score(query: &str, matches: &[ActionMatch], architecture: bool) -> f64 {
    let hits: usize = matches.iter().map(|m| m.hits).sum();
    let mut score = HIT_WEIGHT * hits.min(MAX_COUNTED_HITS) as f64;

    if matches.len() > 1 {
        score += EXTRA_FAMILY_WEIGHT * (matches.len() - 1) as f64;
    }
    if query.chars().count() > LONG_QUERY_CHARS {
        score += LONG_QUERY_WEIGHT;
    }
    if architecture {
        score += ARCHITECTURE_WEIGHT;
    }

    score.min(1.0)
}

pub(crate) fn classify_complexity(score: f64, high_threshold: f64) -> Complexity {
    if score >= high_threshold {
        Complexity::High
    } else if score >= MEDIUM_THRESHOLD {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}

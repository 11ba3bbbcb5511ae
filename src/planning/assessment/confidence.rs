use crate::planning::types::{Complexity, QueryIntent, SubTask};

const BASELINE: f64 = 0.9;

/// Confidence in a decomposition, in [0, 1]
pub fn compute_confidence(
    intents: &[QueryIntent],
    sub_tasks: &[SubTask],
    complexity: Complexity,
    has_conflicts: bool,
) -> f64 {
    let mean = if intents.is_empty() {
        BASELINE
    } else {
        intents.iter().map(|i| i.confidence).sum::<f64>() / intents.len() as f64
    };

    let mut confidence = (BASELINE + mean) / 2.0;
    if complexity == Complexity::High {
        confidence *= 0.8;
    }
    if has_conflicts {
        confidence *= 0.9;
    }
    if let [only] = sub_tasks
        && only.complexity == Complexity::Low
    {
        confidence *= 1.1;
    }

    confidence.clamp(0.0, 1.0)
}

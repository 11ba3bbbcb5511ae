use super::{ANALYSIS_COMPLETE, step, subject};
use crate::planning::task_generator::estimates::{analysis_secs, optimization_secs};
use crate::planning::types::{QueryIntent, SubTask, SubTaskType};

pub(crate) fn optimization_tasks(intent: &QueryIntent) -> Vec<SubTask> {
    let subject = subject(intent);
    vec![
        step(
            intent,
            "profile",
            SubTaskType::Analysis,
            format!("Profile {} and find bottlenecks", subject),
            0,
        )
        .with_duration(analysis_secs(intent.complexity, &intent.entities)),
        step(
            intent,
            "optimize",
            SubTaskType::Optimization,
            format!("Optimize {}", subject),
            1,
        )
        .with_duration(optimization_secs(intent.complexity, &intent.entities))
        .with_requirements(&[ANALYSIS_COMPLETE]),
    ]
}

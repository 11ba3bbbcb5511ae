use super::{step, subject};
use crate::planning::task_generator::estimates::analysis_secs;
use crate::planning::types::{QueryIntent, SubTask, SubTaskType};

pub(crate) fn analysis_tasks(intent: &QueryIntent) -> Vec<SubTask> {
    vec![
        step(
            intent,
            "analyze",
            SubTaskType::Analysis,
            format!("Analyze {}", subject(intent)),
            0,
        )
        .with_duration(analysis_secs(intent.complexity, &intent.entities)),
    ]
}

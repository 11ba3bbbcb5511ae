use super::{step, subject};
use crate::planning::task_generator::estimates::generic_secs;
use crate::planning::types::{QueryIntent, SubTask, SubTaskType};

pub(crate) fn generic_tasks(intent: &QueryIntent) -> Vec<SubTask> {
    vec![
        step(
            intent,
            "task",
            SubTaskType::General,
            format!("Carry out {}", subject(intent)),
            0,
        )
        .with_duration(generic_secs()),
    ]
}

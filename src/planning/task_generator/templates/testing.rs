use super::{IMPLEMENTATION_COMPLETE, step, subject};
use crate::planning::task_generator::estimates::testing_secs;
use crate::planning::types::{QueryIntent, SubTask, SubTaskType};

pub(crate) fn testing_tasks(intent: &QueryIntent) -> Vec<SubTask> {
    vec![
        step(
            intent,
            "test",
            SubTaskType::Testing,
            format!("Write and run tests for {}", subject(intent)),
            0,
        )
        .with_duration(testing_secs(intent.complexity, &intent.entities))
        .with_requirements(&[IMPLEMENTATION_COMPLETE]),
    ]
}

use super::{step, subject};
use crate::planning::task_generator::estimates::{implementation_secs, planning_secs};
use crate::planning::types::{Complexity, QueryIntent, SubTask, SubTaskType};

pub(crate) fn implementation_tasks(intent: &QueryIntent) -> Vec<SubTask> {
    let subject = subject(intent);
    let mut tasks = Vec::with_capacity(2);
    let mut index = 0;

    if intent.complexity == Complexity::High {
        tasks.push(
            step(
                intent,
                "plan",
                SubTaskType::Planning,
                format!("Plan the implementation of {}", subject),
                index,
            )
            .with_duration(planning_secs(intent.complexity)),
        );
        index += 1;
    }

    tasks.push(
        step(
            intent,
            "implement",
            SubTaskType::Implementation,
            format!("Implement {}", subject),
            index,
        )
        .with_duration(implementation_secs(intent.complexity, &intent.entities)),
    );

    tasks
}

use crate::planning::types::{Complexity, ResourceLevel, ResourceRequirements, SubTask, SubTaskType};

const MANY_TASKS: usize = 5;
const MANY_HIGH_TASKS: usize = 2;

/// Highest sub-task complexity, raised to medium for large decompositions
pub fn overall_complexity(sub_tasks: &[SubTask]) -> Complexity {
    let highest = sub_tasks
        .iter()
        .map(|t| t.complexity)
        .max()
        .unwrap_or(Complexity::Low);
    if sub_tasks.len() > MANY_TASKS {
        highest.max(Complexity::Medium)
    } else {
        highest
    }
}

/// Whole-decomposition resource profile. `total_duration` is the plan's
/// total duration.
pub fn assess_resources(
    sub_tasks: &[SubTask],
    complexity: Complexity,
    total_duration: u64,
) -> ResourceRequirements {
    let mut resources = ResourceRequirements {
        cpu: ResourceLevel::Medium,
        memory: ResourceLevel::Medium,
        network: ResourceLevel::Low,
        disk: ResourceLevel::Low,
        estimated_duration: total_duration,
        concurrent_tasks: 1,
    };

    let ships_or_tests = sub_tasks
        .iter()
        .any(|t| matches!(t.task_type, SubTaskType::Testing | SubTaskType::Deployment));
    if ships_or_tests {
        resources.cpu = ResourceLevel::High;
        resources.network = ResourceLevel::High;
    }

    let high_tasks = sub_tasks
        .iter()
        .filter(|t| t.complexity == Complexity::High)
        .count();
    if complexity == Complexity::High || high_tasks > MANY_HIGH_TASKS {
        resources.memory = ResourceLevel::High;
        resources.disk = ResourceLevel::High;
    }

    if sub_tasks.len() > MANY_TASKS {
        resources.concurrent_tasks = 3;
    }

    resources
}

mod analysis;
mod deployment;
mod generic;
mod implementation;
mod modification;
mod optimization;
mod testing;

pub(crate) use analysis::analysis_tasks;
pub(crate) use deployment::deployment_tasks;
pub(crate) use generic::generic_tasks;
pub(crate) use implementation::implementation_tasks;
pub(crate) use modification::modification_tasks;
pub(crate) use optimization::optimization_tasks;
pub(crate) use testing::testing_tasks;

use crate::planning::types::{QueryIntent, SubTask, SubTaskType};

pub(crate) const IMPLEMENTATION_COMPLETE: &str = "implementation_complete";
pub(crate) const TESTING_COMPLETE: &str = "testing_complete";
pub(crate) const ANALYSIS_COMPLETE: &str = "analysis_complete";
pub(crate) const VALIDATION_COMPLETE: &str = "validation_complete";

/// Step `index` of the template expanded for `intent`
pub(crate) fn step(
    intent: &QueryIntent,
    suffix: &str,
    task_type: SubTaskType,
    description: String,
    index: u32,
) -> SubTask {
    let priority = intent.priority.saturating_mul(10).saturating_add(index);
    let task = SubTask::new(
        format!("{}-{}", intent.id, suffix),
        task_type,
        description,
        priority,
        intent.complexity,
    )
    .with_intent(&intent.id);

    if intent.entities.is_empty() {
        task
    } else {
        task.with_entities(&intent.entities)
    }
}

/// Short human description of what an intent is about
pub(crate) fn subject(intent: &QueryIntent) -> String {
    let entities = &intent.entities;
    let names: Vec<&str> = if !entities.files.is_empty() {
        entities.files.iter().map(String::as_str).collect()
    } else if !entities.concepts.is_empty() {
        entities.concepts.iter().map(String::as_str).collect()
    } else {
        entities.technologies.iter().map(String::as_str).collect()
    };

    if names.is_empty() {
        "the requested change".to_string()
    } else {
        names.join(", ")
    }
}

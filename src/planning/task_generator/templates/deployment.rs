use super::{TESTING_COMPLETE, VALIDATION_COMPLETE, step};
use crate::planning::task_generator::estimates::{deployment_secs, validation_secs};
use crate::planning::types::{QueryIntent, SubTask, SubTaskType};

/// Pre-deployment validation followed by the deployment itself. The
/// validation step is deployment-typed so `validation_complete` can
/// resolve to it.
pub(crate) fn deployment_tasks(intent: &QueryIntent) -> Vec<SubTask> {
    vec![
        step(
            intent,
            "validate",
            SubTaskType::Deployment,
            "Run pre-deployment validation".to_string(),
            0,
        )
        .with_duration(validation_secs(intent.complexity))
        .with_requirements(&[TESTING_COMPLETE]),
        step(
            intent,
            "deploy",
            SubTaskType::Deployment,
            "Deploy the changes".to_string(),
            1,
        )
        .with_duration(deployment_secs(intent.complexity))
        .with_requirements(&[VALIDATION_COMPLETE]),
    ]
}

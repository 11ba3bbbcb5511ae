mod estimates;
mod templates;

use crate::planning::types::{IntentType, QueryIntent, SubTask};
use tracing::{debug, warn};

use templates::*;

pub(crate) use templates::{
    ANALYSIS_COMPLETE, IMPLEMENTATION_COMPLETE, TESTING_COMPLETE, VALIDATION_COMPLETE,
};

/// Sub-tasks generated for a set of intents
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTasks {
    pub sub_tasks: Vec<SubTask>,
    /// Set when templates produced more than `max_sub_tasks`
    pub truncated: bool,
}

/// Expands intents into sub-tasks using one template per intent type
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    max_sub_tasks: usize,
}

impl TaskGenerator {
    pub fn new(max_sub_tasks: usize) -> Self {
        Self { max_sub_tasks }
    }

    /// Intents are expanded in priority order; every sub-task carries the
    /// caller's workspace context.
    pub fn generate_sub_tasks(
        &self,
        intents: &[QueryIntent],
        context: &serde_json::Value,
    ) -> GeneratedTasks {
        let mut ordered: Vec<&QueryIntent> = intents.iter().collect();
        ordered.sort_by_key(|intent| intent.priority);

        let mut sub_tasks: Vec<SubTask> = ordered
            .into_iter()
            .flat_map(|intent| {
                let tasks = expand_intent(intent);
                debug!(intent = %intent.id, "expanded into {} sub-tasks", tasks.len());
                tasks
            })
            .collect();

        let truncated = sub_tasks.len() > self.max_sub_tasks;
        if truncated {
            warn!(
                "Generated {} sub-tasks, truncating to {}",
                sub_tasks.len(),
                self.max_sub_tasks
            );
            sub_tasks.truncate(self.max_sub_tasks);
        }

        if !context.is_null() {
            for task in &mut sub_tasks {
                task.workspace_context = context.clone();
            }
        }

        GeneratedTasks {
            sub_tasks,
            truncated,
        }
    }
}

fn expand_intent(intent: &QueryIntent) -> Vec<SubTask> {
    match intent.intent_type {
        IntentType::Implementation => implementation_tasks(intent),
        IntentType::Testing => testing_tasks(intent),
        IntentType::Deployment => deployment_tasks(intent),
        IntentType::Analysis => analysis_tasks(intent),
        IntentType::Optimization => optimization_tasks(intent),
        IntentType::Modification => modification_tasks(intent),
        IntentType::General => generic_tasks(intent),
    }
}

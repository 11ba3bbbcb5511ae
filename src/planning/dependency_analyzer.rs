//! Ordering constraints between generated sub-tasks.
//!
//! Every rule only ever points a task at tasks with a strictly smaller
//! priority number, so analyzer output is acyclic.

use crate::planning::task_generator::{
    ANALYSIS_COMPLETE, IMPLEMENTATION_COMPLETE, TESTING_COMPLETE, VALIDATION_COMPLETE,
};
use crate::planning::types::{DependencyMap, SubTask, SubTaskType};
use std::collections::BTreeSet;
use tracing::debug;

/// Task types a task of `task_type` always waits on when they come earlier
fn prerequisite_types(task_type: SubTaskType) -> &'static [SubTaskType] {
    match task_type {
        SubTaskType::Implementation => &[SubTaskType::Planning],
        SubTaskType::Testing => &[SubTaskType::Implementation],
        SubTaskType::Deployment => &[SubTaskType::Testing, SubTaskType::Implementation],
        SubTaskType::Optimization => &[SubTaskType::Analysis],
        _ => &[],
    }
}

/// Task types that satisfy a requirement tag
fn requirement_types(requirement: &str) -> &'static [SubTaskType] {
    match requirement {
        IMPLEMENTATION_COMPLETE => &[
            SubTaskType::Implementation,
            SubTaskType::Modification,
            SubTaskType::Bugfix,
        ],
        TESTING_COMPLETE => &[SubTaskType::Testing],
        ANALYSIS_COMPLETE => &[SubTaskType::Analysis],
        VALIDATION_COMPLETE => &[SubTaskType::Testing, SubTaskType::Deployment],
        _ => &[],
    }
}

fn shares_file(a: &SubTask, b: &SubTask) -> bool {
    a.files().any(|file| b.files().any(|other| other == file))
}

/// Task id → ids it must wait on. Tasks without dependencies are absent.
pub fn analyze_dependencies(sub_tasks: &[SubTask]) -> DependencyMap {
    let mut dependencies = DependencyMap::new();

    for task in sub_tasks {
        let mut deps = BTreeSet::new();
        let earlier = sub_tasks
            .iter()
            .filter(|other| other.id != task.id && other.priority < task.priority);

        for other in earlier {
            if prerequisite_types(task.task_type).contains(&other.task_type) {
                deps.insert(other.id.clone());
            }
            if task
                .requirements
                .iter()
                .any(|req| requirement_types(req).contains(&other.task_type))
            {
                deps.insert(other.id.clone());
            }
            if shares_file(task, other) {
                deps.insert(other.id.clone());
            }
        }

        if !deps.is_empty() {
            debug!(task = %task.id, ?deps, "resolved dependencies");
            dependencies.insert(task.id.clone(), deps);
        }
    }

    dependencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::graph::{TopoOrder, topological_order};
    use crate::planning::types::{Complexity, QueryEntity};

    fn task(id: &str, task_type: SubTaskType, priority: u32) -> SubTask {
        SubTask::new(
            id.to_string(),
            task_type,
            id.to_string(),
            priority,
            Complexity::Low,
        )
    }

    fn with_file(task: SubTask, file: &str) -> SubTask {
        let mut entities = QueryEntity::default();
        entities.files.insert(file.to_string());
        task.with_entities(&entities)
    }

    #[test]
    fn test_testing_waits_on_implementation() {
        let tasks = vec![
            task("impl", SubTaskType::Implementation, 20),
            task("test", SubTaskType::Testing, 60).with_requirements(&[IMPLEMENTATION_COMPLETE]),
        ];
        let deps = analyze_dependencies(&tasks);

        assert_eq!(deps.len(), 1);
        assert_eq!(deps["test"], BTreeSet::from(["impl".to_string()]));
        assert!(!deps.contains_key("impl"));
    }

    #[test]
    fn test_deployment_chain() {
        let tasks = vec![
            task("impl", SubTaskType::Implementation, 20),
            task("test", SubTaskType::Testing, 60),
            task("validate", SubTaskType::Deployment, 70).with_requirements(&[TESTING_COMPLETE]),
            task("deploy", SubTaskType::Deployment, 71).with_requirements(&[VALIDATION_COMPLETE]),
        ];
        let deps = analyze_dependencies(&tasks);

        assert_eq!(
            deps["validate"],
            BTreeSet::from(["impl".to_string(), "test".to_string()])
        );
        assert_eq!(
            deps["deploy"],
            BTreeSet::from(["impl".to_string(), "test".to_string(), "validate".to_string()])
        );
    }

    #[test]
    fn test_implementation_waits_on_planning() {
        let tasks = vec![
            task("plan", SubTaskType::Planning, 10),
            task("impl", SubTaskType::Implementation, 11),
        ];
        let deps = analyze_dependencies(&tasks);
        assert_eq!(deps["impl"], BTreeSet::from(["plan".to_string()]));
        assert!(!deps.contains_key("plan"));
    }

    #[test]
    fn test_requirement_only_matches_earlier_tasks() {
        let tasks = vec![
            task("test", SubTaskType::Testing, 10).with_requirements(&[IMPLEMENTATION_COMPLETE]),
            task("impl", SubTaskType::Implementation, 20),
        ];
        assert!(analyze_dependencies(&tasks).is_empty());
    }

    #[test]
    fn test_implementation_complete_accepts_bugfix() {
        let tasks = vec![
            task("fix", SubTaskType::Bugfix, 30),
            task("test", SubTaskType::Testing, 60).with_requirements(&[IMPLEMENTATION_COMPLETE]),
        ];
        let deps = analyze_dependencies(&tasks);
        assert_eq!(deps["test"], BTreeSet::from(["fix".to_string()]));
    }

    #[test]
    fn test_shared_file_orders_by_priority() {
        let tasks = vec![
            with_file(task("create", SubTaskType::Implementation, 20), "auth.ts"),
            with_file(task("fix", SubTaskType::Bugfix, 30), "auth.ts"),
            with_file(task("other", SubTaskType::Modification, 40), "db.ts"),
        ];
        let deps = analyze_dependencies(&tasks);

        assert_eq!(deps["fix"], BTreeSet::from(["create".to_string()]));
        assert!(!deps.contains_key("other"));
    }

    #[test]
    fn test_equal_priorities_never_depend_on_each_other() {
        let tasks = vec![
            with_file(task("a", SubTaskType::Implementation, 20), "x.rs"),
            with_file(task("b", SubTaskType::Testing, 20), "x.rs"),
        ];
        assert!(analyze_dependencies(&tasks).is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const TYPES: [SubTaskType; 9] = [
            SubTaskType::Analysis,
            SubTaskType::Implementation,
            SubTaskType::Testing,
            SubTaskType::Deployment,
            SubTaskType::Modification,
            SubTaskType::Optimization,
            SubTaskType::Bugfix,
            SubTaskType::Planning,
            SubTaskType::General,
        ];

        fn arb_task(index: usize) -> impl Strategy<Value = SubTask> {
            (0..TYPES.len(), 0u32..8, proptest::option::of(0usize..3)).prop_map(
                move |(type_index, priority, file)| {
                    let t = task(&format!("t{index}"), TYPES[type_index], priority)
                        .with_requirements(&[IMPLEMENTATION_COMPLETE, VALIDATION_COMPLETE]);
                    match file {
                        Some(n) => with_file(t, &format!("file{n}.rs")),
                        None => t,
                    }
                },
            )
        }

        fn arb_tasks() -> impl Strategy<Value = Vec<SubTask>> {
            (1usize..12).prop_flat_map(|n| (0..n).map(arb_task).collect::<Vec<_>>())
        }

        proptest! {
            #[test]
            fn prop_analyzer_output_is_acyclic(tasks in arb_tasks()) {
                let deps = analyze_dependencies(&tasks);
                let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();

                prop_assert!(matches!(topological_order(&ids, &deps), TopoOrder::Sorted(_)));
                for (task, on) in &deps {
                    prop_assert!(!on.is_empty());
                    prop_assert!(!on.contains(task));
                }
            }

            #[test]
            fn prop_analyzer_is_deterministic(tasks in arb_tasks()) {
                prop_assert_eq!(analyze_dependencies(&tasks), analyze_dependencies(&tasks));
            }
        }
    }
}

use crate::planning::graph::TopoOrder;
use crate::planning::types::{Complexity, ConflictType, Severity, SubTask, SubTaskType, TaskConflict};
use std::collections::BTreeMap;

const RESOURCE_CONFLICT_MIN_TASKS: usize = 4;

fn is_contended(task: &SubTask) -> bool {
    matches!(task.task_type, SubTaskType::Testing | SubTaskType::Deployment)
        || task.complexity == Complexity::High
}

fn file_conflicts(sub_tasks: &[SubTask]) -> Vec<TaskConflict> {
    let mut editors: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for task in sub_tasks.iter().filter(|t| t.task_type.edits_files()) {
        for file in task.files() {
            editors.entry(file.as_str()).or_default().push(task.id.clone());
        }
    }

    editors
        .into_iter()
        .filter(|(_, tasks)| tasks.len() > 1)
        .map(|(file, tasks)| TaskConflict {
            conflict_type: ConflictType::FileModification,
            description: format!("{} tasks modify {}", tasks.len(), file),
            tasks,
            severity: Severity::Medium,
            resolution: "sequence_execution".to_string(),
        })
        .collect()
}

fn resource_conflict(sub_tasks: &[SubTask]) -> Option<TaskConflict> {
    let contended: Vec<String> = sub_tasks
        .iter()
        .filter(|t| is_contended(t))
        .map(|t| t.id.clone())
        .collect();

    (contended.len() >= RESOURCE_CONFLICT_MIN_TASKS).then(|| TaskConflict {
        conflict_type: ConflictType::ResourceConflict,
        description: format!(
            "{} resource-intensive tasks compete for the same machine",
            contended.len()
        ),
        tasks: contended,
        severity: Severity::Low,
        resolution: "parallel_limit".to_string(),
    })
}

fn timing_conflicts(sub_tasks: &[SubTask], long_task_threshold_secs: u64) -> Vec<TaskConflict> {
    sub_tasks
        .iter()
        .filter(|t| t.estimated_duration > long_task_threshold_secs)
        .map(|t| TaskConflict {
            conflict_type: ConflictType::TimingConflict,
            tasks: vec![t.id.clone()],
            severity: Severity::Low,
            resolution: "split_task".to_string(),
            description: format!(
                "{} is estimated at {}s, above the {}s limit",
                t.id, t.estimated_duration, long_task_threshold_secs
            ),
        })
        .collect()
}

/// Conflicts between sub-tasks, reported as data. A cyclic `order` yields
/// a `dependency_cycle` conflict.
pub fn detect_conflicts(
    sub_tasks: &[SubTask],
    order: &TopoOrder,
    long_task_threshold_secs: u64,
) -> Vec<TaskConflict> {
    let mut conflicts = file_conflicts(sub_tasks);
    conflicts.extend(resource_conflict(sub_tasks));

    if let Some(path) = order.cycle() {
        conflicts.push(TaskConflict {
            conflict_type: ConflictType::DependencyCycle,
            tasks: path.to_vec(),
            severity: Severity::High,
            resolution: "break_cycle".to_string(),
            description: format!("Circular dependency: {}", path.join(" -> ")),
        });
    }

    conflicts.extend(timing_conflicts(sub_tasks, long_task_threshold_secs));
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::types::QueryEntity;

    fn task(id: &str, task_type: SubTaskType, complexity: Complexity) -> SubTask {
        SubTask::new(id.to_string(), task_type, id.to_string(), 10, complexity)
    }

    fn touching(task: SubTask, file: &str) -> SubTask {
        let mut entities = QueryEntity::default();
        entities.files.insert(file.to_string());
        task.with_entities(&entities)
    }

    fn sorted() -> TopoOrder {
        TopoOrder::Sorted(Vec::new())
    }

    #[test]
    fn test_shared_auth_file_conflict() {
        let tasks = vec![
            touching(task("create", SubTaskType::Implementation, Complexity::Low), "auth.ts"),
            touching(task("fix", SubTaskType::Bugfix, Complexity::Low), "auth.ts"),
            touching(task("review", SubTaskType::Analysis, Complexity::Low), "auth.ts"),
        ];
        let conflicts = detect_conflicts(&tasks, &sorted(), 3600);

        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.conflict_type, ConflictType::FileModification);
        assert_eq!(conflict.tasks, vec!["create".to_string(), "fix".to_string()]);
        assert_eq!(conflict.severity, Severity::Medium);
        assert_eq!(conflict.resolution, "sequence_execution");
    }

    #[test]
    fn test_modification_then_implementation_of_auth_ts() {
        use crate::planning::dependency_analyzer::analyze_dependencies;
        use crate::planning::graph::topological_order;

        fn at(id: &str, task_type: SubTaskType, priority: u32) -> SubTask {
            let task = SubTask::new(id.to_string(), task_type, id.to_string(), priority, Complexity::Low);
            touching(task, "auth.ts")
        }

        let tasks = vec![
            at("modify", SubTaskType::Modification, 1),
            at("implement", SubTaskType::Implementation, 2),
        ];
        let deps = analyze_dependencies(&tasks);
        assert!(deps["implement"].contains("modify"));

        let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        let order = topological_order(&ids, &deps);
        let conflicts = detect_conflicts(&tasks, &order, 3600);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::FileModification);
        assert_eq!(
            conflicts[0].tasks,
            vec!["modify".to_string(), "implement".to_string()]
        );
        assert_eq!(conflicts[0].severity, Severity::Medium);
        assert!(conflicts[0].description.contains("auth.ts"));
    }

    #[test]
    fn test_resource_conflict_needs_more_than_three() {
        let three: Vec<_> = (0..3)
            .map(|i| task(&format!("t{i}"), SubTaskType::Testing, Complexity::Low))
            .collect();
        assert!(detect_conflicts(&three, &sorted(), 3600).is_empty());

        let mut four = three.clone();
        four.push(task("heavy", SubTaskType::Analysis, Complexity::High));
        let conflicts = detect_conflicts(&four, &sorted(), 3600);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::ResourceConflict);
        assert_eq!(conflicts[0].severity, Severity::Low);
        assert_eq!(conflicts[0].resolution, "parallel_limit");
        assert_eq!(conflicts[0].tasks.len(), 4);
    }

    #[test]
    fn test_cycle_reported_from_order() {
        let cycle = TopoOrder::Cycle(vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        let conflicts = detect_conflicts(&[], &cycle, 3600);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::DependencyCycle);
        assert_eq!(conflicts[0].severity, Severity::High);
        assert_eq!(conflicts[0].resolution, "break_cycle");
    }

    #[test]
    fn test_long_task_timing_conflict() {
        let tasks = vec![
            task("long", SubTaskType::Implementation, Complexity::Low).with_duration(4000),
            task("short", SubTaskType::Implementation, Complexity::Low).with_duration(3600),
        ];
        let conflicts = detect_conflicts(&tasks, &sorted(), 3600);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::TimingConflict);
        assert_eq!(conflicts[0].tasks, vec!["long".to_string()]);
        assert_eq!(conflicts[0].resolution, "split_task");
    }
}

//! Dependency-graph traversal shared by the scheduler and the conflict detector.

use crate::planning::types::DependencyMap;
use std::collections::{HashMap, HashSet};

/// Outcome of a topological sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopoOrder {
    /// Every dependency precedes its dependents
    Sorted(Vec<String>),
    /// Ids along the cycle, first id repeated at the end
    Cycle(Vec<String>),
}

impl TopoOrder {
    pub fn cycle(&self) -> Option<&[String]> {
        match self {
            TopoOrder::Cycle(path) => Some(path),
            TopoOrder::Sorted(_) => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn visit<'a>(
    node: &'a str,
    known: &HashSet<&'a str>,
    dependencies: &'a DependencyMap,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
    order: &mut Vec<String>,
) -> Result<(), Vec<String>> {
    match marks.get(node) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|id| *id == node).unwrap_or(0);
            let mut path: Vec<String> = stack[start..].iter().map(|id| id.to_string()).collect();
            path.push(node.to_string());
            return Err(path);
        }
        None => {}
    }

    marks.insert(node, Mark::Visiting);
    stack.push(node);

    if let Some(deps) = dependencies.get(node) {
        for dep in deps {
            // Dependencies on ids outside the task set cannot gate anything
            if known.contains(dep.as_str()) {
                visit(dep, known, dependencies, marks, stack, order)?;
            }
        }
    }

    stack.pop();
    marks.insert(node, Mark::Done);
    order.push(node.to_string());
    Ok(())
}

/// Depth-first topological sort of `task_ids`, visiting tasks in the given
/// order so the result is deterministic.
pub fn topological_order(task_ids: &[String], dependencies: &DependencyMap) -> TopoOrder {
    let known: HashSet<&str> = task_ids.iter().map(String::as_str).collect();
    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut order = Vec::with_capacity(task_ids.len());

    for id in task_ids {
        if let Err(path) = visit(id, &known, dependencies, &mut marks, &mut stack, &mut order) {
            return TopoOrder::Cycle(path);
        }
    }

    TopoOrder::Sorted(order)
}

/// Reverse edges: task id → ids of the tasks waiting on it
pub fn dependents_of(dependencies: &DependencyMap) -> HashMap<&str, Vec<&str>> {
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (task, deps) in dependencies {
        for dep in deps {
            dependents.entry(dep.as_str()).or_default().push(task.as_str());
        }
    }
    dependents
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn deps(edges: &[(&str, &[&str])]) -> DependencyMap {
        edges
            .iter()
            .map(|(task, on)| {
                (
                    task.to_string(),
                    on.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
                )
            })
            .collect()
    }

    #[test]
    fn test_sorted_places_dependencies_first() {
        let tasks = ids(&["deploy", "test", "build"]);
        let map = deps(&[("deploy", &["test"]), ("test", &["build"])]);

        let order = topological_order(&tasks, &map);
        assert_eq!(order, TopoOrder::Sorted(ids(&["build", "test", "deploy"])));
    }

    #[test]
    fn test_independent_tasks_keep_input_order() {
        let tasks = ids(&["a", "b", "c"]);
        let order = topological_order(&tasks, &DependencyMap::new());
        assert_eq!(order, TopoOrder::Sorted(ids(&["a", "b", "c"])));
    }

    #[test]
    fn test_cycle_reports_path() {
        let tasks = ids(&["a", "b", "c"]);
        let map = deps(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);

        match topological_order(&tasks, &map) {
            TopoOrder::Cycle(path) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_dependencies_are_ignored() {
        let tasks = ids(&["a"]);
        let map = deps(&[("a", &["ghost"])]);
        assert_eq!(topological_order(&tasks, &map), TopoOrder::Sorted(ids(&["a"])));
    }

    #[test]
    fn test_dependents_of_reverses_edges() {
        let map = deps(&[("test", &["build"]), ("deploy", &["build", "test"])]);
        let dependents = dependents_of(&map);
        let mut of_build = dependents.get("build").cloned().unwrap();
        of_build.sort();
        assert_eq!(of_build, vec!["deploy", "test"]);
    }
}

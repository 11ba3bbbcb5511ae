use crate::planning::error::DecompositionError;
use crate::planning::graph::{TopoOrder, dependents_of, topological_order};
use crate::planning::types::{
    DependencyMap, ExecutionPhase, ExecutionPlan, ResourceRequirements, SubTask,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, error};

/// Orders sub-tasks into phases. Fails when the dependency map is cyclic.
pub fn create_execution_plan(
    sub_tasks: &[SubTask],
    dependencies: &DependencyMap,
) -> Result<ExecutionPlan, DecompositionError> {
    let ids: Vec<String> = sub_tasks.iter().map(|t| t.id.clone()).collect();
    let order = topological_order(&ids, dependencies);
    plan_from_order(sub_tasks, dependencies, &order)
}

/// Builds the plan from an already computed topological order
pub fn plan_from_order(
    sub_tasks: &[SubTask],
    dependencies: &DependencyMap,
    order: &TopoOrder,
) -> Result<ExecutionPlan, DecompositionError> {
    let sorted = match order {
        TopoOrder::Sorted(sorted) => sorted,
        TopoOrder::Cycle(path) => {
            error!(cycle = %path.join(" -> "), "cannot schedule cyclic dependencies");
            return Err(DecompositionError::DependencyCycle { path: path.clone() });
        }
    };

    let by_id: HashMap<&str, &SubTask> = sub_tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let ordered: Vec<&SubTask> = sorted
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
        .collect();

    let phases = pack_phases(&ordered, dependencies, &by_id);
    let critical_path = critical_path(sub_tasks, dependencies, &by_id);

    let total_duration = phases.iter().map(|p| p.estimated_duration).max().unwrap_or(0);
    let sequential_duration = phases.iter().map(|p| p.estimated_duration).sum();
    let parallelizable = phases.iter().any(|p| p.tasks.len() > 1);

    let mut resources = phases
        .iter()
        .fold(ResourceRequirements::default(), |acc, p| acc.combine(&p.resources));
    resources.estimated_duration = total_duration;
    // Phases run one after another, so only one phase's tasks overlap
    resources.concurrent_tasks = phases.iter().map(|p| p.tasks.len() as u32).max().unwrap_or(0);

    debug!(
        phases = phases.len(),
        total_duration, sequential_duration, "execution plan created"
    );

    Ok(ExecutionPlan {
        id: format!("plan-{}", uuid::Uuid::new_v4()),
        phases,
        total_duration,
        sequential_duration,
        parallelizable,
        critical_path,
        resources,
    })
}

fn known_deps<'a>(
    task: &SubTask,
    dependencies: &'a DependencyMap,
    by_id: &HashMap<&str, &SubTask>,
) -> Vec<&'a String> {
    dependencies
        .get(&task.id)
        .into_iter()
        .flatten()
        .filter(|dep| by_id.contains_key(dep.as_str()))
        .collect()
}

fn pack_phases(
    ordered: &[&SubTask],
    dependencies: &DependencyMap,
    by_id: &HashMap<&str, &SubTask>,
) -> Vec<ExecutionPhase> {
    let mut phases: Vec<Vec<&SubTask>> = Vec::new();
    let mut current: Vec<&SubTask> = Vec::new();
    let mut closed: HashSet<&str> = HashSet::new();

    for &task in ordered {
        let deps_closed = known_deps(task, dependencies, by_id)
            .iter()
            .all(|d| closed.contains(d.as_str()));
        let intensive_clash = task.task_type.is_resource_intensive()
            && current.iter().any(|t| t.task_type.is_resource_intensive());

        if !current.is_empty() && (!deps_closed || intensive_clash) {
            closed.extend(current.iter().map(|t| t.id.as_str()));
            phases.push(std::mem::take(&mut current));
        }
        current.push(task);
    }
    if !current.is_empty() {
        phases.push(current);
    }

    phases
        .into_iter()
        .enumerate()
        .map(|(index, tasks)| build_phase(index + 1, tasks, dependencies, by_id))
        .collect()
}

fn build_phase(
    number: usize,
    tasks: Vec<&SubTask>,
    dependencies: &DependencyMap,
    by_id: &HashMap<&str, &SubTask>,
) -> ExecutionPhase {
    let gating: BTreeSet<String> = tasks
        .iter()
        .flat_map(|t| known_deps(t, dependencies, by_id))
        .cloned()
        .collect();
    let estimated_duration = tasks.iter().map(|t| t.estimated_duration).max().unwrap_or(0);
    let resources = tasks
        .iter()
        .fold(ResourceRequirements::default(), |acc, t| acc.combine(&t.resources));

    ExecutionPhase {
        phase: number,
        parallel_executable: tasks.len() > 1,
        tasks: tasks.into_iter().cloned().collect(),
        dependencies: gating.into_iter().collect(),
        estimated_duration,
        resources,
    }
}

/// Longest duration-weighted chain from any root along dependents.
/// Ties keep the chain found first in task order.
fn critical_path(
    sub_tasks: &[SubTask],
    dependencies: &DependencyMap,
    by_id: &HashMap<&str, &SubTask>,
) -> Vec<String> {
    let position: HashMap<&str, usize> = sub_tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();
    let mut dependents = dependents_of(dependencies);
    for list in dependents.values_mut() {
        list.retain(|id| by_id.contains_key(id));
        list.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
    }

    let mut memo: HashMap<&str, (u64, Vec<&str>)> = HashMap::new();
    let mut best: (u64, Vec<&str>) = (0, Vec::new());

    for task in sub_tasks {
        let is_root = known_deps(task, dependencies, by_id).is_empty();
        if !is_root {
            continue;
        }
        let chain = longest_from(task.id.as_str(), by_id, &dependents, &mut memo);
        if best.1.is_empty() || chain.0 > best.0 {
            best = chain;
        }
    }

    best.1.into_iter().map(str::to_string).collect()
}

fn longest_from<'a>(
    id: &'a str,
    by_id: &HashMap<&str, &SubTask>,
    dependents: &HashMap<&'a str, Vec<&'a str>>,
    memo: &mut HashMap<&'a str, (u64, Vec<&'a str>)>,
) -> (u64, Vec<&'a str>) {
    if let Some(found) = memo.get(id) {
        return found.clone();
    }

    let own = by_id.get(id).map(|t| t.estimated_duration).unwrap_or(0);
    let mut tail: (u64, Vec<&str>) = (0, Vec::new());
    for &next in dependents.get(id).map(Vec::as_slice).unwrap_or(&[]) {
        let candidate = longest_from(next, by_id, dependents, memo);
        if tail.1.is_empty() || candidate.0 > tail.0 {
            tail = candidate;
        }
    }

    let mut path = Vec::with_capacity(tail.1.len() + 1);
    path.push(id);
    path.extend(tail.1);
    let result = (own + tail.0, path);
    memo.insert(id, result.clone());
    result
}

use super::{step, subject};
use crate::planning::task_generator::estimates::modification_secs;
use crate::planning::types::{QueryIntent, SubTask, SubTaskType};

const FIX_ACTIONS: [&str; 5] = ["fix", "bugfix", "debug", "repair", "resolve"];

fn is_fix(action: &str) -> bool {
    action
        .split_whitespace()
        .next()
        .is_some_and(|verb| FIX_ACTIONS.contains(&verb))
}

pub(crate) fn modification_tasks(intent: &QueryIntent) -> Vec<SubTask> {
    let subject = subject(intent);
    let (suffix, task_type, description) = if is_fix(&intent.action) {
        ("fix", SubTaskType::Bugfix, format!("Fix {}", subject))
    } else {
        ("modify", SubTaskType::Modification, format!("Modify {}", subject))
    };

    vec![
        step(intent, suffix, task_type, description, 0)
            .with_duration(modification_secs(intent.complexity, &intent.entities)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fix() {
        assert!(is_fix("fix"));
        assert!(is_fix("debug login crash"));
        assert!(!is_fix("update"));
        assert!(!is_fix("prefix"));
    }
}

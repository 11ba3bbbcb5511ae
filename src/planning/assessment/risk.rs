use crate::planning::types::{
    Complexity, RiskAssessment, RiskLevel, Severity, SubTask, SubTaskType, TaskConflict,
};

const MANY_SUB_TASKS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RiskFactor {
    Deployment,
    CodeModification,
    HighComplexity,
    SevereConflicts,
    ManySubTasks,
}

impl RiskFactor {
    fn description(self) -> &'static str {
        match self {
            RiskFactor::Deployment => "Deploys changes to a running environment",
            RiskFactor::CodeModification => "Modifies existing code",
            RiskFactor::HighComplexity => "High overall complexity",
            RiskFactor::SevereConflicts => "High-severity conflicts between sub-tasks",
            RiskFactor::ManySubTasks => "Large number of sub-tasks",
        }
    }

    fn mitigations(self) -> &'static [&'static str] {
        match self {
            RiskFactor::Deployment => &[
                "Deploy to a staging environment first",
                "Prepare a rollback plan",
            ],
            RiskFactor::CodeModification => &[
                "Commit or back up affected files before editing",
                "Run the existing test suite after the change",
            ],
            RiskFactor::HighComplexity => &[
                "Review the plan before execution",
                "Execute in small increments with checkpoints",
            ],
            RiskFactor::SevereConflicts => &["Resolve conflicts before execution"],
            RiskFactor::ManySubTasks => &["Monitor progress and re-plan between phases"],
        }
    }
}

pub fn assess_risk(
    sub_tasks: &[SubTask],
    complexity: Complexity,
    conflicts: &[TaskConflict],
) -> RiskAssessment {
    let has_deployment = sub_tasks
        .iter()
        .any(|t| t.task_type == SubTaskType::Deployment);
    let modifies = sub_tasks
        .iter()
        .any(|t| matches!(t.task_type, SubTaskType::Modification | SubTaskType::Bugfix));
    let high_complexity = complexity == Complexity::High;
    let severe_conflict = conflicts.iter().any(|c| c.severity == Severity::High);

    let mut level = RiskLevel::Low;
    let mut factors = Vec::new();

    if has_deployment {
        level = level.max(RiskLevel::Medium);
        factors.push(RiskFactor::Deployment);
    }
    if modifies {
        level = level.max(RiskLevel::Medium);
        factors.push(RiskFactor::CodeModification);
    }
    if high_complexity {
        level = level.escalate();
        factors.push(RiskFactor::HighComplexity);
    }
    if severe_conflict {
        level = level.max(RiskLevel::High);
        factors.push(RiskFactor::SevereConflicts);
    }
    if sub_tasks.len() > MANY_SUB_TASKS {
        level = level.max(RiskLevel::Medium);
        factors.push(RiskFactor::ManySubTasks);
    }
    if has_deployment && severe_conflict && high_complexity {
        level = RiskLevel::Critical;
    }

    let mut mitigations: Vec<String> = Vec::new();
    for factor in &factors {
        for m in factor.mitigations() {
            if !mitigations.iter().any(|existing| existing == m) {
                mitigations.push(m.to_string());
            }
        }
    }

    RiskAssessment {
        level,
        factors: factors.iter().map(|f| f.description().to_string()).collect(),
        mitigations,
        approval_required: level >= RiskLevel::High || has_deployment,
    }
}

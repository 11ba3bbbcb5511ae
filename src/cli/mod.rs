use clap::{ArgAction, Parser, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use crate::planning::{EngineStatistics, QueryDecomposition, TaskConflict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "qd",
    version,
    about = "Decompose a coding request into an ordered, risk-assessed execution plan"
)]
pub struct Cli {
    /// The request to decompose
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Workspace context as a JSON document
    #[arg(long, conflicts_with = "context_file")]
    pub context: Option<String>,

    /// Read the workspace context from a JSON file
    #[arg(long)]
    pub context_file: Option<PathBuf>,

    /// Skip the completion service and use pattern matching only
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_ai: bool,

    /// Print the decomposition as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Print engine statistics after the decomposition
    #[arg(long, action = ArgAction::SetTrue)]
    pub stats: bool,

    /// Give up after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// API key (set via env OPENAI_API_KEY recommended)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Log level (error,warn,info,debug,trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}

fn secs(value: u64) -> String {
    humantime::format_duration(Duration::from_secs(value)).to_string()
}

fn render_conflict(out: &mut String, conflict: &TaskConflict) {
    let _ = writeln!(
        out,
        "  - [{:?}/{:?}] {} (resolution: {})",
        conflict.conflict_type, conflict.severity, conflict.description, conflict.resolution
    );
}

/// Human-readable summary of a decomposition
pub fn render_text(d: &QueryDecomposition) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Decomposition {}", d.id);
    let _ = writeln!(out, "Query: {}", d.original_query);
    let _ = writeln!(
        out,
        "Complexity: {:?}  Confidence: {:.2}  Intents from: {:?}",
        d.complexity, d.metadata.confidence_score, d.metadata.intent_source
    );
    if d.metadata.truncated {
        let _ = writeln!(out, "Note: sub-task list was truncated");
    }

    let _ = writeln!(out, "\nIntents:");
    for intent in &d.intents {
        let _ = writeln!(
            out,
            "  {} {:?} '{}' (confidence {:.2}, priority {})",
            intent.id, intent.intent_type, intent.action, intent.confidence, intent.priority
        );
    }

    let _ = writeln!(out, "\nPlan ({} phases):", d.execution_plan.phases.len());
    for phase in &d.execution_plan.phases {
        let parallel = if phase.parallel_executable {
            ", parallel"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  Phase {} ({}{})",
            phase.phase,
            secs(phase.estimated_duration),
            parallel
        );
        for task in &phase.tasks {
            let _ = writeln!(
                out,
                "    - {} [{:?}] {} ({})",
                task.id,
                task.task_type,
                task.description,
                secs(task.estimated_duration)
            );
        }
    }

    let _ = writeln!(
        out,
        "\nEstimated duration: {} (sequential {})",
        secs(d.total_estimated_duration),
        secs(d.execution_plan.sequential_duration)
    );
    if !d.execution_plan.critical_path.is_empty() {
        let _ = writeln!(
            out,
            "Critical path: {}",
            d.execution_plan.critical_path.join(" -> ")
        );
    }

    let r = &d.resource_requirements;
    let _ = writeln!(
        out,
        "Resources: cpu {:?}, memory {:?}, network {:?}, disk {:?}, concurrency {}",
        r.cpu, r.memory, r.network, r.disk, r.concurrent_tasks
    );

    if !d.conflicts.is_empty() {
        let _ = writeln!(out, "\nConflicts:");
        for conflict in &d.conflicts {
            render_conflict(&mut out, conflict);
        }
    }

    let risk = &d.risk_assessment;
    let _ = writeln!(
        out,
        "\nRisk: {:?}{}",
        risk.level,
        if risk.approval_required {
            " (approval required)"
        } else {
            ""
        }
    );
    for factor in &risk.factors {
        let _ = writeln!(out, "  factor: {}", factor);
    }
    for mitigation in &risk.mitigations {
        let _ = writeln!(out, "  mitigation: {}", mitigation);
    }

    out
}

pub fn render_statistics(stats: &EngineStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Engine statistics:");
    let _ = writeln!(out, "  cache hit rate: {:.2}", stats.cache_hit_rate);
    let _ = writeln!(out, "  cached decompositions: {}", stats.cached_decompositions);
    let _ = writeln!(out, "  history size: {}", stats.history_size);
    let _ = writeln!(
        out,
        "  average sub-tasks: {:.1}",
        stats.average_sub_task_count
    );
    let _ = writeln!(
        out,
        "  average estimated duration: {}",
        secs(stats.average_estimated_duration.round() as u64)
    );
    let _ = writeln!(
        out,
        "  average complexity score: {:.2}",
        stats.average_complexity_score
    );
    let _ = writeln!(
        out,
        "  average decomposition time: {:.1} ms",
        stats.average_decomposition_time_ms
    );
    out
}

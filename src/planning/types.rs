use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Version stamped into every decomposition's metadata
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Task id → ids of the tasks it waits on
pub type DependencyMap = BTreeMap<String, BTreeSet<String>>;

/// Entity mentions extracted from a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntity {
    #[serde(default)]
    pub files: BTreeSet<String>,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    #[serde(default)]
    pub concepts: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub patterns: BTreeSet<String>,
}

impl QueryEntity {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.technologies.is_empty()
            && self.concepts.is_empty()
            && self.patterns.is_empty()
    }
}

/// Kind of work an intent asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Analysis,
    Implementation,
    Testing,
    Deployment,
    Modification,
    Optimization,
    General,
}

/// Ordinal complexity shared by intents, sub-tasks and decompositions
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    #[default]
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Multiplier applied by the time estimators
    pub fn multiplier(self) -> u64 {
        match self {
            Complexity::Low => 1,
            Complexity::Medium => 2,
            Complexity::High => 4,
        }
    }

    /// Numeric score used for statistics (low 1, medium 2, high 3)
    pub fn score(self) -> f64 {
        match self {
            Complexity::Low => 1.0,
            Complexity::Medium => 2.0,
            Complexity::High => 3.0,
        }
    }
}

/// A normalized action + entity interpretation of part of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub id: String,
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    pub action: String,
    pub confidence: f64,
    pub complexity: Complexity,
    /// Lower numbers are processed first
    pub priority: u32,
    pub entities: QueryEntity,
}

/// Kind of work a sub-task performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTaskType {
    Analysis,
    Implementation,
    Testing,
    Deployment,
    Modification,
    Optimization,
    Bugfix,
    Planning,
    General,
}

impl SubTaskType {
    /// Testing, deployment and optimization contend for the same machine
    /// resources and never share a phase.
    pub fn is_resource_intensive(self) -> bool {
        matches!(
            self,
            SubTaskType::Testing | SubTaskType::Deployment | SubTaskType::Optimization
        )
    }

    /// Types that write to the files they mention
    pub fn edits_files(self) -> bool {
        matches!(
            self,
            SubTaskType::Implementation | SubTaskType::Modification | SubTaskType::Bugfix
        )
    }

    /// Resource profile of a single task of this type
    pub fn base_resources(self) -> (ResourceLevel, ResourceLevel, ResourceLevel, ResourceLevel) {
        use ResourceLevel::*;
        // (cpu, memory, network, disk)
        match self {
            SubTaskType::Implementation => (Medium, Medium, Low, Medium),
            SubTaskType::Testing => (High, Medium, Low, Low),
            SubTaskType::Deployment => (Medium, Medium, High, Medium),
            SubTaskType::Analysis => (Low, Medium, Low, Low),
            SubTaskType::Optimization => (High, High, Low, Low),
            SubTaskType::Modification | SubTaskType::Bugfix => (Low, Low, Low, Medium),
            SubTaskType::Planning | SubTaskType::General => (Low, Low, Low, Low),
        }
    }
}

/// Ordinal demand level for one resource dimension
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// CPU/memory/network/disk demand plus a concurrency allowance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub cpu: ResourceLevel,
    pub memory: ResourceLevel,
    pub network: ResourceLevel,
    pub disk: ResourceLevel,
    /// seconds
    pub estimated_duration: u64,
    pub concurrent_tasks: u32,
}

impl Default for ResourceRequirements {
    fn default() -> Self {
        Self {
            cpu: ResourceLevel::Low,
            memory: ResourceLevel::Low,
            network: ResourceLevel::Low,
            disk: ResourceLevel::Low,
            estimated_duration: 0,
            concurrent_tasks: 0,
        }
    }
}

impl ResourceRequirements {
    /// Per-dimension max, durations max (concurrent), task counts summed
    pub fn combine(&self, other: &ResourceRequirements) -> ResourceRequirements {
        ResourceRequirements {
            cpu: self.cpu.max(other.cpu),
            memory: self.memory.max(other.memory),
            network: self.network.max(other.network),
            disk: self.disk.max(other.disk),
            estimated_duration: self.estimated_duration.max(other.estimated_duration),
            concurrent_tasks: self.concurrent_tasks.saturating_add(other.concurrent_tasks),
        }
    }

    /// Profile of one task of `task_type` running for `duration` seconds
    pub fn for_task(task_type: SubTaskType, complexity: Complexity, duration: u64) -> Self {
        let (cpu, mut memory, network, disk) = task_type.base_resources();
        if complexity == Complexity::High {
            memory = memory.max(ResourceLevel::Medium);
        }
        Self {
            cpu,
            memory,
            network,
            disk,
            estimated_duration: duration,
            concurrent_tasks: 1,
        }
    }
}

/// One unit of planned work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: SubTaskType,
    pub description: String,
    pub priority: u32,
    /// seconds
    pub estimated_duration: u64,
    pub complexity: Complexity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<QueryEntity>,
    /// Requirement tags such as `implementation_complete`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    pub intent_id: String,
    /// Caller-supplied workspace context, passed through untouched
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub workspace_context: serde_json::Value,
    pub resources: ResourceRequirements,
}

impl SubTask {
    /// Creates a sub-task whose resource profile follows its type and complexity
    pub fn new(
        id: String,
        task_type: SubTaskType,
        description: String,
        priority: u32,
        complexity: Complexity,
    ) -> Self {
        Self {
            id,
            task_type,
            description,
            priority,
            estimated_duration: 60,
            complexity,
            entities: None,
            requirements: Vec::new(),
            intent_id: String::new(),
            workspace_context: serde_json::Value::Null,
            resources: ResourceRequirements::for_task(task_type, complexity, 60),
        }
    }

    /// Sets the estimated time
    pub fn with_duration(mut self, duration_secs: u64) -> Self {
        self.estimated_duration = duration_secs;
        self.resources.estimated_duration = duration_secs;
        self
    }

    /// Adds requirement tags
    pub fn with_requirements(mut self, requirements: &[&str]) -> Self {
        self.requirements = requirements.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_entities(mut self, entities: &QueryEntity) -> Self {
        self.entities = Some(entities.clone());
        self
    }

    pub fn with_intent(mut self, intent_id: &str) -> Self {
        self.intent_id = intent_id.to_string();
        self
    }

    pub fn files(&self) -> impl Iterator<Item = &String> {
        self.entities.iter().flat_map(|e| e.files.iter())
    }
}

/// A batch of sub-tasks whose dependencies are satisfied by earlier phases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPhase {
    pub phase: usize,
    pub tasks: Vec<SubTask>,
    pub dependencies: Vec<String>,
    /// seconds
    pub estimated_duration: u64,
    pub parallel_executable: bool,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub id: String,
    pub phases: Vec<ExecutionPhase>,
    /// Longest single phase, in seconds
    pub total_duration: u64,
    /// Sum of phase durations, in seconds
    pub sequential_duration: u64,
    pub parallelizable: bool,
    pub critical_path: Vec<String>,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    FileModification,
    ResourceConflict,
    TimingConflict,
    DependencyCycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConflict {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub tasks: Vec<String>,
    pub severity: Severity,
    pub resolution: String,
    pub description: String,
}

/// Risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// One step up, saturating at critical
    pub fn escalate(self) -> RiskLevel {
        match self {
            RiskLevel::Low => RiskLevel::Medium,
            RiskLevel::Medium => RiskLevel::High,
            RiskLevel::High | RiskLevel::Critical => RiskLevel::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub mitigations: Vec<String>,
    pub approval_required: bool,
}

/// Where the intents of a decomposition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    Ai,
    PatternFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionMetadata {
    pub decomposition_time_ms: u64,
    pub confidence_score: f64,
    pub version: String,
    pub intent_source: IntentSource,
    pub truncated: bool,
}

/// Aggregate result of one `decompose_query` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDecomposition {
    pub id: String,
    pub original_query: String,
    pub intents: Vec<QueryIntent>,
    pub sub_tasks: Vec<SubTask>,
    pub dependencies: DependencyMap,
    pub execution_plan: ExecutionPlan,
    /// seconds
    pub total_estimated_duration: u64,
    pub resource_requirements: ResourceRequirements,
    pub complexity: Complexity,
    pub conflicts: Vec<TaskConflict>,
    pub risk_assessment: RiskAssessment,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub metadata: DecompositionMetadata,
}

/// Status reported back by whoever executes a sub-task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

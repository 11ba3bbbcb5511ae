use crate::config::DecompositionConfig;
use crate::llm::CompletionProvider;
use crate::planning::assessment::{
    assess_resources, assess_risk, compute_confidence, detect_conflicts, overall_complexity,
};
use crate::planning::cache::{DecompositionCache, cache_key};
use crate::planning::dependency_analyzer::analyze_dependencies;
use crate::planning::error::DecompositionError;
use crate::planning::graph::topological_order;
use crate::planning::history::{EngineStatistics, ExecutionHistory, HistoryRecord, PerformanceMetrics};
use crate::planning::intent_parser::{IntentParser, ParsedIntents};
use crate::planning::scheduler::plan_from_order;
use crate::planning::task_generator::TaskGenerator;
use crate::planning::types::{
    DecompositionMetadata, IntentSource, QueryDecomposition, SCHEMA_VERSION, TaskStatus,
};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const QUERY_PREVIEW_CHARS: usize = 100;

/// First 100 characters of a query, for logs
pub fn query_preview(query: &str) -> String {
    let mut chars = query.chars();
    let preview: String = chars.by_ref().take(QUERY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

struct EngineState {
    cache: DecompositionCache,
    history: ExecutionHistory,
    metrics: PerformanceMetrics,
}

impl EngineState {
    fn new(config: &DecompositionConfig) -> Self {
        Self {
            cache: DecompositionCache::new(
                Duration::from_secs(config.cache_ttl_secs),
                config.cache_capacity,
            ),
            history: ExecutionHistory::new(config.history_capacity),
            metrics: PerformanceMetrics::default(),
        }
    }
}

/// Turns a natural-language request into a validated, ordered and
/// resource-annotated execution plan.
///
/// The engine owns its cache, history and counters. Share it behind an
/// `Arc` to decompose concurrently; the state lock is never held while the
/// completion service is being called.
pub struct QueryDecompositionEngine {
    config: DecompositionConfig,
    provider: Option<Arc<dyn CompletionProvider>>,
    parser: OnceLock<IntentParser>,
    generator: TaskGenerator,
    state: Mutex<EngineState>,
}

impl QueryDecompositionEngine {
    pub fn new(config: DecompositionConfig, provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self {
            generator: TaskGenerator::new(config.max_sub_tasks),
            state: Mutex::new(EngineState::new(&config)),
            parser: OnceLock::new(),
            provider,
            config,
        }
    }

    /// Validates configuration and compiles the intent patterns. Calling it
    /// again is a no-op.
    pub fn initialize(&self) -> Result<(), DecompositionError> {
        if self.parser.get().is_some() {
            debug!("decomposition engine already initialized");
            return Ok(());
        }

        self.config
            .validate()
            .map_err(DecompositionError::InvalidConfig)?;
        let parser = IntentParser::new(&self.config, self.provider.clone()).map_err(|e| {
            DecompositionError::InvalidConfig(format!("intent pattern failed to compile: {e}"))
        })?;
        let uses_ai = parser.uses_ai();
        // A concurrent initialize may have won; both parsers are equivalent
        let _ = self.parser.set(parser);

        info!(
            ai_analysis = uses_ai,
            max_sub_tasks = self.config.max_sub_tasks,
            "decomposition engine initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.parser.get().is_some()
    }

    pub async fn decompose_query(
        &self,
        query: &str,
        context: &serde_json::Value,
    ) -> Result<QueryDecomposition, DecompositionError> {
        let parser = self
            .parser
            .get()
            .ok_or(DecompositionError::NotInitialized)?;
        let preview = query_preview(query);
        let key = cache_key(query, context);

        {
            let mut state = self.state.lock().await;
            state.metrics.total_requests += 1;
            if let Some(hit) = state.cache.get(&key) {
                state.metrics.cache_hits += 1;
                info!(query = %preview, id = %hit.id, "decomposition served from cache");
                return Ok(hit);
            }
            state.metrics.cache_misses += 1;
        }

        info!(query = %preview, "decomposing query");
        let started = Instant::now();
        let parsed = parser.parse_intents(query, context).await;

        match self.assemble(query, context, parsed, started) {
            Ok(decomposition) => {
                let mut state = self.state.lock().await;
                // A concurrent call for the same key may have finished first
                if let Some(existing) = state.cache.get(&key) {
                    debug!(
                        query = %preview,
                        id = %existing.id,
                        discarded = %decomposition.id,
                        "keeping decomposition cached by a concurrent call"
                    );
                    return Ok(existing);
                }
                let metrics = &mut state.metrics;
                metrics.completed_decompositions += 1;
                metrics.total_decomposition_time_ms += decomposition.metadata.decomposition_time_ms;
                match decomposition.metadata.intent_source {
                    IntentSource::Ai => metrics.ai_intent_parses += 1,
                    IntentSource::PatternFallback => metrics.fallback_intent_parses += 1,
                }
                if decomposition.metadata.truncated {
                    metrics.truncated_decompositions += 1;
                }
                state
                    .history
                    .push(HistoryRecord::from_decomposition(&decomposition, preview.clone()));
                let purged = state.cache.purge_expired(Instant::now());
                if purged > 0 {
                    debug!(purged, "expired decompositions purged");
                }
                state.cache.set(key, decomposition.clone());

                info!(
                    query = %preview,
                    id = %decomposition.id,
                    sub_tasks = decomposition.sub_tasks.len(),
                    phases = decomposition.execution_plan.phases.len(),
                    risk = ?decomposition.risk_assessment.level,
                    "decomposition complete"
                );
                Ok(decomposition)
            }
            Err(e) => {
                self.state.lock().await.metrics.failed_decompositions += 1;
                error!(query = %preview, error = %e, "decomposition failed");
                Err(e)
            }
        }
    }

    /// Like `decompose_query`, but gives up after `timeout`. Nothing is
    /// cached for a timed-out call.
    pub async fn decompose_query_with_timeout(
        &self,
        query: &str,
        context: &serde_json::Value,
        timeout: Duration,
    ) -> Result<QueryDecomposition, DecompositionError> {
        match tokio::time::timeout(timeout, self.decompose_query(query, context)).await {
            Ok(result) => result,
            Err(_) => {
                self.state.lock().await.metrics.failed_decompositions += 1;
                error!(query = %query_preview(query), ?timeout, "decomposition timed out");
                Err(DecompositionError::Timeout(timeout))
            }
        }
    }

    fn assemble(
        &self,
        query: &str,
        context: &serde_json::Value,
        parsed: ParsedIntents,
        started: Instant,
    ) -> Result<QueryDecomposition, DecompositionError> {
        let ParsedIntents { intents, source } = parsed;
        debug!(intents = intents.len(), ?source, "intents parsed");

        let generated = self.generator.generate_sub_tasks(&intents, context);
        let sub_tasks = generated.sub_tasks;
        let dependencies = analyze_dependencies(&sub_tasks);

        let ids: Vec<String> = sub_tasks.iter().map(|t| t.id.clone()).collect();
        let order = topological_order(&ids, &dependencies);
        let execution_plan = plan_from_order(&sub_tasks, &dependencies, &order)?;

        let complexity = overall_complexity(&sub_tasks);
        let resource_requirements =
            assess_resources(&sub_tasks, complexity, execution_plan.total_duration);
        let conflicts = detect_conflicts(&sub_tasks, &order, self.config.long_task_threshold_secs);
        if !conflicts.is_empty() {
            warn!(conflicts = conflicts.len(), "sub-task conflicts detected");
        }
        let risk_assessment = assess_risk(&sub_tasks, complexity, &conflicts);
        let confidence_score =
            compute_confidence(&intents, &sub_tasks, complexity, !conflicts.is_empty());

        Ok(QueryDecomposition {
            id: format!("decomp-{}", uuid::Uuid::new_v4()),
            original_query: query.to_string(),
            total_estimated_duration: execution_plan.total_duration,
            intents,
            sub_tasks,
            dependencies,
            execution_plan,
            resource_requirements,
            complexity,
            conflicts,
            risk_assessment,
            created_at: chrono::Utc::now(),
            metadata: DecompositionMetadata {
                decomposition_time_ms: started.elapsed().as_millis() as u64,
                confidence_score,
                version: SCHEMA_VERSION.to_string(),
                intent_source: source,
                truncated: generated.truncated,
            },
        })
    }

    pub async fn get_statistics(&self) -> EngineStatistics {
        let state = self.state.lock().await;
        EngineStatistics {
            cache_hit_rate: state.metrics.cache_hit_rate(),
            cached_decompositions: state.cache.len(),
            history_size: state.history.len(),
            average_sub_task_count: state.history.average_sub_task_count(),
            average_estimated_duration: state.history.average_estimated_duration(),
            average_complexity_score: state.history.average_complexity_score(),
            average_decomposition_time_ms: state.metrics.average_decomposition_time_ms(),
            performance: state.metrics.clone(),
        }
    }

    /// Drops cached decompositions, history and counters
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.cache.clear();
        state.history.clear();
        state.metrics = PerformanceMetrics::default();
        info!("decomposition engine state cleared");
    }

    /// A decomposition still live in the cache
    pub async fn get_decomposition(&self, id: &str) -> Option<QueryDecomposition> {
        self.state.lock().await.cache.find_by_id(id).cloned()
    }

    /// Records progress reported by whoever executes the plan
    pub async fn update_task_status(&self, decomposition_id: &str, task_id: &str, status: TaskStatus) {
        let state = self.state.lock().await;
        let known = state
            .cache
            .find_by_id(decomposition_id)
            .is_some_and(|d| d.sub_tasks.iter().any(|t| t.id == task_id));
        if known {
            info!(decomposition_id, task_id, ?status, "sub-task status updated");
        } else {
            warn!(
                decomposition_id,
                task_id,
                ?status,
                "status update for unknown or expired sub-task"
            );
        }
    }
}

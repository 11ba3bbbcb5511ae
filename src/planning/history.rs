use crate::planning::types::{Complexity, QueryDecomposition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Summary of one completed decomposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub decomposition_id: String,
    pub query_preview: String,
    pub sub_task_count: usize,
    /// seconds
    pub total_estimated_duration: u64,
    pub complexity: Complexity,
    pub confidence: f64,
    pub decomposition_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn from_decomposition(decomposition: &QueryDecomposition, query_preview: String) -> Self {
        Self {
            decomposition_id: decomposition.id.clone(),
            query_preview,
            sub_task_count: decomposition.sub_tasks.len(),
            total_estimated_duration: decomposition.total_estimated_duration,
            complexity: decomposition.complexity,
            confidence: decomposition.metadata.confidence_score,
            decomposition_time_ms: decomposition.metadata.decomposition_time_ms,
            created_at: decomposition.created_at,
        }
    }
}

/// Most recent decompositions, oldest evicted first
#[derive(Debug, Clone)]
pub struct ExecutionHistory {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl ExecutionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, record: HistoryRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn average(&self, value: impl Fn(&HistoryRecord) -> f64) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.iter().map(value).sum::<f64>() / self.records.len() as f64
    }

    pub fn average_sub_task_count(&self) -> f64 {
        self.average(|r| r.sub_task_count as f64)
    }

    pub fn average_estimated_duration(&self) -> f64 {
        self.average(|r| r.total_estimated_duration as f64)
    }

    pub fn average_complexity_score(&self) -> f64 {
        self.average(|r| r.complexity.score())
    }
}

/// Rolling engine counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_requests: u64,
    pub completed_decompositions: u64,
    pub failed_decompositions: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub ai_intent_parses: u64,
    pub fallback_intent_parses: u64,
    pub truncated_decompositions: u64,
    pub total_decomposition_time_ms: u64,
}

impl PerformanceMetrics {
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }

    pub fn average_decomposition_time_ms(&self) -> f64 {
        if self.completed_decompositions == 0 {
            0.0
        } else {
            self.total_decomposition_time_ms as f64 / self.completed_decompositions as f64
        }
    }
}

/// Snapshot returned by `QueryDecompositionEngine::get_statistics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatistics {
    pub cache_hit_rate: f64,
    pub cached_decompositions: usize,
    pub history_size: usize,
    pub average_sub_task_count: f64,
    /// seconds
    pub average_estimated_duration: f64,
    /// low 1, medium 2, high 3
    pub average_complexity_score: f64,
    pub average_decomposition_time_ms: f64,
    pub performance: PerformanceMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, sub_tasks: usize, duration: u64, complexity: Complexity) -> HistoryRecord {
        HistoryRecord {
            decomposition_id: id.to_string(),
            query_preview: id.to_string(),
            sub_task_count: sub_tasks,
            total_estimated_duration: duration,
            complexity,
            confidence: 0.9,
            decomposition_time_ms: 3,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = ExecutionHistory::new(2);
        history.push(record("a", 1, 60, Complexity::Low));
        history.push(record("b", 2, 120, Complexity::Medium));
        history.push(record("c", 3, 180, Complexity::High));

        let ids: Vec<_> = history.iter().map(|r| r.decomposition_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_history_averages() {
        let mut history = ExecutionHistory::new(10);
        assert_eq!(history.average_sub_task_count(), 0.0);

        history.push(record("a", 1, 60, Complexity::Low));
        history.push(record("b", 3, 180, Complexity::High));

        assert_eq!(history.average_sub_task_count(), 2.0);
        assert_eq!(history.average_estimated_duration(), 120.0);
        assert_eq!(history.average_complexity_score(), 2.0);
    }

    #[test]
    fn test_metrics_rates() {
        let metrics = PerformanceMetrics {
            cache_hits: 1,
            cache_misses: 3,
            completed_decompositions: 2,
            total_decomposition_time_ms: 10,
            ..PerformanceMetrics::default()
        };
        assert_eq!(metrics.cache_hit_rate(), 0.25);
        assert_eq!(metrics.average_decomposition_time_ms(), 5.0);
        assert_eq!(PerformanceMetrics::default().cache_hit_rate(), 0.0);
    }
}

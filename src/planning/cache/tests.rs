use super::*;
use crate::planning::types::{
    Complexity, DecompositionMetadata, DependencyMap, ExecutionPlan, IntentSource,
    ResourceRequirements, RiskAssessment, RiskLevel, SCHEMA_VERSION,
};

fn decomposition(id: &str) -> QueryDecomposition {
    QueryDecomposition {
        id: id.to_string(),
        original_query: format!("query {id}"),
        intents: Vec::new(),
        sub_tasks: Vec::new(),
        dependencies: DependencyMap::new(),
        execution_plan: ExecutionPlan {
            id: format!("plan-{id}"),
            phases: Vec::new(),
            total_duration: 0,
            sequential_duration: 0,
            parallelizable: false,
            critical_path: Vec::new(),
            resources: ResourceRequirements::default(),
        },
        total_estimated_duration: 0,
        resource_requirements: ResourceRequirements::default(),
        complexity: Complexity::Low,
        conflicts: Vec::new(),
        risk_assessment: RiskAssessment {
            level: RiskLevel::Low,
            factors: Vec::new(),
            mitigations: Vec::new(),
            approval_required: false,
        },
        created_at: chrono::Utc::now(),
        metadata: DecompositionMetadata {
            decomposition_time_ms: 1,
            confidence_score: 0.9,
            version: SCHEMA_VERSION.to_string(),
            intent_source: IntentSource::PatternFallback,
            truncated: false,
        },
    }
}

#[test]
fn test_cache_key_normalizes_query() {
    let context = serde_json::json!({"lang": "rust"});
    assert_eq!(
        cache_key("  Create   a Login\tEndpoint ", &context),
        cache_key("create a login endpoint", &context)
    );
    assert_eq!(
        cache_key("deploy", &serde_json::Value::Null),
        "deploy|null"
    );
    assert_ne!(
        cache_key("deploy", &serde_json::Value::Null),
        cache_key("deploy", &context)
    );
}

#[test]
fn test_hit_before_ttl_and_miss_after() {
    let mut cache = DecompositionCache::new(Duration::from_secs(300), 100);
    let start = Instant::now();
    cache.set_at("k".to_string(), decomposition("d1"), start);

    let hit = cache.get_at("k", start + Duration::from_secs(1));
    assert_eq!(hit.map(|d| d.id), Some("d1".to_string()));
    assert_eq!(cache.access_count("k"), Some(1));

    assert!(cache.get_at("k", start + Duration::from_secs(301)).is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_lru_eviction_at_capacity() {
    let mut cache = DecompositionCache::new(Duration::from_secs(300), 100);
    let start = Instant::now();
    for i in 0..100 {
        cache.set_at(format!("k{i}"), decomposition(&format!("d{i}")), start);
    }
    // Touch everything except k42, all at the same instant
    for i in (0..100).filter(|i| *i != 42) {
        assert!(cache.get_at(&format!("k{i}"), start).is_some());
    }

    cache.set_at("k100".to_string(), decomposition("d100"), start);

    assert_eq!(cache.len(), 100);
    assert!(cache.access_count("k42").is_none());
    assert!(cache.access_count("k100").is_some());
    assert!(cache.access_count("k0").is_some());
}

#[test]
fn test_overwriting_existing_key_does_not_evict() {
    let mut cache = DecompositionCache::new(Duration::from_secs(300), 2);
    let now = Instant::now();
    cache.set_at("a".to_string(), decomposition("d1"), now);
    cache.set_at("b".to_string(), decomposition("d2"), now);
    cache.set_at("a".to_string(), decomposition("d3"), now);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get_at("a", now).map(|d| d.id), Some("d3".to_string()));
}

#[test]
fn test_find_by_id_does_not_touch_entry() {
    let mut cache = DecompositionCache::new(Duration::from_secs(300), 10);
    let now = Instant::now();
    cache.set_at("k".to_string(), decomposition("d1"), now);

    assert!(cache.find_by_id_at("d1", now).is_some());
    assert!(cache.find_by_id_at("missing", now).is_none());
    assert!(cache.find_by_id_at("d1", now + Duration::from_secs(300)).is_none());
    assert_eq!(cache.access_count("k"), Some(0));
}

#[test]
fn test_purge_expired_and_clear() {
    let mut cache = DecompositionCache::new(Duration::from_secs(10), 10);
    let now = Instant::now();
    cache.set_at("old".to_string(), decomposition("d1"), now);
    cache.set_at("new".to_string(), decomposition("d2"), now + Duration::from_secs(8));

    assert_eq!(cache.purge_expired(now + Duration::from_secs(12)), 1);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

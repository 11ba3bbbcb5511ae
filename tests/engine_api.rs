use query_decomposer::config::DecompositionConfig;
use query_decomposer::planning::error::DecompositionError;
use query_decomposer::planning::scheduler::create_execution_plan;
use query_decomposer::planning::{QueryDecompositionEngine, TaskStatus};
use serde_json::Value;

#[tokio::test]
async fn test_engine_lifecycle_through_library() {
    let engine = QueryDecompositionEngine::new(DecompositionConfig::default(), None);
    assert!(!engine.is_initialized());
    assert_eq!(
        engine
            .decompose_query("deploy to production", &Value::Null)
            .await
            .unwrap_err(),
        DecompositionError::NotInitialized
    );

    engine.initialize().unwrap();
    assert!(engine.is_initialized());

    let d = engine
        .decompose_query("deploy to production", &Value::Null)
        .await
        .unwrap();
    let stored = engine.get_decomposition(&d.id).await.unwrap();
    assert_eq!(stored.id, d.id);

    let deploy = d.sub_tasks.last().unwrap();
    engine
        .update_task_status(&d.id, &deploy.id, TaskStatus::Completed)
        .await;
    engine
        .update_task_status(&d.id, "no-such-task", TaskStatus::Failed)
        .await;

    let replanned = create_execution_plan(&d.sub_tasks, &d.dependencies).unwrap();
    assert_eq!(replanned.phases.len(), d.execution_plan.phases.len());
    assert_eq!(replanned.critical_path, d.execution_plan.critical_path);

    engine.clear().await;
    assert!(engine.get_decomposition(&d.id).await.is_none());
    let stats = engine.get_statistics().await;
    assert_eq!(stats.history_size, 0);
    assert_eq!(stats.cached_decompositions, 0);
}

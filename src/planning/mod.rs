pub mod assessment;
pub mod cache;
pub mod dependency_analyzer;
pub mod engine;
pub mod error;
pub mod graph;
pub mod history;
pub mod intent_parser;
pub mod scheduler;
pub mod task_generator;
pub mod types;

pub use engine::QueryDecompositionEngine;
pub use history::EngineStatistics;
pub use types::*;


use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

use query_decomposer::cli::{Cli, render_statistics, render_text};
use query_decomposer::config::AppConfig;
use query_decomposer::llm::{CompletionProvider, OpenAIClient};
use query_decomposer::logging;
use query_decomposer::planning::QueryDecompositionEngine;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_format, cli.log_file.as_deref())?;

    let cfg = AppConfig::from_cli(&cli)?;
    info!(
        base_url = %cfg.base_url,
        model = %cfg.model,
        project_root = %cfg.project_root.display(),
        ai_analysis = cfg.decomposition.enable_ai_analysis,
        "app config"
    );

    let engine = QueryDecompositionEngine::new(cfg.decomposition.clone(), build_provider(&cfg)?);
    engine.initialize()?;

    let context = load_context(&cli).await?;
    let query = cli.query_text();
    let decomposition = match cli.timeout_ms {
        Some(ms) => {
            engine
                .decompose_query_with_timeout(&query, &context, Duration::from_millis(ms))
                .await?
        }
        None => engine.decompose_query(&query, &context).await?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&decomposition)?);
    } else {
        print!("{}", render_text(&decomposition));
    }

    if cli.stats {
        let stats = engine.get_statistics().await;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            print!("\n{}", render_statistics(&stats));
        }
    }

    Ok(())
}

/// The completion client, when AI analysis is enabled and a key is available
fn build_provider(cfg: &AppConfig) -> Result<Option<Arc<dyn CompletionProvider>>> {
    if !cfg.decomposition.enable_ai_analysis {
        info!("AI analysis disabled, using pattern matching only");
        return Ok(None);
    }
    let Some(key) = cfg.api_key.clone() else {
        info!("no API key configured, using pattern matching only");
        return Ok(None);
    };

    let client = OpenAIClient::new(cfg.base_url.clone(), key, cfg.model.clone())?
        .with_llm_config(cfg.llm.clone());
    Ok(Some(Arc::new(client)))
}

async fn load_context(cli: &Cli) -> Result<serde_json::Value> {
    if let Some(raw) = &cli.context {
        return serde_json::from_str(raw).context("parse --context as JSON");
    }
    if let Some(path) = &cli.context_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read context file: {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("parse context file: {}", path.display()));
    }
    Ok(serde_json::Value::Null)
}

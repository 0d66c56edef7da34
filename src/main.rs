use rust_vebra_api::api_client::{ApiClient, VebraClient};
use rust_vebra_api::branch::{fetch_branches, BranchRecord};
use rust_vebra_api::config::Config;
use rust_vebra_api::errors::ApiError;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Enriches one branch and counts its listings.
async fn process_branch(branch: &mut BranchRecord) -> Result<serde_json::Value, ApiError> {
    branch.enrich().await?;
    let properties = branch.fetch_properties().await?;

    Ok(json!({
        "branch": branch.attributes(),
        "property_count": properties.len(),
    }))
}

/// Main entry point for the feed runner.
///
/// Lists every branch on the configured feed, enriches each one, fetches its
/// listings and prints one JSON line per branch. A failing branch is logged
/// and skipped; configuration or client failures abort the run.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_vebra_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let client: Arc<dyn ApiClient> = Arc::new(VebraClient::new(&config)?);
    tracing::info!("✓ Vebra client initialized: {}", config.base_url());

    let mut branches = fetch_branches(Arc::clone(&client)).await?;
    let total = branches.len();
    let mut success_count = 0;

    for (idx, branch) in branches.iter_mut().enumerate() {
        let label = branch.id().unwrap_or_else(|| "<no id>".to_string());
        match process_branch(branch).await {
            Ok(summary) => {
                println!("{}", summary);
                success_count += 1;
            }
            Err(e) => {
                tracing::error!("[{}/{}] Branch {} failed: {}", idx + 1, total, label, e);
            }
        }
    }

    tracing::info!("Processed {}/{} branches", success_count, total);
    Ok(())
}

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use turnkit::kernel::config::AppConfig;
use turnkit::kernel::envelope::RequestEnvelope;
use turnkit::kernel::state::TurnOptions;
use turnkit::kernel::telemetry::{TelemetryPipeline, TrackingPolicy};
use turnkit::memory::store::{DurableStore, FileStore, MemoryStore};
use turnkit::outputs::{ContentDescriptor, ContentResolver, TokenMap};
use turnkit::services::analytics::build_provider;
use turnkit::TurnReactor;

/// What business logic produced for the turn.
#[derive(Debug, Default, Deserialize)]
struct Reply {
    #[serde(default)]
    content: ContentDescriptor,
    #[serde(default)]
    options: TurnOptions,
    #[serde(default)]
    tokens: BTreeMap<String, String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let mut args = std::env::args().skip(1);
    let (Some(request_path), Some(reply_path)) = (args.next(), args.next()) else {
        bail!("usage: turnkit <request.json> <reply.json>");
    };

    let config = AppConfig::from_env();
    tracing::debug!(config = %serde_json::to_string(&config)?, "configuration loaded");

    let store: Arc<dyn DurableStore> = match &config.store.path {
        Some(path) => Arc::new(FileStore::new(path.clone(), &config.store)),
        None => Arc::new(MemoryStore::new()),
    };
    let provider = build_provider(config.analytics.provider, config.analytics.token.clone());
    let policy = TrackingPolicy::new(config.analytics.untracked_request_types.iter().cloned());
    let telemetry = TelemetryPipeline::new(provider, policy);
    let resolver = ContentResolver::new(config.assets.clone(), config.document_dir.clone());
    let reactor = TurnReactor::new(resolver, telemetry, store);

    let envelope: RequestEnvelope = read_json(&PathBuf::from(request_path)).await?;
    let reply: Reply = read_json(&PathBuf::from(reply_path)).await?;

    let mut turn = reactor.begin(envelope);
    let response = reactor
        .respond(&mut turn, reply.content, &reply.options, &TokenMap::new(reply.tokens))
        .await?;

    println!("{}", serde_json::to_string_pretty(&response.envelope)?);

    // Give tracking a moment before the process exits; its outcome never matters here.
    if tokio::time::timeout(Duration::from_secs(2), response.tracking).await.is_err() {
        tracing::warn!("tracking still in flight at exit");
    }

    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

//! Process configuration.
//!
//! Read once by the composition root and handed down explicitly. Nothing in the
//! library reads the environment on its own.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::outputs::assets::AssetPaths;
use crate::services::analytics::ProviderKind;

pub const DEFAULT_PARTITION_KEY: &str = "id";
pub const DEFAULT_ATTRIBUTES_NAME: &str = "attributes";
pub const DEFAULT_DOCUMENT_DIR: &str = "apl";

/// Passive playback-lifecycle requests. These are never tracked unless
/// `UNTRACKED_REQUEST_TYPES` overrides the set.
pub const DEFAULT_UNTRACKED_REQUEST_TYPES: [&str; 5] = [
    "AudioPlayer.PlaybackStarted",
    "AudioPlayer.PlaybackFinished",
    "AudioPlayer.PlaybackStopped",
    "AudioPlayer.PlaybackNearlyFinished",
    "AudioPlayer.PlaybackFailed",
];

#[derive(Debug, Clone, Serialize)]
pub struct StoreConfig {
    /// Backing file for the durable scope. `None` keeps durable state in memory.
    pub path: Option<PathBuf>,
    pub partition_key: String,
    pub attributes_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            attributes_name: DEFAULT_ATTRIBUTES_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsConfig {
    pub provider: ProviderKind,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub untracked_request_types: BTreeSet<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Dashbot,
            token: None,
            untracked_request_types: DEFAULT_UNTRACKED_REQUEST_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AppConfig {
    pub assets: AssetPaths,
    pub store: StoreConfig,
    pub analytics: AnalyticsConfig,
    pub document_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = AnalyticsConfig::default();
        let untracked = match env("UNTRACKED_REQUEST_TYPES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.untracked_request_types,
        };

        Self {
            assets: AssetPaths {
                host: env("ASSET_HOST").unwrap_or_default(),
                bucket: env("ASSET_BUCKET").unwrap_or_default(),
                image_path: env("ASSET_IMAGE_PATH").unwrap_or_default(),
                audio_path: env("ASSET_AUDIO_PATH").unwrap_or_default(),
            },
            store: StoreConfig {
                path: env("DURABLE_STORE_PATH").map(PathBuf::from),
                partition_key: env("DURABLE_PARTITION_KEY")
                    .unwrap_or_else(|| DEFAULT_PARTITION_KEY.to_string()),
                attributes_name: env("DURABLE_ATTRIBUTES_NAME")
                    .unwrap_or_else(|| DEFAULT_ATTRIBUTES_NAME.to_string()),
            },
            analytics: AnalyticsConfig {
                provider: env("ANALYTICS_PROVIDER")
                    .map(|s| ProviderKind::parse(&s))
                    .unwrap_or(ProviderKind::Dashbot),
                token: env("ANALYTICS_TOKEN"),
                untracked_request_types: untracked,
            },
            document_dir: env("APL_DOCUMENT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_DIR)),
        }
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

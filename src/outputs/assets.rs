use serde::{Deserialize, Serialize};

/// Media kinds live under distinct path segments on the asset host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

/// Rewrites relative asset names to `<host><bucket><media path><name>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetPaths {
    pub host: String,
    pub bucket: String,
    pub image_path: String,
    pub audio_path: String,
}

impl AssetPaths {
    pub fn resolve(&self, kind: MediaKind, url: &str) -> String {
        if url.is_empty() || is_absolute(url) {
            return url.to_string();
        }
        let segment = match kind {
            MediaKind::Image => &self.image_path,
            MediaKind::Audio => &self.audio_path,
        };
        format!("{}{}{}{}", self.host, self.bucket, segment, url)
    }

    pub fn image(&self, url: &str) -> String {
        self.resolve(MediaKind::Image, url)
    }

    pub fn audio(&self, url: &str) -> String {
        self.resolve(MediaKind::Audio, url)
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

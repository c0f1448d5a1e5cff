use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::assets::AssetPaths;

/// Finalized speech for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speech {
    pub output: String,
    pub reprompt: String,
}

impl Speech {
    pub fn has_reprompt(&self) -> bool {
        !self.reprompt.is_empty()
    }
}

/// Neutralizes markup-unsafe characters. Escaped ampersands go first so they are
/// not rewritten twice.
pub fn sanitize(text: &str) -> String {
    text.replace("&amp;", "and")
        .replace("&quot;", "\"")
        .replace('&', "and")
}

lazy_static! {
    static ref AUDIO_MARKER: Regex = Regex::new(r"<audio>(.*?)</audio>").expect("audio marker regex");
}

/// Rewrites `<audio>name.mp3</audio>` markers into audio elements. Empty markers
/// are left as written.
pub fn rewrite_audio_markers(text: &str, assets: &AssetPaths) -> String {
    AUDIO_MARKER
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            if name.is_empty() {
                caps[0].to_string()
            } else {
                format!("<audio src=\"{}\" />", assets.audio(name))
            }
        })
        .into_owned()
}

pub fn finalize(text: &str, assets: &AssetPaths) -> String {
    rewrite_audio_markers(&sanitize(text), assets)
}

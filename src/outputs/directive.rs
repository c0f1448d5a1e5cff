use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::descriptor::{CommandContent, DocumentContent};
use crate::kernel::path::Mapping;

pub const RENDER_DOCUMENT_TYPE: &str = "Alexa.Presentation.APL.RenderDocument";
pub const RENDER_DOCUMENT_VERSION: &str = "1.0";
pub const EXECUTE_COMMANDS_TYPE: &str = "Alexa.Presentation.APL.ExecuteCommands";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderDocumentDirective {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub token: String,
    pub datasources: Mapping,
    pub document: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteCommandsDirective {
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
    pub commands: Vec<Value>,
}

fn generated_token() -> String {
    format!("token{}", uuid::Uuid::new_v4().simple())
}

/// Loads `<dir>/<name>.json` and wraps it in a render directive.
///
/// A missing or malformed document yields no directive; the turn still answers.
pub async fn build_render_document(dir: &Path, content: &DocumentContent) -> Option<RenderDocumentDirective> {
    if content.document.is_empty() {
        return None;
    }

    let file = dir.join(format!("{}.json", content.document));
    let raw = match tokio::fs::read_to_string(&file).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(document = %file.display(), error = %e, "APL document unreadable");
            return None;
        }
    };
    let document: Value = match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(document = %file.display(), error = %e, "APL document is not valid JSON");
            return None;
        }
    };

    Some(RenderDocumentDirective {
        kind: RENDER_DOCUMENT_TYPE.to_string(),
        version: RENDER_DOCUMENT_VERSION.to_string(),
        token: content.token.clone().unwrap_or_else(generated_token),
        datasources: content.datasources.clone(),
        document,
    })
}

pub fn build_execute_commands(content: &CommandContent) -> Option<ExecuteCommandsDirective> {
    let commands = content.commands.as_ref()?;

    Some(ExecuteCommandsDirective {
        kind: EXECUTE_COMMANDS_TYPE.to_string(),
        token: content.token.clone().unwrap_or_else(generated_token),
        commands: commands.clone(),
    })
}

use std::path::PathBuf;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::assets::AssetPaths;
use super::descriptor::ContentDescriptor;
use super::directive::{self, ExecuteCommandsDirective, RenderDocumentDirective};
use super::display::{self, DisplayTemplate};
use super::speech::{self, Speech};
use super::variant::resolve_variant;
use crate::kernel::path::Mapping;

pub const RENDER_TEMPLATE_TYPE: &str = "Display.RenderTemplate";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub content: String,
}

/// Everything the resolver could build from one descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResponse {
    pub speech: Speech,
    pub card: Option<Card>,
    pub display: Option<DisplayTemplate>,
    pub document: Option<RenderDocumentDirective>,
    pub commands: Option<ExecuteCommandsDirective>,
}

/// Turns content descriptors into response payloads.
///
/// Never fails: whatever cannot be resolved is left out and the caller can
/// inspect the result for completeness.
#[derive(Debug, Clone, Default)]
pub struct ContentResolver {
    assets: AssetPaths,
    document_dir: PathBuf,
}

impl ContentResolver {
    pub fn new(assets: AssetPaths, document_dir: PathBuf) -> Self {
        Self { assets, document_dir }
    }

    pub fn assets(&self) -> &AssetPaths {
        &self.assets
    }

    pub fn assemble_speech<R: Rng + ?Sized>(&self, descriptor: &ContentDescriptor, rng: &mut R) -> Speech {
        let Some(content) = &descriptor.speech else {
            return Speech::default();
        };

        let output = resolve_variant(content.output.as_ref(), rng).map_or("", String::as_str);
        let reprompt = resolve_variant(content.reprompt.as_ref(), rng).map_or("", String::as_str);

        Speech {
            output: speech::finalize(output, &self.assets),
            reprompt: speech::finalize(reprompt, &self.assets),
        }
    }

    pub fn assemble_display<R: Rng + ?Sized>(
        &self,
        descriptor: &ContentDescriptor,
        rng: &mut R,
    ) -> Option<DisplayTemplate> {
        descriptor
            .display
            .as_ref()
            .and_then(|d| display::assemble_display(d, &self.assets, rng))
    }

    pub fn assemble_card(&self, descriptor: &ContentDescriptor) -> Option<Card> {
        let card = descriptor.card.as_ref()?;
        if card.title.is_none() && card.output.is_none() {
            return None;
        }
        Some(Card {
            title: card.title.clone().unwrap_or_default(),
            content: card.output.clone().unwrap_or_default(),
        })
    }

    /// Synchronous part of resolution: speech, card and display.
    pub fn assemble<R: Rng + ?Sized>(&self, descriptor: &ContentDescriptor, rng: &mut R) -> ResolvedResponse {
        ResolvedResponse {
            speech: self.assemble_speech(descriptor, rng),
            card: self.assemble_card(descriptor),
            display: self.assemble_display(descriptor, rng),
            document: None,
            commands: descriptor.commands.as_ref().and_then(directive::build_execute_commands),
        }
    }

    /// Full resolution including document reads.
    pub async fn resolve(&self, descriptor: &ContentDescriptor) -> ResolvedResponse {
        let mut resolved = self.assemble(descriptor, &mut rand::thread_rng());
        if let Some(document) = &descriptor.document {
            resolved.document = directive::build_render_document(&self.document_dir, document).await;
        }
        resolved
    }
}

/// Renders the platform response envelope for a resolved turn.
pub fn render_envelope(resolved: &ResolvedResponse, session_attributes: &Mapping, end_session: bool) -> Value {
    let mut response = serde_json::Map::new();

    if !resolved.speech.output.is_empty() {
        response.insert("outputSpeech".into(), ssml(&resolved.speech.output));
    }
    if resolved.speech.has_reprompt() {
        response.insert("reprompt".into(), json!({ "outputSpeech": ssml(&resolved.speech.reprompt) }));
    }
    if let Some(card) = &resolved.card {
        response.insert(
            "card".into(),
            json!({ "type": "Simple", "title": card.title, "content": card.content }),
        );
    }

    let mut directives = Vec::new();
    if let Some(template) = &resolved.display {
        directives.push(json!({ "type": RENDER_TEMPLATE_TYPE, "template": template }));
    }
    if let Some(document) = &resolved.document {
        directives.push(json!(document));
    }
    if let Some(commands) = &resolved.commands {
        directives.push(json!(commands));
    }
    if !directives.is_empty() {
        response.insert("directives".into(), Value::Array(directives));
    }
    response.insert("shouldEndSession".into(), Value::Bool(end_session));

    json!({
        "version": "1.0",
        "sessionAttributes": session_attributes,
        "response": response,
    })
}

fn ssml(text: &str) -> Value {
    json!({ "type": "SSML", "ssml": format!("<speak>{text}</speak>") })
}

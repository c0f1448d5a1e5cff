use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::path::{self, Mapping};

pub const DEFAULT_LOCALE: &str = "en-US";

const ER_SUCCESS_MATCH: &str = "ER_SUCCESS_MATCH";
const APL_INTERFACE: &str = "Alexa.Presentation.APL";
const APL_MIN_VERSION: f64 = 1.0;
const DISPLAY_MARKUP_VERSION: &str = "1.0";
const DISPLAY_TEMPLATE_VERSION: &str = "1.0";

/// Request kinds the platform sends to a skill.
pub mod request_type {
    pub const LAUNCH: &str = "LaunchRequest";
    pub const INTENT: &str = "IntentRequest";
    pub const SESSION_ENDED: &str = "SessionEndedRequest";
    pub const AUDIO_PLAYER_PREFIX: &str = "AudioPlayer.";
    pub const PLAYBACK_CONTROLLER_PREFIX: &str = "PlaybackController.";
}

/// Read-only view over the inbound platform envelope.
///
/// Accessors never fail; missing fields come back as `None` or a documented default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestEnvelope(Value);

impl RequestEnvelope {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        path::get(path, &self.0)
    }

    pub fn request_id(&self) -> Option<&str> {
        path::get_str("request.requestId", &self.0)
    }

    pub fn request_type(&self) -> &str {
        path::get_str("request.type", &self.0).unwrap_or("")
    }

    pub fn locale(&self) -> &str {
        path::get_str("request.locale", &self.0).unwrap_or(DEFAULT_LOCALE)
    }

    pub fn intent_name(&self) -> &str {
        path::get_str("request.intent.name", &self.0).unwrap_or("")
    }

    pub fn slots(&self) -> Option<&Mapping> {
        self.get("request.intent.slots").and_then(Value::as_object)
    }

    pub fn slot_value(&self, slot: &str) -> Option<&str> {
        if slot.is_empty() {
            return None;
        }
        path::get_str(&format!("request.intent.slots.{slot}.value"), &self.0)
    }

    /// Entity-resolved names for `slot`, taken from the first authority matching
    /// both `authority` and `slot_type` with a successful match status.
    pub fn resolved_values(&self, slot: &str, slot_type: &str, authority: &str) -> Vec<String> {
        if slot.is_empty() || slot_type.is_empty() {
            return Vec::new();
        }

        let key = format!("request.intent.slots.{slot}.resolutions.resolutionsPerAuthority");
        let Some(Value::Array(authorities)) = self.get(&key) else {
            return Vec::new();
        };

        for entry in authorities {
            let name = path::get_str("authority", entry).unwrap_or("");
            let status = path::get_str("status.code", entry).unwrap_or("");

            if name.contains(authority) && name.contains(slot_type) && status == ER_SUCCESS_MATCH {
                return match path::get("values", entry) {
                    Some(Value::Array(values)) => values
                        .iter()
                        .map(|v| path::get_str("value.name", v).unwrap_or("").to_string())
                        .collect(),
                    _ => Vec::new(),
                };
            }
        }

        Vec::new()
    }

    pub fn has_session(&self) -> bool {
        matches!(self.get("session"), Some(Value::Object(_)))
    }

    pub fn session_id(&self) -> Option<&str> {
        path::get_str("session.sessionId", &self.0).filter(|s| !s.is_empty())
    }

    /// User id from the session block, falling back to the system context.
    pub fn user_id(&self) -> Option<&str> {
        path::get_str("session.user.userId", &self.0)
            .or_else(|| path::get_str("context.System.user.userId", &self.0))
            .filter(|s| !s.is_empty())
    }

    pub fn is_new_session(&self) -> bool {
        self.get("session.new").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn session_attributes(&self) -> Mapping {
        self.get("session.attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    pub fn api_endpoint(&self) -> Option<&str> {
        path::get_str("context.System.apiEndpoint", &self.0)
    }

    pub fn api_access_token(&self) -> Option<&str> {
        path::get_str("context.System.apiAccessToken", &self.0)
    }

    pub fn account_token(&self) -> Option<&str> {
        path::get_str("session.user.accessToken", &self.0)
    }

    pub fn has_audio_interface(&self) -> bool {
        self.get("context.System.device.supportedInterfaces.AudioPlayer").is_some()
    }

    pub fn has_display_interface(&self) -> bool {
        let Some(display) = self.get("context.System.device.supportedInterfaces.Display") else {
            return false;
        };
        path::get_str("markupVersion", display) == Some(DISPLAY_MARKUP_VERSION)
            && path::get_str("templateVersion", display) == Some(DISPLAY_TEMPLATE_VERSION)
    }

    pub fn has_apl_interface(&self) -> bool {
        let Some(Value::Object(interfaces)) = self.get("context.System.device.supportedInterfaces") else {
            return false;
        };
        let Some(apl) = interfaces.get(APL_INTERFACE) else {
            return false;
        };
        let version = match path::get("runtime.maxVersion", apl) {
            Some(Value::String(s)) => s.parse::<f64>().unwrap_or(0.0),
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        };
        version >= APL_MIN_VERSION
    }
}

impl From<Value> for RequestEnvelope {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kernel::envelope::{request_type, RequestEnvelope};
use crate::kernel::path::Mapping;

pub const SESSION_END: &str = "SessionEnd";
pub const SPONSOR_PLAYED_EVENT: &str = "SponsorPlayedEvent";

/// Payload of a custom event. Bare strings travel as `{"data": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    #[default]
    Empty,
    Text(String),
    Fields(Mapping),
}

impl EventPayload {
    pub fn into_fields(self) -> Mapping {
        match self {
            EventPayload::Empty => Mapping::new(),
            EventPayload::Text(data) => {
                let mut fields = Mapping::new();
                fields.insert("data".to_string(), Value::String(data));
                fields
            }
            EventPayload::Fields(fields) => fields,
        }
    }
}

impl From<&str> for EventPayload {
    fn from(data: &str) -> Self {
        EventPayload::Text(data.to_string())
    }
}

impl From<String> for EventPayload {
    fn from(data: String) -> Self {
        EventPayload::Text(data)
    }
}

impl From<Mapping> for EventPayload {
    fn from(fields: Mapping) -> Self {
        EventPayload::Fields(fields)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub name: String,
    pub correlation_id: String,
    pub session_id: String,
    pub user_id: String,
    pub payload: Mapping,
}

impl TrackingEvent {
    /// Builds an event for the request, or nothing when the name, session id or
    /// user id is missing.
    pub fn for_request(envelope: &RequestEnvelope, name: &str, payload: EventPayload) -> Option<Self> {
        if name.is_empty() {
            return None;
        }
        let session_id = envelope.session_id()?;
        let user_id = envelope.user_id()?;

        Some(Self {
            name: name.to_string(),
            correlation_id: correlation_id(session_id, user_id),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            payload: payload.into_fields(),
        })
    }

    /// `{sessionId, ...payload}`; payload keys win.
    pub fn extra_info(&self) -> Mapping {
        let mut info = Mapping::new();
        info.insert("sessionId".to_string(), Value::String(self.session_id.clone()));
        for (key, value) in &self.payload {
            info.insert(key.clone(), value.clone());
        }
        info
    }
}

pub fn correlation_id(session_id: &str, user_id: &str) -> String {
    format!("{session_id}/{user_id}")
}

/// Correlation id of the turn, if both identifiers resolve.
pub fn correlate(envelope: &RequestEnvelope) -> Option<String> {
    Some(correlation_id(envelope.session_id()?, envelope.user_id()?))
}

/// What a response is reported as, derived from the request kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub intent_name: String,
    pub state: String,
    pub locale: String,
    pub slots: Option<Mapping>,
}

impl TurnSummary {
    pub fn from_envelope(envelope: &RequestEnvelope, state: &str) -> Self {
        let kind = envelope.request_type();
        let mut summary = Self {
            intent_name: String::new(),
            state: state.to_string(),
            locale: envelope.locale().to_string(),
            slots: None,
        };

        if kind == request_type::LAUNCH
            || kind.starts_with(request_type::AUDIO_PLAYER_PREFIX)
            || kind.starts_with(request_type::PLAYBACK_CONTROLLER_PREFIX)
        {
            summary.intent_name = kind.to_string();
        } else if kind == request_type::SESSION_ENDED {
            summary.intent_name = SESSION_END.to_string();
        } else if kind == request_type::INTENT && envelope.get("request.intent").is_some() {
            summary.intent_name = envelope.intent_name().to_string();
            summary.slots = Some(envelope.slots().cloned().unwrap_or_default());
        }

        summary
    }
}

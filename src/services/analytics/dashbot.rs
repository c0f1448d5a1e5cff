use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{AnalyticsError, AnalyticsProvider, ProviderKind};
use crate::kernel::envelope::RequestEnvelope;
use crate::kernel::path;
use crate::kernel::telemetry::event::TrackingEvent;

pub const DASHBOT_HOST: &str = "https://tracker.dashbot.io";
pub const TRACK_PATH: &str = "/track";
pub const PLATFORM: &str = "alexa";
pub const API_VERSION: &str = "10.1.1-rest";
pub const CUSTOM_EVENT_TYPE: &str = "customEvent";

const TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackType {
    Incoming,
    Outgoing,
    Event,
}

impl TrackType {
    fn as_str(self) -> &'static str {
        match self {
            TrackType::Incoming => "incoming",
            TrackType::Outgoing => "outgoing",
            TrackType::Event => "event",
        }
    }
}

#[derive(Clone)]
pub struct DashbotProvider {
    client: Client,
    host: String,
    api_key: Option<String>,
}

impl DashbotProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_host(DASHBOT_HOST, api_key)
    }

    pub fn with_host(host: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            host: host.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn track_url(&self) -> String {
        format!("{}{}", self.host, TRACK_PATH)
    }

    async fn post(&self, kind: TrackType, body: &Value) -> Result<Value, AnalyticsError> {
        let Some(api_key) = &self.api_key else {
            return Err(AnalyticsError::NotAuthorized);
        };
        if self.host.is_empty() || body.is_null() {
            return Err(AnalyticsError::NotAuthorized);
        }

        let response = self
            .client
            .post(self.track_url())
            .query(&[
                ("apiKey", api_key.as_str()),
                ("platform", PLATFORM),
                ("type", kind.as_str()),
                ("v", API_VERSION),
            ])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(track = kind.as_str(), error = %e, "dashbot transport error");
                AnalyticsError::from(e)
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let parsed: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if status != reqwest::StatusCode::OK {
            let errors = path::get("errors", &parsed).cloned().unwrap_or(Value::Null);
            warn!(track = kind.as_str(), status = status.as_u16(), errors = %errors, "dashbot api error");
            return Err(AnalyticsError::Api { status: status.as_u16(), errors });
        }

        Ok(parsed)
    }
}

/// Request body for a custom event.
pub fn event_body(event: &TrackingEvent) -> Value {
    json!({
        "name": event.name,
        "type": CUSTOM_EVENT_TYPE,
        "userId": event.user_id,
        "extraInfo": event.extra_info(),
    })
}

fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[async_trait]
impl AnalyticsProvider for DashbotProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Dashbot
    }

    async fn log_incoming(&self, envelope: &RequestEnvelope) -> Result<(), AnalyticsError> {
        let body = json!({ "event": envelope.raw(), "dashbot_timestamp": timestamp_ms() });
        self.post(TrackType::Incoming, &body).await.map(|_| ())
    }

    async fn log_outgoing(&self, envelope: &RequestEnvelope, response: &Value) -> Result<(), AnalyticsError> {
        let body = json!({
            "event": envelope.raw(),
            "response": response,
            "dashbot_timestamp": timestamp_ms(),
        });
        self.post(TrackType::Outgoing, &body).await.map(|_| ())
    }

    async fn send_event(&self, event: &TrackingEvent) -> Result<Value, AnalyticsError> {
        debug!(event = %event.name, correlation = %event.correlation_id, "dashbot custom event");
        self.post(TrackType::Event, &event_body(event)).await
    }
}

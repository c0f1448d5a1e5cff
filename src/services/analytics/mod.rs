//! Analytics providers.
//!
//! The telemetry pipeline talks to a provider through [`AnalyticsProvider`];
//! which one is picked once from configuration by the composition root.

pub mod dashbot;
pub mod error;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use dashbot::DashbotProvider;
pub use error::{AnalyticsError, FailureKind};

use crate::kernel::envelope::RequestEnvelope;
use crate::kernel::telemetry::event::TrackingEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Dashbot,
    Disabled,
}

impl ProviderKind {
    /// Unknown names fall back to the default provider.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "disabled" | "off" => ProviderKind::Disabled,
            _ => ProviderKind::Dashbot,
        }
    }
}

#[async_trait]
pub trait AnalyticsProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn log_incoming(&self, envelope: &RequestEnvelope) -> Result<(), AnalyticsError>;

    async fn log_outgoing(&self, envelope: &RequestEnvelope, response: &Value) -> Result<(), AnalyticsError>;

    /// Posts a custom event, returning the provider's response body.
    async fn send_event(&self, event: &TrackingEvent) -> Result<Value, AnalyticsError>;
}

/// Provider for deployments with analytics switched off.
#[derive(Debug, Default)]
pub struct DisabledProvider;

#[async_trait]
impl AnalyticsProvider for DisabledProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Disabled
    }

    async fn log_incoming(&self, _envelope: &RequestEnvelope) -> Result<(), AnalyticsError> {
        Err(AnalyticsError::NotSent)
    }

    async fn log_outgoing(&self, _envelope: &RequestEnvelope, _response: &Value) -> Result<(), AnalyticsError> {
        Err(AnalyticsError::NotSent)
    }

    async fn send_event(&self, _event: &TrackingEvent) -> Result<Value, AnalyticsError> {
        Err(AnalyticsError::NotSent)
    }
}

pub fn build_provider(kind: ProviderKind, token: Option<String>) -> Arc<dyn AnalyticsProvider> {
    match kind {
        ProviderKind::Dashbot => Arc::new(DashbotProvider::new(token)),
        ProviderKind::Disabled => Arc::new(DisabledProvider),
    }
}

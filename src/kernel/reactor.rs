use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::envelope::RequestEnvelope;
use super::scheduler::{HookOutcome, ResponseContext, ResponseQueue};
use super::state::{TurnOptions, TurnState};
use super::telemetry::pipeline::{TelemetryPipeline, TrackingHandle};
use crate::memory::store::{DurableStore, StoreError};
use crate::outputs::descriptor::ContentDescriptor;
use crate::outputs::realizer::{render_envelope, ContentResolver, ResolvedResponse};
use crate::outputs::tokens::{ReplaceTokens, TokenMap};

/// Session attribute holding the handler mode.
pub const STATE_ATTRIBUTE: &str = "STATE";

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("durable state could not be saved: {0}")]
    Store(#[from] StoreError),
}

/// One request in flight.
pub struct Turn {
    pub envelope: RequestEnvelope,
    pub state: TurnState,
    pub queue: ResponseQueue,
    incoming: Option<TrackingHandle>,
}

impl Turn {
    pub fn handler_state(&self) -> String {
        self.state
            .get(super::state::ScopeKind::Session, STATE_ATTRIBUTE)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    }
}

#[derive(Debug)]
pub struct TurnResponse {
    /// Platform response envelope, ready to serialize.
    pub envelope: Value,
    pub resolved: ResolvedResponse,
    /// Background join of incoming and outgoing tracking. Never awaited on the
    /// response path.
    pub tracking: JoinHandle<()>,
}

/// Drives a turn from inbound envelope to rendered response.
#[derive(Clone)]
pub struct TurnReactor {
    resolver: ContentResolver,
    telemetry: TelemetryPipeline,
    store: Arc<dyn DurableStore>,
}

impl TurnReactor {
    pub fn new(resolver: ContentResolver, telemetry: TelemetryPipeline, store: Arc<dyn DurableStore>) -> Self {
        Self {
            resolver,
            telemetry,
            store,
        }
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    pub fn telemetry(&self) -> &TelemetryPipeline {
        &self.telemetry
    }

    /// Opens a turn: seeds the session scope and logs the request.
    pub fn begin(&self, envelope: RequestEnvelope) -> Turn {
        log_intent_data(&envelope);

        let durable_key = envelope.user_id().unwrap_or_default().to_string();
        let state = TurnState::new(self.store.clone(), durable_key, envelope.session_attributes());
        let incoming = self.telemetry.log_incoming(&envelope);

        Turn {
            envelope,
            state,
            queue: ResponseQueue::new(),
            incoming: Some(incoming),
        }
    }

    /// Resolves content, saves durable state once, and renders the response.
    ///
    /// Only a durable-store failure fails the turn.
    pub async fn respond(
        &self,
        turn: &mut Turn,
        mut descriptor: ContentDescriptor,
        options: &TurnOptions,
        tokens: &TokenMap,
    ) -> Result<TurnResponse, TurnError> {
        descriptor.replace_tokens(tokens);
        let resolved = self.resolver.resolve(&descriptor).await;

        turn.state.set_repeat_speech(&resolved.speech, &descriptor, options);
        self.telemetry.queue_tracking(&mut turn.queue, options);

        turn.state.flush_durable().await?;

        let envelope = render_envelope(
            &resolved,
            turn.state.scope(super::state::ScopeKind::Session),
            options.end_session,
        );
        debug!(response = %envelope, "[response]");

        let handler_state = turn.handler_state();
        let ctx = ResponseContext {
            envelope: &turn.envelope,
            response: &envelope,
            handler_state: &handler_state,
        };
        let mut outgoing = None;
        for (key, outcome) in turn.queue.run_before_response(&ctx) {
            match outcome {
                HookOutcome::Tracking(handle) => outgoing = Some(handle),
                HookOutcome::NotTracked => debug!(hook = %key, "response not tracked"),
                HookOutcome::Completed => {}
            }
        }

        let incoming = match turn.incoming.take() {
            Some(handle) => handle,
            None => self.telemetry.log_incoming(&turn.envelope),
        };
        let tracking = TelemetryPipeline::join_turn(incoming, outgoing);

        Ok(TurnResponse {
            envelope,
            resolved,
            tracking,
        })
    }
}

fn log_intent_data(envelope: &RequestEnvelope) {
    info!(request_id = envelope.request_id().unwrap_or(""), ">>>>>> request");
    let slots = envelope.slots().map_or(Value::Null, |s| Value::Object(s.clone()));
    let attributes = Value::Object(envelope.session_attributes());
    debug!(
        user_id = envelope.user_id().unwrap_or(""),
        intent = envelope.intent_name(),
        slots = %slots,
        attributes = %attributes,
        "request detail"
    );
}

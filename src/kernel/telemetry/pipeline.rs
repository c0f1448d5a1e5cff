use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::event::{correlate, EventPayload, TrackingEvent, TurnSummary, SPONSOR_PLAYED_EVENT};
use super::policy::TrackingPolicy;
use super::recorder::{DispatchKind, DispatchOutcome, DispatchRecord, TelemetrySink};
use crate::kernel::envelope::RequestEnvelope;
use crate::kernel::scheduler::{before_response_hook, HookOutcome, ResponseQueue};
use crate::kernel::state::{OutgoingIntent, TurnOptions};
use crate::services::analytics::{AnalyticsError, AnalyticsProvider, FailureKind};

/// Key the response-tracking hook is queued under.
pub const QUEUE_KEY: &str = "analytics";

/// A dispatch running in the background. Dropping the handle detaches it.
#[derive(Debug)]
pub struct TrackingHandle {
    kind: DispatchKind,
    task: Option<JoinHandle<DispatchOutcome>>,
}

impl TrackingHandle {
    fn skipped(kind: DispatchKind) -> Self {
        Self { kind, task: None }
    }

    pub fn kind(&self) -> DispatchKind {
        self.kind
    }

    pub fn is_dispatched(&self) -> bool {
        self.task.is_some()
    }

    pub async fn settle(self) -> DispatchOutcome {
        match self.task {
            None => DispatchOutcome::Skipped,
            Some(task) => task.await.unwrap_or(DispatchOutcome::Failed(FailureKind::Transport)),
        }
    }
}

/// Gates, correlates and dispatches analytics for a turn.
///
/// Every call is best-effort. Failures are reported to the sink and never
/// reach the caller's response path.
#[derive(Clone)]
pub struct TelemetryPipeline {
    provider: Arc<dyn AnalyticsProvider>,
    policy: Arc<TrackingPolicy>,
    sink: TelemetrySink,
}

impl TelemetryPipeline {
    pub fn new(provider: Arc<dyn AnalyticsProvider>, policy: TrackingPolicy) -> Self {
        Self {
            provider,
            policy: Arc::new(policy),
            sink: TelemetrySink::new(),
        }
    }

    pub fn sink(&self) -> &TelemetrySink {
        &self.sink
    }

    pub fn trackable(&self, envelope: &RequestEnvelope) -> bool {
        self.policy.trackable(envelope)
    }

    fn skip(&self, kind: DispatchKind, envelope: &RequestEnvelope) -> TrackingHandle {
        self.sink.consume(DispatchRecord {
            kind,
            correlation_id: correlate(envelope),
            outcome: DispatchOutcome::Skipped,
        });
        TrackingHandle::skipped(kind)
    }

    /// Logs the inbound request without waiting for the provider.
    pub fn log_incoming(&self, envelope: &RequestEnvelope) -> TrackingHandle {
        if !self.trackable(envelope) {
            return self.skip(DispatchKind::Incoming, envelope);
        }

        let provider = self.provider.clone();
        let sink = self.sink.clone();
        let envelope = envelope.clone();

        let task = tokio::spawn(async move {
            let result = provider.log_incoming(&envelope).await;
            let outcome = DispatchOutcome::from_result(&result);
            sink.consume(DispatchRecord {
                kind: DispatchKind::Incoming,
                correlation_id: correlate(&envelope),
                outcome,
            });
            outcome
        });

        TrackingHandle {
            kind: DispatchKind::Incoming,
            task: Some(task),
        }
    }

    /// Logs the outgoing response, with the optional outgoing intent attached.
    pub fn log_outgoing(
        &self,
        envelope: &RequestEnvelope,
        response: &Value,
        outgoing_intent: Option<&OutgoingIntent>,
    ) -> TrackingHandle {
        if !self.trackable(envelope) {
            return self.skip(DispatchKind::Outgoing, envelope);
        }

        let mut logged = response.as_object().cloned().unwrap_or_else(Map::new);
        if let Some(intent) = outgoing_intent.filter(|i| !i.name.is_empty()) {
            logged.insert(
                "intent".to_string(),
                serde_json::json!({ "name": intent.name, "inputs": intent.inputs }),
            );
        }

        let provider = self.provider.clone();
        let sink = self.sink.clone();
        let envelope = envelope.clone();
        let logged = Value::Object(logged);

        let task = tokio::spawn(async move {
            let result = provider.log_outgoing(&envelope, &logged).await;
            let outcome = DispatchOutcome::from_result(&result);
            sink.consume(DispatchRecord {
                kind: DispatchKind::Outgoing,
                correlation_id: correlate(&envelope),
                outcome,
            });
            outcome
        });

        TrackingHandle {
            kind: DispatchKind::Outgoing,
            task: Some(task),
        }
    }

    /// Sends one custom event and waits for the provider's answer.
    pub async fn send_event(
        &self,
        envelope: &RequestEnvelope,
        name: &str,
        payload: impl Into<EventPayload>,
    ) -> Result<Value, AnalyticsError> {
        let result = self.dispatch_event(envelope, name, payload.into()).await;
        self.sink.consume(DispatchRecord {
            kind: DispatchKind::Custom,
            correlation_id: correlate(envelope),
            outcome: DispatchOutcome::from_result(&result),
        });
        result
    }

    async fn dispatch_event(
        &self,
        envelope: &RequestEnvelope,
        name: &str,
        payload: EventPayload,
    ) -> Result<Value, AnalyticsError> {
        if name.is_empty() || !self.trackable(envelope) {
            return Err(AnalyticsError::NotSent);
        }
        let event = TrackingEvent::for_request(envelope, name, payload).ok_or(AnalyticsError::NotAuthorized)?;
        let payload = Value::Object(event.payload.clone());
        debug!(event = %event.name, payload = %payload, "sending custom event");
        self.provider.send_event(&event).await
    }

    pub async fn send_sponsor_event(
        &self,
        envelope: &RequestEnvelope,
        campaign_id: &str,
        label: &str,
    ) -> Result<Value, AnalyticsError> {
        let mut fields = Map::new();
        fields.insert("campaignId".to_string(), Value::String(campaign_id.to_string()));
        fields.insert("label".to_string(), Value::String(label.to_string()));
        self.send_event(envelope, SPONSOR_PLAYED_EVENT, fields).await
    }

    /// Queues response tracking for the turn, honouring a `track: false` opt-out.
    pub fn queue_tracking(&self, queue: &mut ResponseQueue, options: &TurnOptions) {
        let pipeline = self.clone();
        let opted_out = options.track == Some(false);
        let outgoing_intent = options.outgoing_intent.clone();

        queue.add_before_response(
            QUEUE_KEY,
            before_response_hook(move |ctx| {
                if opted_out {
                    return HookOutcome::NotTracked;
                }
                let summary = TurnSummary::from_envelope(ctx.envelope, ctx.handler_state);
                debug!(
                    intent = %summary.intent_name,
                    state = %summary.state,
                    locale = %summary.locale,
                    "response tracking"
                );
                HookOutcome::Tracking(pipeline.log_outgoing(ctx.envelope, ctx.response, outgoing_intent.as_ref()))
            }),
        );
    }

    /// Waits for both sides of a turn in the background and logs the pair.
    pub fn join_turn(incoming: TrackingHandle, outgoing: Option<TrackingHandle>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let (incoming, outgoing) = match outgoing {
                Some(outgoing) => tokio::join!(incoming.settle(), outgoing.settle()),
                None => (incoming.settle().await, DispatchOutcome::Skipped),
            };
            info!(incoming = ?incoming, outgoing = ?outgoing, "turn tracking settled");
        })
    }
}

use serde_json::Value;

use super::envelope::RequestEnvelope;
use super::telemetry::pipeline::TrackingHandle;

/// What a before-response hook sees: the request and the rendered response.
pub struct ResponseContext<'a> {
    pub envelope: &'a RequestEnvelope,
    pub response: &'a Value,
    pub handler_state: &'a str,
}

#[derive(Debug)]
pub enum HookOutcome {
    Completed,
    NotTracked,
    Tracking(TrackingHandle),
}

pub type BeforeResponseHook = Box<dyn FnOnce(&ResponseContext<'_>) -> HookOutcome + Send>;

pub fn before_response_hook<F>(hook: F) -> BeforeResponseHook
where
    F: FnOnce(&ResponseContext<'_>) -> HookOutcome + Send + 'static,
{
    Box::new(hook)
}

/// Hooks run once, in registration order, right before the response leaves.
///
/// Registering under a key that is already queued replaces the earlier hook in
/// place, so a turn never tracks its response twice.
#[derive(Default)]
pub struct ResponseQueue {
    before_response: Vec<(String, BeforeResponseHook)>,
}

impl ResponseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_before_response(&mut self, key: &str, hook: BeforeResponseHook) {
        match self.before_response.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = hook,
            None => self.before_response.push((key.to_string(), hook)),
        }
    }

    pub fn len(&self) -> usize {
        self.before_response.len()
    }

    pub fn is_empty(&self) -> bool {
        self.before_response.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.before_response.iter().any(|(k, _)| k == key)
    }

    pub fn run_before_response(&mut self, ctx: &ResponseContext<'_>) -> Vec<(String, HookOutcome)> {
        self.before_response
            .drain(..)
            .map(|(key, hook)| {
                let outcome = hook(ctx);
                (key, outcome)
            })
            .collect()
    }
}

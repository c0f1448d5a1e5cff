//! Attribute scopes for one turn.
//!
//! `turn` dies with the turn, `session` rides along in the response envelope,
//! `durable` is flushed to the backing store at most once per turn. The flush
//! guard lives in the turn scope and is set before any await, so a second flush
//! issued while the first is still in flight sees it and backs off.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::path::{self, merge_shallow, Mapping};
use crate::memory::store::{DurableStore, StoreError};
use crate::outputs::descriptor::{ContentDescriptor, RepeatSpeech};
use crate::outputs::speech::Speech;

/// Turn-scope flag guarding the durable flush.
pub const PERSISTENT_SAVED: &str = "persistentSaved";
pub const SPEECH_OUTPUT: &str = "speechOutput";
pub const SPEECH_REPROMPT: &str = "speechReprompt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKind {
    Turn,
    Session,
    Durable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Saved,
    AlreadySaved,
}

/// Per-call knobs business logic passes alongside a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOptions {
    /// `Some(false)` opts the turn out of response tracking.
    pub track: Option<bool>,
    /// `Some(false)` clears captured replay content instead of storing it.
    pub save_repeat: Option<bool>,
    pub repeat_speech: Option<RepeatSpeech>,
    pub outgoing_intent: Option<OutgoingIntent>,
    #[serde(default)]
    pub end_session: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingIntent {
    pub name: String,
    #[serde(default)]
    pub inputs: Mapping,
}

pub struct TurnState {
    turn: Mapping,
    session: Mapping,
    durable: Mapping,
    durable_loaded: bool,
    store: Arc<dyn DurableStore>,
    durable_key: String,
}

impl TurnState {
    pub fn new(store: Arc<dyn DurableStore>, durable_key: impl Into<String>, session: Mapping) -> Self {
        Self {
            turn: Mapping::new(),
            session,
            durable: Mapping::new(),
            durable_loaded: false,
            store,
            durable_key: durable_key.into(),
        }
    }

    pub fn scope(&self, kind: ScopeKind) -> &Mapping {
        match kind {
            ScopeKind::Turn => &self.turn,
            ScopeKind::Session => &self.session,
            ScopeKind::Durable => &self.durable,
        }
    }

    fn scope_mut(&mut self, kind: ScopeKind) -> &mut Mapping {
        match kind {
            ScopeKind::Turn => &mut self.turn,
            ScopeKind::Session => &mut self.session,
            ScopeKind::Durable => &mut self.durable,
        }
    }

    pub fn get(&self, kind: ScopeKind, key: &str) -> Option<&Value> {
        path::lookup(key, self.scope(kind))
    }

    /// Shallow-merges `attributes` into the scope.
    pub fn merge_scope(&mut self, kind: ScopeKind, attributes: Mapping) {
        merge_shallow(self.scope_mut(kind), attributes);
    }

    /// Writes `value` at `key`. The nested value replaces the whole top-level
    /// entry it hangs from. Returns false when the key is empty.
    pub fn update_scope(&mut self, kind: ScopeKind, key: &str, value: Value) -> bool {
        match path::nest(key, value) {
            Some(update) => {
                self.merge_scope(kind, update);
                true
            }
            None => false,
        }
    }

    pub fn durable_key(&self) -> &str {
        &self.durable_key
    }

    /// Reads the stored record once. Updates made earlier in the turn win over
    /// stored values.
    pub async fn load_durable(&mut self) -> Result<&Mapping, StoreError> {
        if !self.durable_loaded {
            let mut stored = self.store.read(&self.durable_key).await?;
            merge_shallow(&mut stored, std::mem::take(&mut self.durable));
            self.durable = stored;
            self.durable_loaded = true;
        }
        Ok(&self.durable)
    }

    pub fn is_flushed(&self) -> bool {
        self.turn.get(PERSISTENT_SAVED).and_then(Value::as_bool) == Some(true)
    }

    /// Persists the durable scope, at most once per turn.
    ///
    /// The guard flag is set before this returns, so the returned future owns
    /// everything it needs and later calls short-circuit even if this one has
    /// not been awaited yet. Store failures surface to the caller.
    pub fn flush_durable(&mut self) -> impl Future<Output = Result<FlushOutcome, StoreError>> + Send + 'static {
        let pending = if self.is_flushed() {
            None
        } else {
            self.turn.insert(PERSISTENT_SAVED.to_string(), Value::Bool(true));
            Some((self.store.clone(), self.durable_key.clone(), self.durable.clone()))
        };

        async move {
            let Some((store, key, durable)) = pending else {
                debug!("durable scope already saved this turn");
                return Ok(FlushOutcome::AlreadySaved);
            };

            let result = async {
                let mut record = store.read(&key).await?;
                merge_shallow(&mut record, durable);
                store.write(&key, record).await
            }
            .await;

            match result {
                Ok(()) => {
                    info!("durable attributes saved");
                    Ok(FlushOutcome::Saved)
                }
                Err(e) => {
                    error!(error = %e, "durable attributes save failed");
                    Err(e)
                }
            }
        }
    }

    /// Captures what a later "repeat" should replay.
    ///
    /// Precedence: explicit override in `options`, then the descriptor's own
    /// override, then the speech this turn resolved to.
    pub fn set_repeat_speech(&mut self, spoken: &Speech, descriptor: &ContentDescriptor, options: &TurnOptions) {
        if options.save_repeat == Some(false) {
            self.session.remove(SPEECH_OUTPUT);
            self.session.remove(SPEECH_REPROMPT);
            return;
        }

        let (output, reprompt) = if let Some(repeat) = &options.repeat_speech {
            (repeat.output.clone(), repeat.reprompt.clone())
        } else if let Some(repeat) = &descriptor.repeat_speech {
            (repeat.output.clone(), repeat.reprompt.clone())
        } else if descriptor.speech.is_some() {
            (Some(spoken.output.clone()), Some(spoken.reprompt.clone()))
        } else {
            (None, None)
        };

        self.session.insert(
            SPEECH_OUTPUT.to_string(),
            output.map_or(Value::Null, Value::String),
        );

        match reprompt.filter(|r| !r.is_empty()) {
            Some(reprompt) => {
                self.session.insert(SPEECH_REPROMPT.to_string(), Value::String(reprompt));
            }
            None => {
                self.session.remove(SPEECH_REPROMPT);
            }
        }
    }
}

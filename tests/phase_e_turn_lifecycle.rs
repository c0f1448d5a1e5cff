use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use turnkit::kernel::envelope::RequestEnvelope;
use turnkit::kernel::path::Mapping;
use turnkit::kernel::state::{ScopeKind, TurnOptions, SPEECH_OUTPUT};
use turnkit::kernel::telemetry::{TelemetryPipeline, TrackingEvent, TrackingPolicy};
use turnkit::memory::store::{DurableStore, MemoryStore, StoreError};
use turnkit::outputs::assets::AssetPaths;
use turnkit::outputs::{ContentDescriptor, ContentResolver, TokenMap};
use turnkit::services::analytics::{AnalyticsError, AnalyticsProvider, ProviderKind};
use turnkit::{TurnError, TurnReactor};

#[derive(Default)]
struct CountingProvider {
    incoming: AtomicUsize,
    outgoing: AtomicUsize,
}

#[async_trait]
impl AnalyticsProvider for CountingProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Dashbot
    }

    async fn log_incoming(&self, _envelope: &RequestEnvelope) -> Result<(), AnalyticsError> {
        self.incoming.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn log_outgoing(&self, _envelope: &RequestEnvelope, _response: &Value) -> Result<(), AnalyticsError> {
        self.outgoing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_event(&self, _event: &TrackingEvent) -> Result<Value, AnalyticsError> {
        Ok(Value::Null)
    }
}

struct OfflineStore;

#[async_trait]
impl DurableStore for OfflineStore {
    async fn read(&self, _key: &str) -> Result<Mapping, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn write(&self, _key: &str, _attributes: Mapping) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

fn reactor(provider: Arc<CountingProvider>, store: Arc<dyn DurableStore>) -> TurnReactor {
    let assets = AssetPaths {
        host: "https://cdn.example.com/".into(),
        bucket: "skill/".into(),
        image_path: "images/".into(),
        audio_path: "audio/".into(),
    };
    TurnReactor::new(
        ContentResolver::new(assets, PathBuf::from("apl")),
        TelemetryPipeline::new(provider, TrackingPolicy::default()),
        store,
    )
}

fn request() -> RequestEnvelope {
    RequestEnvelope::new(json!({
        "version": "1.0",
        "session": {
            "new": true,
            "sessionId": "session-1",
            "user": { "userId": "user-1" },
            "attributes": { "STATE": "_MAIN" }
        },
        "request": {
            "type": "IntentRequest",
            "requestId": "req-1",
            "intent": { "name": "GreetIntent", "slots": {} }
        }
    }))
}

fn greeting() -> ContentDescriptor {
    serde_json::from_value(json!({
        "speech": { "output": "Hello {name} <audio>chime.mp3</audio>", "reprompt": "Anything else?" },
        "card": { "title": "Hi {name}", "output": "Welcome" }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_full_turn() {
    let provider = Arc::new(CountingProvider::default());
    let store = Arc::new(MemoryStore::new());
    let reactor = reactor(provider.clone(), store.clone());

    let mut turn = reactor.begin(request());
    assert_eq!(turn.handler_state(), "_MAIN");
    turn.state.update_scope(ScopeKind::Durable, "visits", json!(1));

    let response = reactor
        .respond(&mut turn, greeting(), &TurnOptions::default(), &TokenMap::new([("{name}", "Ada")]))
        .await
        .unwrap();

    let envelope = &response.envelope;
    assert_eq!(
        envelope["response"]["outputSpeech"]["ssml"],
        "<speak>Hello Ada <audio src=\"https://cdn.example.com/skill/audio/chime.mp3\" /></speak>"
    );
    assert_eq!(envelope["response"]["card"]["title"], "Hi Ada");
    assert_eq!(envelope["response"]["shouldEndSession"], false);

    // Session scope rides back with the repeat capture.
    assert_eq!(envelope["sessionAttributes"]["STATE"], "_MAIN");
    assert_eq!(
        envelope["sessionAttributes"][SPEECH_OUTPUT],
        json!(response.resolved.speech.output)
    );

    // Durable scope saved exactly once.
    assert_eq!(store.write_count(), 1);
    assert_eq!(store.record("user-1").unwrap().get("visits"), Some(&json!(1)));
    assert!(turn.state.is_flushed());

    response.tracking.await.unwrap();
    assert_eq!(provider.incoming.load(Ordering::SeqCst), 1);
    assert_eq!(provider.outgoing.load(Ordering::SeqCst), 1);

    let snapshot = reactor.telemetry().sink().snapshot();
    assert_eq!(snapshot.total_sent(), 2);
}

#[tokio::test]
async fn test_opted_out_turn_skips_outgoing() {
    let provider = Arc::new(CountingProvider::default());
    let reactor = reactor(provider.clone(), Arc::new(MemoryStore::new()));

    let mut turn = reactor.begin(request());
    let options = TurnOptions {
        track: Some(false),
        end_session: true,
        ..Default::default()
    };
    let response = reactor
        .respond(&mut turn, greeting(), &options, &TokenMap::default())
        .await
        .unwrap();

    assert_eq!(response.envelope["response"]["shouldEndSession"], true);

    response.tracking.await.unwrap();
    assert_eq!(provider.incoming.load(Ordering::SeqCst), 1);
    assert_eq!(provider.outgoing.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_failure_fails_turn() {
    let provider = Arc::new(CountingProvider::default());
    let reactor = reactor(provider, Arc::new(OfflineStore));

    let mut turn = reactor.begin(request());
    let result = reactor
        .respond(&mut turn, greeting(), &TurnOptions::default(), &TokenMap::default())
        .await;

    assert!(matches!(result, Err(TurnError::Store(StoreError::Unavailable(_)))));
}

#[tokio::test]
async fn test_untrackable_turn_still_answers() {
    let provider = Arc::new(CountingProvider::default());
    let reactor = reactor(provider.clone(), Arc::new(MemoryStore::new()));

    let playback = RequestEnvelope::new(json!({
        "context": { "System": { "user": { "userId": "user-1" } } },
        "request": { "type": "AudioPlayer.PlaybackStarted", "requestId": "req-2" }
    }));
    let mut turn = reactor.begin(playback);
    let response = reactor
        .respond(&mut turn, ContentDescriptor::default(), &TurnOptions::default(), &TokenMap::default())
        .await
        .unwrap();

    assert!(response.envelope["response"].get("outputSpeech").is_none());

    response.tracking.await.unwrap();
    assert_eq!(provider.incoming.load(Ordering::SeqCst), 0);
    assert_eq!(provider.outgoing.load(Ordering::SeqCst), 0);
}

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feedwire_common::auth::jwt::encode_unsigned;
use feedwire_common::{MemoryStorage, MockClock};
use feedwire_core::{
    AuthGateway, EventRecorder, HttpTransport, Navigator, TransportError, TransportRequest,
    TransportResponse,
};
use feedwire_domain::{ApiError, ClientConfig, RetrySettings, TokenPair};
use feedwire_infra::{ApiClient, ApiClientBuilder};
use parking_lot::Mutex;
use serde_json::json;

/// Fixed "now" used by every test clock.
pub const NOW_SECS: u64 = 1_700_000_000;

type Scripted = Result<TransportResponse, TransportError>;

/// Transport double that replays a script of results in order and records
/// every request it receives. Once the script runs out it answers `200 {}`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
    delay: Mutex<Duration>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self { script: Mutex::new(script.into()), ..Self::default() })
    }

    pub fn with_delay(script: Vec<Scripted>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            delay: Mutex::new(delay),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(request);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.script.lock().pop_front().unwrap_or_else(|| Ok(TransportResponse::new(200, "{}")))
    }
}

pub fn ok(body: &str) -> Scripted {
    Ok(TransportResponse::new(200, body))
}

pub fn status(code: u16, body: &str) -> Scripted {
    Ok(TransportResponse::new(code, body))
}

pub fn connection_refused() -> Scripted {
    Err(TransportError::Connection("connection refused".into()))
}

/// Navigator that records every call.
#[derive(Default)]
pub struct RecordingNavigator {
    pub redirects: Mutex<Vec<String>>,
    pub reloads: AtomicUsize,
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.redirects.lock().push(path.to_string());
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

impl RecordingNavigator {
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

/// Recorder that keeps event names and tags.
#[derive(Default)]
pub struct RecordingRecorder {
    pub events: Mutex<Vec<(String, f64, Vec<(String, String)>)>>,
}

impl EventRecorder for RecordingRecorder {
    fn record_event(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        let tags = tags.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        self.events.lock().push((name.to_string(), value, tags));
    }
}

impl RecordingRecorder {
    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|(name, _, _)| name.clone()).collect()
    }

    pub fn tag(&self, event: &str, key: &str) -> Option<String> {
        self.events
            .lock()
            .iter()
            .rev()
            .find(|(name, _, _)| name == event)
            .and_then(|(_, _, tags)| tags.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }
}

/// Auth gateway that counts refreshes and answers after a short delay.
#[derive(Default)]
pub struct CountingGateway {
    pub refreshes: AtomicUsize,
    pub fail_refresh: bool,
}

#[async_trait]
impl AuthGateway for CountingGateway {
    async fn login(&self, _email: &str, _password: &str) -> Result<TokenPair, ApiError> {
        Ok(TokenPair::new(jwt_expiring_in(3600), Some("refresh-login".into())))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenPair, ApiError> {
        let call = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(25)).await;
        if self.fail_refresh {
            return Err(ApiError::Auth { message: "refresh token revoked".into() });
        }
        Ok(TokenPair::new(jwt_expiring_in(3600 + i64::try_from(call).unwrap()), None))
    }
}

impl CountingGateway {
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

/// Unsigned JWT whose `exp` is `secs` after [`NOW_SECS`].
pub fn jwt_expiring_in(secs: i64) -> String {
    encode_unsigned(&json!({ "exp": i64::try_from(NOW_SECS).unwrap() + secs, "sub": "user-1" }))
}

pub fn test_config(max_retries: u32) -> ClientConfig {
    ClientConfig {
        base_url: "https://api.test/api".into(),
        retry: RetrySettings {
            max_retries,
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_multiplier: 2.0,
        },
        ..ClientConfig::default()
    }
}

/// Everything a client test may want to inspect afterwards.
pub struct Harness {
    pub client: ApiClient,
    pub transport: Arc<ScriptedTransport>,
    pub navigator: Arc<RecordingNavigator>,
    pub recorder: Arc<RecordingRecorder>,
    pub gateway: Arc<CountingGateway>,
    pub clock: MockClock,
    pub session: Arc<MemoryStorage>,
}

pub fn harness(config: ClientConfig, transport: Arc<ScriptedTransport>) -> Harness {
    harness_with(config, transport, CountingGateway::default(), |builder| builder)
}

/// Harness whose login and refresh go through the default HTTP auth
/// gateway over the same scripted transport. `gateway` stays unused.
pub fn harness_with_http_auth(config: ClientConfig, transport: Arc<ScriptedTransport>) -> Harness {
    let navigator = Arc::new(RecordingNavigator::default());
    let recorder = Arc::new(RecordingRecorder::default());
    let clock = MockClock::at_unix_secs(NOW_SECS);
    let session = Arc::new(MemoryStorage::new());

    let client = ApiClient::builder()
        .config(config)
        .transport(transport.clone())
        .token_storage(Arc::new(MemoryStorage::new()))
        .session_storage(session.clone())
        .navigator(navigator.clone())
        .event_recorder(recorder.clone())
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    Harness {
        client,
        transport,
        navigator,
        recorder,
        gateway: Arc::new(CountingGateway::default()),
        clock,
        session,
    }
}

pub fn harness_with(
    config: ClientConfig,
    transport: Arc<ScriptedTransport>,
    gateway: CountingGateway,
    customize: impl FnOnce(ApiClientBuilder) -> ApiClientBuilder,
) -> Harness {
    let navigator = Arc::new(RecordingNavigator::default());
    let recorder = Arc::new(RecordingRecorder::default());
    let gateway = Arc::new(gateway);
    let clock = MockClock::at_unix_secs(NOW_SECS);
    let session = Arc::new(MemoryStorage::new());

    let builder = ApiClient::builder()
        .config(config)
        .transport(transport.clone())
        .token_storage(Arc::new(MemoryStorage::new()))
        .session_storage(session.clone())
        .auth_gateway(gateway.clone())
        .navigator(navigator.clone())
        .event_recorder(recorder.clone())
        .clock(Arc::new(clock.clone()));
    let client = customize(builder).build().unwrap();

    Harness { client, transport, navigator, recorder, gateway, clock, session }
}

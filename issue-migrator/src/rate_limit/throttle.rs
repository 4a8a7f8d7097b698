//! Call spacing and rate-limit retry loop.

use super::{Clock, RateLimitSignal};
use crate::target::{ApiError, ApiRequest, ApiResponse, Transport};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Guessed backoff stops doubling after this many consecutive throttles.
const MAX_BACKOFF_DOUBLINGS: u32 = 10;

/// Waits longer than this are logged as warnings.
const LONG_WAIT_SECS: u64 = 3600;

/// Timing parameters for [`RateLimitedTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleSettings {
    /// Minimum spacing between two consecutive calls.
    pub min_interval: Duration,

    /// First guessed wait when throttled without a duration hint.
    pub abuse_backoff: Duration,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            abuse_backoff: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
struct ThrottleState {
    next_call_at: Option<DateTime<Utc>>,
    consecutive_throttles: u32,
}

/// Wraps a [`Transport`] with call spacing and rate-limit retries.
///
/// Rate-limit rejections are retried without bound and never surface as
/// errors. Any other non-success response is returned to the caller
/// as [`ApiError::Status`] without retrying.
pub struct RateLimitedTransport {
    inner: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    settings: ThrottleSettings,
    state: Mutex<ThrottleState>,
}

impl RateLimitedTransport {
    /// Creates a throttled transport.
    #[must_use]
    pub fn new(inner: Arc<dyn Transport>, clock: Arc<dyn Clock>, settings: ThrottleSettings) -> Self {
        Self {
            inner,
            clock,
            settings,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    /// Returns the clock used for spacing and backoff.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Sends a request, waiting for the call slot and retrying on rate limits.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for transport failures and non-rate-limit error statuses.
    pub async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        loop {
            self.wait_for_slot().await;
            let sent = self.inner.send(request).await;
            self.schedule_next_call();
            let response = sent?;

            let Some(signal) = RateLimitSignal::detect(&response) else {
                self.lock_state().consecutive_throttles = 0;
                return response.into_result(&request.path);
            };

            let delay = self.delay_for(&signal);
            if delay.as_secs() > LONG_WAIT_SECS {
                warn!(
                    path = %request.path,
                    wait_secs = delay.as_secs(),
                    "Rate limit wait exceeds an hour"
                );
            }
            warn!(
                path = %request.path,
                status = response.status.as_u16(),
                signal = ?signal,
                wait_secs = delay.as_secs(),
                "Rate limited, waiting before retry"
            );
            self.clock.sleep(delay).await;
        }
    }

    /// Blocks until the next permitted call time.
    async fn wait_for_slot(&self) {
        let next = self.lock_state().next_call_at;
        let Some(next) = next else {
            return;
        };
        let remaining = next - self.clock.now();
        if let Ok(wait) = remaining.to_std() {
            if !wait.is_zero() {
                debug!(wait_ms = wait.as_millis() as u64, "Spacing call");
                self.clock.sleep(wait).await;
            }
        }
    }

    fn schedule_next_call(&self) {
        let interval = TimeDelta::from_std(self.settings.min_interval).unwrap_or(TimeDelta::zero());
        let now = self.clock.now();
        self.lock_state().next_call_at = Some(now + interval);
    }

    fn delay_for(&self, signal: &RateLimitSignal) -> Duration {
        match signal {
            RateLimitSignal::RetryAfter(delay) => *delay,
            RateLimitSignal::UntilReset(reset) => {
                let reset = i64::try_from(*reset)
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                reset
                    .and_then(|reset| (reset - self.clock.now()).to_std().ok())
                    .unwrap_or_default()
            }
            RateLimitSignal::Unspecified => {
                let mut state = self.lock_state();
                let doublings = state.consecutive_throttles.min(MAX_BACKOFF_DOUBLINGS);
                state.consecutive_throttles = state.consecutive_throttles.saturating_add(1);
                self.settings.abuse_backoff * 2u32.pow(doublings)
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ThrottleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::ManualClock;
    use async_trait::async_trait;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use std::collections::VecDeque;

    struct ScriptedTransport {
        clock: Arc<ManualClock>,
        responses: Mutex<VecDeque<ApiResponse>>,
        calls: Mutex<Vec<DateTime<Utc>>>,
    }

    impl ScriptedTransport {
        fn new(clock: Arc<ManualClock>, responses: Vec<ApiResponse>) -> Self {
            Self {
                clock,
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<DateTime<Utc>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            self.calls.lock().unwrap().push(self.clock.now());
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra call"))
        }
    }

    fn response(status: u16, headers: Vec<(&'static str, String)>, body: &str) -> ApiResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(name, HeaderValue::from_str(&value).unwrap());
        }
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: map,
            body: body.to_string(),
        }
    }

    fn ok() -> ApiResponse {
        response(200, vec![], "{}")
    }

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn setup(responses: Vec<ApiResponse>) -> (Arc<ManualClock>, Arc<ScriptedTransport>, RateLimitedTransport) {
        let clock = Arc::new(ManualClock::new(start()));
        let scripted = Arc::new(ScriptedTransport::new(clock.clone(), responses));
        let transport = RateLimitedTransport::new(
            scripted.clone(),
            clock.clone(),
            ThrottleSettings::default(),
        );
        (clock, scripted, transport)
    }

    #[tokio::test]
    async fn spaces_consecutive_calls() {
        let (_clock, scripted, transport) = setup(vec![ok(), ok(), ok()]);
        let request = ApiRequest::get("/x");

        for _ in 0..3 {
            transport.call(&request).await.unwrap();
        }

        let calls = scripted.calls();
        assert_eq!(calls[1] - calls[0], TimeDelta::seconds(1));
        assert_eq!(calls[2] - calls[1], TimeDelta::seconds(1));
    }

    #[tokio::test]
    async fn honours_retry_after() {
        let (_clock, scripted, transport) = setup(vec![
            response(429, vec![("retry-after", "30".to_string())], ""),
            ok(),
        ]);

        transport.call(&ApiRequest::get("/x")).await.unwrap();

        let calls = scripted.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1] - calls[0] >= TimeDelta::seconds(30));
    }

    #[tokio::test]
    async fn waits_until_quota_reset() {
        let reset = start().timestamp() + 600;
        let (_clock, scripted, transport) = setup(vec![
            response(
                403,
                vec![
                    ("x-ratelimit-remaining", "0".to_string()),
                    ("x-ratelimit-reset", reset.to_string()),
                ],
                r#"{"message":"API rate limit exceeded"}"#,
            ),
            ok(),
        ]);

        transport.call(&ApiRequest::get("/x")).await.unwrap();

        let calls = scripted.calls();
        assert!(calls[1].timestamp() >= reset);
    }

    #[tokio::test]
    async fn doubles_guessed_backoff_until_success() {
        let abuse = || response(403, vec![], r#"{"message":"abuse detection"}"#);
        let (clock, _scripted, transport) = setup(vec![abuse(), abuse(), abuse(), ok(), abuse(), ok()]);

        transport.call(&ApiRequest::get("/x")).await.unwrap();
        transport.call(&ApiRequest::get("/x")).await.unwrap();

        let guessed: Vec<u64> = clock
            .sleeps()
            .into_iter()
            .map(|d| d.as_secs())
            .filter(|secs| *secs >= 60)
            .collect();
        assert_eq!(guessed, vec![60, 120, 240, 60]);
    }

    #[tokio::test]
    async fn returns_other_errors_without_retry() {
        let (_clock, scripted, transport) = setup(vec![response(
            422,
            vec![],
            r#"{"message":"Validation Failed"}"#,
        )]);

        let err = transport.call(&ApiRequest::get("/x")).await.unwrap_err();

        assert_eq!(err.status(), Some(422));
        assert_eq!(scripted.calls().len(), 1);
    }
}

//! Transport trait and retry policy.

use crate::error::Result;
use crate::sketch::response::GenerateContentResponse;
use crate::sketch::types::ImagePayload;
use async_trait::async_trait;
use std::time::Duration;

/// What gets sent to the model: the photo, then the instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SketchRequest {
    /// Input photo.
    pub image: ImagePayload,
    /// Instruction text, sent after the image.
    pub prompt: String,
}

impl SketchRequest {
    /// Creates a new request.
    pub fn new(image: ImagePayload, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
        }
    }
}

/// Delivers a [`SketchRequest`] to a generation endpoint.
///
/// One call is one attempt; retries live in [`TransportExt`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request once and returns the decoded response body.
    async fn send(&self, request: &SketchRequest) -> Result<GenerateContentResponse>;

    /// Returns the model identifier requests are sent to.
    fn model(&self) -> &str;
}

/// Backoff schedule for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each retry.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    /// Three retries waiting 2s, 4s, then 8s.
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(2000),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(self.multiplier.saturating_pow(retry))
    }
}

/// A response together with the number of attempts it took.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Decoded response body.
    pub response: GenerateContentResponse,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

/// Extension trait adding retries to any transport.
#[async_trait]
pub trait TransportExt: Transport {
    /// Sends with automatic retries on rate limiting and service
    /// unavailability. Other errors return immediately.
    async fn send_with_retries(
        &self,
        request: &SketchRequest,
        policy: &RetryPolicy,
    ) -> Result<Delivery> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.send(request).await {
                Ok(response) => {
                    return Ok(Delivery {
                        response,
                        attempts: attempt,
                    })
                }
                Err(e) if e.is_retryable() && attempt <= policy.max_retries => {
                    let delay = policy.delay_for(attempt - 1);
                    tracing::warn!(
                        attempt,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after transient error: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<T: Transport> TransportExt for T {}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::error::SketchError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays scripted outcomes and records when each attempt happened.
    pub(crate) struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<GenerateContentResponse>>>,
        calls: Mutex<Vec<(Instant, SketchRequest)>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(outcomes: Vec<Result<GenerateContentResponse>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub(crate) fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }

        pub(crate) fn last_request(&self) -> Option<SketchRequest> {
            self.calls.lock().unwrap().last().map(|(_, r)| r.clone())
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &SketchRequest) -> Result<GenerateContentResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((Instant::now(), request.clone()));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(SketchError::EmptyResponse))
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    pub(crate) fn rate_limited() -> Result<GenerateContentResponse> {
        Err(SketchError::RateLimited { retry_after: None })
    }

    pub(crate) fn unavailable() -> Result<GenerateContentResponse> {
        Err(SketchError::ServiceUnavailable("overloaded".into()))
    }

    pub(crate) fn image_response(data: &str) -> Result<GenerateContentResponse> {
        Ok(serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": data}}]}
            }]
        }))
        .unwrap())
    }
}

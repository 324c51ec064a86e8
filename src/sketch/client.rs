//! The sketch generation pipeline: prompt, transport with retries, and
//! response extraction.

use crate::error::Result;
use crate::sketch::prompt::build_prompt;
use crate::sketch::response::extract_sketch;
use crate::sketch::transport::{RetryPolicy, SketchRequest, Transport, TransportExt};
use crate::sketch::transports::{
    Backend, GeminiTransport, GeminiTransportBuilder, RequestShape, SketchModel,
};
use crate::sketch::types::{
    GeneratedSketch, GenerationMetadata, GenerationResult, ImagePayload, SketchSettings,
};
use std::time::Instant;

/// Builder for a [`SketchClient`] backed by [`GeminiTransport`].
#[derive(Debug, Clone, Default)]
pub struct SketchClientBuilder {
    transport: GeminiTransportBuilder,
    retry_policy: RetryPolicy,
}

impl SketchClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.transport = self.transport.api_key(key);
        self
    }

    /// Sets the model.
    pub fn model(mut self, model: SketchModel) -> Self {
        self.transport = self.transport.model(model);
        self
    }

    /// Sets the backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.transport = self.transport.backend(backend);
        self
    }

    /// Routes requests through a gateway at `base_url`.
    pub fn gateway(mut self, base_url: impl Into<String>) -> Self {
        self.transport = self.transport.gateway(base_url);
        self
    }

    /// Sets the request body layout.
    pub fn request_shape(mut self, shape: RequestShape) -> Self {
        self.transport = self.transport.request_shape(shape);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.transport = self.transport.header(name, value);
        self
    }

    /// Sets the retry policy for transient failures.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<SketchClient> {
        Ok(SketchClient::new(self.transport.build()?).with_retry_policy(self.retry_policy))
    }
}

/// Turns photos into sketches.
///
/// Holds no per-call state, so one client can serve any number of calls.
#[derive(Debug)]
pub struct SketchClient<T = GeminiTransport> {
    transport: T,
    retry_policy: RetryPolicy,
}

impl SketchClient {
    /// Creates a new `SketchClientBuilder`.
    pub fn builder() -> SketchClientBuilder {
        SketchClientBuilder::new()
    }
}

impl<T: Transport> SketchClient<T> {
    /// Creates a client over any transport with the default retry policy.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Generates a sketch from a data URL, returning a displayable result.
    pub async fn generate(&self, encoded_image: &str, settings: &SketchSettings) -> GenerationResult {
        let result = self.try_generate(encoded_image, settings).await;
        if let Err(e) = &result {
            tracing::error!(kind = %e.kind(), "sketch generation failed: {e}");
        }
        result.into()
    }

    /// Generates a sketch from a data URL.
    pub async fn try_generate(
        &self,
        encoded_image: &str,
        settings: &SketchSettings,
    ) -> Result<GeneratedSketch> {
        self.generate_from_payload(ImagePayload::from_data_url(encoded_image), settings)
            .await
    }

    /// Generates a sketch from an already split payload.
    pub async fn generate_from_payload(
        &self,
        image: ImagePayload,
        settings: &SketchSettings,
    ) -> Result<GeneratedSketch> {
        let start = Instant::now();
        let request = SketchRequest::new(image, build_prompt(settings));

        let delivery = self
            .transport
            .send_with_retries(&request, &self.retry_policy)
            .await?;

        let metadata = GenerationMetadata {
            model: Some(self.transport.model().to_string()),
            duration_ms: Some(start.elapsed().as_millis() as u64),
            attempts: delivery.attempts,
        };
        let sketch = extract_sketch(&delivery.response, metadata)?;

        tracing::debug!(
            model = self.transport.model(),
            attempts = delivery.attempts,
            size_bytes = sketch.size(),
            "sketch generated"
        );

        Ok(sketch)
    }
}

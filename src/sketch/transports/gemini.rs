//! HTTP transport for the Gemini `generateContent` API and gateways that
//! proxy it.

use crate::error::{parse_retry_after, sanitize_error_message, Result, SketchError};
use crate::sketch::response::GenerateContentResponse;
use crate::sketch::transport::{SketchRequest, Transport};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::time::Instant;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Image-capable model to send sketches to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SketchModel {
    /// Gemini 3 Pro Image preview (highest quality).
    #[default]
    Gemini3ProImage,
    /// Gemini 2.5 Flash Image (fast, economical).
    Gemini25FlashImage,
    /// Any other model identifier, e.g. one exposed by a gateway.
    Custom(String),
}

impl SketchModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gemini3ProImage => "gemini-3-pro-image-preview",
            Self::Gemini25FlashImage => "gemini-2.5-flash-image",
            Self::Custom(id) => id,
        }
    }

    /// Maps an identifier to a known variant, or wraps it as `Custom`.
    pub fn from_id(id: &str) -> Self {
        match id {
            "gemini-3-pro-image-preview" => Self::Gemini3ProImage,
            "gemini-2.5-flash-image" => Self::Gemini25FlashImage,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Where requests are sent and how the key travels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Backend {
    /// Gemini Developer API. Key sent in the `x-goog-api-key` header.
    #[default]
    Gemini,
    /// A gateway exposing `{base_url}/models/{model}:generateContent`.
    /// Key, if any, sent as the `key` query parameter.
    Gateway {
        /// Base URL up to (not including) `/models`.
        base_url: String,
    },
}

impl Backend {
    fn base_url(&self) -> &str {
        match self {
            Self::Gemini => GEMINI_BASE_URL,
            Self::Gateway { base_url } => base_url.trim_end_matches('/'),
        }
    }
}

/// JSON layout of the request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestShape {
    /// `{"contents": [{"role": "user", "parts": [...]}]}`
    #[default]
    Rest,
    /// `{"contents": {"parts": [...]}}`, the single-object form SDKs accept.
    Nested,
}

/// Builder for GeminiTransport.
#[derive(Debug, Clone, Default)]
pub struct GeminiTransportBuilder {
    api_key: Option<String>,
    model: Option<SketchModel>,
    backend: Option<Backend>,
    shape: RequestShape,
    headers: Vec<(String, String)>,
}

impl GeminiTransportBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model. Falls back to `SKETCHAI_MODEL`, then the default.
    pub fn model(mut self, model: SketchModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets the backend. Falls back to a gateway at `SKETCHAI_GATEWAY_URL`,
    /// then the Gemini Developer API.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Routes requests through a gateway at `base_url`.
    pub fn gateway(self, base_url: impl Into<String>) -> Self {
        self.backend(Backend::Gateway {
            base_url: base_url.into(),
        })
    }

    /// Sets the request body layout.
    pub fn request_shape(mut self, shape: RequestShape) -> Self {
        self.shape = shape;
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Builds the transport, resolving key, model and backend.
    pub fn build(self) -> Result<GeminiTransport> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => match std::env::var("SKETCHAI_GATEWAY_URL") {
                Ok(base_url) if !base_url.trim().is_empty() => Backend::Gateway { base_url },
                _ => Backend::Gemini,
            },
        };

        if let Backend::Gateway { base_url } = &backend {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(SketchError::Config(format!(
                    "gateway URL must start with http:// or https://, got {base_url:?}"
                )));
            }
        }

        let api_key = self
            .api_key
            .or_else(|| std::env::var("API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        // Gateways may authenticate through headers alone.
        if api_key.is_none() && backend == Backend::Gemini {
            return Err(SketchError::MissingCredential(
                "API_KEY / GOOGLE_API_KEY not set and no API key provided".into(),
            ));
        }

        let model = self
            .model
            .or_else(|| {
                std::env::var("SKETCHAI_MODEL")
                    .ok()
                    .filter(|id| !id.trim().is_empty())
                    .map(|id| SketchModel::from_id(id.trim()))
            })
            .unwrap_or_default();

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SketchError::Config(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SketchError::Config(format!("header {name}: {e}")))?;
            headers.append(name, value);
        }

        Ok(GeminiTransport {
            client: reqwest::Client::new(),
            api_key,
            model,
            backend,
            shape: self.shape,
            headers,
        })
    }
}

/// Sends sketch requests to Gemini or a Gemini-compatible gateway.
pub struct GeminiTransport {
    client: reqwest::Client,
    api_key: Option<String>,
    model: SketchModel,
    backend: Backend,
    shape: RequestShape,
    headers: HeaderMap,
}

impl std::fmt::Debug for GeminiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiTransport")
            .field("model", &self.model)
            .field("backend", &self.backend)
            .field("shape", &self.shape)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl GeminiTransport {
    /// Creates a new `GeminiTransportBuilder`.
    pub fn builder() -> GeminiTransportBuilder {
        GeminiTransportBuilder::new()
    }

    /// Returns the active backend.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Returns the full `generateContent` URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.backend.base_url(),
            self.model.as_str()
        )
    }

    fn parse_error(&self, status: u16, text: &str, headers: &HeaderMap) -> SketchError {
        let text = sanitize_error_message(text);
        match status {
            429 => {
                let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
                SketchError::RateLimited { retry_after }
            }
            503 => SketchError::ServiceUnavailable(text),
            401 | 403 => SketchError::MissingCredential(text),
            _ => SketchError::Api {
                status,
                message: text,
            },
        }
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn send(&self, request: &SketchRequest) -> Result<GenerateContentResponse> {
        let start = Instant::now();
        let body = GenerateContentRequest::shaped(request, self.shape);

        let mut builder = self
            .client
            .post(self.endpoint())
            .headers(self.headers.clone())
            .json(&body);

        if let Some(key) = &self.api_key {
            builder = match self.backend {
                Backend::Gemini => builder.header("x-goog-api-key", key),
                Backend::Gateway { .. } => builder.query(&[("key", key)]),
            };
        }

        tracing::debug!(model = self.model.as_str(), shape = ?self.shape, "sending sketch request");

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let text = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;

        tracing::debug!(
            model = self.model.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            candidates = parsed.candidates.len(),
            "sketch response received"
        );

        Ok(parsed)
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }
}

// Request types
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: RequestContents,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestContents {
    List(Vec<RequestContent>),
    Single(RequestContent),
}

#[derive(Debug, Serialize)]
struct RequestContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart>,
}

/// A part in a request - inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: RequestInlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestInlineData {
    mime_type: String,
    data: String,
}

impl GenerateContentRequest {
    fn shaped(request: &SketchRequest, shape: RequestShape) -> Self {
        // Image first: the model reads the instruction as applying to it.
        let parts = vec![
            RequestPart::InlineData {
                inline_data: RequestInlineData {
                    mime_type: request.image.mime_type.clone(),
                    data: request.image.data.clone(),
                },
            },
            RequestPart::Text {
                text: request.prompt.clone(),
            },
        ];

        let contents = match shape {
            RequestShape::Rest => RequestContents::List(vec![RequestContent {
                role: Some("user"),
                parts,
            }]),
            RequestShape::Nested => RequestContents::Single(RequestContent { role: None, parts }),
        };

        Self { contents }
    }
}

//! `generateContent` response types and image extraction.

use crate::error::{Result, SketchError};
use crate::sketch::types::{GeneratedSketch, GenerationMetadata};
use serde::{Deserialize, Serialize};

/// Body of a `generateContent` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates; only the first is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback on the prompt, present when it was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One unit of generated output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Content parts, in model order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,
    /// Why generation stopped (e.g., `STOP`, `IMAGE_SAFETY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateContent {
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A content part: inline image data, text, or both absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    /// Text produced by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline binary data produced by the model.
    #[serde(default, alias = "inline_data", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<ResponseInlineData>,
}

/// Base64 data with its declared mime type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInlineData {
    /// Declared mime type. Ignored: output is always treated as PNG.
    #[serde(default, alias = "mime_type")]
    pub mime_type: Option<String>,
    /// Base64-encoded bytes.
    #[serde(default)]
    pub data: String,
}

/// Prompt-level feedback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason code, e.g. `SAFETY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    /// Human-readable block explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason_message: Option<String>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, or an empty slice.
    pub fn first_candidate_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Returns the first inline image's base64 data.
    pub fn image_data(&self) -> Option<&str> {
        self.first_candidate_parts()
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.as_str())
            .find(|data| !data.is_empty())
    }

    /// Returns the first non-empty text part.
    pub fn explanation(&self) -> Option<&str> {
        self.first_candidate_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .find(|text| !text.is_empty())
    }

    fn block_message(&self) -> Option<String> {
        let feedback = self.prompt_feedback.as_ref()?;
        let reason = feedback.block_reason.as_ref()?;
        Some(
            feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {reason}")),
        )
    }
}

/// Pulls the sketch out of a response.
///
/// An image part anywhere in the first candidate wins over text; text is
/// only surfaced, verbatim, when no image is present.
pub fn extract_sketch(
    response: &GenerateContentResponse,
    metadata: GenerationMetadata,
) -> Result<GeneratedSketch> {
    if let Some(data) = response.image_data() {
        return GeneratedSketch::from_base64(data, metadata);
    }

    if let Some(text) = response.explanation() {
        return Err(SketchError::ModelRefusal(text.to_string()));
    }

    if let Some(message) = response.block_message() {
        return Err(SketchError::ModelRefusal(message));
    }

    if let Some(reason) = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
    {
        tracing::debug!(finish_reason = reason, "candidate carried no usable parts");
    }

    Err(SketchError::EmptyResponse)
}

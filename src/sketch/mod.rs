//! Sketch generation module.

mod client;
pub mod prompt;
mod response;
mod transport;
pub mod transports;
mod types;

pub use client::{SketchClient, SketchClientBuilder};
pub use prompt::build_prompt;
pub use response::{
    extract_sketch, Candidate, CandidateContent, GenerateContentResponse, PromptFeedback,
    ResponseInlineData, ResponsePart,
};
pub use transport::{Delivery, RetryPolicy, SketchRequest, Transport, TransportExt};
pub use types::{
    Failure, GeneratedSketch, GenerationMetadata, GenerationResult, ImageFormat, ImagePayload,
    LineWeight, SketchSettings, SketchStyle, DEFAULT_INPUT_MIME, OUTPUT_MIME,
};

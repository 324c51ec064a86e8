#![warn(missing_docs)]
//! SketchAI - turn photos into black-and-white artistic sketches.
//!
//! A photo and a handful of stylistic settings go in; a prompt is derived
//! from the settings, the photo and prompt are sent to a multimodal image
//! model, and the generated sketch (or a displayable error) comes back.
//!
//! # Quick Start
//!
//! ```no_run
//! use sketchai::{LineWeight, SketchClient, SketchSettings, SketchStyle};
//!
//! #[tokio::main]
//! async fn main() -> sketchai::Result<()> {
//!     let client = SketchClient::builder().build()?;
//!     let photo = std::fs::read("portrait.jpg")?;
//!     let payload = sketchai::ImagePayload::from_bytes(&photo);
//!
//!     let settings = SketchSettings::new(SketchStyle::Charcoal, LineWeight::Thick, 80);
//!     let sketch = client.generate_from_payload(payload, &settings).await?;
//!     sketch.save("portrait-sketch.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! Builder setters take precedence over the environment:
//! - `API_KEY` / `GOOGLE_API_KEY`: API key
//! - `SKETCHAI_MODEL`: model identifier
//! - `SKETCHAI_GATEWAY_URL`: route requests through a Gemini-compatible gateway
//!
//! # Features
//!
//! - `cli` (default): the `sketchai` command-line tool

mod error;
pub mod sketch;

// Re-export error types at crate root
pub use error::{ErrorKind, Result, SketchError};

pub use sketch::transports::{
    Backend, GeminiTransport, GeminiTransportBuilder, RequestShape, SketchModel,
};
pub use sketch::{
    build_prompt, Failure, GeneratedSketch, GenerationMetadata, GenerationResult, ImageFormat,
    ImagePayload, LineWeight, RetryPolicy, SketchClient, SketchClientBuilder, SketchRequest,
    SketchSettings, SketchStyle, Transport, TransportExt,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorKind, Result, SketchError};
    pub use crate::sketch::{
        GeneratedSketch, GenerationResult, LineWeight, SketchClient, SketchSettings, SketchStyle,
        Transport, TransportExt,
    };
}

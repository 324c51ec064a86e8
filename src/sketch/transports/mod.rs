//! Transport implementations.

mod gemini;

pub use gemini::{Backend, GeminiTransport, GeminiTransportBuilder, RequestShape, SketchModel};

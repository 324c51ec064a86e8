//! Core types for sketch generation.

use crate::error::{ErrorKind, Result, SketchError};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Mime type assumed when an encoded image carries no recognizable marker.
pub const DEFAULT_INPUT_MIME: &str = "image/jpeg";

/// Mime type every generated sketch is presented as.
pub const OUTPUT_MIME: &str = "image/png";

/// Image formats recognized when reading photos from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        None
    }
}

/// Rendering aesthetic requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SketchStyle {
    /// Graphite pencil with soft shading.
    Pencil,
    /// Charcoal with deep blacks and smudging.
    Charcoal,
    /// High-contrast ink pen.
    Ink,
    /// Continuous single-line art.
    Minimalist,
    /// Dotwork shading.
    Stipple,
    /// Cross-hatch shading.
    Crosshatch,
}

impl SketchStyle {
    /// Every style, in display order.
    pub const ALL: [SketchStyle; 6] = [
        Self::Pencil,
        Self::Charcoal,
        Self::Ink,
        Self::Minimalist,
        Self::Stipple,
        Self::Crosshatch,
    ];

    /// Returns the stable identifier (e.g., "charcoal").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pencil => "pencil",
            Self::Charcoal => "charcoal",
            Self::Ink => "ink",
            Self::Minimalist => "minimalist",
            Self::Stipple => "stipple",
            Self::Crosshatch => "crosshatch",
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pencil => "Pencil sketch",
            Self::Charcoal => "Charcoal",
            Self::Ink => "Pen & ink",
            Self::Minimalist => "Minimalist line",
            Self::Stipple => "Stipple",
            Self::Crosshatch => "Cross-hatching",
        }
    }
}

impl std::fmt::Display for SketchStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SketchStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sketch style: {s}"))
    }
}

/// Stroke thickness preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineWeight {
    /// Fine, delicate lines.
    Thin,
    /// Balanced lines.
    Medium,
    /// Bold, heavy strokes.
    Thick,
}

impl LineWeight {
    /// Every line weight, thinnest first.
    pub const ALL: [LineWeight; 3] = [Self::Thin, Self::Medium, Self::Thick];

    /// Returns the stable identifier (e.g., "thin").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thin => "thin",
            Self::Medium => "medium",
            Self::Thick => "thick",
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Thin => "Thin / fine",
            Self::Medium => "Medium / balanced",
            Self::Thick => "Thick / bold",
        }
    }
}

impl std::fmt::Display for LineWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineWeight {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|weight| weight.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown line weight: {s}"))
    }
}

/// User-chosen parameters for one sketch transformation.
///
/// A `None` style or line weight leaves that aspect up to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchSettings {
    /// Rendering aesthetic.
    #[serde(default)]
    pub style: Option<SketchStyle>,
    /// Stroke thickness.
    #[serde(default)]
    pub line_weight: Option<LineWeight>,
    #[serde(deserialize_with = "deserialize_darkness")]
    darkness: u8,
}

fn deserialize_darkness<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = u64::deserialize(deserializer)?;
    Ok(raw.min(u64::from(SketchSettings::MAX_DARKNESS)) as u8)
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            style: Some(SketchStyle::Pencil),
            line_weight: Some(LineWeight::Medium),
            darkness: 50,
        }
    }
}

impl SketchSettings {
    /// Maximum darkness value.
    pub const MAX_DARKNESS: u8 = 100;

    /// Creates settings with the given style and line weight.
    pub fn new(style: SketchStyle, line_weight: LineWeight, darkness: u8) -> Self {
        Self {
            style: Some(style),
            line_weight: Some(line_weight),
            darkness: darkness.min(Self::MAX_DARKNESS),
        }
    }

    /// Tone intensity, 0 (lightest) to 100 (darkest).
    pub fn darkness(&self) -> u8 {
        self.darkness
    }

    /// Sets the style.
    pub fn with_style(mut self, style: SketchStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Sets the line weight.
    pub fn with_line_weight(mut self, line_weight: LineWeight) -> Self {
        self.line_weight = Some(line_weight);
        self
    }

    /// Sets the darkness, clamped to 100.
    pub fn with_darkness(mut self, darkness: u8) -> Self {
        self.darkness = darkness.min(Self::MAX_DARKNESS);
        self
    }
}

/// An input image ready to be embedded in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Declared mime type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64-encoded image data.
    pub data: String,
}

impl ImagePayload {
    /// Creates a payload from a mime type and base64 data.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Creates a payload from raw bytes, sniffing the mime type.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mime_type = ImageFormat::from_magic_bytes(bytes)
            .map(|f| f.mime_type())
            .unwrap_or(DEFAULT_INPUT_MIME);
        Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Reads a photo from disk. The mime type comes from the magic bytes,
    /// then the file extension, then falls back to `image/jpeg`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let format = ImageFormat::from_magic_bytes(&bytes).or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
        });
        let mime_type = format.map_or(DEFAULT_INPUT_MIME, |f| f.mime_type());
        Ok(Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(&bytes),
        ))
    }

    /// Splits a browser-style data URL (`data:image/png;base64,....`).
    ///
    /// Never fails: a missing or unrecognized marker yields `image/jpeg`, and
    /// input without a comma is treated as bare base64. The payload is the
    /// segment between the first and second comma.
    pub fn from_data_url(encoded: &str) -> Self {
        let mut segments = encoded.split(',');
        let header = segments.next();
        let (header, payload) = match segments.next() {
            Some(payload) if !payload.is_empty() => (header, payload),
            Some(_) => (header, encoded),
            None => (None, encoded),
        };

        let mime_type = header
            .and_then(|h| h.strip_prefix("data:"))
            .and_then(parse_mime)
            .unwrap_or(DEFAULT_INPUT_MIME);

        Self::new(mime_type, payload)
    }

    /// Renders this payload back into a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Extracts a leading `type/subtype` token.
fn parse_mime(header: &str) -> Option<&str> {
    let (ty, rest) = header.split_once('/')?;
    if ty.is_empty() || !ty.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+')))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(&header[..ty.len() + 1 + end])
}

/// Decodes base64 that may carry a data URL prefix, whitespace, or missing
/// padding.
pub(crate) fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(&cleaned)
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Wall time including retries, in milliseconds.
    pub duration_ms: Option<u64>,
    /// Number of HTTP attempts made.
    pub attempts: u32,
}

/// A generated sketch.
#[derive(Debug, Clone)]
#[must_use = "generated sketch should be saved or displayed"]
pub struct GeneratedSketch {
    /// Raw image bytes, treated as PNG.
    pub data: Vec<u8>,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedSketch {
    /// Decodes a base64 image returned by the model.
    pub fn from_base64(data: &str, metadata: GenerationMetadata) -> Result<Self> {
        let data = decode_base64_lenient(data)
            .map_err(|e| SketchError::MalformedResponse(format!("image data: {e}")))?;
        if data.is_empty() {
            return Err(SketchError::MalformedResponse("image data is empty".into()));
        }
        Ok(Self { data, metadata })
    }

    /// Returns the format detected from magic bytes, if recognizable.
    pub fn detected_format(&self) -> Option<ImageFormat> {
        ImageFormat::from_magic_bytes(&self.data)
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a PNG data URL, whatever mime type the model
    /// declared.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", OUTPUT_MIME, self.to_base64())
    }
}

/// A failed generation, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Message suitable for showing to the user.
    pub message: String,
}

impl From<SketchError> for Failure {
    fn from(err: SketchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

/// Outcome of one generation call.
#[derive(Debug, Clone)]
#[must_use]
pub enum GenerationResult {
    /// The model produced a sketch.
    Image(GeneratedSketch),
    /// The call failed; the message is ready for display.
    Failure(Failure),
}

impl GenerationResult {
    /// Returns true if a sketch was produced.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    /// Returns the sketch, if any.
    pub fn image(&self) -> Option<&GeneratedSketch> {
        match self {
            Self::Image(sketch) => Some(sketch),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Image(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> std::result::Result<GeneratedSketch, Failure> {
        match self {
            Self::Image(sketch) => Ok(sketch),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl From<Result<GeneratedSketch>> for GenerationResult {
    fn from(result: Result<GeneratedSketch>) -> Self {
        match result {
            Ok(sketch) => Self::Image(sketch),
            Err(err) => Self::Failure(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a\0\0\0\0\0\0"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic_bytes(b"short"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("bmp"), None);
    }

    #[test]
    fn test_style_and_weight_parsing() {
        assert_eq!("Charcoal".parse::<SketchStyle>(), Ok(SketchStyle::Charcoal));
        assert_eq!(" thick ".parse::<LineWeight>(), Ok(LineWeight::Thick));
        assert!("watercolor".parse::<SketchStyle>().is_err());
        for style in SketchStyle::ALL {
            assert_eq!(style.as_str().parse::<SketchStyle>(), Ok(style));
        }
    }

    #[test]
    fn test_settings_defaults_and_clamping() {
        let settings = SketchSettings::default();
        assert_eq!(settings.style, Some(SketchStyle::Pencil));
        assert_eq!(settings.line_weight, Some(LineWeight::Medium));
        assert_eq!(settings.darkness(), 50);

        assert_eq!(SketchSettings::default().with_darkness(250).darkness(), 100);
        assert_eq!(
            SketchSettings::new(SketchStyle::Ink, LineWeight::Thin, 101).darkness(),
            100
        );
    }

    #[test]
    fn test_settings_deserialize_clamps_darkness() {
        let settings: SketchSettings =
            serde_json::from_str(r#"{"style":"ink","darkness":200}"#).unwrap();
        assert_eq!(settings.darkness(), SketchSettings::MAX_DARKNESS);

        let huge: SketchSettings = serde_json::from_str(r#"{"darkness":100000}"#).unwrap();
        assert_eq!(huge.darkness(), 100);

        assert!(serde_json::from_str::<SketchSettings>(r#"{"darkness":-5}"#).is_err());
    }

    #[test]
    fn test_settings_deserialize_camel_case() {
        let settings: SketchSettings =
            serde_json::from_str(r#"{"style":"stipple","lineWeight":"thin","darkness":12}"#)
                .unwrap();
        assert_eq!(settings.style, Some(SketchStyle::Stipple));
        assert_eq!(settings.line_weight, Some(LineWeight::Thin));
        assert_eq!(settings.darkness(), 12);

        let unspecified: SketchSettings = serde_json::from_str(r#"{"darkness":40}"#).unwrap();
        assert_eq!(unspecified.style, None);
        assert_eq!(unspecified.line_weight, None);
    }

    #[test]
    fn test_payload_from_data_url() {
        let payload = ImagePayload::from_data_url("data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data, "iVBORw0KGgo=");

        let svg = ImagePayload::from_data_url("data:image/svg+xml;base64,PHN2Zz4=");
        assert_eq!(svg.mime_type, "image/svg+xml");
    }

    #[test]
    fn test_payload_defaults_to_jpeg() {
        let bare = ImagePayload::from_data_url("/9j/4AAQSkZJRg==");
        assert_eq!(bare.mime_type, DEFAULT_INPUT_MIME);
        assert_eq!(bare.data, "/9j/4AAQSkZJRg==");

        let odd = ImagePayload::from_data_url("data:;base64,AAAA");
        assert_eq!(odd.mime_type, DEFAULT_INPUT_MIME);
        assert_eq!(odd.data, "AAAA");

        let no_subtype = ImagePayload::from_data_url("data:image/;base64,AAAA");
        assert_eq!(no_subtype.mime_type, DEFAULT_INPUT_MIME);
    }

    #[test]
    fn test_payload_stops_at_second_comma() {
        let payload = ImagePayload::from_data_url("data:image/png;base64,AAAA,BBBB");
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data, "AAAA");
    }

    #[test]
    fn test_payload_from_file_uses_extension_fallback() {
        let dir = std::env::temp_dir().join(format!("sketchai-types-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let by_magic = dir.join("photo.gif");
        std::fs::write(&by_magic, PNG_MAGIC).unwrap();
        assert_eq!(ImagePayload::from_file(&by_magic).unwrap().mime_type, "image/png");

        let by_extension = dir.join("photo.WEBP");
        std::fs::write(&by_extension, b"truncated").unwrap();
        let payload = ImagePayload::from_file(&by_extension).unwrap();
        assert_eq!(payload.mime_type, "image/webp");
        assert_eq!(payload.data, "dHJ1bmNhdGVk");

        let unknown = dir.join("photo.bin");
        std::fs::write(&unknown, b"truncated").unwrap();
        assert_eq!(ImagePayload::from_file(&unknown).unwrap().mime_type, DEFAULT_INPUT_MIME);

        let missing = ImagePayload::from_file(dir.join("absent.png")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Io);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_generated_sketch_detected_format() {
        let sketch = GeneratedSketch::from_base64(
            &base64::engine::general_purpose::STANDARD.encode(JPEG_MAGIC),
            GenerationMetadata::default(),
        )
        .unwrap();
        assert_eq!(sketch.detected_format(), Some(ImageFormat::Jpeg));
        assert_eq!(sketch.detected_format().map(|f| f.extension()), Some("jpg"));
    }

    #[test]
    fn test_payload_trailing_comma_keeps_input() {
        let payload = ImagePayload::from_data_url("data:image/png;base64,");
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data, "data:image/png;base64,");
    }

    #[test]
    fn test_payload_from_bytes_sniffs_mime() {
        let payload = ImagePayload::from_bytes(&PNG_MAGIC);
        assert_eq!(payload.mime_type, "image/png");
        assert!(payload.to_data_url().starts_with("data:image/png;base64,"));

        let unknown = ImagePayload::from_bytes(b"not an image at all");
        assert_eq!(unknown.mime_type, DEFAULT_INPUT_MIME);
    }

    #[test]
    fn test_decode_base64_lenient() {
        assert_eq!(decode_base64_lenient("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64_lenient("aGVsbG8").unwrap(), b"hello");
        assert_eq!(
            decode_base64_lenient("data:image/png;base64,aGVs\nbG8=").unwrap(),
            b"hello"
        );
        assert!(decode_base64_lenient("!!!").is_err());
    }

    #[test]
    fn test_generated_sketch_is_always_png_data_url() {
        let sketch = GeneratedSketch::from_base64("/9j/4AAQ", GenerationMetadata::default())
            .unwrap();
        assert_eq!(sketch.to_data_url(), "data:image/png;base64,/9j/4AAQ");
    }

    #[test]
    fn test_generated_sketch_rejects_bad_data() {
        let err = GeneratedSketch::from_base64("%%%", GenerationMetadata::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);

        let err = GeneratedSketch::from_base64("", GenerationMetadata::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_generation_result_from_error() {
        let result = GenerationResult::from(Err(SketchError::EmptyResponse));
        assert!(!result.is_image());
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::EmptyResponse);
        assert_eq!(
            failure.message,
            "model returned neither image nor explanation, retry."
        );
    }
}

//! Turns [`SketchSettings`] into the instruction sent alongside the photo.

use crate::sketch::types::{LineWeight, SketchSettings, SketchStyle};

const PREAMBLE: &str = "Turn this image into a high-quality black and white artistic sketch. ";
const CLOSING: &str =
    "Output only the transformed image. Do not change the composition, only the style.";

const LIGHT_TONE: &str = "Tone: Light and airy, high key, lots of white space. ";
const DARK_TONE: &str = "Tone: High contrast, low key, heavy dark areas. ";

/// Darkness values below this get the light tone clause.
pub const LIGHT_THRESHOLD: u8 = 30;
/// Darkness values above this get the dark tone clause.
pub const DARK_THRESHOLD: u8 = 70;

impl SketchStyle {
    /// Prompt clause describing this style.
    pub fn prompt_clause(&self) -> &'static str {
        match self {
            Self::Pencil => {
                "Style: Graphite pencil sketch with soft shading and realistic textures. "
            }
            Self::Charcoal => {
                "Style: Charcoal drawing with deep blacks, smudged shadows, and rough textures. "
            }
            Self::Ink => "Style: High-contrast ink pen drawing with sharp, confident lines. ",
            Self::Minimalist => "Style: Minimalist continuous line art. Simple and abstract. ",
            Self::Stipple => "Style: Stippling technique (dotwork) shading. ",
            Self::Crosshatch => "Style: Classic cross-hatching shading. ",
        }
    }
}

impl LineWeight {
    /// Prompt clause describing this line weight.
    pub fn prompt_clause(&self) -> &'static str {
        match self {
            Self::Thin => "Lines: Very fine, delicate, and precise. ",
            Self::Medium => "Lines: Balanced weight. ",
            Self::Thick => "Lines: Bold, thick, and heavy strokes. ",
        }
    }
}

/// Returns the tone clause for a darkness value, if it falls outside the
/// neutral band.
pub fn tone_clause(darkness: u8) -> Option<&'static str> {
    if darkness < LIGHT_THRESHOLD {
        Some(LIGHT_TONE)
    } else if darkness > DARK_THRESHOLD {
        Some(DARK_TONE)
    } else {
        None
    }
}

/// Builds the model instruction for the given settings.
pub fn build_prompt(settings: &SketchSettings) -> String {
    let mut prompt = String::from(PREAMBLE);

    if let Some(style) = settings.style {
        prompt.push_str(style.prompt_clause());
    }
    if let Some(weight) = settings.line_weight {
        prompt.push_str(weight.prompt_clause());
    }
    if let Some(tone) = tone_clause(settings.darkness()) {
        prompt.push_str(tone);
    }

    prompt.push_str(CLOSING);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_style_adds_only_its_clause() {
        for style in SketchStyle::ALL {
            let prompt = build_prompt(&SketchSettings::default().with_style(style));
            for other in SketchStyle::ALL {
                let count = prompt.matches(other.prompt_clause()).count();
                assert_eq!(count, usize::from(other == style), "{style} vs {other}");
            }
        }
    }

    #[test]
    fn test_each_line_weight_adds_only_its_clause() {
        for weight in LineWeight::ALL {
            let prompt = build_prompt(&SketchSettings::default().with_line_weight(weight));
            for other in LineWeight::ALL {
                let count = prompt.matches(other.prompt_clause()).count();
                assert_eq!(count, usize::from(other == weight), "{weight} vs {other}");
            }
        }
    }

    #[test]
    fn test_unspecified_style_and_weight_add_nothing() {
        let mut settings = SketchSettings::default();
        settings.style = None;
        settings.line_weight = None;
        let prompt = build_prompt(&settings);
        assert!(!prompt.contains("Style:"));
        assert!(!prompt.contains("Lines:"));
        assert_eq!(prompt, format!("{PREAMBLE}{CLOSING}"));
    }

    #[test]
    fn test_tone_thresholds() {
        for darkness in [0, 15, 29] {
            let prompt = build_prompt(&SketchSettings::default().with_darkness(darkness));
            assert!(prompt.contains(LIGHT_TONE), "darkness {darkness}");
            assert!(!prompt.contains(DARK_TONE), "darkness {darkness}");
        }
        for darkness in [71, 85, 100] {
            let prompt = build_prompt(&SketchSettings::default().with_darkness(darkness));
            assert!(prompt.contains(DARK_TONE), "darkness {darkness}");
            assert!(!prompt.contains(LIGHT_TONE), "darkness {darkness}");
        }
        for darkness in [30, 50, 70] {
            let prompt = build_prompt(&SketchSettings::default().with_darkness(darkness));
            assert!(!prompt.contains("Tone:"), "darkness {darkness}");
        }
    }

    #[test]
    fn test_prompt_layout() {
        let settings = SketchSettings::new(SketchStyle::Charcoal, LineWeight::Thick, 90);
        assert_eq!(
            build_prompt(&settings),
            "Turn this image into a high-quality black and white artistic sketch. \
             Style: Charcoal drawing with deep blacks, smudged shadows, and rough textures. \
             Lines: Bold, thick, and heavy strokes. \
             Tone: High contrast, low key, heavy dark areas. \
             Output only the transformed image. Do not change the composition, only the style."
        );
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let settings = SketchSettings::new(SketchStyle::Stipple, LineWeight::Thin, 10);
        assert_eq!(build_prompt(&settings), build_prompt(&settings));
    }
}

//! Sketch a photo with every style and save each result.
//!
//! Run with: `cargo run --example sketch_photo -- <photo.jpg>`
//!
//! Requires `API_KEY` or `GOOGLE_API_KEY` environment variable.

use sketchai::{GenerationResult, ImagePayload, LineWeight, SketchClient, SketchSettings, SketchStyle};

#[tokio::main]
async fn main() -> sketchai::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: sketch_photo <photo.jpg>");

    let photo = std::fs::read(&input_path)?;
    let data_url = ImagePayload::from_bytes(&photo).to_data_url();

    let client = SketchClient::builder().build()?;

    for style in SketchStyle::ALL {
        let settings = SketchSettings::new(style, LineWeight::Medium, 50);
        match client.generate(&data_url, &settings).await {
            GenerationResult::Image(sketch) => {
                let filename = format!("sketch-{style}.png");
                sketch.save(&filename)?;
                println!("{style}: saved to {filename} ({} bytes)", sketch.size());
            }
            GenerationResult::Failure(failure) => {
                println!("{style}: {} ({})", failure.message, failure.kind);
            }
        }
    }

    Ok(())
}

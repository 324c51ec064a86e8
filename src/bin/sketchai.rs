//! CLI for SketchAI - turn photos into sketches.

use clap::{Args, Parser, Subcommand};
use sketchai::{
    GenerationResult, ImagePayload, LineWeight, SketchClient, SketchModel, SketchSettings,
    SketchStyle,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sketchai")]
#[command(about = "Turn photos into black-and-white artistic sketches via generative image models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log request and retry details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a photo into a sketch
    Sketch(SketchArgs),

    /// List available styles and line weights
    Styles,
}

#[derive(Args)]
struct SketchArgs {
    /// Path to the input photo
    input: PathBuf,

    /// Output file path (defaults to sketch-ai-<timestamp>.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sketch style: pencil, charcoal, ink, minimalist, stipple, crosshatch
    #[arg(short, long, default_value = "pencil", value_parser = SketchStyle::from_str)]
    style: SketchStyle,

    /// Line weight: thin, medium, thick
    #[arg(short, long, default_value = "medium", value_parser = LineWeight::from_str)]
    line_weight: LineWeight,

    /// Darkness, 0 (light) to 100 (dark)
    #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    darkness: u8,

    /// Model identifier (overrides SKETCHAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Gemini-compatible gateway base URL (overrides SKETCHAI_GATEWAY_URL)
    #[arg(long)]
    gateway: Option<String>,

    /// Extra request header as NAME=VALUE (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE")]
    headers: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Sketch(args) => {
            generate_sketch(args, cli.json).await?;
        }
        Commands::Styles => {
            list_styles(cli.json)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sketchai=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_header(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| anyhow::anyhow!("header must be NAME=VALUE, got {raw:?}"))
}

fn default_output_path() -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    PathBuf::from(format!("sketch-ai-{millis}.png"))
}

async fn generate_sketch(args: SketchArgs, json_output: bool) -> anyhow::Result<()> {
    let mut builder = SketchClient::builder();
    if let Some(model) = &args.model {
        builder = builder.model(SketchModel::from_id(model));
    }
    if let Some(gateway) = &args.gateway {
        builder = builder.gateway(gateway);
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        builder = builder.header(name, value);
    }
    let client = builder.build()?;

    let payload = ImagePayload::from_file(&args.input)?;
    let settings = SketchSettings::new(args.style, args.line_weight, args.darkness);

    let output = args.output.unwrap_or_else(default_output_path);

    let result: GenerationResult = client.generate_from_payload(payload, &settings).await.into();
    let sketch = match result {
        GenerationResult::Image(sketch) => sketch,
        GenerationResult::Failure(failure) => {
            if json_output {
                let result = serde_json::json!({
                    "success": false,
                    "kind": failure.kind.as_str(),
                    "message": failure.message,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                eprintln!("Error: {}", failure.message);
            }
            std::process::exit(1);
        }
    };

    sketch.save(&output)?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "output": output.display().to_string(),
            "size_bytes": sketch.size(),
            "format": sketch.detected_format().map(|f| f.extension()),
            "style": settings.style.map(|s| s.as_str()),
            "line_weight": settings.line_weight.map(|w| w.as_str()),
            "darkness": settings.darkness(),
            "model": sketch.metadata.model,
            "attempts": sketch.metadata.attempts,
            "duration_ms": sketch.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let format = sketch.detected_format().map_or("unknown", |f| f.extension());
        println!(
            "Generated sketch: {} ({} bytes, {})",
            output.display(),
            sketch.size(),
            format
        );
        if let Some(duration) = sketch.metadata.duration_ms {
            println!("Duration: {}ms ({} attempt(s))", duration, sketch.metadata.attempts);
        }
    }

    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct OptionInfo {
        id: &'static str,
        label: &'static str,
    }

    let styles: Vec<OptionInfo> = SketchStyle::ALL
        .iter()
        .map(|s| OptionInfo {
            id: s.as_str(),
            label: s.label(),
        })
        .collect();
    let weights: Vec<OptionInfo> = LineWeight::ALL
        .iter()
        .map(|w| OptionInfo {
            id: w.as_str(),
            label: w.label(),
        })
        .collect();

    if json_output {
        let result = serde_json::json!({ "styles": styles, "line_weights": weights });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("STYLES:");
        for s in &styles {
            println!("  {:<12} {}", s.id, s.label);
        }
        println!("\nLINE WEIGHTS:");
        for w in &weights {
            println!("  {:<12} {}", w.id, w.label);
        }
        println!("\nDarkness: 0-100 (below 30 light, above 70 high contrast)");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sketch_args_parse_through_library_enums() {
        let cli = Cli::try_parse_from([
            "sketchai", "sketch", "photo.jpg", "--style", "Charcoal", "-l", "thick", "-d", "80",
        ])
        .unwrap();
        let Commands::Sketch(args) = cli.command else {
            panic!("expected sketch command");
        };
        assert_eq!(args.style, SketchStyle::Charcoal);
        assert_eq!(args.line_weight, LineWeight::Thick);
        assert_eq!(args.darkness, 80);
    }

    #[test]
    fn test_sketch_args_defaults_and_rejections() {
        let cli = Cli::try_parse_from(["sketchai", "sketch", "photo.jpg"]).unwrap();
        let Commands::Sketch(args) = cli.command else {
            panic!("expected sketch command");
        };
        assert_eq!(args.style, SketchStyle::Pencil);
        assert_eq!(args.line_weight, LineWeight::Medium);
        assert_eq!(args.darkness, 50);

        assert!(Cli::try_parse_from(["sketchai", "sketch", "p.jpg", "-s", "watercolor"]).is_err());
        assert!(Cli::try_parse_from(["sketchai", "sketch", "p.jpg", "-d", "101"]).is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header("X-Token = abc").unwrap(), ("X-Token", "abc"));
        assert!(parse_header("=abc").is_err());
        assert!(parse_header("missing").is_err());
    }
}

use anyhow::Context;
use clap::Parser;
use image::ImageReader;
use std::path::{Path, PathBuf};

use carcount::{DetectionParams, ParamOverrides, PipelineOutput, VehicleDetector};

#[derive(Parser)]
#[command(name = "carcount")]
#[command(about = "Detect and count vehicles in a still image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with parameter overrides
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Override a single parameter, e.g. --set block_size=31
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Write the resolved parameters to a JSON file
    #[arg(long, value_name = "FILE")]
    save_params: Option<PathBuf>,

    /// Save the annotated result image
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save every pipeline step to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn load_overrides(args: &Cli) -> anyhow::Result<Option<ParamOverrides>> {
    let mut overrides = match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read parameter file {}", path.display()))?;
            let parsed: ParamOverrides = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse parameter file {}", path.display()))?;
            Some(parsed)
        }
        None => None,
    };

    for assignment in &args.overrides {
        overrides
            .get_or_insert_with(ParamOverrides::default)
            .parse_assignment(assignment)?;
    }

    Ok(overrides)
}

fn save_params(path: &Path, params: &DetectionParams) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(params)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write parameter file {}", path.display()))?;
    tracing::info!("Saved parameters to {}", path.display());
    Ok(())
}

fn prepare_debug_dir(dir: &Path) -> anyhow::Result<()> {
    // Check if directory exists and is empty
    if dir.exists() {
        let entries = std::fs::read_dir(dir)?;
        if entries.count() > 0 {
            anyhow::bail!("Debug directory is not empty: {}", dir.display());
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn save_steps(dir: &Path, output: &PipelineOutput) -> anyhow::Result<()> {
    for (idx, step) in output.steps.iter().enumerate() {
        let filename = format!(
            "{:02}_{}.png",
            idx,
            step.name.to_lowercase().replace(' ', "_")
        );
        let path = dir.join(&filename);
        step.image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image {}: {}", path.display(), e))?;
        tracing::debug!("saved {}", filename);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    tracing::info!("Loading image: {:?}", args.image_path);
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    tracing::info!("Image loaded: {}x{}", img.width(), img.height());

    let overrides = load_overrides(&args)?;
    let detector = VehicleDetector::from_overrides(overrides.as_ref());

    if let Some(path) = &args.save_params {
        save_params(path, &detector.params)?;
    }
    if let Some(dir) = &args.debug_out {
        prepare_debug_dir(dir)?;
    }

    let output = detector.detect(&img)?;

    if let Some(dir) = &args.debug_out {
        save_steps(dir, &output)?;
    }
    if let Some(path) = &args.output {
        if let Some(result) = output.final_image() {
            result
                .save(path)
                .map_err(|e| anyhow::anyhow!("Failed to save result image: {}", e))?;
        }
    }

    println!("\n=== Vehicle Detection Results ===");
    for (i, description) in output.descriptions().iter().enumerate() {
        println!("  [{}] {}", i, description);
    }

    if args.verbose && !output.components.is_empty() {
        println!("\nComponents:");
        for (component, label) in output.components.iter().zip(&output.classifications) {
            println!(
                "  #{} {} at ({}, {}) {}x{} area={} aspect={:.2} extent={:.2} compactness={:.3}",
                component.label,
                label,
                component.bbox.x,
                component.bbox.y,
                component.width(),
                component.height(),
                component.area,
                component.aspect_ratio(),
                component.extent(),
                component.compactness(),
            );
        }
    }

    println!("\nTotal vehicles detected: {}", output.vehicle_count);

    Ok(())
}

use carcount::detection::steps::*;
use carcount::{DetectionParams, ParameterMode, Pipeline, VehicleDetector};
use image::ImageReader;
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image_path>", args[0]);
        std::process::exit(1);
    }

    let img = ImageReader::open(&args[1])?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    println!("Loaded image: {}x{}", img.width(), img.height());

    // Example 1: standard detector with default parameters
    println!("\n=== Standard Detection Pipeline ===");
    let output = VehicleDetector::default().detect(&img)?;
    for (i, description) in output.descriptions().iter().enumerate() {
        println!("  [{}] {}", i, description);
    }
    println!("Vehicles: {}", output.vehicle_count);

    // Example 2: hand-built pipeline that accepts smaller, boxier blobs
    println!("\n=== Custom Pipeline (small vehicles) ===");
    let params = DetectionParams {
        min_area: 300,
        min_width: 10,
        extent_threshold: 0.3,
        ..DetectionParams::default()
    };
    let custom = Pipeline::new()
        .with_mode(ParameterMode::Manual)
        .add_step_boxed(Box::new(GrayscaleStep))
        .add_step_boxed(Box::new(SmoothingStep))
        .add_step_boxed(Box::new(ThresholdStep {
            block_size: 31,
            c_value: 3,
        }))
        .add_step_boxed(Box::new(OpeningStep {
            kernel: 3,
            iterations: 1,
        }))
        .add_step_boxed(Box::new(ClosingStep {
            kernel_w: 11,
            kernel_h: 5,
        }))
        .add_step_boxed(Box::new(LabelingStep))
        .add_step_boxed(Box::new(ClassificationStep { params }))
        .add_step_boxed(Box::new(AnnotationStep));
    let custom_output = custom.run(&img)?;
    println!("Custom pipeline found {} vehicles", custom_output.vehicle_count);

    // Example 3: stop after thresholding to inspect the binary raster
    println!("\n=== Partial Pipeline (stop after threshold) ===");
    let partial = VehicleDetector::default().pipeline().run_partial(&img, 3)?;
    if let Some(last) = partial.steps.last() {
        println!("  {}: {}x{} image", last.name, last.image.width(), last.image.height());
        // last.image.save("debug_threshold.png")?;
    }

    Ok(())
}

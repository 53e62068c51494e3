mod common;

use common::*;
use std::collections::HashMap;

#[test]
fn test_defaults_without_overrides() {
    let params = DetectionParams::resolve(None);
    assert_eq!(params, DetectionParams::default());
    assert_eq!(params.block_size, 25);
    assert_eq!(params.c_value, 2);
    assert_eq!(params.min_area, 800);
    assert_eq!(params.max_area, 60000);
}

#[test]
fn test_block_size_clamped_to_upper_bound() {
    let overrides = ParamOverrides::new().with("block_size", 60.0);
    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.block_size, 51);
}

#[test]
fn test_even_block_size_made_odd() {
    let overrides = ParamOverrides::new().with("block_size", 20.0);
    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.block_size % 2, 1);
    assert!((3..=51).contains(&params.block_size));
    assert_eq!(params.block_size, 21);
}

#[test]
fn test_small_block_size_clamped() {
    for raw in [-10.0, 0.0, 1.0, 2.0] {
        let overrides = ParamOverrides::new().with("block_size", raw);
        let params = DetectionParams::resolve(Some(&overrides));
        assert_eq!(params.block_size, 3, "block_size {}", raw);
    }
}

#[test]
fn test_inverted_area_range_repaired_before_clamping() {
    let overrides = ParamOverrides::new()
        .with("min_area", 90000.0)
        .with("max_area", 50000.0);
    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.max_area, 50000);
    assert_eq!(params.min_area, params.max_area / 2);
    assert!(params.min_area < params.max_area);
}

#[test]
fn test_area_range_always_ordered() {
    let cases = [
        (0.0, 0.0),
        (100.0, 100.0),
        (5000.0, 5100.0),
        (-50.0, -10.0),
        (1e12, 1e13),
        (f64::NAN, f64::NAN),
    ];
    for (min_area, max_area) in cases {
        let overrides = ParamOverrides::new()
            .with("min_area", min_area)
            .with("max_area", max_area);
        let params = DetectionParams::resolve(Some(&overrides));
        assert!(params.min_area >= 100);
        assert!(
            params.min_area < params.max_area,
            "{} !< {} for ({}, {})",
            params.min_area,
            params.max_area,
            min_area,
            max_area
        );
    }
}

#[test]
fn test_max_area_keeps_margin_over_min_area() {
    let overrides = ParamOverrides::new()
        .with("min_area", 5000.0)
        .with("max_area", 5100.0);
    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.min_area, 5000);
    assert_eq!(params.max_area, 6000);
}

#[test]
fn test_ranges_clamped() {
    let overrides = ParamOverrides::new()
        .with("c_value", 50.0)
        .with("open_kernel", 0.0)
        .with("open_iterations", 9.0)
        .with("close_kernel_w", 100.0)
        .with("close_kernel_h", 1.0)
        .with("min_width", 2.0)
        .with("max_width", 5.0)
        .with("extent_threshold", 3.0);
    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.c_value, 10);
    assert_eq!(params.open_kernel, 1);
    assert_eq!(params.open_iterations, 2);
    assert_eq!(params.close_kernel_w, 25);
    assert_eq!(params.close_kernel_h, 2);
    assert_eq!(params.min_width, 10);
    assert_eq!(params.max_width, 20);
    assert_eq!(params.extent_threshold, 1.0);
}

#[test]
fn test_aspect_range_repaired() {
    let overrides = ParamOverrides::new()
        .with("min_aspect", 3.0)
        .with("max_aspect", 1.0);
    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.min_aspect, 3.0);
    assert!((params.max_aspect - 3.1).abs() < 1e-9);

    let overrides = ParamOverrides::new()
        .with("min_aspect", f64::NAN)
        .with("max_aspect", 50.0);
    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.min_aspect, 0.1);
    assert_eq!(params.max_aspect, 10.0);
}

#[test]
fn test_unknown_keys_ignored() {
    let mut overrides = ParamOverrides::new();
    assert!(!overrides.set("sigma", 4.0));
    assert!(overrides.set("c_value", 4.0));

    let mut map = HashMap::new();
    map.insert("no_such_key".to_string(), 1.0);
    map.insert("min_width".to_string(), 30.0);
    let from_map = ParamOverrides::from_map(&map);
    assert_eq!(from_map.min_width, Some(30.0));

    let params = DetectionParams::resolve(Some(&from_map));
    assert_eq!(params.min_width, 30);
    assert_eq!(params.block_size, 25);
}

#[test]
fn test_integer_parameters_rounded() {
    let overrides = ParamOverrides::new().with("c_value", 3.6);
    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.c_value, 4);
}

#[test]
fn test_overrides_from_json_ignore_unknown_keys() -> anyhow::Result<()> {
    let overrides: ParamOverrides =
        serde_json::from_str(r#"{"block_size": 60, "min_aspect": 0.5, "theme": 3}"#)?;
    assert_eq!(overrides.block_size, Some(60.0));
    assert_eq!(overrides.min_aspect, Some(0.5));

    let params = DetectionParams::resolve(Some(&overrides));
    assert_eq!(params.block_size, 51);
    assert_eq!(params.min_aspect, 0.5);
    Ok(())
}

#[test]
fn test_resolved_params_round_trip_through_file() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("params.json");

    let params = DetectionParams::resolve(Some(&ParamOverrides::new().with("max_width", 400.0)));
    std::fs::write(&path, serde_json::to_string_pretty(&params)?)?;

    let loaded: DetectionParams = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(loaded, params);
    assert_eq!(loaded.max_width, 400);
    Ok(())
}

#[test]
fn test_parse_assignment() -> anyhow::Result<()> {
    let mut overrides = ParamOverrides::new();
    assert!(overrides.parse_assignment("close_kernel_w = 11")?);
    assert!(!overrides.parse_assignment("unknown=1")?);
    assert!(overrides.parse_assignment("missing-equals").is_err());
    assert!(overrides.parse_assignment("c_value=abc").is_err());
    assert_eq!(overrides.close_kernel_w, Some(11.0));
    Ok(())
}

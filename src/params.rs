//! Detection parameters: defaults, caller overrides and range clamping.
//!
//! Resolution never fails. Out-of-range or malformed values are pulled back
//! into their valid range so a run always has a usable parameter set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed lower bound on component height (not tunable)
pub const MIN_HEIGHT: u32 = 15;
/// Fixed upper bound on component height (not tunable)
pub const MAX_HEIGHT: u32 = 250;

const MAX_VALUE: i64 = u32::MAX as i64;

/// Resolved parameter set used by every stage of one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Adaptive threshold neighbourhood, odd, in [3, 51]
    pub block_size: u32,
    /// Offset subtracted from the local mean, in [1, 10]
    pub c_value: u32,
    pub open_kernel: u32,
    pub open_iterations: u32,
    pub close_kernel_w: u32,
    pub close_kernel_h: u32,
    pub min_area: u32,
    pub max_area: u32,
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub min_width: u32,
    pub max_width: u32,
    pub extent_threshold: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            block_size: 25,
            c_value: 2,
            open_kernel: 2,
            open_iterations: 1,
            close_kernel_w: 15,
            close_kernel_h: 6,
            min_area: 800,
            max_area: 60000,
            min_aspect: 0.2,
            max_aspect: 5.0,
            min_width: 20,
            max_width: 350,
            extent_threshold: 0.2,
        }
    }
}

impl DetectionParams {
    /// Overlay `overrides` onto the defaults and clamp the result
    pub fn resolve(overrides: Option<&ParamOverrides>) -> Self {
        let defaults = Self::default();
        let o = overrides.cloned().unwrap_or_default();

        let int = |v: Option<f64>, default: u32| -> i64 {
            match v {
                // saturating cast, NaN becomes 0
                Some(v) => v.round() as i64,
                None => default as i64,
            }
        };
        let float = |v: Option<f64>, default: f64| -> f64 { v.unwrap_or(default) };

        let block_size = int(o.block_size, defaults.block_size);
        let c_value = int(o.c_value, defaults.c_value);
        let open_kernel = int(o.open_kernel, defaults.open_kernel);
        let open_iterations = int(o.open_iterations, defaults.open_iterations);
        let close_kernel_w = int(o.close_kernel_w, defaults.close_kernel_w);
        let close_kernel_h = int(o.close_kernel_h, defaults.close_kernel_h);
        let mut min_area = int(o.min_area, defaults.min_area);
        let max_area = int(o.max_area, defaults.max_area);
        let min_aspect = float(o.min_aspect, defaults.min_aspect);
        let max_aspect = float(o.max_aspect, defaults.max_aspect);
        let min_width = int(o.min_width, defaults.min_width);
        let max_width = int(o.max_width, defaults.max_width);
        let extent_threshold = float(o.extent_threshold, defaults.extent_threshold);

        // Area ordering is repaired on the raw values, before clamping
        if min_area >= max_area {
            min_area = max_area.div_euclid(2);
        }

        let c_value = c_value.clamp(1, 10);
        let open_kernel = open_kernel.clamp(1, 5);
        let open_iterations = open_iterations.clamp(1, 2);
        let close_kernel_w = close_kernel_w.clamp(3, 25);
        let close_kernel_h = close_kernel_h.clamp(2, 12);

        let min_area = min_area.clamp(100, MAX_VALUE - 1000);
        let max_area = max_area.max(min_area + 1000).min(MAX_VALUE);

        // f64::max/min drop NaN in favour of the bound
        let min_aspect = min_aspect.max(0.1).min(10.0);
        let max_aspect = max_aspect.min(10.0).max(min_aspect + 0.1);

        let min_width = min_width.clamp(10, MAX_VALUE - 10);
        let max_width = max_width.max(min_width + 10).min(MAX_VALUE);

        let extent_threshold = extent_threshold.max(0.1).min(1.0);

        let mut block_size = block_size.clamp(3, 51);
        if block_size % 2 == 0 {
            block_size += 1;
        }

        Self {
            block_size: block_size as u32,
            c_value: c_value as u32,
            open_kernel: open_kernel as u32,
            open_iterations: open_iterations as u32,
            close_kernel_w: close_kernel_w as u32,
            close_kernel_h: close_kernel_h as u32,
            min_area: min_area as u32,
            max_area: max_area as u32,
            min_aspect,
            max_aspect,
            min_width: min_width as u32,
            max_width: max_width as u32,
            extent_threshold,
        }
    }
}

/// Partial, unvalidated parameter mapping supplied by a caller.
///
/// Every value is numeric; integer parameters are rounded during
/// resolution. Unknown keys are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOverrides {
    pub block_size: Option<f64>,
    pub c_value: Option<f64>,
    pub open_kernel: Option<f64>,
    pub open_iterations: Option<f64>,
    pub close_kernel_w: Option<f64>,
    pub close_kernel_h: Option<f64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub min_aspect: Option<f64>,
    pub max_aspect: Option<f64>,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub extent_threshold: Option<f64>,
}

impl ParamOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`ParamOverrides::set`]
    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.set(key, value);
        self
    }

    /// Set one override by key. Returns `false` for unknown keys.
    pub fn set(&mut self, key: &str, value: f64) -> bool {
        let slot = match key {
            "block_size" => &mut self.block_size,
            "c_value" => &mut self.c_value,
            "open_kernel" => &mut self.open_kernel,
            "open_iterations" => &mut self.open_iterations,
            "close_kernel_w" => &mut self.close_kernel_w,
            "close_kernel_h" => &mut self.close_kernel_h,
            "min_area" => &mut self.min_area,
            "max_area" => &mut self.max_area,
            "min_aspect" => &mut self.min_aspect,
            "max_aspect" => &mut self.max_aspect,
            "min_width" => &mut self.min_width,
            "max_width" => &mut self.max_width,
            "extent_threshold" => &mut self.extent_threshold,
            _ => {
                tracing::warn!(key, "ignoring unknown parameter");
                return false;
            }
        };
        *slot = Some(value);
        true
    }

    /// Build overrides from a key/value mapping, skipping unknown keys
    pub fn from_map(map: &HashMap<String, f64>) -> Self {
        let mut overrides = Self::default();
        for (key, value) in map {
            overrides.set(key, *value);
        }
        overrides
    }

    /// Parse a `key=value` pair as given on the command line
    pub fn parse_assignment(&mut self, assignment: &str) -> anyhow::Result<bool> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{}'", assignment))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for '{}': {}", key.trim(), e))?;
        Ok(self.set(key.trim(), value))
    }
}

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::BTreeMap;

use crate::models::{BoundingBox, Component};

/// Label image produced by connected-component labelling
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Connected components of a binary raster
#[derive(Debug, Clone)]
pub struct Labeling {
    /// Per-pixel label, 0 for background, renumbered to match `components`
    pub labels: LabelImage,
    /// Components indexed 1..N by their `label`
    pub components: Vec<Component>,
}

impl Labeling {
    pub fn count(&self) -> usize {
        self.components.len()
    }
}

#[derive(Clone, Copy)]
struct RegionStats {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    count: u32,
    sum_x: u64,
    sum_y: u64,
}

/// Find 8-connected foreground regions and measure each one in a single pass
pub fn find_components(binary: &GrayImage) -> Labeling {
    // Label connected components (non-zero pixels = foreground)
    let mut labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));

    // BTreeMap keeps component order deterministic
    let mut regions: BTreeMap<u32, RegionStats> = BTreeMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }

        regions
            .entry(label_val)
            .and_modify(|r| {
                r.min_x = r.min_x.min(x);
                r.min_y = r.min_y.min(y);
                r.max_x = r.max_x.max(x);
                r.max_y = r.max_y.max(y);
                r.count += 1;
                r.sum_x += x as u64;
                r.sum_y += y as u64;
            })
            .or_insert(RegionStats {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                count: 1,
                sum_x: x as u64,
                sum_y: y as u64,
            });
    }

    let mut renumber = BTreeMap::new();
    let components: Vec<Component> = regions
        .into_iter()
        .enumerate()
        .map(|(idx, (raw, r))| {
            let label = idx as u32 + 1;
            renumber.insert(raw, label);
            let bbox = BoundingBox {
                x: r.min_x,
                y: r.min_y,
                width: r.max_x - r.min_x + 1,
                height: r.max_y - r.min_y + 1,
            };
            let centroid = (
                r.sum_x as f64 / r.count as f64,
                r.sum_y as f64 / r.count as f64,
            );
            Component::new(label, bbox, r.count, centroid)
        })
        .collect();

    for pixel in labels.pixels_mut() {
        if pixel[0] != 0 {
            pixel[0] = renumber[&pixel[0]];
        }
    }

    Labeling { labels, components }
}

/// Colour each label with a distinct hue, background black
pub fn visualize_labels(labels: &LabelImage) -> RgbImage {
    let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0);
    let (width, height) = labels.dimensions();
    if max_label == 0 {
        return RgbImage::new(width, height);
    }

    RgbImage::from_fn(width, height, |x, y| {
        let label = labels.get_pixel(x, y)[0];
        // Hue in [0, 179], half-degree units
        let hue = (179u64 * label as u64 / max_label as u64) as u8;
        if hue == 0 {
            Rgb([0, 0, 0])
        } else {
            hue_to_rgb(hue)
        }
    })
}

/// Fully saturated, full value colour for a hue given in half-degrees
fn hue_to_rgb(hue: u8) -> Rgb<u8> {
    let h = hue as f32 * 2.0 / 60.0;
    let sector = h.floor() as u32 % 6;
    let f = h - h.floor();
    let rising = (255.0 * f).round() as u8;
    let falling = (255.0 * (1.0 - f)).round() as u8;
    match sector {
        0 => Rgb([255, rising, 0]),
        1 => Rgb([falling, 255, 0]),
        2 => Rgb([0, 255, rising]),
        3 => Rgb([0, falling, 255]),
        4 => Rgb([rising, 0, 255]),
        _ => Rgb([255, 0, falling]),
    }
}

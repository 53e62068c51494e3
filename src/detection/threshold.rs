use image::{GrayImage, Luma};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Majority share of foreground above which a binary raster is inverted
pub const POLARITY_RATIO: f64 = 0.5;

/// Outcome of polarity correction
#[derive(Debug, Clone)]
pub struct Polarity {
    pub binary: GrayImage,
    /// Foreground share measured before correction
    pub foreground_ratio: f64,
    pub inverted: bool,
}

/// Local mean over a `block_size × block_size` window with replicated borders
pub fn local_mean(img: &GrayImage, block_size: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let radius = (block_size / 2) as i64;
    let area = (block_size as u64) * (block_size as u64);

    // Horizontal window sums
    let mut row_sums = vec![0u32; (width as usize) * (height as usize)];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u32;
            for dx in -radius..=radius {
                let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
                sum += img.get_pixel(sx, y)[0] as u32;
            }
            row_sums[(y * width + x) as usize] = sum;
        }
    }

    let mut mean = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u64;
            for dy in -radius..=radius {
                let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
                sum += row_sums[(sy * width + x) as usize] as u64;
            }
            let rounded = (sum + area / 2) / area;
            mean.put_pixel(x, y, Luma([rounded.min(255) as u8]));
        }
    }

    mean
}

/// Mean-based adaptive threshold.
///
/// A pixel is foreground when its intensity exceeds the local mean minus
/// `c_value`.
pub fn adaptive_threshold_mean(img: &GrayImage, block_size: u32, c_value: u32) -> GrayImage {
    let mean = local_mean(img, block_size);
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let value = img.get_pixel(x, y)[0] as i32;
        let threshold = mean.get_pixel(x, y)[0] as i32 - c_value as i32;
        if value > threshold {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Share of foreground pixels in a binary raster
pub fn foreground_ratio(binary: &GrayImage) -> f64 {
    let total = binary.width() as u64 * binary.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let foreground = binary.pixels().filter(|p| p[0] == FOREGROUND).count() as u64;
    foreground as f64 / total as f64
}

/// Invert a binary raster
pub fn invert(binary: &GrayImage) -> GrayImage {
    let mut inverted = binary.clone();
    image::imageops::invert(&mut inverted);
    inverted
}

/// Make objects of interest the minority class.
///
/// Vehicles are assumed to cover less than half of the frame, so a raster
/// that is mostly foreground is inverted.
pub fn correct_polarity(binary: GrayImage) -> Polarity {
    let foreground_ratio = foreground_ratio(&binary);
    if foreground_ratio > POLARITY_RATIO {
        Polarity {
            binary: invert(&binary),
            foreground_ratio,
            inverted: true,
        }
    } else {
        Polarity {
            binary,
            foreground_ratio,
            inverted: false,
        }
    }
}

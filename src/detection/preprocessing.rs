use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_colors;

/// Neighbourhood diameter of the bilateral filter
pub const BILATERAL_DIAMETER: u32 = 9;
pub const BILATERAL_SIGMA_COLOR: f32 = 50.0;
pub const BILATERAL_SIGMA_SPACE: f32 = 50.0;

/// Taps of the residual-noise Gaussian
pub const GAUSSIAN_TAPS: usize = 5;
pub const GAUSSIAN_SIGMA: f32 = 1.0;

/// BT.601 luma weights in 14-bit fixed point (R, G, B), summing to 1 << 14
const LUMA_WEIGHTS: [u32; 3] = [4899, 9617, 1868];
const LUMA_SHIFT: u32 = 14;

/// Convert image to grayscale with BT.601 weights, rounded to nearest.
///
/// Alpha is discarded; gray input passes through unchanged.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    map_colors(&rgb, |p| {
        let weighted = p[0] as u32 * LUMA_WEIGHTS[0]
            + p[1] as u32 * LUMA_WEIGHTS[1]
            + p[2] as u32 * LUMA_WEIGHTS[2];
        Luma([((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8])
    })
}

/// Edge-preserving bilateral filter.
///
/// Each output pixel is the average of its circular neighbourhood weighted
/// by a spatial Gaussian and by a Gaussian on the intensity difference, so
/// flat regions are smoothed while strong edges keep their contrast.
/// Borders are handled by reflection without repeating the edge pixel.
pub fn bilateral_filter(img: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let radius = (diameter / 2) as i64;
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    let mut window = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r = ((dx * dx + dy * dy) as f32).sqrt();
            if r > radius as f32 {
                continue;
            }
            window.push((dx, dy, (r * r * space_coeff).exp()));
        }
    }

    let color_weight: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let center = img.get_pixel(x, y)[0];
            let mut sum = 0.0f32;
            let mut weight_sum = 0.0f32;

            for &(dx, dy, space_weight) in &window {
                let sx = reflect_101(x as i64 + dx, width);
                let sy = reflect_101(y as i64 + dy, height);
                let value = img.get_pixel(sx, sy)[0];
                let w = space_weight * color_weight[center.abs_diff(value) as usize];
                sum += w * value as f32;
                weight_sum += w;
            }

            let filtered = (sum / weight_sum).round().clamp(0.0, 255.0) as u8;
            out.put_pixel(x, y, Luma([filtered]));
        }
    }

    out
}

/// Normalised 1-D Gaussian kernel with `taps` coefficients
pub fn gaussian_kernel(taps: usize, sigma: f32) -> Vec<f32> {
    let center = (taps / 2) as f32;
    let raw: Vec<f32> = (0..taps)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = raw.iter().sum();
    raw.into_iter().map(|k| k / total).collect()
}

/// Apply a small separable Gaussian blur to reduce residual noise.
///
/// Both passes run in `f32` and the result is rounded once, so gradients
/// are not biased downwards. Borders replicate the edge pixel.
pub fn apply_blur(img: &GrayImage, taps: usize, sigma: f32) -> GrayImage {
    let kernel = gaussian_kernel(taps, sigma);
    let float: ImageBuffer<Luma<f32>, Vec<f32>> = map_colors(img, |p| Luma([p[0] as f32]));
    let blurred = separable_filter_equal(&float, &kernel);
    map_colors(&blurred, |p| Luma([p[0].round().clamp(0.0, 255.0) as u8]))
}

/// Bilateral filter followed by the residual Gaussian
pub fn smooth(img: &GrayImage) -> GrayImage {
    let bilateral = bilateral_filter(img, BILATERAL_DIAMETER, BILATERAL_SIGMA_COLOR, BILATERAL_SIGMA_SPACE);
    apply_blur(&bilateral, GAUSSIAN_TAPS, GAUSSIAN_SIGMA)
}

/// Mirror an out-of-range coordinate back into `[0, len)` without repeating the edge
pub fn reflect_101(mut i: i64, len: u32) -> u32 {
    let n = len as i64;
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as u32;
        }
    }
}

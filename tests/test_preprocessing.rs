mod common;

use carcount::detection::preprocessing::{
    apply_blur, bilateral_filter, gaussian_kernel, reflect_101, smooth, to_grayscale,
    BILATERAL_DIAMETER, BILATERAL_SIGMA_COLOR, BILATERAL_SIGMA_SPACE, GAUSSIAN_SIGMA,
    GAUSSIAN_TAPS,
};
use common::*;
use image::{DynamicImage, GrayImage, Luma, Rgb, Rgba, RgbaImage};

fn bilateral(img: &GrayImage) -> GrayImage {
    bilateral_filter(img, BILATERAL_DIAMETER, BILATERAL_SIGMA_COLOR, BILATERAL_SIGMA_SPACE)
}

#[test]
fn test_grayscale_uses_bt601_weights() {
    let red = DynamicImage::ImageRgb8(blank_image(3, 3, Rgb([200, 30, 30])));
    assert!(to_grayscale(&red).pixels().all(|p| p[0] == 81));

    let green = DynamicImage::ImageRgb8(blank_image(1, 1, Rgb([0, 255, 0])));
    assert_eq!(to_grayscale(&green).get_pixel(0, 0)[0], 150);

    let blue = DynamicImage::ImageRgb8(blank_image(1, 1, Rgb([0, 0, 255])));
    assert_eq!(to_grayscale(&blue).get_pixel(0, 0)[0], 29);
}

#[test]
fn test_grayscale_keeps_neutral_values() {
    let gray = DynamicImage::ImageLuma8(GrayImage::from_fn(16, 1, |x, _| Luma([(x * 17) as u8])));
    let converted = to_grayscale(&gray);
    for x in 0..16 {
        assert_eq!(converted.get_pixel(x, 0)[0], (x * 17) as u8);
    }

    // Alpha does not take part in the conversion
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 0])));
    assert!(to_grayscale(&rgba).pixels().all(|p| p[0] == 100));
}

#[test]
fn test_reflect_101_small_lengths() {
    // Single pixel: everything maps onto it
    for i in -5..=5 {
        assert_eq!(reflect_101(i, 1), 0);
    }

    // Two pixels: mirror without repeating the edge
    assert_eq!(reflect_101(-1, 2), 1);
    assert_eq!(reflect_101(2, 2), 0);
    assert_eq!(reflect_101(3, 2), 1);
    assert_eq!(reflect_101(-4, 2), 0);

    assert_eq!(reflect_101(-1, 5), 1);
    assert_eq!(reflect_101(-4, 5), 4);
    assert_eq!(reflect_101(5, 5), 3);
    assert_eq!(reflect_101(8, 5), 0);
    assert_eq!(reflect_101(3, 5), 3);
}

#[test]
fn test_bilateral_on_tiny_images() {
    let single = GrayImage::from_pixel(1, 1, Luma([42]));
    assert_eq!(bilateral(&single), single);

    let pair = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 10 } else { 200 }]));
    let filtered = bilateral(&pair);
    assert_eq!(filtered.dimensions(), (2, 1));
    // A contrast of 190 gets almost no colour weight
    assert_eq!(filtered.get_pixel(0, 0)[0], 10);
    assert_eq!(filtered.get_pixel(1, 0)[0], 200);
}

#[test]
fn test_bilateral_keeps_step_edge() {
    let step = GrayImage::from_fn(30, 20, |x, _| Luma([if x < 15 { 20 } else { 200 }]));
    let filtered = bilateral(&step);

    for y in 0..20 {
        assert_eq!(filtered.get_pixel(14, y)[0], 20);
        assert_eq!(filtered.get_pixel(15, y)[0], 200);
    }

    // A plain Gaussian blurs the same edge
    let blurred = apply_blur(&step, GAUSSIAN_TAPS, GAUSSIAN_SIGMA);
    assert!(blurred.get_pixel(14, 10)[0] > 20);
    assert!(blurred.get_pixel(15, 10)[0] < 200);
}

#[test]
fn test_bilateral_reduces_flat_noise() {
    // Checkerboard of +-5 around 100
    let noisy = GrayImage::from_fn(30, 30, |x, y| Luma([if (x + y) % 2 == 0 { 95 } else { 105 }]));
    let filtered = bilateral(&noisy);

    for y in 5..25 {
        for x in 5..25 {
            let v = filtered.get_pixel(x, y)[0] as i32;
            assert!((v - 100).abs() <= 2, "pixel ({}, {}) = {}", x, y, v);
        }
    }
}

#[test]
fn test_gaussian_kernel_is_normalised() {
    let kernel = gaussian_kernel(GAUSSIAN_TAPS, GAUSSIAN_SIGMA);
    assert_eq!(kernel.len(), 5);

    let total: f32 = kernel.iter().sum();
    assert!((total - 1.0).abs() < 1e-6);

    // Symmetric with the peak in the middle
    assert!((kernel[0] - kernel[4]).abs() < 1e-7);
    assert!((kernel[1] - kernel[3]).abs() < 1e-7);
    assert!(kernel[2] > kernel[1] && kernel[1] > kernel[0]);
}

#[test]
fn test_blur_rounds_instead_of_truncating() {
    // One bright pixel in a single row: the vertical pass is an identity
    let row = GrayImage::from_fn(5, 1, |x, _| Luma([if x == 2 { 255 } else { 0 }]));
    let blurred = apply_blur(&row, GAUSSIAN_TAPS, GAUSSIAN_SIGMA);
    let kernel = gaussian_kernel(GAUSSIAN_TAPS, GAUSSIAN_SIGMA);

    for x in 0..5u32 {
        let expected = (255.0 * kernel[(4 - x) as usize]).round() as u8;
        assert_eq!(blurred.get_pixel(x, 0)[0], expected, "column {}", x);
    }
    // 255 * 0.4026 = 102.66
    assert_eq!(blurred.get_pixel(2, 0)[0], 103);
}

#[test]
fn test_smoothing_keeps_flat_image() {
    for value in [0u8, 37, 100, 254, 255] {
        let flat = GrayImage::from_pixel(12, 9, Luma([value]));
        assert_eq!(smooth(&flat), flat, "flat {}", value);
    }
}

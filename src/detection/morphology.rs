//! Binary morphology over 0/255 rasters.
//!
//! Structuring elements are anchored at `(width / 2, height / 2)`. Pixels
//! outside the raster never contribute to a dilation and never constrain an
//! erosion.

use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};

use super::threshold::FOREGROUND;

/// Largest element side whose anchor still fits a mask centre
pub const MAX_ELEMENT_SIDE: u32 = 255;

/// Shape of a structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    Rect,
    Ellipse,
}

/// Structuring element: its rasterised shape and the mask built from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    pub width: u32,
    pub height: u32,
    shape: GrayImage,
    mask: Mask,
}

impl StructuringElement {
    pub fn new(shape: ElementShape, width: u32, height: u32) -> Self {
        let width = width.clamp(1, MAX_ELEMENT_SIDE);
        let height = height.clamp(1, MAX_ELEMENT_SIDE);
        let mut raster = GrayImage::new(width, height);

        match shape {
            ElementShape::Rect => {
                for pixel in raster.pixels_mut() {
                    *pixel = Luma([FOREGROUND]);
                }
            }
            ElementShape::Ellipse => {
                let r = (height / 2) as i32;
                let c = (width / 2) as i32;
                let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };
                for i in 0..height as i32 {
                    let dy = i - r;
                    if dy.abs() > r {
                        continue;
                    }
                    let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i32;
                    let j1 = (c - dx).max(0);
                    let j2 = (c + dx + 1).min(width as i32);
                    for j in j1..j2 {
                        raster.put_pixel(j as u32, i as u32, Luma([FOREGROUND]));
                    }
                }
            }
        }

        // Sides are clamped to 255, so the anchor fits in a u8
        let mask = Mask::from_image(&raster, (width / 2) as u8, (height / 2) as u8);

        Self {
            width,
            height,
            shape: raster,
            mask,
        }
    }

    pub fn rect(width: u32, height: u32) -> Self {
        Self::new(ElementShape::Rect, width, height)
    }

    pub fn ellipse(width: u32, height: u32) -> Self {
        Self::new(ElementShape::Ellipse, width, height)
    }

    /// Whether the cell at (column, row) of the element is set
    pub fn contains(&self, column: u32, row: u32) -> bool {
        column < self.width && row < self.height && self.shape.get_pixel(column, row)[0] != 0
    }

    /// Number of set cells
    pub fn len(&self) -> usize {
        self.shape.pixels().filter(|p| p[0] != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element as an imageproc mask centred on its anchor
    pub fn mask(&self) -> &Mask {
        &self.mask
    }
}

/// Foreground wherever any element cell covers a foreground pixel
pub fn dilate(img: &GrayImage, element: &StructuringElement) -> GrayImage {
    grayscale_dilate(img, &element.mask)
}

/// Foreground only where every in-bounds element cell covers foreground
pub fn erode(img: &GrayImage, element: &StructuringElement) -> GrayImage {
    grayscale_erode(img, &element.mask)
}

/// Opening: `iterations` erosions followed by as many dilations
pub fn open(img: &GrayImage, element: &StructuringElement, iterations: u32) -> GrayImage {
    let mut result = img.clone();
    for _ in 0..iterations {
        result = erode(&result, element);
    }
    for _ in 0..iterations {
        result = dilate(&result, element);
    }
    result
}

/// Closing: `iterations` dilations followed by as many erosions
pub fn close(img: &GrayImage, element: &StructuringElement, iterations: u32) -> GrayImage {
    let mut result = img.clone();
    for _ in 0..iterations {
        result = dilate(&result, element);
    }
    for _ in 0..iterations {
        result = erode(&result, element);
    }
    result
}

/// Fixed vertical closing element (width × height)
pub const VERTICAL_CLOSE: (u32, u32) = (4, 8);
/// Fixed diagonal closing element (elliptical, width × height)
pub const DIAGONAL_CLOSE: (u32, u32) = (7, 7);
pub const HORIZONTAL_CLOSE_ITERATIONS: u32 = 2;

/// Merge fragments of the same object: horizontal, vertical, then diagonal closing
pub fn close_fragments(img: &GrayImage, kernel_w: u32, kernel_h: u32) -> GrayImage {
    let horizontal = close(img, &StructuringElement::rect(kernel_w, kernel_h), HORIZONTAL_CLOSE_ITERATIONS);
    let vertical = close(
        &horizontal,
        &StructuringElement::rect(VERTICAL_CLOSE.0, VERTICAL_CLOSE.1),
        1,
    );
    close(
        &vertical,
        &StructuringElement::ellipse(DIAGONAL_CLOSE.0, DIAGONAL_CLOSE.1),
        1,
    )
}

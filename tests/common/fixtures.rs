use carcount::{BoundingBox, Component};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

pub const ASPHALT: Rgb<u8> = Rgb([100, 100, 100]);
pub const CAR: Rgb<u8> = Rgb([30, 30, 30]);

/// Uniform colour image
pub fn blank_image(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

/// 400x300 asphalt image with a single dark 150x75 car at (120, 110)
pub fn single_car_image() -> DynamicImage {
    let mut img = blank_image(400, 300, ASPHALT);
    for y in 110..185 {
        for x in 120..270 {
            img.put_pixel(x, y, CAR);
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Binary raster with the given filled rectangles (x, y, w, h) as foreground
pub fn binary_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
    let mut img = GrayImage::new(width, height);
    for &(x, y, w, h) in rects {
        for py in y..y + h {
            for px in x..x + w {
                img.put_pixel(px, py, Luma([255]));
            }
        }
    }
    img
}

/// Number of foreground pixels in a binary raster
pub fn foreground_count(img: &GrayImage) -> usize {
    img.pixels().filter(|p| p[0] == 255).count()
}

/// Component with the given box and area, centroid at the box centre
pub fn component(width: u32, height: u32, area: u32) -> Component {
    Component::new(
        1,
        BoundingBox {
            x: 10,
            y: 10,
            width,
            height,
        },
        area,
        (10.0 + width as f64 / 2.0, 10.0 + height as f64 / 2.0),
    )
}

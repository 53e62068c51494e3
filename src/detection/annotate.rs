use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::models::{BoundingBox, Classification, Component};

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// Display colour for each label
pub fn label_color(label: Classification) -> Rgb<u8> {
    match label {
        Classification::Vehicle => GREEN,
        Classification::Small => Rgb([255, 100, 100]),
        Classification::Large => Rgb([200, 0, 0]),
        Classification::InvalidWidth | Classification::InvalidHeight => Rgb([255, 0, 0]),
        Classification::TooTall | Classification::TooWide => Rgb([0, 100, 255]),
        Classification::Tree => Rgb([255, 140, 0]),
        Classification::Crown => Rgb([0, 200, 255]),
        Classification::Irregular => Rgb([128, 128, 128]),
        Classification::Scattered => Rgb([64, 64, 64]),
        Classification::Linear => Rgb([255, 0, 255]),
    }
}

/// Draw a rectangle outline `thickness` pixels wide, growing outwards
fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, thickness: u32, color: Rgb<u8>) {
    for t in 0..thickness {
        let rect = Rect::at(bbox.x as i32 - t as i32, bbox.y as i32 - t as i32)
            .of_size(bbox.width + 2 * t, bbox.height + 2 * t);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Every component outlined in the colour of its label, with its centroid
pub fn draw_component_stats(
    image: &RgbImage,
    components: &[Component],
    classifications: &[Classification],
) -> RgbImage {
    let mut canvas = image.clone();

    for (component, &label) in components.iter().zip(classifications) {
        let color = label_color(label);
        let thickness = if label.is_vehicle() { 3 } else { 1 };
        draw_box(&mut canvas, &component.bbox, thickness, color);

        let (cx, cy) = component.center();
        draw_filled_circle_mut(&mut canvas, (cx as i32, cy as i32), 2, color);
    }

    canvas
}

/// Original image with a thick box around each vehicle
pub fn draw_vehicles(
    image: &RgbImage,
    components: &[Component],
    classifications: &[Classification],
) -> RgbImage {
    let mut canvas = image.clone();

    for (component, _) in components
        .iter()
        .zip(classifications)
        .filter(|(_, label)| label.is_vehicle())
    {
        draw_box(&mut canvas, &component.bbox, 4, GREEN);
    }

    canvas
}

use image::{Rgb, RgbImage};

/// Paint a filled rectangle
fn fill(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for py in y..(y + h).min(img.height()) {
        for px in x..(x + w).min(img.width()) {
            img.put_pixel(px, py, color);
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Asphalt
    let mut img = RgbImage::from_pixel(800, 600, Rgb([110, 110, 110]));

    // Parked cars in two rows
    for i in 0..4 {
        fill(&mut img, 60 + i * 180, 80, 150, 75, Rgb([30, 30, 40]));
        fill(&mut img, 60 + i * 180, 380, 150, 75, Rgb([35, 30, 30]));
    }

    // A lamp post shadow, too narrow to be a car
    fill(&mut img, 400, 200, 8, 150, Rgb([40, 40, 40]));

    img.save("test_image.png")?;
    println!("Created test_image.png (800x600 synthetic parking lot)");
    Ok(())
}

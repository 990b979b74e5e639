//! Grayscale raster export of the total heightfield.
//!
//! Heights are normalized over their observed range, so every snapshot
//! uses the full 8-bit ramp regardless of absolute elevation.

use image::{GrayImage, Luma};
use sim::DuneSimulation;
use std::path::Path;

/// Render the total height into an 8-bit grayscale image, one pixel per
/// grid vertex.
pub fn height_image(sim: &DuneSimulation) -> GrayImage {
    let (nx, ny) = (sim.nx(), sim.ny());

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for j in 0..ny {
        for i in 0..nx {
            let h = sim.height(i, j);
            min = min.min(h);
            max = max.max(h);
        }
    }
    let range = (max - min).max(1e-6);

    GrayImage::from_fn(nx as u32, ny as u32, |x, y| {
        let h = sim.height(x as usize, y as usize);
        let t = ((h - min) / range).clamp(0.0, 1.0);
        Luma([(t * 255.99) as u8])
    })
}

/// Write the normalized heightfield to `path`; the format follows the
/// file extension.
pub fn write_png(sim: &DuneSimulation, path: &Path) -> image::ImageResult<()> {
    height_image(sim).save(path)
}

use std::path::Path;

use image::{imageops, RgbaImage};

use crate::error::FluidError;
use crate::simulation::Simulation;

/// Renders composed frames to images for headless runs.
pub struct Renderer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Vec::new(),
        }
    }

    /// Compose the current dye field and scale it to the output size.
    pub fn render(&mut self, simulation: &mut Simulation) -> Result<RgbaImage, FluidError> {
        let (w, h) = simulation.render_rgba(&mut self.pixels)?;
        let image = RgbaImage::from_raw(w as u32, h as u32, self.pixels.clone())
            .ok_or_else(|| FluidError::kernel("compose", "pixel buffer size mismatch"))?;

        if (w as u32, h as u32) == (self.width, self.height) {
            Ok(image)
        } else {
            Ok(imageops::resize(
                &image,
                self.width,
                self.height,
                imageops::FilterType::Triangle,
            ))
        }
    }

    pub fn export_png(
        &mut self,
        simulation: &mut Simulation,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let image = self.render(simulation)?;
        image.save(path)?;
        Ok(())
    }
}

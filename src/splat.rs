use glam::{Vec2, Vec3};
use rand::Rng;

use crate::config::FluidConfig;
use crate::error::FluidError;
use crate::field::FieldStore;
use crate::kernels;

/// Colors cycled by the demo bootstrap splats.
pub const SPLAT_PALETTE: [Vec3; 3] = [
    Vec3::new(0.9, 0.3, 0.3),
    Vec3::new(0.3, 0.9, 0.3),
    Vec3::new(0.5, 0.5, 0.9),
];

/// One injection event: a point in normalized coordinates, the velocity to
/// add, the dye color, and the (already aspect-corrected) radius. Built per
/// event and discarded after application.
#[derive(Debug, Clone, Copy)]
pub struct Impulse {
    pub point: Vec2,
    pub velocity_delta: Vec2,
    pub dye_color: Vec3,
    pub radius: f32,
}

/// Converts pointer/bootstrap events into velocity and dye impulses.
#[derive(Debug, Clone, Copy)]
pub struct SplatInjector {
    aspect_ratio: f32,
}

impl SplatInjector {
    pub fn new(output_width: u32, output_height: u32) -> Self {
        Self {
            aspect_ratio: output_width as f32 / output_height as f32,
        }
    }

    /// Build an impulse from raw event values, correcting the configured
    /// radius for the output aspect so splats render circular.
    pub fn impulse(
        &self,
        config: &FluidConfig,
        point: Vec2,
        velocity_delta: Vec2,
        dye_color: Vec3,
    ) -> Impulse {
        let mut radius = config.splat_radius / 100.0;
        if self.aspect_ratio > 1.0 {
            radius *= self.aspect_ratio;
        }
        Impulse {
            point,
            velocity_delta,
            dye_color,
            radius,
        }
    }

    /// Apply one impulse: splat the velocity delta onto the velocity field,
    /// then the color onto the dye field, swapping each buffer.
    pub fn inject(&self, fields: &mut FieldStore, impulse: Impulse) -> Result<(), FluidError> {
        let (read, write) = fields.velocity.pair();
        kernels::splat(
            read,
            impulse.point,
            impulse.velocity_delta.extend(0.0),
            impulse.radius,
            self.aspect_ratio,
            write,
        )?;
        fields.velocity.swap();

        let (read, write) = fields.dye.pair();
        kernels::splat(
            read,
            impulse.point,
            impulse.dye_color,
            impulse.radius,
            self.aspect_ratio,
            write,
        )?;
        fields.dye.swap();

        Ok(())
    }

    /// Seed `n` impulses at uniformly random points with uniformly random
    /// forces, cycling a fixed palette. Used to bootstrap a demo session.
    pub fn seed_random_splats(
        &self,
        fields: &mut FieldStore,
        config: &FluidConfig,
        n: usize,
        rng: &mut impl Rng,
    ) -> Result<(), FluidError> {
        for i in 0..n {
            let point = Vec2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            let delta = Vec2::new(
                1000.0 * (rng.gen_range(0.0f32..1.0) - 0.5),
                1000.0 * (rng.gen_range(0.0f32..1.0) - 0.5),
            );
            let color = SPLAT_PALETTE[i % SPLAT_PALETTE.len()];
            let impulse = self.impulse(config, point, delta, color);
            self.inject(fields, impulse)?;
        }
        Ok(())
    }
}

use glam::{Vec2, Vec3};

use crate::compose::{ComposePipeline, FeatureSet};
use crate::config::FluidConfig;
use crate::diagnostics::FieldMetrics;
use crate::error::FluidError;
use crate::field::{Field, FieldStore};
use crate::splat::SplatInjector;
use crate::stepper::{clamp_delta, Stepper};

/// The whole simulation in one aggregate: config, field buffers, stepper,
/// splat injector and the compose cache. Callers hold one of these; there is
/// no ambient state.
pub struct Simulation {
    config: FluidConfig,
    fields: FieldStore,
    stepper: Stepper,
    injector: SplatInjector,
    compositor: ComposePipeline,
    frame: usize,
}

impl Simulation {
    /// Allocate every field for the given config and output surface size.
    /// A degenerate config or output size is rejected up front; allocation
    /// failure is fatal and reported as `ResourceExhausted`.
    pub fn new(
        config: FluidConfig,
        output_width: u32,
        output_height: u32,
    ) -> Result<Self, FluidError> {
        config.validate()?;
        if output_width == 0 || output_height == 0 {
            return Err(FluidError::invalid_config(format!(
                "output surface is {output_width}x{output_height}"
            )));
        }
        let fields = FieldStore::allocate(&config, output_width, output_height)?;
        Ok(Self {
            config,
            fields,
            stepper: Stepper::new(),
            injector: SplatInjector::new(output_width, output_height),
            compositor: ComposePipeline::new(),
            frame: 0,
        })
    }

    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    /// The current dye field, for display.
    pub fn dye(&self) -> &Field {
        self.fields.dye.read()
    }

    pub fn velocity(&self) -> &Field {
        self.fields.velocity.read()
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Advance one frame. `delta_seconds` is the wall-clock delta; it is
    /// floored to the stability minimum before use.
    pub fn step(&mut self, delta_seconds: f32) -> Result<(), FluidError> {
        let dt = clamp_delta(delta_seconds);
        self.stepper.step(&mut self.fields, &self.config, dt)?;
        self.frame += 1;
        Ok(())
    }

    /// Inject a splat: `point` in normalized [0,1]² coordinates (origin
    /// bottom-left), `velocity_delta` added to the velocity field, `color`
    /// added to the dye field.
    pub fn inject(
        &mut self,
        point: Vec2,
        velocity_delta: Vec2,
        color: Vec3,
    ) -> Result<(), FluidError> {
        let impulse = self
            .injector
            .impulse(&self.config, point, velocity_delta, color);
        self.injector.inject(&mut self.fields, impulse)
    }

    /// Bootstrap the session with `n` random splats.
    pub fn seed_random_splats(&mut self, n: usize) -> Result<(), FluidError> {
        self.injector
            .seed_random_splats(&mut self.fields, &self.config, n, &mut rand::thread_rng())
    }

    /// Compose the dye field into RGBA8 pixels at dye resolution using the
    /// config's feature toggles. Returns the pixel dimensions.
    pub fn render_rgba(&mut self, pixels: &mut Vec<u8>) -> Result<(usize, usize), FluidError> {
        let features = FeatureSet::from_config(&self.config);
        self.render_rgba_with(features, pixels)
    }

    /// Compose with an explicit feature set, for callers that override the
    /// display toggles at runtime.
    pub fn render_rgba_with(
        &mut self,
        features: FeatureSet,
        pixels: &mut Vec<u8>,
    ) -> Result<(usize, usize), FluidError> {
        let dye = self.fields.dye.read();
        let (w, h) = (dye.width(), dye.height());
        pixels.resize(w * h * 4, 0);
        self.compositor.compose(dye, features, pixels)?;
        Ok((w, h))
    }

    pub fn metrics(&self) -> FieldMetrics {
        FieldMetrics::measure(&self.fields, self.frame)
    }
}

use crate::config::FluidConfig;
use crate::error::FluidError;
use crate::field::FieldStore;
use crate::kernels;

/// Stability floor for the time step. Wall-clock deltas below this (including
/// zero or negative from clock jitter) are raised to it. There is
/// deliberately no upper cap; a stall produces one large step.
pub const MIN_DT: f32 = 1.0 / 60.0;

/// Raise a wall-clock delta to the stability floor.
pub fn clamp_delta(delta_seconds: f32) -> f32 {
    delta_seconds.max(MIN_DT)
}

/// Drives the fixed per-frame pass sequence. Each stage consumes the previous
/// stage's output, so the chain runs strictly in order with a buffer swap
/// after every pass that both reads and writes the same quantity.
#[derive(Debug, Default)]
pub struct Stepper;

impl Stepper {
    pub fn new() -> Self {
        Self
    }

    /// Advance the fields by `dt` (already floored by the caller). Either all
    /// eight stages complete or the first failing kernel aborts the frame.
    pub fn step(
        &mut self,
        fields: &mut FieldStore,
        config: &FluidConfig,
        dt: f32,
    ) -> Result<(), FluidError> {
        kernels::curl(fields.velocity.read(), &mut fields.curl)?;

        let (read, write) = fields.velocity.pair();
        kernels::vorticity(read, &fields.curl, config.curl, dt, write)?;
        fields.velocity.swap();

        kernels::divergence(fields.velocity.read(), &mut fields.divergence)?;

        let (read, write) = fields.pressure.pair();
        kernels::pressure_clear(read, config.pressure, write)?;
        fields.pressure.swap();

        // Sequential sweeps: each iteration must observe the previous one's
        // fully written buffer.
        for _ in 0..config.pressure_iterations {
            let (read, write) = fields.pressure.pair();
            kernels::pressure_jacobi(read, &fields.divergence, write)?;
            fields.pressure.swap();
        }

        let (read, write) = fields.velocity.pair();
        kernels::gradient_subtract(fields.pressure.read(), read, write)?;
        fields.velocity.swap();

        let (read, write) = fields.velocity.pair();
        kernels::advect(read, read, dt, config.velocity_dissipation, write)?;
        fields.velocity.swap();

        let (read, write) = fields.dye.pair();
        kernels::advect(
            fields.velocity.read(),
            read,
            dt,
            config.density_dissipation,
            write,
        )?;
        fields.dye.swap();

        Ok(())
    }
}

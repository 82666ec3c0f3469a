use serde::{Deserialize, Serialize};

use crate::error::FluidError;

/// Simulation parameters, immutable per session. Defaults match the tuning
/// the solver was developed against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    /// Quality knob for the velocity/pressure grid (shorter-axis length).
    pub sim_resolution: u32,
    /// Quality knob for the dye grid, usually higher than `sim_resolution`.
    pub dye_resolution: u32,
    /// Exponential decay rate applied to dye during advection.
    pub density_dissipation: f32,
    /// Exponential decay rate applied to velocity during self-advection.
    pub velocity_dissipation: f32,
    /// Damping weight applied to pressure once per frame before relaxation.
    pub pressure: f32,
    /// Number of Jacobi sweeps per frame.
    pub pressure_iterations: u32,
    /// Vorticity confinement strength.
    pub curl: f32,
    /// Splat radius in percent of the normalized domain.
    pub splat_radius: f32,
    /// Scale from drag motion to injected velocity.
    pub splat_force: f32,
    pub shading: bool,
    pub bloom: bool,
    pub sunrays: bool,
}

impl FluidConfig {
    /// Reject values that would produce degenerate grids or kernels. Called
    /// before allocation, so a bad user-supplied config fails with a clear
    /// message instead of a panic deep in the solver.
    pub fn validate(&self) -> Result<(), FluidError> {
        if self.sim_resolution == 0 {
            return Err(FluidError::invalid_config("sim_resolution must be at least 1"));
        }
        if self.dye_resolution == 0 {
            return Err(FluidError::invalid_config("dye_resolution must be at least 1"));
        }
        if self.splat_radius <= 0.0 {
            return Err(FluidError::invalid_config("splat_radius must be positive"));
        }
        Ok(())
    }
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            sim_resolution: 128,
            dye_resolution: 512,
            density_dissipation: 0.0,
            velocity_dissipation: 0.2,
            pressure: 0.8,
            pressure_iterations: 20,
            curl: 30.0,
            splat_radius: 0.85,
            splat_force: 6000.0,
            shading: true,
            bloom: true,
            sunrays: true,
        }
    }
}

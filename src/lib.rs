//! Grid-based incompressible-fluid visualizer: splats inject velocity and
//! dye, a stable-fluids solver (vorticity confinement, Jacobi pressure
//! projection, semi-Lagrangian advection) advances the fields each frame, and
//! the dye field is composed for display.

pub mod app;
pub mod compose;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod kernels;
pub mod render;
pub mod resolution;
pub mod simulation;
pub mod splat;
pub mod stepper;

pub use app::InteractiveApp;
pub use compose::{ComposePipeline, FeatureSet};
pub use config::FluidConfig;
pub use diagnostics::FieldMetrics;
pub use error::FluidError;
pub use field::{DoubleBuffer, Field, FieldStore, Filter, Format};
pub use render::Renderer;
pub use resolution::grid_resolution;
pub use simulation::Simulation;
pub use splat::{Impulse, SplatInjector, SPLAT_PALETTE};
pub use stepper::{clamp_delta, Stepper, MIN_DT};

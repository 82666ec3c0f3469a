use std::fmt;

/// Failures surfaced by the simulation core. Both kinds are fatal for the
/// frame in which they occur: a step either completes all stages or fails as
/// a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FluidError {
    /// A field buffer could not be allocated.
    ResourceExhausted {
        what: &'static str,
        bytes: usize,
    },
    /// A kernel was invoked against fields whose shapes do not agree.
    KernelFailure {
        kernel: &'static str,
        detail: String,
    },
    /// A configuration value would produce degenerate grids or kernels.
    InvalidConfig {
        detail: String,
    },
}

impl FluidError {
    pub fn kernel(kernel: &'static str, detail: impl Into<String>) -> Self {
        Self::KernelFailure {
            kernel,
            detail: detail.into(),
        }
    }

    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FluidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceExhausted { what, bytes } => {
                write!(f, "failed to allocate {what} ({bytes} bytes)")
            }
            Self::KernelFailure { kernel, detail } => {
                write!(f, "kernel '{kernel}' failed: {detail}")
            }
            Self::InvalidConfig { detail } => {
                write!(f, "invalid config: {detail}")
            }
        }
    }
}

impl std::error::Error for FluidError {}

use std::collections::HashMap;

use crate::config::FluidConfig;
use crate::error::FluidError;
use crate::field::Field;
use crate::kernels;

/// The display feature toggles that select a compose variant. Bloom and
/// sunrays are blended by an external compositor, but they participate in the
/// key: enabling either selects a variant that expects those passes
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureSet {
    pub shading: bool,
    pub bloom: bool,
    pub sunrays: bool,
}

impl FeatureSet {
    pub fn from_config(config: &FluidConfig) -> Self {
        Self {
            shading: config.shading,
            bloom: config.bloom,
            sunrays: config.sunrays,
        }
    }
}

/// One precompiled compose configuration. Variants assume the feature set
/// changes rarely, so building one per set and caching it is cheap.
#[derive(Debug, Clone)]
pub struct ComposeVariant {
    shading: bool,
    expects_bloom: bool,
    expects_sunrays: bool,
}

impl ComposeVariant {
    fn build(features: FeatureSet) -> Self {
        Self {
            shading: features.shading,
            expects_bloom: features.bloom,
            expects_sunrays: features.sunrays,
        }
    }

    /// External passes this variant expects blended after `run`.
    pub fn expects_bloom(&self) -> bool {
        self.expects_bloom
    }

    pub fn expects_sunrays(&self) -> bool {
        self.expects_sunrays
    }

    pub fn run(&self, dye: &Field, pixels: &mut [u8]) -> Result<(), FluidError> {
        kernels::compose(dye, self.shading, pixels)
    }
}

/// Table of compose variants keyed by the enabled-feature set.
#[derive(Debug, Default)]
pub struct ComposePipeline {
    variants: HashMap<FeatureSet, ComposeVariant>,
}

impl ComposePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant(&mut self, features: FeatureSet) -> &ComposeVariant {
        self.variants
            .entry(features)
            .or_insert_with(|| ComposeVariant::build(features))
    }

    pub fn compose(
        &mut self,
        dye: &Field,
        features: FeatureSet,
        pixels: &mut [u8],
    ) -> Result<(), FluidError> {
        self.variant(features).run(dye, pixels)
    }
}

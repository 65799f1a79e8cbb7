use getset::{CopyGetters, WithSetters};
use snafu::prelude::*;

use crate::domain::math::numeric::Val;
use crate::domain::photon::{EstimateOptions, PhotonStructure};

/// Tracer configuration. Behavior selectors live in [`GatherConfig`]
/// as runtime settings, so a single build serves every scene.
#[derive(Debug, Clone, PartialEq, CopyGetters, WithSetters)]
#[getset(get_copy = "pub", set_with = "pub")]
pub struct TracerConfig {
    num_threads: usize,
    anti_aliasing: bool,
    max_ray_depth: usize,
    max_photon_depth: usize,
    photon_search_count: usize,
    photon_search_radius: Val,
    /// Base seed; worker RNGs derive distinct seeds from it.
    seed: u64,
    #[getset(skip)]
    gather: GatherConfig,
}

impl TracerConfig {
    pub fn gather(&self) -> &GatherConfig {
        &self.gather
    }

    pub fn with_gather(mut self, gather: GatherConfig) -> Self {
        self.gather = gather;
        self
    }

    pub fn validate(&self) -> Result<(), TracerConfigError> {
        ensure!(self.num_threads > 0, InvalidNumThreadsSnafu);
        ensure!(self.max_ray_depth > 0, InvalidMaxRayDepthSnafu);
        ensure!(
            self.photon_search_radius >= Val(0.0),
            InvalidSearchRadiusSnafu,
        );
        ensure!(
            self.max_photon_depth == 0 || self.photon_search_count > 0,
            InvalidSearchCountSnafu,
        );
        self.gather.validate()?;
        Ok(())
    }
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            num_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            anti_aliasing: false,
            max_ray_depth: 1,
            max_photon_depth: 0,
            photon_search_count: 1,
            photon_search_radius: Val(1.0),
            seed: 0,
            gather: GatherConfig::default(),
        }
    }
}

/// Photon-gathering and sampling behavior selectors.
#[derive(Debug, Clone, PartialEq, CopyGetters, WithSetters)]
#[getset(get_copy = "pub", set_with = "pub")]
pub struct GatherConfig {
    structure: PhotonStructure,
    /// Reject photons whose surface normal diverges from the query
    /// normal (cosine threshold below).
    sphere_compression: bool,
    sphere_compression_ratio: Val,
    /// Weight photons by a distance cone filter.
    filter: bool,
    filter_constant: Val,
    use_furthest_photon_dist: bool,
    precompute_irradiance: bool,
    /// Divide rescaled photon power by the band-average reflectance.
    energy_conservation: bool,
    /// Store only photons that bounced at least once; direct light then
    /// comes from shadow rays even on diffuse surfaces.
    indirect_only: bool,
    /// Multiply gathered estimates by the surface's diffuse reflectance.
    material_multiply: bool,
    /// Number of secondary gather rays; zero samples at the hit point.
    gather_rays: usize,
    gather_ray_weight: Val,
    monte_carlo_soft_shadows: bool,
    soft_shadow_samples: usize,
    /// Partition scene objects into a uniform grid for traversal.
    grid_partitioning: bool,
}

impl GatherConfig {
    pub fn validate(&self) -> Result<(), TracerConfigError> {
        ensure!(
            !self.filter || self.filter_constant > Val(2.0 / 3.0),
            InvalidFilterConstantSnafu,
        );
        ensure!(
            !self.monte_carlo_soft_shadows || self.soft_shadow_samples > 0,
            InvalidSoftShadowSamplesSnafu,
        );
        Ok(())
    }

    pub fn estimate_options(&self) -> EstimateOptions {
        EstimateOptions::new(
            self.filter,
            self.filter_constant,
            self.use_furthest_photon_dist,
            self.sphere_compression.then_some(self.sphere_compression_ratio),
            self.precompute_irradiance,
        )
    }
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            structure: PhotonStructure::KdTree,
            sphere_compression: true,
            sphere_compression_ratio: Val(0.9),
            filter: true,
            filter_constant: Val(1.25),
            use_furthest_photon_dist: true,
            precompute_irradiance: false,
            energy_conservation: true,
            indirect_only: false,
            material_multiply: true,
            gather_rays: 0,
            gather_ray_weight: Val(0.25),
            monte_carlo_soft_shadows: true,
            soft_shadow_samples: 32,
            grid_partitioning: false,
        }
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TracerConfigError {
    #[snafu(display("number of threads is not positive"))]
    InvalidNumThreads,
    #[snafu(display("max ray depth is not positive"))]
    InvalidMaxRayDepth,
    #[snafu(display("photon search radius is negative"))]
    InvalidSearchRadius,
    #[snafu(display("photon search count is zero while photon mapping is enabled"))]
    InvalidSearchCount,
    #[snafu(display("cone filter constant must exceed 2/3 for a positive normalizer"))]
    InvalidFilterConstant,
    #[snafu(display("Monte-Carlo soft shadows need at least one sample"))]
    InvalidSoftShadowSamples,
}

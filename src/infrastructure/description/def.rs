use crate::domain::camera::Camera;
use crate::domain::math::numeric::Val;
use crate::domain::renderer::TracerConfig;
use crate::domain::scene::Scene;

use super::error::LoadDescriptionError;

/// Loads a scene description from some external representation.
pub trait DescriptionLoader {
    fn load(&self) -> Result<Description, LoadDescriptionError>;
}

/// Everything a render run needs: output surface parameters, the camera,
/// the scene and the tracer configuration.
pub struct Description {
    pub window: WindowConfig,
    pub camera: Camera,
    pub scene: Scene,
    pub tracer: TracerConfig,
}

/// Output-surface parameters. There is no display surface; `make_dump`
/// gates the PPM write.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub width: usize,
    pub height: usize,
    pub title: String,
    pub make_dump: bool,
    pub white_balance_range: Option<Val>,
}

mod config;
mod frame;
mod tracer;

pub use config::{GatherConfig, TracerConfig, TracerConfigError};
pub use frame::{Frame, FrameBand, PixelStats};
pub use tracer::RayTracer;

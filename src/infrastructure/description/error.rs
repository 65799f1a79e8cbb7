use std::path::PathBuf;

use snafu::prelude::*;

use crate::domain::camera::TryNewCameraError;
use crate::domain::renderer::TracerConfigError;

#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub))]
pub enum LoadDescriptionError {
    #[snafu(display("failed to read description file from {}: {}", path.display(), source))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse TOML description: {}", source))]
    ParseToml { source: toml::de::Error },

    #[snafu(display("invalid camera configuration: {}", source))]
    InvalidCamera { source: TryNewCameraError },

    #[snafu(display("invalid raytracer configuration: {}", source))]
    InvalidTracerConfig { source: TracerConfigError },

    #[snafu(display("invalid light definition at index {}: {}", index, message))]
    InvalidLight { index: usize, message: String },

    #[snafu(display("invalid object definition at index {}: {}", index, message))]
    InvalidObject { index: usize, message: String },

    #[snafu(display("object type '{}' at index {} is not supported", kind, index))]
    UnsupportedShape { kind: String, index: usize },
}

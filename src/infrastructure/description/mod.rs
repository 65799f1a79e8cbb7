mod def;
mod error;
mod loader;

pub use def::{Description, DescriptionLoader, WindowConfig};
pub use error::LoadDescriptionError;
pub use loader::TomlDescriptionLoader;

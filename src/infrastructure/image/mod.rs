mod ppm;

pub use ppm::{PpmWriter, SavePpmError};

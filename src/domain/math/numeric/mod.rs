mod value;

pub use value::{Val, WrappedVal};

mod product;
mod unit_vector;
mod vector;

pub use product::Product;
pub use unit_vector::{TryNormalizeVectorError, UnitVector};
pub use vector::Vector;

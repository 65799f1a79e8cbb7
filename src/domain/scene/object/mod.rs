mod cuboid;
mod cylinder;
mod def;
mod ellipsoid;
mod plane;

pub use cuboid::{Cuboid, TryNewCuboidError};
pub use cylinder::{Cylinder, TryNewCylinderError};
pub use def::{DynShape, Shape};
pub use ellipsoid::{Ellipsoid, TryNewEllipsoidError};
pub use plane::Plane;

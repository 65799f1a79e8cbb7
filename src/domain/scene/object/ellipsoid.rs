use getset::CopyGetters;
use snafu::prelude::*;

use crate::domain::math::algebra::Vector;
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;
use crate::domain::ray::{Ray, RayIntersection};

use super::def::{Shape, sphere_overlaps_cell};

/// Axis-aligned ellipsoid with center `position` and half-extents
/// `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Ellipsoid {
    position: Point,
    size: Vector,
    #[getset(skip)]
    bounding_radius: Val,
}

impl Ellipsoid {
    pub fn new(position: Point, size: Vector) -> Result<Self, TryNewEllipsoidError> {
        ensure!(
            size.x() > Val(0.0) && size.y() > Val(0.0) && size.z() > Val(0.0),
            InvalidSizeSnafu,
        );
        Ok(Self {
            position,
            size,
            bounding_radius: size.max_component(),
        })
    }
}

impl Shape for Ellipsoid {
    fn intersect_ray(&self, ray: &Ray) -> Option<RayIntersection> {
        let o = ray.start() - self.position;
        let d = ray.direction().to_vector();

        let aa = self.size.x() * self.size.x();
        let bb = self.size.y() * self.size.y();
        let cc = self.size.z() * self.size.z();

        // canonical quadric coefficients
        let a = d.x() * d.x() / aa + d.y() * d.y() / bb + d.z() * d.z() / cc;
        let b = Val(2.0) * (o.x() * d.x() / aa + o.y() * d.y() / bb + o.z() * d.z() / cc);
        let c = o.x() * o.x() / aa + o.y() * o.y() / bb + o.z() * o.z() / cc - Val(1.0);
        let discriminant = b * b - Val(4.0) * a * c;

        if discriminant < Val(0.0) {
            return None;
        }

        let root = discriminant.sqrt();
        for t in [(-b - root) / (Val(2.0) * a), (-b + root) / (Val(2.0) * a)] {
            if t > Val(0.0) {
                let local = o + d * t;
                let normal = Vector::new(
                    Val(2.0) * local.x() / aa,
                    Val(2.0) * local.y() / bb,
                    Val(2.0) * local.z() / cc,
                )
                .normalize()
                .expect("quadric gradient is nonzero on the surface");
                return Some(RayIntersection::new(
                    t,
                    self.position + local,
                    normal,
                ));
            }
        }

        None
    }

    fn intersect_cell(&self, cell_center: Point, cell_size: Vector) -> bool {
        sphere_overlaps_cell(self.position, self.bounding_radius, cell_center, cell_size)
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TryNewEllipsoidError {
    #[snafu(display("ellipsoid half-extents are not all positive"))]
    InvalidSize,
}

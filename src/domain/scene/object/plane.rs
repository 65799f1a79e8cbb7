use getset::CopyGetters;

use crate::domain::math::algebra::{Product, Vector};
use crate::domain::math::geometry::{self, Point};
use crate::domain::math::numeric::Val;
use crate::domain::ray::{Ray, RayIntersection};

use super::def::Shape;

/// An infinite one-sided plane. Rays starting behind it (the side the
/// negated normal points into) never intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Plane {
    surface: geometry::Plane,
}

impl Plane {
    #[inline]
    pub fn new(surface: geometry::Plane) -> Self {
        Self { surface }
    }
}

impl Shape for Plane {
    fn intersect_ray(&self, ray: &Ray) -> Option<RayIntersection> {
        if self.surface.point_distance(ray.start()) < Val(0.0) {
            return None;
        }

        let den = ray.direction().dot(self.surface.normal());
        if den == Val(0.0) {
            // parallel to the plane
            return None;
        }

        let num = self.surface.distance() - self.surface.normal().dot(ray.start().to_vector());
        let t = num / den;
        if t > Val(0.0) {
            Some(RayIntersection::new(t, ray.at(t), self.surface.normal()))
        } else {
            None
        }
    }

    fn intersect_cell(&self, cell_center: Point, cell_size: Vector) -> bool {
        const CORNERS: [(f64, f64, f64); 8] = [
            (0.5, 0.5, 0.5),
            (0.5, 0.5, -0.5),
            (0.5, -0.5, 0.5),
            (0.5, -0.5, -0.5),
            (-0.5, 0.5, 0.5),
            (-0.5, 0.5, -0.5),
            (-0.5, -0.5, 0.5),
            (-0.5, -0.5, -0.5),
        ];

        // the plane crosses the cell unless all corners share the sign
        // of their signed distance
        let corner_distance = |&(x, y, z): &(f64, f64, f64)| {
            let offset = Vector::new(Val(x), Val(y), Val(z)) * cell_size;
            self.surface.point_distance(cell_center + offset)
        };

        let reference = corner_distance(&CORNERS[0]);
        CORNERS[1..]
            .iter()
            .map(corner_distance)
            .any(|d| opposite_sign(d, reference))
    }
}

fn opposite_sign(a: Val, b: Val) -> bool {
    (a > Val(0.0) && b <= Val(0.0))
        || (a >= Val(0.0) && b < Val(0.0))
        || (a < Val(0.0) && b >= Val(0.0))
        || (a <= Val(0.0) && b > Val(0.0))
}

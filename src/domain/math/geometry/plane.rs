use getset::CopyGetters;

use crate::domain::math::algebra::{Product, UnitVector};
use crate::domain::math::numeric::Val;

use super::Point;

/// A plane in Hessian normal form, `n . x = d`. The unit normal defines
/// the front face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Plane {
    normal: UnitVector,
    distance: Val,
}

impl Plane {
    #[inline]
    pub fn new(normal: UnitVector, distance: Val) -> Self {
        Self { normal, distance }
    }

    /// Signed orthogonal distance from `point` to the plane; positive on
    /// the front side.
    #[inline]
    pub fn point_distance(&self, point: Point) -> Val {
        self.normal.dot(point.to_vector()) - self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_point_distance_is_signed() {
        let plane = Plane::new(UnitVector::y_direction(), Val(2.0));
        assert_eq!(
            plane.point_distance(Point::new(Val(0.0), Val(5.0), Val(0.0))),
            Val(3.0),
        );
        assert_eq!(
            plane.point_distance(Point::new(Val(9.0), Val(0.0), Val(-4.0))),
            Val(-2.0),
        );
    }
}

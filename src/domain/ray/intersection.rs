use getset::CopyGetters;

use crate::domain::math::algebra::UnitVector;
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;

/// Surface hit record: parametric distance along the ray, world-space
/// position and the outward surface normal at that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct RayIntersection {
    distance: Val,
    position: Point,
    normal: UnitVector,
}

impl RayIntersection {
    #[inline]
    pub fn new(distance: Val, position: Point, normal: UnitVector) -> Self {
        Self {
            distance,
            position,
            normal,
        }
    }
}

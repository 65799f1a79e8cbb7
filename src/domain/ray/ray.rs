use getset::CopyGetters;

use crate::domain::math::algebra::UnitVector;
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;

/// A semi-infinite ray segment. `inside` is true while the segment
/// travels through the interior of a refractive object; refraction flips
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Ray {
    start: Point,
    direction: UnitVector,
    inside: bool,
}

impl Ray {
    #[inline]
    pub fn new(start: Point, direction: UnitVector) -> Self {
        Self {
            start,
            direction,
            inside: false,
        }
    }

    #[inline]
    pub fn with_inside(start: Point, direction: UnitVector, inside: bool) -> Self {
        Self {
            start,
            direction,
            inside,
        }
    }

    #[inline]
    pub fn at(&self, distance: Val) -> Point {
        self.start + self.direction * distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_at_succeeds() {
        let ray = Ray::new(
            Point::new(Val(0.0), Val(1.0), Val(0.0)),
            UnitVector::x_direction(),
        );
        assert_eq!(ray.at(Val(2.0)), Point::new(Val(2.0), Val(1.0), Val(0.0)));
        assert!(!ray.inside());
    }
}

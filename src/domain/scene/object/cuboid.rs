use getset::CopyGetters;
use snafu::prelude::*;

use crate::domain::math::algebra::{UnitVector, Vector};
use crate::domain::math::geometry::{Axis, Point};
use crate::domain::math::numeric::Val;
use crate::domain::ray::{Ray, RayIntersection};

use super::def::{Shape, ray_hits_bounding_sphere, sphere_overlaps_cell};

const INTERSECTION_EPS: Val = Val(0.001);

/// Axis-aligned box with center `position` and full edge lengths `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Cuboid {
    position: Point,
    size: Vector,
    #[getset(skip)]
    bounding_radius: Val,
}

impl Cuboid {
    pub fn new(position: Point, size: Vector) -> Result<Self, TryNewCuboidError> {
        ensure!(
            size.x() > Val(0.0) && size.y() > Val(0.0) && size.z() > Val(0.0),
            InvalidSizeSnafu,
        );
        Ok(Self {
            position,
            size,
            bounding_radius: (size * Val(0.5)).norm(),
        })
    }

    /// Face normal chosen by which local coordinate sits on a
    /// half-extent, within a small epsilon.
    fn face_normal(&self, local: Vector) -> UnitVector {
        let half = self.size * Val(0.5);
        if local.x() >= half.x() - INTERSECTION_EPS {
            UnitVector::x_direction()
        } else if local.x() <= -half.x() + INTERSECTION_EPS {
            -UnitVector::x_direction()
        } else if local.y() >= half.y() - INTERSECTION_EPS {
            UnitVector::y_direction()
        } else if local.y() <= -half.y() + INTERSECTION_EPS {
            -UnitVector::y_direction()
        } else if local.z() >= half.z() - INTERSECTION_EPS {
            UnitVector::z_direction()
        } else {
            -UnitVector::z_direction()
        }
    }
}

impl Shape for Cuboid {
    fn intersect_ray(&self, ray: &Ray) -> Option<RayIntersection> {
        if !ray_hits_bounding_sphere(ray, self.position, self.bounding_radius) {
            return None;
        }

        let o = ray.start() - self.position;
        let d = ray.direction();

        let mut t_near = -Val::INFINITY;
        let mut t_far = Val::INFINITY;

        for axis in Axis::ALL {
            let half = self.size.axis(axis) * Val(0.5);
            let origin = o.axis(axis);
            let dir = d.axis(axis);

            if dir.abs() < INTERSECTION_EPS {
                // slab-parallel ray must start between the faces
                if origin < -half || origin > half {
                    return None;
                }
                continue;
            }

            let mut t0 = (-half - origin) / dir;
            let mut t1 = (half - origin) / dir;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far || t_far < Val(0.0) {
                return None;
            }
        }

        let t = if t_near > Val(0.0) {
            t_near
        } else if t_far > Val(0.0) {
            t_far
        } else {
            return None;
        };

        let local = o + d.to_vector() * t;
        Some(RayIntersection::new(
            t,
            self.position + local,
            self.face_normal(local),
        ))
    }

    fn intersect_cell(&self, cell_center: Point, cell_size: Vector) -> bool {
        sphere_overlaps_cell(self.position, self.bounding_radius, cell_center, cell_size)
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TryNewCuboidError {
    #[snafu(display("cuboid edge lengths are not all positive"))]
    InvalidSize,
}

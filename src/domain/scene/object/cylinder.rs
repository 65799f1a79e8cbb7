use getset::CopyGetters;
use snafu::prelude::*;

use crate::domain::math::algebra::{Product, UnitVector, Vector};
use crate::domain::math::geometry::{self, Axis, Point};
use crate::domain::math::numeric::Val;
use crate::domain::ray::{Ray, RayIntersection};

use super::def::{Shape, ray_hits_bounding_sphere, sphere_overlaps_cell};

/// Axis-aligned elliptic cylinder. `size.x` is the length along the
/// major axis, `size.y` and `size.z` the two ellipse radii in the
/// orthogonal plane (in canonical axis order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Cylinder {
    position: Point,
    size: Vector,
    axis: Axis,
    #[getset(skip)]
    bounding_radius: Val,
}

impl Cylinder {
    pub fn new(position: Point, size: Vector, axis: Axis) -> Result<Self, TryNewCylinderError> {
        ensure!(
            size.x() > Val(0.0) && size.y() > Val(0.0) && size.z() > Val(0.0),
            InvalidSizeSnafu,
        );
        let half_length = size.x() * Val(0.5);
        let max_radius = size.y().max(size.z());
        Ok(Self {
            position,
            size,
            axis,
            bounding_radius: (half_length * half_length + max_radius * max_radius).sqrt(),
        })
    }

    /// Intersection with an end-cap plane, in object space. The caps are
    /// one-sided, so at most one of the two can be hit for a given ray
    /// origin; the in-plane point must lie inside the ellipse.
    fn cap_hit(
        &self,
        origin: Vector,
        direction: UnitVector,
        cap: &geometry::Plane,
        (p, q): (Axis, Axis),
    ) -> Option<RayIntersection> {
        if cap.point_distance(Point::from(origin)) < Val(0.0) {
            return None;
        }

        let den = direction.dot(cap.normal());
        if den == Val(0.0) {
            return None;
        }

        let t = (cap.distance() - cap.normal().dot(origin)) / den;
        if t <= Val(0.0) {
            return None;
        }

        let local = origin + direction.to_vector() * t;
        let u = local.axis(p) / self.size.y();
        let v = local.axis(q) / self.size.z();
        if u * u + v * v <= Val(1.0) {
            Some(RayIntersection::new(t, Point::from(local), cap.normal()))
        } else {
            None
        }
    }

    fn nearest_cap_hit(
        &self,
        origin: Vector,
        direction: UnitVector,
        plane_axes: (Axis, Axis),
    ) -> Option<RayIntersection> {
        let cap_normal = UnitVector::axis_direction(self.axis);
        let half_length = self.size.x() * Val(0.5);
        let caps = [
            geometry::Plane::new(cap_normal, half_length),
            geometry::Plane::new(-cap_normal, half_length),
        ];
        caps.iter()
            .find_map(|cap| self.cap_hit(origin, direction, cap, plane_axes))
    }

    /// Surface candidate at parametric distance `t`, valid only while
    /// the hit lies between the end caps.
    fn surface_hit(
        &self,
        origin: Vector,
        direction: UnitVector,
        t: Val,
        (p, q): (Axis, Axis),
    ) -> Option<RayIntersection> {
        let local = origin + direction.to_vector() * t;
        let along = local.axis(self.axis);
        let half_length = self.size.x() * Val(0.5);
        if along < -half_length || along > half_length {
            return None;
        }

        let aa = self.size.y() * self.size.y();
        let bb = self.size.z() * self.size.z();
        let normal = Vector::zero()
            .with_axis(p, Val(2.0) * local.axis(p) / aa)
            .with_axis(q, Val(2.0) * local.axis(q) / bb)
            .normalize()
            .expect("surface gradient is nonzero off the cylinder axis");
        Some(RayIntersection::new(t, Point::from(local), normal))
    }

    fn to_world(&self, hit: RayIntersection) -> RayIntersection {
        RayIntersection::new(
            hit.distance(),
            self.position + hit.position().to_vector(),
            hit.normal(),
        )
    }
}

impl Shape for Cylinder {
    fn intersect_ray(&self, ray: &Ray) -> Option<RayIntersection> {
        if !ray_hits_bounding_sphere(ray, self.position, self.bounding_radius) {
            return None;
        }

        let o = ray.start() - self.position;
        let d = ray.direction();
        let plane_axes = self.axis.others();
        let (p, q) = plane_axes;

        let aa = self.size.y() * self.size.y();
        let bb = self.size.z() * self.size.z();

        let a = d.axis(p) * d.axis(p) / aa + d.axis(q) * d.axis(q) / bb;
        let b = Val(2.0) * (o.axis(p) * d.axis(p) / aa + o.axis(q) * d.axis(q) / bb);
        let c = o.axis(p) * o.axis(p) / aa + o.axis(q) * o.axis(q) / bb - Val(1.0);
        let discriminant = b * b - Val(4.0) * a * c;

        // a vanishes for rays parallel to the major axis; those can only
        // pierce a cap, as can rays missing the infinite surface
        if a == Val(0.0) || discriminant < Val(0.0) {
            return self
                .nearest_cap_hit(o, d, plane_axes)
                .map(|hit| self.to_world(hit));
        }

        let root = discriminant.sqrt();
        for t in [(-b - root) / (Val(2.0) * a), (-b + root) / (Val(2.0) * a)] {
            if t > Val(0.0) {
                let surface = self.surface_hit(o, d, t, plane_axes);
                let cap = self.nearest_cap_hit(o, d, plane_axes);

                let nearest = match (surface, cap) {
                    (Some(s), Some(c)) => Some(if c.distance() > s.distance() { s } else { c }),
                    (hit, None) | (None, hit) => hit,
                };
                return nearest.map(|hit| self.to_world(hit));
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
pub enum TryNewCylinderError {
    #[snafu(display("cylinder dimensions are not all positive"))]
    InvalidSize,
}

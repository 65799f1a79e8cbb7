use enum_dispatch::enum_dispatch;

use crate::domain::math::algebra::Vector;
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;
use crate::domain::ray::{Ray, RayIntersection};

use super::{Cuboid, Cylinder, Ellipsoid, Plane};

/// An analytic scene primitive: ray intersection for traversal and a
/// cell-overlap test for grid partitioning.
#[enum_dispatch]
pub trait Shape {
    fn intersect_ray(&self, ray: &Ray) -> Option<RayIntersection>;

    fn intersect_cell(&self, cell_center: Point, cell_size: Vector) -> bool;
}

#[enum_dispatch(Shape)]
#[derive(Debug, Clone, PartialEq)]
pub enum DynShape {
    Plane(Plane),
    Ellipsoid(Ellipsoid),
    Cuboid(Cuboid),
    Cylinder(Cylinder),
}

/// Conservative bounding-sphere versus cell axis-separation test shared
/// by the volumetric primitives.
pub(super) fn sphere_overlaps_cell(
    center: Point,
    radius: Val,
    cell_center: Point,
    cell_size: Vector,
) -> bool {
    let delta = cell_center - center;
    let half = cell_size * Val(0.5);

    delta.x().abs() <= half.x() + radius
        && delta.y().abs() <= half.y() + radius
        && delta.z().abs() <= half.z() + radius
}

/// True when a ray-sphere test against the bounding sphere yields any
/// hit in front of the ray; cheap pre-test before the exact primitive
/// math.
pub(super) fn ray_hits_bounding_sphere(ray: &Ray, center: Point, radius: Val) -> bool {
    use crate::domain::math::algebra::Product;

    let oc = ray.start() - center;
    let b = Val(2.0) * oc.dot(ray.direction());
    let c = oc.norm_squared() - radius * radius;
    let discriminant = b * b - Val(4.0) * c;

    if discriminant < Val(0.0) {
        return false;
    }
    // the far root must be in front of the ray
    (-b + discriminant.sqrt()) / Val(2.0) > Val(0.0)
}

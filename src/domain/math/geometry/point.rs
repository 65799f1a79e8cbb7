use std::ops::{Add, Sub};

use crate::domain::math::algebra::{UnitVector, Vector};
use crate::domain::math::numeric::Val;

use super::Axis;

/// A position in world space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point(Vector);

impl Point {
    #[inline]
    pub const fn new(x: Val, y: Val, z: Val) -> Self {
        Self(Vector::new(x, y, z))
    }

    #[inline]
    pub const fn broadcast(v: Val) -> Self {
        Self(Vector::broadcast(v))
    }

    #[inline]
    pub fn x(&self) -> Val {
        self.0.x()
    }

    #[inline]
    pub fn y(&self) -> Val {
        self.0.y()
    }

    #[inline]
    pub fn z(&self) -> Val {
        self.0.z()
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> Val {
        self.0.axis(axis)
    }

    #[inline]
    pub fn with_axis(self, axis: Axis, value: Val) -> Self {
        Self(self.0.with_axis(axis, value))
    }

    #[inline]
    pub fn to_vector(self) -> Vector {
        self.0
    }

    #[inline]
    pub fn component_min(&self, other: &Self) -> Self {
        Self(self.0.component_min(&other.0))
    }

    #[inline]
    pub fn component_max(&self, other: &Self) -> Self {
        Self(self.0.component_max(&other.0))
    }
}

impl From<Vector> for Point {
    #[inline]
    fn from(value: Vector) -> Self {
        Self(value)
    }
}

impl From<Point> for Vector {
    #[inline]
    fn from(value: Point) -> Self {
        value.0
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Vector) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl Add<UnitVector> for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: UnitVector) -> Self::Output {
        Self(self.0 + rhs.to_vector())
    }
}

impl Sub<Vector> for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Vector) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl Sub for Point {
    type Output = Vector;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

use std::ops::{Mul, Neg};

use rand::prelude::*;
use snafu::prelude::*;

use crate::domain::math::geometry::Axis;
use crate::domain::math::numeric::Val;

use super::{Product, Vector};

/// A vector with unit length, enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitVector(Vector);

impl UnitVector {
    #[inline]
    pub fn normalize(vector: Vector) -> Result<Self, TryNormalizeVectorError> {
        let norm_squared = vector.norm_squared();
        if norm_squared == Val(1.0) {
            Ok(UnitVector(vector))
        } else {
            ensure!(norm_squared > Val(0.0), ZeroVectorSnafu);
            Ok(UnitVector(vector / norm_squared.sqrt()))
        }
    }

    /// Uniform direction on the unit sphere via rejection sampling in
    /// the unit cube.
    pub fn sample_sphere(rng: &mut dyn RngCore) -> Self {
        let mut v = Vector::broadcast(Val(1.0));
        while v.norm_squared() > Val(1.0) {
            v = Vector::new(
                Val(2.0 * rng.random::<f64>() - 1.0),
                Val(2.0 * rng.random::<f64>() - 1.0),
                Val(2.0 * rng.random::<f64>() - 1.0),
            );
        }
        v.normalize().expect("rejection sampling never yields zero")
    }

    /// Uniform direction in the hemisphere around `axis`.
    pub fn sample_hemisphere(axis: UnitVector, rng: &mut dyn RngCore) -> Self {
        let mut direction = -axis;
        while direction.dot(axis) < Val(0.0) {
            direction = Self::sample_sphere(rng);
        }
        direction
    }

    #[inline]
    pub fn x_direction() -> Self {
        Self(Vector::new(Val(1.0), Val(0.0), Val(0.0)))
    }

    #[inline]
    pub fn y_direction() -> Self {
        Self(Vector::new(Val(0.0), Val(1.0), Val(0.0)))
    }

    #[inline]
    pub fn z_direction() -> Self {
        Self(Vector::new(Val(0.0), Val(0.0), Val(1.0)))
    }

    #[inline]
    pub fn axis_direction(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::x_direction(),
            Axis::Y => Self::y_direction(),
            Axis::Z => Self::z_direction(),
        }
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
    pub fn to_vector(self) -> Vector {
        self.0
    }
}

impl TryFrom<Vector> for UnitVector {
    type Error = TryNormalizeVectorError;

    #[inline]
    fn try_from(value: Vector) -> Result<Self, Self::Error> {
        Self::normalize(value)
    }
}

impl From<UnitVector> for Vector {
    #[inline]
    fn from(value: UnitVector) -> Self {
        value.0
    }
}

impl Neg for UnitVector {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<Val> for UnitVector {
    type Output = Vector;

    #[inline]
    fn mul(self, rhs: Val) -> Self::Output {
        self.0 * rhs
    }
}

impl Mul<UnitVector> for Val {
    type Output = Vector;

    #[inline]
    fn mul(self, rhs: UnitVector) -> Self::Output {
        rhs.0 * self
    }
}

impl Product for UnitVector {
    type Output = Vector;

    #[inline]
    fn dot(self, rhs: Self) -> Val {
        self.0.dot(rhs.0)
    }

    #[inline]
    fn cross(self, rhs: Self) -> Self::Output {
        self.0.cross(rhs.0)
    }
}

impl Product<Vector> for UnitVector {
    type Output = Vector;

    #[inline]
    fn dot(self, rhs: Vector) -> Val {
        self.0.dot(rhs)
    }

    #[inline]
    fn cross(self, rhs: Vector) -> Self::Output {
        self.0.cross(rhs)
    }
}

impl Product<UnitVector> for Vector {
    type Output = Vector;

    #[inline]
    fn dot(self, rhs: UnitVector) -> Val {
        self.dot(rhs.0)
    }

    #[inline]
    fn cross(self, rhs: UnitVector) -> Self::Output {
        self.cross(rhs.0)
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TryNormalizeVectorError {
    #[snafu(display("couldn't convert a zero vector to a unit vector"))]
    ZeroVector,
}

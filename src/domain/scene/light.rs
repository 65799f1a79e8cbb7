use enum_dispatch::enum_dispatch;
use rand::prelude::*;

use crate::domain::math::algebra::{UnitVector, Vector};
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;

/// A positional light source. The direction defines the axis of the
/// light's FOV cone; `fov` is the full cone angle in degrees.
#[enum_dispatch]
pub trait SceneLight {
    fn position(&self) -> Point;

    fn direction(&self) -> UnitVector;

    /// Raw emission power per color band, in Watt.
    fn power(&self) -> Vector;

    /// Power scaled for the direct-illumination term.
    fn scaled_power(&self) -> Vector;

    fn num_photons(&self) -> usize;

    fn fov(&self) -> Val;

    /// Zero for point lights.
    fn radius(&self) -> Val;

    /// Draw a photon origin and emission direction.
    fn sample_emission(&self, rng: &mut dyn RngCore) -> (Point, UnitVector);
}

#[enum_dispatch(SceneLight)]
#[derive(Debug, Clone, PartialEq)]
pub enum DynLight {
    Point(PointLight),
    Area(AreaLight),
}

/// Diffuse point light: photons leave uniformly in all directions.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    position: Point,
    direction: UnitVector,
    power: Vector,
    num_photons: usize,
    fov: Val,
}

impl PointLight {
    pub fn new(
        position: Point,
        direction: UnitVector,
        power: Vector,
        num_photons: usize,
        fov: Val,
    ) -> Self {
        Self {
            position,
            direction,
            power,
            num_photons,
            fov,
        }
    }
}

impl SceneLight for PointLight {
    fn position(&self) -> Point {
        self.position
    }

    fn direction(&self) -> UnitVector {
        self.direction
    }

    fn power(&self) -> Vector {
        self.power
    }

    fn scaled_power(&self) -> Vector {
        self.power / (Val(4.0) * Val::PI)
    }

    fn num_photons(&self) -> usize {
        self.num_photons
    }

    fn fov(&self) -> Val {
        self.fov
    }

    fn radius(&self) -> Val {
        Val(0.0)
    }

    fn sample_emission(&self, rng: &mut dyn RngCore) -> (Point, UnitVector) {
        (self.position, UnitVector::sample_sphere(rng))
    }
}

/// Spherical area light: photons leave from a point on the radius
/// sphere, into the hemisphere around the outward surface direction.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaLight {
    position: Point,
    direction: UnitVector,
    power: Vector,
    num_photons: usize,
    fov: Val,
    radius: Val,
}

impl AreaLight {
    pub fn new(
        position: Point,
        direction: UnitVector,
        power: Vector,
        num_photons: usize,
        fov: Val,
        radius: Val,
    ) -> Self {
        Self {
            position,
            direction,
            power,
            num_photons,
            fov,
            radius,
        }
    }
}

impl SceneLight for AreaLight {
    fn position(&self) -> Point {
        self.position
    }

    fn direction(&self) -> UnitVector {
        self.direction
    }

    fn power(&self) -> Vector {
        self.power
    }

    fn scaled_power(&self) -> Vector {
        self.power / (Val(4.0) * Val::PI * self.radius)
    }

    fn num_photons(&self) -> usize {
        self.num_photons
    }

    fn fov(&self) -> Val {
        self.fov
    }

    fn radius(&self) -> Val {
        self.radius
    }

    // TODO: weight the emission direction by the cosine to the surface
    // normal instead of sampling the hemisphere uniformly.
    fn sample_emission(&self, rng: &mut dyn RngCore) -> (Point, UnitVector) {
        let outward = UnitVector::sample_sphere(rng);
        let emission_pos = self.position + outward * self.radius;
        let emission_dir = UnitVector::sample_hemisphere(outward, rng);
        (emission_pos, emission_dir)
    }
}

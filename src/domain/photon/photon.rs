use std::sync::LazyLock;

use getset::CopyGetters;

use crate::domain::math::algebra::{UnitVector, Vector};
use crate::domain::math::geometry::{Axis, Point};
use crate::domain::math::numeric::Val;

use super::query::SpatialNode;

const NUM_DIRECTIONS: usize = 256;

/// Process-wide sine/cosine tables for the packed photon direction.
/// Index i covers theta in [0, pi) and phi in [0, 2*pi) uniformly.
struct DirectionTables {
    costheta: [f64; NUM_DIRECTIONS],
    sintheta: [f64; NUM_DIRECTIONS],
    cosphi: [f64; NUM_DIRECTIONS],
    sinphi: [f64; NUM_DIRECTIONS],
}

static DIRECTIONS: LazyLock<DirectionTables> = LazyLock::new(|| {
    let mut tables = DirectionTables {
        costheta: [0.0; NUM_DIRECTIONS],
        sintheta: [0.0; NUM_DIRECTIONS],
        cosphi: [0.0; NUM_DIRECTIONS],
        sinphi: [0.0; NUM_DIRECTIONS],
    };
    for i in 0..NUM_DIRECTIONS {
        let angle = (i as f64) * std::f64::consts::PI / (NUM_DIRECTIONS as f64);
        tables.costheta[i] = angle.cos();
        tables.sintheta[i] = angle.sin();
        tables.cosphi[i] = (2.0 * angle).cos();
        tables.sinphi[i] = (2.0 * angle).sin();
    }
    tables
});

/// A light sample deposited on a surface. The emission direction is
/// stored as two 8-bit spherical indices into the shared tables; the
/// splitting-axis tag is stamped during kd-tree balancing.
#[derive(Debug, Clone, PartialEq, CopyGetters)]
pub struct Photon {
    #[getset(get_copy = "pub")]
    position: Point,
    #[getset(get_copy = "pub")]
    power: Vector,
    #[getset(get_copy = "pub")]
    normal: UnitVector,
    #[getset(get_copy = "pub")]
    irradiance: Vector,
    #[getset(get_copy = "pub")]
    axis: Axis,
    theta: u8,
    phi: u8,
}

impl Photon {
    pub fn new(position: Point, direction: UnitVector, power: Vector) -> Self {
        let mut photon = Self {
            position,
            power,
            normal: direction,
            irradiance: Vector::zero(),
            axis: Axis::X,
            theta: 0,
            phi: 0,
        };
        photon.set_direction(direction);
        photon
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_power(&mut self, power: Vector) {
        self.power = power;
    }

    pub fn set_normal(&mut self, normal: UnitVector) {
        self.normal = normal;
    }

    pub fn set_irradiance(&mut self, irradiance: Vector) {
        self.irradiance = irradiance;
    }

    pub fn set_axis(&mut self, axis: Axis) {
        self.axis = axis;
    }

    /// Quantize a Euclidean direction into the two spherical indices.
    pub fn set_direction(&mut self, direction: UnitVector) {
        let ntheta = (f64::from(direction.z()).acos() * (NUM_DIRECTIONS as f64 / std::f64::consts::PI)) as i64;
        let nphi = (f64::from(direction.y()).atan2(direction.x().into())
            * (NUM_DIRECTIONS as f64 / (2.0 * std::f64::consts::PI))) as i64;

        self.theta = ntheta.min(NUM_DIRECTIONS as i64 - 1) as u8;
        self.phi = if nphi < 0 {
            (nphi + NUM_DIRECTIONS as i64) as u8
        } else {
            nphi.min(NUM_DIRECTIONS as i64 - 1) as u8
        };
    }

    /// The tabulated direction reconstructed from the packed indices.
    pub fn direction(&self) -> UnitVector {
        let t = &*DIRECTIONS;
        let (ti, pi) = (self.theta as usize, self.phi as usize);
        Vector::new(
            Val(t.sintheta[ti] * t.cosphi[pi]),
            Val(t.sintheta[ti] * t.sinphi[pi]),
            Val(t.costheta[ti]),
        )
        .normalize()
        .expect("tabulated directions have unit length")
    }
}

impl Default for Photon {
    fn default() -> Self {
        Self::new(Point::default(), UnitVector::x_direction(), Vector::zero())
    }
}

impl SpatialNode for Photon {
    fn position(&self) -> Point {
        self.position
    }

    fn normal(&self) -> UnitVector {
        self.normal
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::math::algebra::Product;

    use super::*;

    #[test]
    fn photon_direction_roundtrip_is_close() {
        let directions = [
            Vector::new(Val(1.0), Val(0.0), Val(0.0)),
            Vector::new(Val(0.0), Val(1.0), Val(0.0)),
            Vector::new(Val(0.0), Val(0.0), Val(-1.0)),
            Vector::new(Val(1.0), Val(-2.0), Val(3.0)),
            Vector::new(Val(-0.3), Val(-0.4), Val(-0.5)),
        ];
        for v in directions {
            let dir = v.normalize().unwrap();
            let photon = Photon::new(Point::default(), dir, Vector::zero());
            // One table step is about 2 degrees of arc, so the packed
            // direction must stay within a few degrees of the input.
            assert!(photon.direction().dot(dir) > Val(0.995));
        }
    }

    #[test]
    fn photon_negative_phi_wraps_into_range() {
        let dir = Vector::new(Val(0.5), Val(-0.5), Val(0.0)).normalize().unwrap();
        let photon = Photon::new(Point::default(), dir, Vector::zero());
        assert!(photon.direction().y() < Val(0.0));
        assert!(photon.direction().x() > Val(0.0));
    }
}

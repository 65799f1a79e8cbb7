use crate::domain::math::algebra::{Product, UnitVector};
use crate::domain::math::numeric::Val;

/// Mirror `v` about the surface normal `n`.
#[inline]
pub fn reflect(v: UnitVector, n: UnitVector) -> UnitVector {
    let r = v.to_vector() - n * (n.dot(v) * Val(2.0));
    r.normalize()
        .expect("reflection of a unit vector is a unit vector")
}

/// Refract `v` at a surface with normal `n`, going from a medium with
/// refractive index `n1` into one with index `n2`. Returns `None` on
/// total internal reflection (negative discriminant).
pub fn refract(v: UnitVector, n: UnitVector, n1: Val, n2: Val) -> Option<UnitVector> {
    let eta = n1 / n2;
    let cos = -n.dot(v);
    let discriminant = Val(1.0) - eta * eta * (Val(1.0) - cos * cos);

    if discriminant > Val(0.0) {
        let r = v * eta + n * (eta * cos - discriminant.sqrt());
        Some(
            r.normalize()
                .expect("refracted direction should not be a zero vector"),
        )
    } else {
        None
    }
}

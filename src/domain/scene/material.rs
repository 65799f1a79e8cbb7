use enum_dispatch::enum_dispatch;
use getset::{CopyGetters, Getters, WithSetters};

use crate::domain::math::algebra::{Product, Vector};
use crate::domain::math::numeric::Val;
use crate::domain::ray::optics::reflect;
use crate::domain::ray::{Ray, RayIntersection};

use super::light::{DynLight, SceneLight};

/// Direct-illumination term of a material under a single light.
#[enum_dispatch]
pub trait ReflectionModel {
    fn intensity(
        &self,
        material: &Material,
        light: &DynLight,
        view_ray: &Ray,
        light_ray: &Ray,
        intersection: &RayIntersection,
    ) -> Vector;
}

#[enum_dispatch(ReflectionModel)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynReflectionModel {
    Phong(Phong),
}

/// Classic Phong shading: a cone-gated Lambertian term plus a specular
/// lobe around the mirrored light direction, both attenuated by the
/// squared distance to the light.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Phong;

impl ReflectionModel for Phong {
    fn intensity(
        &self,
        material: &Material,
        light: &DynLight,
        view_ray: &Ray,
        light_ray: &Ray,
        intersection: &RayIntersection,
    ) -> Vector {
        let v = view_ray.direction();
        let d = light.direction();
        let l = light_ray.direction();
        let n = intersection.normal();

        let mut illumination = Vector::zero();
        let mut specular_dir = None;

        let distance_sq = (intersection.position() - light.position()).norm_squared();

        // the lit point must fall within the light's FOV cone
        if d.dot(-l).acos().to_degrees() < light.fov() * Val(0.5) {
            let lambert = n.dot(l).clamp(Val(0.0), Val(1.0));
            let irradiance = light.scaled_power() * lambert / distance_sq;
            illumination += material.diffuse_reflectiveness() * irradiance;
            specular_dir = Some(reflect(l, n));
        }

        if material.specular_exponent() > Val(0.0) {
            if let Some(r) = specular_dir {
                let alignment = v.dot(r);
                if alignment > Val(0.0) {
                    let irradiance = light.scaled_power()
                        * alignment.powf(material.specular_exponent())
                        / distance_sq;
                    illumination += material.specular_reflectiveness() * irradiance;
                }
            }
        }

        illumination
    }
}

/// Surface material. Reflectance triples are probabilities per color
/// band; percent-encoded description fields are divided by 100 before
/// they get here.
#[derive(Debug, Clone, PartialEq, CopyGetters, Getters, WithSetters)]
#[getset(set_with = "pub")]
pub struct Material {
    /// How much slower light travels inside this material than outside.
    #[getset(get_copy = "pub")]
    refraction_index: Val,
    /// Multiplier for the absorbance of refracted rays, in [0, 1].
    #[getset(get_copy = "pub")]
    beer_coefficient: Val,
    #[getset(get_copy = "pub")]
    specular_exponent: Val,
    #[getset(get_copy = "pub")]
    diffuse_reflectiveness: Vector,
    #[getset(get_copy = "pub")]
    specular_reflectiveness: Vector,
    #[getset(get_copy = "pub")]
    specular_refractiveness: Vector,
    /// Reserved; texture lookups are not implemented.
    #[getset(get = "pub")]
    texture: String,
    #[getset(get_copy = "pub")]
    reflection_model: DynReflectionModel,
}

impl Material {
    #[inline]
    pub fn is_specularly_reflective(&self) -> bool {
        self.specular_reflectiveness.norm_squared() > Val(0.0)
    }

    #[inline]
    pub fn is_specularly_refractive(&self) -> bool {
        self.specular_refractiveness.norm_squared() > Val(0.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            refraction_index: Val(1.0),
            beer_coefficient: Val(0.0),
            specular_exponent: Val(1.0),
            diffuse_reflectiveness: Vector::zero(),
            specular_reflectiveness: Vector::zero(),
            specular_refractiveness: Vector::zero(),
            texture: String::new(),
            reflection_model: DynReflectionModel::Phong(Phong),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::math::algebra::UnitVector;
    use crate::domain::math::geometry::Point;
    use crate::domain::scene::light::PointLight;

    use super::*;

    fn lambertian() -> Material {
        Material::default().with_diffuse_reflectiveness(Vector::broadcast(Val(0.8)))
    }

    #[test]
    fn phong_intensity_matches_lambert_term() {
        let light: DynLight = PointLight::new(
            Point::new(Val(0.0), Val(2.0), Val(0.0)),
            -UnitVector::y_direction(),
            Vector::broadcast(Val(100.0)),
            0,
            Val(180.0),
        )
        .into();
        let material = lambertian();

        // surface point at the origin, normal up, light straight above
        let intersection = RayIntersection::new(
            Val(1.0),
            Point::default(),
            UnitVector::y_direction(),
        );
        let view_ray = Ray::new(
            Point::new(Val(0.0), Val(1.0), Val(1.0)),
            (Point::default() - Point::new(Val(0.0), Val(1.0), Val(1.0)))
                .normalize()
                .unwrap(),
        );
        let light_ray = Ray::new(Point::default(), UnitVector::y_direction());

        let intensity = Phong.intensity(&material, &light, &view_ray, &light_ray, &intersection);

        // scaled power / (4 pi) * (N . L = 1) / r^2 = 100 / (4 pi) / 4,
        // times the diffuse reflectance 0.8
        let expected = Val(100.0) / (Val(4.0) * Val::PI) / Val(4.0) * Val(0.8);
        assert_eq!(intensity, Vector::broadcast(expected));
    }

    #[test]
    fn phong_intensity_is_zero_outside_light_cone() {
        let light: DynLight = PointLight::new(
            Point::new(Val(0.0), Val(2.0), Val(0.0)),
            UnitVector::x_direction(),
            Vector::broadcast(Val(100.0)),
            0,
            Val(30.0),
        )
        .into();
        let material = lambertian();

        let intersection = RayIntersection::new(
            Val(1.0),
            Point::default(),
            UnitVector::y_direction(),
        );
        let view_ray = Ray::new(Point::new(Val(0.0), Val(1.0), Val(1.0)), -UnitVector::z_direction());
        let light_ray = Ray::new(Point::default(), UnitVector::y_direction());

        let intensity = Phong.intensity(&material, &light, &view_ray, &light_ray, &intersection);
        assert_eq!(intensity, Vector::zero());
    }

    #[test]
    fn material_specularity_flags_follow_reflectances() {
        let material = Material::default();
        assert!(!material.is_specularly_reflective());
        assert!(!material.is_specularly_refractive());

        let mirror = material
            .clone()
            .with_specular_reflectiveness(Vector::broadcast(Val(1.0)));
        assert!(mirror.is_specularly_reflective());

        let glass = material.with_specular_refractiveness(Vector::broadcast(Val(0.9)));
        assert!(glass.is_specularly_refractive());
    }
}

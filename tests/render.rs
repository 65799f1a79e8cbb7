use scattered_ray::domain::camera::Camera;
use scattered_ray::domain::math::algebra::{UnitVector, Vector};
use scattered_ray::domain::math::geometry::{self, Point};
use scattered_ray::domain::math::numeric::Val;
use scattered_ray::domain::renderer::{Frame, RayTracer, TracerConfig};
use scattered_ray::domain::scene::Scene;
use scattered_ray::domain::scene::light::{PointLight, SceneLight};
use scattered_ray::domain::scene::material::Material;
use scattered_ray::domain::scene::object::{Ellipsoid, Plane};

fn lambertian(reflectiveness: Vector) -> Material {
    Material::default()
        .with_diffuse_reflectiveness(reflectiveness)
        .with_specular_exponent(Val(0.0))
}

#[test]
fn direct_illumination_matches_the_phong_term() {
    // a Lambertian sphere above a floor plane, one point light, no
    // photons: pure Whitted shading
    let mut scene = Scene::new(Point::broadcast(Val(-100.0)), Point::broadcast(Val(100.0)));
    scene.add_material("matte", lambertian(Vector::broadcast(Val(0.8))));
    scene.add_light(PointLight::new(
        Point::new(Val(0.0), Val(1.0), Val(0.0)),
        -UnitVector::z_direction(),
        Vector::broadcast(Val(100.0)),
        0,
        Val(180.0),
    ));
    scene.add_object(
        Ellipsoid::new(Point::new(Val(0.0), Val(1.0), Val(-5.0)), Vector::broadcast(Val(1.0)))
            .unwrap(),
        "matte",
    );
    scene.add_object(
        Plane::new(geometry::Plane::new(UnitVector::y_direction(), Val(0.0))),
        "matte",
    );

    let camera = Camera::new(
        Point::new(Val(0.0), Val(1.0), Val(5.0)),
        Point::new(Val(0.0), Val(1.0), Val(-5.0)),
        Val(90.0),
        Val(2.0),
        11,
        11,
    )
    .unwrap();

    let config = TracerConfig::default().with_num_threads(1).with_seed(1);
    let tracer = RayTracer::new(config, &scene);
    assert!(!tracer.photon_mapping());

    let mut frame = Frame::new(11, 11);
    tracer.render(&scene, &camera, &mut frame);

    // center pixel: the ray hits the sphere head-on at (0, 1, -4) with
    // N . L = 1 and a squared light distance of 16
    let light = &scene.lights()[0];
    let expected = Vector::broadcast(Val(0.8))
        * (light.scaled_power() * Val(1.0) / Val(16.0));
    assert_eq!(frame.pixel(5, 5), expected);

    // the sky above the horizon receives nothing
    assert_eq!(frame.pixel(5, 0), Vector::zero());
}

#[test]
fn mirror_reflects_the_scene_behind_the_camera() {
    // mirror plane in front of the camera, lit diffuse sphere behind it
    let mut scene = Scene::new(Point::broadcast(Val(-100.0)), Point::broadcast(Val(100.0)));
    scene.add_material("matte", lambertian(Vector::broadcast(Val(0.8))));
    scene.add_material(
        "mirror",
        Material::default()
            .with_specular_reflectiveness(Vector::broadcast(Val(1.0)))
            .with_specular_exponent(Val(0.0)),
    );
    scene.add_light(PointLight::new(
        Point::default(),
        UnitVector::z_direction(),
        Vector::broadcast(Val(100.0)),
        0,
        Val(180.0),
    ));
    scene.add_object(
        Plane::new(geometry::Plane::new(UnitVector::z_direction(), Val(-5.0))),
        "mirror",
    );
    scene.add_object(
        Ellipsoid::new(Point::new(Val(0.0), Val(0.0), Val(5.0)), Vector::broadcast(Val(1.0)))
            .unwrap(),
        "matte",
    );

    let camera = Camera::new(
        Point::default(),
        Point::new(Val(0.0), Val(0.0), Val(-1.0)),
        Val(90.0),
        Val(2.0),
        11,
        11,
    )
    .unwrap();

    let config = TracerConfig::default()
        .with_num_threads(1)
        .with_max_ray_depth(2)
        .with_seed(1);
    let tracer = RayTracer::new(config, &scene);

    let mut frame = Frame::new(11, 11);
    tracer.render(&scene, &camera, &mut frame);

    // the reflected ray hits the sphere head-on at (0, 0, 4); the
    // mirror passes that shading through unattenuated
    let light = &scene.lights()[0];
    let expected = Vector::broadcast(Val(0.8))
        * (light.scaled_power() * Val(1.0) / Val(16.0));
    assert_eq!(frame.pixel(5, 5), expected);
}

#[test]
fn beer_absorption_tints_light_through_glass() {
    let build_scene = |beer: Val| {
        let mut scene =
            Scene::new(Point::broadcast(Val(-100.0)), Point::broadcast(Val(100.0)));
        scene.add_material("matte", lambertian(Vector::broadcast(Val(0.8))));
        scene.add_material(
            "glass",
            Material::default()
                .with_refraction_index(Val(1.52))
                .with_beer_coefficient(beer)
                .with_specular_exponent(Val(0.0))
                // red-heavy absorbance: the red band attenuates fastest
                .with_diffuse_reflectiveness(Vector::new(Val(0.9), Val(0.1), Val(0.1)))
                .with_specular_refractiveness(Vector::broadcast(Val(0.9))),
        );
        scene.add_light(PointLight::new(
            Point::new(Val(0.0), Val(0.0), Val(-3.0)),
            -UnitVector::z_direction(),
            Vector::broadcast(Val(100.0)),
            0,
            Val(180.0),
        ));
        scene.add_object(
            Ellipsoid::new(Point::default(), Vector::broadcast(Val(1.0))).unwrap(),
            "glass",
        );
        scene.add_object(
            Plane::new(geometry::Plane::new(UnitVector::z_direction(), Val(-10.0))),
            "matte",
        );
        scene
    };

    let render = |scene: &Scene| {
        let camera = Camera::new(
            Point::new(Val(0.0), Val(0.0), Val(5.0)),
            Point::default(),
            Val(90.0),
            Val(2.0),
            11,
            11,
        )
        .unwrap();
        let config = TracerConfig::default()
            .with_num_threads(1)
            .with_max_ray_depth(4)
            .with_seed(1);
        let tracer = RayTracer::new(config, scene);
        let mut frame = Frame::new(11, 11);
        tracer.render(scene, &camera, &mut frame);
        frame.pixel(5, 5)
    };

    let clear = render(&build_scene(Val(0.0)));
    let tinted = render(&build_scene(Val(0.5)));

    // without absorption the wall seen through the glass is gray
    assert!(clear.x() > Val(0.0));
    assert_eq!(clear.x(), clear.y());

    // Beer-Lambert attenuation removes red faster than green/blue
    assert!(tinted.x() < tinted.y());
    assert_eq!(tinted.y(), tinted.z());
}

#[test]
fn photon_mapping_lights_surfaces_outside_the_direct_cone() {
    // a box room around a downward-facing light: the ceiling lies
    // outside the direct cone and is lit by gathered photons only
    let mut scene = Scene::new(Point::broadcast(Val(-20.0)), Point::broadcast(Val(20.0)));
    scene.add_material("matte", lambertian(Vector::broadcast(Val(0.6))));
    scene.add_light(PointLight::new(
        Point::new(Val(0.0), Val(5.0), Val(-2.0)),
        -UnitVector::y_direction(),
        Vector::broadcast(Val(250.0)),
        4000,
        Val(130.0),
    ));

    // one-sided planes with inward-facing normals
    let walls = [
        (UnitVector::y_direction(), Val(0.0)),    // floor
        (-UnitVector::y_direction(), Val(-10.0)), // ceiling at y = 10
        (UnitVector::x_direction(), Val(-5.0)),   // left wall
        (-UnitVector::x_direction(), Val(-5.0)),  // right wall
        (UnitVector::z_direction(), Val(-10.0)),  // back wall
        (-UnitVector::z_direction(), Val(-5.0)),  // front wall
    ];
    for (normal, distance) in walls {
        scene.add_object(
            Plane::new(geometry::Plane::new(normal, distance)),
            "matte",
        );
    }

    let camera = Camera::new(
        Point::new(Val(0.0), Val(5.0), Val(4.0)),
        Point::new(Val(0.0), Val(9.5), Val(-2.0)),
        Val(90.0),
        Val(2.0),
        11,
        11,
    )
    .unwrap();

    let config = TracerConfig::default()
        .with_num_threads(2)
        .with_max_ray_depth(3)
        .with_max_photon_depth(5)
        .with_photon_search_count(64)
        .with_photon_search_radius(Val(4.0))
        .with_seed(7);
    let tracer = RayTracer::new(config, &scene);
    assert!(tracer.photon_mapping());

    let mut frame = Frame::new(11, 11);
    let stats = tracer.render(&scene, &camera, &mut frame);

    // the ceiling is reached by photons, not by shadow rays
    assert!(stats.max().max_component() > Val(0.0));
    assert!(
        frame.pixel(5, 5).max_component() > Val(0.0),
        "ceiling received no indirect illumination",
    );
}

#[test]
fn rays_spawned_on_surfaces_do_not_self_hit() {
    // a mirror floor under a light: the reflected ray starts on the
    // floor itself; without the spawn offset it would re-hit the plane
    // at distance zero and recurse into darkness
    let mut scene = Scene::new(Point::broadcast(Val(-100.0)), Point::broadcast(Val(100.0)));
    scene.add_material(
        "mirror",
        Material::default()
            .with_specular_reflectiveness(Vector::broadcast(Val(1.0)))
            .with_specular_exponent(Val(0.0)),
    );
    scene.add_material("matte", lambertian(Vector::broadcast(Val(0.8))));
    scene.add_light(PointLight::new(
        Point::new(Val(0.0), Val(2.0), Val(-5.0)),
        -UnitVector::y_direction(),
        Vector::broadcast(Val(100.0)),
        0,
        Val(360.0),
    ));
    scene.add_object(
        Plane::new(geometry::Plane::new(UnitVector::y_direction(), Val(0.0))),
        "mirror",
    );
    // lit sphere placed along the center pixel's reflected path
    scene.add_object(
        Ellipsoid::new(
            Point::new(Val(0.0), Val(5.0), Val(-10.5)),
            Vector::broadcast(Val(2.0)),
        )
        .unwrap(),
        "matte",
    );

    let camera = Camera::new(
        Point::new(Val(0.0), Val(4.0), Val(3.0)),
        Point::new(Val(0.0), Val(0.0), Val(-3.0)),
        Val(90.0),
        Val(2.0),
        11,
        11,
    )
    .unwrap();

    let config = TracerConfig::default()
        .with_num_threads(1)
        .with_max_ray_depth(3)
        .with_seed(1);
    let tracer = RayTracer::new(config, &scene);
    let mut frame = Frame::new(11, 11);
    tracer.render(&scene, &camera, &mut frame);

    // the center pixel bounces off the mirror floor into the sphere; a
    // self-hit at the spawn point would leave it black
    assert!(frame.pixel(5, 5).max_component() > Val(0.0));
}

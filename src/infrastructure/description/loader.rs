use std::path::{Path, PathBuf};

use serde::Deserialize;
use snafu::prelude::*;

use crate::domain::camera::Camera;
use crate::domain::math::algebra::Vector;
use crate::domain::math::geometry::{self, Axis, Point};
use crate::domain::math::numeric::Val;
use crate::domain::photon::PhotonStructure;
use crate::domain::renderer::{GatherConfig, TracerConfig};
use crate::domain::scene::Scene;
use crate::domain::scene::light::{AreaLight, PointLight};
use crate::domain::scene::material::Material;
use crate::domain::scene::object::{Cuboid, Cylinder, Ellipsoid, Plane};

use super::def::{Description, DescriptionLoader, WindowConfig};
use super::error::*;

/// Loads the nested table-of-values scene description from a TOML file.
pub struct TomlDescriptionLoader {
    path: PathBuf,
}

impl TomlDescriptionLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DescriptionLoader for TomlDescriptionLoader {
    fn load(&self) -> Result<Description, LoadDescriptionError> {
        let content = std::fs::read_to_string(&self.path).context(ReadFileSnafu {
            path: self.path.clone(),
        })?;
        parse_description(&content)
    }
}

fn parse_description(content: &str) -> Result<Description, LoadDescriptionError> {
    let config: TomlConfig = toml::from_str(content).context(ParseTomlSnafu)?;

    let window = parse_window(&config.window);
    let camera = parse_camera(&config.scene.camera, window.width, window.height)?;
    let tracer = parse_tracer(&config.raytracer)?;

    let mut scene = Scene::new(
        config.scene.min_bounds.as_point(),
        config.scene.max_bounds.as_point(),
    );

    for material in &config.scene.materials {
        scene.add_material(&material.kind, parse_material(material));
    }
    for (index, light) in config.scene.lights.iter().enumerate() {
        add_light(&mut scene, light, index)?;
    }
    for (index, object) in config.scene.objects.iter().enumerate() {
        add_object(&mut scene, object, index)?;
    }

    if config.raytracer.gather.grid_partitioning {
        scene.build_grid();
    }

    Ok(Description {
        window,
        camera,
        scene,
        tracer,
    })
}

fn parse_window(window: &TomlWindow) -> WindowConfig {
    // odd dimensions give the image an exact center pixel
    let force_odd = |size: usize| size + if size % 2 == 0 { 1 } else { 0 };
    WindowConfig {
        width: force_odd(window.xsize),
        height: force_odd(window.ysize),
        title: window.title.clone(),
        make_dump: window.make_dump,
        white_balance_range: window.white_balance_range.map(Val),
    }
}

fn parse_camera(
    camera: &TomlCamera,
    width: usize,
    height: usize,
) -> Result<Camera, LoadDescriptionError> {
    let built = Camera::new(
        camera.pos.as_point(),
        camera.vrp.as_point(),
        Val(camera.vfov),
        Val(camera.vplane.y),
        width,
        height,
    )
    .context(InvalidCameraSnafu)?;

    if camera.render_dof {
        // the focal plane defaults to twice the view-plane distance
        let fplane_dist = camera
            .fplane_dist
            .map(Val)
            .unwrap_or(built.view_plane_distance() * Val(2.0));
        built
            .with_depth_of_field(fplane_dist, camera.lens_aperture)
            .context(InvalidCameraSnafu)
    } else {
        Ok(built)
    }
}

fn parse_tracer(raytracer: &TomlRaytracer) -> Result<TracerConfig, LoadDescriptionError> {
    let gather = GatherConfig::default()
        .with_structure(raytracer.gather.structure)
        .with_sphere_compression(raytracer.gather.sphere_compression)
        .with_sphere_compression_ratio(Val(raytracer.gather.sphere_compression_ratio))
        .with_filter(raytracer.gather.filter)
        .with_filter_constant(Val(raytracer.gather.filter_constant))
        .with_use_furthest_photon_dist(raytracer.gather.use_furthest_photon_dist)
        .with_precompute_irradiance(raytracer.gather.precompute_irradiance)
        .with_energy_conservation(raytracer.gather.energy_conservation)
        .with_indirect_only(raytracer.gather.indirect_only)
        .with_material_multiply(raytracer.gather.material_multiply)
        .with_gather_rays(raytracer.gather.gather_rays)
        .with_gather_ray_weight(Val(raytracer.gather.gather_ray_weight))
        .with_monte_carlo_soft_shadows(raytracer.gather.monte_carlo_soft_shadows)
        .with_soft_shadow_samples(raytracer.gather.soft_shadow_samples)
        .with_grid_partitioning(raytracer.gather.grid_partitioning);

    let config = TracerConfig::default()
        .with_num_threads(raytracer.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        }))
        .with_anti_aliasing(raytracer.anti_aliasing)
        .with_max_ray_depth(raytracer.max_ray_depth)
        .with_max_photon_depth(raytracer.max_photon_depth)
        .with_photon_search_count(raytracer.photon_search_count)
        .with_photon_search_radius(Val(raytracer.photon_search_radius))
        .with_seed(raytracer.seed)
        .with_gather(gather);

    config.validate().context(InvalidTracerConfigSnafu)?;
    Ok(config)
}

fn parse_material(material: &TomlMaterial) -> Material {
    // percent-encoded fields become [0, 1] factors
    let pct = |v: f64| Val(v / 100.0);
    let pct3 = |v: &TomlVec3| v.as_vector() / Val(100.0);

    Material::default()
        .with_texture(material.texture.clone())
        .with_refraction_index(pct(material.refraction_index))
        .with_beer_coefficient(pct(material.beer_coefficient))
        .with_specular_exponent(pct(material.specular_exponent))
        .with_diffuse_reflectiveness(pct3(&material.diffuse_reflectiveness))
        .with_specular_reflectiveness(pct3(&material.specular_reflectiveness))
        .with_specular_refractiveness(pct3(&material.specular_refractiveness))
}

fn add_light(
    scene: &mut Scene,
    light: &TomlLight,
    index: usize,
) -> Result<(), LoadDescriptionError> {
    let direction = light
        .direction
        .as_vector()
        .normalize()
        .ok()
        .context(InvalidLightSnafu {
            index,
            message: "light direction must be a nonzero vector",
        })?;
    let position = light.position.as_point();
    let power = light.power.as_vector();

    if light.radius <= 0.0 {
        scene.add_light(PointLight::new(
            position,
            direction,
            power,
            light.num_photons,
            Val(light.fov.unwrap_or(90.0)),
        ));
    } else {
        scene.add_light(AreaLight::new(
            position,
            direction,
            power,
            light.num_photons,
            Val(light.fov.unwrap_or(360.0)),
            Val(light.radius),
        ));
    }
    Ok(())
}

fn add_object(
    scene: &mut Scene,
    object: &TomlObject,
    index: usize,
) -> Result<(), LoadDescriptionError> {
    let position = object.position.as_point();
    let size = object.size.as_vector();

    match object.kind.as_str() {
        "ellipse" => {
            let shape = Ellipsoid::new(position, size).map_err(|e| invalid_object(index, e))?;
            scene.add_object(shape, &object.material);
        }
        "plane" => {
            // the plane normal is percent-encoded like material triples
            let normal = (object.normal.as_vector() / Val(100.0))
                .normalize()
                .ok()
                .context(InvalidObjectSnafu {
                    index,
                    message: "plane normal must be a nonzero vector",
                })?;
            let surface = geometry::Plane::new(normal, Val(object.distance));
            scene.add_object(Plane::new(surface), &object.material);
        }
        "box" => {
            let shape = Cuboid::new(position, size).map_err(|e| invalid_object(index, e))?;
            scene.add_object(shape, &object.material);
        }
        "cylinder" => {
            let axis = Axis::try_from(object.axis).map_err(|axis| {
                invalid_object(index, format!("cylinder axis {} is out of range", axis))
            })?;
            let shape =
                Cylinder::new(position, size, axis).map_err(|e| invalid_object(index, e))?;
            scene.add_object(shape, &object.material);
        }
        kind => {
            return UnsupportedShapeSnafu { kind, index }.fail();
        }
    }
    Ok(())
}

fn invalid_object(index: usize, message: impl ToString) -> LoadDescriptionError {
    InvalidObjectSnafu {
        index,
        message: message.to_string(),
    }
    .build()
}

// ---- TOML schema ---------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlConfig {
    #[serde(default)]
    window: TomlWindow,
    scene: TomlScene,
    #[serde(default)]
    raytracer: TomlRaytracer,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
struct TomlVec3 {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    z: f64,
}

impl TomlVec3 {
    fn as_vector(&self) -> Vector {
        Vector::new(Val(self.x), Val(self.y), Val(self.z))
    }

    fn as_point(&self) -> Point {
        Point::new(Val(self.x), Val(self.y), Val(self.z))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlWindow {
    #[serde(default = "default_xsize")]
    xsize: usize,
    #[serde(default = "default_ysize")]
    ysize: usize,
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_true")]
    make_dump: bool,
    #[serde(default = "default_white_balance_range")]
    white_balance_range: Option<f64>,
}

impl Default for TomlWindow {
    fn default() -> Self {
        toml::from_str("").expect("empty window table deserializes from defaults")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlScene {
    camera: TomlCamera,
    min_bounds: TomlVec3,
    max_bounds: TomlVec3,
    #[serde(default)]
    materials: Vec<TomlMaterial>,
    #[serde(default)]
    lights: Vec<TomlLight>,
    #[serde(default)]
    objects: Vec<TomlObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlCamera {
    #[serde(default = "default_vfov")]
    vfov: f64,
    #[serde(default)]
    pos: TomlVec3,
    #[serde(default)]
    vrp: TomlVec3,
    #[serde(default)]
    vplane: TomlVec3,
    #[serde(default, rename = "renderDOF")]
    render_dof: bool,
    #[serde(default)]
    fplane_dist: Option<f64>,
    #[serde(default = "default_lens_aperture")]
    lens_aperture: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlMaterial {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    texture: String,
    #[serde(default = "default_percent")]
    refraction_index: f64,
    #[serde(default)]
    beer_coefficient: f64,
    #[serde(default = "default_percent")]
    specular_exponent: f64,
    #[serde(default)]
    diffuse_reflectiveness: TomlVec3,
    #[serde(default)]
    specular_reflectiveness: TomlVec3,
    #[serde(default)]
    specular_refractiveness: TomlVec3,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlLight {
    #[serde(default)]
    position: TomlVec3,
    direction: TomlVec3,
    #[serde(default)]
    power: TomlVec3,
    #[serde(default)]
    num_photons: usize,
    #[serde(default)]
    fov: Option<f64>,
    #[serde(default)]
    radius: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlObject {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    material: String,
    #[serde(default)]
    position: TomlVec3,
    #[serde(default)]
    size: TomlVec3,
    #[serde(default)]
    normal: TomlVec3,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    axis: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlRaytracer {
    #[serde(default)]
    num_threads: Option<usize>,
    #[serde(default)]
    anti_aliasing: bool,
    #[serde(default = "default_max_ray_depth")]
    max_ray_depth: usize,
    #[serde(default)]
    max_photon_depth: usize,
    #[serde(default = "default_search_count")]
    photon_search_count: usize,
    #[serde(default = "default_search_radius")]
    photon_search_radius: f64,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    gather: TomlGather,
}

impl Default for TomlRaytracer {
    fn default() -> Self {
        toml::from_str("").expect("empty raytracer table deserializes from defaults")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomlGather {
    #[serde(default)]
    structure: PhotonStructure,
    #[serde(default = "default_true")]
    sphere_compression: bool,
    #[serde(default = "default_compression_ratio")]
    sphere_compression_ratio: f64,
    #[serde(default = "default_true")]
    filter: bool,
    #[serde(default = "default_filter_constant")]
    filter_constant: f64,
    #[serde(default = "default_true")]
    use_furthest_photon_dist: bool,
    #[serde(default)]
    precompute_irradiance: bool,
    #[serde(default = "default_true")]
    energy_conservation: bool,
    #[serde(default)]
    indirect_only: bool,
    #[serde(default = "default_true")]
    material_multiply: bool,
    #[serde(default)]
    gather_rays: usize,
    #[serde(default = "default_gather_ray_weight")]
    gather_ray_weight: f64,
    #[serde(default = "default_true")]
    monte_carlo_soft_shadows: bool,
    #[serde(default = "default_soft_shadow_samples")]
    soft_shadow_samples: usize,
    #[serde(default)]
    grid_partitioning: bool,
}

impl Default for TomlGather {
    fn default() -> Self {
        toml::from_str("").expect("empty gather table deserializes from defaults")
    }
}

fn default_xsize() -> usize {
    640
}

fn default_ysize() -> usize {
    480
}

fn default_title() -> String {
    "Kiran".to_string()
}

fn default_true() -> bool {
    true
}

fn default_white_balance_range() -> Option<f64> {
    Some(1.5)
}

fn default_vfov() -> f64 {
    90.0
}

fn default_lens_aperture() -> i64 {
    4
}

fn default_percent() -> f64 {
    100.0
}

fn default_max_ray_depth() -> usize {
    1
}

fn default_search_count() -> usize {
    1
}

fn default_search_radius() -> f64 {
    1.0
}

fn default_compression_ratio() -> f64 {
    0.9
}

fn default_filter_constant() -> f64 {
    1.25
}

fn default_gather_ray_weight() -> f64 {
    0.25
}

fn default_soft_shadow_samples() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use crate::domain::photon::PhotonStructure;
    use crate::domain::scene::light::SceneLight;

    use super::*;

    const DESCRIPTION: &str = r#"
        [window]
        xsize = 64
        ysize = 48
        makeDump = false

        [scene]
        minBounds = { x = -50, y = -50, z = -50 }
        maxBounds = { x = 50, y = 50, z = 50 }

        [scene.camera]
        vfov = 90
        pos = { z = 10 }
        vrp = { z = 0 }
        vplane = { x = 64, y = 48 }

        [[scene.materials]]
        type = "white"
        diffuseReflectiveness = { x = 70, y = 70, z = 70 }

        [[scene.materials]]
        type = "glass"
        refractionIndex = 152
        beerCoefficient = 40
        specularRefractiveness = { x = 90, y = 90, z = 90 }

        [[scene.lights]]
        position = { y = 20 }
        direction = { y = -100 }
        power = { x = 250, y = 250, z = 250 }
        numPhotons = 1000
        fov = 130

        [[scene.lights]]
        position = { x = 5, y = 20 }
        direction = { y = -100 }
        power = { x = 100, y = 100, z = 100 }
        numPhotons = 500
        radius = 2.5

        [[scene.objects]]
        type = "ellipse"
        material = "glass"
        position = { y = 2 }
        size = { x = 2, y = 2, z = 2 }

        [[scene.objects]]
        type = "plane"
        material = "white"
        normal = { y = 100 }
        distance = 0

        [[scene.objects]]
        type = "box"
        material = "missing"
        position = { x = -4, y = 1 }
        size = { x = 2, y = 2, z = 2 }

        [[scene.objects]]
        type = "cylinder"
        material = "white"
        position = { x = 4, y = 1 }
        size = { x = 2, y = 1, z = 1 }
        axis = 1

        [raytracer]
        numThreads = 2
        maxRayDepth = 3
        maxPhotonDepth = 5
        photonSearchCount = 32
        photonSearchRadius = 1.5
        seed = 42

        [raytracer.gather]
        structure = "kd-tree"
        gatherRays = 4
    "#;

    #[test]
    fn parse_description_succeeds() {
        let description = parse_description(DESCRIPTION).unwrap();

        // even sizes are bumped to odd for an exact center pixel
        assert_eq!(description.window.width, 65);
        assert_eq!(description.window.height, 49);
        assert!(!description.window.make_dump);
        assert_eq!(description.window.white_balance_range, Some(Val(1.5)));

        let scene = &description.scene;
        // the two named materials plus the implicit default
        assert_eq!(scene.materials().len(), 3);
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.objects().len(), 4);

        assert_eq!(scene.lights()[0].num_photons(), 1000);
        assert_eq!(scene.lights()[0].radius(), Val(0.0));
        assert_eq!(scene.lights()[1].radius(), Val(2.5));
        assert_eq!(scene.lights()[1].fov(), Val(360.0));

        let tracer = &description.tracer;
        assert_eq!(tracer.num_threads(), 2);
        assert_eq!(tracer.max_ray_depth(), 3);
        assert_eq!(tracer.max_photon_depth(), 5);
        assert_eq!(tracer.photon_search_count(), 32);
        assert_eq!(tracer.photon_search_radius(), Val(1.5));
        assert_eq!(tracer.gather().structure(), PhotonStructure::KdTree);
        assert_eq!(tracer.gather().gather_rays(), 4);
    }

    #[test]
    fn parse_description_decodes_percent_fields() {
        let description = parse_description(DESCRIPTION).unwrap();
        let scene = &description.scene;

        // material 0 is the implicit default, named ones follow
        let white = scene.material(1);
        assert_eq!(white.diffuse_reflectiveness(), Vector::broadcast(Val(0.7)));

        let glass = scene.material(2);
        assert_eq!(glass.refraction_index(), Val(1.52));
        assert_eq!(glass.beer_coefficient(), Val(0.4));
        assert_eq!(glass.specular_refractiveness(), Vector::broadcast(Val(0.9)));
    }

    #[test]
    fn parse_description_falls_back_to_default_material() {
        let description = parse_description(DESCRIPTION).unwrap();
        // the box names a material that does not exist
        assert_eq!(description.scene.objects()[2].material(), 0);
    }

    #[test]
    fn parse_description_fails_for_mesh_objects() {
        let content = DESCRIPTION.replace("type = \"cylinder\"", "type = \"mesh\"");
        assert!(matches!(
            parse_description(&content),
            Err(LoadDescriptionError::UnsupportedShape { index: 3, .. }),
        ));
    }

    #[test]
    fn parse_description_fails_for_zero_light_direction() {
        let content = DESCRIPTION.replace("direction = { y = -100 }", "direction = { y = 0 }");
        assert!(matches!(
            parse_description(&content),
            Err(LoadDescriptionError::InvalidLight { index: 0, .. }),
        ));
    }

    #[test]
    fn parse_description_fails_for_malformed_toml() {
        assert!(matches!(
            parse_description("not = [valid"),
            Err(LoadDescriptionError::ParseToml { .. }),
        ));
    }
}

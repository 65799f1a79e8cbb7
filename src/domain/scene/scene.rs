use std::collections::HashMap;

use crate::domain::math::geometry::{Axis, Point};
use crate::domain::math::numeric::Val;
use crate::domain::photon::UniformGrid;
use crate::domain::ray::{Ray, RayIntersection};

use super::light::DynLight;
use super::material::Material;
use super::object::{DynShape, Shape};

const GRID_CELLS_PER_UNIT: Val = Val(0.2);
const GRID_STEP_EPS: Val = Val(0.1);
const GRID_DIR_EPS: Val = Val(0.001);

/// A shape paired with the index of its material.
#[derive(Debug, Clone)]
pub struct SceneObject {
    shape: DynShape,
    material: usize,
}

impl SceneObject {
    pub fn shape(&self) -> &DynShape {
        &self.shape
    }

    pub fn material(&self) -> usize {
        self.material
    }
}

/// Per-ray object test cache for grid traversal. An object encountered
/// in several cells is intersected once; a hit landing in a later cell
/// is re-evaluated only when the traversal reaches that cell.
#[derive(Debug, Clone)]
pub struct TraversalCache {
    tags: Vec<CellTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellTag {
    Untested,
    TestedMiss,
    HitInCell(u32),
}

impl TraversalCache {
    pub fn new(num_objects: usize) -> Self {
        Self {
            tags: vec![CellTag::Untested; num_objects],
        }
    }

    fn reset(&mut self, num_objects: usize) {
        self.tags.clear();
        self.tags.resize(num_objects, CellTag::Untested);
    }
}

/// The scene: materials, lights and objects, plus ray traversal over
/// them, either linear or stepping through a uniform grid.
#[derive(Debug)]
pub struct Scene {
    materials: Vec<Material>,
    material_index: HashMap<String, usize>,
    lights: Vec<DynLight>,
    objects: Vec<SceneObject>,
    min_bounds: Point,
    max_bounds: Point,
    grid: Option<UniformGrid>,
}

impl Scene {
    pub fn new(min_bounds: Point, max_bounds: Point) -> Self {
        let mut scene = Self {
            materials: Vec::new(),
            material_index: HashMap::new(),
            lights: Vec::new(),
            objects: Vec::new(),
            min_bounds,
            max_bounds,
            grid: None,
        };
        // fallback for objects that name no material
        scene.add_material("default", Material::default());
        scene
    }

    pub fn add_material(&mut self, name: &str, material: Material) -> usize {
        let index = self.materials.len();
        self.materials.push(material);
        self.material_index.insert(name.to_string(), index);
        index
    }

    pub fn add_light(&mut self, light: impl Into<DynLight>) {
        self.lights.push(light.into());
    }

    /// Add an object; an unknown material name falls back to the
    /// default material.
    pub fn add_object(&mut self, shape: impl Into<DynShape>, material: &str) {
        let material = self.material_index.get(material).copied().unwrap_or(0);
        self.objects.push(SceneObject {
            shape: shape.into(),
            material,
        });
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, index: usize) -> &Material {
        &self.materials[index]
    }

    pub fn material_of(&self, object: usize) -> &Material {
        &self.materials[self.objects[object].material]
    }

    pub fn lights(&self) -> &[DynLight] {
        &self.lights
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn min_bounds(&self) -> Point {
        self.min_bounds
    }

    pub fn max_bounds(&self) -> Point {
        self.max_bounds
    }

    pub fn bounds_contain(&self, position: Point) -> bool {
        position.x() >= self.min_bounds.x()
            && position.y() >= self.min_bounds.y()
            && position.z() >= self.min_bounds.z()
            && position.x() <= self.max_bounds.x()
            && position.y() <= self.max_bounds.y()
            && position.z() <= self.max_bounds.z()
    }

    /// Partition the objects into a uniform grid derived from the scene
    /// bounds. Every cell is tested against every object so that
    /// infinite planes get registered too; they effectively end at the
    /// grid boundary.
    pub fn build_grid(&mut self) {
        let extent = self.max_bounds - self.min_bounds;
        let cells = [
            f64::from(extent.x() * GRID_CELLS_PER_UNIT) as usize,
            f64::from(extent.y() * GRID_CELLS_PER_UNIT) as usize,
            f64::from(extent.z() * GRID_CELLS_PER_UNIT) as usize,
        ];

        let mut grid = UniformGrid::new(cells);
        grid.set_bounds(self.min_bounds, self.max_bounds);

        let size = grid.grid_size();
        for x in 0..size[0] as i64 {
            for y in 0..size[1] as i64 {
                for z in 0..size[2] as i64 {
                    let index = [x, y, z];
                    let center = grid.cell_center(index);
                    for (object, entry) in self.objects.iter().enumerate() {
                        if entry.shape.intersect_cell(center, grid.cell_size()) {
                            grid.add_to_cell(index, object as u32);
                        }
                    }
                }
            }
        }

        self.grid = Some(grid);
    }

    /// Nearest intersection along the ray, if any, with the index of the
    /// hit object.
    pub fn closest_hit(
        &self,
        ray: &Ray,
        cache: &mut TraversalCache,
    ) -> Option<(RayIntersection, usize)> {
        match &self.grid {
            Some(grid) => self.step_ray_through_grid(grid, ray, None, cache),
            None => self.closest_linear(ray),
        }
    }

    /// First object whose hit lies within `max_dist_sq` (squared) of the
    /// ray start; used for shadow rays, so any qualifying hit suffices.
    pub fn occluding_hit(
        &self,
        ray: &Ray,
        max_dist_sq: Val,
        cache: &mut TraversalCache,
    ) -> Option<(RayIntersection, usize)> {
        match &self.grid {
            Some(grid) => self.step_ray_through_grid(grid, ray, Some(max_dist_sq), cache),
            None => self.occluding_linear(ray, max_dist_sq),
        }
    }

    fn closest_linear(&self, ray: &Ray) -> Option<(RayIntersection, usize)> {
        let mut best: Option<(RayIntersection, usize)> = None;
        let mut best_dist = Val::INFINITY;

        for (object, entry) in self.objects.iter().enumerate() {
            if let Some(hit) = entry.shape.intersect_ray(ray) {
                let dist = (hit.position() - ray.start()).norm_squared();
                if best.is_none() || dist < best_dist {
                    best_dist = dist;
                    best = Some((hit, object));
                }
            }
        }

        best
    }

    fn occluding_linear(&self, ray: &Ray, max_dist_sq: Val) -> Option<(RayIntersection, usize)> {
        for (object, entry) in self.objects.iter().enumerate() {
            if let Some(hit) = entry.shape.intersect_ray(ray) {
                let dist = (hit.position() - ray.start()).norm_squared();
                if dist < max_dist_sq {
                    return Some((hit, object));
                }
            }
        }
        None
    }

    fn step_ray_through_grid(
        &self,
        grid: &UniformGrid,
        ray: &Ray,
        max_dist_sq: Option<Val>,
        cache: &mut TraversalCache,
    ) -> Option<(RayIntersection, usize)> {
        cache.reset(self.objects.len());

        let dir = ray.direction();
        let mut pos = ray.start();
        let mut best: Option<(RayIntersection, usize)> = None;
        let mut best_dist = Val::INFINITY;

        while grid.position_in_bounds(pos) {
            let cell_index = grid.cell_index(pos, true);
            let cell_flat = grid.flat_index(cell_index) as u32;
            let cell_size = grid.cell_size();
            let corner = grid.cell_center(cell_index) + cell_size * Val(0.5);
            let corner_dist = corner - pos;

            for &object in grid.cell(cell_index) {
                let object = object as usize;

                let hit = match cache.tags[object] {
                    CellTag::TestedMiss => continue,
                    CellTag::Untested => {
                        match self.objects[object].shape.intersect_ray(ray) {
                            Some(hit) => {
                                let hit_cell = grid.cell_index(hit.position(), true);
                                if grid.flat_index(hit_cell) as u32 != cell_flat {
                                    // remember where the hit actually lies;
                                    // evaluate once the traversal gets there
                                    cache.tags[object] =
                                        CellTag::HitInCell(grid.flat_index(hit_cell) as u32);
                                    continue;
                                }
                                hit
                            }
                            None => {
                                cache.tags[object] = CellTag::TestedMiss;
                                continue;
                            }
                        }
                    }
                    CellTag::HitInCell(cell) => {
                        if cell != cell_flat {
                            continue;
                        }
                        // the intersection itself was not cached, recover it
                        match self.objects[object].shape.intersect_ray(ray) {
                            Some(hit) => hit,
                            None => continue,
                        }
                    }
                };

                let dist = (hit.position() - ray.start()).norm_squared();
                match max_dist_sq {
                    Some(cap) => {
                        if dist < cap {
                            best = Some((hit, object));
                            break;
                        }
                    }
                    None => {
                        if best.is_none() || dist < best_dist {
                            best_dist = dist;
                            best = Some((hit, object));
                        }
                    }
                }
            }

            if best.is_some() {
                break;
            }

            // parametric distance to the far cell face per axis; step a
            // little beyond the nearest face (the epsilon trades speed
            // against artefact lines on planes lying on cell faces)
            let mut step = Val::INFINITY;
            for axis in Axis::ALL {
                let d = dir.axis(axis);
                let t = if d < Val(0.0) {
                    (cell_size.axis(axis) - corner_dist.axis(axis)) / -d
                } else {
                    corner_dist.axis(axis) / (d + GRID_DIR_EPS)
                };
                step = step.min(t.clamp(Val(0.0), cell_size.axis(axis)));
            }
            pos = pos + dir.to_vector() * (step + GRID_STEP_EPS);
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::math::algebra::{UnitVector, Vector};
    use crate::domain::math::geometry;
    use crate::domain::scene::light::PointLight;
    use crate::domain::scene::object::{Cuboid, Ellipsoid, Plane};

    use super::*;

    fn test_scene(with_grid: bool) -> Scene {
        let mut scene = Scene::new(
            Point::broadcast(Val(-50.0)),
            Point::broadcast(Val(50.0)),
        );
        scene.add_material(
            "white",
            Material::default().with_diffuse_reflectiveness(Vector::broadcast(Val(0.7))),
        );
        scene.add_light(PointLight::new(
            Point::new(Val(0.0), Val(10.0), Val(0.0)),
            -UnitVector::y_direction(),
            Vector::broadcast(Val(100.0)),
            0,
            Val(180.0),
        ));
        scene.add_object(
            Ellipsoid::new(
                Point::new(Val(0.0), Val(1.0), Val(-5.0)),
                Vector::broadcast(Val(1.0)),
            )
            .unwrap(),
            "white",
        );
        scene.add_object(
            Cuboid::new(
                Point::new(Val(4.0), Val(1.0), Val(-5.0)),
                Vector::broadcast(Val(2.0)),
            )
            .unwrap(),
            "white",
        );
        scene.add_object(
            Plane::new(geometry::Plane::new(UnitVector::y_direction(), Val(0.0))),
            "white",
        );
        if with_grid {
            scene.build_grid();
        }
        scene
    }

    #[test]
    fn scene_closest_hit_picks_nearest_object() {
        let scene = test_scene(false);
        let mut cache = TraversalCache::new(scene.objects().len());
        let ray = Ray::new(
            Point::new(Val(0.0), Val(1.0), Val(5.0)),
            -UnitVector::z_direction(),
        );

        let (hit, object) = scene.closest_hit(&ray, &mut cache).unwrap();
        assert_eq!(object, 0);
        assert_eq!(hit.position(), Point::new(Val(0.0), Val(1.0), Val(-4.0)));
    }

    #[test]
    fn scene_unknown_material_falls_back_to_default() {
        let mut scene = test_scene(false);
        scene.add_object(
            Ellipsoid::new(Point::default(), Vector::broadcast(Val(1.0))).unwrap(),
            "no-such-material",
        );
        assert_eq!(scene.objects().last().unwrap().material(), 0);
    }

    #[test]
    fn scene_occluding_hit_respects_distance_cap() {
        let scene = test_scene(false);
        let mut cache = TraversalCache::new(scene.objects().len());
        let ray = Ray::new(
            Point::new(Val(0.0), Val(1.0), Val(5.0)),
            -UnitVector::z_direction(),
        );

        // sphere sits 8 units away; a cap before it sees no occluder
        assert!(scene.occluding_hit(&ray, Val(49.0), &mut cache).is_none());
        assert!(scene.occluding_hit(&ray, Val(100.0), &mut cache).is_some());
    }

    #[test]
    fn scene_bounds_contain_succeeds() {
        let scene = test_scene(false);
        assert!(scene.bounds_contain(Point::default()));
        assert!(!scene.bounds_contain(Point::broadcast(Val(51.0))));
    }

    #[test]
    fn scene_grid_traversal_matches_linear_traversal() {
        let linear = test_scene(false);
        let gridded = test_scene(true);
        let mut cache = TraversalCache::new(gridded.objects().len());

        let rays = [
            Ray::new(
                Point::new(Val(0.0), Val(1.0), Val(5.0)),
                -UnitVector::z_direction(),
            ),
            Ray::new(
                Point::new(Val(4.0), Val(1.0), Val(5.0)),
                -UnitVector::z_direction(),
            ),
            Ray::new(
                Point::new(Val(0.0), Val(5.0), Val(0.0)),
                Vector::new(Val(0.3), Val(-1.0), Val(-0.3)).normalize().unwrap(),
            ),
        ];

        for (i, ray) in rays.iter().enumerate() {
            let expected = linear.closest_hit(ray, &mut cache);
            let actual = gridded.closest_hit(ray, &mut cache);
            match (expected, actual) {
                (Some((eh, eo)), Some((ah, ao))) => {
                    assert_eq!(eo, ao, "ray {} hit different objects", i);
                    assert_eq!(eh.position(), ah.position(), "ray {} hit positions differ", i);
                }
                (None, None) => {}
                other => panic!("ray {} grid/linear mismatch: {:?}", i, other),
            }
        }
    }
}

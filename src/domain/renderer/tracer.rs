use std::sync::{Barrier, Mutex, RwLock};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rand::prelude::*;

use crate::domain::camera::Camera;
use crate::domain::math::algebra::{UnitVector, Vector};
use crate::domain::math::geometry;
use crate::domain::math::numeric::Val;
use crate::domain::photon::{Photon, PhotonMap};
use crate::domain::ray::optics::{reflect, refract};
use crate::domain::ray::{Ray, RayIntersection};
use crate::domain::scene::light::{DynLight, SceneLight};
use crate::domain::scene::material::{Material, ReflectionModel};
use crate::domain::scene::object::{Plane, Shape};
use crate::domain::scene::{Scene, TraversalCache};

use super::config::TracerConfig;
use super::frame::{Frame, FrameBand, PixelStats};

/// Offset along a freshly spawned ray direction; keeps secondary rays
/// from re-hitting the surface they started on.
const SURFACE_OFFSET: Val = Val(0.01);

/// Fixed area-light surface offsets used when Monte-Carlo soft shadows
/// are disabled.
const AXIS_OFFSETS: [Vector; 6] = [
    Vector::new(Val(1.0), Val(0.0), Val(0.0)),
    Vector::new(Val(-1.0), Val(0.0), Val(0.0)),
    Vector::new(Val(0.0), Val(1.0), Val(0.0)),
    Vector::new(Val(0.0), Val(-1.0), Val(0.0)),
    Vector::new(Val(0.0), Val(0.0), Val(1.0)),
    Vector::new(Val(0.0), Val(0.0), Val(-1.0)),
];

/// Per-worker tracing state: the shared immutable scene and map plus the
/// worker-owned RNG and grid-traversal cache.
struct TraceContext<'a> {
    scene: &'a Scene,
    photon_map: Option<&'a PhotonMap>,
    cache: TraversalCache,
    rng: StdRng,
}

/// The rendering core: a photon pass that fills and finalizes the
/// photon map, then a ray pass that shades camera rays, both spread
/// over a team of workers synchronized by one barrier.
pub struct RayTracer {
    config: TracerConfig,
    photon_mapping: bool,
    map_capacity: usize,
}

impl RayTracer {
    /// Photon mapping engages only when every light emits photons;
    /// otherwise the tracer falls back to pure Whitted-style shading.
    pub fn new(config: TracerConfig, scene: &Scene) -> Self {
        let lights = scene.lights();
        let map_capacity = lights.iter().map(|l| l.num_photons()).sum();
        let photon_mapping = !lights.is_empty() && lights.iter().all(|l| l.num_photons() > 0);

        Self {
            config,
            photon_mapping,
            map_capacity,
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn photon_mapping(&self) -> bool {
        self.photon_mapping
    }

    /// Render the scene into `frame`. Workers run the pipeline of
    /// barrier-separated phases: per-light emission and power scaling,
    /// map finalize, optional irradiance precompute, then each worker
    /// shades its own band of pixel rows.
    pub fn render(&self, scene: &Scene, camera: &Camera, frame: &mut Frame) -> PixelStats {
        let workers = self.config.num_threads();

        let map = self.photon_mapping.then(|| {
            RwLock::new(PhotonMap::with_capacity(
                self.map_capacity,
                self.config.gather().structure(),
                self.config.gather().estimate_options(),
            ))
        });
        let barrier = Barrier::new(workers);
        let stats = Mutex::new(PixelStats::new());
        let precomputed: Mutex<Vec<(usize, Vec<Vector>)>> = Mutex::new(Vec::new());

        let progress = MultiProgress::new();
        let photon_bar = self
            .photon_mapping
            .then(|| progress.add(Self::progress_bar(self.map_capacity as u64, "Photons")));
        let pixel_bar =
            progress.add(Self::progress_bar((frame.width() * frame.height()) as u64, "Pixels"));

        let base_seed = if self.config.seed() != 0 {
            self.config.seed()
        } else {
            rand::rng().random()
        };

        std::thread::scope(|scope| {
            for (worker, band) in frame.bands(workers).into_iter().enumerate() {
                // distinct seed per worker
                let mut rng = StdRng::seed_from_u64(
                    base_seed.wrapping_add(0x9e3779b97f4a7c15u64.wrapping_mul(worker as u64 + 1)),
                );
                let map = map.as_ref();
                let barrier = &barrier;
                let stats = &stats;
                let precomputed = &precomputed;
                let photon_bar = photon_bar.clone();
                let pixel_bar = pixel_bar.clone();

                scope.spawn(move || {
                    if let (Some(map), Some(bar)) = (map, photon_bar.as_ref()) {
                        self.photon_pass(worker, scene, map, barrier, &mut rng, precomputed, bar);
                    }
                    self.ray_pass(scene, camera, map, band, stats, rng, &pixel_bar);
                });
            }
        });

        if let Some(bar) = photon_bar {
            bar.finish();
        }
        pixel_bar.finish();

        stats.into_inner().expect("no worker panicked holding the stats lock")
    }

    fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
        const TEMPLATE: &str =
            "{msg:>8.green.bold} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) [{elapsed_precise}]";
        let style = ProgressStyle::with_template(TEMPLATE)
            .expect("progress template is valid")
            .progress_chars("=>-");
        ProgressBar::new(len).with_style(style).with_message(message)
    }

    // ---- photon pass -----------------------------------------------------

    fn photon_pass(
        &self,
        worker: usize,
        scene: &Scene,
        map: &RwLock<PhotonMap>,
        barrier: &Barrier,
        rng: &mut StdRng,
        precomputed: &Mutex<Vec<(usize, Vec<Vector>)>>,
        bar: &ProgressBar,
    ) {
        let workers = self.config.num_threads();
        let mut cache = TraversalCache::new(scene.objects().len());

        for light in scene.lights() {
            let share = light.num_photons() / workers;
            let remainder = light.num_photons() % workers;
            let quota = share + if worker == workers - 1 { remainder } else { 0 };

            for _ in 0..quota {
                let (position, direction) = light.sample_emission(rng);
                let mut photon = Photon::new(position, direction, light.power());
                self.trace_photon(scene, map, &mut photon, rng, &mut cache, 0, false);
                bar.inc(1);
            }

            // the whole batch for this light must land before scaling
            barrier.wait();
            if worker == 0 {
                let scale = Val::from(light.num_photons()).recip();
                map.write().expect("photon map lock poisoned").scale_photon_power(scale);
            }
            barrier.wait();
        }

        if worker == 0 {
            map.write().expect("photon map lock poisoned").finalize();
        }
        barrier.wait();

        if self.config.gather().precompute_irradiance() {
            self.precompute_irradiance(worker, map, precomputed);
            barrier.wait();
            if worker == 0 {
                let mut guard = map.write().expect("photon map lock poisoned");
                for (first, estimates) in precomputed.lock().expect("precompute lock poisoned").drain(..) {
                    for (offset, irradiance) in estimates.into_iter().enumerate() {
                        guard.set_irradiance(first + offset, irradiance);
                    }
                }
            }
            barrier.wait();
        }
    }

    /// Compute this worker's disjoint range of per-photon estimates and
    /// publish them; worker 0 writes everything back under the write
    /// lock once all ranges are in.
    fn precompute_irradiance(
        &self,
        worker: usize,
        map: &RwLock<PhotonMap>,
        precomputed: &Mutex<Vec<(usize, Vec<Vector>)>>,
    ) {
        let workers = self.config.num_threads();
        let guard = map.read().expect("photon map lock poisoned");
        let count = guard.len();
        if count == 0 {
            return;
        }

        let share = count / workers;
        let remainder = count % workers;
        let first = worker * share + 1;
        let quota = share + if worker == workers - 1 { remainder } else { 0 };

        let estimates: Vec<Vector> = (first..first + quota)
            .map(|index| {
                let photon = guard.photon(index);
                guard.compute_estimate(
                    photon.position(),
                    photon.normal(),
                    self.config.photon_search_radius(),
                    self.config.photon_search_count(),
                )
            })
            .collect();
        drop(guard);

        precomputed
            .lock()
            .expect("precompute lock poisoned")
            .push((first, estimates));
    }

    /// One step of the photon random walk: intersect, then let Russian
    /// roulette over the band-averaged reflectances decide between
    /// diffuse reflection, specular reflection, refraction and
    /// absorption.
    fn trace_photon(
        &self,
        scene: &Scene,
        map: &RwLock<PhotonMap>,
        photon: &mut Photon,
        rng: &mut StdRng,
        cache: &mut TraversalCache,
        depth: usize,
        inside: bool,
    ) {
        if depth >= self.config.max_photon_depth() {
            return;
        }

        let ray = Ray::new(photon.position(), photon.direction());
        let Some((hit, object)) = scene.closest_hit(&ray, cache) else {
            return;
        };
        let material = scene.material_of(object);
        let energy_conservation = self.config.gather().energy_conservation();

        let diffuse = material.diffuse_reflectiveness();
        let specular = material.specular_reflectiveness();
        let refractive = material.specular_refractiveness();
        let rho_d = diffuse.average();
        let rho_s = specular.average();
        let rho_t = refractive.average();

        let r = Val(rng.random::<f64>());

        if r > Val(0.0) && r < rho_d {
            // diffuse reflection: store with the incoming direction,
            // bounce into the hemisphere above the surface
            let bounce = UnitVector::sample_hemisphere(hit.normal(), rng);
            let power = photon.power()
                * if energy_conservation {
                    diffuse / rho_d
                } else {
                    diffuse
                };

            photon.set_position(hit.position());
            photon.set_direction(ray.direction());
            photon.set_power(power);
            if !self.store_photon(scene, map, photon, material, &hit, depth) {
                return;
            }

            photon.set_direction(bounce);
            photon.set_position(photon.position() + photon.direction() * SURFACE_OFFSET);
            self.trace_photon(scene, map, photon, rng, cache, depth + 1, inside);
        } else if r < rho_d + rho_s {
            // specular reflection changes direction anisotropically and
            // never deposits a photon
            let power = photon.power()
                * if energy_conservation {
                    specular / rho_s
                } else {
                    specular
                };

            photon.set_power(power);
            photon.set_direction(reflect(ray.direction(), hit.normal()));
            photon.set_position(hit.position() + photon.direction() * SURFACE_OFFSET);
            self.trace_photon(scene, map, photon, rng, cache, depth + 1, inside);
        } else if r < rho_d + rho_s + rho_t {
            // refraction: leaving an object swaps the indices and flips
            // the normal
            let normal = if inside { -hit.normal() } else { hit.normal() };
            let (n1, n2) = if inside {
                (material.refraction_index(), Val(1.0))
            } else {
                (Val(1.0), material.refraction_index())
            };

            if let Some(direction) = refract(ray.direction(), normal, n1, n2) {
                photon.set_direction(direction);
                photon.set_position(hit.position() + photon.direction() * SURFACE_OFFSET);
                self.trace_photon(scene, map, photon, rng, cache, depth + 1, !inside);
            }
            // total internal reflection terminates the walk
        } else {
            // absorption
            photon.set_position(hit.position());
            photon.set_direction(ray.direction());
            self.store_photon(scene, map, photon, material, &hit, depth);
        }
    }

    /// Deposit the photon at its current position. Specular surfaces
    /// never store (Russian roulette already favors bouncing there, and
    /// their energy is estimated by direct illumination instead).
    /// Returns false when the position left the scene bounds, which
    /// terminates the walk.
    fn store_photon(
        &self,
        scene: &Scene,
        map: &RwLock<PhotonMap>,
        photon: &mut Photon,
        material: &Material,
        hit: &RayIntersection,
        depth: usize,
    ) -> bool {
        if material.is_specularly_reflective() {
            return true;
        }
        if !scene.bounds_contain(photon.position()) {
            return false;
        }

        photon.set_normal(hit.normal());

        // in indirect-only mode first-bounce light stays with the
        // shadow rays
        if !(self.config.gather().indirect_only() && depth == 0) {
            map.write().expect("photon map lock poisoned").add_photon(photon);
        }
        true
    }

    // ---- ray pass --------------------------------------------------------

    fn ray_pass(
        &self,
        scene: &Scene,
        camera: &Camera,
        map: Option<&RwLock<PhotonMap>>,
        mut band: FrameBand<'_>,
        stats: &Mutex<PixelStats>,
        rng: StdRng,
        bar: &ProgressBar,
    ) {
        let guard = map.map(|m| m.read().expect("photon map lock poisoned"));
        let mut ctx = TraceContext {
            scene,
            photon_map: guard.as_deref(),
            cache: TraversalCache::new(scene.objects().len()),
            rng,
        };

        let rows = band.first_row()..band.first_row() + band.rows();

        if camera.render_dof() {
            // lens rays converge on the pinhole ray's focal-plane point;
            // the focal plane faces the camera, hence the negated
            // direction and distance
            let focal_plane = Plane::new(geometry::Plane::new(
                -camera.zdir(),
                -camera.fplane_distance(),
            ));
            let aperture = camera.lens_aperture();
            let lens_side = Val::from((2 * aperture + 1) as usize);
            let normalizer = lens_side * lens_side;

            for row in rows {
                for x in 0..camera.width() {
                    let pixel_ray =
                        Ray::new(camera.position(), camera.pixel_direction(x as i64, row as i64));
                    let mut irradiance = Vector::zero();

                    if let Some(focus) = focal_plane.intersect_ray(&pixel_ray) {
                        for n in -aperture..=aperture {
                            for m in -aperture..=aperture {
                                let origin = camera.pixel_position(x as i64 + m, row as i64 + n);
                                let Ok(direction) = (focus.position() - origin).normalize() else {
                                    continue;
                                };
                                let lens_ray = Ray::new(origin, direction);
                                irradiance += self.trace_ray(&mut ctx, &lens_ray, 0);
                            }
                        }
                    }

                    let value = irradiance / normalizer;
                    stats.lock().expect("stats lock poisoned").record(value);
                    band.set_pixel(x, row, value);
                }
                bar.inc(camera.width() as u64);
            }
        } else if self.config.anti_aliasing() {
            for row in rows {
                for x in 0..camera.width() {
                    let center = camera.pixel_direction(x as i64, row as i64);
                    let mut irradiance =
                        self.trace_ray(&mut ctx, &Ray::new(camera.position(), center), 0);

                    // blend the pixel direction with each of its eight
                    // neighbors
                    for dy in -1i64..=1 {
                        for dx in -1i64..=1 {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            let neighbor =
                                camera.pixel_direction(x as i64 + dx, row as i64 + dy);
                            let blended = (center.to_vector() + neighbor.to_vector()) * Val(0.5);
                            let Ok(direction) = blended.normalize() else {
                                continue;
                            };
                            irradiance +=
                                self.trace_ray(&mut ctx, &Ray::new(camera.position(), direction), 0);
                        }
                    }

                    let value = irradiance / Val(9.0);
                    stats.lock().expect("stats lock poisoned").record(value);
                    band.set_pixel(x, row, value);
                }
                bar.inc(camera.width() as u64);
            }
        } else {
            for row in rows {
                for x in 0..camera.width() {
                    let pixel_ray =
                        Ray::new(camera.position(), camera.pixel_direction(x as i64, row as i64));
                    let value = self.trace_ray(&mut ctx, &pixel_ray, 0);
                    stats.lock().expect("stats lock poisoned").record(value);
                    band.set_pixel(x, row, value);
                }
                bar.inc(camera.width() as u64);
            }
        }
    }

    fn trace_ray(&self, ctx: &mut TraceContext<'_>, ray: &Ray, depth: usize) -> Vector {
        if depth >= self.config.max_ray_depth() {
            return Vector::zero();
        }

        let scene = ctx.scene;
        let Some((hit, object)) = scene.closest_hit(ray, &mut ctx.cache) else {
            return Vector::zero();
        };

        if ctx.photon_map.is_some() {
            self.shade_ray_pm(ctx, ray, &hit, object, depth)
        } else {
            self.shade_ray_rt(ctx, ray, &hit, object, depth)
        }
    }

    /// Photon-mapping shading: diffuse surfaces take the gathered
    /// estimate, specular surfaces recurse on reflection/refraction.
    fn shade_ray_pm(
        &self,
        ctx: &mut TraceContext<'_>,
        ray: &Ray,
        hit: &RayIntersection,
        object: usize,
        depth: usize,
    ) -> Vector {
        let scene = ctx.scene;
        let material = scene.material_of(object);
        let mut irradiance = Vector::zero();

        // with indirect-only storage, direct light on specular surfaces
        // is not in the map and must come from shadow rays
        if self.config.gather().indirect_only() && material.is_specularly_reflective() {
            irradiance += self.sample_direct_illumination(ctx, ray, hit, object);
        }

        if !material.is_specularly_reflective() {
            irradiance += self.gather_irradiance(ctx, hit, object);
        } else {
            let normal = if ray.inside() { -hit.normal() } else { hit.normal() };
            let direction = reflect(ray.direction(), normal);
            let reflect_ray = Ray::with_inside(
                hit.position() + direction * SURFACE_OFFSET,
                direction,
                ray.inside(),
            );
            irradiance += self.trace_ray(ctx, &reflect_ray, depth + 1)
                * material.specular_reflectiveness();

            if material.is_specularly_refractive() {
                irradiance += self.refracted_irradiance(ctx, ray, hit, material, depth);
            }
        }

        irradiance
    }

    /// Whitted-style shading: direct illumination plus the specular
    /// recursion.
    fn shade_ray_rt(
        &self,
        ctx: &mut TraceContext<'_>,
        ray: &Ray,
        hit: &RayIntersection,
        object: usize,
        depth: usize,
    ) -> Vector {
        let scene = ctx.scene;
        let material = scene.material_of(object);
        let mut irradiance = self.sample_direct_illumination(ctx, ray, hit, object);

        if material.is_specularly_reflective() {
            let normal = if ray.inside() { -hit.normal() } else { hit.normal() };
            let direction = reflect(ray.direction(), normal);
            let reflect_ray = Ray::with_inside(
                hit.position() + direction * SURFACE_OFFSET,
                direction,
                ray.inside(),
            );
            irradiance += self.trace_ray(ctx, &reflect_ray, depth + 1)
                * material.specular_reflectiveness();
        }

        if material.is_specularly_refractive() {
            irradiance += self.refracted_irradiance(ctx, ray, hit, material, depth);
        }

        irradiance
    }

    /// Shared refraction branch with Beer-Lambert attenuation along the
    /// transmitted path.
    fn refracted_irradiance(
        &self,
        ctx: &mut TraceContext<'_>,
        ray: &Ray,
        hit: &RayIntersection,
        material: &Material,
        depth: usize,
    ) -> Vector {
        let normal = if ray.inside() { -hit.normal() } else { hit.normal() };
        let (n1, n2) = if ray.inside() {
            (material.refraction_index(), Val(1.0))
        } else {
            (Val(1.0), material.refraction_index())
        };

        let Some(direction) = refract(ray.direction(), normal, n1, n2) else {
            // total internal reflection spawns no refraction ray
            return Vector::zero();
        };

        let refract_ray = Ray::with_inside(
            hit.position() + direction * SURFACE_OFFSET,
            direction,
            !ray.inside(),
        );
        let refracted = self.trace_ray(ctx, &refract_ray, depth + 1)
            * material.specular_refractiveness();

        if material.beer_coefficient() > Val(0.0) {
            let absorbance = material.diffuse_reflectiveness()
                * material.beer_coefficient()
                * -hit.distance();
            let transparency = absorbance.exp();
            if transparency.norm_squared() > Val(0.001) {
                refracted
                    * transparency
                        .normalize()
                        .expect("transparency was just checked to be nonzero")
                        .to_vector()
            } else {
                Vector::zero()
            }
        } else {
            refracted
        }
    }

    /// Shadow-ray sampling of every light. A light contributes when the
    /// surface faces it, the point lies in its FOV cone and no object
    /// occludes the path; area lights probe several surface positions
    /// and scale by the visible fraction.
    fn sample_direct_illumination(
        &self,
        ctx: &mut TraceContext<'_>,
        ray: &Ray,
        hit: &RayIntersection,
        object: usize,
    ) -> Vector {
        if ray.inside() {
            return Vector::zero();
        }

        let scene = ctx.scene;
        let material = scene.material_of(object);
        let model = material.reflection_model();
        let gather = self.config.gather();
        let mut irradiance = Vector::zero();

        for light in scene.lights() {
            let Ok(to_light) = (light.position() - hit.position()).normalize() else {
                continue;
            };
            let light_ray = Ray::new(hit.position() + to_light * SURFACE_OFFSET, to_light);

            if light.radius() > Val(0.0) {
                let samples = if gather.monte_carlo_soft_shadows() {
                    gather.soft_shadow_samples()
                } else {
                    AXIS_OFFSETS.len()
                };

                let mut lit = 0usize;
                for sample in 0..samples {
                    let offset = if gather.monte_carlo_soft_shadows() {
                        UnitVector::sample_sphere(&mut ctx.rng).to_vector()
                    } else {
                        AXIS_OFFSETS[sample]
                    };
                    let sample_pos = light.position() + offset * light.radius();
                    let Ok(sample_dir) = (sample_pos - hit.position()).normalize() else {
                        continue;
                    };
                    let sample_ray =
                        Ray::new(hit.position() + sample_dir * SURFACE_OFFSET, sample_dir);
                    if Self::light_visible(scene, &mut ctx.cache, &sample_ray, hit, light) {
                        lit += 1;
                    }
                }

                let visibility = Val::from(lit) / Val::from(samples);
                irradiance +=
                    model.intensity(material, light, ray, &light_ray, hit) * visibility;
            } else if Self::light_visible(scene, &mut ctx.cache, &light_ray, hit, light) {
                irradiance += model.intensity(material, light, ray, &light_ray, hit);
            }
        }

        irradiance
    }

    /// Occlusion probe toward a light. Lights are not scene objects, so
    /// a "shadow caster" found beyond the light itself does not count.
    fn light_visible(
        scene: &Scene,
        cache: &mut TraversalCache,
        shadow_ray: &Ray,
        hit: &RayIntersection,
        light: &DynLight,
    ) -> bool {
        let max_dist_sq = (shadow_ray.start() - light.position()).norm_squared();
        match scene.occluding_hit(shadow_ray, max_dist_sq, cache) {
            Some((occluder, _)) => {
                (occluder.position() - hit.position()).norm_squared()
                    > (light.position() - hit.position()).norm_squared()
            }
            None => true,
        }
    }

    /// Irradiance estimate at the hit, or a hemisphere of secondary
    /// gather rays averaged over their (non-specular) hit points.
    fn gather_irradiance(
        &self,
        ctx: &mut TraceContext<'_>,
        hit: &RayIntersection,
        object: usize,
    ) -> Vector {
        let scene = ctx.scene;
        let map = ctx
            .photon_map
            .expect("gathering runs only in photon-mapping mode");
        let gather = self.config.gather();
        let radius = self.config.photon_search_radius();
        let count = self.config.photon_search_count();

        let estimate_at = |position, normal, material: &Material| {
            let mut estimate = map.irradiance_estimate(position, normal, radius, count);
            if gather.material_multiply() {
                estimate *= material.diffuse_reflectiveness();
            }
            estimate
        };

        let material = scene.material_of(object);
        if gather.gather_rays() == 0 {
            return estimate_at(hit.position(), hit.normal(), material);
        }

        // averaging over gather rays reduces noise but smears caustics,
        // which live in the same map
        let mut gathered = Vector::zero();
        let mut specular_hits = 0usize;

        for _ in 0..gather.gather_rays() {
            let direction = UnitVector::sample_hemisphere(hit.normal(), &mut ctx.rng);
            let gather_ray = Ray::new(hit.position() + direction * SURFACE_OFFSET, direction);

            if let Some((gather_hit, gather_object)) =
                scene.closest_hit(&gather_ray, &mut ctx.cache)
            {
                let gather_material = scene.material_of(gather_object);
                if !gather_material.is_specularly_reflective() {
                    gathered +=
                        estimate_at(gather_hit.position(), gather_hit.normal(), gather_material);
                } else {
                    specular_hits += 1;
                }
            }
        }

        gathered *= gather.gather_ray_weight();
        gathered += estimate_at(hit.position(), hit.normal(), material)
            * (Val(1.0) - gather.gather_ray_weight());
        gathered / Val::from(gather.gather_rays() + 1 - specular_hits)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::math::geometry::Point;
    use crate::domain::scene::light::PointLight;
    use crate::domain::scene::object::Ellipsoid;

    use super::*;

    fn diffuse_box_scene(num_photons: usize) -> Scene {
        let mut scene = Scene::new(Point::broadcast(Val(-20.0)), Point::broadcast(Val(20.0)));
        scene.add_material(
            "white",
            Material::default().with_diffuse_reflectiveness(Vector::broadcast(Val(0.6))),
        );
        scene.add_light(PointLight::new(
            Point::new(Val(0.0), Val(5.0), Val(0.0)),
            -UnitVector::y_direction(),
            Vector::broadcast(Val(50.0)),
            num_photons,
            Val(180.0),
        ));
        scene.add_object(
            Ellipsoid::new(Point::new(Val(0.0), Val(0.0), Val(0.0)), Vector::broadcast(Val(8.0)))
                .unwrap(),
            "white",
        );
        scene
    }

    #[test]
    fn ray_tracer_disables_photon_mapping_without_photons() {
        let scene = diffuse_box_scene(0);
        let tracer = RayTracer::new(TracerConfig::default(), &scene);
        assert!(!tracer.photon_mapping());
    }

    #[test]
    fn ray_tracer_photon_pass_fills_and_scales_the_map() {
        let scene = diffuse_box_scene(200);
        let config = TracerConfig::default()
            .with_num_threads(1)
            .with_max_photon_depth(4)
            .with_photon_search_count(8)
            .with_photon_search_radius(Val(2.0))
            .with_seed(99);
        let tracer = RayTracer::new(config, &scene);
        assert!(tracer.photon_mapping());

        let map = RwLock::new(PhotonMap::with_capacity(
            200,
            tracer.config().gather().structure(),
            tracer.config().gather().estimate_options(),
        ));
        let barrier = Barrier::new(1);
        let precomputed = Mutex::new(Vec::new());
        let bar = ProgressBar::hidden();
        let mut rng = StdRng::seed_from_u64(99);

        tracer.photon_pass(0, &scene, &map, &barrier, &mut rng, &precomputed, &bar);

        let map = map.into_inner().unwrap();
        assert!(map.finalized());
        assert!(map.len() > 0 && map.len() <= 200);

        // emission from inside a closed diffuse sphere deposits photons
        // on its inner wall, each scaled by 1/numPhotons
        let avg = map.avg_photon_power();
        assert!(avg.x() > Val(0.0));
        assert!(avg.x() < Val(1.0));
    }

    #[test]
    fn ray_tracer_photon_walk_respects_depth_cap() {
        let scene = diffuse_box_scene(50);
        let config = TracerConfig::default()
            .with_num_threads(1)
            .with_max_photon_depth(1)
            .with_seed(7);
        let tracer = RayTracer::new(config, &scene);

        let map = RwLock::new(PhotonMap::with_capacity(
            1000,
            tracer.config().gather().structure(),
            tracer.config().gather().estimate_options(),
        ));
        let mut rng = StdRng::seed_from_u64(5);
        let mut cache = TraversalCache::new(scene.objects().len());

        // depth 1 allows at most one surface interaction per photon
        for _ in 0..50 {
            let (position, direction) = scene.lights()[0].sample_emission(&mut rng);
            let mut photon = Photon::new(position, direction, Vector::broadcast(Val(1.0)));
            tracer.trace_photon(&scene, &map, &mut photon, &mut rng, &mut cache, 0, false);
        }
        assert!(map.read().unwrap().len() <= 50);
    }
}

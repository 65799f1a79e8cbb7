use getset::CopyGetters;
use serde::Deserialize;

use crate::domain::math::algebra::{Product, UnitVector, Vector};
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;

use super::grid::UniformGrid;
use super::kd_tree::KdTree;
use super::photon::Photon;
use super::query::VolumeQuery;

/// Spatial index backing the photon map.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhotonStructure {
    #[default]
    KdTree,
    Grid,
    Flat,
}

/// Query-side knobs for the irradiance estimate.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct EstimateOptions {
    /// Cone-filter the photon contributions by distance.
    filter: bool,
    filter_constant: Val,
    /// Divide by the furthest accepted photon's squared distance instead
    /// of the squared search radius.
    use_furthest_photon_dist: bool,
    /// Reject photons whose surface normal diverges from the query
    /// normal beyond this cosine; approximates a search volume flattened
    /// along the surface.
    compression_ratio: Option<Val>,
    /// Estimates were precomputed per photon after finalize; run-time
    /// queries return the stored irradiance of the single nearest one.
    precompute: bool,
}

impl EstimateOptions {
    pub fn new(
        filter: bool,
        filter_constant: Val,
        use_furthest_photon_dist: bool,
        compression_ratio: Option<Val>,
        precompute: bool,
    ) -> Self {
        Self {
            filter,
            filter_constant,
            use_furthest_photon_dist,
            compression_ratio,
            precompute,
        }
    }

    pub fn normalizer(&self) -> Val {
        if self.filter {
            Val(1.0) - Val(2.0) / (Val(3.0) * self.filter_constant)
        } else {
            Val(1.0)
        }
    }
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            filter: true,
            filter_constant: Val(1.25),
            use_furthest_photon_dist: true,
            compression_ratio: Some(Val(0.9)),
            precompute: false,
        }
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Tree(KdTree),
    Grid(UniformGrid),
    Flat,
}

/// The photon map: an append-only photon buffer (slot 0 is a sentinel)
/// sized once at construction, a selectable spatial index over it, and
/// the irradiance estimator.
///
/// Lifecycle: `add_photon` calls must all precede the single `finalize`,
/// which permutes the buffer into its index structure; the map is
/// immutable afterwards and concurrent read-only queries are safe.
#[derive(Debug)]
pub struct PhotonMap {
    photons: Vec<Photon>,
    capacity: usize,
    backend: Backend,
    finalized: bool,
    last_scaled: usize,
    min_power: Vector,
    max_power: Vector,
    avg_power: Vector,
    options: EstimateOptions,
}

impl PhotonMap {
    pub fn with_capacity(
        capacity: usize,
        structure: PhotonStructure,
        options: EstimateOptions,
    ) -> Self {
        let mut photons = Vec::with_capacity(capacity + 1);
        photons.push(Photon::default());

        let backend = match structure {
            PhotonStructure::KdTree => Backend::Tree(KdTree::with_capacity(capacity)),
            PhotonStructure::Grid => {
                let cells = (capacity as f64).powf(1.0 / 3.0) as usize;
                Backend::Grid(UniformGrid::new([cells; 3]))
            }
            PhotonStructure::Flat => Backend::Flat,
        };

        Self {
            photons,
            capacity,
            backend,
            finalized: false,
            last_scaled: 0,
            min_power: Vector::broadcast(Val::INFINITY),
            max_power: Vector::broadcast(-Val::INFINITY),
            avg_power: Vector::zero(),
            options,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.photons.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn finalized(&self) -> bool {
        self.finalized
    }

    pub fn photon(&self, index: usize) -> &Photon {
        &self.photons[index]
    }

    /// Per-band minimum power; computed by `finalize`.
    pub fn min_photon_power(&self) -> Vector {
        self.min_power
    }

    /// Per-band maximum power; computed by `finalize`.
    pub fn max_photon_power(&self) -> Vector {
        self.max_power
    }

    /// Per-band average power (sum over count); computed by `finalize`.
    pub fn avg_photon_power(&self) -> Vector {
        self.avg_power
    }

    /// Append a photon. Returns false once the buffer is full; emitters
    /// keep tracing without storing when that happens.
    pub fn add_photon(&mut self, photon: &Photon) -> bool {
        debug_assert!(!self.finalized, "photon added after finalize");

        if self.len() >= self.capacity {
            return false;
        }

        self.photons.push(photon.clone());
        let index = self.len() as u32;

        match &mut self.backend {
            Backend::Tree(tree) => tree.insert(index, photon),
            Backend::Grid(grid) => grid.expand(photon.position()),
            Backend::Flat => {}
        }

        true
    }

    /// Scale the powers of all photons appended since the previous call;
    /// the monotonic cursor lets successive per-light scalings touch only
    /// their own batch.
    pub fn scale_photon_power(&mut self, scale: Val) {
        for index in (self.last_scaled + 1)..=self.len() {
            let scaled = self.photons[index].power() * scale;
            self.photons[index].set_power(scaled);
        }
        self.last_scaled = self.len();
    }

    /// Turn the flat photon buffer into its spatial index. Called exactly
    /// once, after all insertions.
    pub fn finalize(&mut self) {
        assert!(!self.finalized, "photon map finalized twice");

        if !self.is_empty() {
            match &mut self.backend {
                Backend::Tree(tree) => tree.balance(&mut self.photons),
                Backend::Grid(grid) => {
                    for index in 1..self.photons.len() {
                        grid.add_node(index as u32, self.photons[index].position());
                    }
                }
                Backend::Flat => {}
            }

            let mut sum = Vector::zero();
            for photon in &self.photons[1..] {
                let power = photon.power();
                self.min_power = self.min_power.component_min(&power);
                self.max_power = self.max_power.component_max(&power);
                sum += power;
            }
            self.avg_power = sum / Val::from(self.len());
        }

        self.finalized = true;
    }

    pub fn set_irradiance(&mut self, index: usize, irradiance: Vector) {
        self.photons[index].set_irradiance(irradiance);
    }

    /// Estimate of the irradiance at `position` with surface normal
    /// `normal`, from the `count` nearest photons within `radius`. With
    /// precomputed estimates enabled this returns the stored irradiance
    /// of the single nearest photon instead.
    pub fn irradiance_estimate(
        &self,
        position: Point,
        normal: UnitVector,
        radius: Val,
        count: usize,
    ) -> Vector {
        if self.is_empty() {
            return Vector::zero();
        }
        if self.options.precompute() {
            self.lookup_precomputed(position, normal, radius)
        } else {
            self.compute_estimate(position, normal, radius, count)
        }
    }

    /// Always run the full k-NN estimate, bypassing the precomputed
    /// lookup. The precompute phase itself uses this.
    pub fn compute_estimate(
        &self,
        position: Point,
        normal: UnitVector,
        radius: Val,
        count: usize,
    ) -> Vector {
        if self.is_empty() {
            return Vector::zero();
        }
        debug_assert!(radius > Val(0.0) && count > 0);

        let mut query = VolumeQuery::new(
            count,
            position,
            normal,
            radius,
            self.options.compression_ratio(),
        );
        self.run_query(&mut query);

        let mut irradiance = Vector::zero();
        for node in query.nodes() {
            let photon = &self.photons[node.value() as usize];

            // Lambertian surfaces only: a dot product stands in for the
            // BRDF and drops photons that struck the back side.
            if photon.direction().dot(normal) < Val(0.0) {
                if self.options.filter() {
                    let weight =
                        Val(1.0) - node.key().sqrt() / (self.options.filter_constant() * radius);
                    irradiance += photon.power() * weight;
                } else {
                    irradiance += photon.power();
                }
            }
        }

        if query.count() > 1 {
            let area_radius_sq = if self.options.use_furthest_photon_dist() {
                query.max_node_dist()
            } else {
                radius * radius
            };
            irradiance = irradiance * (Val::PI * area_radius_sq * self.options.normalizer()).recip();
        }

        irradiance
    }

    fn lookup_precomputed(&self, position: Point, normal: UnitVector, radius: Val) -> Vector {
        let mut query = VolumeQuery::new(
            1,
            position,
            normal,
            radius,
            self.options.compression_ratio(),
        );
        self.run_query(&mut query);

        match query.nodes().next() {
            Some(node) => self.photons[node.value() as usize].irradiance(),
            None => Vector::zero(),
        }
    }

    fn run_query(&self, query: &mut VolumeQuery) {
        match &self.backend {
            Backend::Tree(tree) => tree.gather(&self.photons, query),
            Backend::Grid(grid) => grid.gather(&self.photons, query),
            Backend::Flat => {
                for index in 1..self.photons.len() {
                    query.offer(index as u32, &self.photons[index]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deterministic_points(count: usize, seed: u64) -> Vec<Point> {
        let mut state = seed;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 11) as f64) / ((1u64 << 53) as f64) * 2.0 - 1.0
        };
        (0..count)
            .map(|_| Point::new(Val(next()), Val(next()), Val(next())))
            .collect()
    }

    fn populated_map(structure: PhotonStructure, points: &[Point]) -> PhotonMap {
        let options = EstimateOptions::new(true, Val(1.25), true, None, false);
        let mut map = PhotonMap::with_capacity(points.len(), structure, options);
        for &p in points {
            let photon = Photon::new(p, UnitVector::y_direction(), Vector::broadcast(Val(1.0)));
            assert!(map.add_photon(&photon));
        }
        map.finalize();
        map
    }

    #[test]
    fn photon_map_nearest_neighbors_match_brute_force_for_all_backends() {
        let points = deterministic_points(1000, 0x1234_5678);
        let queries = deterministic_points(100, 0x9abc_def0);

        for structure in [PhotonStructure::KdTree, PhotonStructure::Grid, PhotonStructure::Flat] {
            let map = populated_map(structure, &points);

            for (qi, &qp) in queries.iter().enumerate() {
                let k = [1usize, 8, 32][qi % 3];
                let radius = Val(0.5);

                let mut query =
                    VolumeQuery::new(k, qp, UnitVector::y_direction(), radius, None);
                map.run_query(&mut query);

                let mut expected: Vec<Val> = (1..=map.len())
                    .map(|i| (map.photon(i).position() - qp).norm_squared())
                    .filter(|&d| d <= radius * radius && d > Val(0.0))
                    .collect();
                expected.sort();
                expected.truncate(k);

                let mut found: Vec<Val> = query.nodes().map(|n| n.key()).collect();
                found.sort();

                assert_eq!(
                    found, expected,
                    "backend {:?} query {} disagrees with brute force",
                    structure, qi,
                );
            }
        }
    }

    #[test]
    fn photon_map_empty_estimate_is_zero() {
        let map = PhotonMap::with_capacity(0, PhotonStructure::KdTree, EstimateOptions::default());
        let estimate =
            map.irradiance_estimate(Point::default(), UnitVector::y_direction(), Val(1.0), 8);
        assert_eq!(estimate, Vector::zero());
    }

    #[test]
    fn photon_map_zero_radius_accepts_nothing() {
        let points = deterministic_points(32, 42);
        let map = populated_map(PhotonStructure::KdTree, &points);
        let mut query = VolumeQuery::new(8, Point::default(), UnitVector::y_direction(), Val(0.0), None);
        map.run_query(&mut query);
        assert_eq!(query.count(), 0);
    }

    #[test]
    fn photon_map_rejects_photons_beyond_capacity() {
        let options = EstimateOptions::default();
        let mut map = PhotonMap::with_capacity(2, PhotonStructure::KdTree, options);
        let photon = Photon::new(
            Point::new(Val(0.1), Val(0.2), Val(0.3)),
            UnitVector::y_direction(),
            Vector::broadcast(Val(1.0)),
        );
        assert!(map.add_photon(&photon));
        assert!(map.add_photon(&photon));
        assert!(!map.add_photon(&photon));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn photon_map_scale_photon_power_touches_only_new_batch() {
        let options = EstimateOptions::default();
        let mut map = PhotonMap::with_capacity(4, PhotonStructure::Flat, options);
        let photon = |p: f64| {
            Photon::new(
                Point::new(Val(p), Val(0.0), Val(0.0)),
                UnitVector::y_direction(),
                Vector::broadcast(Val(1.0)),
            )
        };

        map.add_photon(&photon(0.1));
        map.add_photon(&photon(0.2));
        map.scale_photon_power(Val(0.5));

        map.add_photon(&photon(0.3));
        map.add_photon(&photon(0.4));
        map.scale_photon_power(Val(0.25));

        assert_eq!(map.photon(1).power(), Vector::broadcast(Val(0.5)));
        assert_eq!(map.photon(2).power(), Vector::broadcast(Val(0.5)));
        assert_eq!(map.photon(3).power(), Vector::broadcast(Val(0.25)));
        assert_eq!(map.photon(4).power(), Vector::broadcast(Val(0.25)));
    }

    #[test]
    fn photon_map_average_power_is_sum_over_count() {
        let options = EstimateOptions::default();
        let mut map = PhotonMap::with_capacity(2, PhotonStructure::Flat, options);
        for power in [0.5, 1.5] {
            let mut photon = Photon::new(
                Point::new(Val(power), Val(0.0), Val(0.0)),
                UnitVector::y_direction(),
                Vector::broadcast(Val(power)),
            );
            photon.set_power(Vector::broadcast(Val(power)));
            map.add_photon(&photon);
        }
        map.finalize();
        assert_eq!(map.avg_photon_power(), Vector::broadcast(Val(1.0)));
        assert_eq!(map.min_photon_power(), Vector::broadcast(Val(0.5)));
        assert_eq!(map.max_photon_power(), Vector::broadcast(Val(1.5)));
    }

    #[test]
    fn photon_map_estimate_uses_single_nearest_when_count_is_one() {
        let points = deterministic_points(64, 7);
        let map = populated_map(PhotonStructure::KdTree, &points);
        let mut query = VolumeQuery::new(
            1,
            Point::default(),
            UnitVector::y_direction(),
            Val(2.0),
            None,
        );
        map.run_query(&mut query);
        assert_eq!(query.count(), 1);

        let nearest = (1..=map.len())
            .map(|i| (map.photon(i).position() - Point::default()).norm_squared())
            .min()
            .unwrap();
        assert_eq!(query.max_node_dist(), nearest);
    }
}

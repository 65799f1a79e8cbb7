use smallvec::SmallVec;

use crate::domain::math::algebra::Vector;
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;

use super::query::{SpatialNode, VolumeQuery};

const BOUND_SENTINEL: Val = Val(1e12);

/// Uniform spatial grid over node indices. Each cell keeps a small bag
/// of references; the cell size follows from the tracked extents and the
/// per-dimension cell counts.
///
/// Used both as the alternative photon-map backend and for scene-object
/// partitioning (where objects are assigned to every overlapped cell).
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cells: Vec<SmallVec<[u32; 4]>>,
    size: [usize; 3],
    mins: Point,
    maxs: Point,
    cell_size: Vector,
}

impl UniformGrid {
    pub fn new(size: [usize; 3]) -> Self {
        let size = [size[0].max(1), size[1].max(1), size[2].max(1)];
        Self {
            cells: vec![SmallVec::new(); size[0] * size[1] * size[2]],
            size,
            mins: Point::broadcast(BOUND_SENTINEL),
            maxs: Point::broadcast(-BOUND_SENTINEL),
            cell_size: Vector::zero(),
        }
    }

    #[inline]
    pub fn grid_size(&self) -> [usize; 3] {
        self.size
    }

    #[inline]
    pub fn cell_size(&self) -> Vector {
        self.cell_size
    }

    pub fn set_bounds(&mut self, mins: Point, maxs: Point) {
        self.mins = mins;
        self.maxs = maxs;
        self.update_cell_size();
    }

    /// Grow the extents to include `position` (photon-backend insertion
    /// only records extents; the cells are filled at finalize time).
    pub fn expand(&mut self, position: Point) {
        self.mins = self.mins.component_min(&position);
        self.maxs = self.maxs.component_max(&position);
        self.update_cell_size();
    }

    fn update_cell_size(&mut self) {
        let extent = self.maxs - self.mins;
        self.cell_size = Vector::new(
            extent.x() / Val::from(self.size[0]),
            extent.y() / Val::from(self.size[1]),
            extent.z() / Val::from(self.size[2]),
        );
    }

    /// Index of the cell containing `position`. The extents can start at
    /// negative coordinates, hence the shift by `mins`; without clamping
    /// the result may fall outside the grid.
    pub fn cell_index(&self, position: Point, clamp: bool) -> [i64; 3] {
        let extent = self.maxs - self.mins;
        let offset = position - self.mins;
        let mut index = [
            (f64::from(offset.x() / extent.x()) * self.size[0] as f64) as i64,
            (f64::from(offset.y() / extent.y()) * self.size[1] as f64) as i64,
            (f64::from(offset.z() / extent.z()) * self.size[2] as f64) as i64,
        ];
        if clamp {
            for (i, &size) in index.iter_mut().zip(self.size.iter()) {
                *i = (*i).clamp(0, size as i64 - 1);
            }
        }
        index
    }

    pub fn index_in_bounds(&self, index: [i64; 3]) -> bool {
        index.iter().zip(self.size.iter()).all(|(&i, &size)| i >= 0 && (i as usize) < size)
    }

    pub fn position_in_bounds(&self, position: Point) -> bool {
        self.index_in_bounds(self.cell_index(position, false))
    }

    pub fn flat_index(&self, index: [i64; 3]) -> usize {
        (index[2] as usize) * (self.size[1] * self.size[0])
            + (index[1] as usize) * self.size[0]
            + (index[0] as usize)
    }

    pub fn cell(&self, index: [i64; 3]) -> &[u32] {
        &self.cells[self.flat_index(index)]
    }

    /// The cell containing `position`, with clamped indexing.
    pub fn cell_at(&self, position: Point) -> &[u32] {
        self.cell(self.cell_index(position, true))
    }

    pub fn add_to_cell(&mut self, index: [i64; 3], node: u32) {
        let flat = self.flat_index(index);
        self.cells[flat].push(node);
    }

    /// Place a node reference into the cell containing its position.
    pub fn add_node(&mut self, node: u32, position: Point) {
        let index = self.cell_index(position, true);
        self.add_to_cell(index, node);
    }

    /// Geometric center of the cell at `index`.
    pub fn cell_center(&self, index: [i64; 3]) -> Point {
        self.mins
            + Vector::new(
                Val::from(index[0] as usize) * self.cell_size.x(),
                Val::from(index[1] as usize) * self.cell_size.y(),
                Val::from(index[2] as usize) * self.cell_size.z(),
            )
            + self.cell_size * Val(0.5)
    }

    /// Offer every node in the cube of cells spanning the query radius.
    /// No pruning beyond the grid bounds; the query itself filters by
    /// distance.
    pub fn gather<T: SpatialNode>(&self, nodes: &[T], query: &mut VolumeQuery) {
        let radius = query.radius();
        let center = self.cell_index(query.position(), true);
        let reach = [
            f64::from(radius / self.cell_size.x()) as i64 + 1,
            f64::from(radius / self.cell_size.y()) as i64 + 1,
            f64::from(radius / self.cell_size.z()) as i64 + 1,
        ];

        for x in (center[0] - reach[0])..=(center[0] + reach[0]) {
            for y in (center[1] - reach[1])..=(center[1] + reach[1]) {
                for z in (center[2] - reach[2])..=(center[2] + reach[2]) {
                    let index = [x, y, z];
                    if !self.index_in_bounds(index) {
                        continue;
                    }
                    for &node in self.cell(index) {
                        query.offer(node, &nodes[node as usize]);
                    }
                }
            }
        }
    }
}

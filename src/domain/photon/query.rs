use getset::CopyGetters;

use crate::domain::math::algebra::{Product, UnitVector};
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;

use super::heap::{BoundedMaxHeap, HeapNode};

/// Anything a spatial index can hand to a [`VolumeQuery`].
pub trait SpatialNode {
    fn position(&self) -> Point;

    fn normal(&self) -> UnitVector;
}

/// Accumulator for a k-nearest-neighbor search inside a sphere: a query
/// position/normal, a search radius and an owning bounded max-heap of
/// capacity k, keyed by squared distance.
#[derive(Debug, CopyGetters)]
pub struct VolumeQuery {
    #[getset(get_copy = "pub")]
    position: Point,
    #[getset(get_copy = "pub")]
    normal: UnitVector,
    #[getset(get_copy = "pub")]
    radius: Val,
    compression_ratio: Option<Val>,
    heap: BoundedMaxHeap,
}

impl VolumeQuery {
    pub fn new(
        max_nodes: usize,
        position: Point,
        normal: UnitVector,
        radius: Val,
        compression_ratio: Option<Val>,
    ) -> Self {
        Self {
            position,
            normal,
            radius,
            compression_ratio,
            heap: BoundedMaxHeap::with_capacity(max_nodes),
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.heap.len()
    }

    /// Squared distance of the furthest accepted node, or the squared
    /// search radius while the heap is still empty. Always squared; the
    /// kd-tree descent compares squared plane distances against it, so
    /// the effective search radius contracts as the heap saturates.
    #[inline]
    pub fn max_node_dist(&self) -> Val {
        match self.heap.top() {
            Some(top) => top.key(),
            None => self.radius * self.radius,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = HeapNode> + '_ {
        self.heap.iter()
    }

    /// Offer a candidate node. Rejects nodes outside the search sphere,
    /// the query point itself, and (with sphere compression) nodes whose
    /// surface normal diverges too far from the query normal. When the
    /// heap is saturated the furthest node is replaced only by a closer
    /// one.
    pub fn offer<T: SpatialNode>(&mut self, index: u32, node: &T) {
        let dist = (self.position - node.position()).norm_squared();

        if dist > self.radius * self.radius || dist <= Val(0.0) {
            return;
        }

        if let Some(ratio) = self.compression_ratio {
            if node.normal().dot(self.normal) < ratio {
                return;
            }
        }

        if !self.heap.push(dist, index) && dist < self.max_node_dist() {
            self.heap.pop();
            self.heap.push(dist, index);
        }
    }
}

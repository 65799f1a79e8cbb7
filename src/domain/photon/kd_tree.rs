use crate::domain::math::geometry::{Axis, Point};
use crate::domain::math::numeric::Val;

use super::Photon;
use super::query::VolumeQuery;

const BOUND_SENTINEL: Val = Val(1e12);

/// Left-balanced kd-tree over photon-buffer indices, stored in heap
/// order (children of node i live at 2i and 2i+1, slot 0 unused).
///
/// Nodes are appended during the photon pass; a single `balance` call
/// reshapes the flat index array into the tree and permutes the backing
/// photon buffer to match. Queries must not run before balancing.
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<u32>,
    mins: Point,
    maxs: Point,
}

impl KdTree {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 1);
        nodes.push(0);
        Self {
            nodes,
            mins: Point::broadcast(BOUND_SENTINEL),
            maxs: Point::broadcast(-BOUND_SENTINEL),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&mut self, index: u32, photon: &Photon) {
        let position = photon.position();
        self.nodes.push(index);
        self.mins = self.mins.component_min(&position);
        self.maxs = self.maxs.component_max(&position);
    }

    /// Rebuild the flat index array into a left-balanced tree, stamping
    /// each interior photon's splitting axis, then permute the photon
    /// buffer so that slot i holds the photon chosen for tree node i.
    pub fn balance(&mut self, photons: &mut [Photon]) {
        let count = self.len();
        if count <= 1 {
            return;
        }

        let mut lft = vec![0u32; count + 1];
        let mut rgt = self.nodes.clone();
        self.balance_segment(&mut lft, &mut rgt, 1, 1, count, photons);

        let reordered: Vec<Photon> = lft[1..]
            .iter()
            .map(|&index| photons[index as usize].clone())
            .collect();
        for (slot, photon) in reordered.into_iter().enumerate() {
            photons[slot + 1] = photon;
        }
        for (slot, node) in self.nodes.iter_mut().enumerate() {
            *node = slot as u32;
        }
    }

    /// Recursive k-NN descent from the root. The child nearer to the
    /// query is searched first; the far child only while the splitting
    /// plane is closer than the current kth-nearest distance.
    pub fn gather(&self, photons: &[Photon], query: &mut VolumeQuery) {
        if !self.is_empty() {
            self.gather_from(photons, query, 1);
        }
    }

    fn gather_from(&self, photons: &[Photon], query: &mut VolumeQuery, node_num: usize) {
        if node_num >= self.nodes.len() {
            return;
        }

        let index = self.nodes[node_num];
        let photon = &photons[index as usize];

        if (node_num << 1) < self.nodes.len() {
            let axis = photon.axis();
            let delta = query.position().axis(axis) - photon.position().axis(axis);
            let (near, far) = if delta > Val(0.0) {
                ((node_num << 1) + 1, node_num << 1)
            } else {
                (node_num << 1, (node_num << 1) + 1)
            };

            self.gather_from(photons, query, near);
            if delta * delta < query.max_node_dist() {
                self.gather_from(photons, query, far);
            }
        }

        query.offer(index, photon);
    }

    fn balance_segment(
        &mut self,
        lft: &mut [u32],
        rgt: &mut [u32],
        root: usize,
        start: usize,
        end: usize,
        photons: &mut [Photon],
    ) {
        // median index that keeps the tree complete on the left
        let len = end - start + 1;
        let mut median = 1usize;
        while 4 * median <= len {
            median <<= 1;
        }
        if 3 * median <= len {
            median = 2 * median + start - 1;
        } else {
            median = end + 1 - median;
        }

        // split along the longest extent of the current sub-bound
        let extent = self.maxs - self.mins;
        let axis = if extent.x() > extent.y() && extent.x() > extent.z() {
            Axis::X
        } else if extent.y() > extent.z() {
            Axis::Y
        } else {
            Axis::Z
        };

        Self::median_split(rgt, start, end, median, axis, photons);

        lft[root] = rgt[median];
        photons[lft[root] as usize].set_axis(axis);
        let split = photons[lft[root] as usize].position().axis(axis);

        if median > start {
            if start < median - 1 {
                let saved = self.maxs.axis(axis);
                self.maxs = self.maxs.with_axis(axis, split);
                self.balance_segment(lft, rgt, root << 1, start, median - 1, photons);
                self.maxs = self.maxs.with_axis(axis, saved);
            } else {
                lft[root << 1] = rgt[start];
            }
        }

        if median < end {
            if median + 1 < end {
                let saved = self.mins.axis(axis);
                self.mins = self.mins.with_axis(axis, split);
                self.balance_segment(lft, rgt, (root << 1) + 1, median + 1, end, photons);
                self.mins = self.mins.with_axis(axis, saved);
            } else {
                lft[(root << 1) + 1] = rgt[end];
            }
        }
    }

    /// Hoare-style in-place quickselect: partition `rgt[start..=end]` so
    /// that the node at `median` is the median along `axis`.
    fn median_split(
        rgt: &mut [u32],
        start: usize,
        end: usize,
        median: usize,
        axis: Axis,
        photons: &[Photon],
    ) {
        let coord = |index: u32| photons[index as usize].position().axis(axis);

        let mut s = start;
        let mut e = end;

        while e > s {
            let pivot = coord(rgt[e]);
            let mut i = s as isize - 1;
            let mut j = e;

            loop {
                loop {
                    i += 1;
                    if coord(rgt[i as usize]) >= pivot {
                        break;
                    }
                }
                loop {
                    j -= 1;
                    if !(coord(rgt[j]) > pivot && j > s) {
                        break;
                    }
                }

                if i as usize >= j {
                    break;
                }
                rgt.swap(i as usize, j);
            }

            let i = i as usize;
            rgt.swap(i, e);

            if i >= median {
                e = i - 1;
            }
            if i < median {
                s = i + 1;
            }
        }
    }
}

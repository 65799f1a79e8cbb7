mod grid;
mod heap;
mod kd_tree;
mod map;
mod photon;
mod query;

pub use grid::UniformGrid;
pub use heap::{BoundedMaxHeap, HeapNode};
pub use kd_tree::KdTree;
pub use map::{EstimateOptions, PhotonMap, PhotonStructure};
pub use photon::Photon;
pub use query::{SpatialNode, VolumeQuery};

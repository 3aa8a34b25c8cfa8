//! In-memory rig model: the bone graph and the vertex weights that follow it.

pub mod bone;
pub mod weights;

pub use bone::{Bone, BoneGraph, Constraint};
pub use weights::{MeshWeights, MixMode, WeightTable};

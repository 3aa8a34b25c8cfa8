//! Per-mesh vertex groups keyed by bone name.
//!
//! Storage is column-major: each mesh keeps one sparse `vertex -> weight` map
//! per bone name. A column may exist and still be all zero, the same way a
//! host vertex group can exist without any assigned vertices.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RigError;
use crate::rig::bone::BoneGraph;

/// How a source weight is combined into the target column during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixMode {
    /// `min(1, target + source)`.
    #[default]
    Add,
    /// Target takes the source weight wherever the source is nonzero.
    Replace,
}

impl MixMode {
    pub fn combine(self, target: f32, source: f32) -> f32 {
        match self {
            MixMode::Add => (target + source).min(1.0),
            MixMode::Replace => source,
        }
    }
}

pub type Column = BTreeMap<usize, f32>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshWeights {
    pub name: String,
    pub vertex_count: usize,
    #[serde(default)]
    pub groups: BTreeMap<String, Column>,
}

impl MeshWeights {
    pub fn new(name: impl Into<String>, vertex_count: usize) -> Self {
        Self { name: name.into(), vertex_count, groups: BTreeMap::new() }
    }

    pub fn weight(&self, vertex: usize, bone: &str) -> f32 {
        self.groups.get(bone).and_then(|c| c.get(&vertex)).copied().unwrap_or(0.0)
    }

    /// Sum of all bone weights on one vertex.
    pub fn vertex_sum(&self, vertex: usize) -> f32 {
        self.groups.values().filter_map(|c| c.get(&vertex)).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    meshes: Vec<MeshWeights>,
}

impl WeightTable {
    pub fn new() -> Self { Self::default() }

    pub fn from_meshes(meshes: Vec<MeshWeights>) -> Self { Self { meshes } }

    pub fn into_meshes(self) -> Vec<MeshWeights> { self.meshes }

    pub fn meshes(&self) -> &[MeshWeights] { &self.meshes }

    pub fn mesh(&self, name: &str) -> Option<&MeshWeights> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn add_mesh(&mut self, name: impl Into<String>, vertex_count: usize) -> &mut MeshWeights {
        self.meshes.push(MeshWeights::new(name, vertex_count));
        let last = self.meshes.len() - 1;
        &mut self.meshes[last]
    }

    /// Creates an empty column on `mesh` if it does not exist yet.
    pub fn add_column(&mut self, mesh: &str, bone: &str) -> Result<(), RigError> {
        let m = self.mesh_mut(mesh)?;
        m.groups.entry(bone.to_string()).or_default();
        Ok(())
    }

    /// Assigns a weight, clamped to [0, 1]. A zero weight clears the entry but
    /// keeps the column.
    pub fn set_weight(&mut self, mesh: &str, vertex: usize, bone: &str, weight: f32) -> Result<(), RigError> {
        let m = self.mesh_mut(mesh)?;
        if vertex >= m.vertex_count {
            return Err(RigError::VertexOutOfRange { mesh: mesh.to_string(), index: vertex, count: m.vertex_count });
        }
        let column = m.groups.entry(bone.to_string()).or_default();
        let w = weight.clamp(0.0, 1.0);
        if w > 0.0 { column.insert(vertex, w); } else { column.remove(&vertex); }
        Ok(())
    }

    pub fn weight(&self, mesh: &str, vertex: usize, bone: &str) -> f32 {
        self.mesh(mesh).map(|m| m.weight(vertex, bone)).unwrap_or(0.0)
    }

    pub fn vertex_sum(&self, mesh: &str, vertex: usize) -> f32 {
        self.mesh(mesh).map(|m| m.vertex_sum(vertex)).unwrap_or(0.0)
    }

    /// True if any mesh carries a column for `bone`.
    pub fn has_column(&self, bone: &str) -> bool {
        self.meshes.iter().any(|m| m.groups.contains_key(bone))
    }

    pub fn column_names(&self) -> BTreeSet<&str> {
        self.meshes.iter().flat_map(|m| m.groups.keys().map(String::as_str)).collect()
    }

    /// Sum of `bone`'s weights over every vertex of every mesh. Zero means the
    /// bone deforms nothing.
    pub fn total_weight(&self, bone: &str) -> f32 {
        self.meshes
            .iter()
            .filter_map(|m| m.groups.get(bone))
            .flat_map(|c| c.values())
            .sum()
    }

    /// Folds `source` into `target` on every mesh carrying `source`, then drops
    /// `source` everywhere. Returns the number of vertices whose target weight
    /// was written.
    pub fn merge_bone(&mut self, source: &str, target: &str, mode: MixMode) -> usize {
        if source == target { return 0; }
        let mut touched = 0;
        for mesh in &mut self.meshes {
            let Some(src) = mesh.groups.remove(source) else { continue; };
            let dst = mesh.groups.entry(target.to_string()).or_default();
            for (vertex, w) in src {
                if w <= 0.0 { continue; }
                let current = dst.get(&vertex).copied().unwrap_or(0.0);
                dst.insert(vertex, mode.combine(current, w));
                touched += 1;
            }
        }
        debug!(source, target, ?mode, touched, "merged weight column");
        touched
    }

    /// Drops the column without redistributing it. Returns how many meshes had it.
    pub fn remove_column(&mut self, bone: &str) -> usize {
        self.meshes.iter_mut().filter_map(|m| m.groups.remove(bone)).count()
    }

    /// Renames a column on every mesh. A mesh that already has `new` (a group
    /// with no bone behind it) gets the old column combined in with `mode`.
    pub fn rename_column(&mut self, old: &str, new: &str, mode: MixMode) {
        if old == new { return; }
        self.rename_columns(&HashMap::from([(old.to_string(), new.to_string())]), mode);
    }

    /// Bulk form of `rename_column`: every old column is lifted out first, then
    /// reinserted under its new name.
    pub fn rename_columns(&mut self, renames: &HashMap<String, String>, mode: MixMode) {
        for mesh in &mut self.meshes {
            let lifted: Vec<(String, Column)> = renames
                .iter()
                .filter_map(|(old, new)| mesh.groups.remove(old).map(|c| (new.clone(), c)))
                .collect();
            for (new, col) in lifted {
                let dst = mesh.groups.entry(new).or_default();
                for (v, w) in col {
                    let cur = dst.get(&v).copied().unwrap_or(0.0);
                    dst.insert(v, mode.combine(cur, w));
                }
            }
        }
    }

    /// Columns that no longer name a live bone.
    pub fn orphan_columns(&self, graph: &BoneGraph) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|c| !graph.contains(c))
            .map(str::to_string)
            .collect()
    }

    fn mesh_mut(&mut self, name: &str) -> Result<&mut MeshWeights, RigError> {
        self.meshes
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| RigError::MeshNotFound(name.to_string()))
    }
}

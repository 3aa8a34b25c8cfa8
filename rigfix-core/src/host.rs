//! Boundary with the host editor: a serializable rig snapshot and the accessor
//! trait hosts implement to hand it over and take it back.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RigError, SnapshotError};
use crate::rig::{Bone, BoneGraph, MeshWeights, WeightTable};

fn default_armature() -> String { "Armature".into() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigSnapshot {
    #[serde(default = "default_armature")]
    pub armature: String,
    pub bones: Vec<Bone>,
    #[serde(default)]
    pub meshes: Vec<MeshWeights>,
}

impl RigSnapshot {
    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Splits into the pipeline's working structures, checking graph
    /// invariants and vertex indices. Weights are clamped to [0, 1].
    pub fn into_parts(self) -> Result<(String, BoneGraph, WeightTable), RigError> {
        let graph = BoneGraph::from_bones(self.bones)?;
        let mut meshes = self.meshes;
        for mesh in &mut meshes {
            let count = mesh.vertex_count;
            for column in mesh.groups.values_mut() {
                if let Some((&index, _)) = column.iter().find(|(v, _)| **v >= count) {
                    return Err(RigError::VertexOutOfRange { mesh: mesh.name.clone(), index, count });
                }
                column.values_mut().for_each(|w| *w = w.clamp(0.0, 1.0));
            }
        }
        Ok((self.armature, graph, WeightTable::from_meshes(meshes)))
    }

    pub fn from_parts(armature: impl Into<String>, graph: BoneGraph, weights: WeightTable) -> Self {
        Self { armature: armature.into(), bones: graph.into_bones(), meshes: weights.into_meshes() }
    }
}

/// Supplies the current rig and accepts the normalized one back.
pub trait RigAccessor {
    fn load(&mut self) -> Result<RigSnapshot, SnapshotError>;
    fn store(&mut self, snapshot: &RigSnapshot) -> Result<(), SnapshotError>;
}

/// Reads a snapshot from one JSON file and writes the result to another
/// (or the same) path.
#[derive(Debug, Clone)]
pub struct JsonRigFile {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl JsonRigFile {
    pub fn new(input: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        let input = input.into();
        let output = output.unwrap_or_else(|| input.clone());
        Self { input, output }
    }
}

impl RigAccessor for JsonRigFile {
    fn load(&mut self) -> Result<RigSnapshot, SnapshotError> {
        let data = std::fs::read_to_string(&self.input)?;
        RigSnapshot::from_json_str(&data)
    }

    fn store(&mut self, snapshot: &RigSnapshot) -> Result<(), SnapshotError> {
        std::fs::write(&self.output, snapshot.to_json_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIG: &str = r#"{
        "bones": [
            {"name": "Hips", "head": [0.0, 0.0, 1.0], "tail": [0.0, 0.0, 1.2]},
            {"name": "Spine", "head": [0.0, 0.0, 1.2], "tail": [0.0, 0.0, 1.4], "parent": "Hips"}
        ],
        "meshes": [
            {"name": "Body", "vertex_count": 2, "groups": {"Spine": {"0": 0.5, "1": 1.5}}}
        ]
    }"#;

    #[test]
    fn parses_defaults_and_clamps() {
        let snap = RigSnapshot::from_json_str(RIG).unwrap();
        assert_eq!(snap.armature, "Armature");
        let (_, graph, weights) = snap.into_parts().unwrap();
        assert_eq!(graph.parent_of("Spine"), Some("Hips"));
        assert_eq!(weights.weight("Body", 1, "Spine"), 1.0);
    }

    #[test]
    fn rejects_out_of_range_vertices() {
        let mut snap = RigSnapshot::from_json_str(RIG).unwrap();
        snap.meshes[0].groups.get_mut("Spine").unwrap().insert(7, 0.1);
        let err = snap.into_parts().unwrap_err();
        assert_eq!(err, RigError::VertexOutOfRange { mesh: "Body".into(), index: 7, count: 2 });
    }

    #[test]
    fn file_accessor_round_trips() {
        let dir = std::env::temp_dir().join(format!("rigfix-host-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.json");
        let output = dir.join("out.json");
        std::fs::write(&input, RIG).unwrap();
        let mut file = JsonRigFile::new(&input, Some(output.clone()));
        let snap = file.load().unwrap();
        file.store(&snap).unwrap();
        let again = JsonRigFile::new(&output, None).load().unwrap();
        assert_eq!(again, snap);
        std::fs::remove_dir_all(&dir).ok();
    }
}

//! Error types shared across the rig model, rule loading and the pipeline.

use thiserror::Error;

/// Structural failures raised by `BoneGraph` and `WeightTable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RigError {
    #[error("bone '{0}' not found")]
    NotFound(String),
    #[error("a bone named '{0}' already exists")]
    DuplicateBone(String),
    #[error("parenting '{child}' to '{parent}' would create a cycle")]
    CycleDetected { child: String, parent: String },
    #[error("bone '{0}' has no parent")]
    NoParent(String),
    #[error("mesh '{0}' not found")]
    MeshNotFound(String),
    #[error("vertex {index} out of range for mesh '{mesh}' ({count} vertices)")]
    VertexOutOfRange { mesh: String, index: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("translation dictionary unavailable: {0}")]
    TranslationUnavailable(String),
}

/// Advisory failures from the hierarchy check. The rig keeps its state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} was not found in the hierarchy, this will cause problems!")]
    UnknownBone(String),
    #[error("{}", wrong_parent_message(.bone, .expected, .actual))]
    WrongParent { bone: String, expected: String, actual: Option<String> },
}

fn wrong_parent_message(bone: &str, expected: &str, actual: &Option<String>) -> String {
    match actual {
        None => format!("{bone} is not parented at all, this will cause problems!"),
        Some(_) => format!("{bone} is not parented to {expected}, this will cause problems!"),
    }
}

impl ValidationError {
    /// Name of the bone the failure is about.
    pub fn bone(&self) -> &str {
        match self {
            ValidationError::UnknownBone(b) => b,
            ValidationError::WrongParent { bone, .. } => bone,
        }
    }
}

/// Fatal pipeline errors. Validation failures are not errors; see `NormalizeStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error("rig edit failed during {pass}: {source}")]
    Rig { pass: &'static str, #[source] source: RigError },
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rules YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("required chain #{0} is empty")]
    EmptyChain(usize),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access rig snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rig snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Rig(#[from] RigError),
}

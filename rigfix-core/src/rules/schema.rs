use serde::{Deserialize, Serialize};

use crate::rig::MixMode;

/// Ordered `(from, to)` association list. Order is significant and duplicate
/// keys are applied in sequence.
pub type RuleTable = Vec<(String, String)>;

/// Static tables that drive the normalization passes. Omitted fields fall back
/// to the humanoid defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// `(child, parent)` pairs.
    pub reparent: RuleTable,
    /// `(source, canonical)` bone renames.
    pub rename: RuleTable,
    /// `(source, canonical)` weight column merges.
    pub weight_merge: RuleTable,
    pub discard_exact: Vec<String>,
    pub discard_prefix: Vec<String>,
    /// Root-to-leaf chains that must be directly parent-linked.
    pub required_chains: Vec<Vec<String>>,
    pub posture: Posture,
    /// Combine mode when a rename lands on an existing bone.
    pub rename_merge_mode: MixMode,
    pub weight_merge_mode: MixMode,
}

impl Default for RuleSet {
    fn default() -> Self { Self::humanoid() }
}

impl RuleSet {
    /// The built-in tables for MMD-style rigs.
    pub fn humanoid() -> Self { super::humanoid::rule_set() }

    /// Tables with nothing in them. Useful as a base for hand-built rules.
    pub fn empty() -> Self {
        Self {
            reparent: Vec::new(),
            rename: Vec::new(),
            weight_merge: Vec::new(),
            discard_exact: Vec::new(),
            discard_prefix: Vec::new(),
            required_chains: Vec::new(),
            posture: Posture::default(),
            rename_merge_mode: MixMode::Add,
            weight_merge_mode: MixMode::Add,
        }
    }

    pub fn is_discarded(&self, name: &str) -> bool {
        self.discard_exact.iter().any(|n| n == name)
            || self.discard_prefix.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// Bone names and threshold for the hip/leg alignment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Posture {
    pub root: String,
    pub left_leg: String,
    pub right_leg: String,
    pub degenerate_angle_deg: f32,
}

impl Default for Posture {
    fn default() -> Self {
        Self {
            root: "Hips".into(),
            left_leg: "Left leg".into(),
            right_leg: "Right leg".into(),
            degenerate_angle_deg: 5.0,
        }
    }
}

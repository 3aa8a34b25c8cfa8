//! Built-in tables for rigs exported with MMD-style English bone names,
//! targeting the Unity humanoid avatar mapping.

use super::schema::{Posture, RuleSet, RuleTable};
use crate::rig::MixMode;

const DISCARD_EXACT: &[&str] = &[
    "ControlNode", "ParentNode", "Center", "CenterTip", "Groove", "Waist", "LowerBody2", "Eyes", "EyesTip",
    "LowerBodyTip", "UpperBody2Tip", "GrooveTip", "NeckTip",
];

const DISCARD_PREFIX: &[&str] = &[
    "_shadow_", "_dummy_", "Dummy_", "WaistCancel", "LegIKParent", "LegIK", "LegIKTip", "ToeTipIK",
    "ToeTipIKTip", "ShoulderP_", "EyeTip_", "ThumbTip_", "IndexFingerTip_", "MiddleFingerTip_",
    "RingFingerTip_", "LittleFingerTip_", "HandDummy_", "ArmTwist", "HandTwist", "LegD", "KneeD_L",
    "AnkleD", "LegTipEX", "HandTip_", "ShoulderC_", "SleeveShoulderIK_",
];

const REPARENT: &[(&str, &str)] = &[
    ("Head", "Neck"),
    ("Neck", "Chest"),
    ("Chest", "Spine"),
    ("Spine", "Hips"),
    ("UpperBody", "LowerBody"),
    ("Shoulder_L", "UpperBody2"),
    ("Shoulder_R", "UpperBody2"),
    ("Arm_L", "Shoulder_L"),
    ("Arm_R", "Shoulder_R"),
    ("Elbow_L", "Arm_L"),
    ("Elbow_R", "Arm_R"),
    ("Wrist_L", "Elbow_L"),
    ("Wrist_R", "Elbow_R"),
    ("LegD_L", "Leg_L"),
    ("LegD_R", "Leg_R"),
    ("KneeD_L", "Knee_L"),
    ("KneeD_R", "Knee_R"),
    ("Knee_L", "Leg_L"),
    ("Knee_R", "Leg_R"),
    ("AnkleD_L", "Ankle_L"),
    ("AnkleD_R", "Ankle_R"),
    ("Ankle_L", "Knee_L"),
    ("Ankle_R", "Knee_R"),
    ("LegTipEX_L", "ToeTip_L"),
    ("LegTipEX_R", "ToeTip_R"),
    ("ToeTip_L", "Ankle_L"),
    ("ToeTip_R", "Ankle_R"),
];

// Shoulder_L/R appear twice; both entries are applied in order.
const WEIGHT_MERGE: &[(&str, &str)] = &[
    ("LegD_L", "Left leg"),
    ("LegD_R", "Right leg"),
    ("KneeD_L", "Left knee"),
    ("KneeD_R", "Right knee"),
    ("AnkleD_L", "Left ankle"),
    ("AnkleD_R", "Right ankle"),
    ("LegTipEX_L", "Left toe"),
    ("LegTipEX_R", "Right toe"),
    ("Shoulder_L", "ShoulderC_L"),
    ("Shoulder_R", "ShoulderC_R"),
    ("Shoulder_L", "SleeveShoulderIK_L"),
    ("Shoulder_R", "SleeveShoulderIK_R"),
    ("ArmTwist_L", "Left arm"),
    ("ArmTwist_R", "Right arm"),
    ("ArmTwist1_L", "Left arm"),
    ("ArmTwist1_R", "Right arm"),
    ("ArmTwist2_L", "Left arm"),
    ("ArmTwist2_R", "Right arm"),
    ("ArmTwist3_L", "Left arm"),
    ("ArmTwist3_R", "Right arm"),
    ("HandTwist_L", "Left elbow"),
    ("HandTwist_R", "Right elbow"),
    ("HandTwist1_L", "Left elbow"),
    ("HandTwist1_R", "Right elbow"),
    ("HandTwist2_L", "Left elbow"),
    ("HandTwist2_R", "Right elbow"),
    ("HandTwist3_L", "Left elbow"),
    ("HandTwist3_R", "Right elbow"),
];

const RENAME: &[(&str, &str)] = &[
    ("LowerBody", "Hips"),
    ("Leg_L", "Left leg"),
    ("Leg_R", "Right leg"),
    ("Knee_L", "Left knee"),
    ("Knee_R", "Right knee"),
    ("Ankle_L", "Left ankle"),
    ("Ankle_R", "Right ankle"),
    ("ToeTip_L", "Left toe"),
    ("ToeTip_R", "Right toe"),
    ("UpperBody", "Spine"),
    ("UpperBody2", "Chest"),
    ("Shoulder_L", "Left shoulder"),
    ("Shoulder_R", "Right shoulder"),
    ("Arm_L", "Left arm"),
    ("Arm_R", "Right arm"),
    ("Elbow_L", "Left elbow"),
    ("Elbow_R", "Right elbow"),
    ("Wrist_L", "Left wrist"),
    ("Wrist_R", "Right wrist"),
];

const CHAINS: &[&[&str]] = &[
    &["Hips", "Spine", "Chest", "Neck", "Head"],
    &["Hips", "Left leg", "Left knee", "Left ankle"],
    &["Hips", "Right leg", "Right knee", "Right ankle"],
    // Shoulders hang off the chest, so the arm chains run through the spine.
    &["Hips", "Spine", "Chest", "Left shoulder", "Left arm", "Left elbow", "Left wrist"],
    &["Hips", "Spine", "Chest", "Right shoulder", "Right arm", "Right elbow", "Right wrist"],
];

fn table(pairs: &[(&str, &str)]) -> RuleTable {
    pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
}

fn list(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub fn rule_set() -> RuleSet {
    RuleSet {
        reparent: table(REPARENT),
        rename: table(RENAME),
        weight_merge: table(WEIGHT_MERGE),
        discard_exact: list(DISCARD_EXACT),
        discard_prefix: list(DISCARD_PREFIX),
        required_chains: CHAINS.iter().map(|c| list(c)).collect(),
        posture: Posture::default(),
        rename_merge_mode: MixMode::Add,
        weight_merge_mode: MixMode::Add,
    }
}

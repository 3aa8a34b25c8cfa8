//! Hip/leg alignment for target avatars that reject hips sunk between the legs.

use glam::Vec3;

use crate::error::RigError;
use crate::rig::BoneGraph;
use crate::rules::Posture;

/// Result of the alignment, present only when all three bones exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureFix {
    pub left_angle: f32,
    pub right_angle: f32,
    /// Both legs are within the threshold of the hip direction.
    pub degenerate: bool,
}

impl PostureFix {
    pub fn worst_angle(&self) -> f32 { self.left_angle.max(self.right_angle) }
}

/// Y (lateral) of both leg heads and the hip bone is taken from the right leg
/// head, and the hip tail is lifted to the right leg head's Z.
pub fn align_hips(graph: &mut BoneGraph, posture: &Posture) -> Result<Option<PostureFix>, RigError> {
    let (Some(hips), Some(left), Some(right)) = (
        graph.get(&posture.root),
        graph.get(&posture.left_leg),
        graph.get(&posture.right_leg),
    ) else {
        return Ok(None);
    };
    let right_head = right.head;
    let left_head = Vec3::new(left.head.x, right_head.y, left.head.z);
    let hips_head = Vec3::new(hips.head.x, right_head.y, hips.head.z);
    let hips_tail = Vec3::new(hips.tail.x, hips_head.y, right_head.z);

    graph.set_head(&posture.left_leg, left_head)?;
    graph.set_head(&posture.root, hips_head)?;
    graph.set_tail(&posture.root, hips_tail)?;

    let left_angle = graph.bone_angle(&posture.root, &posture.left_leg)?;
    let right_angle = graph.bone_angle(&posture.root, &posture.right_leg)?;
    let threshold = posture.degenerate_angle_deg;
    Ok(Some(PostureFix { left_angle, right_angle, degenerate: left_angle < threshold && right_angle < threshold }))
}

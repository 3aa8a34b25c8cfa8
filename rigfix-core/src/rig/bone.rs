use std::collections::{HashMap, HashSet};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RigError;
use crate::rig::weights::{MixMode, WeightTable};

/// A pose-space behavioral constraint attached to a bone (IK, copy rotation, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    pub head: Vec3,
    pub tail: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl Bone {
    pub fn new(name: impl Into<String>, head: Vec3, tail: Vec3) -> Self {
        Self { name: name.into(), head, tail, parent: None, constraints: Vec::new() }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_constraint(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.constraints.push(Constraint { name: name.into(), kind: kind.into() });
        self
    }

    /// Head to tail vector.
    pub fn vector(&self) -> Vec3 { self.tail - self.head }
}

/// Named bones with parent links. Parent references always resolve to a live
/// bone in the same graph; every structural edit below keeps that true.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneGraph {
    bones: Vec<Bone>,
}

impl BoneGraph {
    pub fn new() -> Self { Self::default() }

    /// Builds a graph from a host snapshot, rejecting duplicate names,
    /// dangling parents and cycles.
    pub fn from_bones(bones: Vec<Bone>) -> Result<Self, RigError> {
        let mut graph = Self::new();
        for bone in bones { graph.insert_unchecked_parent(bone)?; }
        for bone in &graph.bones {
            if let Some(p) = &bone.parent {
                if !graph.contains(p) { return Err(RigError::NotFound(p.clone())); }
            }
        }
        graph.check_acyclic()?;
        Ok(graph)
    }

    pub fn into_bones(self) -> Vec<Bone> { self.bones }

    pub fn len(&self) -> usize { self.bones.len() }
    pub fn is_empty(&self) -> bool { self.bones.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &Bone> { self.bones.iter() }

    pub fn names(&self) -> Vec<String> { self.bones.iter().map(|b| b.name.clone()).collect() }

    pub fn contains(&self, name: &str) -> bool { self.index_of(name).is_some() }

    pub fn get(&self, name: &str) -> Option<&Bone> {
        self.index_of(name).map(|i| &self.bones[i])
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|b| b.parent.as_deref())
    }

    /// Adds a bone. Its parent, if any, must already be in the graph.
    pub fn insert(&mut self, bone: Bone) -> Result<(), RigError> {
        if let Some(p) = &bone.parent {
            if !self.contains(p) { return Err(RigError::NotFound(p.clone())); }
        }
        self.insert_unchecked_parent(bone)
    }

    fn insert_unchecked_parent(&mut self, bone: Bone) -> Result<(), RigError> {
        if self.contains(&bone.name) { return Err(RigError::DuplicateBone(bone.name)); }
        self.bones.push(bone);
        Ok(())
    }

    /// Direct children in graph order.
    pub fn children(&self, name: &str) -> Vec<&str> {
        self.bones
            .iter()
            .filter(|b| b.parent.as_deref() == Some(name))
            .map(|b| b.name.as_str())
            .collect()
    }

    /// Parent chain from the nearest parent up to the root.
    pub fn ancestors(&self, name: &str) -> Result<Vec<String>, RigError> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(name.to_string());
        let mut cur = self.get(name).ok_or_else(|| RigError::NotFound(name.to_string()))?;
        while let Some(p) = cur.parent.as_deref() {
            if !seen.insert(p.to_string()) {
                return Err(RigError::CycleDetected { child: cur.name.clone(), parent: p.to_string() });
            }
            out.push(p.to_string());
            cur = self.get(p).ok_or_else(|| RigError::NotFound(p.to_string()))?;
        }
        Ok(out)
    }

    /// Every bone below `name`, breadth first.
    pub fn descendants(&self, name: &str) -> Result<Vec<String>, RigError> {
        if !self.contains(name) { return Err(RigError::NotFound(name.to_string())); }
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(name.to_string());
        let mut queue = std::collections::VecDeque::from([name.to_string()]);
        while let Some(cur) = queue.pop_front() {
            for child in self.children(&cur) {
                if !visited.insert(child.to_string()) {
                    return Err(RigError::CycleDetected { child: child.to_string(), parent: cur });
                }
                out.push(child.to_string());
                queue.push_back(child.to_string());
            }
        }
        Ok(out)
    }

    /// Number of parents above `name`.
    pub fn depth(&self, name: &str) -> Result<usize, RigError> {
        self.ancestors(name).map(|a| a.len())
    }

    pub fn check_acyclic(&self) -> Result<(), RigError> {
        for bone in &self.bones { self.ancestors(&bone.name)?; }
        Ok(())
    }

    /// Renames `old` in place. Children and every weight column follow; a
    /// leftover column already named `new` is combined with `mode`.
    pub fn rename(&mut self, old: &str, new: &str, weights: &mut WeightTable, mode: MixMode) -> Result<(), RigError> {
        let idx = self.index_of(old).ok_or_else(|| RigError::NotFound(old.to_string()))?;
        if old == new { return Ok(()); }
        if self.contains(new) { return Err(RigError::DuplicateBone(new.to_string())); }
        self.bones[idx].name = new.to_string();
        for bone in &mut self.bones {
            if bone.parent.as_deref() == Some(old) { bone.parent = Some(new.to_string()); }
        }
        weights.rename_column(old, new, mode);
        debug!(old, new, "renamed bone");
        Ok(())
    }

    /// Applies many renames at once, so swaps and chains (`A->B`, `B->A`) never
    /// collide halfway. Names missing from `renames` stay as they are; the
    /// resulting names must be unique.
    pub fn rename_many(&mut self, renames: &HashMap<String, String>, weights: &mut WeightTable) -> Result<(), RigError> {
        let target = |n: &str| renames.get(n).map(String::as_str).unwrap_or(n).to_string();
        let mut seen = HashSet::new();
        for bone in &self.bones {
            let new = target(&bone.name);
            if !seen.insert(new.clone()) { return Err(RigError::DuplicateBone(new)); }
        }
        for bone in &mut self.bones {
            bone.name = target(&bone.name);
            if let Some(p) = bone.parent.as_mut() { *p = target(p); }
        }
        let live: HashMap<String, String> = renames
            .iter()
            .filter(|(old, new)| old != new)
            .map(|(o, n)| (o.clone(), n.clone()))
            .collect();
        weights.rename_columns(&live, MixMode::Add);
        debug!(count = live.len(), "renamed bones");
        Ok(())
    }

    /// Points `child` at `new_parent`. Refuses edits that would close a loop.
    pub fn reparent(&mut self, child: &str, new_parent: &str) -> Result<(), RigError> {
        let idx = self.index_of(child).ok_or_else(|| RigError::NotFound(child.to_string()))?;
        if !self.contains(new_parent) { return Err(RigError::NotFound(new_parent.to_string())); }
        if child == new_parent || self.ancestors(new_parent)?.iter().any(|a| a == child) {
            return Err(RigError::CycleDetected { child: child.to_string(), parent: new_parent.to_string() });
        }
        self.bones[idx].parent = Some(new_parent.to_string());
        debug!(child, parent = new_parent, "reparented bone");
        Ok(())
    }

    pub fn clear_parent(&mut self, name: &str) -> Result<(), RigError> {
        let idx = self.index_of(name).ok_or_else(|| RigError::NotFound(name.to_string()))?;
        self.bones[idx].parent = None;
        Ok(())
    }

    /// Removes `name`. With `reattach_children_to`, its children move there;
    /// without it they become roots. Weight columns are left alone.
    pub fn remove(&mut self, name: &str, reattach_children_to: Option<&str>) -> Result<Bone, RigError> {
        let idx = self.index_of(name).ok_or_else(|| RigError::NotFound(name.to_string()))?;
        if let Some(target) = reattach_children_to {
            if !self.contains(target) { return Err(RigError::NotFound(target.to_string())); }
            // The current parent can never sit below the bone itself.
            let own_parent = self.bones[idx].parent.as_deref() == Some(target);
            if target == name || (!own_parent && self.descendants(name)?.iter().any(|d| d == target)) {
                return Err(RigError::CycleDetected { child: name.to_string(), parent: target.to_string() });
            }
        }
        let removed = self.bones.remove(idx);
        let new_parent = reattach_children_to.map(str::to_string);
        for bone in &mut self.bones {
            if bone.parent.as_deref() == Some(name) { bone.parent = new_parent.clone(); }
        }
        debug!(name, reattach = ?reattach_children_to, "removed bone");
        Ok(removed)
    }

    /// Adds the bone's weights onto its parent, hands its children to the
    /// parent and removes it.
    pub fn collapse_into_parent(&mut self, name: &str, weights: &mut WeightTable) -> Result<(), RigError> {
        let parent = self
            .get(name)
            .ok_or_else(|| RigError::NotFound(name.to_string()))?
            .parent
            .clone()
            .ok_or_else(|| RigError::NoParent(name.to_string()))?;
        weights.merge_bone(name, &parent, MixMode::Add);
        self.remove(name, Some(&parent))?;
        Ok(())
    }

    /// Bones whose name starts with any of `prefixes`, in graph order.
    pub fn find_by_name_prefix<S: AsRef<str>>(&self, prefixes: &[S]) -> Vec<&Bone> {
        self.bones
            .iter()
            .filter(|b| prefixes.iter().any(|p| b.name.starts_with(p.as_ref())))
            .collect()
    }

    pub fn set_head(&mut self, name: &str, head: Vec3) -> Result<(), RigError> {
        let idx = self.index_of(name).ok_or_else(|| RigError::NotFound(name.to_string()))?;
        self.bones[idx].head = head;
        Ok(())
    }

    pub fn set_tail(&mut self, name: &str, tail: Vec3) -> Result<(), RigError> {
        let idx = self.index_of(name).ok_or_else(|| RigError::NotFound(name.to_string()))?;
        self.bones[idx].tail = tail;
        Ok(())
    }

    /// Drops every pose constraint. Returns (bones touched, constraints removed).
    pub fn strip_constraints(&mut self) -> (usize, usize) {
        let mut bones = 0;
        let mut removed = 0;
        for bone in &mut self.bones {
            if bone.constraints.is_empty() { continue; }
            bones += 1;
            removed += bone.constraints.len();
            bone.constraints.clear();
        }
        (bones, removed)
    }

    /// Angle in degrees between the head-to-tail vectors of `a` and `b`.
    /// Zero-length bones yield 0.
    pub fn bone_angle(&self, a: &str, b: &str) -> Result<f32, RigError> {
        let va = self.get(a).ok_or_else(|| RigError::NotFound(a.to_string()))?.vector();
        let vb = self.get(b).ok_or_else(|| RigError::NotFound(b.to_string()))?.vector();
        if va.length_squared() == 0.0 || vb.length_squared() == 0.0 { return Ok(0.0); }
        Ok(va.angle_between(vb).to_degrees())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }
}

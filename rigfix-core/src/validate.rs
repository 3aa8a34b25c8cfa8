//! Required-chain check that gates the end of a normalization run.

use tracing::debug;

use crate::error::ValidationError;
use crate::rig::BoneGraph;

/// Checks that each chain exists and is directly parent-linked, root first.
/// The chain root is made unparented if it is not already. Stops at the first
/// violation.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyValidator<'a> {
    chains: &'a [Vec<String>],
}

impl<'a> HierarchyValidator<'a> {
    pub fn new(chains: &'a [Vec<String>]) -> Self { Self { chains } }

    pub fn validate(&self, graph: &mut BoneGraph) -> Result<(), ValidationError> {
        for chain in self.chains {
            check_chain(graph, chain)?;
        }
        Ok(())
    }
}

fn check_chain(graph: &mut BoneGraph, chain: &[String]) -> Result<(), ValidationError> {
    if let Some(missing) = chain.iter().find(|n| !graph.contains(n)) {
        return Err(ValidationError::UnknownBone(missing.clone()));
    }
    let Some((root, rest)) = chain.split_first() else { return Ok(()); };
    if graph.parent_of(root).is_some() {
        debug!(bone = %root, "clearing parent of chain root");
        graph
            .clear_parent(root)
            .map_err(|_| ValidationError::UnknownBone(root.clone()))?;
    }
    let mut expected = root;
    for bone in rest {
        let actual = graph.parent_of(bone);
        if actual != Some(expected.as_str()) {
            return Err(ValidationError::WrongParent {
                bone: bone.clone(),
                expected: expected.clone(),
                actual: actual.map(str::to_string),
            });
        }
        expected = bone;
    }
    Ok(())
}

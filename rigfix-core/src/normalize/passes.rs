//! The individual normalization passes. Each one takes the graph and weights
//! explicitly and returns what it did; ordering lives in the pipeline.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{NormalizeError, RigError};
use crate::rig::{BoneGraph, MixMode, WeightTable};
use crate::rules::{RuleSet, RuleTable};
use crate::translate::Translator;

/// Host-style deduplication: `Name`, `Name.001`, `Name.002`, ...
pub fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) { return base.to_string(); }
    (1..)
        .map(|i| format!("{base}.{i:03}"))
        .find(|n| !taken.contains(n))
        .unwrap_or_else(|| base.to_string())
}

/// Runs every bone name through `translator`. All lookups happen before the
/// first rename, so a failing dictionary leaves the graph untouched.
///
/// Names are settled one bone at a time against every name still in use, so
/// on a clash the bone being renamed takes the suffix and a bone whose name
/// does not change keeps it.
pub fn translate_names<T: Translator + ?Sized>(
    graph: &mut BoneGraph,
    weights: &mut WeightTable,
    translator: &T,
) -> Result<usize, NormalizeError> {
    let names = graph.names();
    let translated = names.iter().map(|n| translator.translate(n)).collect::<Result<Vec<_>, _>>()?;

    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut renames = HashMap::new();
    for (old, new) in names.iter().zip(translated) {
        taken.remove(old);
        let new = unique_name(&new, &taken);
        taken.insert(new.clone());
        if *old != new { renames.insert(old.clone(), new); }
    }
    let count = renames.len();
    graph
        .rename_many(&renames, weights)
        .map_err(|source| NormalizeError::Rig { pass: "translate", source })?;
    Ok(count)
}

/// Applies `(child, parent)` rules where both bones exist. Rules that would
/// close a loop are refused and listed in `warnings`.
pub fn reparent(graph: &mut BoneGraph, rules: &RuleTable, warnings: &mut Vec<String>) -> Result<usize, RigError> {
    let mut applied = 0;
    for (child, parent) in rules {
        if !graph.contains(child) || !graph.contains(parent) { continue; }
        match graph.reparent(child, parent) {
            Ok(()) => applied += 1,
            Err(e @ RigError::CycleDetected { .. }) => {
                warn!(%child, %parent, "refused reparent rule");
                warnings.push(e.to_string());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(applied)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenameCounts {
    pub renamed: usize,
    pub merged: usize,
}

/// Renames bones to canonical names. When the canonical bone already exists
/// the source is folded into it: weights merged with `mode`, children handed
/// over, source removed.
pub fn canonical_rename(
    graph: &mut BoneGraph,
    weights: &mut WeightTable,
    rules: &RuleTable,
    mode: MixMode,
) -> Result<RenameCounts, RigError> {
    let mut counts = RenameCounts::default();
    for (source, canonical) in rules {
        if source == canonical || !graph.contains(source) { continue; }
        if !graph.contains(canonical) {
            graph.rename(source, canonical, weights, mode)?;
            counts.renamed += 1;
            continue;
        }
        fold_into(graph, weights, source, canonical, mode)?;
        counts.merged += 1;
    }
    Ok(counts)
}

fn fold_into(
    graph: &mut BoneGraph,
    weights: &mut WeightTable,
    source: &str,
    canonical: &str,
    mode: MixMode,
) -> Result<(), RigError> {
    weights.merge_bone(source, canonical, mode);
    // A canonical bone living under the source takes the source's place first.
    if graph.descendants(source)?.iter().any(|d| d == canonical) {
        match graph.parent_of(source).map(str::to_string) {
            Some(p) => graph.reparent(canonical, &p)?,
            None => graph.clear_parent(canonical)?,
        }
    }
    graph.remove(source, Some(canonical))?;
    debug!(source, canonical, "folded duplicate bone");
    Ok(())
}

/// Removes discarded bones. Their children become roots and their weight
/// columns stay for the weight-merge pass.
pub fn prune(graph: &mut BoneGraph, rules: &RuleSet) -> Result<Vec<String>, RigError> {
    let doomed: Vec<String> = graph.names().into_iter().filter(|n| rules.is_discarded(n)).collect();
    for name in &doomed {
        graph.remove(name, None)?;
    }
    Ok(doomed)
}

/// Merges `(source, canonical)` columns where both exist.
pub fn merge_weights(weights: &mut WeightTable, rules: &RuleTable, mode: MixMode) -> usize {
    let mut merged = 0;
    for (source, canonical) in rules {
        if source == canonical || !weights.has_column(source) || !weights.has_column(canonical) { continue; }
        weights.merge_bone(source, canonical, mode);
        merged += 1;
    }
    merged
}

/// Removes bones with no weight anywhere. The doomed set is fixed before any
/// removal; each doomed bone hands its children to its parent, so survivors
/// end up under their nearest surviving ancestor.
pub fn prune_zero_weight(graph: &mut BoneGraph, weights: &mut WeightTable) -> Result<Vec<String>, RigError> {
    let doomed: Vec<String> = graph
        .names()
        .into_iter()
        .filter(|n| weights.total_weight(n) == 0.0)
        .collect();
    for name in &doomed {
        let parent = graph.parent_of(name).map(str::to_string);
        graph.remove(name, parent.as_deref())?;
        weights.remove_column(name);
    }
    Ok(doomed)
}

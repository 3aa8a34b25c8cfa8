//! Property tests for the structural passes over random bone forests.

use std::collections::HashSet;

use glam::Vec3;
use proptest::prelude::*;
use proptest::sample::Index;
use rigfix_core::normalize::passes;
use rigfix_core::validate::HierarchyValidator;
use rigfix_core::{Bone, BoneGraph, MixMode, WeightTable};

// ============================================================================
// Strategies
// ============================================================================

/// Parent index per bone; a bone may only point at an earlier one, so the
/// result is always a forest.
fn forest_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    (2usize..12).prop_flat_map(|n| {
        (0..n)
            .map(|i| if i == 0 { Just(None::<usize>).boxed() } else { prop::option::of(0..i).boxed() })
            .collect::<Vec<_>>()
    })
}

/// A forest plus an optional positive weight per bone.
fn rig_strategy() -> impl Strategy<Value = (Vec<Option<usize>>, Vec<Option<f32>>)> {
    forest_strategy().prop_flat_map(|parents| {
        let n = parents.len();
        (Just(parents), prop::collection::vec(prop::option::of(0.05f32..=1.0), n))
    })
}

fn name(i: usize) -> String { format!("B{i}") }

/// Bone `i` weighs vertex `i` fully and the shared last vertex by half.
fn build(parents: &[Option<usize>], weights: &[Option<f32>]) -> (BoneGraph, WeightTable) {
    let bones = parents
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let b = Bone::new(name(i), Vec3::ZERO, Vec3::Z);
            match p { Some(p) => b.with_parent(name(*p)), None => b }
        })
        .collect();
    let n = parents.len();
    let mut w = WeightTable::new();
    w.add_mesh("Body", n + 1);
    for (i, x) in weights.iter().enumerate() {
        if let Some(x) = x {
            w.set_weight("Body", i, &name(i), *x).unwrap();
            w.set_weight("Body", n, &name(i), x * 0.5).unwrap();
        }
    }
    (BoneGraph::from_bones(bones).unwrap(), w)
}

fn still_valid(g: &BoneGraph) -> bool {
    BoneGraph::from_bones(g.clone().into_bones()).is_ok()
}

// ============================================================================
// Rename / reparent
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn rename_leaves_one_target_and_no_source(
        (parents, weights) in rig_strategy(),
        src in any::<Index>(),
        dst in any::<Index>(),
        fresh in any::<bool>(),
    ) {
        let (mut g, mut w) = build(&parents, &weights);
        let n = parents.len();
        let source = name(src.index(n));
        let target = if fresh { "Canonical".to_string() } else { name(dst.index(n)) };
        prop_assume!(source != target);

        let before: Vec<(f32, f32)> = (0..=n)
            .map(|v| (w.weight("Body", v, &source), w.weight("Body", v, &target)))
            .collect();
        let rules = vec![(source.clone(), target.clone())];
        passes::canonical_rename(&mut g, &mut w, &rules, MixMode::Add).unwrap();

        prop_assert!(!g.contains(&source));
        prop_assert_eq!(g.names().iter().filter(|b| **b == target).count(), 1);
        prop_assert!(!w.has_column(&source));
        for (v, (s, t)) in before.into_iter().enumerate() {
            let expected = (s + t).min(1.0);
            prop_assert!((w.weight("Body", v, &target) - expected).abs() < 1e-5);
        }
        prop_assert!(still_valid(&g));
    }

    #[test]
    fn reparent_rule_holds_unless_it_would_loop(
        parents in forest_strategy(),
        c in any::<Index>(),
        p in any::<Index>(),
    ) {
        let (mut g, _) = build(&parents, &[]);
        let n = parents.len();
        let (child, parent) = (name(c.index(n)), name(p.index(n)));
        prop_assume!(child != parent);
        let loops = g.descendants(&child).unwrap().contains(&parent);
        let old_parent = g.parent_of(&child).map(str::to_string);

        let mut warnings = Vec::new();
        let applied = passes::reparent(&mut g, &vec![(child.clone(), parent.clone())], &mut warnings).unwrap();

        if loops {
            prop_assert_eq!(applied, 0);
            prop_assert_eq!(warnings.len(), 1);
            prop_assert_eq!(g.parent_of(&child).map(str::to_string), old_parent);
        } else {
            prop_assert_eq!(applied, 1);
            prop_assert_eq!(g.parent_of(&child), Some(parent.as_str()));
        }
        prop_assert!(g.check_acyclic().is_ok());
    }
}

// ============================================================================
// Weights
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn add_merge_only_loses_weight_at_the_clamp(
        a in prop::collection::vec(0.0f32..=1.0, 6),
        b in prop::collection::vec(0.0f32..=1.0, 6),
    ) {
        let mut w = WeightTable::new();
        w.add_mesh("Body", 6);
        for v in 0..6 {
            w.set_weight("Body", v, "Source", a[v]).unwrap();
            w.set_weight("Body", v, "Target", b[v]).unwrap();
        }
        let sums: Vec<f32> = (0..6).map(|v| w.vertex_sum("Body", v)).collect();
        w.merge_bone("Source", "Target", MixMode::Add);
        for v in 0..6 {
            let overflow = (a[v] + b[v] - 1.0).max(0.0);
            prop_assert!((w.vertex_sum("Body", v) - (sums[v] - overflow)).abs() < 1e-5);
        }
    }

    #[test]
    fn zero_weight_prune_keeps_weighted_bones_and_is_idempotent((parents, weights) in rig_strategy()) {
        let (mut g, mut w) = build(&parents, &weights);
        let original = g.clone();
        let removed = passes::prune_zero_weight(&mut g, &mut w).unwrap();

        let survivors: HashSet<String> = g.names().into_iter().collect();
        for (i, x) in weights.iter().enumerate() {
            prop_assert_eq!(survivors.contains(&name(i)), x.is_some());
        }
        prop_assert_eq!(removed.len() + survivors.len(), parents.len());
        // Each survivor hangs off its nearest surviving ancestor.
        for bone in &survivors {
            let nearest = original.ancestors(bone).unwrap().into_iter().find(|a| survivors.contains(a));
            prop_assert_eq!(g.parent_of(bone).map(str::to_string), nearest);
        }
        prop_assert!(passes::prune_zero_weight(&mut g, &mut w).unwrap().is_empty());
    }
}

// ============================================================================
// Validation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn removing_a_chain_bone_names_it(parents in forest_strategy(), leaf in any::<Index>(), pick in any::<Index>()) {
        let (mut g, _) = build(&parents, &[]);
        let leaf = name(leaf.index(parents.len()));
        let mut chain = g.ancestors(&leaf).unwrap();
        chain.reverse();
        chain.push(leaf);
        let chains = vec![chain.clone()];
        let validator = HierarchyValidator::new(&chains);
        prop_assert!(validator.validate(&mut g).is_ok());

        let gone = chain[pick.index(chain.len())].clone();
        g.remove(&gone, None).unwrap();
        let err = validator.validate(&mut g).unwrap_err();
        prop_assert_eq!(err.bone(), gone.as_str());
    }
}

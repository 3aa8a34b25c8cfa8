//! Rule tables: loading, validation and the built-in humanoid set.

pub mod humanoid;
pub mod schema;

pub use schema::{Posture, RuleSet, RuleTable};

use crate::error::RulesError;

pub fn load_from_yaml_str(s: &str) -> Result<RuleSet, RulesError> {
    let rules: RuleSet = serde_yaml::from_str(s)?;
    check(&rules)?;
    Ok(rules)
}

pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<RuleSet, RulesError> {
    let data = std::fs::read_to_string(path)?;
    load_from_yaml_str(&data)
}

pub fn to_yaml_string(rules: &RuleSet) -> Result<String, RulesError> {
    Ok(serde_yaml::to_string(rules)?)
}

fn check(rules: &RuleSet) -> Result<(), RulesError> {
    match rules.required_chains.iter().position(|c| c.is_empty()) {
        Some(i) => Err(RulesError::EmptyChain(i)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::MixMode;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let rules = load_from_yaml_str("discard_prefix: [\"Helper_\"]\nweight_merge_mode: replace\n").unwrap();
        assert_eq!(rules.discard_prefix, vec!["Helper_"]);
        assert_eq!(rules.weight_merge_mode, MixMode::Replace);
        assert_eq!(rules.rename, RuleSet::default().rename);
        assert_eq!(rules.posture.root, "Hips");
    }

    #[test]
    fn pairs_are_yaml_sequences() {
        let rules = load_from_yaml_str("reparent:\n  - [Head, Neck]\n  - [Neck, Chest]\n").unwrap();
        assert_eq!(rules.reparent, vec![("Head".to_string(), "Neck".to_string()), ("Neck".to_string(), "Chest".to_string())]);
    }

    #[test]
    fn empty_chain_is_rejected() {
        let err = load_from_yaml_str("required_chains:\n  - [Hips, Spine]\n  - []\n").unwrap_err();
        assert!(matches!(err, RulesError::EmptyChain(1)));
    }

    #[test]
    fn defaults_survive_yaml() {
        let yaml = to_yaml_string(&RuleSet::default()).unwrap();
        assert_eq!(load_from_yaml_str(&yaml).unwrap(), RuleSet::default());
    }

    #[test]
    fn discard_matches_exact_and_prefix() {
        let rules = RuleSet::default();
        assert!(rules.is_discarded("Groove"));
        assert!(rules.is_discarded("Dummy_Foo"));
        assert!(rules.is_discarded("ArmTwist1_L"));
        assert!(!rules.is_discarded("Left arm"));
    }
}

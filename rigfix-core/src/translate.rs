//! Bone-name translation. The pipeline only sees the `Translator` trait; the
//! dictionary implementation here covers the common exact + partial lookup.

use serde::Deserialize;

use crate::error::TranslateError;

pub trait Translator {
    fn translate(&self, name: &str) -> Result<String, TranslateError>;
}

/// Leaves every name as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, name: &str) -> Result<String, TranslateError> { Ok(name.to_string()) }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DictionaryFile {
    entries: Vec<(String, String)>,
    partial: bool,
}

/// Exact-match dictionary. With `partial`, names that miss the exact table get
/// every known source fragment replaced, longest fragment first.
#[derive(Debug, Clone, Default)]
pub struct DictionaryTranslator {
    entries: Vec<(String, String)>,
    partial: bool,
}

impl DictionaryTranslator {
    pub fn new(entries: Vec<(String, String)>, partial: bool) -> Self {
        let mut entries = entries;
        // Stable sort keeps file order among equal lengths.
        entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self { entries, partial }
    }

    /// Parses a dictionary document. Any failure makes the dictionary unavailable.
    pub fn from_yaml_str(s: &str) -> Result<Self, TranslateError> {
        let file: DictionaryFile = serde_yaml::from_str(s)
            .map_err(|e| TranslateError::TranslationUnavailable(e.to_string()))?;
        Ok(Self::new(file.entries, file.partial))
    }

    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, TranslateError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| TranslateError::TranslationUnavailable(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&data)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl Translator for DictionaryTranslator {
    fn translate(&self, name: &str) -> Result<String, TranslateError> {
        if let Some((_, to)) = self.entries.iter().find(|(from, _)| from == name) {
            return Ok(to.clone());
        }
        if !self.partial { return Ok(name.to_string()); }
        let mut out = name.to_string();
        for (from, to) in &self.entries {
            if !from.is_empty() && out.contains(from.as_str()) { out = out.replace(from.as_str(), to); }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DICT: &str = "partial: true\nentries:\n  - [\"下半身\", LowerBody]\n  - [\"左\", \"_L\"]\n  - [\"足\", Leg]\n  - [\"左足\", Leg_L]\n";

    #[test]
    fn exact_match_wins() {
        let t = DictionaryTranslator::from_yaml_str(DICT).unwrap();
        assert_eq!(t.translate("下半身").unwrap(), "LowerBody");
        assert_eq!(t.translate("左足").unwrap(), "Leg_L");
    }

    #[test]
    fn partial_replaces_longest_first() {
        let t = DictionaryTranslator::from_yaml_str(DICT).unwrap();
        assert_eq!(t.translate("左足D").unwrap(), "Leg_LD");
        assert_eq!(t.translate("unknown").unwrap(), "unknown");
    }

    #[test]
    fn exact_only_leaves_misses() {
        let t = DictionaryTranslator::new(vec![("a".into(), "b".into())], false);
        assert_eq!(t.translate("ab").unwrap(), "ab");
    }

    #[test]
    fn broken_dictionary_is_unavailable() {
        let err = DictionaryTranslator::from_yaml_str("entries: {oops").unwrap_err();
        assert!(matches!(err, TranslateError::TranslationUnavailable(_)));
        let err = DictionaryTranslator::from_path("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, TranslateError::TranslationUnavailable(_)));
    }
}

//! Normalization pipeline: runs the passes in their fixed order, then the
//! hierarchy check, and reports the outcome.
//!
//! Pass order
//! 1. translate names
//! 2. reparent per rule table
//! 3. canonical rename (merging into existing canonical bones)
//! 4. prune discarded bones
//! 5. weight-merge table
//! 6. zero-weight prune (optional)
//! 7. constraint strip (optional)
//! 8. hip/leg posture correction
//!
//! A translator failure aborts the run before any edit. Validation failures do
//! not: the rig keeps every edit and the outcome is `FinishedWithWarning`.

pub mod passes;
pub mod posture;

use tracing::{info, info_span, warn};

use crate::error::{NormalizeError, RigError, ValidationError};
use crate::report::{Reporter, Severity};
use crate::rig::{BoneGraph, WeightTable};
use crate::rules::RuleSet;
use crate::translate::Translator;
use crate::validate::HierarchyValidator;

pub use posture::PostureFix;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub remove_zero_weight: bool,
    pub remove_constraints: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStatus {
    Finished,
    /// Every pass ran but the hierarchy check failed.
    FinishedWithWarning,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeSummary {
    pub translated: usize,
    pub reparented: usize,
    pub renamed: usize,
    pub merged: usize,
    pub pruned: Vec<String>,
    pub weight_merged: usize,
    pub zero_weight_pruned: Vec<String>,
    pub constraint_bones: usize,
    pub constraints_removed: usize,
    pub posture: Option<PostureFix>,
    /// Weight columns left without a bone once all passes ran.
    pub orphan_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub status: NormalizeStatus,
    pub summary: NormalizeSummary,
    pub validation: Option<ValidationError>,
    /// Non-fatal findings: refused reparent rules, degenerate hips.
    pub warnings: Vec<String>,
}

impl NormalizeOutcome {
    pub fn is_clean(&self) -> bool { self.status == NormalizeStatus::Finished }
}

pub struct NormalizationPipeline {
    rules: RuleSet,
    options: PipelineOptions,
}

fn in_pass(pass: &'static str) -> impl Fn(RigError) -> NormalizeError {
    move |source| NormalizeError::Rig { pass, source }
}

fn report_failure<R: Reporter + ?Sized>(reporter: &mut R, err: &NormalizeError) {
    let msg = match err {
        NormalizeError::Translate(e) => format!("Failed to load dictionary: {e}"),
        NormalizeError::Rig { .. } => err.to_string(),
    };
    reporter.report(Severity::Error, &msg);
}

impl NormalizationPipeline {
    pub fn new(rules: RuleSet, options: PipelineOptions) -> Self { Self { rules, options } }

    pub fn rules(&self) -> &RuleSet { &self.rules }
    pub fn options(&self) -> PipelineOptions { self.options }

    /// Runs every pass over `graph` and `weights` in place. A failing pass is
    /// reported at `Severity::Error` before the error is returned.
    pub fn run<T, R>(
        &self,
        graph: &mut BoneGraph,
        weights: &mut WeightTable,
        translator: &T,
        reporter: &mut R,
    ) -> Result<NormalizeOutcome, NormalizeError>
    where
        T: Translator + ?Sized,
        R: Reporter + ?Sized,
    {
        let _span = info_span!("normalize", bones = graph.len()).entered();
        let result = self.run_passes(graph, weights, translator, reporter);
        if let Err(e) = &result {
            report_failure(reporter, e);
        }
        result
    }

    fn run_passes<T, R>(
        &self,
        graph: &mut BoneGraph,
        weights: &mut WeightTable,
        translator: &T,
        reporter: &mut R,
    ) -> Result<NormalizeOutcome, NormalizeError>
    where
        T: Translator + ?Sized,
        R: Reporter + ?Sized,
    {
        let rules = &self.rules;
        let mut summary = NormalizeSummary::default();
        let mut warnings = Vec::new();

        summary.translated = passes::translate_names(graph, weights, translator)?;
        info!(translated = summary.translated, "translated bone names");

        summary.reparented = passes::reparent(graph, &rules.reparent, &mut warnings).map_err(in_pass("reparent"))?;

        let counts = passes::canonical_rename(graph, weights, &rules.rename, rules.rename_merge_mode)
            .map_err(in_pass("canonical rename"))?;
        summary.renamed = counts.renamed;
        summary.merged = counts.merged;

        summary.pruned = passes::prune(graph, rules).map_err(in_pass("prune"))?;
        summary.weight_merged = passes::merge_weights(weights, &rules.weight_merge, rules.weight_merge_mode);
        info!(
            reparented = summary.reparented,
            renamed = summary.renamed,
            merged = summary.merged,
            pruned = summary.pruned.len(),
            weight_merged = summary.weight_merged,
            "structural passes done"
        );

        if self.options.remove_zero_weight {
            summary.zero_weight_pruned = passes::prune_zero_weight(graph, weights).map_err(in_pass("zero-weight prune"))?;
            info!(removed = summary.zero_weight_pruned.len(), "removed zero-weight bones");
        }

        if self.options.remove_constraints {
            let (bones, removed) = graph.strip_constraints();
            summary.constraint_bones = bones;
            summary.constraints_removed = removed;
            if removed > 0 {
                reporter.report(Severity::Info, &format!("Removed {removed} constraints from {bones} bones."));
            }
        }

        summary.posture = posture::align_hips(graph, &rules.posture).map_err(in_pass("posture"))?;
        if let Some(fix) = summary.posture.filter(|f| f.degenerate) {
            let msg = format!(
                "{:.2} degrees between {} and the legs; the avatar SDK rejects hip bones this close to the leg direction",
                fix.worst_angle(),
                rules.posture.root
            );
            warn!("{msg}");
            warnings.push(msg);
        }

        summary.orphan_columns = weights.orphan_columns(graph);
        if !summary.orphan_columns.is_empty() {
            info!(columns = ?summary.orphan_columns, "weight columns without a bone");
        }
        for w in &warnings { reporter.report(Severity::Warning, w); }

        let validation = HierarchyValidator::new(&rules.required_chains).validate(graph).err();
        let status = match &validation {
            Some(e) => {
                reporter.report(Severity::Warning, &e.to_string());
                NormalizeStatus::FinishedWithWarning
            }
            None => {
                reporter.report(Severity::Info, "Armature fixed.");
                NormalizeStatus::Finished
            }
        };
        Ok(NormalizeOutcome { status, summary, validation, warnings })
    }

    /// Like `run`, but restores the original graph and weights if any pass
    /// fails.
    pub fn run_atomic<T, R>(
        &self,
        graph: &mut BoneGraph,
        weights: &mut WeightTable,
        translator: &T,
        reporter: &mut R,
    ) -> Result<NormalizeOutcome, NormalizeError>
    where
        T: Translator + ?Sized,
        R: Reporter + ?Sized,
    {
        let saved = (graph.clone(), weights.clone());
        let result = self.run(graph, weights, translator, reporter);
        if result.is_err() {
            (*graph, *weights) = saved;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslateError;
    use crate::report::CollectingReporter;
    use crate::rig::Bone;
    use crate::translate::IdentityTranslator;
    use glam::Vec3;

    fn small_rig() -> (BoneGraph, WeightTable) {
        let bones = vec![
            Bone::new("Hips", Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.2)),
            Bone::new("Spine", Vec3::new(0.0, 0.0, 1.2), Vec3::new(0.0, 0.0, 1.4))
                .with_parent("Hips")
                .with_constraint("Damped Track", "DAMPED_TRACK"),
            Bone::new("Helper", Vec3::ZERO, Vec3::Z).with_parent("Spine"),
        ];
        let mut w = WeightTable::new();
        w.add_mesh("Body", 2);
        w.set_weight("Body", 0, "Hips", 1.0).unwrap();
        w.set_weight("Body", 1, "Spine", 1.0).unwrap();
        (BoneGraph::from_bones(bones).unwrap(), w)
    }

    fn rules() -> RuleSet {
        let mut r = RuleSet::empty();
        r.required_chains = vec![vec!["Hips".into(), "Spine".into()]];
        r
    }

    #[test]
    fn clean_run_reports_info() {
        let (mut g, mut w) = small_rig();
        let opts = PipelineOptions { remove_zero_weight: true, remove_constraints: true };
        let mut rep = CollectingReporter::new();
        let out = NormalizationPipeline::new(rules(), opts).run(&mut g, &mut w, &IdentityTranslator, &mut rep).unwrap();
        assert!(out.is_clean());
        assert_eq!(out.summary.zero_weight_pruned, vec!["Helper"]);
        assert_eq!(out.summary.constraints_removed, 1);
        assert_eq!(rep.entries.last().unwrap(), &(Severity::Info, "Armature fixed.".to_string()));
    }

    #[test]
    fn validation_failure_is_a_warning_not_an_error() {
        let (mut g, mut w) = small_rig();
        let mut r = rules();
        r.required_chains.push(vec!["Hips".into(), "Neck".into()]);
        let mut rep = CollectingReporter::new();
        let out = NormalizationPipeline::new(r, PipelineOptions::default()).run(&mut g, &mut w, &IdentityTranslator, &mut rep).unwrap();
        assert_eq!(out.status, NormalizeStatus::FinishedWithWarning);
        assert_eq!(out.validation, Some(ValidationError::UnknownBone("Neck".into())));
        assert_eq!(rep.worst(), Some(Severity::Warning));
        assert!(g.contains("Helper"));
    }

    struct Broken;
    impl Translator for Broken {
        fn translate(&self, _: &str) -> Result<String, TranslateError> {
            Err(TranslateError::TranslationUnavailable("missing".into()))
        }
    }

    #[test]
    fn translator_failure_aborts_before_edits() {
        let (mut g, mut w) = small_rig();
        let (g0, w0) = (g.clone(), w.clone());
        let mut rep = CollectingReporter::new();
        let err = NormalizationPipeline::new(rules(), PipelineOptions::default())
            .run_atomic(&mut g, &mut w, &Broken, &mut rep)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::Translate(_)));
        assert_eq!((g, w), (g0, w0));
        assert_eq!(rep.worst(), Some(Severity::Error));
    }

    #[test]
    fn failing_pass_is_reported_as_error() {
        let mut rep = CollectingReporter::new();
        let err = NormalizeError::Rig { pass: "prune", source: RigError::NotFound("Groove".into()) };
        report_failure(&mut rep, &err);
        assert_eq!(rep.entries, vec![(Severity::Error, "rig edit failed during prune: bone 'Groove' not found".to_string())]);

        let mut rep = CollectingReporter::new();
        report_failure(&mut rep, &NormalizeError::Translate(TranslateError::TranslationUnavailable("gone".into())));
        assert_eq!(rep.with_severity(Severity::Error).collect::<Vec<_>>(), vec!["Failed to load dictionary: translation dictionary unavailable: gone"]);
    }
}

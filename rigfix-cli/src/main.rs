use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rigfix_core::host::{JsonRigFile, RigAccessor, RigSnapshot};
use rigfix_core::report::CollectingReporter;
use rigfix_core::translate::{DictionaryTranslator, IdentityTranslator, Translator};
use rigfix_core::validate::HierarchyValidator;
use rigfix_core::{rules, BoneGraph, NormalizationPipeline, PipelineOptions, RuleSet, WeightTable, VERSION};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rigfix", version = VERSION, about = "Normalize humanoid armatures for avatar runtimes")]
struct Cli {
    /// Log every structural edit
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full normalization over a rig snapshot (JSON)
    Fix {
        rig: PathBuf,
        /// Output path; defaults to overwriting the input
        #[arg(long)]
        out: Option<PathBuf>,
        /// Rule tables (YAML); defaults to the built-in humanoid set
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Name translation dictionary (YAML)
        #[arg(long)]
        dictionary: Option<PathBuf>,
        #[arg(long)]
        remove_zero_weight: bool,
        #[arg(long)]
        remove_constraints: bool,
        /// Leave the rig untouched if any pass fails
        #[arg(long)]
        atomic: bool,
        #[arg(long, default_value = "Armature")]
        armature_name: String,
    },
    /// Only run the hierarchy check
    Check {
        rig: PathBuf,
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Print the built-in rule tables as YAML
    Rules,
    /// Print the bone tree with per-bone weight totals
    Inspect { rig: PathBuf },
}

fn load_rules(path: Option<&PathBuf>) -> Result<RuleSet> {
    match path {
        Some(p) => rules::load_from_path(p).with_context(|| format!("loading rules from {}", p.display())),
        None => Ok(RuleSet::default()),
    }
}

fn load_rig(path: &PathBuf) -> Result<(String, BoneGraph, WeightTable)> {
    let snapshot = JsonRigFile::new(path, None).load().with_context(|| format!("reading {}", path.display()))?;
    snapshot.into_parts().with_context(|| format!("invalid rig in {}", path.display()))
}

fn print_tree(graph: &BoneGraph, weights: &WeightTable) -> Result<()> {
    for bone in graph.iter() {
        let depth = graph.depth(&bone.name)?;
        println!("{}{} (weight {:.3})", "  ".repeat(depth), bone.name, weights.total_weight(&bone.name));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    match cli.cmd {
        Command::Fix { rig, out, rules, dictionary, remove_zero_weight, remove_constraints, atomic, armature_name } => {
            let rules = load_rules(rules.as_ref())?;
            let mut file = JsonRigFile::new(&rig, out);
            let snapshot = file.load().with_context(|| format!("reading {}", rig.display()))?;
            let (_, mut graph, mut weights) = snapshot.into_parts().context("invalid rig snapshot")?;

            let translator: Box<dyn Translator> = match &dictionary {
                Some(p) => Box::new(DictionaryTranslator::from_path(p)?),
                None => Box::new(IdentityTranslator),
            };
            let pipeline = NormalizationPipeline::new(rules, PipelineOptions { remove_zero_weight, remove_constraints });
            let mut reporter = CollectingReporter::forwarding();
            let outcome = if atomic {
                pipeline.run_atomic(&mut graph, &mut weights, translator.as_ref(), &mut reporter)?
            } else {
                pipeline.run(&mut graph, &mut weights, translator.as_ref(), &mut reporter)?
            };

            let s = &outcome.summary;
            println!("Translated {} bones, reparented {}, renamed {}, merged {}", s.translated, s.reparented, s.renamed, s.merged);
            println!("Pruned {} bones, merged {} weight groups", s.pruned.len(), s.weight_merged);
            if remove_zero_weight { println!("Removed {} zero-weight bones", s.zero_weight_pruned.len()); }
            if remove_constraints { println!("Removed {} constraints from {} bones", s.constraints_removed, s.constraint_bones); }
            if !s.orphan_columns.is_empty() { println!("Weight groups without a bone: {}", s.orphan_columns.join(", ")); }

            file.store(&RigSnapshot::from_parts(armature_name, graph, weights))?;
            println!("Wrote {} ({})", file.output.display(), if outcome.is_clean() { "ok" } else { "with warnings" });
        }
        Command::Check { rig, rules } => {
            let rules = load_rules(rules.as_ref())?;
            let (_, mut graph, _) = load_rig(&rig)?;
            match HierarchyValidator::new(&rules.required_chains).validate(&mut graph) {
                Ok(()) => println!("Hierarchy ok: {} chains", rules.required_chains.len()),
                Err(e) => anyhow::bail!("hierarchy check failed: {e}"),
            }
        }
        Command::Rules => {
            print!("{}", rules::to_yaml_string(&RuleSet::default())?);
        }
        Command::Inspect { rig } => {
            let (armature, graph, weights) = load_rig(&rig)?;
            println!("{}: {} bones, {} meshes", armature, graph.len(), weights.meshes().len());
            print_tree(&graph, &weights)?;
        }
    }
    Ok(())
}

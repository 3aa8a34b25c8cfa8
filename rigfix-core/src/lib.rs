pub mod error;
pub mod host;
pub mod normalize;
pub mod report;
pub mod rig;
pub mod rules;
pub mod translate;
pub mod validate;

pub use error::{NormalizeError, RigError, TranslateError, ValidationError};
pub use normalize::{NormalizationPipeline, NormalizeOutcome, NormalizeStatus, PipelineOptions};
pub use rig::{Bone, BoneGraph, MixMode, WeightTable};
pub use rules::RuleSet;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

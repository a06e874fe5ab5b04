pub mod engine;
pub mod error;
pub mod frontend;
pub mod ir;

pub use engine::record::CandidateRecord;
pub use engine::trace::{Dimension, EvaluationTrace, RuleTraceEntry, RuleTraceResult};
pub use engine::{Evaluation, evaluate, explain};
pub use error::{RuleError, ValidationError};
pub use frontend::RuleFrontend;
pub use ir::draft::{NormalizedRuleFields, RuleDraft, validate_draft};
pub use ir::rule::{IngestionRule, RecordType};
pub use ir::ruleset::RuleSet;

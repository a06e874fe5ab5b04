pub mod eval;
pub mod record;
pub mod trace;

pub use eval::{Evaluation, evaluate, explain};

pub mod error;
pub mod types;

pub use error::{Classify, ErrorClass};
pub use types::{ProviderId, RuleId, UserId};

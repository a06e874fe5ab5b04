pub mod draft;
pub mod rule;
pub mod ruleset;

pub mod connections;
pub mod evaluate;
pub mod providers;
pub mod rules;

//! Rule matching and the sequential filter engine.

pub mod engine;
pub mod matcher;
pub mod rule;

pub use engine::{restore_folder, FilterEngine, RuleOutcome, RunReport};
pub use matcher::AddressMatcher;
pub use rule::{FilterRule, RuleActions, Scope};

pub mod builder;
pub mod loader;
pub mod templates;

pub use builder::{LastDecisionPolicy, PromptComposer};
pub use loader::PromptLoader;

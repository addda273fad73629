pub mod context;
pub mod orchestrator;
pub mod runner;

pub use context::{build_contexts, GenerationContext};
pub use orchestrator::{GenerationOutcome, GroupMealOptions, Orchestrator};
pub use runner::{spawn_generation, GenerationDeps};

mod model;
pub mod tracker;

pub use model::{GenerationJob, JobStatus};
pub use tracker::{Checkpoint, JobTracker};

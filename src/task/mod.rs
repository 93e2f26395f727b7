//! Task graph and the built-in tasks.

mod clean;
mod graph;
mod registry;

use std::sync::Arc;

use crate::config::FerruleConfig;

pub use clean::clean_dir;
pub use graph::{RunReport, TaskError, TaskGraph, TaskOutcome};
pub use registry::registry;

/// Context handed to every built-in task.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub config: Arc<FerruleConfig>,
    /// Show progress lines while pipelines run.
    pub progress: bool,
}

impl TaskContext {
    pub fn new(config: Arc<FerruleConfig>) -> Self {
        Self {
            config,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

/// Run `target` of the built-in graph.
pub fn run(target: &str, ctx: &TaskContext) -> Result<RunReport, TaskError> {
    registry().run(target, ctx)
}

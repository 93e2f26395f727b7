//! One-shot commands: `compile`, `build`, `clean`, `run`.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::config::FerruleConfig;
use crate::log;
use crate::task::{self, RunReport, TaskContext};
use crate::utils::plural::plural_count;

/// Task run by `ferrule clean`.
pub fn clean_target(dist: bool) -> &'static str {
    if dist { "dist:clean" } else { "clean" }
}

/// Run `target` and its dependencies once, then report.
///
/// Per-file failures do not stop the run; they are counted in the report so
/// the caller can exit non-zero after all output has been produced.
pub fn run_task(config: Arc<FerruleConfig>, target: &str) -> Result<RunReport> {
    let started = Instant::now();
    let ctx = TaskContext::new(config).with_progress(true);
    let report = task::run(target, &ctx)?;

    let elapsed = started.elapsed();
    if report.is_ok() {
        log!(target; "done in {:.2?}", elapsed);
    } else {
        log!(
            "error";
            "{target}: {} failed ({:.2?})",
            plural_count(report.failures, "file"),
            elapsed
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_target() {
        assert_eq!(clean_target(false), "clean");
        assert_eq!(clean_target(true), "dist:clean");
    }

    #[test]
    fn test_run_task_counts_failures() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        let sass = config.source_dir(crate::core::AssetKind::Style);
        fs::create_dir_all(&sass).unwrap();
        fs::write(sass.join("ok.scss"), ".a { b: c; }").unwrap();
        fs::write(sass.join("broken.scss"), ".a { b: c; ").unwrap();

        let report = run_task(Arc::new(config), "styles").unwrap();
        assert_eq!(report.failures, 1);
        assert!(dir.path().join("temp/css/ok.css").is_file());
    }

    #[test]
    fn test_unknown_task() {
        let dir = TempDir::new().unwrap();
        assert!(run_task(Arc::new(test_config_at(dir.path())), "deploy").is_err());
    }
}

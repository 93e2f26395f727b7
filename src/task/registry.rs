//! The built-in tasks.
//!
//! | task          | depends on    | does                                      |
//! |---------------|---------------|-------------------------------------------|
//! | `clean`       |               | delete the staging tree                   |
//! | `html` …      |               | one development pipeline                  |
//! | `compile`     | `clean`       | all six development pipelines in parallel |
//! | `dist:clean`  |               | delete the dist tree                      |
//! | `dist:assets` | `dist:clean`  | all six production pipelines + manifests  |
//! | `dist:rev`    | `dist:assets` | rewrite references in dist html           |
//! | `build`       | `dist:rev`    | summary                                   |

use anyhow::Context;

use super::clean::clean_dir;
use super::{TaskContext, TaskGraph, TaskOutcome};
use crate::core::{AssetKind, Profile};
use crate::pipeline::{BuildContext, pipeline_for, run_all};
use crate::{debug, log, package};

pub fn registry() -> TaskGraph<TaskContext> {
    let mut graph = TaskGraph::new();

    graph.task("clean", &[], |ctx: &TaskContext| {
        let staging = ctx.config.staging_root();
        if clean_dir(&staging, &ctx.config.source_root())? {
            debug!("clean"; "removed {}", ctx.config.root_relative(&staging).display());
        }
        Ok(TaskOutcome::OK)
    });

    for kind in AssetKind::ALL {
        graph.task(kind.name(), &[], move |ctx: &TaskContext| {
            let report = pipeline_for(kind)
                .run(&BuildContext::new(&ctx.config, Profile::DEVELOPMENT))
                .with_context(|| format!("{kind} pipeline"))?;
            log!(kind.name(); "{} written, {} unchanged", report.written.len(), report.unchanged.len());
            Ok(TaskOutcome::with_failures(report.failures.len()))
        });
    }

    graph.task("compile", &["clean"], |ctx: &TaskContext| {
        let reports = run_all(&ctx.config, Profile::DEVELOPMENT, ctx.progress)?;
        let failures = reports.iter().map(|(_, r)| r.failures.len()).sum();
        Ok(TaskOutcome::with_failures(failures))
    });

    graph.task("dist:clean", &[], |ctx: &TaskContext| {
        package::clean_dist(&ctx.config)?;
        Ok(TaskOutcome::OK)
    });

    graph.task("dist:assets", &["dist:clean"], |ctx: &TaskContext| {
        let assets = package::build_assets(&ctx.config, ctx.progress)?;
        Ok(TaskOutcome::with_failures(assets.failures()))
    });

    graph.task("dist:rev", &["dist:assets"], |ctx: &TaskContext| {
        let rewritten = package::rewrite_html(&ctx.config)?;
        debug!("rev"; "{} html file(s) rewritten", rewritten.len());
        Ok(TaskOutcome::OK)
    });

    graph.task("build", &["dist:rev"], |ctx: &TaskContext| {
        log!("build"; "{}", ctx.config.root_relative(ctx.config.dist_root()).display());
        Ok(TaskOutcome::OK)
    });

    graph
}

//! Per-kind asset pipelines.
//!
//! ```text
//! inputs ──par_iter──▶ process ──▶ Emit* ──write_if_changed──▶ output dir
//!                         │
//!                         └─ Err(message) ──▶ FileFailure (siblings continue)
//! ```
//!
//! A pipeline only fails as a whole when its inputs cannot be listed or an
//! output cannot be written. Everything else is a per-file failure.

mod copy;
mod error;
mod markup;
mod script;
mod style;

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::asset::{fingerprint_path, manifest_key};
use crate::config::FerruleConfig;
use crate::core::{AssetKind, Profile};
use crate::freshness::{WriteOutcome, hash_bytes, write_if_changed};
use crate::logger::ProgressLine;
use crate::{debug, log};

pub use copy::CopyPipeline;
pub use error::{FileFailure, PipelineError};
pub use markup::MarkupPipeline;
pub use script::ScriptPipeline;
pub use style::StylePipeline;

/// Everything a pipeline run needs to know about where and how to build.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub config: &'a FerruleConfig,
    pub profile: Profile,
    pub progress: Option<&'a ProgressLine>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a FerruleConfig, profile: Profile) -> Self {
        Self {
            config,
            profile,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressLine>) -> Self {
        self.progress = progress;
        self
    }

    pub fn source_dir(&self, kind: AssetKind) -> PathBuf {
        self.config.source_dir(kind)
    }

    pub fn output_dir(&self, kind: AssetKind) -> PathBuf {
        self.config.output_dir(kind, self.profile)
    }

    /// Whether outputs of `kind` get content-hashed names in this run.
    pub fn fingerprints(&self, kind: AssetKind) -> bool {
        self.profile.fingerprint && self.config.fingerprint.enabled(kind)
    }

    /// Final output name for `rel` (relative to the kind's output dir).
    ///
    /// Returns the name and, when fingerprinted, the manifest entry for it.
    pub fn name_output(
        &self,
        kind: AssetKind,
        rel: &Path,
        bytes: &[u8],
    ) -> (PathBuf, Option<(String, String)>) {
        if !self.fingerprints(kind) {
            return (rel.to_path_buf(), None);
        }
        let named = fingerprint_path(rel, hash_bytes(bytes), self.config.fingerprint.length);
        let entry = (
            manifest_key(rel, Path::new("")),
            manifest_key(&named, Path::new("")),
        );
        (named, Some(entry))
    }
}

/// One file a pipeline wants written.
#[derive(Debug)]
pub struct Emit {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl Emit {
    pub fn new(path: PathBuf, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path,
            bytes: bytes.into(),
        }
    }
}

/// Outputs produced from one input file.
#[derive(Debug, Default)]
pub struct FileOutput {
    pub emits: Vec<Emit>,
    pub manifest: Option<(String, String)>,
}

/// Outcome of one pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    /// Original name → fingerprinted name (production only).
    pub manifest: BTreeMap<String, String>,
}

impl PipelineReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

enum FileResult {
    Done {
        written: Vec<PathBuf>,
        unchanged: Vec<PathBuf>,
        manifest: Option<(String, String)>,
    },
    Failed(FileFailure),
}

pub trait Pipeline: Send + Sync {
    fn kind(&self) -> AssetKind;

    /// Input files of one run, sorted.
    fn inputs(&self, ctx: &BuildContext<'_>) -> Result<Vec<PathBuf>, PipelineError>;

    /// Turn one input into its outputs. `Err` is a failure of this file only.
    fn process(&self, ctx: &BuildContext<'_>, path: &Path) -> Result<FileOutput, String>;

    fn run(&self, ctx: &BuildContext<'_>) -> Result<PipelineReport, PipelineError> {
        let inputs = self.inputs(ctx)?;
        self.run_inputs(ctx, &inputs)
    }

    /// Process already-listed `inputs` in parallel, results in input order.
    fn run_inputs(
        &self,
        ctx: &BuildContext<'_>,
        inputs: &[PathBuf],
    ) -> Result<PipelineReport, PipelineError> {
        let kind = self.kind();
        debug!(kind.name(); "{} input(s)", inputs.len());

        let results = inputs
            .par_iter()
            .map(|path| {
                let result = match self.process(ctx, path) {
                    Ok(output) => write_outputs(output),
                    Err(message) => Ok(FileResult::Failed(FileFailure::new(path, message))),
                };
                if let Some(progress) = ctx.progress {
                    progress.inc(kind.name());
                }
                result
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = PipelineReport::default();
        for result in results {
            match result {
                FileResult::Done {
                    written,
                    unchanged,
                    manifest,
                } => {
                    report.written.extend(written);
                    report.unchanged.extend(unchanged);
                    if let Some((original, named)) = manifest {
                        report.manifest.insert(original, named);
                    }
                }
                FileResult::Failed(failure) => {
                    log!("error"; "{}", ctx.config.root_relative(&failure.path).display());
                    for line in failure.message.lines() {
                        eprintln!("  {line}");
                    }
                    report.failures.push(failure);
                }
            }
        }
        Ok(report)
    }
}

fn write_outputs(output: FileOutput) -> Result<FileResult, PipelineError> {
    let mut written = Vec::new();
    let mut unchanged = Vec::new();
    for emit in output.emits {
        match write_if_changed(&emit.path, &emit.bytes)
            .map_err(|e| PipelineError::Write(emit.path.clone(), e))?
        {
            WriteOutcome::Written => written.push(emit.path),
            WriteOutcome::Unchanged => unchanged.push(emit.path),
        }
    }
    Ok(FileResult::Done {
        written,
        unchanged,
        manifest: output.manifest,
    })
}

/// Pipeline handling `kind`.
pub fn pipeline_for(kind: AssetKind) -> Box<dyn Pipeline> {
    match kind {
        AssetKind::Html => Box::new(MarkupPipeline),
        AssetKind::Style => Box::new(StylePipeline),
        AssetKind::Script => Box::new(ScriptPipeline),
        AssetKind::Image | AssetKind::Font | AssetKind::Lib => Box::new(CopyPipeline::new(kind)),
    }
}

/// One pipeline per kind, in build order.
pub fn pipelines() -> Vec<Box<dyn Pipeline>> {
    AssetKind::ALL.into_iter().map(pipeline_for).collect()
}

/// Run every pipeline once, in parallel.
///
/// Inputs of all kinds are listed up front so a progress line can show totals.
/// Reports come back in build order.
pub fn run_all(
    config: &FerruleConfig,
    profile: Profile,
    show_progress: bool,
) -> Result<Vec<(AssetKind, PipelineReport)>, PipelineError> {
    let pipelines = pipelines();
    let base = BuildContext::new(config, profile);
    let inputs = pipelines
        .iter()
        .map(|p| p.inputs(&base))
        .collect::<Result<Vec<_>, _>>()?;

    let progress = show_progress.then(|| {
        let totals: Vec<_> = pipelines
            .iter()
            .zip(&inputs)
            .map(|(p, files)| (p.kind().name(), files.len()))
            .collect();
        ProgressLine::new(profile.name(), &totals)
    });
    let ctx = base.with_progress(progress.as_ref());

    let reports = pipelines
        .par_iter()
        .zip(inputs.par_iter())
        .map(|(pipeline, files)| -> Result<_, PipelineError> {
            Ok((pipeline.kind(), pipeline.run_inputs(&ctx, files)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(progress) = progress {
        progress.finish();
    }
    Ok(reports)
}

/// Path of `path` relative to `base` (for mirroring source layout).
pub(crate) fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()))
}

/// `<name>.map` beside `path`, and the bare map file name for the link comment.
pub(crate) fn map_sibling(path: &Path) -> (PathBuf, String) {
    let name = format!(
        "{}.map",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    (path.with_file_name(&name), name)
}

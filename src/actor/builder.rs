//! Per-kind build workers.
//!
//! One tokio task per asset kind. Triggers queue in the worker's channel while
//! a run is in progress; when the run ends, everything queued collapses into a
//! single follow-up run. Kinds never wait on each other.
//!
//! ```text
//! BuildMsg::Rebuild ──▶ [drain queue] ──spawn_blocking──▶ pipeline.run (staging)
//!                                                             │
//!                        WsMsg::Css / Error / ClearError ◀─────┘
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::{BuildMsg, WsMsg};
use crate::config::FerruleConfig;
use crate::core::{AssetKind, Profile};
use crate::logger::{status_error, status_success, status_unchanged};
use crate::pipeline::{BuildContext, PipelineReport, pipeline_for};
use crate::utils::plural::plural_count;

/// Senders of every running worker, by kind.
pub type BuilderHandles = BTreeMap<AssetKind, mpsc::Sender<BuildMsg>>;

/// Result of one worker run, reduced to what the browser needs to hear.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum RunOutcome {
    /// Every file built; `written` holds outputs that changed on disk.
    Clean { written: Vec<PathBuf> },
    /// Some inputs failed. `path` and `error` describe the first one.
    Failed {
        failed: usize,
        path: String,
        error: String,
    },
}

pub struct BuildActor {
    kind: AssetKind,
    rx: mpsc::Receiver<BuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    config: Arc<FerruleConfig>,
    /// The last run of this kind pushed an error overlay.
    errored: bool,
}

impl BuildActor {
    pub fn new(
        kind: AssetKind,
        rx: mpsc::Receiver<BuildMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        config: Arc<FerruleConfig>,
    ) -> Self {
        Self {
            kind,
            rx,
            ws_tx,
            config,
            errored: false,
        }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            let BuildMsg::Rebuild { mut changed } = msg else {
                break;
            };

            // coalesce everything that queued up during the previous run
            let mut shutdown = false;
            while let Ok(next) = self.rx.try_recv() {
                match next {
                    BuildMsg::Rebuild { changed: more } => changed.extend(more),
                    BuildMsg::Shutdown => {
                        shutdown = true;
                        break;
                    }
                }
            }
            if shutdown {
                break;
            }

            changed.sort();
            changed.dedup();
            if self.rebuild(&changed).await.is_err() {
                break;
            }
        }
        crate::debug!("build"; "{} worker stopped", self.kind);
    }

    /// One pipeline run. `Err` means the WebSocket actor is gone.
    async fn rebuild(&mut self, changed: &[PathBuf]) -> Result<(), ()> {
        let kind = self.kind;
        let config = Arc::clone(&self.config);
        crate::debug!("build"; "{}: rerun for {}", kind, plural_count(changed.len(), "change"));

        let joined = tokio::task::spawn_blocking(move || {
            let ctx = BuildContext::new(&config, Profile::DEVELOPMENT);
            pipeline_for(kind).run(&ctx)
        })
        .await;

        let outcome = match joined {
            Ok(Ok(report)) => outcome_of(&report, &self.config),
            Ok(Err(e)) => RunOutcome::Failed {
                failed: 1,
                path: self.config.root_relative(self.config.source_dir(kind)).display().to_string(),
                error: e.to_string(),
            },
            Err(e) => {
                crate::log!("build"; "{} worker panicked: {}", kind, e);
                return Ok(());
            }
        };

        self.report(outcome, changed).await
    }

    async fn report(&mut self, outcome: RunOutcome, changed: &[PathBuf]) -> Result<(), ()> {
        let kind = self.kind;
        match outcome {
            RunOutcome::Failed {
                failed,
                path,
                error,
            } => {
                status_error(&format!("{kind}: {} failed", plural_count(failed, "file")), &error);
                self.errored = true;
                self.send(WsMsg::Error { kind, path, error }).await?;
            }
            RunOutcome::Clean { written } => {
                if self.errored {
                    self.errored = false;
                    self.send(WsMsg::ClearError { kind }).await?;
                }
                if written.is_empty() {
                    status_unchanged(&format!("{kind}: unchanged"));
                    return Ok(());
                }
                status_success(&format!("{kind}: {}", self.describe(changed)));
                if kind == AssetKind::Style {
                    let files = stylesheets(&written, &self.config.staging_root());
                    if !files.is_empty() {
                        self.send(WsMsg::Css { files }).await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn send(&self, msg: WsMsg) -> Result<(), ()> {
        self.ws_tx.send(msg).await.map_err(|_| ())
    }

    fn describe(&self, changed: &[PathBuf]) -> String {
        match changed {
            [one] => self.config.root_relative(one).display().to_string(),
            _ => format!("rebuilt after {}", plural_count(changed.len(), "change")),
        }
    }
}

/// Reduce a pipeline report to the outcome pushed to browsers.
pub(super) fn outcome_of(report: &PipelineReport, config: &FerruleConfig) -> RunOutcome {
    match report.failures.first() {
        Some(first) => RunOutcome::Failed {
            failed: report.failures.len(),
            path: config.root_relative(&first.path).display().to_string(),
            error: first.message.clone(),
        },
        None => RunOutcome::Clean {
            written: report.written.clone(),
        },
    }
}

/// Written `.css` files as served paths (`css/app.css`), sorted.
pub(super) fn stylesheets(written: &[PathBuf], staging_root: &Path) -> Vec<String> {
    let mut files: Vec<_> = written
        .iter()
        .filter(|p| p.extension().is_some_and(|e| e == "css"))
        .filter_map(|p| crate::utils::path::slash_relative(p, staging_root))
        .collect();
    files.sort();
    files
}

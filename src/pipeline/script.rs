//! Script pipeline: one bundle per top-level entry.

use std::path::{Path, PathBuf};

use super::{BuildContext, Emit, FileOutput, Pipeline, PipelineError, map_sibling};
use crate::compiler::script::{ScriptCompiler, discover_entries};
use crate::core::AssetKind;

pub struct ScriptPipeline;

/// `//# sourceMappingURL=` trailer for a bundle.
fn link_source_map(code: &str, map_name: &str) -> String {
    let sep = if code.ends_with('\n') { "" } else { "\n" };
    format!("{code}{sep}//# sourceMappingURL={map_name}\n")
}

impl Pipeline for ScriptPipeline {
    fn kind(&self) -> AssetKind {
        AssetKind::Script
    }

    fn inputs(&self, ctx: &BuildContext<'_>) -> Result<Vec<PathBuf>, PipelineError> {
        let dir = ctx.source_dir(AssetKind::Script);
        discover_entries(&dir).map_err(|e| PipelineError::walk(&dir, e))
    }

    fn process(&self, ctx: &BuildContext<'_>, path: &Path) -> Result<FileOutput, String> {
        let scripts = &ctx.config.scripts;
        let output = ScriptCompiler::new(&scripts.target)
            .map_err(|e| e.to_string())?
            .minify(scripts.minify)
            .sourcemaps(scripts.sourcemaps)
            .compile(path)
            .map_err(|e| e.to_string())?;

        let rel = PathBuf::from(path.file_name().unwrap_or_default()).with_extension("js");
        let (name, manifest) = ctx.name_output(AssetKind::Script, &rel, output.code.as_bytes());
        let dest = ctx.output_dir(AssetKind::Script).join(name);

        let mut emits = Vec::with_capacity(2);
        match output.map {
            Some(map) => {
                let (map_path, map_name) = map_sibling(&dest);
                emits.push(Emit::new(dest, link_source_map(&output.code, &map_name)));
                emits.push(Emit::new(map_path, map));
            }
            None => emits.push(Emit::new(dest, output.code)),
        }
        Ok(FileOutput { emits, manifest })
    }
}

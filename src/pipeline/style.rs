//! Style pipeline: top-level stylesheets compiled to prefixed CSS.

use std::path::{Path, PathBuf};

use super::{BuildContext, Emit, FileOutput, Pipeline, PipelineError, map_sibling, relative_to};
use crate::asset::FileSet;
use crate::compiler::style::{StyleCompiler, link_source_map};
use crate::core::AssetKind;

pub struct StylePipeline;

impl StylePipeline {
    fn compiler(ctx: &BuildContext<'_>) -> Result<StyleCompiler, String> {
        let browsers = ctx.config.styles.browsers()?;
        Ok(StyleCompiler::new(ctx.config.style_load_paths(), browsers)
            .minify(ctx.profile.minify_styles)
            .sourcemaps(ctx.config.styles.sourcemaps))
    }
}

impl Pipeline for StylePipeline {
    fn kind(&self) -> AssetKind {
        AssetKind::Style
    }

    /// Partials (`_name.scss`) are only compiled through the entries importing them.
    fn inputs(&self, ctx: &BuildContext<'_>) -> Result<Vec<PathBuf>, PipelineError> {
        FileSet::new(ctx.source_dir(AssetKind::Style))
            .include("*.scss")
            .include("*.css")
            .exclude("_*")
            .resolve()
    }

    fn process(&self, ctx: &BuildContext<'_>, path: &Path) -> Result<FileOutput, String> {
        let output = Self::compiler(ctx)?
            .compile(path)
            .map_err(|e| e.to_string())?;

        let rel = relative_to(path, &ctx.source_dir(AssetKind::Style)).with_extension("css");
        let (name, manifest) = ctx.name_output(AssetKind::Style, &rel, output.css.as_bytes());
        let dest = ctx.output_dir(AssetKind::Style).join(name);

        let mut emits = Vec::with_capacity(2);
        match output.map {
            Some(map) => {
                let (map_path, map_name) = map_sibling(&dest);
                emits.push(Emit::new(dest, link_source_map(&output.css, &map_name)));
                emits.push(Emit::new(map_path, map));
            }
            None => emits.push(Emit::new(dest, output.css)),
        }
        Ok(FileOutput { emits, manifest })
    }
}

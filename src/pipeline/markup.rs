//! Markup pipeline: expand includes, mirror the source layout.

use std::path::{Path, PathBuf};

use super::{BuildContext, Emit, FileOutput, Pipeline, PipelineError, relative_to};
use crate::asset::FileSet;
use crate::compiler::include::IncludeExpander;
use crate::core::AssetKind;

pub struct MarkupPipeline;

impl Pipeline for MarkupPipeline {
    fn kind(&self) -> AssetKind {
        AssetKind::Html
    }

    fn inputs(&self, ctx: &BuildContext<'_>) -> Result<Vec<PathBuf>, PipelineError> {
        FileSet::new(ctx.source_dir(AssetKind::Html))
            .include("**/*.html")
            .exclude(format!("{}/**", ctx.config.markup.partials))
            .resolve()
    }

    fn process(&self, ctx: &BuildContext<'_>, path: &Path) -> Result<FileOutput, String> {
        let html = IncludeExpander::new(&ctx.config.markup.prefix)
            .expand_file(path)
            .map_err(|e| e.to_string())?;
        let rel = relative_to(path, &ctx.source_dir(AssetKind::Html));
        Ok(FileOutput {
            emits: vec![Emit::new(ctx.output_dir(AssetKind::Html).join(rel), html)],
            manifest: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::core::Profile;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_pages_expanded_partials_skipped() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        let html = config.source_dir(AssetKind::Html);
        write(&html, "include/header.html", "<h1>@@title</h1>");
        write(&html, "index.html", "@@include('include/header.html', {\"title\": \"Home\"})");
        write(&html, "blog/post.html", "<p>post</p>");

        let ctx = BuildContext::new(&config, Profile::DEVELOPMENT);
        let report = MarkupPipeline.run(&ctx).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.written.len(), 2);

        let out = ctx.output_dir(AssetKind::Html);
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "<h1>Home</h1>");
        assert!(out.join("blog/post.html").is_file());
        assert!(!out.join("include").exists());
    }

    #[test]
    fn test_missing_include_fails_one_page() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        let html = config.source_dir(AssetKind::Html);
        write(&html, "broken.html", "@@include('include/nope.html')");
        write(&html, "fine.html", "<p>ok</p>");

        let ctx = BuildContext::new(&config, Profile::DEVELOPMENT);
        let report = MarkupPipeline.run(&ctx).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(ctx.output_dir(AssetKind::Html).join("fine.html").is_file());
    }
}

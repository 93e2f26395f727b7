//! Byte-for-byte copy pipelines (images, fonts, vendor libs).

use std::fs;
use std::path::{Path, PathBuf};

use super::{BuildContext, Emit, FileOutput, Pipeline, PipelineError, relative_to};
use crate::asset::FileSet;
use crate::core::AssetKind;

pub struct CopyPipeline {
    kind: AssetKind,
}

impl CopyPipeline {
    pub fn new(kind: AssetKind) -> Self {
        Self { kind }
    }

    fn file_set(&self, root: PathBuf) -> FileSet {
        let set = FileSet::new(root).include("**/*");
        match self.kind {
            // sprite sources are composed elsewhere
            AssetKind::Image => set.exclude("sprites/**"),
            _ => set,
        }
    }
}

impl Pipeline for CopyPipeline {
    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn inputs(&self, ctx: &BuildContext<'_>) -> Result<Vec<PathBuf>, PipelineError> {
        self.file_set(ctx.source_dir(self.kind)).resolve()
    }

    fn process(&self, ctx: &BuildContext<'_>, path: &Path) -> Result<FileOutput, String> {
        let bytes = fs::read(path).map_err(|e| format!("cannot read: {e}"))?;
        let rel = relative_to(path, &ctx.source_dir(self.kind));
        let (name, manifest) = ctx.name_output(self.kind, &rel, &bytes);
        Ok(FileOutput {
            emits: vec![Emit::new(ctx.output_dir(self.kind).join(name), bytes)],
            manifest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config_at, test_parse_config};
    use crate::core::Profile;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_images_skip_sprites() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        let images = config.source_dir(AssetKind::Image);
        write(&images, "icons/a.png", b"\x89PNG");
        write(&images, "sprites/s1.png", b"sprite");

        let ctx = BuildContext::new(&config, Profile::DEVELOPMENT);
        let report = CopyPipeline::new(AssetKind::Image).run(&ctx).unwrap();
        assert_eq!(report.written.len(), 1);

        let out = ctx.output_dir(AssetKind::Image);
        assert_eq!(fs::read(out.join("icons/a.png")).unwrap(), b"\x89PNG");
        assert!(!out.join("sprites").exists());
    }

    #[test]
    fn test_fonts_land_in_profile_dir() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        write(&config.source_dir(AssetKind::Font), "a.ttf", b"ttf");

        let pipeline = CopyPipeline::new(AssetKind::Font);
        pipeline
            .run(&BuildContext::new(&config, Profile::DEVELOPMENT))
            .unwrap();
        pipeline
            .run(&BuildContext::new(&config, Profile::PRODUCTION))
            .unwrap();

        assert!(dir.path().join("temp/font/a.ttf").is_file());
        assert!(dir.path().join("dist/fonts/a.ttf").is_file());
    }

    #[test]
    fn test_fingerprinting_opt_in() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config_at(dir.path());
        config.fingerprint = test_parse_config("[fingerprint]\nlib = true").fingerprint;
        write(&config.source_dir(AssetKind::Lib), "vendor/jquery.js", b"jq");

        let ctx = BuildContext::new(&config, Profile::PRODUCTION);
        let report = CopyPipeline::new(AssetKind::Lib).run(&ctx).unwrap();
        let named = &report.manifest["vendor/jquery.js"];
        assert!(named.starts_with("vendor/jquery.") && named.ends_with(".js"));
        assert!(ctx.output_dir(AssetKind::Lib).join(named).is_file());
    }
}

//! File-set resolution: which files under a source directory a pipeline owns.
//!
//! ```text
//! FileSet::new("src/html")
//!     .include("**/*.html")
//!     .exclude("include/**")
//!
//! src/html/
//! ├── index.html            -> selected
//! ├── about/team.html       -> selected
//! └── include/header.html   -> excluded (partial)
//! ```
//!
//! Patterns match the path relative to the root with `/` separators; `*`
//! never crosses a directory, `**/` matches zero or more directories.

use glob::{MatchOptions, Pattern};
use jwalk::WalkDir;
use std::path::PathBuf;

use crate::pipeline::PipelineError;
use crate::utils::path::slash_relative;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Glob-filtered view of one directory tree.
#[derive(Debug, Clone)]
pub struct FileSet {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl FileSet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Every file matching at least one include and no exclude, sorted.
    ///
    /// A missing root yields an empty set. A directory that cannot be read
    /// is an error for the whole run.
    pub fn resolve(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let include = compile(&self.include)?;
        let exclude = compile(&self.exclude)?;

        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort(true) {
            let entry = entry.map_err(|e| PipelineError::walk(&self.root, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if IGNORED_FILES.contains(&name.as_ref()) {
                continue;
            }

            let path = entry.path();
            let Some(rel) = slash_relative(&path, &self.root) else {
                continue;
            };
            if matches_any(&include, &rel) && !matches_any(&exclude, &rel) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Whether `path` (absolute, under root) would be selected, without walking.
    #[cfg(test)]
    pub fn contains(&self, path: &std::path::Path) -> Result<bool, PipelineError> {
        let Some(rel) = slash_relative(path, &self.root) else {
            return Ok(false);
        };
        Ok(matches_any(&compile(&self.include)?, &rel)
            && !matches_any(&compile(&self.exclude)?, &rel))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, PipelineError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|e| PipelineError::Pattern(p.clone(), e)))
        .collect()
}

fn matches_any(patterns: &[Pattern], rel: &str) -> bool {
    patterns.iter().any(|p| p.matches_with(rel, MATCH_OPTIONS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| slash_relative(f, root).unwrap())
            .collect()
    }

    #[test]
    fn test_html_set_excludes_partials() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "index.html");
        touch(dir.path(), "about/team.html");
        touch(dir.path(), "include/header.html");
        touch(dir.path(), "include/deep/footer.html");
        touch(dir.path(), "notes.txt");

        let files = FileSet::new(dir.path())
            .include("**/*.html")
            .exclude("include/**")
            .resolve()
            .unwrap();
        assert_eq!(names(dir.path(), &files), ["about/team.html", "index.html"]);
    }

    #[test]
    fn test_single_star_is_top_level_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.scss");
        touch(dir.path(), "_vars.scss");
        touch(dir.path(), "components/button.scss");

        let files = FileSet::new(dir.path())
            .include("*.scss")
            .exclude("_*")
            .resolve()
            .unwrap();
        assert_eq!(names(dir.path(), &files), ["app.scss"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = FileSet::new(dir.path().join("nope"))
            .include("**/*")
            .resolve()
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let err = FileSet::new(dir.path()).include("[").resolve().unwrap_err();
        assert!(matches!(err, PipelineError::Pattern(..)));
    }

    #[test]
    fn test_contains() {
        let set = FileSet::new("/p/src/images")
            .include("**/*")
            .exclude("sprites/**");
        assert!(set.contains(Path::new("/p/src/images/a/b.png")).unwrap());
        assert!(!set.contains(Path::new("/p/src/images/sprites/s.png")).unwrap());
        assert!(!set.contains(Path::new("/p/src/fonts/f.ttf")).unwrap());
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::asset::FileSet;
use crate::config::{MANIFEST_FILE, test_config_at};
use crate::rev::Manifest;
use crate::task::{self, RunReport, TaskContext};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    write(
        &src,
        "html/index.html",
        "<link href=\"../css/app.css\">\n<script type=\"module\" src=\"../js/app.js\"></script>\n@@include('include/footer.html', {\"year\": 2024})",
    );
    write(&src, "html/include/footer.html", "<footer>@@year</footer>");
    write(&src, "sass/_vars.scss", "$pad: 2px;");
    write(&src, "sass/app.scss", "@import 'vars';\n.box { display: flex; padding: $pad; }");
    write(&src, "js/modules/util.js", "export const double = (n) => n * 2;");
    write(
        &src,
        "js/app.js",
        "import { double } from './modules/util';\nconsole.log(double(21));",
    );
    write(&src, "images/logo.png", "png");
    write(&src, "images/sprites/s.png", "sprite");
    write(&src, "font/a.ttf", "ttf");
    write(&src, "lib/vendor.js", "window.v = 1;");
    dir
}

fn build(root: &Path) -> RunReport {
    let ctx = TaskContext::new(Arc::new(test_config_at(root)));
    task::run("build", &ctx).unwrap()
}

/// Every file under `dir` with its content, sorted by path.
fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    FileSet::new(dir)
        .include("**/*")
        .resolve()
        .unwrap()
        .into_iter()
        .map(|path| {
            let bytes = fs::read(&path).unwrap();
            (path.strip_prefix(dir).unwrap().to_path_buf(), bytes)
        })
        .collect()
}

fn manifest(root: &Path, dir: &str) -> Manifest {
    Manifest::load(&root.join("dist/rev").join(dir).join(MANIFEST_FILE)).unwrap()
}

#[test]
fn test_build_layout() {
    let dir = project();
    let report = build(dir.path());
    assert!(report.is_ok());
    assert_eq!(report.executed, ["dist:clean", "dist:assets", "dist:rev", "build"]);

    let dist = dir.path().join("dist");
    let css = manifest(dir.path(), "css");
    let js = manifest(dir.path(), "js");
    let css_name = css.get("app.css").unwrap();
    let js_name = js.get("app.js").unwrap();

    assert!(dist.join("css").join(css_name).is_file());
    assert!(dist.join("css").join(format!("{css_name}.map")).is_file());
    assert!(dist.join("js").join(js_name).is_file());
    assert!(!dist.join("css/app.css").exists());
    assert!(dist.join("images/logo.png").is_file());
    assert!(!dist.join("images/sprites").exists());
    assert!(dist.join("fonts/a.ttf").is_file());
    assert!(dist.join("lib/vendor.js").is_file());
    assert!(!dist.join("rev/images").exists());
}

#[test]
fn test_references_rewritten() {
    let dir = project();
    build(dir.path());

    let css_name = manifest(dir.path(), "css").get("app.css").unwrap().to_string();
    let js_name = manifest(dir.path(), "js").get("app.js").unwrap().to_string();
    let html = fs::read_to_string(dir.path().join("dist/html/index.html")).unwrap();
    assert!(html.contains(&format!("../css/{css_name}")), "{html}");
    assert!(html.contains(&format!("../js/{js_name}")), "{html}");
    assert!(html.contains("<footer>2024</footer>"));
    assert!(!html.contains("app.css\""));
}

#[test]
fn test_repeated_build_identical() {
    let dir = project();
    build(dir.path());
    let first = snapshot(&dir.path().join("dist"));
    build(dir.path());
    let second = snapshot(&dir.path().join("dist"));
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_changed_source_leaves_no_orphans() {
    let dir = project();
    build(dir.path());
    let old_name = manifest(dir.path(), "css").get("app.css").unwrap().to_string();

    write(
        &dir.path().join("src"),
        "sass/app.scss",
        ".box { display: block; }",
    );
    build(dir.path());

    let new_name = manifest(dir.path(), "css").get("app.css").unwrap().to_string();
    assert_ne!(old_name, new_name);
    assert!(!dir.path().join("dist/css").join(&old_name).exists());
    let html = fs::read_to_string(dir.path().join("dist/html/index.html")).unwrap();
    assert!(html.contains(&new_name));
}

#[test]
fn test_syntax_error_isolated() {
    let dir = project();
    write(&dir.path().join("src"), "sass/broken.scss", ".a { color: ");
    write(&dir.path().join("src"), "js/broken.js", "import nope from './nowhere';");

    let report = build(dir.path());
    assert_eq!(report.failures, 2);
    assert!(!report.is_ok());
    // every stage still ran and siblings still produced output
    assert_eq!(report.executed.len(), 4);
    let css = manifest(dir.path(), "css");
    assert!(css.get("app.css").is_some());
    assert!(css.get("broken.css").is_none());
    assert!(manifest(dir.path(), "js").get("app.js").is_some());
}

#[test]
fn test_deleted_source_leaves_no_orphans() {
    let dir = project();
    let src = dir.path().join("src");
    write(&src, "sass/extra.scss", ".extra { color: red; }");
    write(&src, "images/old.png", "old");
    build(dir.path());

    let extra = manifest(dir.path(), "css").get("extra.css").unwrap().to_string();
    assert!(dir.path().join("dist/css").join(&extra).is_file());
    assert!(dir.path().join("dist/images/old.png").is_file());

    fs::remove_file(src.join("sass/extra.scss")).unwrap();
    fs::remove_file(src.join("images/old.png")).unwrap();
    let report = build(dir.path());
    assert!(report.is_ok());

    let css = manifest(dir.path(), "css");
    assert!(css.get("extra.css").is_none());
    assert!(css.get("app.css").is_some());
    assert!(!dir.path().join("dist/css").join(&extra).exists());
    assert!(!dir.path().join("dist/css").join(format!("{extra}.map")).exists());
    assert!(!dir.path().join("dist/images/old.png").exists());
}

#[test]
fn test_deleted_source_gone_from_staging_after_compile() {
    let dir = project();
    let ctx = TaskContext::new(Arc::new(test_config_at(dir.path())));
    task::run("compile", &ctx).unwrap();
    assert!(dir.path().join("temp/js/app.js").is_file());
    assert!(dir.path().join("temp/images/logo.png").is_file());

    fs::remove_file(dir.path().join("src/js/app.js")).unwrap();
    fs::remove_file(dir.path().join("src/images/logo.png")).unwrap();
    assert!(task::run("compile", &ctx).unwrap().is_ok());

    assert!(!dir.path().join("temp/js/app.js").exists());
    assert!(!dir.path().join("temp/js/app.js.map").exists());
    assert!(!dir.path().join("temp/images/logo.png").exists());
    assert!(dir.path().join("temp/html/index.html").is_file());
}

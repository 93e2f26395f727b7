//! Build script: minify the embedded live-reload client.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

const HOTRELOAD_JS: &str = "src/embed/serve/hotreload.js";
const OVERLAY_CSS: &str = "src/embed/serve/hotreload-overlay.css";
const OVERLAY_CSS_PLACEHOLDER: &str = "__FERRULE_OVERLAY_CSS__";

fn main() {
    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let output = Path::new(&out_dir).join("hotreload.min.js");

    let source = fs::read_to_string(HOTRELOAD_JS).expect("Failed to read hotreload.js");
    let css = minify_css(&fs::read_to_string(OVERLAY_CSS).expect("Failed to read overlay css"));

    assert_eq!(
        source.matches(OVERLAY_CSS_PLACEHOLDER).count(),
        1,
        "hotreload.js must contain exactly one {OVERLAY_CSS_PLACEHOLDER} placeholder"
    );
    let source = source.replace(OVERLAY_CSS_PLACEHOLDER, &escape_template_literal(&css));
    fs::write(output, minify_js(&source)).expect("Failed to write minified hotreload JS");

    println!("cargo:rerun-if-changed={HOTRELOAD_JS}");
    println!("cargo:rerun-if-changed={OVERLAY_CSS}");
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code
}

fn minify_css(source: &str) -> String {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).expect("Failed to parse CSS");
    stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .expect("Failed to minify CSS")
        .code
}

fn escape_template_literal(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

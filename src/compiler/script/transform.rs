//! oxc passes over script source: downleveling and final emit.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};
use std::path::{Path, PathBuf};

use super::BundleError;

/// Final bundle text and its source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub code: String,
    pub map: Option<String>,
}

fn join_errors<E: ToString>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lower one module's syntax to `options`' target. Imports and exports are kept.
pub fn downlevel(path: &Path, code: &str, options: &TransformOptions) -> Result<String, BundleError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Err(BundleError::Parse {
            path: path.to_path_buf(),
            message: join_errors(&ret.errors),
        });
    }
    let mut program = ret.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let ret = Transformer::new(&allocator, path, options).build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        return Err(BundleError::Transform {
            path: path.to_path_buf(),
            message: join_errors(&ret.errors),
        });
    }

    Ok(Codegen::new().build(&program).code)
}

/// Re-parse the linked bundle and print it, minified when asked.
///
/// The source map (if any) maps the printed output back onto the linked bundle
/// named `name`.
pub fn emit(code: &str, name: &str, minify: bool, sourcemaps: bool) -> Result<Emitted, BundleError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Err(BundleError::Parse {
            path: PathBuf::from(name),
            message: join_errors(&ret.errors),
        });
    }
    let mut program = ret.program;

    let scoping = if minify {
        let options = MinifierOptions {
            mangle: Some(MangleOptions::default()),
            compress: Some(CompressOptions::smallest()),
        };
        Minifier::new(options)
            .minify(&allocator, &mut program)
            .scoping
    } else {
        None
    };

    let ret = Codegen::new()
        .with_options(CodegenOptions {
            minify,
            comments: if minify {
                CommentOptions::disabled()
            } else {
                CommentOptions::default()
            },
            source_map_path: sourcemaps.then(|| PathBuf::from(name)),
            ..CodegenOptions::default()
        })
        .with_scoping(scoping)
        .build(&program);

    Ok(Emitted {
        code: ret.code,
        map: ret.map.map(|map| map.to_json_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es2015() -> TransformOptions {
        TransformOptions::from_target("es2015").unwrap()
    }

    #[test]
    fn test_downlevel_exponent_keeps_exports() {
        let out = downlevel(Path::new("app.js"), "export const sq = (x) => x ** 2;", &es2015())
            .unwrap();
        assert!(out.contains("export"));
        assert!(!out.contains("**"), "{out}");
    }

    #[test]
    fn test_downlevel_nullish() {
        let out = downlevel(Path::new("app.js"), "export const v = a ?? b;", &es2015()).unwrap();
        assert!(!out.contains("??"), "{out}");
    }

    #[test]
    fn test_downlevel_parse_error() {
        let err = downlevel(Path::new("bad.js"), "const = ;", &es2015()).unwrap_err();
        assert!(matches!(err, BundleError::Parse { .. }));
    }

    #[test]
    fn test_emit_minified_with_map() {
        let out = emit(
            "function add(first, second) {\n  // sum\n  return first + second;\n}\nconsole.log(add(1, 2));\n",
            "app.js",
            true,
            true,
        )
        .unwrap();
        assert!(!out.code.contains("// sum"));
        assert!(!out.code.contains("first"));
        let map: serde_json::Value = serde_json::from_str(&out.map.unwrap()).unwrap();
        assert_eq!(map["version"], 3);
    }

    #[test]
    fn test_emit_plain() {
        let out = emit("let a = 1;\nexport { a };\n", "app.js", false, false).unwrap();
        assert!(out.code.contains("export { a }"));
        assert!(out.map.is_none());
    }
}

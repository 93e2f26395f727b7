//! Linking a module graph into one ES module.
//!
//! ```text
//! const __ferrule_0 = (function () {
//!     const { "b": b } = ...;        // imports become reads of dependency namespaces
//!     function f() {}                 // `export` keywords stripped
//!     return { "f": f };              // the namespace object
//! })();
//! ...
//! <entry with its own exports>
//! ```
//!
//! Each module body runs exactly once, after every module it imports. Namespace
//! objects capture values when the module body finishes, so re-assigning an
//! exported `let` later is not observed by importers.

use std::fmt::Write;

use super::graph::{Module, ModuleGraph};
use super::module::{ImportBinding, Item};

const STAR_HELPER: &str = "function __ferrule_star(target){for(var i=1;i<arguments.length;i++){var s=arguments[i];for(var k in s){if(k!==\"default\"&&!Object.prototype.hasOwnProperty.call(target,k))target[k]=s[k];}}return target;}\n";

const DEFAULT_LOCAL: &str = "__ferrule_default";

fn namespace(index: usize) -> String {
    format!("__ferrule_{index}")
}

fn quote(name: &str) -> String {
    serde_json::Value::String(name.to_string()).to_string()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c == '$' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

/// A byte range of the module source replaced by `text`.
struct Edit {
    start: u32,
    end: u32,
    text: String,
}

impl Edit {
    fn new(start: u32, end: u32, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

fn apply(code: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.start);
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&code[cursor..edit.start as usize]);
        out.push_str(&edit.text);
        cursor = edit.end as usize;
    }
    out.push_str(&code[cursor..]);
    out
}

/// `const` declarations binding an import to its dependency namespace.
fn import_prelude(out: &mut String, ns: &str, bindings: &[ImportBinding]) {
    let mut named = Vec::new();
    for binding in bindings {
        match binding {
            ImportBinding::Default(local) => {
                let _ = writeln!(out, "const {local} = {ns}.default;");
            }
            ImportBinding::Namespace(local) => {
                let _ = writeln!(out, "const {local} = {ns};");
            }
            ImportBinding::Named { imported, local } => {
                named.push(format!("{}: {local}", quote(imported)));
            }
        }
    }
    if !named.is_empty() {
        let _ = writeln!(out, "const {{ {} }} = {ns};", named.join(", "));
    }
}

/// Link `graph` into a single module source.
pub fn link(graph: &ModuleGraph) -> String {
    let entry = graph.entry_index();
    let mut bundle = String::new();
    let mut needs_star = false;

    for (index, module) in graph.modules.iter().enumerate() {
        if index == entry {
            bundle.push_str(&link_entry(graph, module));
        } else {
            let (body, stars) = link_dependency(module);
            needs_star |= stars;
            let _ = write!(
                bundle,
                "const {} = (function () {{\n{body}}})();\n",
                namespace(index)
            );
        }
    }

    if needs_star {
        bundle.insert_str(0, STAR_HELPER);
    }
    bundle
}

/// Rewrite a non-entry module into a function body ending in `return <namespace>;`.
fn link_dependency(module: &Module) -> (String, bool) {
    let mut prelude = String::new();
    let mut edits = Vec::new();
    let mut exports: Vec<(String, String)> = Vec::new();
    let mut stars = Vec::new();

    for item in &module.items {
        match item {
            Item::Import {
                start,
                end,
                specifier,
                bindings,
            } => {
                import_prelude(&mut prelude, &namespace(module.dep(specifier)), bindings);
                edits.push(Edit::new(*start, *end, ""));
            }
            Item::ExportDeclaration {
                start,
                decl_start,
                names,
            } => {
                edits.push(Edit::new(*start, *decl_start, ""));
                exports.extend(names.iter().map(|n| (n.clone(), n.clone())));
            }
            Item::ExportDefaultNamed {
                start,
                decl_start,
                local,
            } => {
                edits.push(Edit::new(*start, *decl_start, ""));
                exports.push(("default".into(), local.clone()));
            }
            Item::ExportDefaultValue {
                start,
                value_start,
                value_end,
                end,
            } => {
                edits.push(Edit::new(*start, *value_start, format!("const {DEFAULT_LOCAL} = ")));
                edits.push(Edit::new(*value_end, *end, ";"));
                exports.push(("default".into(), DEFAULT_LOCAL.into()));
            }
            Item::ExportList { start, end, specs } => {
                edits.push(Edit::new(*start, *end, ""));
                exports.extend(specs.iter().map(|(local, exported)| (exported.clone(), local.clone())));
            }
            Item::ReExport {
                start,
                end,
                specifier,
                specs,
            } => {
                let ns = namespace(module.dep(specifier));
                edits.push(Edit::new(*start, *end, ""));
                exports.extend(
                    specs
                        .iter()
                        .map(|(imported, exported)| (exported.clone(), format!("{ns}[{}]", quote(imported)))),
                );
            }
            Item::ExportAll {
                start,
                end,
                specifier,
                alias,
            } => {
                let ns = namespace(module.dep(specifier));
                edits.push(Edit::new(*start, *end, ""));
                match alias {
                    Some(alias) => exports.push((alias.clone(), ns)),
                    None => stars.push(ns),
                }
            }
        }
    }

    let object = exports
        .iter()
        .map(|(name, value)| format!("{}: {value}", quote(name)))
        .collect::<Vec<_>>()
        .join(", ");
    let object = format!("{{ {object} }}");
    let namespace_expr = if stars.is_empty() {
        object
    } else {
        format!("__ferrule_star({object}, {})", stars.join(", "))
    };

    let mut body = prelude;
    body.push_str(&apply(&module.code, edits));
    let _ = write!(body, "\nreturn {namespace_expr};\n");
    (body, !stars.is_empty())
}

/// Rewrite the entry module, keeping its local exports as real ES exports.
fn link_entry(graph: &ModuleGraph, module: &Module) -> String {
    let own: Vec<String> = module.items.iter().flat_map(Item::exported_names).collect();
    let mut prelude = String::new();
    let mut edits = Vec::new();
    let mut counter = 0;
    let mut reexport = |out: &mut String, value: String, exported: &str| {
        let local = format!("__ferrule_e{counter}");
        counter += 1;
        let exported = if is_identifier(exported) {
            exported.to_string()
        } else {
            quote(exported)
        };
        let _ = write!(out, "const {local} = {value};\nexport {{ {local} as {exported} }};\n");
    };

    for item in &module.items {
        match item {
            Item::Import {
                start,
                end,
                specifier,
                bindings,
            } => {
                import_prelude(&mut prelude, &namespace(module.dep(specifier)), bindings);
                edits.push(Edit::new(*start, *end, ""));
            }
            Item::ReExport {
                start,
                end,
                specifier,
                specs,
            } => {
                let ns = namespace(module.dep(specifier));
                let mut text = String::new();
                for (imported, exported) in specs {
                    reexport(&mut text, format!("{ns}[{}]", quote(imported)), exported);
                }
                edits.push(Edit::new(*start, *end, text));
            }
            Item::ExportAll {
                start,
                end,
                specifier,
                alias,
            } => {
                let dep = module.dep(specifier);
                let ns = namespace(dep);
                let mut text = String::new();
                match alias {
                    Some(alias) => reexport(&mut text, ns, alias),
                    None => {
                        for name in graph.star_names(dep) {
                            if !own.contains(&name) {
                                reexport(&mut text, format!("{ns}[{}]", quote(&name)), &name);
                            }
                        }
                    }
                }
                edits.push(Edit::new(*start, *end, text));
            }
            _ => {}
        }
    }

    let mut out = prelude;
    out.push_str(&apply(&module.code, edits));
    out
}

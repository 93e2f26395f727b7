//! Static import/export analysis of one ES module.
//!
//! Only top-level module declarations are recorded, each with the byte range
//! the linker rewrites. Dynamic `import()` is left untouched.

use oxc::allocator::Allocator;
use oxc::ast::ast::{
    ExportDefaultDeclarationKind, ImportDeclarationSpecifier, ModuleExportName, Statement,
};
use oxc_ecmascript::BoundNames;
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType};

/// One binding introduced by an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    /// `import local from 'x'`
    Default(String),
    /// `import * as local from 'x'`
    Namespace(String),
    /// `import { imported as local } from 'x'`
    Named { imported: String, local: String },
}

/// A top-level module declaration and the range it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Import {
        start: u32,
        end: u32,
        specifier: String,
        bindings: Vec<ImportBinding>,
    },
    /// `export const a = 1` / `export function f() {}`
    ExportDeclaration {
        start: u32,
        decl_start: u32,
        names: Vec<String>,
    },
    /// `export default function f() {}` (named declaration)
    ExportDefaultNamed {
        start: u32,
        decl_start: u32,
        local: String,
    },
    /// `export default <expr>` or an anonymous function/class
    ExportDefaultValue {
        start: u32,
        value_start: u32,
        value_end: u32,
        end: u32,
    },
    /// `export { local as exported }`
    ExportList {
        start: u32,
        end: u32,
        specs: Vec<(String, String)>,
    },
    /// `export { imported as exported } from 'x'`
    ReExport {
        start: u32,
        end: u32,
        specifier: String,
        specs: Vec<(String, String)>,
    },
    /// `export * from 'x'` / `export * as alias from 'x'`
    ExportAll {
        start: u32,
        end: u32,
        specifier: String,
        alias: Option<String>,
    },
}

impl Item {
    /// Module specifier this item depends on, if any.
    pub fn specifier(&self) -> Option<&str> {
        match self {
            Self::Import { specifier, .. }
            | Self::ReExport { specifier, .. }
            | Self::ExportAll { specifier, .. } => Some(specifier),
            _ => None,
        }
    }

    /// Names this item exports, `export *` excluded.
    pub fn exported_names(&self) -> Vec<String> {
        match self {
            Self::ExportDeclaration { names, .. } => names.clone(),
            Self::ExportDefaultNamed { .. } | Self::ExportDefaultValue { .. } => {
                vec!["default".to_string()]
            }
            Self::ExportList { specs, .. } | Self::ReExport { specs, .. } => {
                specs.iter().map(|(_, exported)| exported.clone()).collect()
            }
            Self::ExportAll {
                alias: Some(alias), ..
            } => vec![alias.clone()],
            _ => Vec::new(),
        }
    }
}

/// Parse `code` as an ES module and list its module declarations.
pub fn analyze(code: &str) -> Result<Vec<Item>, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Err(ret
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"));
    }

    let mut items = Vec::new();
    for stmt in &ret.program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let bindings = decl
                    .specifiers
                    .iter()
                    .flatten()
                    .map(|spec| match spec {
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            ImportBinding::Default(s.local.name.to_string())
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            ImportBinding::Namespace(s.local.name.to_string())
                        }
                        ImportDeclarationSpecifier::ImportSpecifier(s) => ImportBinding::Named {
                            imported: export_name(&s.imported),
                            local: s.local.name.to_string(),
                        },
                    })
                    .collect();
                items.push(Item::Import {
                    start: decl.span.start,
                    end: decl.span.end,
                    specifier: decl.source.value.to_string(),
                    bindings,
                });
            }
            Statement::ExportNamedDeclaration(decl) => {
                let specs = decl
                    .specifiers
                    .iter()
                    .map(|s| (export_name(&s.local), export_name(&s.exported)))
                    .collect();
                if let Some(source) = &decl.source {
                    items.push(Item::ReExport {
                        start: decl.span.start,
                        end: decl.span.end,
                        specifier: source.value.to_string(),
                        specs,
                    });
                } else if let Some(declaration) = &decl.declaration {
                    let mut names = Vec::new();
                    declaration.bound_names(&mut |ident| names.push(ident.name.to_string()));
                    items.push(Item::ExportDeclaration {
                        start: decl.span.start,
                        decl_start: declaration.span().start,
                        names,
                    });
                } else {
                    items.push(Item::ExportList {
                        start: decl.span.start,
                        end: decl.span.end,
                        specs,
                    });
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                let value = &decl.declaration;
                let local = match value {
                    ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                        f.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                        c.id.as_ref().map(|id| id.name.to_string())
                    }
                    _ => None,
                };
                let span = value.span();
                items.push(match local {
                    Some(local) => Item::ExportDefaultNamed {
                        start: decl.span.start,
                        decl_start: span.start,
                        local,
                    },
                    None => Item::ExportDefaultValue {
                        start: decl.span.start,
                        value_start: span.start,
                        value_end: span.end,
                        end: decl.span.end,
                    },
                });
            }
            Statement::ExportAllDeclaration(decl) => {
                items.push(Item::ExportAll {
                    start: decl.span.start,
                    end: decl.span.end,
                    specifier: decl.source.value.to_string(),
                    alias: decl.exported.as_ref().map(export_name),
                });
            }
            _ => {}
        }
    }

    Ok(items)
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    name.name().to_string()
}

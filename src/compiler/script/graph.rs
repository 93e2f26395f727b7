//! Module graph of one bundle entry.
//!
//! Modules are stored dependencies-first: every module appears after all the
//! modules it imports, and the entry is always last.

use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::BundleError;
use super::module::{ImportBinding, Item, analyze};
use super::resolve::resolve;
use crate::utils::path::normalize_path;

/// One module after loading and analysis.
#[derive(Debug)]
pub struct Module {
    pub path: PathBuf,
    /// Source text the item ranges refer to (already downleveled if first-party).
    pub code: String,
    pub items: Vec<Item>,
    /// Specifier → index of the resolved module.
    pub deps: FxHashMap<String, usize>,
}

impl Module {
    pub fn dep(&self, specifier: &str) -> usize {
        self.deps[specifier]
    }
}

#[derive(Debug)]
pub struct ModuleGraph {
    pub modules: Vec<Module>,
}

impl ModuleGraph {
    /// Load `entry` and everything it statically imports.
    ///
    /// `load` turns a path and its raw source into the code that gets analyzed
    /// and linked (this is where downleveling happens).
    pub fn build<F>(entry: &Path, load: F) -> Result<Self, BundleError>
    where
        F: Fn(&Path, String) -> Result<String, BundleError>,
    {
        let mut builder = Builder {
            load,
            modules: Vec::new(),
            index: FxHashMap::default(),
            stack: Vec::new(),
        };
        builder.visit(&normalize_path(entry))?;
        let graph = Self {
            modules: builder.modules,
        };
        graph.check_imports()?;
        Ok(graph)
    }

    /// Every name a module imports or re-exports from a dependency must be
    /// exported by it, directly or through `export *`.
    fn check_imports(&self) -> Result<(), BundleError> {
        for module in &self.modules {
            for item in &module.items {
                let (specifier, names): (&str, Vec<&str>) = match item {
                    Item::Import {
                        specifier,
                        bindings,
                        ..
                    } => (
                        specifier.as_str(),
                        bindings
                            .iter()
                            .filter_map(|binding| match binding {
                                ImportBinding::Default(_) => Some("default"),
                                ImportBinding::Named { imported, .. } => Some(imported.as_str()),
                                ImportBinding::Namespace(_) => None,
                            })
                            .collect(),
                    ),
                    Item::ReExport {
                        specifier, specs, ..
                    } => (specifier.as_str(), specs.iter().map(|(imported, _)| imported.as_str()).collect()),
                    _ => continue,
                };
                if names.is_empty() {
                    continue;
                }

                let exported = self.exports_of(module.dep(specifier));
                if let Some(missing) = names.into_iter().find(|n| !exported.iter().any(|e| e == n)) {
                    return Err(BundleError::MissingExport {
                        name: missing.to_string(),
                        specifier: specifier.to_string(),
                        from: module.path.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Everything module `index` exports: its own names plus `export *` names.
    fn exports_of(&self, index: usize) -> Vec<String> {
        let mut names: Vec<String> = self.modules[index]
            .items
            .iter()
            .flat_map(Item::exported_names)
            .collect();
        for name in self.star_names(index) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn entry(&self) -> &Module {
        // `build` always pushes the entry last
        &self.modules[self.modules.len() - 1]
    }

    pub fn entry_index(&self) -> usize {
        self.modules.len() - 1
    }

    /// Names reachable through `export *` of module `index`, `default` excluded.
    pub fn star_names(&self, index: usize) -> Vec<String> {
        let mut names = Vec::new();
        let mut visited = Vec::new();
        self.collect_names(index, &mut names, &mut visited);
        names.retain(|n| n != "default");
        names
    }

    fn collect_names(&self, index: usize, names: &mut Vec<String>, visited: &mut Vec<usize>) {
        if visited.contains(&index) {
            return;
        }
        visited.push(index);

        let module = &self.modules[index];
        for item in &module.items {
            for name in item.exported_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            if let Item::ExportAll {
                specifier,
                alias: None,
                ..
            } = item
            {
                self.collect_names(module.dep(specifier), names, visited);
            }
        }
    }
}

struct Builder<F> {
    load: F,
    modules: Vec<Module>,
    index: FxHashMap<PathBuf, usize>,
    stack: Vec<PathBuf>,
}

impl<F> Builder<F>
where
    F: Fn(&Path, String) -> Result<String, BundleError>,
{
    fn visit(&mut self, path: &Path) -> Result<usize, BundleError> {
        if let Some(&index) = self.index.get(path) {
            return Ok(index);
        }
        if self.stack.iter().any(|p| p == path) {
            let mut chain = self.stack.clone();
            chain.push(path.to_path_buf());
            return Err(BundleError::Cycle(chain));
        }

        let raw = fs::read_to_string(path).map_err(|e| BundleError::Read(path.to_path_buf(), e))?;
        let code = (self.load)(path, raw)?;
        let items = analyze(&code).map_err(|message| BundleError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        self.stack.push(path.to_path_buf());
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut deps = FxHashMap::default();
        for specifier in items.iter().filter_map(Item::specifier) {
            if deps.contains_key(specifier) {
                continue;
            }
            let resolved = resolve(specifier, dir).ok_or_else(|| BundleError::Unresolved {
                specifier: specifier.to_string(),
                from: path.to_path_buf(),
            })?;
            let dep = self.visit(&normalize_path(&resolved))?;
            deps.insert(specifier.to_string(), dep);
        }
        self.stack.pop();

        let index = self.modules.len();
        self.modules.push(Module {
            path: path.to_path_buf(),
            code,
            items,
            deps,
        });
        self.index.insert(path.to_path_buf(), index);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn passthrough(_: &Path, code: String) -> Result<String, BundleError> {
        Ok(code)
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn file_names(graph: &ModuleGraph) -> Vec<String> {
        graph
            .modules
            .iter()
            .map(|m| m.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_dependencies_first_and_shared_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "shared.js", "export const s = 1;");
        write(dir.path(), "a.js", "import { s } from './shared'; export const a = s;");
        write(dir.path(), "b.js", "import { s } from './shared.js'; export const b = s;");
        let entry = write(dir.path(), "app.js", "import './a'; import './b';");

        let graph = ModuleGraph::build(&entry, passthrough).unwrap();
        assert_eq!(file_names(&graph), ["shared.js", "a.js", "b.js", "app.js"]);
        assert_eq!(graph.entry_index(), 3);
    }

    #[test]
    fn test_unresolved_import() {
        let dir = TempDir::new().unwrap();
        let entry = write(dir.path(), "app.js", "import x from './nope';");

        let err = ModuleGraph::build(&entry, passthrough).unwrap_err();
        assert!(matches!(err, BundleError::Unresolved { specifier, .. } if specifier == "./nope"));
    }

    #[test]
    fn test_cycle_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.js", "import './b'; export const a = 1;");
        write(dir.path(), "b.js", "import './a'; export const b = 1;");
        let entry = write(dir.path(), "app.js", "import './a';");

        let err = ModuleGraph::build(&entry, passthrough).unwrap_err();
        assert!(matches!(err, BundleError::Cycle(chain) if chain.len() == 4));
    }

    #[test]
    fn test_missing_export_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dep.js", "export const a = 1;");
        let entry = write(dir.path(), "app.js", "import { a, nope } from './dep.js';");

        let err = ModuleGraph::build(&entry, passthrough).unwrap_err();
        assert!(matches!(
            err,
            BundleError::MissingExport { name, specifier, .. } if name == "nope" && specifier == "./dep.js"
        ));
    }

    #[test]
    fn test_missing_default_and_reexport_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dep.js", "export const a = 1;");
        let default_entry = write(dir.path(), "app.js", "import dep from './dep.js';");
        let reexport_entry = write(dir.path(), "re.js", "export { b } from './dep.js';");

        for entry in [default_entry, reexport_entry] {
            assert!(matches!(
                ModuleGraph::build(&entry, passthrough),
                Err(BundleError::MissingExport { .. })
            ));
        }
    }

    #[test]
    fn test_star_exports_satisfy_imports() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "inner.js", "export const i = 1;");
        write(dir.path(), "outer.js", "export * from './inner';");
        let entry = write(dir.path(), "app.js", "import { i } from './outer'; import * as ns from './inner';");

        assert!(ModuleGraph::build(&entry, passthrough).is_ok());
    }

    #[test]
    fn test_star_names() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "inner.js", "export const i = 1; export default 2;");
        write(
            dir.path(),
            "outer.js",
            "export * from './inner'; export function o() {}",
        );
        let entry = write(dir.path(), "app.js", "export * from './outer';");

        let graph = ModuleGraph::build(&entry, passthrough).unwrap();
        assert_eq!(graph.star_names(1), ["o", "i"]);
    }
}

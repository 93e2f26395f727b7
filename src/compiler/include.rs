//! Markup include expansion.
//!
//! ```text
//! @@include('include/header.html', {"title": "Home"})
//! ```
//!
//! The path is resolved against the directory of the file containing the
//! directive. Inside the included file `@@title` becomes `Home`; string values
//! are inserted verbatim, other JSON values in their serialized form. Nested
//! includes inherit the context of their parent, overridden by their own.

use regex::Regex;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils::path::normalize_path;

#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("cannot read `{}` (included from `{}`)", .path.display(), .from.display())]
    Missing {
        path: PathBuf,
        from: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("include cycle: {}", format_cycle(.0))]
    Cycle(Vec<PathBuf>),

    #[error("{}:{line}: {message}", .path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

fn format_cycle(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Expands `<prefix>include(...)` directives.
#[derive(Debug, Clone)]
pub struct IncludeExpander {
    directive: String,
    variable: Regex,
}

impl IncludeExpander {
    pub fn new(prefix: &str) -> Self {
        let variable = Regex::new(&format!(
            r"{}([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)",
            regex::escape(prefix)
        ))
        .expect("escaped prefix is a valid pattern");
        Self {
            directive: format!("{prefix}include("),
            variable,
        }
    }

    /// Expand every directive in `path`, recursively.
    pub fn expand_file(&self, path: &Path) -> Result<String, IncludeError> {
        let content = fs::read_to_string(path).map_err(|source| IncludeError::Missing {
            path: path.to_path_buf(),
            from: path.to_path_buf(),
            source,
        })?;
        let mut stack = vec![normalize_path(path)];
        self.expand(&content, path, &Map::new(), &mut stack)
    }

    fn expand(
        &self,
        content: &str,
        path: &Path,
        context: &Map<String, Value>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, IncludeError> {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut out = String::with_capacity(content.len());
        let mut rest = content;
        let mut consumed = 0;

        while let Some(pos) = rest.find(&self.directive) {
            out.push_str(&rest[..pos]);
            let args_start = pos + self.directive.len();
            let offset = consumed + pos;

            let directive = parse_args(&rest[args_start..]).map_err(|message| {
                IncludeError::Syntax {
                    path: path.to_path_buf(),
                    line: line_of(content, offset),
                    message,
                }
            })?;

            let target = base.join(&directive.target);
            let canonical = normalize_path(&target);
            if stack.contains(&canonical) {
                let mut chain = stack.clone();
                chain.push(canonical);
                return Err(IncludeError::Cycle(chain));
            }

            let included = fs::read_to_string(&target).map_err(|source| IncludeError::Missing {
                path: target.clone(),
                from: path.to_path_buf(),
                source,
            })?;

            let mut merged = context.clone();
            merged.extend(directive.context);
            let substituted = self.substitute(&included, &merged);

            stack.push(canonical);
            let expanded = self.expand(&substituted, &target, &merged, stack)?;
            stack.pop();

            out.push_str(&expanded);
            let advance = args_start + directive.len;
            rest = &rest[advance..];
            consumed += advance;
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Replace `@@key` (or `@@a.b`) with values from `context`.
    /// Unknown keys are left untouched.
    fn substitute(&self, content: &str, context: &Map<String, Value>) -> String {
        if context.is_empty() {
            return content.to_string();
        }
        self.variable
            .replace_all(content, |caps: &regex::Captures<'_>| {
                match lookup(context, &caps[1]) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

fn lookup<'a>(context: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let mut value = context.get(parts.next()?)?;
    for part in parts {
        value = value.as_object()?.get(part)?;
    }
    Some(value)
}

struct Directive {
    target: String,
    context: Map<String, Value>,
    /// Bytes consumed after the opening parenthesis, closing one included.
    len: usize,
}

/// Parse `'path', {json})` following the opening parenthesis.
fn parse_args(input: &str) -> Result<Directive, String> {
    let mut pos = skip_ws(input, 0);

    let quote = input[pos..]
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| "expected quoted include path".to_string())?;
    pos += 1;
    let end = input[pos..]
        .find(quote)
        .ok_or_else(|| "unterminated include path".to_string())?;
    let target = input[pos..pos + end].to_string();
    if target.is_empty() {
        return Err("empty include path".into());
    }
    pos = skip_ws(input, pos + end + 1);

    let mut context = Map::new();
    if input[pos..].starts_with(',') {
        pos = skip_ws(input, pos + 1);
        let mut stream = serde_json::Deserializer::from_str(&input[pos..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => context = map,
            Some(Ok(_)) => return Err("include context must be a JSON object".into()),
            Some(Err(e)) => return Err(format!("invalid include context: {e}")),
            None => return Err("missing include context".into()),
        }
        pos = skip_ws(input, pos + stream.byte_offset());
    }

    if !input[pos..].starts_with(')') {
        return Err("expected `)` after include arguments".into());
    }

    Ok(Directive {
        target,
        context,
        len: pos + 1,
    })
}

fn skip_ws(input: &str, from: usize) -> usize {
    from + input[from..].len() - input[from..].trim_start().len()
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

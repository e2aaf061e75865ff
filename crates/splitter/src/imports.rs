//! goimports-style pruning: drop import specs nothing refers to and lay the
//! rest out in canonical groups.

use crate::error::{Result, SplitError};
use crate::format::{join_segments, Segment};
use crate::syntax::{ImportSpec, ItemKind, SyntaxTree};
use std::collections::{BTreeMap, BTreeSet};

/// What pruning knows about the package beyond the file being pruned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageScope {
    /// Names declared at package level by any file of the package
    pub declared: BTreeSet<String>,
    /// Package names reported by the toolchain, keyed by import path
    pub import_names: BTreeMap<String, String>,
}

impl PackageScope {
    /// Name an unaliased import binds, and whether it is known rather than guessed
    fn binding(&self, path: &str) -> (String, bool) {
        match self.import_names.get(path) {
            Some(name) => (name.clone(), true),
            None => (assumed_name(path), is_standard(path)),
        }
    }
}

/// Remove unused imports from `src` and re-render its import block.
///
/// `file_name` is only used for diagnostics. Blank (`_`), dot (`.`) and cgo
/// (`"C"`) imports are never removed since their use cannot be seen in
/// selectors. Missing imports are not added.
///
/// A non-standard import whose package name is only guessed from its path is
/// kept while some qualifier resolves to nothing else, since the package may
/// declare a name its path does not show (`k8s.io/api/core/v1` is `v1`).
pub fn process(file_name: &str, src: &str, scope: &PackageScope) -> Result<String> {
    let tree = SyntaxTree::parse(file_name, src)
        .map_err(|e| SplitError::import_resolution(file_name, e.to_string()))?;

    let used: BTreeSet<&str> = tree
        .decls()
        .flat_map(|(_, d)| d.qualifiers.iter().map(String::as_str))
        .filter(|q| !scope.declared.contains(*q))
        .collect();

    let mut kept = Vec::new();
    let mut uncertain = Vec::new();
    let mut bound: BTreeSet<String> = BTreeSet::new();
    for spec in tree.imports() {
        match spec.name.as_deref() {
            Some("_") | Some(".") => kept.push(spec),
            _ if spec.path == "C" => kept.push(spec),
            Some(alias) => {
                if used.contains(alias) {
                    bound.insert(alias.to_string());
                    kept.push(spec);
                } else {
                    log::debug!("{file_name}: dropping unused import {alias} {}", spec.literal);
                }
            }
            None => {
                let (name, known) = scope.binding(&spec.path);
                if used.contains(name.as_str()) {
                    bound.insert(name);
                    kept.push(spec);
                } else if known {
                    log::debug!("{file_name}: dropping unused import {}", spec.literal);
                } else {
                    uncertain.push(spec);
                }
            }
        }
    }

    let unresolved: Vec<&str> = used
        .iter()
        .copied()
        .filter(|q| !bound.contains(*q))
        .collect();
    for spec in uncertain {
        if unresolved.is_empty() {
            log::debug!("{file_name}: dropping unused import {}", spec.literal);
        } else {
            log::debug!(
                "{file_name}: keeping {} for unresolved {}",
                spec.literal,
                unresolved.join(", ")
            );
            kept.push(spec);
        }
    }
    let block = render_block(kept);
    let mut placed = false;
    let mut segments = Vec::with_capacity(tree.items().len());
    for item in tree.items() {
        if item.kind == ItemKind::Imports {
            // All import declarations collapse into one block at the first one's position.
            if !placed {
                if let Some(block) = &block {
                    segments.push(Segment::owned(block.clone(), item.span));
                }
                placed = true;
            }
            continue;
        }
        segments.push(Segment::borrowed(&tree, item));
    }

    Ok(join_segments(&segments))
}

/// Package name an import path is expected to declare: the last element,
/// skipping a trailing `vN` major version, without a `go-` prefix, cut at the
/// first character that cannot appear in an identifier.
pub fn assumed_name(path: &str) -> String {
    let mut elements = path.rsplit('/');
    let mut base = elements.next().unwrap_or(path);

    if let Some(version) = base.strip_prefix('v') {
        if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) {
            if let Some(parent) = elements.next() {
                base = parent;
            }
        }
    }

    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(base.len());
    base[..end].to_string()
}

/// Standard library paths have no dot in their first element
pub fn is_standard(path: &str) -> bool {
    let first = path.split('/').next().unwrap_or(path);
    !first.contains('.')
}

/// Render import specs as a single declaration: standard library first, then
/// everything else, each group sorted by path and separated by a blank line.
/// A lone spec is written without parentheses; no specs yields `None`.
pub fn render_block<'a>(specs: impl IntoIterator<Item = &'a ImportSpec>) -> Option<String> {
    let mut standard: Vec<&ImportSpec> = Vec::new();
    let mut external: Vec<&ImportSpec> = Vec::new();
    let mut seen = BTreeSet::new();

    for spec in specs {
        if !seen.insert((spec.name.as_deref(), spec.path.as_str())) {
            continue;
        }
        if is_standard(&spec.path) {
            standard.push(spec);
        } else {
            external.push(spec);
        }
    }

    for group in [&mut standard, &mut external] {
        group.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.name.cmp(&b.name)));
    }

    match (standard.len(), external.len()) {
        (0, 0) => None,
        (1, 0) => Some(render_single(standard[0])),
        (0, 1) => Some(render_single(external[0])),
        _ => {
            let groups: Vec<String> = [standard, external]
                .iter()
                .filter(|group| !group.is_empty())
                .map(|group| render_group(group))
                .collect();
            Some(format!("import (\n{}\n)", groups.join("\n\n")))
        }
    }
}

fn render_single(spec: &ImportSpec) -> String {
    let mut out = String::new();
    for doc in &spec.doc {
        out.push_str(doc);
        out.push('\n');
    }
    out.push_str("import ");
    out.push_str(&spec_text(spec));
    if let Some(comment) = &spec.comment {
        out.push(' ');
        out.push_str(comment);
    }
    out
}

/// One parenthesized group, trailing comments aligned the way gofmt aligns
/// them: per run of consecutive commented lines, one space past the longest
fn render_group(group: &[&ImportSpec]) -> String {
    let mut lines = Vec::new();
    let mut run: Vec<(String, &str)> = Vec::new();

    fn flush(run: &mut Vec<(String, &str)>, lines: &mut Vec<String>) {
        let width = run.iter().map(|(text, _)| text.chars().count()).max().unwrap_or(0);
        for (text, comment) in run.drain(..) {
            let pad = width - text.chars().count() + 1;
            lines.push(format!("\t{text}{}{comment}", " ".repeat(pad)));
        }
    }

    for spec in group {
        if !spec.doc.is_empty() {
            flush(&mut run, &mut lines);
            lines.extend(spec.doc.iter().map(|doc| format!("\t{doc}")));
        }
        let text = spec_text(spec);
        match &spec.comment {
            Some(comment) => run.push((text, comment.as_str())),
            None => {
                flush(&mut run, &mut lines);
                lines.push(format!("\t{text}"));
            }
        }
    }
    flush(&mut run, &mut lines);
    lines.join("\n")
}

fn spec_text(spec: &ImportSpec) -> String {
    match &spec.name {
        Some(name) => format!("{name} {}", spec.literal),
        None => spec.literal.clone(),
    }
}

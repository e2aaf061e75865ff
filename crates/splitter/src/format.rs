//! Canonical layout of generated files and of the residual.
//!
//! Declaration and comment text is reused byte for byte; only the whitespace
//! between top-level items is decided here.

use crate::config::{FormatterKind, SplitConfig};
use crate::error::{Result, SplitError};
use crate::imports::{self, PackageScope};
use crate::syntax::{CommentId, DeclId, Item, ItemKind, Span, SyntaxTree};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A run of source text with the rows it occupied in the original file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: std::borrow::Cow<'a, str>,
    pub start_row: usize,
    pub end_row: usize,
    pub is_comment: bool,
}

impl<'a> Segment<'a> {
    pub fn borrowed(tree: &'a SyntaxTree, item: &Item) -> Self {
        Self::from_span(tree.text(item.span), item.span, matches!(item.kind, ItemKind::Comment(_)))
    }

    pub fn from_span(text: &'a str, span: Span, is_comment: bool) -> Self {
        Self {
            text: text.into(),
            start_row: span.start_row,
            end_row: span.end_row,
            is_comment,
        }
    }

    pub fn owned(text: String, span: Span) -> Self {
        Self {
            text: text.into(),
            start_row: span.start_row,
            end_row: span.end_row,
            is_comment: false,
        }
    }
}

/// Join segments by their original row gaps: a comment sharing a row stays on
/// that row, adjacent rows stay adjacent, anything further apart gets exactly
/// one blank line. Output ends with a single newline.
pub fn join_segments(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Segment<'_>> = None;

    for segment in segments {
        if let Some(p) = prev {
            let sep = if segment.start_row <= p.end_row {
                if p.is_comment || segment.is_comment {
                    " "
                } else {
                    "\n"
                }
            } else if segment.start_row == p.end_row + 1 {
                "\n"
            } else {
                "\n\n"
            };
            out.push_str(sep);
        }
        out.push_str(segment.text.trim_end());
        prev = Some(segment);
    }

    out.push('\n');
    out
}

/// Lay out a standalone file holding one declaration and its comments.
///
/// The import block is the full import list of the source file; pruning
/// happens afterwards in [`imports::process`].
pub fn render_unit(tree: &SyntaxTree, decl: DeclId, comments: &[CommentId]) -> Result<String> {
    let declaration = tree.decl(decl);
    let mut out = String::new();

    if !tree.build_constraints().is_empty() {
        out.push_str(&tree.build_constraints().join("\n"));
        out.push_str("\n\n");
    }

    out.push_str("package ");
    out.push_str(tree.package());
    out.push('\n');

    if let Some(block) = imports::render_block(tree.imports().iter()) {
        out.push('\n');
        out.push_str(&block);
        out.push('\n');
    }

    let mut spans: Vec<(Span, bool)> = comments
        .iter()
        .map(|id| (tree.comment(*id).span, true))
        .collect();
    spans.push((declaration.span, false));
    spans.sort_by_key(|(span, _)| span.start_byte);
    let body: Vec<Segment<'_>> = spans
        .into_iter()
        .map(|(span, is_comment)| Segment::from_span(tree.text(span), span, is_comment))
        .collect();

    out.push('\n');
    out.push_str(&join_segments(&body));

    SyntaxTree::parse(tree.path(), out.as_str())
        .map_err(|e| SplitError::synthesis(declaration.display_name(), e.to_string()))?;

    Ok(out)
}

/// Lay out what is left of the source file: every item except the removed
/// declarations and the comment groups outside `comments`.
pub fn render_residual(
    tree: &SyntaxTree,
    retained: &[DeclId],
    comments: &BTreeSet<CommentId>,
) -> Result<String> {
    let retained: BTreeSet<DeclId> = retained.iter().copied().collect();
    let segments: Vec<Segment<'_>> = tree
        .items()
        .iter()
        .filter(|item| match item.kind {
            ItemKind::PackageClause | ItemKind::Imports => true,
            ItemKind::Decl(id) => retained.contains(&id),
            ItemKind::Comment(id) => comments.contains(&id),
        })
        .map(|item| Segment::borrowed(tree, item))
        .collect();

    let out = join_segments(&segments);
    SyntaxTree::parse(tree.path(), out.as_str())
        .map_err(|e| SplitError::synthesis(tree.path().display().to_string(), e.to_string()))?;
    Ok(out)
}

/// Optional gofmt pass over a finished file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Gofmt {
    /// Keep the built-in layout
    #[default]
    Off,
    /// Run the binary when it can be spawned
    Auto(PathBuf),
    /// Run the binary; failing to spawn it is an error
    Required(PathBuf),
}

impl Gofmt {
    pub fn from_config(config: &SplitConfig) -> Self {
        match config.formatter {
            FormatterKind::Auto => Self::Auto(config.gofmt_binary.clone()),
            FormatterKind::Gofmt => Self::Required(config.gofmt_binary.clone()),
            FormatterKind::Builtin => Self::Off,
        }
    }

    /// Pipe `src` through gofmt; `file_name` is only used for diagnostics
    pub fn apply(&self, file_name: &str, src: String) -> Result<String> {
        let (binary, required) = match self {
            Self::Off => return Ok(src),
            Self::Auto(binary) => (binary, false),
            Self::Required(binary) => (binary, true),
        };

        let mut child = match Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if !required && e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} not found, keeping built-in layout", binary.display());
                return Ok(src);
            }
            Err(e) => {
                return Err(SplitError::synthesis(
                    file_name,
                    format!("running {}: {e}", binary.display()),
                ));
            }
        };

        // gofmt reads all of stdin before writing anything
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(src.as_bytes())
                .map_err(|e| SplitError::synthesis(file_name, format!("writing to gofmt: {e}")))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| SplitError::synthesis(file_name, format!("waiting for gofmt: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SplitError::synthesis(
                file_name,
                format!("gofmt failed ({}): {}", output.status, stderr.trim()),
            ));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| SplitError::synthesis(file_name, format!("gofmt output: {e}")))
    }
}

/// Passes every written file goes through after layout: import pruning
/// against the package scope, then gofmt
#[derive(Debug, Clone, Default)]
pub struct Finisher {
    pub scope: PackageScope,
    pub gofmt: Gofmt,
}

impl Finisher {
    pub fn new(scope: PackageScope, gofmt: Gofmt) -> Self {
        Self { scope, gofmt }
    }

    pub fn finish(&self, file_name: &str, src: &str) -> Result<String> {
        let pruned = imports::process(file_name, src, &self.scope)?;
        self.gofmt.apply(file_name, pruned)
    }
}

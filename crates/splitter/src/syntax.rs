//! Go source parsed into an owned, index-addressed view of its top level.
//!
//! Tree-sitter nodes borrow the tree they came from, so everything the
//! pipeline needs (spans, names, import specs, comment groups) is copied out
//! once. Later stages only ever refer to declarations and comment groups by
//! [`DeclId`] / [`CommentId`].

use crate::error::{Result, SplitError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Canonical suffix of Go test files
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// Byte and row extent of a top-level item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    /// Zero-based row of the first character
    pub start_row: usize,
    /// Zero-based row of the last character
    pub end_row: usize,
}

impl Span {
    fn of(node: Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        // A node that swallowed its trailing newline ends at column 0 of the next row.
        let end_row = if end.column == 0 && end.row > start.row {
            end.row - 1
        } else {
            end.row
        };
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_row: start.row,
            end_row,
        }
    }

    fn extend_to(&mut self, other: Span) {
        self.end_byte = other.end_byte;
        self.end_row = other.end_row;
    }
}

/// Index of a declaration within its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(pub usize);

/// Index of a comment group within its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommentId(pub usize);

/// Kind of a top-level declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Function,
    Method,
    Type,
    Var,
    Const,
}

impl DeclKind {
    fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "function_declaration" => Some(Self::Function),
            "method_declaration" => Some(Self::Method),
            "type_declaration" => Some(Self::Type),
            "var_declaration" => Some(Self::Var),
            "const_declaration" => Some(Self::Const),
            _ => None,
        }
    }

    /// Functions and methods are both `func` declarations
    pub fn is_func(self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "func",
            Self::Method => "method",
            Self::Type => "type",
            Self::Var => "var",
            Self::Const => "const",
        }
    }
}

/// A top-level declaration (imports excluded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclKind,
    /// Declared name; for grouped declarations the first spec's name
    pub name: Option<String>,
    pub span: Span,
    /// Identifiers used as package qualifiers (`pkg.Name`) inside the
    /// declaration, locally declared names excluded
    pub qualifiers: BTreeSet<String>,
    /// Names the declaration adds to package scope
    pub declares: BTreeSet<String>,
}

impl Declaration {
    /// Name for diagnostics
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {name}", self.kind.as_str()),
            None => self.kind.as_str().to_string(),
        }
    }
}

/// A run of top-level comments with no blank line between them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub span: Span,
}

/// One import specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Alias, `_` or `.` when present
    pub name: Option<String>,
    /// Path literal as written, quotes included
    pub literal: String,
    /// Unquoted import path
    pub path: String,
    /// Comment lines directly above the spec inside a parenthesized block
    pub doc: Vec<String>,
    /// Comment on the same line as the spec
    pub comment: Option<String>,
}

impl ImportSpec {
    pub fn new(name: Option<&str>, path: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            literal: format!("\"{path}\""),
            path: path.to_string(),
            doc: Vec::new(),
            comment: None,
        }
    }
}

/// What a top-level item is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    PackageClause,
    /// An `import` declaration
    Imports,
    Decl(DeclId),
    Comment(CommentId),
}

/// A top-level item in source order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
}

/// Parsed view of one Go source file
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    path: PathBuf,
    source: String,
    package: String,
    build_constraints: Vec<String>,
    imports: Vec<ImportSpec>,
    decls: Vec<Declaration>,
    comments: Vec<CommentGroup>,
    items: Vec<Item>,
}

impl SyntaxTree {
    /// Parse Go source; any syntax error fails the parse
    pub fn parse(path: impl Into<PathBuf>, source: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let source = source.into();

        let mut parser = go_parser()?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| SplitError::parse(format!("{}: parser returned no tree", path.display())))?;
        let root = tree.root_node();

        if let Some(bad) = first_error(root) {
            let pos = bad.start_position();
            return Err(SplitError::parse(format!(
                "{}:{}:{}: syntax error",
                path.display(),
                pos.row + 1,
                pos.column + 1
            )));
        }

        let mut builder = TreeBuilder::new(&source);
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            builder.visit(child).map_err(|kind| {
                SplitError::parse(format!(
                    "{}:{}: unexpected top-level {kind}",
                    path.display(),
                    child.start_position().row + 1
                ))
            })?;
        }

        let TreeBuilder {
            package,
            build_constraints,
            imports,
            decls,
            comments,
            items,
            ..
        } = builder;
        let package = package.ok_or_else(|| {
            SplitError::parse(format!("{}: missing package clause", path.display()))
        })?;
        let build_constraints = build_constraints.into_iter().map(|(_, line)| line).collect();

        Ok(Self {
            path,
            source,
            package,
            build_constraints,
            imports,
            decls,
            comments,
            items,
        })
    }

    /// Read and parse a file from disk
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| SplitError::io(path, e))?;
        Self::parse(path, source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package name from the package clause
    pub fn package(&self) -> &str {
        &self.package
    }

    /// `//go:build` and `// +build` lines above the package clause
    pub fn build_constraints(&self) -> &[String] {
        &self.build_constraints
    }

    pub fn imports(&self) -> &[ImportSpec] {
        &self.imports
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0]
    }

    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Declaration)> + '_ {
        self.decls.iter().enumerate().map(|(i, d)| (DeclId(i), d))
    }

    pub fn comment(&self, id: CommentId) -> &CommentGroup {
        &self.comments[id.0]
    }

    pub fn comment_ids(&self) -> impl Iterator<Item = CommentId> {
        (0..self.comments.len()).map(CommentId)
    }

    /// Source text covered by a span
    pub fn text(&self, span: Span) -> &str {
        &self.source[span.start_byte..span.end_byte]
    }
}

/// Read only the package clause of a Go file
pub fn package_name(source: &str) -> Option<String> {
    let mut parser = go_parser().ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|child| child.kind() == "package_clause")?;
    package_identifier(clause, source)
}

fn go_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| SplitError::tree_sitter(format!("Failed to set language: {e}")))?;
    Ok(parser)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

fn package_identifier(clause: Node, source: &str) -> Option<String> {
    let mut cursor = clause.walk();
    let name = clause
        .named_children(&mut cursor)
        .find(|c| c.kind() == "package_identifier")
        .map(|c| node_text(c, source).to_string());
    name
}

fn is_build_constraint(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("//go:build") || line.starts_with("// +build")
}

/// Nodes that open a lexical scope
fn opens_scope(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "method_declaration"
            | "func_literal"
            | "block"
            | "if_statement"
            | "for_statement"
            | "expression_switch_statement"
            | "select_statement"
            | "expression_case"
            | "type_case"
            | "default_case"
            | "communication_case"
    )
}

fn is_local(scopes: &[BTreeSet<String>], name: &str) -> bool {
    scopes.iter().any(|scope| scope.contains(name))
}

/// Direct children paired with the field they fill
fn fields(node: Node) -> Vec<(Option<&'static str>, Node)> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() {
                out.push((cursor.field_name(), child));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

/// Whether an assignment-like node declares with `:=`
fn defines(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == ":=");
    found
}

/// Accumulates top-level items while walking the root's children
struct TreeBuilder<'a> {
    source: &'a str,
    package: Option<String>,
    /// Constraint lines seen before the package clause, by comment group
    build_constraints: Vec<(CommentId, String)>,
    imports: Vec<ImportSpec>,
    decls: Vec<Declaration>,
    comments: Vec<CommentGroup>,
    items: Vec<Item>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            package: None,
            build_constraints: Vec::new(),
            imports: Vec::new(),
            decls: Vec::new(),
            comments: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Record one top-level node; returns the node kind when it has no place at file scope
    fn visit(&mut self, node: Node) -> std::result::Result<(), String> {
        let span = Span::of(node);
        match node.kind() {
            "package_clause" => {
                // Constraints only count when a blank line separates them from the clause.
                if let Some(Item {
                    kind: ItemKind::Comment(id),
                    span: group,
                }) = self.items.last()
                {
                    if span.start_row <= group.end_row + 1 {
                        let id = *id;
                        self.build_constraints.retain(|(owner, _)| *owner != id);
                    }
                }
                self.package = package_identifier(node, self.source);
                self.items.push(Item {
                    kind: ItemKind::PackageClause,
                    span,
                });
            }
            "import_declaration" => {
                self.collect_imports(node);
                self.items.push(Item {
                    kind: ItemKind::Imports,
                    span,
                });
            }
            "comment" => self.push_comment(node, span),
            kind => {
                let decl_kind = DeclKind::from_node_kind(kind).ok_or_else(|| kind.to_string())?;
                let id = DeclId(self.decls.len());
                self.decls.push(Declaration {
                    kind: decl_kind,
                    name: self.decl_name(node, decl_kind),
                    span,
                    qualifiers: self.qualifiers(node),
                    declares: self.package_scope_names(node, decl_kind),
                });
                self.items.push(Item {
                    kind: ItemKind::Decl(id),
                    span,
                });
            }
        }
        Ok(())
    }

    fn push_comment(&mut self, node: Node, span: Span) {
        let id = self.group_comment(span);
        let text = node_text(node, self.source);
        if self.package.is_none() && is_build_constraint(text) {
            self.build_constraints.push((id, text.trim_end().to_string()));
        }
    }

    /// Extend the previous group when nothing but a single newline separates
    /// them, otherwise start a new one
    fn group_comment(&mut self, span: Span) -> CommentId {
        if let Some(last) = self.items.last_mut() {
            if let ItemKind::Comment(id) = last.kind {
                if span.start_row <= last.span.end_row + 1 {
                    last.span.extend_to(span);
                    self.comments[id.0].span = last.span;
                    return id;
                }
            }
        }

        let id = CommentId(self.comments.len());
        self.comments.push(CommentGroup { span });
        self.items.push(Item {
            kind: ItemKind::Comment(id),
            span,
        });
        id
    }

    fn decl_name(&self, node: Node, kind: DeclKind) -> Option<String> {
        if kind.is_func() {
            return node
                .child_by_field_name("name")
                .map(|n| node_text(n, self.source).to_string());
        }

        // type/var/const: first spec's name, looking through a parenthesized list
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.id() != node.id() {
                if let Some(name) = current.child_by_field_name("name") {
                    return Some(node_text(name, self.source).to_string());
                }
            }
            let mut cursor = current.walk();
            let children: Vec<_> = current.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// Names added to package scope: the function name, or every name in a
    /// type/var/const declaration. Methods add none.
    fn package_scope_names(&self, node: Node, kind: DeclKind) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        match kind {
            DeclKind::Method => {}
            DeclKind::Function => {
                if let Some(name) = node.child_by_field_name("name") {
                    names.insert(node_text(name, self.source).to_string());
                }
            }
            DeclKind::Type | DeclKind::Var | DeclKind::Const => {
                let mut stack = vec![node];
                while let Some(current) = stack.pop() {
                    if matches!(current.kind(), "type_spec" | "type_alias" | "var_spec" | "const_spec") {
                        let mut cursor = current.walk();
                        for name in current.children_by_field_name("name", &mut cursor) {
                            names.insert(node_text(name, self.source).to_string());
                        }
                        continue;
                    }
                    let mut cursor = current.walk();
                    stack.extend(current.named_children(&mut cursor));
                }
            }
        }
        names.remove("_");
        names
    }

    /// Operands of `x.Sel` selectors and packages of qualified types that do
    /// not resolve to a name declared inside the declaration itself
    fn qualifiers(&self, node: Node) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut scopes = vec![BTreeSet::new()];
        self.walk_scoped(node, &mut scopes, &mut found);
        found
    }

    fn walk_scoped(
        &self,
        node: Node,
        scopes: &mut Vec<BTreeSet<String>>,
        found: &mut BTreeSet<String>,
    ) {
        match node.kind() {
            "selector_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    if operand.kind() == "identifier" {
                        self.note_qualifier(operand, scopes, found);
                    } else {
                        self.walk_scoped(operand, scopes, found);
                    }
                }
            }
            "qualified_type" => {
                if let Some(package) = node.child_by_field_name("package") {
                    self.note_qualifier(package, scopes, found);
                }
                if let Some(name) = node.child_by_field_name("name") {
                    self.walk_scoped(name, scopes, found);
                }
            }
            "short_var_declaration" | "range_clause" | "receive_statement" => {
                let declares = node.kind() == "short_var_declaration" || defines(node);
                let mut left = None;
                for (field, child) in fields(node) {
                    if field == Some("left") && declares {
                        left = Some(child);
                    } else {
                        self.walk_scoped(child, scopes, found);
                    }
                }
                if let Some(left) = left {
                    let mut cursor = left.walk();
                    let names: Vec<_> = left
                        .named_children(&mut cursor)
                        .filter(|c| c.kind() == "identifier")
                        .collect();
                    for name in names {
                        self.declare(name, scopes);
                    }
                }
            }
            "var_spec" | "const_spec" | "parameter_declaration" | "variadic_parameter_declaration"
            | "type_parameter_declaration" | "type_spec" | "type_alias" => {
                let mut names = Vec::new();
                for (field, child) in fields(node) {
                    if field == Some("name") {
                        names.push(child);
                    } else {
                        self.walk_scoped(child, scopes, found);
                    }
                }
                for name in names {
                    self.declare(name, scopes);
                }
            }
            "type_switch_statement" => {
                // `switch v := x.(type)`: v is visible in every case
                scopes.push(BTreeSet::new());
                let mut alias = None;
                for (field, child) in fields(node) {
                    match field {
                        Some("alias") => alias = Some(child),
                        Some("value") => {
                            self.walk_scoped(child, scopes, found);
                            if let Some(alias) = alias.take() {
                                let mut cursor = alias.walk();
                                let names: Vec<_> = alias.named_children(&mut cursor).collect();
                                for name in names {
                                    self.declare(name, scopes);
                                }
                            }
                        }
                        _ => self.walk_scoped(child, scopes, found),
                    }
                }
                scopes.pop();
            }
            kind if opens_scope(kind) => {
                scopes.push(BTreeSet::new());
                for (_, child) in fields(node) {
                    self.walk_scoped(child, scopes, found);
                }
                scopes.pop();
            }
            _ => {
                for (_, child) in fields(node) {
                    self.walk_scoped(child, scopes, found);
                }
            }
        }
    }

    fn note_qualifier(&self, ident: Node, scopes: &[BTreeSet<String>], found: &mut BTreeSet<String>) {
        let name = node_text(ident, self.source);
        if !is_local(scopes, name) {
            found.insert(name.to_string());
        }
    }

    fn declare(&self, ident: Node, scopes: &mut [BTreeSet<String>]) {
        let name = node_text(ident, self.source);
        if name == "_" {
            return;
        }
        if let Some(scope) = scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn collect_imports(&mut self, decl: Node) {
        let mut cursor = decl.walk();
        for child in decl.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => {
                    if let Some(spec) = self.import_spec(child) {
                        self.imports.push(spec);
                    }
                }
                "import_spec_list" => self.collect_import_list(child),
                _ => {}
            }
        }
    }

    fn collect_import_list(&mut self, list: Node) {
        let mut pending_doc: Vec<String> = Vec::new();
        let mut last_spec: Option<(usize, usize)> = None; // (index into imports, end row)

        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => {
                    if let Some(mut spec) = self.import_spec(child) {
                        spec.doc = std::mem::take(&mut pending_doc);
                        last_spec = Some((self.imports.len(), child.end_position().row));
                        self.imports.push(spec);
                    }
                }
                "comment" => {
                    let text = node_text(child, self.source).trim_end().to_string();
                    match last_spec {
                        Some((idx, row))
                            if row == child.start_position().row
                                && self.imports[idx].comment.is_none() =>
                        {
                            self.imports[idx].comment = Some(text);
                        }
                        _ => pending_doc.push(text),
                    }
                }
                _ => {}
            }
        }

        if !pending_doc.is_empty() {
            log::debug!("dropping {} trailing comment line(s) in import block", pending_doc.len());
        }
    }

    fn import_spec(&self, node: Node) -> Option<ImportSpec> {
        let path_node = node.child_by_field_name("path")?;
        let literal = node_text(path_node, self.source).to_string();
        let path = unquote(&literal);
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, self.source).to_string());
        Some(ImportSpec {
            name,
            literal,
            path,
            doc: Vec::new(),
            comment: None,
        })
    }
}

fn unquote(literal: &str) -> String {
    let trimmed = literal.trim();
    if trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"//go:build integration

// Package p is documented.
package p

import (
	"fmt"
	tst "testing" // aliased

	// side effects
	_ "embed"
)

// helper does nothing.
func helper() {}

type (
	fixture struct{}
	other   int
)

func (f *fixture) TestMethod(t *tst.T) { fmt.Println(t) }

// TestAlpha checks alpha.
// More words.
func TestAlpha(t *tst.T) {}
"#;

    #[test]
    fn test_parse_top_level() {
        let tree = SyntaxTree::parse("p_test.go", SOURCE).unwrap();
        assert_eq!(tree.package(), "p");
        assert_eq!(tree.build_constraints(), ["//go:build integration"]);

        let decls: Vec<_> = tree
            .decls()
            .map(|(_, d)| (d.kind, d.name.clone().unwrap_or_default()))
            .collect();
        assert_eq!(
            decls,
            vec![
                (DeclKind::Function, "helper".to_string()),
                (DeclKind::Type, "fixture".to_string()),
                (DeclKind::Method, "TestMethod".to_string()),
                (DeclKind::Function, "TestAlpha".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_imports() {
        let tree = SyntaxTree::parse("p_test.go", SOURCE).unwrap();
        let imports = tree.imports();
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].path, "fmt");
        assert_eq!(imports[1].name.as_deref(), Some("tst"));
        assert_eq!(imports[1].comment.as_deref(), Some("// aliased"));
        assert_eq!(imports[2].name.as_deref(), Some("_"));
        assert_eq!(imports[2].doc, vec!["// side effects".to_string()]);
        assert_eq!(imports[2].literal, "\"embed\"");
    }

    #[test]
    fn test_comment_groups_split_on_blank_lines() {
        let tree = SyntaxTree::parse("p_test.go", SOURCE).unwrap();
        let groups: Vec<_> = tree
            .comment_ids()
            .map(|id| tree.text(tree.comment(id).span).to_string())
            .collect();
        assert_eq!(
            groups,
            vec![
                "//go:build integration".to_string(),
                "// Package p is documented.".to_string(),
                "// helper does nothing.".to_string(),
                "// TestAlpha checks alpha.\n// More words.".to_string(),
            ]
        );
    }

    #[test]
    fn test_qualifiers_cover_selectors_and_types() {
        let tree = SyntaxTree::parse("p_test.go", SOURCE).unwrap();
        let method = tree
            .decls()
            .find(|(_, d)| d.kind == DeclKind::Method)
            .map(|(_, d)| d)
            .unwrap();
        let found: Vec<_> = method.qualifiers.iter().cloned().collect();
        assert_eq!(found, vec!["fmt".to_string(), "tst".to_string()]);

        let helper = tree.decls().next().map(|(_, d)| d).unwrap();
        assert!(helper.qualifiers.is_empty());
    }

    #[test]
    fn test_syntax_error_is_reported_with_position() {
        let err = SyntaxTree::parse("bad_test.go", "package p\n\nfunc TestX( {\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad_test.go:"), "{msg}");
        assert!(matches!(err, SplitError::ParseError(_)));
    }

    #[test]
    fn test_top_level_statement_rejected() {
        let err = SyntaxTree::parse("bad.go", "package p\n\nx := 1\n").unwrap_err();
        assert!(matches!(err, SplitError::ParseError(_)));
    }

    #[test]
    fn test_package_name_only() {
        assert_eq!(package_name("// doc\npackage foo_test\n").as_deref(), Some("foo_test"));
        assert_eq!(package_name("func x() {}"), None);
    }

    fn qualifiers_of(code: &str, name: &str) -> Vec<String> {
        let tree = SyntaxTree::parse("q_test.go", code).unwrap();
        let (_, decl) = tree
            .decls()
            .find(|(_, d)| d.name.as_deref() == Some(name))
            .unwrap();
        decl.qualifiers.iter().cloned().collect()
    }

    #[test]
    fn test_qualifiers_skip_locally_declared_names() {
        let code = r#"package p

func TestA(t *testing.T) {
	log := newLogger(t)
	log.Info("hi")
	for _, v := range items {
		v.Check()
	}
	if err := run(); err != nil {
		t.Fatal(err.Error())
	}
	switch s := any(1).(type) {
	case fmt.Stringer:
		_ = s.String()
	}
	f := func(os *state) { os.Reset() }
	_ = f
}
"#;
        assert_eq!(qualifiers_of(code, "TestA"), vec!["fmt", "testing"]);
    }

    #[test]
    fn test_qualifiers_respect_block_scope() {
        let code = r#"package p

func TestB(t *testing.T) {
	{
		log := 1
		_ = log
	}
	log.Print("package log again")
	strings := strings.Fields("a b")
	_ = strings
}
"#;
        assert_eq!(qualifiers_of(code, "TestB"), vec!["log", "strings", "testing"]);
    }

    #[test]
    fn test_package_scope_names() {
        let code = "package p\n\nvar a, b = 1, 2\n\nconst (\n\tc = iota\n\t_\n)\n\ntype T struct{}\n\nfunc (T) M() {}\n\nfunc F() {}\n";
        let tree = SyntaxTree::parse("p.go", code).unwrap();
        let declared: Vec<Vec<String>> = tree
            .decls()
            .map(|(_, d)| d.declares.iter().cloned().collect())
            .collect();
        assert_eq!(
            declared,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
                vec!["T".to_string()],
                vec![],
                vec!["F".to_string()],
            ]
        );
    }

    #[test]
    fn test_build_constraint_needs_blank_line_before_package() {
        let tree = SyntaxTree::parse("p_test.go", "//go:build linux\npackage p\n").unwrap();
        assert!(tree.build_constraints().is_empty());

        let tree = SyntaxTree::parse(
            "p_test.go",
            "// +build linux\n\n// Package p is documented.\npackage p\n",
        )
        .unwrap();
        assert_eq!(tree.build_constraints(), ["// +build linux"]);
    }
}

use crate::comments::CommentMap;
use crate::error::{Result, SplitError};
use crate::format::{self, Finisher};
use crate::naming::NamingPolicy;
use crate::syntax::{CommentId, DeclId, SyntaxTree};
use std::path::{Path, PathBuf};

/// One extracted declaration with everything needed to stand alone:
/// the source's package clause, build constraints and imports, plus the
/// comments bound to it
#[derive(Debug, Clone, Copy)]
pub struct OutputUnit<'a> {
    pub tree: &'a SyntaxTree,
    pub decl: DeclId,
    pub comments: &'a [CommentId],
}

impl<'a> OutputUnit<'a> {
    pub fn new(tree: &'a SyntaxTree, comments: &'a CommentMap, decl: DeclId) -> Self {
        Self {
            tree,
            decl,
            comments: comments.comments_for(decl),
        }
    }

    /// Canonical layout with the full source import list
    pub fn render(&self) -> Result<String> {
        format::render_unit(self.tree, self.decl, self.comments)
    }
}

/// A generated file, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedFile {
    pub test_name: String,
    pub file_name: String,
    pub path: PathBuf,
    pub contents: String,
}

impl SynthesizedFile {
    /// Create or overwrite the file
    pub fn write(&self) -> Result<()> {
        std::fs::write(&self.path, &self.contents).map_err(|e| SplitError::io(&self.path, e))?;
        log::info!("wrote {} ({})", self.path.display(), self.test_name);
        Ok(())
    }
}

/// Format, prune and name the file for one extractable declaration
pub fn synthesize(
    tree: &SyntaxTree,
    comments: &CommentMap,
    decl: DeclId,
    naming: &NamingPolicy,
    finisher: &Finisher,
) -> Result<SynthesizedFile> {
    let test_name = tree.decl(decl).name.clone().unwrap_or_default();
    let file_name = naming.file_name(&test_name);

    let formatted = OutputUnit::new(tree, comments, decl).render()?;
    let contents = finisher.finish(&file_name, &formatted)?;

    let dir = tree.path().parent().unwrap_or_else(|| Path::new("."));
    Ok(SynthesizedFile {
        path: dir.join(&file_name),
        test_name,
        file_name,
        contents,
    })
}

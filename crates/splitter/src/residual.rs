use crate::comments::CommentMap;
use crate::error::{Result, SplitError};
use crate::format::{self, Finisher};
use crate::partition::Partition;
use crate::syntax::SyntaxTree;
use std::path::PathBuf;

/// What happens to the source file once its tests are gone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Residual {
    /// Nothing but tests: the file goes away
    Delete(PathBuf),
    /// Retained declarations are written back in place
    Rewrite { path: PathBuf, contents: String },
}

/// Result of applying a [`Residual`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidualOutcome {
    Rewritten(PathBuf),
    Deleted(PathBuf),
    /// Removal is best effort; the split itself already succeeded
    DeleteFailed { path: PathBuf, error: String },
}

impl Residual {
    /// Build the residual of `tree` after extracting `partition.extract`
    pub fn build(
        tree: &SyntaxTree,
        comments: &CommentMap,
        partition: &Partition,
        finisher: &Finisher,
    ) -> Result<Self> {
        let path = tree.path().to_path_buf();
        if partition.retain.is_empty() {
            return Ok(Self::Delete(path));
        }

        let remaining = comments.remaining(tree, &partition.extract);
        let rendered = format::render_residual(tree, &partition.retain, &remaining)?;
        let contents = finisher.finish(&path.display().to_string(), &rendered)?;
        Ok(Self::Rewrite { path, contents })
    }

    pub fn apply(self) -> Result<ResidualOutcome> {
        match self {
            Self::Rewrite { path, contents } => {
                std::fs::write(&path, contents).map_err(|e| SplitError::io(&path, e))?;
                log::info!("rewrote {}", path.display());
                Ok(ResidualOutcome::Rewritten(path))
            }
            Self::Delete(path) => match std::fs::remove_file(&path) {
                Ok(()) => {
                    log::info!("deleted {}", path.display());
                    Ok(ResidualOutcome::Deleted(path))
                }
                Err(e) => {
                    log::warn!("could not delete {}: {e}", path.display());
                    Ok(ResidualOutcome::DeleteFailed {
                        path,
                        error: e.to_string(),
                    })
                }
            },
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// Result type for splitter operations
pub type Result<T> = std::result::Result<T, SplitError>;

/// Errors that can occur while splitting a test file
#[derive(Error, Debug)]
pub enum SplitError {
    /// Failed to parse Go source
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The package could not be loaded or the target does not parse
    #[error("Load error: {0}")]
    LoadError(String),

    /// The target file is not part of the loaded package
    #[error("could not find {target:?}, saw {seen:?}")]
    NotFound { target: PathBuf, seen: Vec<PathBuf> },

    /// A generated file could not be laid out as valid Go
    #[error("Synthesis error for {decl}: {reason}")]
    SynthesisError { decl: String, reason: String },

    /// Import pruning failed for a unit
    #[error("Import resolution error in {file}: {reason}")]
    ImportResolutionError { file: String, reason: String },

    /// Reading or writing a file failed
    #[error("IO error on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl SplitError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::LoadError(msg.into())
    }

    /// Create a synthesis error for the named declaration
    pub fn synthesis(decl: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SynthesisError {
            decl: decl.into(),
            reason: reason.into(),
        }
    }

    /// Create an import resolution error for the named file
    pub fn import_resolution(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImportResolutionError {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Attach a path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_every_inspected_path() {
        let err = SplitError::NotFound {
            target: PathBuf::from("/pkg/missing_test.go"),
            seen: vec![PathBuf::from("/pkg/a.go"), PathBuf::from("/pkg/a_test.go")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/pkg/missing_test.go"));
        assert!(msg.contains("/pkg/a.go"));
        assert!(msg.contains("/pkg/a_test.go"));
    }
}

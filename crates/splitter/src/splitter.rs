use crate::comments::CommentMap;
use crate::config::SplitConfig;
use crate::error::Result;
use crate::format::{Finisher, Gofmt};
use crate::naming::NamingPolicy;
use crate::partition::Partition;
use crate::resolver::{self, PackageLoader};
use crate::residual::{Residual, ResidualOutcome};
use crate::synthesize::synthesize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Progress of one split, for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitState {
    Loaded,
    Partitioned,
    Extracting { index: usize, total: usize },
    ResidualRewritten,
    ResidualDeleted,
}

impl fmt::Display for SplitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Partitioned => write!(f, "partitioned"),
            Self::Extracting { index, total } => write!(f, "extracting {index}/{total}"),
            Self::ResidualRewritten => write!(f, "residual rewritten"),
            Self::ResidualDeleted => write!(f, "residual deleted"),
        }
    }
}

/// What a completed split did on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub package_id: String,
    pub source: PathBuf,
    /// Generated files in declaration order
    pub written: Vec<PathBuf>,
    pub residual: ResidualOutcome,
}

/// Splits one Go test file into one file per test function
pub struct Splitter {
    config: SplitConfig,
    loader: Box<dyn PackageLoader>,
}

impl Splitter {
    /// Create a splitter using the loader selected in `config`
    pub fn new(config: SplitConfig) -> Result<Self> {
        let loader = resolver::loader_for(&config);
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: SplitConfig, loader: Box<dyn PackageLoader>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, loader })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Run the whole pipeline for `file`, a member of `package`.
    ///
    /// Generated files are written one at a time in declaration order and
    /// the first error stops the run; files written before it stay on disk.
    pub fn split(&self, package: &str, file: impl AsRef<Path>) -> Result<SplitReport> {
        let resolved = resolver::resolve(self.loader.as_ref(), package, file.as_ref())?;
        let tree = &resolved.tree;
        trace(tree.path(), SplitState::Loaded);

        let comments = CommentMap::new(tree);
        let partition = Partition::new(tree, &self.config.test_prefix);
        trace(tree.path(), SplitState::Partitioned);
        log::debug!(
            "{}: {} to extract, {} to retain",
            tree.path().display(),
            partition.extract.len(),
            partition.retain.len()
        );
        if partition.is_empty() {
            log::info!(
                "no functions starting with {:?} in {}",
                self.config.test_prefix,
                tree.path().display()
            );
        }

        let naming = NamingPolicy::from_config(&self.config);
        let finisher = Finisher::new(resolved.scope.clone(), Gofmt::from_config(&self.config));
        let total = partition.extract.len();
        let mut written = Vec::with_capacity(total);
        for (i, decl) in partition.extract.iter().enumerate() {
            trace(tree.path(), SplitState::Extracting { index: i + 1, total });
            let file = synthesize(tree, &comments, *decl, &naming, &finisher)?;
            file.write()?;
            written.push(file.path);
        }

        let residual = Residual::build(tree, &comments, &partition, &finisher)?.apply()?;
        match &residual {
            ResidualOutcome::Rewritten(_) => trace(tree.path(), SplitState::ResidualRewritten),
            ResidualOutcome::Deleted(_) | ResidualOutcome::DeleteFailed { .. } => {
                trace(tree.path(), SplitState::ResidualDeleted);
            }
        }

        Ok(SplitReport {
            package_id: resolved.package_id,
            source: tree.path().to_path_buf(),
            written,
            residual,
        })
    }
}

fn trace(path: &Path, state: SplitState) {
    log::debug!("{}: {state}", path.display());
}

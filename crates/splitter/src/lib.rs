//! # gotestsplit splitter
//!
//! Splits one Go test file into standalone files, one per top-level test
//! function, leaving every other declaration behind in the original file.
//!
//! ## Architecture
//!
//! ```text
//! (package, file)
//!     │
//!     ├──> Source Resolver (go list / directory scan → SyntaxTree)
//!     │
//!     ├──> Comment Associator (comment group → declaration)
//!     │
//!     ├──> Declaration Partitioner (TestXxx funcs vs. the rest)
//!     │
//!     ├──> per extracted test
//!     │    ├─> Name Deriver ({base}_{name}_test.go)
//!     │    └─> File Synthesizer (layout → import pruning → gofmt → write)
//!     │
//!     └──> Residual Rewriter (rewrite or delete the original)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use gotestsplit_splitter::{SplitConfig, Splitter};
//!
//! let config = SplitConfig {
//!     output_base: "split".to_string(),
//!     ..SplitConfig::default()
//! };
//! let splitter = Splitter::new(config)?;
//! let report = splitter.split("./...", "pkg/foo_test.go")?;
//! for path in &report.written {
//!     println!("wrote {}", path.display());
//! }
//! # Ok::<(), gotestsplit_splitter::SplitError>(())
//! ```

mod comments;
mod config;
mod error;
mod format;
mod imports;
mod naming;
mod partition;
mod residual;
mod resolver;
mod splitter;
mod synthesize;
mod syntax;

pub use comments::CommentMap;
pub use config::{Casing, FormatterKind, LoaderKind, SplitConfig};
pub use error::{Result, SplitError};
pub use format::{Finisher, Gofmt};
pub use imports::PackageScope;
pub use naming::{snake_case, NamingPolicy};
pub use partition::Partition;
pub use residual::{Residual, ResidualOutcome};
pub use resolver::{
    loader_for, resolve, AutoLoader, DirectoryLoader, GoListLoader, LoadedPackage, PackageLoader,
    ResolvedSource,
};
pub use splitter::{SplitReport, SplitState, Splitter};
pub use synthesize::{synthesize, OutputUnit, SynthesizedFile};
pub use syntax::{
    CommentGroup, CommentId, DeclId, DeclKind, Declaration, ImportSpec, Item, ItemKind, Span,
    SyntaxTree, TEST_FILE_SUFFIX,
};

use crate::syntax::{DeclId, SyntaxTree};

/// Top-level declarations split into those moving out and those staying
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Test entry points, in source order
    pub extract: Vec<DeclId>,
    /// Everything else, in source order
    pub retain: Vec<DeclId>,
}

impl Partition {
    /// Classify every declaration of `tree`.
    ///
    /// Only `func` declarations (methods included) whose name starts with
    /// `prefix` are extracted; types, vars and consts always stay behind.
    pub fn new(tree: &SyntaxTree, prefix: &str) -> Self {
        let mut partition = Self::default();
        for (id, decl) in tree.decls() {
            let is_test = decl.kind.is_func()
                && decl
                    .name
                    .as_deref()
                    .is_some_and(|name| name.starts_with(prefix));
            if is_test {
                partition.extract.push(id);
            } else {
                partition.retain.push(id);
            }
        }
        partition
    }

    pub fn is_empty(&self) -> bool {
        self.extract.is_empty()
    }
}

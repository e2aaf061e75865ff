use crate::syntax::{CommentId, DeclId, Item, ItemKind, SyntaxTree};
use std::collections::{BTreeMap, BTreeSet};

/// Binding of top-level comment groups to the declarations they belong to.
///
/// A group binds to the item before it when it starts on that item's last
/// row, or on the row right after it and is followed by a blank line, or when
/// it ends the file. Otherwise it binds to the item after it. Groups that end
/// up on the package clause or an import declaration stay unbound.
#[derive(Debug, Clone, Default)]
pub struct CommentMap {
    bindings: BTreeMap<DeclId, Vec<CommentId>>,
    owner: BTreeMap<CommentId, DeclId>,
}

impl CommentMap {
    pub fn new(tree: &SyntaxTree) -> Self {
        let items = tree.items();
        let mut map = Self::default();

        for (idx, item) in items.iter().enumerate() {
            let ItemKind::Comment(comment) = item.kind else {
                continue;
            };

            let prev = items[..idx]
                .iter()
                .rev()
                .find(|i| !matches!(i.kind, ItemKind::Comment(_)));
            let next = items[idx + 1..]
                .iter()
                .find(|i| !matches!(i.kind, ItemKind::Comment(_)));

            let target = associate(item, prev, next);
            if let Some(ItemKind::Decl(decl)) = target.map(|i| i.kind) {
                map.bindings.entry(decl).or_default().push(comment);
                map.owner.insert(comment, decl);
            }
        }

        map
    }

    /// Comment groups bound to a declaration, in source order
    pub fn comments_for(&self, decl: DeclId) -> &[CommentId] {
        self.bindings.get(&decl).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Declaration a comment group is bound to, if any
    pub fn owner(&self, comment: CommentId) -> Option<DeclId> {
        self.owner.get(&comment).copied()
    }

    pub fn is_bound(&self, comment: CommentId) -> bool {
        self.owner.contains_key(&comment)
    }

    /// Every comment group of the tree except those bound to `removed`
    pub fn remaining(&self, tree: &SyntaxTree, removed: &[DeclId]) -> BTreeSet<CommentId> {
        let removed: BTreeSet<DeclId> = removed.iter().copied().collect();
        tree.comment_ids()
            .filter(|id| !matches!(self.owner(*id), Some(decl) if removed.contains(&decl)))
            .collect()
    }
}

fn associate<'a>(comment: &Item, prev: Option<&'a Item>, next: Option<&'a Item>) -> Option<&'a Item> {
    let group = comment.span;

    if let Some(p) = prev {
        let same_row = p.span.end_row == group.start_row;
        let trails_with_gap = p.span.end_row + 1 == group.start_row
            && next.is_some_and(|q| group.end_row + 1 < q.span.start_row);
        if same_row || trails_with_gap || next.is_none() {
            return Some(p);
        }
    }

    next
}

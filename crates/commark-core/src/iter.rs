//! Document-order traversal with enter/exit events.
//!
//! [`Walker`] is a cursor that does not borrow the tree, so callers can edit
//! the tree between steps. [`Traverse`] wraps a walker and a shared borrow for
//! use as a regular [`Iterator`].
//!
//! Editing the later siblings of the node just returned is unsupported; the
//! walker already decided where to go next. Capture the next handle first.

use crate::error::EditError;
use crate::tree::{NodeId, Tree};

/// Whether traversal is entering or leaving a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Enter,
    Exit,
}

/// Resumable depth-first cursor over the subtree of a fixed root.
#[derive(Debug, Clone)]
pub struct Walker {
    root: NodeId,
    next: Option<(NodeId, EventType)>,
    current: Option<(NodeId, EventType)>,
}

impl Walker {
    /// Start a traversal at `root`; the first event is `(root, Enter)`.
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            next: Some((root, EventType::Enter)),
            current: None,
        }
    }

    /// The fixed root of this traversal.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The most recently returned event.
    pub fn current(&self) -> Option<(NodeId, EventType)> {
        self.current
    }

    /// Advance and return the next event, or `None` when done.
    pub fn next(&mut self, tree: &Tree) -> Option<(NodeId, EventType)> {
        let (node, event) = self.next?;
        if tree.get(node).is_none() {
            self.next = None;
            self.current = None;
            return None;
        }
        self.current = Some((node, event));
        self.next = self.successor(tree, node, event);
        self.current
    }

    fn successor(&self, tree: &Tree, node: NodeId, event: EventType) -> Option<(NodeId, EventType)> {
        if event == EventType::Enter {
            let leaf = tree.kind(node).is_some_and(|k| k.is_leaf());
            return match tree.first_child(node) {
                Some(child) if !leaf => Some((child, EventType::Enter)),
                _ => Some((node, EventType::Exit)),
            };
        }
        if node == self.root {
            return None;
        }
        if let Some(sibling) = tree.next(node) {
            return Some((sibling, EventType::Enter));
        }
        tree.parent(node).map(|p| (p, EventType::Exit))
    }

    /// Resume as if `(node, event)` had just been returned.
    ///
    /// Fails with [`EditError::OutsideRoot`] if `node` is not in the
    /// walker's subtree.
    pub fn reset(&mut self, tree: &Tree, node: NodeId, event: EventType) -> Result<(), EditError> {
        if tree.get(node).is_none() {
            return Err(EditError::StaleHandle);
        }
        if !tree.is_ancestor_or_self(self.root, node) {
            return Err(EditError::OutsideRoot);
        }
        self.resume_at(tree, node, event);
        Ok(())
    }

    /// [`Walker::reset`] for a node already returned by this walker.
    pub(crate) fn resume_at(&mut self, tree: &Tree, node: NodeId, event: EventType) {
        self.current = Some((node, event));
        self.next = self.successor(tree, node, event);
    }
}

/// Borrowing iterator over `(node, event)` pairs.
pub struct Traverse<'a> {
    tree: &'a Tree,
    walker: Walker,
}

impl<'a> Traverse<'a> {
    pub(crate) fn new(tree: &'a Tree, walker: Walker) -> Self {
        Self { tree, walker }
    }

    /// Skip the rest of `node`'s subtree; the next event is `(node, Exit)`'s
    /// successor.
    pub fn skip_children(&mut self, node: NodeId) -> Result<(), EditError> {
        self.walker.reset(self.tree, node, EventType::Exit)
    }
}

impl Iterator for Traverse<'_> {
    type Item = (NodeId, EventType);

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next(self.tree)
    }
}

//! Arena-backed document tree with checked structural edits.
//!
//! Nodes live in a [`Tree`] and are addressed by [`NodeId`] handles. A node's
//! child list is the only ownership relation; parent and sibling links are
//! plain handles. Freed slots are never reused, so a handle to a freed node
//! stays stale forever instead of aliasing a new node.
//!
//! ```rust
//! use commark_core::{NodeValue, Tree};
//!
//! let mut tree = Tree::new();
//! let para = tree.new_node(NodeValue::Paragraph);
//! let text = tree.new_node(NodeValue::text("hello"));
//! tree.append_child(para, text).unwrap();
//! tree.append_child(tree.root(), para).unwrap();
//! assert_eq!(tree.first_child(tree.root()), Some(para));
//! ```

use crate::ast::{ListDelim, ListMarker, ListType, NodeCustom, NodeKind, NodeLink, NodeValue};
use crate::error::EditError;
use crate::iter::{Traverse, Walker};
use crate::span::SourcePos;

/// Handle to a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Index of the node's slot in its tree.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One AST element and its links.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) value: NodeValue,
    pub(crate) sourcepos: Option<SourcePos>,
    pub(crate) user_data: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    // Block parser scratch state.
    pub(crate) content: String,
    pub(crate) open: bool,
    pub(crate) last_line_blank: bool,
    pub(crate) marker: Option<ListMarker>,
}

impl Node {
    fn new(value: NodeValue) -> Self {
        Self {
            value,
            sourcepos: None,
            user_data: 0,
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
            content: String::new(),
            open: false,
            last_line_blank: false,
            marker: None,
        }
    }

    /// The node's kind and payload.
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// The node's kind.
    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    /// Source span, present when the parser tracked positions.
    pub fn sourcepos(&self) -> Option<SourcePos> {
        self.sourcepos
    }
}

/// An AST: an arena of nodes plus the handle of its root document.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding an empty document.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeValue::Document))],
            root: NodeId(0),
        }
    }

    /// The document node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Whether the document has no children.
    pub fn is_empty(&self) -> bool {
        self.first_child(self.root).is_none()
    }

    /// Create a new, unattached node.
    pub fn new_node(&mut self, value: NodeValue) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(value)));
        id
    }

    /// Access a node, or `None` if the handle is stale.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn live(&self, id: NodeId) -> Result<&Node, EditError> {
        self.get(id).ok_or(EditError::StaleHandle)
    }

    fn live_mut(&mut self, id: NodeId) -> Result<&mut Node, EditError> {
        self.get_mut(id).ok_or(EditError::StaleHandle)
    }

    /// Infallible access for nodes known to be live; parser and renderer
    /// internals only ever hold handles they obtained from the tree.
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => unreachable!("stale node handle {id:?} used internally"),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => unreachable!("stale node handle {id:?} used internally"),
        }
    }

    /// The node's kind and payload.
    pub fn value(&self, id: NodeId) -> Option<&NodeValue> {
        self.get(id).map(|n| &n.value)
    }

    /// The node's kind.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(Node::kind)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next
    }

    pub fn previous(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev
    }

    /// Iterate over the direct children of a node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.first_child(id), move |&c| self.next(c))
    }

    /// Whether `ancestor` is `id` or lies on its parent chain.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    /// Depth-first traversal of the subtree rooted at `root`.
    pub fn traverse(&self, root: NodeId) -> Traverse<'_> {
        Traverse::new(self, Walker::new(root))
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    fn check_insertable(&self, parent_kind: NodeKind, anchor: NodeId, n: NodeId) -> Result<(), EditError> {
        let node = self.live(n)?;
        if node.parent.is_some() || n == self.root {
            return Err(EditError::AlreadyAttached);
        }
        if self.is_ancestor_or_self(n, anchor) {
            return Err(EditError::Cycle);
        }
        let child = node.kind();
        if !parent_kind.can_contain(child) {
            return Err(EditError::InvalidNesting {
                parent: parent_kind,
                child,
            });
        }
        Ok(())
    }

    /// Detach a node and its subtree from its parent.
    ///
    /// Unlinking a node that has no parent is a no-op.
    pub fn unlink(&mut self, id: NodeId) -> Result<(), EditError> {
        self.live(id)?;
        self.detach(id);
        Ok(())
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev, n.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => {
                if let Some(par) = parent {
                    self.node_mut(par).first_child = next;
                }
            }
        }
        match next {
            Some(nx) => self.node_mut(nx).prev = prev,
            None => {
                if let Some(par) = parent {
                    self.node_mut(par).last_child = prev;
                }
            }
        }
        let n = self.node_mut(id);
        n.parent = None;
        n.prev = None;
        n.next = None;
    }

    /// Attach unattached `n` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, n: NodeId) -> Result<(), EditError> {
        let kind = self.live(parent)?.kind();
        self.check_insertable(kind, parent, n)?;
        self.attach_last(parent, n);
        Ok(())
    }

    /// Attach unattached `n` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, n: NodeId) -> Result<(), EditError> {
        let kind = self.live(parent)?.kind();
        self.check_insertable(kind, parent, n)?;
        let old_first = self.node(parent).first_child;
        {
            let node = self.node_mut(n);
            node.parent = Some(parent);
            node.next = old_first;
        }
        match old_first {
            Some(f) => self.node_mut(f).prev = Some(n),
            None => self.node_mut(parent).last_child = Some(n),
        }
        self.node_mut(parent).first_child = Some(n);
        Ok(())
    }

    /// Attach unattached `n` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, n: NodeId) -> Result<(), EditError> {
        let parent = self.live(sibling)?.parent.ok_or(EditError::NotAttached)?;
        let kind = self.node(parent).kind();
        self.check_insertable(kind, sibling, n)?;
        let prev = self.node(sibling).prev;
        {
            let node = self.node_mut(n);
            node.parent = Some(parent);
            node.prev = prev;
            node.next = Some(sibling);
        }
        self.node_mut(sibling).prev = Some(n);
        match prev {
            Some(p) => self.node_mut(p).next = Some(n),
            None => self.node_mut(parent).first_child = Some(n),
        }
        Ok(())
    }

    /// Attach unattached `n` immediately after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, n: NodeId) -> Result<(), EditError> {
        let parent = self.live(sibling)?.parent.ok_or(EditError::NotAttached)?;
        let kind = self.node(parent).kind();
        self.check_insertable(kind, sibling, n)?;
        self.link_after(sibling, n);
        Ok(())
    }

    /// Put unattached `new` where attached `old` is, detaching `old`.
    ///
    /// `old` stays alive and may be reattached or freed by the caller.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), EditError> {
        self.insert_before(old, new)?;
        self.detach(old);
        Ok(())
    }

    /// Dispose of an unattached node and its whole subtree.
    pub fn free(&mut self, id: NodeId) -> Result<(), EditError> {
        let node = self.live(id)?;
        if node.parent.is_some() || id == self.root {
            return Err(EditError::AlreadyAttached);
        }
        self.release(id);
        Ok(())
    }

    /// Unlink and drop a subtree without checks.
    pub(crate) fn remove(&mut self, id: NodeId) {
        self.detach(id);
        self.release(id);
    }

    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let mut child = self.node(cur).first_child;
            while let Some(c) = child {
                stack.push(c);
                child = self.node(c).next;
            }
            self.nodes[cur.0] = None;
        }
    }

    /// Append without nesting checks; the parser guarantees validity.
    pub(crate) fn attach_last(&mut self, parent: NodeId, n: NodeId) {
        let old_last = self.node(parent).last_child;
        {
            let node = self.node_mut(n);
            node.parent = Some(parent);
            node.prev = old_last;
            node.next = None;
        }
        match old_last {
            Some(l) => self.node_mut(l).next = Some(n),
            None => self.node_mut(parent).first_child = Some(n),
        }
        self.node_mut(parent).last_child = Some(n);
    }

    pub(crate) fn link_after(&mut self, sibling: NodeId, n: NodeId) {
        let (parent, next) = {
            let s = self.node(sibling);
            (s.parent, s.next)
        };
        {
            let node = self.node_mut(n);
            node.parent = parent;
            node.prev = Some(sibling);
            node.next = next;
        }
        self.node_mut(sibling).next = Some(n);
        match next {
            Some(nx) => self.node_mut(nx).prev = Some(n),
            None => {
                if let Some(p) = parent {
                    self.node_mut(p).last_child = Some(n);
                }
            }
        }
    }

    /// Merge runs of adjacent text nodes within a subtree.
    pub fn consolidate_text_nodes(&mut self, root: NodeId) -> Result<(), EditError> {
        self.live(root)?;
        self.merge_text_runs(root);
        Ok(())
    }

    /// [`Tree::consolidate_text_nodes`] for a root known to be live.
    pub(crate) fn merge_text_runs(&mut self, root: NodeId) {
        let mut walker = Walker::new(root);
        while let Some((id, event)) = walker.next(self) {
            if event != crate::iter::EventType::Enter || self.node(id).kind() != NodeKind::Text {
                continue;
            }
            while let Some(next) = self.node(id).next {
                let merged = match &self.node(next).value {
                    NodeValue::Text(s) => s.clone(),
                    _ => break,
                };
                if let NodeValue::Text(s) = &mut self.node_mut(id).value {
                    s.push_str(&merged);
                }
                self.remove(next);
            }
        }
    }

    // ------------------------------------------------------------------
    // Field accessors
    // ------------------------------------------------------------------

    fn check_value(field: &'static str, value: &str) -> Result<(), EditError> {
        if value.contains('\0') {
            return Err(EditError::InvalidValue {
                field,
                reason: "contains a NUL character",
            });
        }
        Ok(())
    }

    /// Literal content of Text, Code, HtmlInline, CodeBlock and HtmlBlock nodes.
    pub fn literal(&self, id: NodeId) -> Result<&str, EditError> {
        let node = self.live(id)?;
        node.value
            .literal()
            .ok_or_else(|| EditError::mismatch("literal", node.kind()))
    }

    pub fn set_literal(&mut self, id: NodeId, literal: &str) -> Result<(), EditError> {
        Self::check_value("literal", literal)?;
        let node = self.live_mut(id)?;
        let kind = node.kind();
        let slot = node
            .value
            .literal_mut()
            .ok_or_else(|| EditError::mismatch("set_literal", kind))?;
        *slot = literal.to_owned();
        Ok(())
    }

    pub fn heading_level(&self, id: NodeId) -> Result<u8, EditError> {
        match &self.live(id)?.value {
            NodeValue::Heading(h) => Ok(h.level),
            other => Err(EditError::mismatch("heading_level", other.kind())),
        }
    }

    pub fn set_heading_level(&mut self, id: NodeId, level: u8) -> Result<(), EditError> {
        if !(1..=6).contains(&level) {
            return Err(EditError::InvalidValue {
                field: "heading_level",
                reason: "must be between 1 and 6",
            });
        }
        match &mut self.live_mut(id)?.value {
            NodeValue::Heading(h) => {
                h.level = level;
                Ok(())
            }
            other => Err(EditError::mismatch("set_heading_level", other.kind())),
        }
    }

    fn list_mut(&mut self, id: NodeId, operation: &'static str) -> Result<&mut crate::ast::NodeList, EditError> {
        match &mut self.live_mut(id)?.value {
            NodeValue::List(l) => Ok(l),
            other => Err(EditError::mismatch(operation, other.kind())),
        }
    }

    fn list(&self, id: NodeId, operation: &'static str) -> Result<&crate::ast::NodeList, EditError> {
        match &self.live(id)?.value {
            NodeValue::List(l) => Ok(l),
            other => Err(EditError::mismatch(operation, other.kind())),
        }
    }

    pub fn list_type(&self, id: NodeId) -> Result<ListType, EditError> {
        Ok(self.list(id, "list_type")?.list_type)
    }

    pub fn set_list_type(&mut self, id: NodeId, list_type: ListType) -> Result<(), EditError> {
        let list = self.list_mut(id, "set_list_type")?;
        list.list_type = list_type;
        if list_type == ListType::Bullet {
            list.delimiter = ListDelim::None;
        } else if list.delimiter == ListDelim::None {
            list.delimiter = ListDelim::Period;
        }
        Ok(())
    }

    pub fn list_delim(&self, id: NodeId) -> Result<ListDelim, EditError> {
        Ok(self.list(id, "list_delim")?.delimiter)
    }

    pub fn set_list_delim(&mut self, id: NodeId, delimiter: ListDelim) -> Result<(), EditError> {
        self.list_mut(id, "set_list_delim")?.delimiter = delimiter;
        Ok(())
    }

    pub fn list_start(&self, id: NodeId) -> Result<usize, EditError> {
        Ok(self.list(id, "list_start")?.start)
    }

    pub fn set_list_start(&mut self, id: NodeId, start: usize) -> Result<(), EditError> {
        self.list_mut(id, "set_list_start")?.start = start;
        Ok(())
    }

    pub fn list_tight(&self, id: NodeId) -> Result<bool, EditError> {
        Ok(self.list(id, "list_tight")?.tight)
    }

    pub fn set_list_tight(&mut self, id: NodeId, tight: bool) -> Result<(), EditError> {
        self.list_mut(id, "set_list_tight")?.tight = tight;
        Ok(())
    }

    pub fn fence_info(&self, id: NodeId) -> Result<&str, EditError> {
        match &self.live(id)?.value {
            NodeValue::CodeBlock(c) => Ok(&c.info),
            other => Err(EditError::mismatch("fence_info", other.kind())),
        }
    }

    pub fn set_fence_info(&mut self, id: NodeId, info: &str) -> Result<(), EditError> {
        Self::check_value("fence_info", info)?;
        match &mut self.live_mut(id)?.value {
            NodeValue::CodeBlock(c) => {
                c.info = info.to_owned();
                Ok(())
            }
            other => Err(EditError::mismatch("set_fence_info", other.kind())),
        }
    }

    fn link(&self, id: NodeId, operation: &'static str) -> Result<&NodeLink, EditError> {
        match &self.live(id)?.value {
            NodeValue::Link(l) | NodeValue::Image(l) => Ok(l),
            other => Err(EditError::mismatch(operation, other.kind())),
        }
    }

    fn link_mut(&mut self, id: NodeId, operation: &'static str) -> Result<&mut NodeLink, EditError> {
        match &mut self.live_mut(id)?.value {
            NodeValue::Link(l) | NodeValue::Image(l) => Ok(l),
            other => Err(EditError::mismatch(operation, other.kind())),
        }
    }

    pub fn url(&self, id: NodeId) -> Result<&str, EditError> {
        Ok(&self.link(id, "url")?.url)
    }

    pub fn set_url(&mut self, id: NodeId, url: &str) -> Result<(), EditError> {
        Self::check_value("url", url)?;
        self.link_mut(id, "set_url")?.url = url.to_owned();
        Ok(())
    }

    pub fn title(&self, id: NodeId) -> Result<&str, EditError> {
        Ok(&self.link(id, "title")?.title)
    }

    pub fn set_title(&mut self, id: NodeId, title: &str) -> Result<(), EditError> {
        Self::check_value("title", title)?;
        self.link_mut(id, "set_title")?.title = title.to_owned();
        Ok(())
    }

    fn custom(&self, id: NodeId, operation: &'static str) -> Result<&NodeCustom, EditError> {
        match &self.live(id)?.value {
            NodeValue::CustomBlock(c) | NodeValue::CustomInline(c) => Ok(c),
            other => Err(EditError::mismatch(operation, other.kind())),
        }
    }

    fn custom_mut(&mut self, id: NodeId, operation: &'static str) -> Result<&mut NodeCustom, EditError> {
        match &mut self.live_mut(id)?.value {
            NodeValue::CustomBlock(c) | NodeValue::CustomInline(c) => Ok(c),
            other => Err(EditError::mismatch(operation, other.kind())),
        }
    }

    pub fn on_enter(&self, id: NodeId) -> Result<&str, EditError> {
        Ok(&self.custom(id, "on_enter")?.on_enter)
    }

    pub fn set_on_enter(&mut self, id: NodeId, on_enter: &str) -> Result<(), EditError> {
        Self::check_value("on_enter", on_enter)?;
        self.custom_mut(id, "set_on_enter")?.on_enter = on_enter.to_owned();
        Ok(())
    }

    pub fn on_exit(&self, id: NodeId) -> Result<&str, EditError> {
        Ok(&self.custom(id, "on_exit")?.on_exit)
    }

    pub fn set_on_exit(&mut self, id: NodeId, on_exit: &str) -> Result<(), EditError> {
        Self::check_value("on_exit", on_exit)?;
        self.custom_mut(id, "set_on_exit")?.on_exit = on_exit.to_owned();
        Ok(())
    }

    /// Source span of a block node parsed with position tracking.
    pub fn sourcepos(&self, id: NodeId) -> Option<SourcePos> {
        self.get(id)?.sourcepos
    }

    /// The opaque host value attached to a node; never read by this crate.
    pub fn user_data(&self, id: NodeId) -> Result<usize, EditError> {
        Ok(self.live(id)?.user_data)
    }

    pub fn set_user_data(&mut self, id: NodeId, data: usize) -> Result<(), EditError> {
        self.live_mut(id)?.user_data = data;
        Ok(())
    }
}

//! In-process structured-content tree.
//!
//! An arena of element and text nodes with DOM-like operations and a single
//! document-level selection. Removed subtrees are released and their slots
//! reused. Ids carry a generation, so looking up a released id yields `None`
//! even after its slot has been handed out again.

pub mod html;
mod leaves;
mod tag;

pub use leaves::{Descendants, TextLeaves};
pub use tag::{BlockKind, HeadingLevel, Tag};

use smol_str::SmolStr;

/// Handle to a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// A caret position with DOM semantics.
///
/// Inside a text node `offset` counts chars; inside an element it is a child
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

impl Caret {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// An element: tag plus attributes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    attrs: Vec<(SmolStr, String)>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.attrs.push((SmolStr::new(name.to_ascii_lowercase()), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

/// The document: node arena, root element and selection.
#[derive(Debug, Clone)]
pub struct Dom {
    entries: Vec<Entry>,
    /// Indices of released entries.
    free: Vec<u32>,
    root: NodeId,
    selection: Option<Caret>,
    focused: Option<NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create a document with an empty `body` root.
    pub fn new() -> Self {
        Self::with_root(Tag::Other(SmolStr::new_static("body")))
    }

    pub(crate) fn with_root(tag: Tag) -> Self {
        let root_slot = Slot {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element(Element::new(tag)),
        };
        Self {
            entries: vec![Entry {
                generation: 0,
                slot: Some(root_slot),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            selection: None,
            focused: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.entries
            .get(id.index())
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.slot.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.entries
            .get_mut(id.index())
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.slot.as_mut())
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let slot = Slot {
            parent: None,
            children: Vec::new(),
            kind,
        };
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.slot = Some(slot);
            return NodeId {
                index,
                generation: entry.generation,
            };
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            slot: Some(slot),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Number of slots the arena has allocated, live or released.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    // === Construction ===

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.alloc(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    // === Inspection ===

    /// Whether `id` still names a live node.
    pub fn exists(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.slot(id).map(|s| &s.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.slot_mut(id)?.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&Tag> {
        self.element(id).map(|e| &e.tag)
    }

    pub fn block_kind(&self, id: NodeId) -> Option<BlockKind> {
        self.tag(id).and_then(Tag::block_kind)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(t) => Some(t.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match &mut self.slot_mut(id)?.kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        idx.checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    /// Iterate `id` and then each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.exists(id).then_some(id), move |&n| self.parent(n))
    }

    /// Inclusive containment check.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_leaves(id).map(|(_, text)| text).collect()
    }

    /// Length in chars of [`Dom::text_content`].
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text_leaves(id).map(|(_, text)| text.chars().count()).sum()
    }

    /// Lazy, restartable sequence of the text nodes under `id`.
    pub fn text_leaves(&self, id: NodeId) -> TextLeaves<'_> {
        TextLeaves::new(self, id)
    }

    /// Preorder walk of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants::new(self, id)
    }

    /// No children, or only whitespace text children.
    pub fn is_blank(&self, id: NodeId) -> bool {
        self.children(id)
            .iter()
            .all(|&c| self.text(c).is_some_and(|t| t.trim().is_empty()))
    }

    /// The element holds nothing but a single `<br>`.
    pub fn is_placeholder(&self, id: NodeId) -> bool {
        matches!(self.children(id), [only] if self.tag(*only) == Some(&Tag::LineBreak))
    }

    /// Nearest ancestor-or-self of `node` strictly inside `boundary` whose
    /// kind can host a caret.
    pub fn enclosing_block(&self, node: NodeId, boundary: NodeId) -> Option<NodeId> {
        if !self.contains(boundary, node) {
            return None;
        }
        self.ancestors(node)
            .take_while(|&n| n != boundary)
            .find(|&n| self.block_kind(n).is_some_and(BlockKind::hosts_caret))
    }

    /// The child of `boundary` that contains `node`.
    pub fn top_level_ancestor(&self, node: NodeId, boundary: NodeId) -> Option<NodeId> {
        self.ancestors(node)
            .find(|&n| self.parent(n) == Some(boundary))
    }

    /// Depth-first search from the root for an element with a matching `id` attribute.
    pub fn element_by_id(&self, needle: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.element(node).and_then(|e| e.attr("id")) == Some(needle) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    /// Child indices leading from `ancestor` down to `node`. Empty when they
    /// are the same node, `None` when `node` is not under `ancestor`.
    pub fn path_from(&self, ancestor: NodeId, node: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = node;
        while current != ancestor {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    /// Follow child indices down from `ancestor`.
    pub fn node_at_path(&self, ancestor: NodeId, path: &[usize]) -> Option<NodeId> {
        let mut current = ancestor;
        if !self.exists(current) {
            return None;
        }
        for &index in path {
            current = *self.children(current).get(index)?;
        }
        Some(current)
    }

    // === Mutation ===

    /// Detach `child` from its current parent without releasing it.
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.retain(|&c| c != child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = None;
        }
    }

    /// Insert `child` into `parent` at `index` (clamped), detaching it first.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.exists(parent) || !self.exists(child) || self.contains(child, parent) {
            tracing::warn!(?parent, ?child, "refusing invalid tree insertion");
            return;
        }
        self.detach(child);
        if let Some(slot) = self.slot_mut(parent) {
            let index = index.min(slot.children.len());
            slot.children.insert(index, child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_at(parent, len, child);
    }

    /// Insert `child` before `reference`, or append when `reference` is `None`
    /// or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let index = reference
            .filter(|&r| self.parent(r) == Some(parent))
            .and_then(|r| self.index_in_parent(r))
            .unwrap_or(self.children(parent).len());
        self.insert_at(parent, index, child);
    }

    /// Detach `node` and release its whole subtree.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let released = self
                .entries
                .get_mut(n.index())
                .filter(|e| e.generation == n.generation)
                .and_then(|e| e.slot.take());
            if let Some(slot) = released {
                self.free.push(n.index);
                stack.extend(slot.children);
            }
        }
    }

    /// Release every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
    }

    /// Replace the children of `id` with a single `<br>` placeholder.
    pub fn reset_to_placeholder(&mut self, id: NodeId) -> NodeId {
        self.clear_children(id);
        let br = self.create_element(Element::new(Tag::LineBreak));
        self.append_child(id, br);
        br
    }

    /// Deep-copy `node` from `src` into this arena, returning the detached copy.
    pub fn import_node(&mut self, src: &Dom, node: NodeId) -> Option<NodeId> {
        let kind = src.kind(node)?.clone();
        let copy = self.alloc(kind);
        for &child in src.children(node) {
            if let Some(child_copy) = self.import_node(src, child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    // === Selection ===

    pub fn selection(&self) -> Option<Caret> {
        self.selection.filter(|c| self.exists(c.node))
    }

    pub fn set_selection(&mut self, caret: Option<Caret>) {
        self.selection = caret;
    }

    pub fn collapse(&mut self, node: NodeId, offset: usize) {
        self.selection = Some(Caret::new(node, offset));
    }

    pub fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|&n| self.exists(n))
    }
}

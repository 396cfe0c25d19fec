//! Per-event conversion decisions.
//!
//! Every content change is inspected once: find the block holding the caret,
//! decide whether its text should be re-read as markup, and if so swap the
//! block for freshly rendered nodes while carrying the caret across by
//! logical offset. Backspace at the start of a formatted block goes the other
//! way and turns the block back into its markup text.
//!
//! Nothing here returns an error. An event that cannot be handled cleanly
//! leaves the document alone.

use crate::actions::{InputType, Key, KeyOutcome};
use crate::config::{RenderOptions, SerializeOptions};
use crate::cursor::{capture_offset, restore_offset};
use crate::dom::{BlockKind, Dom, Element, NodeId, Tag};
use crate::native;
use crate::render::{MarkupRenderer, RenderedBlocks, render_blocks};
use crate::serialize::MarkdownSerializer;
use crate::syntax::{has_trigger, strip_quote_marker};

/// What an event did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing changed.
    NoOp,
    /// A block was replaced by its rendered form.
    ForwardConvert,
    /// A block, or the whole surface, was reset to an empty paragraph.
    ResetEmpty,
    /// A rendered block was turned back into markup text.
    ReverseConvert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    NoOp,
    Forward(NodeId),
    Reset(Option<NodeId>),
}

/// Decides and applies conversions for one editing surface.
#[derive(Debug, Clone)]
pub struct Orchestrator<R> {
    renderer: R,
    render_options: RenderOptions,
    serializer: MarkdownSerializer,
}

impl<R: MarkupRenderer> Orchestrator<R> {
    pub fn new(renderer: R, render_options: RenderOptions, serialize_options: SerializeOptions) -> Self {
        Self {
            renderer,
            render_options,
            serializer: MarkdownSerializer::new(serialize_options).verbatim(),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    /// The serializer used for conversion sources, in verbatim mode.
    pub fn serializer(&self) -> &MarkdownSerializer {
        &self.serializer
    }

    /// Render markup with this orchestrator's renderer and options.
    pub fn render(&self, markup: &str) -> RenderedBlocks {
        render_blocks(&self.renderer, markup, &self.render_options)
    }

    /// A detached `<p dir="…"><br></p>`.
    pub fn default_paragraph(&self, dom: &mut Dom) -> NodeId {
        let p = dom.create_element(
            Element::new(Tag::Paragraph).with_attr("dir", self.render_options.direction),
        );
        dom.reset_to_placeholder(p);
        p
    }

    /// Replace the surface's content with the default paragraph.
    pub fn reset_surface(&self, dom: &mut Dom, surface: NodeId) -> NodeId {
        dom.clear_children(surface);
        let p = self.default_paragraph(dom);
        dom.append_child(surface, p);
        dom.collapse(p, 0);
        p
    }

    // === Content changes ===

    /// Classify a content change without touching the document.
    pub fn classify(&self, dom: &Dom, surface: NodeId, input: &InputType) -> Decision {
        match self.plan(dom, surface, input) {
            Plan::NoOp => Decision::NoOp,
            Plan::Forward(_) => Decision::ForwardConvert,
            Plan::Reset(_) => Decision::ResetEmpty,
        }
    }

    fn plan(&self, dom: &Dom, surface: NodeId, input: &InputType) -> Plan {
        let block = dom
            .selection()
            .and_then(|caret| dom.enclosing_block(caret.node, surface));
        let Some(block) = block else {
            return if dom.is_blank(surface) {
                Plan::Reset(None)
            } else {
                Plan::NoOp
            };
        };

        let text = dom.text_content(block);
        let sole_paragraph = dom.tag(block) == Some(&Tag::Paragraph)
            && matches!(dom.children(surface), [only] if *only == block);
        if sole_paragraph && !has_trigger(&text) {
            if text.trim().is_empty() && !input.is_deletion() {
                return Plan::Reset(Some(block));
            }
            return Plan::NoOp;
        }
        Plan::Forward(block)
    }

    /// Inspect and apply a content change.
    pub fn handle_input(&self, dom: &mut Dom, surface: NodeId, input: &InputType) -> Decision {
        let plan = self.plan(dom, surface, input);
        let decision = match plan {
            Plan::NoOp => Decision::NoOp,
            Plan::Reset(Some(block)) => {
                dom.reset_to_placeholder(block);
                dom.collapse(block, 0);
                Decision::ResetEmpty
            }
            Plan::Reset(None) => {
                self.reset_surface(dom, surface);
                Decision::ResetEmpty
            }
            Plan::Forward(block) => self.forward(dom, surface, block),
        };
        tracing::debug!(target: "markwell::orchestrator", ?input, ?plan, ?decision, "input handled");
        decision
    }

    fn forward(&self, dom: &mut Dom, surface: NodeId, block: NodeId) -> Decision {
        // Lists convert as a whole so sibling items stay in one list.
        let Some(root) = dom.top_level_ancestor(block, surface) else {
            return Decision::NoOp;
        };

        let mut source = self.serializer.serialize((&*dom, root));
        let redundant_marker =
            dom.tag(root) == Some(&Tag::Blockquote) && dom.text_content(root).starts_with('>');
        if redundant_marker {
            source = strip_quote_marker(&source).to_string();
        }

        let rendered = self.render(source.trim());
        if rendered.is_empty() {
            if matches!(dom.children(surface), [only] if *only == root) {
                self.reset_surface(dom, surface);
                return Decision::ResetEmpty;
            }
            return Decision::NoOp;
        }
        if matches_rendered(dom, root, &rendered) {
            return Decision::NoOp;
        }
        // Without a trigger only inline markup may change. A bare leading
        // marker must not become an empty list, heading or quote.
        if !has_trigger(&dom.text_content(block)) && !keeps_structure(dom, root, &rendered) {
            tracing::trace!(target: "markwell::orchestrator", ?root, "untriggered block markup left as text");
            return Decision::NoOp;
        }

        let offset = capture_offset(dom, root, dom.selection());
        let mut last = None;
        for &node in rendered.blocks() {
            if let Some(copy) = dom.import_node(rendered.fragment(), node) {
                dom.insert_before(surface, copy, Some(root));
                last = Some(copy);
            }
        }
        dom.remove(root);

        match last {
            Some(last) => {
                restore_offset(dom, last, offset as isize, surface);
            }
            None => {
                self.reset_surface(dom, surface);
            }
        }
        Decision::ForwardConvert
    }

    // === Keys ===

    /// Handle a key before the platform acts on it.
    pub fn handle_keydown(&self, dom: &mut Dom, surface: NodeId, key: &Key) -> KeyOutcome {
        match key {
            Key::Enter => {
                self.enter(dom, surface);
                KeyOutcome::Handled
            }
            Key::Backspace if self.reverse(dom, surface) => {
                tracing::debug!(
                    target: "markwell::orchestrator",
                    decision = ?Decision::ReverseConvert,
                    "backspace handled"
                );
                KeyOutcome::Handled
            }
            _ => KeyOutcome::PassThrough,
        }
    }

    /// Insert a paragraph natively, then make a new paragraph look like a
    /// rendered one.
    fn enter(&self, dom: &mut Dom, surface: NodeId) {
        native::insert_paragraph(dom, surface);

        let caret = dom.selection();
        let block = caret.and_then(|c| dom.enclosing_block(c.node, surface));
        let paragraph = match block {
            Some(block) if dom.tag(block) == Some(&Tag::Paragraph) => Some(block),
            Some(_) => None,
            None if caret.is_some_and(|c| c.node == surface) => dom
                .last_child(surface)
                .filter(|&last| dom.tag(last) == Some(&Tag::Paragraph)),
            None => None,
        };
        let Some(paragraph) = paragraph else {
            return;
        };

        if let Some(element) = dom.element_mut(paragraph) {
            element.set_attr("dir", self.render_options.direction);
        }
        if dom.is_blank(paragraph) {
            dom.reset_to_placeholder(paragraph);
            dom.collapse(paragraph, 0);
        }
    }

    /// Turn the block at the caret back into markup text, if the caret is at
    /// its very start. Returns whether the key was consumed.
    fn reverse(&self, dom: &mut Dom, surface: NodeId) -> bool {
        let Some(caret) = dom.selection() else {
            return false;
        };
        let Some(inner) = dom.enclosing_block(caret.node, surface) else {
            return false;
        };
        if capture_offset(dom, inner, Some(caret)) != 0 {
            return false;
        }
        // The start of a quote's first block is the start of the quote.
        let block = opening_quote(dom, surface, inner);
        let Some(kind) = dom.block_kind(block) else {
            return false;
        };
        let text = dom.text_content(block);
        if text.is_empty() || dom.is_placeholder(block) {
            return false;
        }
        let eligible = kind.reverses_on_backspace() || kind == BlockKind::Paragraph;
        let Some(parent) = dom.parent(block) else {
            return false;
        };
        if !eligible {
            return false;
        }

        let nested_item = kind == BlockKind::ListItem && parent != surface;
        let markup = if nested_item {
            self.serializer.serialize_children(dom, block)
        } else {
            self.serializer.serialize((&*dom, block))
        };

        // Paragraphs and items with no formatting have nothing to expose;
        // let the platform delete normally.
        if matches!(kind, BlockKind::Paragraph | BlockKind::ListItem) && markup == text {
            return false;
        }

        let text_node = dom.create_text(markup);
        if parent == surface {
            let p = dom.create_element(
                Element::new(Tag::Paragraph).with_attr("dir", self.render_options.direction),
            );
            dom.append_child(p, text_node);
            dom.insert_before(surface, p, Some(block));
            dom.remove(block);
        } else if nested_item {
            dom.clear_children(block);
            dom.append_child(block, text_node);
        } else {
            dom.insert_before(parent, text_node, Some(block));
            dom.remove(block);
        }
        dom.collapse(text_node, 0);
        true
    }
}

/// The outermost blockquote that `block` opens, or `block` itself.
fn opening_quote(dom: &Dom, surface: NodeId, block: NodeId) -> NodeId {
    let mut node = block;
    while let Some(parent) = dom.parent(node) {
        if parent == surface || dom.tag(parent) != Some(&Tag::Blockquote) {
            break;
        }
        let first = dom
            .children(parent)
            .iter()
            .copied()
            .find(|&child| !dom.text(child).is_some_and(|t| t.trim().is_empty()));
        if first != Some(node) {
            break;
        }
        node = parent;
    }
    node
}

/// Whether `rendered` adds no block structure to `root`.
///
/// A paragraph must stay a single paragraph. Other roots may not gain
/// headings, lists or quotes.
fn keeps_structure(dom: &Dom, root: NodeId, rendered: &RenderedBlocks) -> bool {
    let fragment = rendered.fragment();
    if dom.tag(root) == Some(&Tag::Paragraph) {
        return matches!(rendered.blocks(), [only] if fragment.tag(*only) == Some(&Tag::Paragraph));
    }
    let after: usize = rendered
        .blocks()
        .iter()
        .map(|&node| structure_count(fragment, node))
        .sum();
    after <= structure_count(dom, root)
}

fn structure_count(dom: &Dom, node: NodeId) -> usize {
    dom.descendants(node)
        .filter(|&n| {
            matches!(
                dom.block_kind(n),
                Some(BlockKind::Heading(_) | BlockKind::List { .. } | BlockKind::Blockquote)
            )
        })
        .count()
}

/// Whether `root` already is what the renderer produced.
///
/// Trailing whitespace in the last text run is ignored: the renderer trims
/// it, and treating a typed space as a change would delete it.
fn matches_rendered(dom: &Dom, root: NodeId, rendered: &RenderedBlocks) -> bool {
    let target = rendered.html();
    if dom.outer_html(root) == target {
        return true;
    }

    let Some((_, last_text)) = dom.text_leaves(root).last() else {
        return false;
    };
    if last_text.trim_end().len() == last_text.len() {
        return false;
    }

    let mut scratch = Dom::new();
    let Some(copy) = scratch.import_node(dom, root) else {
        return false;
    };
    let last_leaf = scratch.text_leaves(copy).last().map(|(leaf, _)| leaf);
    if let Some(text) = last_leaf.and_then(|leaf| scratch.text_mut(leaf)) {
        let trimmed = text.trim_end().len();
        text.truncate(trimmed);
    }
    scratch.outer_html(copy) == target
}

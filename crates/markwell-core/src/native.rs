//! Default editing behaviour of a contenteditable host.
//!
//! A browser applies these edits itself before the `input` event fires.
//! Outside a browser something has to, so this module implements the subset
//! the orchestrator depends on: typing, backspace and paragraph insertion,
//! plus caret movement. Each operation reports whether it changed anything.

use crate::cursor::{caret_offset, locate, restore_offset};
use crate::dom::{Caret, Dom, Element, NodeId, Tag};

/// Byte index of the `chars`-th char of `s`, or `s.len()` past the end.
fn char_to_byte(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

/// The selection if it lies inside `surface`, else a caret at the document end.
fn caret_in(dom: &mut Dom, surface: NodeId) -> Caret {
    match dom.selection() {
        Some(caret) if dom.contains(surface, caret.node) => caret,
        _ => move_to_document_end(dom, surface),
    }
}

/// Insert `text` at the caret.
pub fn insert_text(dom: &mut Dom, surface: NodeId, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let caret = caret_in(dom, surface);
    let added = text.chars().count();

    if let Some(existing) = dom.text_mut(caret.node) {
        let offset = caret.offset.min(existing.chars().count());
        let byte = char_to_byte(existing, offset);
        existing.insert_str(byte, text);
        dom.collapse(caret.node, offset + added);
        return true;
    }

    let host = caret.node;
    if host != surface && dom.is_placeholder(host) {
        dom.clear_children(host);
        let node = dom.create_text(text);
        dom.append_child(host, node);
        dom.collapse(node, added);
        return true;
    }

    let children = dom.children(host);
    let index = caret.offset.min(children.len());
    let before = index.checked_sub(1).map(|i| children[i]);
    let after = children.get(index).copied();

    if let Some(prev) = before.filter(|&n| dom.is_text(n)) {
        let mut end = 0;
        if let Some(existing) = dom.text_mut(prev) {
            existing.push_str(text);
            end = existing.chars().count();
        }
        dom.collapse(prev, end);
    } else if let Some(next) = after.filter(|&n| dom.is_text(n)) {
        if let Some(existing) = dom.text_mut(next) {
            existing.insert_str(0, text);
        }
        dom.collapse(next, added);
    } else {
        let node = dom.create_text(text);
        dom.insert_at(host, index, node);
        dom.collapse(node, added);
    }
    true
}

/// Delete the char before the caret, merging blocks at a block start.
pub fn delete_backward(dom: &mut Dom, surface: NodeId) -> bool {
    let caret = caret_in(dom, surface);
    let Some(block) = dom.enclosing_block(caret.node, surface) else {
        return false;
    };

    let offset = caret_offset(dom, block);
    if offset == 0 {
        return merge_backward(dom, surface, block);
    }

    // The leaf holding the char just before the caret.
    let Ok(point) = locate(dom, block, offset as isize) else {
        return false;
    };
    let mut emptied = false;
    if let Some(text) = dom.text_mut(point.node) {
        let start = char_to_byte(text, point.offset.saturating_sub(1));
        let end = char_to_byte(text, point.offset);
        text.replace_range(start..end, "");
        emptied = text.is_empty();
    }
    if emptied {
        dom.remove(point.node);
    }
    tidy(dom, block);
    restore_offset(dom, block, offset as isize - 1, surface);
    true
}

/// The block whose content a backspace at the start of `block` joins.
fn previous_block(dom: &Dom, block: NodeId) -> Option<NodeId> {
    let mut prev = dom.previous_sibling(block);
    while let Some(node) = prev {
        if dom.element(node).is_some() || dom.text(node).is_some_and(|t| !t.trim().is_empty()) {
            break;
        }
        prev = dom.previous_sibling(node);
    }
    let mut candidate = prev?;
    // Descend into lists and quotes to their last block.
    loop {
        let last_block = dom
            .children(candidate)
            .iter()
            .rev()
            .copied()
            .find(|&c| dom.block_kind(c).is_some());
        match last_block {
            Some(inner) => candidate = inner,
            None => break,
        }
    }
    dom.block_kind(candidate)
        .is_some_and(|kind| kind.hosts_caret())
        .then_some(candidate)
}

fn merge_backward(dom: &mut Dom, surface: NodeId, block: NodeId) -> bool {
    match previous_block(dom, block) {
        Some(prev) => {
            let join = dom.text_len(prev);
            if dom.is_placeholder(prev) || dom.is_blank(prev) {
                dom.clear_children(prev);
            }
            if dom.is_placeholder(block) {
                dom.clear_children(block);
            }
            move_inline_content(dom, block, prev);
            let parent = dom.parent(block);
            dom.remove(block);
            if let Some(parent) = parent {
                remove_if_empty_list(dom, surface, parent);
            }
            tidy(dom, prev);
            restore_offset(dom, prev, join as isize, surface);
            true
        }
        None => lift_block(dom, surface, block),
    }
}

/// Backspace at the very start of a container: turn the block into a plain
/// paragraph, moving it out of any list or quote it sits in.
fn lift_block(dom: &mut Dom, surface: NodeId, block: NodeId) -> bool {
    let Some(parent) = dom.parent(block) else {
        return false;
    };
    let is_paragraph = dom.tag(block) == Some(&Tag::Paragraph);
    if is_paragraph && parent == surface {
        return false;
    }

    let mut paragraph = Element::new(Tag::Paragraph);
    if let Some(dir) = dom.element(block).and_then(|e| e.attr("dir")) {
        paragraph = paragraph.with_attr("dir", dir);
    }
    let p = dom.create_element(paragraph);
    if !dom.is_placeholder(block) {
        move_inline_content(dom, block, p);
    }

    if parent == surface {
        dom.insert_before(surface, p, Some(block));
        dom.remove(block);
    } else {
        let container = dom.top_level_ancestor(block, surface).unwrap_or(parent);
        dom.insert_before(surface, p, Some(container));
        dom.remove(block);
        if dom.is_blank(container) {
            if let Some(dir) = dom.element(container).and_then(|e| e.attr("dir")) {
                let dir = dir.to_string();
                if let Some(element) = dom.element_mut(p) {
                    element.set_attr("dir", dir);
                }
            }
            dom.remove(container);
        }
    }
    tidy(dom, p);
    restore_offset(dom, p, 0, surface);
    true
}

/// Move the inline content of `from` to the end of `to`, flattening any
/// nested blocks.
fn move_inline_content(dom: &mut Dom, from: NodeId, to: NodeId) {
    for child in dom.children(from).to_vec() {
        if dom.block_kind(child).is_some() {
            move_inline_content(dom, child, to);
        } else {
            dom.append_child(to, child);
        }
    }
}

fn remove_if_empty_list(dom: &mut Dom, surface: NodeId, list: NodeId) {
    let is_list = matches!(
        dom.tag(list),
        Some(Tag::UnorderedList) | Some(Tag::OrderedList)
    );
    if is_list && list != surface && dom.is_blank(list) {
        dom.remove(list);
    }
}

/// Drop empty text runs and empty inline wrappers, then give a block with
/// nothing left a `<br>` placeholder.
fn tidy(dom: &mut Dom, block: NodeId) {
    let nodes: Vec<NodeId> = dom.descendants(block).skip(1).collect();
    for node in nodes.into_iter().rev() {
        let empty_text = dom.text(node).is_some_and(str::is_empty);
        let empty_inline = dom.tag(node).is_some_and(|tag| {
            !tag.is_void() && tag.block_kind().is_none() && !tag.is_container()
        }) && dom.children(node).is_empty();
        if empty_text || empty_inline {
            dom.remove(node);
        }
    }

    let has_content = dom.text_len(block) > 0
        || dom
            .descendants(block)
            .skip(1)
            .any(|n| dom.tag(n).is_some_and(|t| t.is_void() || t.block_kind().is_some()));
    if !has_content {
        dom.reset_to_placeholder(block);
    }
}

/// Split the enclosing block at the caret (Enter).
pub fn insert_paragraph(dom: &mut Dom, surface: NodeId) -> bool {
    let caret = caret_in(dom, surface);
    let Some(block) = dom.enclosing_block(caret.node, surface) else {
        let index = if caret.node == surface {
            caret.offset
        } else {
            dom.top_level_ancestor(caret.node, surface)
                .and_then(|n| dom.index_in_parent(n))
                .map_or(dom.children(surface).len(), |i| i + 1)
        };
        let p = dom.create_element(Element::new(Tag::Paragraph));
        dom.reset_to_placeholder(p);
        dom.insert_at(surface, index, p);
        dom.collapse(p, 0);
        return true;
    };

    let offset = caret_offset(dom, block);
    let len = dom.text_len(block);
    let Some(tag) = dom.tag(block).cloned() else {
        return false;
    };

    // Enter in an empty item leaves the list.
    if tag == Tag::ListItem && len == 0 {
        let Some(list) = dom.parent(block) else {
            return false;
        };
        let Some(outer) = dom.parent(list) else {
            return false;
        };
        let p = dom.create_element(Element::new(Tag::Paragraph));
        dom.reset_to_placeholder(p);
        let index = dom.index_in_parent(list).map_or(0, |i| i + 1);
        dom.insert_at(outer, index, p);
        dom.remove(block);
        remove_if_empty_list(dom, surface, list);
        dom.collapse(p, 0);
        return true;
    }

    // Enter at the end of a heading continues with a paragraph.
    if matches!(tag, Tag::Heading(_)) && offset >= len {
        let p = dom.create_element(Element::new(Tag::Paragraph));
        dom.reset_to_placeholder(p);
        insert_after(dom, block, p);
        dom.collapse(p, 0);
        return true;
    }

    let tail = split_block(dom, block, offset);
    insert_after(dom, block, tail);
    tidy(dom, block);
    tidy(dom, tail);
    restore_offset(dom, tail, 0, surface);
    true
}

fn insert_after(dom: &mut Dom, node: NodeId, new: NodeId) {
    if let Some(parent) = dom.parent(node) {
        let index = dom.index_in_parent(node).map_or(0, |i| i + 1);
        dom.insert_at(parent, index, new);
    }
}

/// Move everything after `offset` in `block` into a fresh, detached element
/// of the same tag. Inline wrappers that straddle the split are cloned.
fn split_block(dom: &mut Dom, block: NodeId, offset: usize) -> NodeId {
    let end = Caret::new(block, dom.children(block).len());
    let point = if dom.text_len(block) == 0 {
        Caret::new(block, 0)
    } else {
        locate(dom, block, offset as isize).unwrap_or(end)
    };

    let (mut node, mut index) = match dom.text(point.node) {
        Some(text) => {
            let byte = char_to_byte(text, point.offset);
            let tail = text[byte..].to_string();
            if let Some(text) = dom.text_mut(point.node) {
                text.truncate(byte);
            }
            let tail_node = dom.create_text(tail);
            insert_after(dom, point.node, tail_node);
            match (dom.parent(tail_node), dom.index_in_parent(tail_node)) {
                (Some(parent), Some(i)) => (parent, i),
                _ => (block, dom.children(block).len()),
            }
        }
        None => (point.node, point.offset),
    };

    loop {
        let tag = dom.tag(node).cloned().unwrap_or(Tag::Paragraph);
        let clone = dom.create_element(Element::new(tag));
        let moved: Vec<NodeId> = dom.children(node).iter().skip(index).copied().collect();
        for child in moved {
            dom.append_child(clone, child);
        }
        if node == block {
            return clone;
        }
        let (Some(parent), Some(i)) = (dom.parent(node), dom.index_in_parent(node)) else {
            return clone;
        };
        dom.insert_at(parent, i + 1, clone);
        node = parent;
        index = i + 1;
    }
}

// === Caret movement ===

/// Caret to the start of the enclosing block.
pub fn move_to_block_start(dom: &mut Dom, surface: NodeId) -> Option<Caret> {
    let caret = dom.selection()?;
    let block = dom.enclosing_block(caret.node, surface)?;
    Some(restore_offset(dom, block, 0, surface))
}

/// Caret to the end of the enclosing block.
pub fn move_to_block_end(dom: &mut Dom, surface: NodeId) -> Option<Caret> {
    let caret = dom.selection()?;
    let block = dom.enclosing_block(caret.node, surface)?;
    let len = dom.text_len(block) as isize;
    Some(restore_offset(dom, block, len, surface))
}

/// Caret to the end of the last block, or into the surface when it has none.
pub fn move_to_document_end(dom: &mut Dom, surface: NodeId) -> Caret {
    let mut last = None;
    let mut node = surface;
    while let Some(child) = dom
        .children(node)
        .iter()
        .rev()
        .copied()
        .find(|&c| dom.block_kind(c).is_some())
    {
        if dom.block_kind(child).is_some_and(|k| k.hosts_caret()) {
            last = Some(child);
        }
        node = child;
    }
    match last {
        Some(block) => {
            let len = dom.text_len(block) as isize;
            restore_offset(dom, block, len, surface)
        }
        None => {
            let caret = Caret::new(surface, dom.children(surface).len());
            dom.collapse(caret.node, caret.offset);
            caret
        }
    }
}

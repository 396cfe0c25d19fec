//! Logical caret offsets.
//!
//! A block's content is replaced wholesale on conversion, so a caret cannot
//! survive by node identity. Instead it is captured as a char count into the
//! block's flattened text and restored by walking the text leaves of the new
//! block. Both directions are total: failures degrade to a coarser placement
//! and are only logged.

use crate::dom::{Caret, Dom, NodeId};
use crate::error::CaretError;

/// Chars of `block`'s flattened text before `caret`.
///
/// Falls back to the caret's raw offset within its own container when the
/// caret cannot be measured against `block`.
pub fn capture_offset(dom: &Dom, block: NodeId, caret: Option<Caret>) -> usize {
    match measure(dom, block, caret) {
        Ok(offset) => {
            tracing::trace!(target: "markwell::cursor", ?block, offset, "captured caret offset");
            offset
        }
        Err(err) => {
            let fallback = caret.map(|c| c.offset).unwrap_or(0);
            tracing::warn!(
                target: "markwell::cursor",
                %err,
                fallback,
                "caret offset fell back to container offset"
            );
            fallback
        }
    }
}

fn measure(dom: &Dom, block: NodeId, caret: Option<Caret>) -> Result<usize, CaretError> {
    let caret = caret.ok_or(CaretError::NoSelection)?;
    if !dom.exists(block) {
        return Err(CaretError::MissingBlock(block));
    }
    if !dom.contains(block, caret.node) {
        return Err(CaretError::OutsideBlock {
            anchor: caret.node,
            block,
        });
    }

    if let Some(text) = dom.text(caret.node) {
        let before: usize = dom
            .text_leaves(block)
            .take_while(|&(leaf, _)| leaf != caret.node)
            .map(|(_, t)| t.chars().count())
            .sum();
        return Ok(before + caret.offset.min(text.chars().count()));
    }

    // Element anchor: the caret sits before child `offset`, or after the
    // last child when the offset is past the end.
    let stop = dom.children(caret.node).get(caret.offset).copied();
    let mut inside = false;
    let mut acc = 0;
    for node in dom.descendants(block) {
        match stop {
            Some(stop) if node == stop => break,
            Some(_) => {}
            None if node == caret.node => inside = true,
            None if inside && !dom.contains(caret.node, node) => break,
            None => {}
        }
        if let Some(text) = dom.text(node) {
            acc += text.chars().count();
        }
    }
    Ok(acc)
}

/// Find the caret position `target` chars into `block`'s flattened text.
///
/// `target` is clamped to `[0, len]`. At a boundary between two leaves the
/// earlier leaf wins. A target past the end lands after any inline wrappers
/// closing the block, so text typed next is not absorbed by them. A block
/// with no text puts the caret inside its innermost trailing element, so an
/// empty list lands in its last item.
pub(crate) fn locate(dom: &Dom, block: NodeId, target: isize) -> Result<Caret, CaretError> {
    if !dom.exists(block) {
        return Err(CaretError::MissingBlock(block));
    }
    let total = dom.text_len(block);
    if total > 0 && target > total as isize {
        if let Some(caret) = after_trailing_inline(dom, block) {
            return Ok(caret);
        }
    }
    let target = target.clamp(0, total as isize) as usize;

    let mut acc = 0;
    let mut first_empty = None;
    for (leaf, text) in dom.text_leaves(block) {
        let len = text.chars().count();
        if len == 0 {
            first_empty.get_or_insert(leaf);
            continue;
        }
        if acc + len >= target {
            return Ok(Caret::new(leaf, target - acc));
        }
        acc += len;
    }
    if let Some(leaf) = first_empty {
        return Ok(Caret::new(leaf, 0));
    }

    let mut host = block;
    while let Some(last) = dom.last_child(host) {
        match dom.tag(last) {
            Some(tag) if !tag.is_void() => host = last,
            _ => break,
        }
    }
    Ok(Caret::new(host, 0))
}

/// The position just past the outermost inline element that ends the text
/// of `block`, if the last text sits inside one.
fn after_trailing_inline(dom: &Dom, block: NodeId) -> Option<Caret> {
    let (leaf, _) = dom.text_leaves(block).filter(|(_, text)| !text.is_empty()).last()?;
    let mut node = leaf;
    let mut lifted = false;
    while dom.next_sibling(node).is_none() {
        let parent = dom.parent(node)?;
        if parent == block || dom.block_kind(parent).is_some() {
            break;
        }
        node = parent;
        lifted = true;
    }
    if !lifted || dom.next_sibling(node).is_some() {
        return None;
    }
    let host = dom.parent(node)?;
    let index = dom.index_in_parent(node)?;
    Some(Caret::new(host, index + 1))
}

/// Place the caret `target` chars into `block` and return where it went.
///
/// If `block` is gone the caret goes to the start of `fallback`, which is
/// also focused.
pub fn restore_offset(dom: &mut Dom, block: NodeId, target: isize, fallback: NodeId) -> Caret {
    let caret = match locate(dom, block, target) {
        Ok(caret) => {
            tracing::trace!(target: "markwell::cursor", ?block, target, ?caret, "restored caret");
            caret
        }
        Err(err) => {
            tracing::warn!(target: "markwell::cursor", %err, "caret restore fell back to surface");
            dom.focus(fallback);
            Caret::new(fallback, 0)
        }
    };
    dom.collapse(caret.node, caret.offset);
    caret
}

/// Logical offset of the current selection within `block`.
pub fn caret_offset(dom: &Dom, block: NodeId) -> usize {
    capture_offset(dom, block, dom.selection())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::parse_fragment;

    fn first_block(dom: &Dom) -> NodeId {
        dom.first_child(dom.root()).expect("fragment has a block")
    }

    #[test]
    fn test_capture_through_inline_nodes() {
        let dom = parse_fragment("<p>ab<em>cd</em>ef</p>");
        let p = first_block(&dom);
        let leaves: Vec<_> = dom.text_leaves(p).map(|(id, _)| id).collect();

        assert_eq!(capture_offset(&dom, p, Some(Caret::new(leaves[0], 1))), 1);
        assert_eq!(capture_offset(&dom, p, Some(Caret::new(leaves[1], 2))), 4);
        assert_eq!(capture_offset(&dom, p, Some(Caret::new(leaves[2], 0))), 4);
        // Offsets past the end of a text node clamp to its length.
        assert_eq!(capture_offset(&dom, p, Some(Caret::new(leaves[2], 9))), 6);
    }

    #[test]
    fn test_capture_element_anchor() {
        let dom = parse_fragment("<p>ab<em>cd</em>ef</p>");
        let p = first_block(&dom);
        let em = dom.children(p)[1];
        assert_eq!(capture_offset(&dom, p, Some(Caret::new(p, 0))), 0);
        assert_eq!(capture_offset(&dom, p, Some(Caret::new(p, 2))), 4);
        assert_eq!(capture_offset(&dom, p, Some(Caret::new(p, 3))), 6);
        assert_eq!(capture_offset(&dom, p, Some(Caret::new(em, 1))), 4);
    }

    #[test]
    fn test_capture_falls_back_to_raw_offset() {
        let dom = parse_fragment("<p>one</p><p>two</p>");
        let first = first_block(&dom);
        let second = dom.children(dom.root())[1];
        let text = dom.first_child(second).expect("second has text");
        assert_eq!(capture_offset(&dom, first, Some(Caret::new(text, 2))), 2);
        assert_eq!(capture_offset(&dom, first, None), 0);
    }

    #[test]
    fn test_restore_clamps() {
        let mut dom = parse_fragment("<h1>Title</h1>");
        let h1 = first_block(&dom);
        let text = dom.first_child(h1).expect("heading has text");
        let surface = dom.root();

        for (target, expected) in [(-5, 0), (0, 0), (3, 3), (5, 5), (99, 5), (isize::MAX, 5)] {
            let caret = restore_offset(&mut dom, h1, target, surface);
            assert_eq!(caret, Caret::new(text, expected));
            assert_eq!(dom.selection(), Some(caret));
        }
    }

    #[test]
    fn test_restore_past_end_leaves_inline_wrapper() {
        let mut dom = parse_fragment("<p>a <em>b</em></p><ul><li><strong>c</strong></li></ul>");
        let p = first_block(&dom);
        let ul = dom.children(dom.root())[1];
        let li = dom.children(ul)[0];
        let surface = dom.root();

        assert_eq!(restore_offset(&mut dom, p, 9, surface), Caret::new(p, 2));
        assert_eq!(caret_offset(&dom, p), 3);
        // At the exact end the caret stays inside the wrapper.
        let em_text = dom.first_child(dom.children(p)[1]).expect("em has text");
        assert_eq!(restore_offset(&mut dom, p, 3, surface), Caret::new(em_text, 1));
        // Lifting never escapes the item.
        assert_eq!(restore_offset(&mut dom, ul, 5, surface), Caret::new(li, 1));
    }

    #[test]
    fn test_restore_prefers_earlier_leaf_at_boundary() {
        let mut dom = parse_fragment("<ul><li>a</li><li>b</li></ul>");
        let ul = first_block(&dom);
        let root = dom.root();
        let leaves: Vec<_> = dom.text_leaves(ul).map(|(id, _)| id).collect();
        assert_eq!(restore_offset(&mut dom, ul, 1, root), Caret::new(leaves[0], 1));
        assert_eq!(restore_offset(&mut dom, ul, 2, root), Caret::new(leaves[1], 1));
    }

    #[test]
    fn test_restore_without_text() {
        let mut dom = parse_fragment("<ul><li></li></ul><h1></h1><p><br></p>");
        let root = dom.root();
        let [ul, h1, p] = [0, 1, 2].map(|i| dom.children(root)[i]);
        let li = dom.first_child(ul).expect("list has an item");

        assert_eq!(restore_offset(&mut dom, ul, 3, root), Caret::new(li, 0));
        assert_eq!(restore_offset(&mut dom, h1, 0, root), Caret::new(h1, 0));
        assert_eq!(restore_offset(&mut dom, p, 1, root), Caret::new(p, 0));
    }

    #[test]
    fn test_restore_into_released_block() {
        let mut dom = parse_fragment("<p>x</p>");
        let p = first_block(&dom);
        let root = dom.root();
        dom.remove(p);
        assert_eq!(restore_offset(&mut dom, p, 1, root), Caret::new(root, 0));
        assert_eq!(dom.focused(), Some(root));
    }
}

//! Synchronization between the live surface element and the editor's tree.
//!
//! Content moves as HTML. The caret moves as a child-index path from the
//! surface plus an offset. Browsers count text offsets in UTF-16 code units
//! while the editor counts chars, so text offsets are converted both ways.

use html_escape::encode_double_quoted_attribute;
use markwell_core::{Caret, Editor, EditorConfig, EditorError, parse_fragment};
use web_sys::{Element, Node};

/// Build an editor from the current content of `element`.
pub fn load(element: &Element, surface_id: &str, config: EditorConfig) -> Result<Editor, EditorError> {
    let tag = element.tag_name().to_ascii_lowercase();
    let markup = format!(
        r#"<{tag} id="{}">{}</{tag}>"#,
        encode_double_quoted_attribute(surface_id),
        element.inner_html()
    );
    Editor::create(parse_fragment(&markup), surface_id, config)
}

/// Copy the surface attributes the editor set (`contenteditable`,
/// `spellcheck`, `dir`) onto the live element.
pub fn sync_attributes(editor: &Editor, element: &Element) {
    let Some(surface) = editor.dom().element(editor.surface()) else {
        return;
    };
    for (name, value) in surface.attrs().filter(|&(name, _)| name != "id") {
        if let Err(err) = element.set_attribute(name, value) {
            tracing::warn!(target: "markwell::browser", name, ?err, "could not set surface attribute");
        }
    }
}

/// Read the live content and caret into the editor.
pub fn pull(editor: &mut Editor, element: &Element) {
    // Merge split text runs so child indices line up with the parsed tree.
    element.normalize();
    let surface = editor.surface();
    editor.dom_mut().set_inner_html(surface, &element.inner_html());

    let caret = live_caret(element).and_then(|(node, offset)| {
        let path = live_path(element, &node)?;
        let target = editor.dom().node_at_path(surface, &path)?;
        let offset = if editor.dom().is_text(target) {
            let text = node.node_value().unwrap_or_default();
            utf16_to_char_offset(&text, offset)
        } else {
            offset
        };
        Some(Caret::new(target, offset))
    });
    if caret.is_none() {
        tracing::debug!(target: "markwell::browser", "live selection not mapped into the editor");
    }
    editor.dom_mut().set_selection(caret);
}

/// Write the editor's content and caret to the live element.
pub fn push(editor: &Editor, element: &Element) {
    element.set_inner_html(&editor.html());

    let Some(caret) = editor.selection() else {
        return;
    };
    let dom = editor.dom();
    let Some(node) = dom
        .path_from(editor.surface(), caret.node)
        .and_then(|path| live_node_at(element, &path))
    else {
        tracing::warn!(target: "markwell::browser", ?caret, "caret has no live counterpart");
        return;
    };
    let offset = match dom.text(caret.node) {
        Some(text) => char_to_utf16_offset(text, caret.offset),
        None => caret.offset,
    };
    let selection = web_sys::window().and_then(|window| window.get_selection().ok().flatten());
    if let Some(selection) = selection {
        if let Err(err) = selection.collapse_with_offset(Some(&node), offset as u32) {
            tracing::warn!(target: "markwell::browser", ?err, "could not place live caret");
        }
    }
}

fn live_caret(element: &Element) -> Option<(Node, usize)> {
    let selection = web_sys::window()?.get_selection().ok()??;
    let node = selection.anchor_node()?;
    let root: &Node = element;
    root.contains(Some(&node))
        .then(|| (node, selection.anchor_offset() as usize))
}

fn live_path(element: &Element, node: &Node) -> Option<Vec<usize>> {
    let root: &Node = element;
    let mut path = Vec::new();
    let mut current = node.clone();
    while !current.is_same_node(Some(root)) {
        let mut index = 0;
        let mut sibling = current.previous_sibling();
        while let Some(prev) = sibling {
            index += 1;
            sibling = prev.previous_sibling();
        }
        path.push(index);
        current = current.parent_node()?;
    }
    path.reverse();
    Some(path)
}

fn live_node_at(element: &Element, path: &[usize]) -> Option<Node> {
    let mut current: Node = element.clone().into();
    for &index in path {
        current = current.child_nodes().item(index as u32)?;
    }
    Some(current)
}

/// Chars of `text` covered by its first `units` UTF-16 code units. A unit
/// count landing inside a surrogate pair rounds up past the pair.
pub fn utf16_to_char_offset(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (chars, ch) in text.chars().enumerate() {
        if seen >= units {
            return chars;
        }
        seen += ch.len_utf16();
    }
    text.chars().count()
}

/// UTF-16 code units in the first `chars` chars of `text`.
pub fn char_to_utf16_offset(text: &str, chars: usize) -> usize {
    text.chars().take(chars).map(char::len_utf16).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_in_basic_plane() {
        assert_eq!(utf16_to_char_offset("héllo", 2), 2);
        assert_eq!(char_to_utf16_offset("héllo", 2), 2);
        assert_eq!(utf16_to_char_offset("abc", 99), 3);
    }

    #[test]
    fn test_offsets_across_surrogate_pairs() {
        let text = "a😀b";
        assert_eq!(char_to_utf16_offset(text, 2), 3);
        assert_eq!(utf16_to_char_offset(text, 3), 2);
        assert_eq!(utf16_to_char_offset(text, 2), 2);
        assert_eq!(char_to_utf16_offset(text, 3), 4);
        assert_eq!(utf16_to_char_offset(text, 4), 3);
    }
}

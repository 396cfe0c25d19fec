//! HTML text in and out of the node arena.
//!
//! Output is canonical: attributes double-quoted in insertion order, void
//! elements without a closing tag, no layout whitespace. Two subtrees with the
//! same canonical HTML are the same rendered form.
//!
//! Input is a tolerant fragment parser. It never fails: unknown constructs
//! degrade to text, unclosed elements close at the end of input, and stray
//! closing tags are ignored.

use html_escape::decode_html_entities;
use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_html, escape_html_body_text};
use smol_str::SmolStr;

use super::{Dom, Element, NodeId, NodeKind, Tag};

impl Dom {
    /// Canonical HTML of `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_node(self, id, &mut FmtWriter(&mut out));
        out
    }

    /// Canonical HTML of the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut writer = FmtWriter(&mut out);
        for &child in self.children(id) {
            let _ = write_node(self, child, &mut writer);
        }
        out
    }

    /// Replace the children of `id` with the parsed fragment.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Vec<NodeId> {
        let fragment = parse_fragment(html);
        self.clear_children(id);
        let mut inserted = Vec::new();
        for &child in fragment.children(fragment.root()) {
            if let Some(copy) = self.import_node(&fragment, child) {
                self.append_child(id, copy);
                inserted.push(copy);
            }
        }
        inserted
    }
}

fn write_node<W: StrWrite>(dom: &Dom, id: NodeId, w: &mut W) -> Result<(), W::Error> {
    match dom.kind(id) {
        Some(NodeKind::Text(text)) => escape_html_body_text(&mut *w, text),
        Some(NodeKind::Element(element)) => {
            write_open_tag(element, w)?;
            if element.tag.is_void() {
                return Ok(());
            }
            for &child in dom.children(id) {
                write_node(dom, child, w)?;
            }
            w.write_str("</")?;
            w.write_str(element.tag.name())?;
            w.write_str(">")
        }
        None => Ok(()),
    }
}

fn write_open_tag<W: StrWrite>(element: &Element, w: &mut W) -> Result<(), W::Error> {
    w.write_str("<")?;
    w.write_str(element.tag.name())?;
    for (name, value) in element.attrs() {
        w.write_str(" ")?;
        w.write_str(name)?;
        w.write_str("=\"")?;
        escape_html(&mut *w, value)?;
        w.write_str("\"")?;
    }
    w.write_str(">")
}

// === Parsing ===

enum TagToken {
    Open {
        tag: Tag,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(Tag),
    Skip,
}

/// Parse an HTML fragment into a detached document.
///
/// The returned document's root is a synthetic `#fragment` element whose
/// children are the fragment's top-level nodes.
pub fn parse_fragment(html: &str) -> Dom {
    let mut dom = Dom::with_root(Tag::Other(SmolStr::new_static("#fragment")));
    let mut stack = vec![dom.root()];
    let mut rest = html;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map(|i| &after[i + 3..]).unwrap_or("");
            continue;
        }

        if rest.starts_with('<') {
            match read_tag(rest) {
                Some((token, remaining)) => {
                    rest = remaining;
                    match token {
                        TagToken::Open {
                            tag,
                            attrs,
                            self_closing,
                        } => open_element(&mut dom, &mut stack, tag, attrs, self_closing),
                        TagToken::Close(tag) => close_element(&dom, &mut stack, &tag),
                        TagToken::Skip => {}
                    }
                }
                None => {
                    push_text(&mut dom, &stack, "<");
                    rest = &rest[1..];
                }
            }
            continue;
        }

        let end = rest.find('<').unwrap_or(rest.len());
        push_text(&mut dom, &stack, &decode_html_entities(&rest[..end]));
        rest = &rest[end..];
    }

    dom
}

fn read_tag(input: &str) -> Option<(TagToken, &str)> {
    let body = &input[1..];
    let first = body.chars().next()?;

    if first == '!' || first == '?' {
        let end = body.find('>')?;
        return Some((TagToken::Skip, &body[end + 1..]));
    }

    if let Some(closing) = body.strip_prefix('/') {
        let name_len = tag_name_len(closing);
        let end = closing.find('>')?;
        if name_len == 0 {
            return Some((TagToken::Skip, &closing[end + 1..]));
        }
        let tag = Tag::from_name(&closing[..name_len]);
        return Some((TagToken::Close(tag), &closing[end + 1..]));
    }

    if !first.is_ascii_alphabetic() {
        return None;
    }

    let name_len = tag_name_len(body);
    let tag = Tag::from_name(&body[..name_len]);
    let mut rest = &body[name_len..];
    let mut attrs = Vec::new();

    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("/>") {
            return Some((
                TagToken::Open {
                    tag,
                    attrs,
                    self_closing: true,
                },
                after,
            ));
        }
        if let Some(after) = rest.strip_prefix('>') {
            return Some((
                TagToken::Open {
                    tag,
                    attrs,
                    self_closing: false,
                },
                after,
            ));
        }
        if rest.is_empty() {
            return None;
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len());
        if name_end == 0 {
            // Stray '/' or '=' inside the tag.
            rest = &rest[1..];
            continue;
        }
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let mut value = String::new();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    let close = inner.find(quote)?;
                    value = decode_html_entities(&inner[..close]).into_owned();
                    rest = &inner[close + 1..];
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(after_eq.len());
                    value = decode_html_entities(&after_eq[..end]).into_owned();
                    rest = &after_eq[end..];
                }
            }
        }
        attrs.push((name, value));
    }
}

fn tag_name_len(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(s.len())
}

/// Block starts that implicitly end an open paragraph.
fn closes_paragraph(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::Heading(_)
            | Tag::UnorderedList
            | Tag::OrderedList
            | Tag::Blockquote
            | Tag::Pre
            | Tag::Div
            | Tag::Rule
            | Tag::Table
    )
}

fn open_element(
    dom: &mut Dom,
    stack: &mut Vec<NodeId>,
    tag: Tag,
    attrs: Vec<(String, String)>,
    self_closing: bool,
) {
    if closes_paragraph(&tag)
        && stack
            .last()
            .is_some_and(|&top| dom.tag(top) == Some(&Tag::Paragraph))
    {
        stack.pop();
    }

    if tag == Tag::ListItem {
        // An item opened while another is open in the same list closes it.
        let open_item = stack
            .iter()
            .rposition(|&n| dom.tag(n) == Some(&Tag::ListItem));
        let open_list = stack.iter().rposition(|&n| {
            matches!(
                dom.tag(n),
                Some(Tag::UnorderedList) | Some(Tag::OrderedList)
            )
        });
        if let Some(item) = open_item {
            if open_list.is_none_or(|list| item > list) {
                stack.truncate(item);
            }
        }
    }

    let is_void = tag.is_void();
    let mut element = Element::new(tag);
    for (name, value) in attrs {
        element.set_attr(&name, value);
    }
    let node = dom.create_element(element);
    let parent = stack.last().copied().unwrap_or(dom.root());
    dom.append_child(parent, node);
    if !is_void && !self_closing {
        stack.push(node);
    }
}

fn close_element(dom: &Dom, stack: &mut Vec<NodeId>, tag: &Tag) {
    // Index 0 is the fragment root and never closes.
    if let Some(pos) = stack.iter().rposition(|&n| dom.tag(n) == Some(tag)) {
        if pos > 0 {
            stack.truncate(pos);
        }
    }
}

fn push_text(dom: &mut Dom, stack: &[NodeId], text: &str) {
    if text.is_empty() {
        return;
    }
    let parent = stack.last().copied().unwrap_or(dom.root());

    let layout_only = text.trim().is_empty() && text.contains('\n');
    let in_container = parent == dom.root()
        || dom
            .tag(parent)
            .is_some_and(|t| t.is_container() || *t == Tag::ListItem);
    if layout_only && in_container {
        return;
    }

    if let Some(last) = dom.last_child(parent) {
        if let Some(existing) = dom.text_mut(last) {
            existing.push_str(text);
            return;
        }
    }
    let node = dom.create_text(text);
    dom.append_child(parent, node);
}

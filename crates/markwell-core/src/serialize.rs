//! Blocks back to markup.
//!
//! [`MarkdownSerializer`] walks a node tree and writes markup in the fixed
//! style of [`SerializeOptions`]. Before the built-in conversion of an
//! element runs, every [`Rule`] whose filter matches may rewrite or unwrap it.
//! The stock rule set strips the direction marker, so it can never reach the
//! output through elements that are kept as raw HTML.

use crate::config::SerializeOptions;
use crate::dom::html::parse_fragment;
use crate::dom::{Dom, Element, NodeId, NodeKind, Tag};

/// Inline elements without a markup equivalent that are kept as raw HTML.
const KEPT_INLINE: &[&str] = &["kbd", "sup", "sub", "u", "mark", "abbr", "small", "ins"];

/// Elements without a markup equivalent that still separate blocks.
const GENERIC_BLOCKS: &[&str] = &[
    "section", "article", "aside", "header", "footer", "nav", "main", "figure", "figcaption",
    "details", "summary", "address", "dl", "dt", "dd",
];

/// A per-element override, checked before the built-in conversions.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub filter: fn(&Element) -> bool,
    /// Rewrite the element, or return `None` to emit only its content.
    pub replacement: fn(Element) -> Option<Element>,
}

/// Drops the `dir` attribute from every element that has one.
pub fn direction_rule() -> Rule {
    Rule {
        name: "strip-direction",
        filter: |element| element.has_attr("dir"),
        replacement: |mut element| {
            element.remove_attr("dir");
            Some(element)
        },
    }
}

/// What to serialize: an HTML fragment, or a node of a live document.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Html(&'a str),
    Node(&'a Dom, NodeId),
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(html: &'a str) -> Self {
        Self::Html(html)
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(html: &'a String) -> Self {
        Self::Html(html.as_str())
    }
}

impl<'a> From<(&'a Dom, NodeId)> for Source<'a> {
    fn from((dom, node): (&'a Dom, NodeId)) -> Self {
        Self::Node(dom, node)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    in_code: bool,
}

/// Structured content to markup text.
#[derive(Debug, Clone)]
pub struct MarkdownSerializer {
    options: SerializeOptions,
    rules: Vec<Rule>,
    verbatim: bool,
}

impl Default for MarkdownSerializer {
    fn default() -> Self {
        Self::new(SerializeOptions::default())
    }
}

impl MarkdownSerializer {
    /// A serializer with the stock rule set.
    pub fn new(options: SerializeOptions) -> Self {
        Self {
            options,
            rules: vec![direction_rule()],
            verbatim: false,
        }
    }

    /// Write text runs as they are instead of escaping markup characters.
    ///
    /// The editor uses this mode: text on the surface is markup source the
    /// user typed, so `*` in a text run is meant as a delimiter.
    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    /// Add a rule. Rules run in insertion order.
    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn options(&self) -> &SerializeOptions {
        &self.options
    }

    /// Serialize an HTML fragment or a node (including the node's own tag).
    pub fn serialize<'a>(&self, source: impl Into<Source<'a>>) -> String {
        let raw = match source.into() {
            Source::Html(html) => {
                let fragment = parse_fragment(html);
                self.children(&fragment, fragment.root(), Context::default())
            }
            Source::Node(dom, node) => self.node(dom, node, Context::default()),
        };
        finish(&raw)
    }

    /// Serialize only the children of `node`.
    pub fn serialize_children(&self, dom: &Dom, node: NodeId) -> String {
        finish(&self.children(dom, node, Context::default()))
    }

    fn children(&self, dom: &Dom, node: NodeId, cx: Context) -> String {
        dom.children(node)
            .iter()
            .map(|&child| self.node(dom, child, cx))
            .collect()
    }

    fn node(&self, dom: &Dom, id: NodeId, cx: Context) -> String {
        match dom.kind(id) {
            Some(NodeKind::Text(text)) => {
                if cx.in_code || self.verbatim {
                    text.clone()
                } else {
                    escape_text(text)
                }
            }
            Some(NodeKind::Element(element)) => {
                let mut element = element.clone();
                for rule in &self.rules {
                    if !(rule.filter)(&element) {
                        continue;
                    }
                    match (rule.replacement)(element) {
                        Some(rewritten) => element = rewritten,
                        None => return self.children(dom, id, cx),
                    }
                }
                self.element(dom, id, &element, cx)
            }
            None => String::new(),
        }
    }

    fn element(&self, dom: &Dom, id: NodeId, element: &Element, cx: Context) -> String {
        let opts = &self.options;
        match &element.tag {
            Tag::Paragraph | Tag::Div => block(&self.children(dom, id, cx)),
            Tag::Heading(level) => {
                let content = self.children(dom, id, cx);
                let content = content.replace('\n', " ");
                let hashes = "#".repeat(level.depth());
                if content.trim().is_empty() {
                    block(&hashes)
                } else {
                    block(&format!("{hashes} {}", content.trim()))
                }
            }
            Tag::Blockquote => {
                let content = collapse_newlines(&self.children(dom, id, cx));
                let quoted = content
                    .trim_matches('\n')
                    .lines()
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {line}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                block(if quoted.is_empty() { ">" } else { quoted.as_str() })
            }
            Tag::UnorderedList | Tag::OrderedList => {
                let items: Vec<String> = dom
                    .children(id)
                    .iter()
                    .filter(|&&child| !dom.text(child).is_some_and(|t| t.trim().is_empty()))
                    .map(|&child| self.node(dom, child, cx))
                    .collect();
                block(&items.join("\n"))
            }
            Tag::ListItem => self.list_item(dom, id, cx),
            Tag::Pre => {
                let code = dom
                    .children(id)
                    .iter()
                    .copied()
                    .find(|&c| dom.tag(c) == Some(&Tag::Code));
                let lang = code
                    .and_then(|c| dom.element(c))
                    .and_then(|e| e.attr("class"))
                    .and_then(|class| {
                        class
                            .split_whitespace()
                            .find_map(|c| c.strip_prefix("language-"))
                    })
                    .unwrap_or("");
                let text = dom.text_content(code.unwrap_or(id));
                let fence = opts.fence;
                block(&format!(
                    "{fence}{lang}\n{}\n{fence}",
                    text.trim_end_matches('\n')
                ))
            }
            Tag::Code => {
                let text = self.children(dom, id, Context { in_code: true });
                let ticks = if text.contains('`') { "``" } else { "`" };
                let pad = if ticks.len() > 1 { " " } else { "" };
                format!("{ticks}{pad}{text}{pad}{ticks}")
            }
            Tag::Emphasis => wrap(&self.children(dom, id, cx), opts.emphasis),
            Tag::Strong => wrap(&self.children(dom, id, cx), opts.strong),
            Tag::Strikethrough => wrap(&self.children(dom, id, cx), "~~"),
            Tag::Link => {
                let content = self.children(dom, id, cx);
                match element.attr("href") {
                    Some(href) => format!("[{content}]({href}{})", title_suffix(element)),
                    None => content,
                }
            }
            Tag::Image => match element.attr("src") {
                Some(src) => format!(
                    "![{}]({src}{})",
                    element.attr("alt").unwrap_or(""),
                    title_suffix(element)
                ),
                None => String::new(),
            },
            Tag::LineBreak => {
                if is_trailing(dom, id) {
                    String::new()
                } else {
                    opts.line_break.to_string()
                }
            }
            Tag::Rule => block(opts.rule),
            Tag::Input => match element.attr("type") {
                Some(kind) if kind.eq_ignore_ascii_case("checkbox") => {
                    if element.has_attr("checked") {
                        "[x] ".to_string()
                    } else {
                        "[ ] ".to_string()
                    }
                }
                _ => String::new(),
            },
            Tag::Table => block(&self.table(dom, id, cx)),
            Tag::Other(name) if KEPT_INLINE.contains(&name.as_str()) => {
                let mut out = format!("<{name}");
                for (attr, value) in element.attrs() {
                    out.push_str(&format!(" {attr}=\"{}\"", value.replace('"', "&quot;")));
                }
                out.push('>');
                out.push_str(&self.children(dom, id, cx));
                out.push_str(&format!("</{name}>"));
                out
            }
            Tag::Other(name) if GENERIC_BLOCKS.contains(&name.as_str()) => {
                block(&self.children(dom, id, cx))
            }
            Tag::Span
            | Tag::Other(_)
            | Tag::TableHead
            | Tag::TableBody
            | Tag::TableRow
            | Tag::TableHeaderCell
            | Tag::TableCell => self.children(dom, id, cx),
        }
    }

    fn list_item(&self, dom: &Dom, id: NodeId, cx: Context) -> String {
        let marker = self.item_marker(dom, id);
        let loose = dom
            .children(id)
            .iter()
            .any(|&c| dom.tag(c) == Some(&Tag::Paragraph));

        let content = collapse_newlines(&self.children(dom, id, cx));
        let mut content = content.trim_matches('\n').to_string();
        if !loose {
            while content.contains("\n\n") {
                content = content.replace("\n\n", "\n");
            }
        }

        let indent = " ".repeat(marker.chars().count());
        let mut lines = content.split('\n');
        let mut out = marker;
        out.push_str(lines.next().unwrap_or(""));
        for line in lines {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
                out.push_str(line);
            }
        }
        out
    }

    /// `* ` for bullets, `n. ` counted from the list's `start` for ordered items.
    fn item_marker(&self, dom: &Dom, id: NodeId) -> String {
        let parent = dom.parent(id);
        if parent.and_then(|p| dom.tag(p)) != Some(&Tag::OrderedList) {
            return format!("{} ", self.options.bullet);
        }
        let start = parent
            .and_then(|p| dom.element(p))
            .and_then(|e| e.attr("start"))
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);
        let position = parent
            .map(|p| {
                dom.children(p)
                    .iter()
                    .take_while(|&&c| c != id)
                    .filter(|&&c| dom.tag(c) == Some(&Tag::ListItem))
                    .count()
            })
            .unwrap_or(0);
        format!("{}. ", start + position)
    }

    fn table(&self, dom: &Dom, id: NodeId, cx: Context) -> String {
        let mut rows = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if dom.tag(node) == Some(&Tag::TableRow) {
                rows.push(node);
                continue;
            }
            stack.extend(dom.children(node).iter().rev().copied());
        }

        let mut lines = Vec::new();
        for (i, &row) in rows.iter().enumerate() {
            let cells: Vec<String> = dom
                .children(row)
                .iter()
                .filter(|&&c| {
                    matches!(dom.tag(c), Some(Tag::TableCell | Tag::TableHeaderCell))
                })
                .map(|&c| {
                    self.children(dom, c, cx)
                        .replace('\n', " ")
                        .replace('|', "\\|")
                        .trim()
                        .to_string()
                })
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
            if i == 0 {
                let rule = vec!["---"; cells.len().max(1)].join(" | ");
                lines.push(format!("| {rule} |"));
            }
        }
        lines.join("\n")
    }
}

fn block(content: &str) -> String {
    format!("\n\n{content}\n\n")
}

fn wrap(content: &str, delimiter: &str) -> String {
    if content.trim().is_empty() {
        content.to_string()
    } else {
        format!("{delimiter}{content}{delimiter}")
    }
}

fn title_suffix(element: &Element) -> String {
    match element.attr("title") {
        Some(title) if !title.is_empty() => format!(" \"{}\"", title.replace('"', "\\\"")),
        _ => String::new(),
    }
}

/// A `<br>` with nothing meaningful after it inside its parent.
fn is_trailing(dom: &Dom, id: NodeId) -> bool {
    let mut next = dom.next_sibling(id);
    while let Some(sibling) = next {
        match dom.text(sibling) {
            Some(text) if text.trim().is_empty() => next = dom.next_sibling(sibling),
            _ => return false,
        }
    }
    true
}

fn collapse_newlines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run = 0;
    for ch in s.chars() {
        if ch == '\n' {
            run += 1;
            if run > 2 {
                continue;
            }
        } else {
            run = 0;
        }
        out.push(ch);
    }
    out
}

fn finish(raw: &str) -> String {
    collapse_newlines(raw)
        .trim_start_matches(['\n', '\r', '\t'])
        .trim_end()
        .to_string()
}

/// Backslash-escape characters that would otherwise read as markup.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&escape_line_start(line));
    }
    out
}

fn escape_line_start(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut prefix = String::new();
    let mut rest = line;

    let hashes = bytes.iter().take_while(|&&b| b == b'#').count();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if (1..=6).contains(&hashes) && bytes.get(hashes) == Some(&b' ') {
        prefix.push('\\');
    } else if matches!(bytes.first(), Some(b'>' | b'=')) {
        prefix.push('\\');
    } else if matches!(bytes.first(), Some(b'-' | b'+')) && bytes.get(1) == Some(&b' ') {
        prefix.push('\\');
    } else if digits > 0 && bytes.get(digits) == Some(&b'.') && bytes.get(digits + 1) == Some(&b' ')
    {
        prefix.push_str(&line[..digits]);
        prefix.push_str("\\.");
        rest = &line[digits + 1..];
    }

    let mut out = prefix;
    for ch in rest.chars() {
        if matches!(ch, '\\' | '*' | '_' | '`' | '[' | ']') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

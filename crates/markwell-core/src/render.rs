//! Markup to blocks.
//!
//! [`MarkupRenderer`] is the seam to the markup engine: markup in, HTML out.
//! [`CmarkRenderer`] is the stock engine, an event writer over pulldown-cmark
//! that stamps the direction marker on every block it opens.
//! [`render_blocks`] is the adapter the editor calls. It parses the engine's
//! HTML into detached block nodes and makes sure every block carries the
//! marker, whichever engine produced it.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Parser, Tag, TagEnd};
use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_href, escape_html, escape_html_body_text};

use crate::config::RenderOptions;
use crate::dom::html::parse_fragment;
use crate::dom::{Dom, NodeId};

/// Converts markup text to an HTML fragment.
///
/// Implementations must be permissive: any input yields some HTML, possibly
/// empty.
pub trait MarkupRenderer {
    fn render_html(&self, markup: &str, options: &RenderOptions) -> String;
}

impl<T: MarkupRenderer + ?Sized> MarkupRenderer for &T {
    fn render_html(&self, markup: &str, options: &RenderOptions) -> String {
        (**self).render_html(markup, options)
    }
}

impl<T: MarkupRenderer + ?Sized> MarkupRenderer for Box<T> {
    fn render_html(&self, markup: &str, options: &RenderOptions) -> String {
        (**self).render_html(markup, options)
    }
}

/// CommonMark/GFM renderer backed by pulldown-cmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmarkRenderer;

impl MarkupRenderer for CmarkRenderer {
    fn render_html(&self, markup: &str, options: &RenderOptions) -> String {
        let parser = Parser::new_ext(markup, options.parser_options());
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = HtmlWriter::new(parser, FmtWriter(&mut out), options).run();
        out
    }
}

enum TableState {
    Head,
    Body,
}

/// Compact HTML writer: no layout newlines, so the output parses back into
/// exactly the block nodes it describes.
struct HtmlWriter<'o, I, W> {
    iter: I,
    writer: W,
    options: &'o RenderOptions,
    table_state: TableState,
    table_alignments: Vec<Alignment>,
    table_cell_index: usize,
}

impl<'a, 'o, I, W> HtmlWriter<'o, I, W>
where
    I: Iterator<Item = Event<'a>>,
    W: StrWrite,
{
    fn new(iter: I, writer: W, options: &'o RenderOptions) -> Self {
        Self {
            iter,
            writer,
            options,
            table_state: TableState::Head,
            table_alignments: vec![],
            table_cell_index: 0,
        }
    }

    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    /// Opening tag of a block that carries the direction marker.
    fn open_block(&mut self, name: &str) -> Result<(), W::Error> {
        self.write("<")?;
        self.write(name)?;
        self.write(" dir=\"")?;
        escape_html(&mut self.writer, self.options.direction)?;
        self.write("\"")
    }

    fn run(mut self) -> Result<(), W::Error> {
        while let Some(event) = self.iter.next() {
            match event {
                Event::Start(tag) => self.start_tag(tag)?,
                Event::End(tag) => self.end_tag(tag)?,
                Event::Text(text) => escape_html_body_text(&mut self.writer, &text)?,
                Event::Code(text) => {
                    self.write("<code>")?;
                    escape_html_body_text(&mut self.writer, &text)?;
                    self.write("</code>")?;
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    if self.options.raw_html {
                        self.write(&html)?;
                    } else {
                        escape_html_body_text(&mut self.writer, &html)?;
                    }
                }
                Event::SoftBreak => {
                    if self.options.breaks {
                        self.write("<br>")?;
                    } else {
                        self.write("\n")?;
                    }
                }
                Event::HardBreak => self.write("<br>")?,
                Event::Rule => self.write("<hr>")?,
                Event::TaskListMarker(true) => {
                    self.write("<input disabled=\"\" type=\"checkbox\" checked=\"\">")?
                }
                Event::TaskListMarker(false) => {
                    self.write("<input disabled=\"\" type=\"checkbox\">")?
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'a>) -> Result<(), W::Error> {
        match tag {
            Tag::Paragraph => {
                self.open_block("p")?;
                self.write(">")
            }
            Tag::Heading { level, .. } => {
                self.open_block(&level.to_string())?;
                self.write(">")
            }
            Tag::BlockQuote(_) => {
                self.open_block("blockquote")?;
                self.write(">")
            }
            Tag::List(Some(1)) => {
                self.open_block("ol")?;
                self.write(">")
            }
            Tag::List(Some(start)) => {
                self.open_block("ol")?;
                self.write(" start=\"")?;
                self.write(&start.to_string())?;
                self.write("\">")
            }
            Tag::List(None) => {
                self.open_block("ul")?;
                self.write(">")
            }
            Tag::Item => self.write("<li>"),
            Tag::CodeBlock(info) => match info {
                CodeBlockKind::Fenced(info) => {
                    let lang = info.split(' ').next().unwrap_or_default();
                    if lang.is_empty() {
                        self.write("<pre><code>")
                    } else {
                        self.write("<pre><code class=\"language-")?;
                        escape_html(&mut self.writer, lang)?;
                        self.write("\">")
                    }
                }
                CodeBlockKind::Indented => self.write("<pre><code>"),
            },
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.write("<table>")
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                self.write("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                self.write("<tr>")
            }
            Tag::TableCell => {
                match self.table_state {
                    TableState::Head => self.write("<th")?,
                    TableState::Body => self.write("<td")?,
                }
                match self.table_alignments.get(self.table_cell_index) {
                    Some(&Alignment::Left) => self.write(" style=\"text-align: left\">"),
                    Some(&Alignment::Center) => self.write(" style=\"text-align: center\">"),
                    Some(&Alignment::Right) => self.write(" style=\"text-align: right\">"),
                    _ => self.write(">"),
                }
            }
            Tag::Emphasis => self.write("<em>"),
            Tag::Strong => self.write("<strong>"),
            Tag::Strikethrough => self.write("<del>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                self.write("<a href=\"")?;
                escape_href(&mut self.writer, &dest_url)?;
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    escape_html(&mut self.writer, &title)?;
                }
                self.write("\">")
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.write("<img src=\"")?;
                escape_href(&mut self.writer, &dest_url)?;
                self.write("\" alt=\"")?;
                self.raw_text()?;
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    escape_html(&mut self.writer, &title)?;
                }
                self.write("\">")
            }
            _ => Ok(()),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), W::Error> {
        match tag {
            TagEnd::Paragraph => self.write("</p>"),
            TagEnd::Heading(level) => {
                self.write("</")?;
                self.write(&level.to_string())?;
                self.write(">")
            }
            TagEnd::BlockQuote(_) => self.write("</blockquote>"),
            TagEnd::List(true) => self.write("</ol>"),
            TagEnd::List(false) => self.write("</ul>"),
            TagEnd::Item => self.write("</li>"),
            TagEnd::CodeBlock => self.write("</code></pre>"),
            TagEnd::Table => self.write("</tbody></table>"),
            TagEnd::TableHead => {
                self.table_state = TableState::Body;
                self.write("</tr></thead><tbody>")
            }
            TagEnd::TableRow => self.write("</tr>"),
            TagEnd::TableCell => {
                self.table_cell_index += 1;
                match self.table_state {
                    TableState::Head => self.write("</th>"),
                    TableState::Body => self.write("</td>"),
                }
            }
            TagEnd::Emphasis => self.write("</em>"),
            TagEnd::Strong => self.write("</strong>"),
            TagEnd::Strikethrough => self.write("</del>"),
            TagEnd::Link => self.write("</a>"),
            _ => Ok(()),
        }
    }

    /// Write the text of the current element as an attribute value,
    /// consuming its end tag.
    fn raw_text(&mut self) -> Result<(), W::Error> {
        let mut nest = 0;
        while let Some(event) = self.iter.next() {
            match event {
                Event::Start(_) => nest += 1,
                Event::End(_) => {
                    if nest == 0 {
                        break;
                    }
                    nest -= 1;
                }
                Event::Text(text) | Event::Code(text) | Event::InlineHtml(text) => {
                    escape_html(&mut self.writer, &text)?;
                }
                Event::SoftBreak | Event::HardBreak => self.write(" ")?,
                _ => {}
            }
        }
        Ok(())
    }
}

/// Freshly rendered block nodes, detached from any document.
#[derive(Debug, Clone)]
pub struct RenderedBlocks {
    fragment: Dom,
}

impl RenderedBlocks {
    /// The document the blocks live in.
    pub fn fragment(&self) -> &Dom {
        &self.fragment
    }

    /// Top-level nodes in order.
    pub fn blocks(&self) -> &[NodeId] {
        self.fragment.children(self.fragment.root())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks().is_empty()
    }

    /// Canonical HTML of all blocks, concatenated.
    pub fn html(&self) -> String {
        self.fragment.inner_html(self.fragment.root())
    }
}

/// Render `markup` into block nodes carrying the direction marker.
pub fn render_blocks<R>(renderer: &R, markup: &str, options: &RenderOptions) -> RenderedBlocks
where
    R: MarkupRenderer + ?Sized,
{
    let html = renderer.render_html(markup, options);
    let mut fragment = parse_fragment(&html);
    stamp_direction(&mut fragment, options.direction);
    tracing::trace!(
        target: "markwell::render",
        markup_len = markup.len(),
        blocks = fragment.children(fragment.root()).len(),
        "rendered markup"
    );
    RenderedBlocks { fragment }
}

/// Add the direction marker to every block kind that carries one and lacks it.
fn stamp_direction(dom: &mut Dom, direction: &str) {
    let mut stack = vec![dom.root()];
    while let Some(node) = stack.pop() {
        stack.extend(dom.children(node).iter().copied());
        let carries = dom
            .block_kind(node)
            .is_some_and(|kind| kind.carries_direction());
        if !carries {
            continue;
        }
        if let Some(element) = dom.element_mut(node) {
            if !element.has_attr("dir") {
                element.set_attr("dir", direction);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markup: &str) -> String {
        render_blocks(&CmarkRenderer, markup, &RenderOptions::default()).html()
    }

    #[test]
    fn test_heading_levels() {
        insta::assert_snapshot!(render("# One"), @r#"<h1 dir="auto">One</h1>"#);
        insta::assert_snapshot!(render("###### Six"), @r#"<h6 dir="auto">Six</h6>"#);
    }

    #[test]
    fn test_paragraph_with_inline() {
        insta::assert_snapshot!(
            render("plain *em* and **strong** ~~gone~~"),
            @r#"<p dir="auto">plain <em>em</em> and <strong>strong</strong> <del>gone</del></p>"#
        );
    }

    #[test]
    fn test_lists_carry_marker_items_do_not() {
        insta::assert_snapshot!(
            render("* a\n* b"),
            @r#"<ul dir="auto"><li>a</li><li>b</li></ul>"#
        );
        insta::assert_snapshot!(
            render("3. c"),
            @r#"<ol dir="auto" start="3"><li>c</li></ol>"#
        );
    }

    #[test]
    fn test_blockquote_wraps_paragraph() {
        insta::assert_snapshot!(
            render("> quote"),
            @r#"<blockquote dir="auto"><p dir="auto">quote</p></blockquote>"#
        );
    }

    #[test]
    fn test_bare_markers_render_empty_blocks() {
        insta::assert_snapshot!(render("#"), @r#"<h1 dir="auto"></h1>"#);
        insta::assert_snapshot!(render("*"), @r#"<ul dir="auto"><li></li></ul>"#);
        insta::assert_snapshot!(render(">"), @r#"<blockquote dir="auto"></blockquote>"#);
    }

    #[test]
    fn test_soft_breaks_are_not_line_breaks() {
        assert_eq!(render("a\nb"), "<p dir=\"auto\">a\nb</p>");
        let breaking = RenderOptions {
            breaks: true,
            ..RenderOptions::default()
        };
        let html = render_blocks(&CmarkRenderer, "a\nb", &breaking).html();
        assert_eq!(html, r#"<p dir="auto">a<br>b</p>"#);
    }

    #[test]
    fn test_raw_html_passthrough() {
        insta::assert_snapshot!(
            render("press <kbd>Ctrl</kbd>"),
            @r#"<p dir="auto">press <kbd>Ctrl</kbd></p>"#
        );
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        let rendered = render_blocks(&CmarkRenderer, "", &RenderOptions::default());
        assert!(rendered.is_empty());
    }

    struct BareRenderer;

    impl MarkupRenderer for BareRenderer {
        fn render_html(&self, _markup: &str, _options: &RenderOptions) -> String {
            "<h2>x</h2><ul><li>y</li></ul>".to_string()
        }
    }

    #[test]
    fn test_adapter_stamps_foreign_output() {
        let rendered = render_blocks(&BareRenderer, "ignored", &RenderOptions::default());
        assert_eq!(
            rendered.html(),
            r#"<h2 dir="auto">x</h2><ul dir="auto"><li>y</li></ul>"#
        );
        assert_eq!(rendered.blocks().len(), 2);
    }
}

//! End-to-end editing behaviour, driven through `Editor` the way a browser
//! would dispatch keystrokes.

use std::cell::Cell;

use markwell_core::{
    Caret, CmarkRenderer, Decision, Editor, EditorConfig, HeadingLevel, InputType, KeyOutcome,
    MarkdownSerializer, MarkupRenderer, RenderOptions, Tag, parse_fragment, render_blocks,
    restore_offset,
};

/// Counts calls to the wrapped renderer.
#[derive(Debug, Default)]
struct CountingRenderer {
    calls: Cell<usize>,
}

impl MarkupRenderer for CountingRenderer {
    fn render_html(&self, markup: &str, options: &RenderOptions) -> String {
        self.calls.set(self.calls.get() + 1);
        CmarkRenderer.render_html(markup, options)
    }
}

fn new_editor() -> Editor {
    Editor::create(
        parse_fragment(r#"<div id="editor"></div>"#),
        "editor",
        EditorConfig::default(),
    )
    .expect("surface exists")
}

fn round_trip(markup: &str) -> String {
    let rendered = render_blocks(&CmarkRenderer, markup, &RenderOptions::default());
    MarkdownSerializer::default().serialize(&rendered.html())
}

#[test]
fn typing_heading_converts_and_keeps_caret_at_end() {
    let mut editor = new_editor();
    editor.type_text("# Title");

    assert_eq!(editor.html(), r#"<h1 dir="auto">Title</h1>"#);
    let block = editor.current_block().expect("caret in a block");
    assert_eq!(
        editor.dom().tag(block),
        Some(&Tag::Heading(HeadingLevel::H1))
    );
    assert_eq!(editor.caret_offset(), Some(5));
}

#[test]
fn typing_list_items_across_enter() {
    let mut editor = new_editor();
    editor.type_text("* a");
    assert_eq!(editor.press_enter(), KeyOutcome::Handled);
    editor.type_text("b");

    assert_eq!(
        editor.html(),
        r#"<ul dir="auto"><li>a</li><li>b</li></ul>"#
    );
    assert_eq!(editor.markdown(), "* a\n* b");
}

#[test]
fn dash_bullet_renders_as_list() {
    let mut editor = new_editor();
    editor.type_text("- item");
    assert_eq!(editor.html(), r#"<ul dir="auto"><li>item</li></ul>"#);
}

#[test]
fn backspace_at_heading_start_reveals_markup() {
    let mut editor = new_editor();
    editor.type_text("# Title");
    editor.press_home();
    assert_eq!(editor.caret_offset(), Some(0));

    assert_eq!(editor.press_backspace(), KeyOutcome::Handled);
    assert_eq!(editor.html(), r#"<p dir="auto"># Title</p>"#);
    let caret = editor.selection().expect("caret placed");
    assert_eq!(caret.offset, 0);
    assert_eq!(editor.dom().text(caret.node), Some("# Title"));
}

#[test]
fn revealed_markup_converts_again_on_edit() {
    let mut editor = new_editor();
    editor.type_text("## Sub");
    editor.press_home();
    editor.press_backspace();
    editor.press_end();
    editor.type_text("!");

    assert_eq!(editor.html(), r#"<h2 dir="auto">Sub!</h2>"#);
}

#[test]
fn quote_round_trip() {
    assert_eq!(round_trip("> quote"), "> quote");
}

#[test]
fn constructs_round_trip() {
    for markup in [
        "# h1",
        "## h2",
        "### h3",
        "#### h4",
        "##### h5",
        "###### h6",
        "*em*",
        "**strong**",
        "* item",
        "1. item",
        "> quote",
    ] {
        assert_eq!(round_trip(markup), markup, "round trip of {markup:?}");
    }
}

#[test]
fn direction_marker_never_reaches_markup() {
    let rendered = render_blocks(
        &CmarkRenderer,
        "# a\n\n* b\n\n> c",
        &RenderOptions::default(),
    );
    assert!(rendered.html().contains(r#"dir="auto""#));
    let markup = MarkdownSerializer::default().serialize(&rendered.html());
    assert!(!markup.contains("dir"));
    assert!(!markup.contains('<'));
}

#[test]
fn plain_typing_never_renders() {
    let renderer = CountingRenderer::default();
    let mut editor = Editor::with_renderer(
        parse_fragment(r#"<div id="editor"></div>"#),
        "editor",
        EditorConfig::default(),
        &renderer,
    )
    .expect("surface exists");

    editor.type_text("just a plain sentence, nothing more");

    assert_eq!(renderer.calls.get(), 0);
    assert_eq!(
        editor.html(),
        r#"<p dir="auto">just a plain sentence, nothing more</p>"#
    );
}

#[test]
fn typing_inside_rendered_block_is_idempotent() {
    let mut editor = new_editor();
    editor.type_text("# Title");
    let heading = editor.dom().children(editor.surface())[0];

    // The heading node survives further typing: no replacement happens.
    editor.type_text(" more");
    assert_eq!(editor.dom().children(editor.surface())[0], heading);
    assert_eq!(editor.html(), r#"<h1 dir="auto">Title more</h1>"#);
    assert_eq!(editor.caret_offset(), Some(10));

    assert_eq!(editor.handle_input(&InputType::InsertText), Decision::NoOp);
}

#[test]
fn emptied_surface_holds_default_paragraph() {
    let mut editor = new_editor();
    editor.type_text("ab");
    editor.press_backspace();
    editor.press_backspace();
    editor.press_backspace();
    assert_eq!(editor.html(), r#"<p dir="auto"><br></p>"#);

    let surface = editor.surface();
    editor.dom_mut().clear_children(surface);
    editor.dom_mut().collapse(surface, 0);
    assert_eq!(
        editor.handle_input(&InputType::DeleteContentBackward),
        Decision::ResetEmpty
    );
    assert_eq!(editor.html(), r#"<p dir="auto"><br></p>"#);
}

#[test]
fn bare_marker_in_sole_block_keeps_surface_non_empty() {
    let mut editor = new_editor();
    editor.type_text("> ");
    assert_eq!(editor.html(), r#"<blockquote dir="auto"></blockquote>"#);
    editor.press_backspace();
    assert!(editor.dom().children(editor.surface()).len() >= 1);
}

#[test]
fn restore_offset_is_clamped() {
    let mut dom = parse_fragment(r#"<p>ab<strong>cd</strong></p>"#);
    let root = dom.root();
    let p = dom.children(root)[0];
    let len = dom.text_len(p);

    for target in [isize::MIN, -1, 0, 2, 3, 4, 5, 1000, isize::MAX] {
        let caret: Caret = restore_offset(&mut dom, p, target, root);
        assert!(dom.contains(p, caret.node));
        let offset = markwell_core::capture_offset(&dom, p, Some(caret));
        assert!(offset <= len, "offset {offset} for target {target}");
        assert_eq!(offset, target.clamp(0, len as isize) as usize);
    }
}

#[test]
fn typed_space_after_text_survives() {
    let mut editor = new_editor();
    editor.type_text("first");
    editor.press_enter();
    editor.type_text("two words");
    assert_eq!(
        editor.html(),
        r#"<p dir="auto">first</p><p dir="auto">two words</p>"#
    );
}

#[test]
fn nested_quote_marker_is_not_doubled() {
    let mut editor = new_editor();
    editor.type_text("> a");
    assert_eq!(
        editor.html(),
        r#"<blockquote dir="auto"><p dir="auto">a</p></blockquote>"#
    );
    assert_eq!(editor.markdown(), "> a");
}

fn type_in_second_paragraph(text: &str) -> Editor {
    let mut editor = new_editor();
    editor.type_text("first");
    editor.press_enter();
    editor.type_text(text);
    editor
}

#[test]
fn inline_emphasis_in_later_paragraph_stays_inline() {
    let editor = type_in_second_paragraph("*emphasis* here");
    assert_eq!(
        editor.html(),
        r#"<p dir="auto">first</p><p dir="auto"><em>emphasis</em> here</p>"#
    );
    assert_eq!(editor.markdown(), "first\n\n*emphasis* here");
}

#[test]
fn untriggered_markers_in_later_paragraph_stay_text() {
    for (typed, html) in [
        ("1.5 litres", "1.5 litres"),
        ("-5 degrees", "-5 degrees"),
        ("#tag", "#tag"),
        (">not a quote", "&gt;not a quote"),
    ] {
        let editor = type_in_second_paragraph(typed);
        assert_eq!(
            editor.html(),
            format!(r#"<p dir="auto">first</p><p dir="auto">{html}</p>"#),
            "typing {typed:?}"
        );
    }
}

#[test]
fn triggers_in_later_paragraph_still_convert() {
    let editor = type_in_second_paragraph("## Sub");
    assert_eq!(
        editor.html(),
        r#"<p dir="auto">first</p><h2 dir="auto">Sub</h2>"#
    );

    let editor = type_in_second_paragraph("1. one");
    assert_eq!(
        editor.html(),
        r#"<p dir="auto">first</p><ol dir="auto"><li>one</li></ol>"#
    );
}

#[test]
fn backspace_at_quote_start_reveals_marker() {
    let mut editor = new_editor();
    editor.type_text("> quote");
    assert_eq!(
        editor.html(),
        r#"<blockquote dir="auto"><p dir="auto">quote</p></blockquote>"#
    );
    editor.press_home();

    assert_eq!(editor.press_backspace(), KeyOutcome::Handled);
    assert_eq!(editor.html(), r#"<p dir="auto">&gt; quote</p>"#);
    assert_eq!(editor.caret_offset(), Some(0));

    editor.press_end();
    editor.type_text("!");
    assert_eq!(
        editor.html(),
        r#"<blockquote dir="auto"><p dir="auto">quote!</p></blockquote>"#
    );
}

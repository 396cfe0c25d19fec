//! Editor sessions: one editing surface and everything wired to it.

use crate::actions::{EditorEvent, InputType, Key, KeyOutcome};
use crate::config::{EditorConfig, RenderOptions, SerializeOptions};
use crate::cursor;
use crate::dom::{Caret, Dom, NodeId};
use crate::error::EditorError;
use crate::native;
use crate::orchestrator::{Decision, Orchestrator};
use crate::render::{CmarkRenderer, MarkupRenderer};

/// What a dispatched event resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Input(Decision),
    KeyDown(KeyOutcome),
}

/// A live editor bound to one surface of a document.
#[derive(Debug)]
pub struct Editor<R = CmarkRenderer> {
    dom: Dom,
    surface: NodeId,
    orchestrator: Orchestrator<R>,
}

impl Editor<CmarkRenderer> {
    /// Bind an editor to the element with id `surface_id`.
    ///
    /// ```
    /// use markwell_core::{Editor, EditorConfig, parse_fragment};
    ///
    /// let dom = parse_fragment(r#"<div id="editor"></div>"#);
    /// let editor = Editor::create(dom, "editor", EditorConfig::default()).unwrap();
    /// assert_eq!(editor.html(), r#"<p dir="auto"><br></p>"#);
    /// ```
    pub fn create(dom: Dom, surface_id: &str, config: EditorConfig) -> Result<Self, EditorError> {
        Self::with_renderer(dom, surface_id, config, CmarkRenderer)
    }
}

impl<R: MarkupRenderer> Editor<R> {
    /// Like [`Editor::create`], with a custom markup renderer.
    pub fn with_renderer(
        mut dom: Dom,
        surface_id: &str,
        config: EditorConfig,
        renderer: R,
    ) -> Result<Self, EditorError> {
        let surface = dom
            .element_by_id(surface_id)
            .ok_or_else(|| EditorError::SurfaceNotFound {
                id: surface_id.to_string(),
            })?;
        if let Some(tag) = dom.tag(surface).filter(|tag| tag.is_void()) {
            return Err(EditorError::InvalidSurface {
                id: surface_id.to_string(),
                tag: tag.name().to_string(),
            });
        }

        let render_options = RenderOptions::default();
        if let Some(element) = dom.element_mut(surface) {
            element.set_attr("contenteditable", "true");
            element.set_attr("spellcheck", if config.spellcheck { "true" } else { "false" });
            element.set_attr("dir", render_options.direction);
        }

        let orchestrator = Orchestrator::new(renderer, render_options, SerializeOptions::default());
        let mut editor = Self {
            dom,
            surface,
            orchestrator,
        };
        editor.initialize(config.initial_markdown.as_deref());
        tracing::debug!(
            target: "markwell::session",
            surface_id,
            blocks = editor.dom.children(surface).len(),
            "editor created"
        );
        Ok(editor)
    }

    fn initialize(&mut self, initial: Option<&str>) {
        let surface = self.surface;
        if self.dom.is_blank(surface) {
            self.dom.clear_children(surface);
            let rendered = initial
                .map(str::trim)
                .filter(|markup| !markup.is_empty())
                .map(|markup| self.orchestrator.render(markup));
            match rendered {
                Some(rendered) if !rendered.is_empty() => {
                    for &block in rendered.blocks() {
                        if let Some(copy) = self.dom.import_node(rendered.fragment(), block) {
                            self.dom.append_child(surface, copy);
                        }
                    }
                }
                _ => {
                    self.orchestrator.reset_surface(&mut self.dom, surface);
                }
            }
        }
        self.dom.focus(surface);
        native::move_to_document_end(&mut self.dom, surface);
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Mutable access for embedders that edit the document themselves.
    /// Follow any content change with [`Editor::handle_input`].
    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn into_dom(self) -> Dom {
        self.dom
    }

    pub fn surface(&self) -> NodeId {
        self.surface
    }

    pub fn orchestrator(&self) -> &Orchestrator<R> {
        &self.orchestrator
    }

    /// Inner HTML of the surface.
    pub fn html(&self) -> String {
        self.dom.inner_html(self.surface)
    }

    /// The whole surface as markup.
    pub fn markdown(&self) -> String {
        self.orchestrator
            .serializer()
            .serialize_children(&self.dom, self.surface)
    }

    pub fn selection(&self) -> Option<Caret> {
        self.dom.selection()
    }

    /// The block holding the caret.
    pub fn current_block(&self) -> Option<NodeId> {
        let caret = self.dom.selection()?;
        self.dom.enclosing_block(caret.node, self.surface)
    }

    /// Caret offset within the current block.
    pub fn caret_offset(&self) -> Option<usize> {
        self.current_block()
            .map(|block| cursor::caret_offset(&self.dom, block))
    }

    // === Event wiring ===

    /// Route one event to the orchestrator.
    pub fn dispatch(&mut self, event: &EditorEvent) -> Dispatched {
        tracing::trace!(target: "markwell::session", ?event, "dispatch");
        match event {
            EditorEvent::Input(input) => Dispatched::Input(self.handle_input(input)),
            EditorEvent::KeyDown(key) => Dispatched::KeyDown(self.handle_keydown(key)),
        }
    }

    /// A content change has already happened.
    pub fn handle_input(&mut self, input: &InputType) -> Decision {
        self.orchestrator
            .handle_input(&mut self.dom, self.surface, input)
    }

    /// A key is about to act. `Handled` means the default action must not run.
    pub fn handle_keydown(&mut self, key: &Key) -> KeyOutcome {
        self.orchestrator
            .handle_keydown(&mut self.dom, self.surface, key)
    }

    // === Driver ===

    /// Type `text` one char at a time: keydown, default insertion, input.
    pub fn type_text(&mut self, text: &str) {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let ch = ch.encode_utf8(&mut buf);
            if self.handle_keydown(&Key::character(&*ch)) == KeyOutcome::Handled {
                continue;
            }
            if native::insert_text(&mut self.dom, self.surface, ch) {
                self.handle_input(&InputType::InsertText);
            }
        }
    }

    pub fn press_enter(&mut self) -> KeyOutcome {
        let outcome = self.handle_keydown(&Key::Enter);
        if outcome == KeyOutcome::PassThrough
            && native::insert_paragraph(&mut self.dom, self.surface)
        {
            self.handle_input(&InputType::InsertParagraph);
        }
        outcome
    }

    pub fn press_backspace(&mut self) -> KeyOutcome {
        let outcome = self.handle_keydown(&Key::Backspace);
        if outcome == KeyOutcome::PassThrough
            && native::delete_backward(&mut self.dom, self.surface)
        {
            self.handle_input(&InputType::DeleteContentBackward);
        }
        outcome
    }

    pub fn press_home(&mut self) -> KeyOutcome {
        let outcome = self.handle_keydown(&Key::Home);
        if outcome == KeyOutcome::PassThrough {
            native::move_to_block_start(&mut self.dom, self.surface);
        }
        outcome
    }

    pub fn press_end(&mut self) -> KeyOutcome {
        let outcome = self.handle_keydown(&Key::End);
        if outcome == KeyOutcome::PassThrough {
            native::move_to_block_end(&mut self.dom, self.surface);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::parse_fragment;
    use crate::dom::Tag;

    fn editor(html: &str) -> Editor {
        Editor::create(parse_fragment(html), "editor", EditorConfig::default())
            .expect("surface exists")
    }

    #[test]
    fn test_blank_surface_gets_default_paragraph() {
        let editor = editor("<div id=\"editor\">\n  </div>");
        assert_eq!(editor.html(), r#"<p dir="auto"><br></p>"#);
        let p = editor.dom().children(editor.surface())[0];
        assert_eq!(editor.selection(), Some(Caret::new(p, 0)));
        assert_eq!(editor.dom().focused(), Some(editor.surface()));
    }

    #[test]
    fn test_surface_attributes() {
        let config = EditorConfig {
            spellcheck: true,
            ..Default::default()
        };
        let editor = Editor::create(parse_fragment(r#"<div id="editor"></div>"#), "editor", config)
            .expect("surface exists");
        let surface = editor.dom().element(editor.surface()).expect("element");
        assert_eq!(surface.attr("contenteditable"), Some("true"));
        assert_eq!(surface.attr("spellcheck"), Some("true"));
        assert_eq!(surface.attr("dir"), Some("auto"));
    }

    #[test]
    fn test_existing_content_is_kept() {
        let editor = editor(r#"<div id="editor"><h2 dir="auto">Kept</h2></div>"#);
        assert_eq!(editor.html(), r#"<h2 dir="auto">Kept</h2>"#);
        assert_eq!(editor.caret_offset(), Some(4));
    }

    #[test]
    fn test_existing_named_entities_survive() {
        let editor = editor(r#"<div id="editor"><p dir="auto">a &mdash; b &copy;</p></div>"#);
        assert_eq!(editor.html(), "<p dir=\"auto\">a \u{2014} b \u{a9}</p>");
        assert_eq!(editor.markdown(), "a \u{2014} b \u{a9}");
    }

    #[test]
    fn test_initial_markdown() {
        let config = EditorConfig {
            initial_markdown: Some("# Doc\n\nbody".into()),
            ..Default::default()
        };
        let editor = Editor::create(parse_fragment(r#"<div id="editor"></div>"#), "editor", config)
            .expect("surface exists");
        assert_eq!(
            editor.html(),
            r#"<h1 dir="auto">Doc</h1><p dir="auto">body</p>"#
        );
        assert_eq!(editor.markdown(), "# Doc\n\nbody");
        assert_eq!(editor.caret_offset(), Some(4));
    }

    #[test]
    fn test_missing_surface() {
        let err = Editor::create(parse_fragment("<div></div>"), "editor", EditorConfig::default())
            .expect_err("no such surface");
        assert!(matches!(err, EditorError::SurfaceNotFound { ref id } if id == "editor"));
    }

    #[test]
    fn test_void_surface() {
        let err = Editor::create(
            parse_fragment(r#"<br id="editor">"#),
            "editor",
            EditorConfig::default(),
        )
        .expect_err("void surface");
        assert!(matches!(err, EditorError::InvalidSurface { ref tag, .. } if tag == "br"));
    }

    #[test]
    fn test_dispatch_routes_events() {
        let mut editor = editor(r#"<div id="editor"></div>"#);
        assert_eq!(
            editor.dispatch(&EditorEvent::KeyDown(Key::Enter)),
            Dispatched::KeyDown(KeyOutcome::Handled)
        );
        assert_eq!(
            editor.dispatch(&EditorEvent::Input(InputType::InsertText)),
            Dispatched::Input(Decision::NoOp)
        );
    }

    #[test]
    fn test_home_and_end() {
        let mut editor = editor(r#"<div id="editor"><p dir="auto">abc</p></div>"#);
        editor.press_home();
        assert_eq!(editor.caret_offset(), Some(0));
        editor.press_end();
        assert_eq!(editor.caret_offset(), Some(3));
    }

    #[test]
    fn test_typing_builds_ordered_list() {
        let mut editor = editor(r#"<div id="editor"></div>"#);
        editor.type_text("1. first");
        editor.press_enter();
        editor.type_text("second");
        assert_eq!(
            editor.html(),
            r#"<ol dir="auto"><li>first</li><li>second</li></ol>"#
        );
        assert_eq!(editor.markdown(), "1. first\n2. second");
    }

    #[test]
    fn test_enter_after_heading_starts_paragraph() {
        let mut editor = editor(r#"<div id="editor"></div>"#);
        editor.type_text("## Head");
        editor.press_enter();
        editor.type_text("text");
        let surface = editor.surface();
        let tags: Vec<_> = editor
            .dom()
            .children(surface)
            .iter()
            .map(|&n| editor.dom().tag(n).cloned())
            .collect();
        assert_eq!(tags, [Some(Tag::Heading(crate::dom::HeadingLevel::H2)), Some(Tag::Paragraph)]);
        assert_eq!(
            editor.html(),
            r#"<h2 dir="auto">Head</h2><p dir="auto">text</p>"#
        );
    }
}

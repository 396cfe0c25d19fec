//! Editor, renderer and serializer settings.

use pulldown_cmark::Options;
use serde::{Deserialize, Serialize};

/// Settings accepted at construction.
///
/// No key changes how markup is rendered or serialized; those choices are
/// fixed by [`RenderOptions`] and [`SerializeOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Value written to the surface's `spellcheck` attribute.
    pub spellcheck: bool,
    /// Markup rendered into the surface when it starts out blank.
    pub initial_markdown: Option<String>,
}

/// How markup is turned into blocks.
///
/// Held by the editor and handed to every render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// GitHub-flavoured extensions: tables, strikethrough, task lists.
    pub gfm: bool,
    /// Treat single newlines as hard breaks.
    pub breaks: bool,
    /// Pass raw HTML in the markup through unescaped.
    pub raw_html: bool,
    /// Value of the `dir` attribute stamped on every block.
    pub direction: &'static str,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            breaks: false,
            raw_html: true,
            direction: "auto",
        }
    }
}

impl RenderOptions {
    pub(crate) fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
            options.insert(Options::ENABLE_GFM);
        }
        options
    }
}

/// Markup style for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Bullet for unordered list items.
    pub bullet: char,
    /// Thematic break.
    pub rule: &'static str,
    /// Code block fence.
    pub fence: &'static str,
    pub emphasis: &'static str,
    pub strong: &'static str,
    /// Hard line break inside a block.
    pub line_break: &'static str,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            bullet: '*',
            rule: "---",
            fence: "```",
            emphasis: "*",
            strong: "**",
            line_break: "  \n",
        }
    }
}

//! markwell-core: a markdown-backed WYSIWYG editing surface.
//!
//! The editor shows rendered blocks and keeps them in sync with the markup
//! the user types:
//! - `render` turns markup into blocks carrying a `dir` marker
//! - `serialize` turns blocks (or HTML) back into markup without the marker
//! - `cursor` carries the caret across block replacement by logical offset
//! - `orchestrator` decides, per edit event, whether to convert
//! - `session` binds all of it to one surface in a [`Dom`]
//!
//! [`Dom`] is an in-memory document tree standing in for the browser DOM, and
//! `native` supplies the default editing behaviour a browser would.

pub mod actions;
pub mod config;
pub mod cursor;
pub mod dom;
pub mod error;
pub mod native;
pub mod orchestrator;
pub mod render;
pub mod serialize;
pub mod session;
pub mod syntax;

pub use actions::{EditorEvent, InputType, Key, KeyOutcome, parse_input_type};
pub use config::{EditorConfig, RenderOptions, SerializeOptions};
pub use cursor::{capture_offset, caret_offset, restore_offset};
pub use dom::html::parse_fragment;
pub use dom::{BlockKind, Caret, Dom, Element, HeadingLevel, NodeId, Tag};
pub use error::EditorError;
pub use orchestrator::{Decision, Orchestrator};
pub use render::{CmarkRenderer, MarkupRenderer, RenderedBlocks, render_blocks};
pub use serialize::{MarkdownSerializer, Rule, Source, direction_rule};
pub use session::{Dispatched, Editor};
pub use smol_str::SmolStr;
pub use syntax::{Trigger, detect_trigger, has_trigger};

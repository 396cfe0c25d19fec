//! Browser host for markwell editors.
//!
//! Binds a [`markwell_core::Editor`] to a live `contenteditable` element.
//! The editor keeps working on its own document tree; this crate copies the
//! element's content and selection in before each event and writes the
//! result back after.
//!
//! - `events`: `keydown` / `input` event to editor signal
//! - `dom_sync`: live element to arena and back, caret included
//! - `mount`: element lookup and listener wiring
//!
//! Assumes a `wasm32-unknown-unknown` target at runtime.

pub use markwell_core;

pub mod dom_sync;
pub mod error;
pub mod events;
pub mod mount;

pub use error::BrowserError;
pub use events::{input_type_from_event, key_from_event};
pub use mount::BrowserEditor;

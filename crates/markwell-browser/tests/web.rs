//! Browser tests for markwell-browser.
//!
//! Run with: `wasm-pack test --headless --firefox crates/markwell-browser`

#![cfg(target_arch = "wasm32")]

use markwell_browser::markwell_core::{EditorConfig, Key};
use markwell_browser::{BrowserEditor, BrowserError, key_from_event};
use wasm_bindgen_test::*;
use web_sys::{KeyboardEvent, KeyboardEventInit};

wasm_bindgen_test_configure!(run_in_browser);

fn surface(id: &str, inner: &str) -> web_sys::Element {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .expect("document");
    let element = document.create_element("div").expect("div");
    element.set_id(id);
    element.set_inner_html(inner);
    document
        .body()
        .expect("body")
        .append_child(&element)
        .expect("attached");
    element
}

#[wasm_bindgen_test]
fn test_mount_blank_surface() {
    let element = surface("blank", "");
    let editor = BrowserEditor::create("blank", EditorConfig::default()).expect("mounted");

    assert_eq!(element.inner_html(), r#"<p dir="auto"><br></p>"#);
    assert_eq!(element.get_attribute("contenteditable").as_deref(), Some("true"));
    assert_eq!(element.get_attribute("spellcheck").as_deref(), Some("false"));
    assert_eq!(editor.markdown(), "");
}

#[wasm_bindgen_test]
fn test_mount_keeps_existing_content() {
    let element = surface("existing", r#"<h2 dir="auto">caf&eacute; &mdash; ok</h2>"#);
    let editor = BrowserEditor::create("existing", EditorConfig::default()).expect("mounted");

    assert_eq!(editor.markdown(), "## caf\u{e9} \u{2014} ok");
    assert_eq!(element.text_content().as_deref(), Some("caf\u{e9} \u{2014} ok"));
}

#[wasm_bindgen_test]
fn test_missing_surface() {
    let err = BrowserEditor::create("nowhere", EditorConfig::default())
        .err()
        .expect("no such element");
    assert!(matches!(err, BrowserError::Editor(_)));
}

#[wasm_bindgen_test]
fn test_keydown_mapping() {
    let init = KeyboardEventInit::new();
    init.set_key("Backspace");
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).expect("event");
    assert_eq!(key_from_event(&event), Some(Key::Backspace));

    let init = KeyboardEventInit::new();
    init.set_key("Backspace");
    init.set_ctrl_key(true);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).expect("event");
    assert_eq!(key_from_event(&event), None);
}

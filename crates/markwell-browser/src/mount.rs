//! Mounting an editor on a page element.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use markwell_core::{Decision, Editor, EditorConfig, EditorError, KeyOutcome};
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, InputEvent, KeyboardEvent};

use crate::dom_sync;
use crate::error::BrowserError;
use crate::events::{input_type_from_event, key_from_event};

/// An editor bound to a live element. Listeners detach on drop.
pub struct BrowserEditor {
    state: Rc<RefCell<Editor>>,
    element: HtmlElement,
    _listeners: Vec<EventListener>,
}

impl BrowserEditor {
    /// Turn the element with id `surface_id` into an editing surface.
    pub fn create(surface_id: &str, config: EditorConfig) -> Result<Self, BrowserError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(BrowserError::NoDocument)?;
        let element = document
            .get_element_by_id(surface_id)
            .ok_or_else(|| EditorError::SurfaceNotFound {
                id: surface_id.to_string(),
            })?
            .dyn_into::<HtmlElement>()
            .map_err(|_| BrowserError::NotHtmlElement {
                id: surface_id.to_string(),
            })?;

        let editor = dom_sync::load(&element, surface_id, config)?;
        dom_sync::sync_attributes(&editor, &element);
        dom_sync::push(&editor, &element);
        if let Err(err) = element.focus() {
            tracing::debug!(target: "markwell::browser", ?err, "surface did not take focus");
        }

        let state = Rc::new(RefCell::new(editor));
        let listeners = vec![
            keydown_listener(&state, &element),
            input_listener(&state, &element),
        ];
        tracing::debug!(target: "markwell::browser", surface_id, "editor mounted");

        Ok(Self {
            state,
            element,
            _listeners: listeners,
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// The surface content as markup.
    pub fn markdown(&self) -> String {
        self.state.borrow().markdown()
    }

    /// Inner HTML as the editor last wrote it.
    pub fn html(&self) -> String {
        self.state.borrow().html()
    }
}

fn keydown_listener(state: &Rc<RefCell<Editor>>, element: &HtmlElement) -> EventListener {
    let state = Rc::clone(state);
    let live = element.clone();
    EventListener::new_with_options(
        element,
        "keydown",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let Some(key) = key_from_event(event) else {
                return;
            };
            let Ok(mut editor) = state.try_borrow_mut() else {
                return;
            };
            dom_sync::pull(&mut editor, &live);
            if editor.handle_keydown(&key) == KeyOutcome::Handled {
                event.prevent_default();
                dom_sync::push(&editor, &live);
            }
        },
    )
}

fn input_listener(state: &Rc<RefCell<Editor>>, element: &HtmlElement) -> EventListener {
    let state = Rc::clone(state);
    let live = element.clone();
    EventListener::new(element, "input", move |event| {
        let Some(event) = event.dyn_ref::<InputEvent>() else {
            return;
        };
        // Mid-composition DOM belongs to the IME.
        if event.is_composing() {
            return;
        }
        let input = input_type_from_event(event);
        let Ok(mut editor) = state.try_borrow_mut() else {
            return;
        };
        dom_sync::pull(&mut editor, &live);
        if editor.handle_input(&input) != Decision::NoOp {
            dom_sync::push(&editor, &live);
        }
    })
}

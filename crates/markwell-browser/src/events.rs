//! Native event to editor signal.

use markwell_core::{InputType, Key, parse_input_type};
use web_sys::{InputEvent, KeyboardEvent};

/// The key a `keydown` carries, or `None` when the editor should stay out of
/// the way: modifier chords and keys pressed during IME composition.
pub fn key_from_event(event: &KeyboardEvent) -> Option<Key> {
    let modified = event.ctrl_key() || event.meta_key() || event.alt_key();
    classify_key(&event.key(), modified, event.is_composing())
}

/// `InputEvent.inputType` as an [`InputType`].
pub fn input_type_from_event(event: &InputEvent) -> InputType {
    parse_input_type(&event.input_type())
}

pub(crate) fn classify_key(key: &str, modified: bool, composing: bool) -> Option<Key> {
    if modified || composing || key == "Process" {
        return None;
    }
    Some(Key::from_dom_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_keys_reach_the_editor() {
        assert_eq!(classify_key("Backspace", false, false), Some(Key::Backspace));
        assert_eq!(classify_key("Enter", false, false), Some(Key::Enter));
        assert_eq!(classify_key("é", false, false), Some(Key::character("é")));
    }

    #[test]
    fn test_chords_and_composition_are_skipped() {
        assert_eq!(classify_key("Backspace", true, false), None);
        assert_eq!(classify_key("Enter", false, true), None);
        assert_eq!(classify_key("Process", false, false), None);
    }
}

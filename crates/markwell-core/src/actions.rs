//! Platform-agnostic editing signals.
//!
//! `InputType` is the semantic intent of a content change, `Key` the key of a
//! keydown. Host glue converts native events into these and hands them to
//! [`crate::Editor::dispatch`] as an [`EditorEvent`].

use smol_str::SmolStr;

/// What a content change did, as reported by the platform's `inputType`.
///
/// Only the distinctions the orchestrator acts on are kept: whether text
/// went in and whether content went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    InsertText,
    /// IME composition update.
    InsertCompositionText,
    /// Enter.
    InsertParagraph,
    /// Shift+Enter.
    InsertLineBreak,
    InsertFromPaste,
    /// Backspace.
    DeleteContentBackward,
    DeleteContentForward,
    DeleteByCut,
    /// Word, line and other ranged deletions, by name.
    DeleteOther(String),
    /// Anything else, by name.
    Unknown(String),
}

impl InputType {
    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Self::DeleteContentBackward
                | Self::DeleteContentForward
                | Self::DeleteByCut
                | Self::DeleteOther(_)
        )
    }
}

/// Parse a browser `inputType` string.
pub fn parse_input_type(s: &str) -> InputType {
    match s {
        "insertText" => InputType::InsertText,
        "insertCompositionText" => InputType::InsertCompositionText,
        "insertParagraph" => InputType::InsertParagraph,
        "insertLineBreak" => InputType::InsertLineBreak,
        "insertFromPaste" => InputType::InsertFromPaste,
        "deleteContentBackward" => InputType::DeleteContentBackward,
        "deleteContentForward" => InputType::DeleteContentForward,
        "deleteByCut" => InputType::DeleteByCut,
        other if other.starts_with("delete") => InputType::DeleteOther(other.to_string()),
        other => InputType::Unknown(other.to_string()),
    }
}

/// Keys the orchestrator looks at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),
    Enter,
    Backspace,
    Delete,
    Home,
    End,
    /// Any other key, by its DOM `key` value.
    Other(SmolStr),
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Home" => Self::Home,
            "End" => Self::End,
            k if k.chars().count() == 1 => Self::Character(SmolStr::new(k)),
            k => Self::Other(SmolStr::new(k)),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Handled here; the platform default must not run.
    Handled,
    /// Let the platform apply its default behaviour.
    PassThrough,
}

/// A signal delivered to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Content changed (the `input` event).
    Input(InputType),
    /// A key went down, before the platform acts on it.
    KeyDown(Key),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_type() {
        assert_eq!(parse_input_type("insertText"), InputType::InsertText);
        assert_eq!(
            parse_input_type("deleteContentBackward"),
            InputType::DeleteContentBackward
        );
        assert_eq!(
            parse_input_type("deleteWordBackward"),
            InputType::DeleteOther("deleteWordBackward".into())
        );
        assert_eq!(
            parse_input_type("historyUndo"),
            InputType::Unknown("historyUndo".into())
        );
    }

    #[test]
    fn test_deletion_classification() {
        assert!(InputType::DeleteContentBackward.is_deletion());
        assert!(InputType::DeleteByCut.is_deletion());
        assert!(!InputType::InsertText.is_deletion());
        assert!(InputType::DeleteOther("deleteHardLineBackward".into()).is_deletion());
        assert!(!InputType::Unknown("formatBold".into()).is_deletion());
    }

    #[test]
    fn test_dom_keys() {
        assert_eq!(Key::from_dom_key("Enter"), Key::Enter);
        assert_eq!(Key::from_dom_key("a"), Key::character("a"));
        assert_eq!(Key::from_dom_key("ArrowLeft"), Key::Other("ArrowLeft".into()));
    }
}

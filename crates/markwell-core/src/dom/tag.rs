//! Element tags and the closed set of block kinds the editor understands.

use std::fmt;

use smol_str::SmolStr;

/// Heading depth, `#` through `######`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadingLevel {
    H1 = 1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    /// Build a level from its numeric depth. Out of range depths yield `None`.
    pub fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            5 => Some(Self::H5),
            6 => Some(Self::H6),
            _ => None,
        }
    }

    pub fn depth(self) -> usize {
        self as usize
    }
}

impl From<pulldown_cmark::HeadingLevel> for HeadingLevel {
    fn from(level: pulldown_cmark::HeadingLevel) -> Self {
        use pulldown_cmark::HeadingLevel as Md;
        match level {
            Md::H1 => Self::H1,
            Md::H2 => Self::H2,
            Md::H3 => Self::H3,
            Md::H4 => Self::H4,
            Md::H5 => Self::H5,
            Md::H6 => Self::H6,
        }
    }
}

/// Element tag.
///
/// Everything the renderer can emit has its own variant; anything else read
/// from foreign HTML is carried as `Other` with its lowercased name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Paragraph,
    Heading(HeadingLevel),
    UnorderedList,
    OrderedList,
    ListItem,
    Blockquote,
    Pre,
    Code,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Image,
    LineBreak,
    Rule,
    Div,
    Span,
    Input,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableHeaderCell,
    TableCell,
    Other(SmolStr),
}

impl Tag {
    /// Resolve a tag name (case-insensitive).
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "p" => Self::Paragraph,
            "h1" => Self::Heading(HeadingLevel::H1),
            "h2" => Self::Heading(HeadingLevel::H2),
            "h3" => Self::Heading(HeadingLevel::H3),
            "h4" => Self::Heading(HeadingLevel::H4),
            "h5" => Self::Heading(HeadingLevel::H5),
            "h6" => Self::Heading(HeadingLevel::H6),
            "ul" => Self::UnorderedList,
            "ol" => Self::OrderedList,
            "li" => Self::ListItem,
            "blockquote" => Self::Blockquote,
            "pre" => Self::Pre,
            "code" => Self::Code,
            "em" | "i" => Self::Emphasis,
            "strong" | "b" => Self::Strong,
            "del" | "s" => Self::Strikethrough,
            "a" => Self::Link,
            "img" => Self::Image,
            "br" => Self::LineBreak,
            "hr" => Self::Rule,
            "div" => Self::Div,
            "span" => Self::Span,
            "input" => Self::Input,
            "table" => Self::Table,
            "thead" => Self::TableHead,
            "tbody" => Self::TableBody,
            "tr" => Self::TableRow,
            "th" => Self::TableHeaderCell,
            "td" => Self::TableCell,
            _ => Self::Other(SmolStr::new(lower)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Paragraph => "p",
            Self::Heading(HeadingLevel::H1) => "h1",
            Self::Heading(HeadingLevel::H2) => "h2",
            Self::Heading(HeadingLevel::H3) => "h3",
            Self::Heading(HeadingLevel::H4) => "h4",
            Self::Heading(HeadingLevel::H5) => "h5",
            Self::Heading(HeadingLevel::H6) => "h6",
            Self::UnorderedList => "ul",
            Self::OrderedList => "ol",
            Self::ListItem => "li",
            Self::Blockquote => "blockquote",
            Self::Pre => "pre",
            Self::Code => "code",
            Self::Emphasis => "em",
            Self::Strong => "strong",
            Self::Strikethrough => "del",
            Self::Link => "a",
            Self::Image => "img",
            Self::LineBreak => "br",
            Self::Rule => "hr",
            Self::Div => "div",
            Self::Span => "span",
            Self::Input => "input",
            Self::Table => "table",
            Self::TableHead => "thead",
            Self::TableBody => "tbody",
            Self::TableRow => "tr",
            Self::TableHeaderCell => "th",
            Self::TableCell => "td",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Elements that never have children or a closing tag.
    pub fn is_void(&self) -> bool {
        match self {
            Self::LineBreak | Self::Rule | Self::Image | Self::Input => true,
            Self::Other(name) => matches!(
                name.as_str(),
                "area" | "base" | "col" | "embed" | "link" | "meta" | "source" | "track" | "wbr"
            ),
            _ => false,
        }
    }

    /// Block-level containers whose whitespace-only text children are layout noise.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::UnorderedList
                | Self::OrderedList
                | Self::Blockquote
                | Self::Table
                | Self::TableHead
                | Self::TableBody
                | Self::TableRow
                | Self::Div
        )
    }

    /// Map this tag onto the editor's block kinds.
    pub fn block_kind(&self) -> Option<BlockKind> {
        match self {
            Self::Paragraph => Some(BlockKind::Paragraph),
            Self::Heading(level) => Some(BlockKind::Heading(*level)),
            Self::UnorderedList => Some(BlockKind::List { ordered: false }),
            Self::OrderedList => Some(BlockKind::List { ordered: true }),
            Self::ListItem => Some(BlockKind::ListItem),
            Self::Blockquote => Some(BlockKind::Blockquote),
            Self::Pre
            | Self::Code
            | Self::Emphasis
            | Self::Strong
            | Self::Strikethrough
            | Self::Link
            | Self::Image
            | Self::LineBreak
            | Self::Rule
            | Self::Div
            | Self::Span
            | Self::Input
            | Self::Table
            | Self::TableHead
            | Self::TableBody
            | Self::TableRow
            | Self::TableHeaderCell
            | Self::TableCell
            | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The structural units of the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    List { ordered: bool },
    ListItem,
    Blockquote,
}

impl BlockKind {
    /// Whether the caret walk stops at this kind.
    ///
    /// Lists only ever hold items, so a caret resting on the list element
    /// itself is not inside any editable block.
    pub fn hosts_caret(self) -> bool {
        match self {
            Self::Paragraph | Self::Heading(_) | Self::ListItem | Self::Blockquote => true,
            Self::List { .. } => false,
        }
    }

    /// Kinds that reverse into markup when backspaced at their start.
    /// Paragraphs qualify separately, only when they hold real content.
    pub fn reverses_on_backspace(self) -> bool {
        match self {
            Self::Heading(_) | Self::ListItem | Self::Blockquote => true,
            Self::Paragraph | Self::List { .. } => false,
        }
    }

    /// Kinds that receive the directionality marker when rendered.
    pub fn carries_direction(self) -> bool {
        match self {
            Self::Paragraph | Self::Heading(_) | Self::List { .. } | Self::Blockquote => true,
            Self::ListItem => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_round_trip() {
        for name in ["p", "h1", "h6", "ul", "ol", "li", "blockquote", "em", "strong", "br"] {
            assert_eq!(Tag::from_name(name).name(), name);
        }
        assert_eq!(Tag::from_name("H2"), Tag::Heading(HeadingLevel::H2));
        assert_eq!(Tag::from_name("b"), Tag::Strong);
        assert_eq!(Tag::from_name("custom-el").name(), "custom-el");
    }

    #[test]
    fn test_block_kinds() {
        assert_eq!(Tag::Paragraph.block_kind(), Some(BlockKind::Paragraph));
        assert_eq!(
            Tag::OrderedList.block_kind(),
            Some(BlockKind::List { ordered: true })
        );
        assert_eq!(Tag::Emphasis.block_kind(), None);
        assert!(!BlockKind::List { ordered: false }.hosts_caret());
        assert!(BlockKind::ListItem.hosts_caret());
        assert!(BlockKind::Heading(HeadingLevel::H3).reverses_on_backspace());
        assert!(!BlockKind::Paragraph.reverses_on_backspace());
    }

    #[test]
    fn test_heading_depth() {
        assert_eq!(HeadingLevel::from_depth(4).map(HeadingLevel::depth), Some(4));
        assert_eq!(HeadingLevel::from_depth(0), None);
        assert_eq!(HeadingLevel::from_depth(7), None);
    }
}

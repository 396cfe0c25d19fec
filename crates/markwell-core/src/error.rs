//! Error types for the editor.

use miette::Diagnostic;
use thiserror::Error;

use crate::dom::NodeId;

/// Errors surfaced to the embedding application.
///
/// Only construction can fail. Once an editor exists, anomalies during
/// editing are recovered locally and never returned.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum EditorError {
    /// No element carries the requested id.
    #[error("editing surface not found: #{id}")]
    #[diagnostic(
        code(markwell::surface_not_found),
        help("the surface must exist in the document before the editor is created")
    )]
    SurfaceNotFound { id: String },

    /// The id names an element that cannot hold blocks.
    #[error("element #{id} is a <{tag}> and cannot host an editing surface")]
    #[diagnostic(code(markwell::invalid_surface))]
    InvalidSurface { id: String, tag: String },
}

/// Caret placement failures, recovered inside the cursor tracker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CaretError {
    /// There is no selection to read.
    #[error("no caret in the document")]
    NoSelection,

    /// The caret's anchor lies outside the block being measured.
    #[error("caret anchor {anchor:?} is not inside block {block:?}")]
    OutsideBlock { anchor: NodeId, block: NodeId },

    /// The target block has been released.
    #[error("block {0:?} no longer exists")]
    MissingBlock(NodeId),
}

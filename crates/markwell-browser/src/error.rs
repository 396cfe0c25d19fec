use markwell_core::EditorError;
use miette::Diagnostic;
use thiserror::Error;

/// Failures while mounting an editor on a page.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum BrowserError {
    /// Not running in a window with a document.
    #[error("no browser document available")]
    #[diagnostic(code(markwell::browser::no_document))]
    NoDocument,

    /// The id names something that is not an HTML element, such as SVG.
    #[error("element #{id} is not an HTML element")]
    #[diagnostic(code(markwell::browser::not_html))]
    NotHtmlElement { id: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Editor(#[from] EditorError),
}

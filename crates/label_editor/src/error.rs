use thiserror::Error;

/// Failures of one sidebar render or label edit. None of them is fatal to the editor.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A derived label does not line up with the live label anchor at `index`.
    #[error("label mismatch at {index}: expected {expected:?}, found {found:?}")]
    Mismatch {
        index: usize,
        expected: Option<String>,
        found: Option<String>,
    },
    #[error("no element matches `{selector}`")]
    MissingElement { selector: String },
    #[error("label update request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("label update rejected with HTTP {status}")]
    Status { status: u16 },
    #[error("response is not a label sidebar fragment")]
    InvalidFragment,
    #[error(transparent)]
    Dom(#[from] anyhow::Error),
}

//! Label cycling on an issue sidebar.
//!
//! [`label::derive_labels`] decides which labels cycle and which lane heads get a
//! placeholder, [`form`] reproduces the host form's submission, [`submit`] replays an
//! edit over HTTP, [`observer`] notices the host re-rendering the sidebar, and
//! [`view`] owns the DOM writes. [`LabelEditor`] ties them to one sidebar.
#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]

pub mod editor;
mod error;
pub mod form;
pub mod label;
pub mod observer;
pub mod presenter;
pub mod submit;
pub mod view;

pub use editor::LabelEditor;
pub use error::EditorError;
pub use form::{FormSnapshot, LABEL_FIELD, serialize_array};
pub use label::{Label, derive_labels};
pub use observer::{SIDEBAR_ROOT_MARKER, SidebarObserver, is_sidebar_replaced};
pub use presenter::LabelEditorPresenter;
pub use submit::{EditRequest, EditSubmitter, encode_params};
pub use view::{ClickIntent, SidebarView};

//! Content entry point, run once per qualifying page view.

use dom::Document;
use label_config::Config;
use label_editor::view::SidebarView;
use label_editor::{EditorError, LabelEditor, SIDEBAR_ROOT_MARKER};
use log::debug;

/// Present only when the viewer may edit labels.
pub const LABEL_MENU: &str = ".label-select-menu";

/// Attach a [`LabelEditor`] to the page's label sidebar.
///
/// Returns `None` without touching the page when labels are not editable, the page has
/// no sidebar, or the sidebar is already initialized.
///
/// # Errors
/// Returns an error if the sidebar is present but its label form cannot be read.
pub fn inject(doc: &mut Document, config: &Config) -> Result<Option<LabelEditor>, EditorError> {
    let root = doc.root();
    if doc.query(root, LABEL_MENU)?.is_none() {
        debug!(target: "content", "labels are not editable here");
        return Ok(None);
    }
    let Some(sidebar) = doc
        .query(root, SIDEBAR_ROOT_MARKER)?
        .and_then(|marker| doc.parent_element(marker))
    else {
        debug!(target: "content", "no label sidebar");
        return Ok(None);
    };
    if SidebarView::is_initialized(doc, sidebar) {
        debug!(target: "content", "sidebar already initialized");
        return Ok(None);
    }
    LabelEditor::attach(doc, sidebar, config).map(Some)
}

use crate::EditorError;
use crate::form::FormSnapshot;
use crate::label::{Label, derive_labels, selected_titles};
use crate::submit::EditRequest;
use label_config::Lane;
use log::debug;

/// Label state for one page: the lanes that apply to it, the latest form snapshot, and the
/// outcome of the last edit.
#[derive(Debug)]
pub struct LabelEditorPresenter {
    location: String,
    lanes: Vec<Lane>,
    form_data: FormSnapshot,
    labels: Vec<Label>,
    last_error: Option<EditorError>,
    last_sidebar_content: Option<String>,
}

impl LabelEditorPresenter {
    pub fn new(location: &str, lanes: Vec<Lane>, label_titles: &[String], form_data: FormSnapshot) -> Self {
        let labels = derive_labels(label_titles, &lanes);
        Self {
            location: location.to_owned(),
            lanes,
            form_data,
            labels,
            last_error: None,
            last_sidebar_content: None,
        }
    }

    #[inline]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[inline]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[inline]
    pub const fn form_data(&self) -> &FormSnapshot {
        &self.form_data
    }

    #[inline]
    pub const fn last_error(&self) -> Option<&EditorError> {
        self.last_error.as_ref()
    }

    #[inline]
    pub fn last_sidebar_content(&self) -> Option<&str> {
        self.last_sidebar_content.as_deref()
    }

    /// The form was replaced: adopt its titles and fields.
    pub fn handle_form_update(&mut self, label_titles: &[String], form_data: FormSnapshot) {
        self.labels = derive_labels(label_titles, &self.lanes);
        self.form_data = form_data;
    }

    /// Build the submission that renames `prev` to `next`, or adds `next` when `prev` is
    /// `None`. Clears the previous error.
    pub fn replace_label_title(&mut self, next: &str, prev: Option<&str>) -> EditRequest {
        let titles = selected_titles(&self.labels, next, prev);
        debug!(target: "label_editor", "requesting labels {titles:?}");
        self.last_error = None;
        EditRequest::new(&self.form_data, &titles)
    }

    /// Record how an edit ended.
    pub fn complete(&mut self, result: Result<String, EditorError>) {
        match result {
            Ok(text) => self.last_sidebar_content = Some(text),
            Err(err) => self.last_error = Some(err),
        }
    }

    /// Record a failure that happened after the response arrived (e.g. a bad fragment).
    pub fn set_error(&mut self, err: EditorError) {
        self.last_error = Some(err);
    }
}

//! Wires the view, presenter, and observer of one sidebar together.

use crate::EditorError;
use crate::observer::SidebarObserver;
use crate::presenter::LabelEditorPresenter;
use crate::submit::EditRequest;
use crate::view::SidebarView;
use dom::{Document, EventType, NodeId};
use label_config::Config;
use log::{error, info, warn};

#[derive(Debug)]
pub struct LabelEditor {
    view: SidebarView,
    presenter: LabelEditorPresenter,
    observer: SidebarObserver,
}

impl LabelEditor {
    /// Bind an editor to `sidebar`: scan it, mark it initialized, start watching it, and
    /// render. A render mismatch is logged and leaves the page untouched.
    ///
    /// # Errors
    /// Returns an error if the sidebar has no label form or its action cannot be resolved.
    pub fn attach(doc: &mut Document, sidebar: NodeId, config: &Config) -> Result<Self, EditorError> {
        let mut view = SidebarView::new(doc, sidebar)?;
        let location = doc.url().map(ToString::to_string).unwrap_or_default();
        let lanes = config.lanes_for_url(&location).to_vec();
        let titles = view.collect_label_titles(doc)?;
        let form_data = view.collect_form_data(doc)?;
        let presenter = LabelEditorPresenter::new(&location, lanes, &titles, form_data);

        view.mark_initialized(doc)?;
        view.register_events(doc);
        let observer = SidebarObserver::observe(doc, sidebar)?;
        let editor = Self {
            view,
            presenter,
            observer,
        };
        if let Err(err) = editor.view.update_labels(doc, editor.presenter.labels()) {
            error!(target: "label_editor", "initial render skipped: {err}");
        }
        info!(
            target: "label_editor",
            "editor attached to {location} with {} labels",
            editor.presenter.labels().len()
        );
        Ok(editor)
    }

    #[inline]
    pub const fn view(&self) -> &SidebarView {
        &self.view
    }

    #[inline]
    pub const fn presenter(&self) -> &LabelEditorPresenter {
        &self.presenter
    }

    /// Dispatch a click on `target`. Returns the edit to replay when the click landed on
    /// a cycle button or an imitation label.
    pub fn handle_click(&mut self, doc: &mut Document, target: NodeId) -> Option<EditRequest> {
        let event = doc.dispatch_event(target, EventType::Click);
        let intent = self.view.click_intent(doc, &event)?;
        if let Err(err) = self.view.clear_error(doc) {
            warn!(target: "label_editor", "could not clear error notice: {err}");
        }
        Some(
            self.presenter
                .replace_label_title(&intent.next, intent.prev.as_deref()),
        )
    }

    /// Apply the outcome of a replayed edit: patch and re-render on success, otherwise
    /// show the error. A failed edit changes nothing else on the page.
    pub fn complete_edit(&mut self, doc: &mut Document, result: Result<String, EditorError>) {
        let succeeded = result.is_ok();
        self.presenter.complete(result);
        if succeeded {
            self.update_sidebar_labels(doc);
        } else {
            self.update_error(doc);
        }
    }

    fn update_sidebar_labels(&mut self, doc: &mut Document) {
        let Some(content) = self.presenter.last_sidebar_content().map(str::to_owned) else {
            return;
        };
        match self.view.update_sidebar_labels(doc, &content) {
            Ok(()) => {
                if let Err(err) = self.refresh(doc) {
                    error!(target: "label_editor", "re-render after update failed: {err}");
                }
            }
            Err(err) => {
                error!(target: "label_editor", "cannot apply label update response: {err}");
                self.presenter.set_error(err);
                self.update_error(doc);
            }
        }
    }

    fn update_error(&self, doc: &mut Document) {
        let Some(err) = self.presenter.last_error() else {
            return;
        };
        let message = format!("Cycle Label: {err}");
        if let Err(notice_err) = self.view.show_error(doc, &message) {
            error!(target: "label_editor", "cannot show error notice: {notice_err}");
        }
    }

    /// Evaluate the mutation batches delivered since the last call. Re-derives and
    /// re-renders once when any of them replaced the sidebar; returns whether it did.
    /// Subtrees those batches removed are freed afterwards.
    pub fn handle_mutations(&mut self, doc: &mut Document) -> bool {
        let replaced = self.observer.poll(doc);
        if replaced && let Err(err) = self.refresh(doc) {
            error!(target: "label_editor", "re-render after sidebar update failed: {err}");
        }
        doc.release_detached();
        replaced
    }

    /// Re-acquire the form, re-derive the labels, and render them.
    ///
    /// # Errors
    /// Returns the first failure; state derived before it is kept.
    pub fn refresh(&mut self, doc: &mut Document) -> Result<(), EditorError> {
        self.view.reset_label_form(doc)?;
        let titles = self.view.collect_label_titles(doc)?;
        let form_data = self.view.collect_form_data(doc)?;
        self.presenter.handle_form_update(&titles, form_data);
        self.view.update_labels(doc, self.presenter.labels())
    }

    /// Stop observing and listening. The initialization marker stays.
    pub fn detach(mut self, doc: &mut Document) {
        self.view.unregister_events(doc);
        self.observer.disconnect(doc);
    }
}

//! One page view driven end to end: clicks, replays, and the host's mutation ticks.

use crate::content;
use dom::{Document, NodeId};
use label_config::Config;
use label_editor::{EditSubmitter, EditorError, Label, LabelEditor};
use log::debug;

#[derive(Debug)]
pub struct PageSession {
    doc: Document,
    editor: Option<LabelEditor>,
    submitter: EditSubmitter,
}

impl PageSession {
    /// Inject into `doc`. A page that does not qualify yields a session without an editor.
    ///
    /// # Errors
    /// As [`content::inject`].
    pub fn open(mut doc: Document, config: &Config, submitter: EditSubmitter) -> Result<Self, EditorError> {
        let editor = content::inject(&mut doc, config)?;
        Ok(Self {
            doc,
            editor,
            submitter,
        })
    }

    #[inline]
    pub const fn document(&self) -> &Document {
        &self.doc
    }

    /// Host-side access to the page, e.g. to simulate its own re-renders.
    #[inline]
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    #[inline]
    pub const fn editor(&self) -> Option<&LabelEditor> {
        self.editor.as_ref()
    }

    pub fn labels(&self) -> &[Label] {
        self.editor
            .as_ref()
            .map(|editor| editor.presenter().labels())
            .unwrap_or_default()
    }

    /// Click `node`. When it asks for a label edit, replay it, apply the outcome, and let
    /// the mutations settle. Returns whether an edit was attempted.
    pub async fn click(&mut self, node: NodeId) -> bool {
        let Some(editor) = self.editor.as_mut() else {
            return false;
        };
        let Some(request) = editor.handle_click(&mut self.doc, node) else {
            debug!(target: "session", "click on {node:?} is not ours");
            return false;
        };
        let result = self.submitter.submit(&request, self.doc.cookie()).await;
        editor.complete_edit(&mut self.doc, result);
        self.tick();
        true
    }

    /// Deliver pending mutations to the observer. Returns whether the sidebar was
    /// re-derived.
    pub fn tick(&mut self) -> bool {
        self.doc.flush_mutations();
        self.editor
            .as_mut()
            .is_some_and(|editor| editor.handle_mutations(&mut self.doc))
    }
}

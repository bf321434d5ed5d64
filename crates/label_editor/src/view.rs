//! Every DOM read and write the label editor performs on the sidebar.

use crate::EditorError;
use crate::form::FormSnapshot;
use crate::label::Label;
use crate::observer::SIDEBAR_ROOT_MARKER;
use anyhow::anyhow;
use dom::{DispatchedEvent, Document, EventType, ListenerId, NodeId, parse_fragment};
use log::{debug, error};

pub const LABEL_FORM: &str = ".sidebar-labels form";
pub const SIDEBAR_LABELS: &str = ".sidebar-labels";
pub const LABEL_ANCHOR: &str = "a.label";
pub const LABELS_CONTAINER: &str = ".labels";
pub const CYCLE_BUTTON: &str = "cycle-button";
pub const IMITATION_LABEL: &str = "imitation-label";
pub const CYCLE_LABEL: &str = "cycle-label";
pub const ERROR_NOTICE: &str = "cycle-label-error";
pub const INITIALIZED_ATTR: &str = "data-cycle-label-initialized";
pub const PREV_TITLE_ATTR: &str = "data-prev-title";
pub const NEXT_TITLE_ATTR: &str = "data-next-title";

/// One DOM write of a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStep {
    /// Insert a cycle button right before `anchor`.
    CycleButton {
        anchor: NodeId,
        prev: String,
        next: String,
    },
    /// Append a placeholder label to the labels container.
    Imitation { title: String, next: String },
}

/// Match derived labels against the live anchors, index by index.
///
/// The first `anchors.len()` labels must be the on-page labels in anchor order with equal
/// titles; everything after them must be imitated. Any other shape is a mismatch and
/// nothing is planned.
///
/// # Errors
/// Returns [`EditorError::Mismatch`] at the first position where the two sequences disagree.
pub fn reconcile(labels: &[Label], anchors: &[(NodeId, String)]) -> Result<Vec<RenderStep>, EditorError> {
    let mut steps = Vec::new();
    for (index, label) in labels.iter().enumerate() {
        match (anchors.get(index), label.is_imitated) {
            (Some((anchor, title)), false) if *title == label.title => {
                if let (true, Some(next)) = (label.is_cyclable, &label.next_title) {
                    steps.push(RenderStep::CycleButton {
                        anchor: *anchor,
                        prev: label.title.clone(),
                        next: next.clone(),
                    });
                }
            }
            (None, true) => steps.push(RenderStep::Imitation {
                title: label.title.clone(),
                next: label.next_title.clone().unwrap_or_else(|| label.title.clone()),
            }),
            (found, _) => {
                return Err(EditorError::Mismatch {
                    index,
                    expected: Some(label.title.clone()),
                    found: found.map(|(_, title)| title.clone()),
                });
            }
        }
    }
    let real = labels.iter().filter(|label| !label.is_imitated).count();
    if let Some((_, title)) = anchors.get(real) {
        return Err(EditorError::Mismatch {
            index: real,
            expected: None,
            found: Some(title.clone()),
        });
    }
    Ok(steps)
}

/// What a sidebar click asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickIntent {
    pub next: String,
    /// The label being cycled away from; `None` adds `next`.
    pub prev: Option<String>,
}

/// DOM side of the editor for one sidebar container.
#[derive(Debug)]
pub struct SidebarView {
    sidebar: NodeId,
    form: NodeId,
    cycle_listener: Option<ListenerId>,
    imitation_listener: Option<ListenerId>,
}

fn require(doc: &Document, scope: NodeId, selector: &str) -> Result<NodeId, EditorError> {
    doc.query(scope, selector)?
        .ok_or_else(|| EditorError::MissingElement {
            selector: selector.to_owned(),
        })
}

fn class_selector(class: &str) -> String {
    format!(".{class}")
}

impl SidebarView {
    /// # Errors
    /// Returns [`EditorError::MissingElement`] if the sidebar holds no label form.
    pub fn new(doc: &Document, sidebar: NodeId) -> Result<Self, EditorError> {
        Ok(Self {
            sidebar,
            form: require(doc, sidebar, LABEL_FORM)?,
            cycle_listener: None,
            imitation_listener: None,
        })
    }

    #[inline]
    pub const fn sidebar(&self) -> NodeId {
        self.sidebar
    }

    #[inline]
    pub const fn form(&self) -> NodeId {
        self.form
    }

    /// Look the form up again; the previous reference may point into a discarded subtree.
    ///
    /// # Errors
    /// Returns [`EditorError::MissingElement`] if the sidebar holds no label form.
    pub fn reset_label_form(&mut self, doc: &Document) -> Result<(), EditorError> {
        self.form = require(doc, self.sidebar, LABEL_FORM)?;
        Ok(())
    }

    pub fn is_initialized(doc: &Document, sidebar: NodeId) -> bool {
        doc.get_attribute(sidebar, INITIALIZED_ATTR) == Some("true")
    }

    /// # Errors
    /// Returns an error if the sidebar node is gone.
    pub fn mark_initialized(&self, doc: &mut Document) -> Result<(), EditorError> {
        doc.set_attribute(self.sidebar, INITIALIZED_ATTR, "true")?;
        Ok(())
    }

    /// Host label anchors in the form with their titles, placeholders excluded.
    ///
    /// # Errors
    /// Returns an error if the anchor selector fails to parse.
    pub fn label_anchors(&self, doc: &Document) -> Result<Vec<(NodeId, String)>, EditorError> {
        Ok(doc
            .query_all(self.form, LABEL_ANCHOR)?
            .into_iter()
            .filter(|anchor| !doc.has_class(*anchor, IMITATION_LABEL))
            .map(|anchor| {
                let title = doc
                    .get_attribute(anchor, "title")
                    .map_or_else(|| doc.text_content(anchor).trim().to_owned(), str::to_owned);
                (anchor, title)
            })
            .collect())
    }

    /// # Errors
    /// As [`Self::label_anchors`].
    pub fn collect_label_titles(&self, doc: &Document) -> Result<Vec<String>, EditorError> {
        Ok(self
            .label_anchors(doc)?
            .into_iter()
            .map(|(_, title)| title)
            .collect())
    }

    /// # Errors
    /// As [`FormSnapshot::capture`].
    pub fn collect_form_data(&self, doc: &Document) -> Result<FormSnapshot, EditorError> {
        FormSnapshot::capture(doc, self.form)
    }

    /// Render `labels`: plan against the live anchors, then replace any previously
    /// injected controls. On a mismatch the DOM is left as it was.
    ///
    /// # Errors
    /// Returns [`EditorError::Mismatch`] when the labels do not line up with the page, or
    /// [`EditorError::MissingElement`] when placeholders have no container.
    pub fn update_labels(&self, doc: &mut Document, labels: &[Label]) -> Result<(), EditorError> {
        let anchors = self.label_anchors(doc)?;
        let steps = reconcile(labels, &anchors).inspect_err(|err| {
            error!(target: "label_editor", "label mismatch, render skipped: {err}");
        })?;
        let container = steps
            .iter()
            .any(|step| matches!(step, RenderStep::Imitation { .. }))
            .then(|| require(doc, self.form, LABELS_CONTAINER))
            .transpose()?;

        self.remove_injected(doc)?;
        for step in steps {
            match step {
                RenderStep::CycleButton { anchor, prev, next } => {
                    let parent = doc
                        .parent(anchor)
                        .ok_or_else(|| anyhow!("label anchor {anchor:?} is detached"))?;
                    let button = Self::create_cycle_button(doc, &prev, &next)?;
                    doc.add_class(anchor, CYCLE_LABEL)?;
                    doc.insert_before(parent, button, Some(anchor))?;
                }
                RenderStep::Imitation { title, next } => {
                    let Some(container) = container else {
                        continue;
                    };
                    let label = Self::create_imitation_label(doc, &title, &next)?;
                    doc.append_child(container, label)?;
                }
            }
        }
        Ok(())
    }

    fn remove_injected(&self, doc: &mut Document) -> Result<(), EditorError> {
        let selector = format!(
            "{}, {}",
            class_selector(CYCLE_BUTTON),
            class_selector(IMITATION_LABEL)
        );
        for node in doc.query_all(self.sidebar, &selector)? {
            doc.remove(node)?;
        }
        Ok(())
    }

    fn create_cycle_button(doc: &mut Document, prev: &str, next: &str) -> Result<NodeId, EditorError> {
        let button = doc.create_element("button");
        doc.set_attribute(button, "class", CYCLE_BUTTON)?;
        doc.set_attribute(button, PREV_TITLE_ATTR, prev)?;
        doc.set_attribute(button, NEXT_TITLE_ATTR, next)?;
        doc.set_attribute(button, "type", "button")?;
        Ok(button)
    }

    fn create_imitation_label(doc: &mut Document, title: &str, next: &str) -> Result<NodeId, EditorError> {
        let anchor = doc.create_element("a");
        doc.set_attribute(anchor, "class", &format!("label {IMITATION_LABEL}"))?;
        doc.set_attribute(anchor, NEXT_TITLE_ATTR, next)?;
        doc.set_attribute(anchor, "href", "#")?;
        doc.set_text_content(anchor, title)?;
        Ok(anchor)
    }

    /// Swap the sidebar's labels section for the one in a server-rendered fragment.
    ///
    /// The fragment must start with the sidebar root marker or a labels section. Nothing
    /// is touched when it does not.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidFragment`] for unexpected content and
    /// [`EditorError::MissingElement`] if the page lost its labels section.
    pub fn update_sidebar_labels(&self, doc: &mut Document, html: &str) -> Result<(), EditorError> {
        let fragment = parse_fragment(html)?;
        let first = fragment.first_element().ok_or(EditorError::InvalidFragment)?;
        let expected = format!("{SIDEBAR_ROOT_MARKER}, {SIDEBAR_LABELS}");
        if !fragment.doc.matches(first, &expected)? {
            return Err(EditorError::InvalidFragment);
        }
        let replacement = if fragment.doc.matches(first, SIDEBAR_LABELS)? {
            first
        } else {
            fragment
                .doc
                .query(first, SIDEBAR_LABELS)?
                .ok_or(EditorError::InvalidFragment)?
        };
        let old = require(doc, self.sidebar, SIDEBAR_LABELS)?;
        let adopted = doc
            .adopt(&fragment.doc, replacement)
            .ok_or_else(|| anyhow!("cannot copy fragment node {replacement:?}"))?;
        doc.replace_child(old, adopted)?;
        debug!(target: "label_editor", "patched sidebar labels from a {} byte response", html.len());
        Ok(())
    }

    /// Show `message` as the sidebar's first child, replacing an earlier notice.
    ///
    /// # Errors
    /// Returns an error if the sidebar node is gone.
    pub fn show_error(&self, doc: &mut Document, message: &str) -> Result<(), EditorError> {
        self.clear_error(doc)?;
        let notice = doc.create_element("div");
        doc.set_attribute(notice, "class", &format!("flash flash-error {ERROR_NOTICE}"))?;
        doc.set_text_content(notice, message)?;
        let first = doc.children(self.sidebar).first().copied();
        doc.insert_before(self.sidebar, notice, first)?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if the notice selector fails to parse.
    pub fn clear_error(&self, doc: &mut Document) -> Result<(), EditorError> {
        for notice in doc.query_all(self.sidebar, &class_selector(ERROR_NOTICE))? {
            doc.remove(notice)?;
        }
        Ok(())
    }

    /// One delegated click listener per control kind, on the sidebar itself.
    pub fn register_events(&mut self, doc: &mut Document) {
        self.unregister_events(doc);
        self.cycle_listener = Some(doc.add_event_listener(self.sidebar, EventType::Click));
        self.imitation_listener = Some(doc.add_event_listener(self.sidebar, EventType::Click));
    }

    pub fn unregister_events(&mut self, doc: &mut Document) {
        for listener in [self.cycle_listener.take(), self.imitation_listener.take()]
            .into_iter()
            .flatten()
        {
            doc.remove_event_listener(listener);
        }
    }

    /// Turn a dispatched click into an edit, when it reached one of our listeners on a
    /// control of ours.
    pub fn click_intent(&self, doc: &Document, event: &DispatchedEvent) -> Option<ClickIntent> {
        if event.event_type != EventType::Click {
            return None;
        }
        let target = event.target;
        let reached = |listener: Option<ListenerId>| listener.is_some_and(|id| event.reaches(id));
        let next = doc.get_attribute(target, NEXT_TITLE_ATTR)?.to_owned();
        if reached(self.cycle_listener) && doc.has_class(target, CYCLE_BUTTON) {
            debug!(target: "label_editor", "onClickCycleButton");
            let prev = doc.get_attribute(target, PREV_TITLE_ATTR)?.to_owned();
            return Some(ClickIntent {
                next,
                prev: Some(prev),
            });
        }
        if reached(self.imitation_listener) && doc.has_class(target, IMITATION_LABEL) {
            debug!(target: "label_editor", "onClickImitationLabel");
            return Some(ClickIntent { next, prev: None });
        }
        None
    }
}

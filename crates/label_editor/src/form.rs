//! Native form submission encoding: which controls submit, and with what value.

use crate::EditorError;
use anyhow::anyhow;
use dom::{Document, NodeId};
use std::iter;
use url::Url;

/// Field the host's label form repeats once per selected label.
pub const LABEL_FIELD: &str = "issue[labels][]";

const SUBMITTABLE_TAGS: &[&str] = &["input", "select", "textarea"];
const NON_DATA_TYPES: &[&str] = &["submit", "button", "image", "reset", "file"];
const CHECKABLE_TYPES: &[&str] = &["checkbox", "radio"];

/// Normalize bare `\n` and `\r\n` line breaks to `\r\n`.
fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\n', "\r\n")
}

fn is_successful(doc: &Document, node: NodeId) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    if !SUBMITTABLE_TAGS.contains(&tag) || doc.disabled(node) {
        return false;
    }
    if doc.get_attribute(node, "name").is_none_or(str::is_empty) {
        return false;
    }
    let control_type = doc.control_type(node);
    if NON_DATA_TYPES.contains(&control_type.as_str()) {
        return false;
    }
    !CHECKABLE_TYPES.contains(&control_type.as_str()) || doc.checked(node)
}

/// The `(name, value)` pairs a browser would submit for the controls in `root`'s subtree
/// (`root` included), in document order.
pub fn serialize_array(doc: &Document, root: NodeId) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for node in iter::once(root).chain(doc.descendants(root)) {
        if !is_successful(doc, node) {
            continue;
        }
        let name = doc.get_attribute(node, "name").unwrap_or_default().to_owned();
        if doc.tag_name(node) == Some("select") {
            for option in doc.selected_options(node) {
                if !doc.disabled(option) {
                    params.push((name.clone(), normalize_newlines(&doc.value(option))));
                }
            }
        } else {
            params.push((name, normalize_newlines(&doc.value(node))));
        }
    }
    params
}

/// `{ method, action, params }` of the label form as it stands now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    /// Lowercased, `get` unless the form says otherwise.
    pub method: String,
    pub action: Url,
    pub params: Vec<(String, String)>,
}

impl FormSnapshot {
    /// Capture `form`'s method, resolved action, and serialized fields.
    ///
    /// # Errors
    /// Returns [`EditorError::Dom`] if the action cannot be resolved to an absolute URL.
    pub fn capture(doc: &Document, form: NodeId) -> Result<Self, EditorError> {
        let method = match doc
            .get_attribute(form, "method")
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("post") => String::from("post"),
            _ => String::from("get"),
        };
        let action = match doc.get_attribute(form, "action").map(str::trim) {
            None | Some("") => doc
                .url()
                .cloned()
                .ok_or_else(|| anyhow!("form has no action and the document no URL"))?,
            Some(action) => match doc.url() {
                Some(base) => base
                    .join(action)
                    .map_err(|err| anyhow!("Invalid form action {action:?}: {err}"))?,
                None => Url::parse(action)
                    .map_err(|err| anyhow!("Cannot resolve form action {action:?}: {err}"))?,
            },
        };
        Ok(Self {
            method,
            action,
            params: serialize_array(doc, form),
        })
    }

    /// Every captured pair except the label selection.
    pub fn base_params(&self) -> impl Iterator<Item = &(String, String)> {
        self.params.iter().filter(|(name, _)| name != LABEL_FIELD)
    }
}

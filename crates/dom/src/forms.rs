//! Form-control properties (`value`, `checked`, `disabled`, ...) derived from markup
//! plus any dirty state set through the document.

use crate::Document;
use indextree::NodeId;

const DISABLEABLE: &[&str] = &["button", "input", "select", "textarea", "fieldset", "optgroup", "option"];

/// Strip and collapse ASCII whitespace, as an `<option>`'s text-derived value is.
fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

impl Document {
    /// Lowercased `type` of an `<input>` (`"text"` when absent), or the tag name otherwise.
    pub fn control_type(&self, node: NodeId) -> String {
        match self.tag_name(node) {
            Some("input") => self
                .get_attribute(node, "type")
                .map_or_else(|| String::from("text"), str::to_ascii_lowercase),
            Some("button") => self
                .get_attribute(node, "type")
                .map_or_else(|| String::from("submit"), str::to_ascii_lowercase),
            Some(tag) => tag.to_owned(),
            None => String::new(),
        }
    }

    /// Current checkedness of a checkbox or radio.
    pub fn checked(&self, node: NodeId) -> bool {
        self.node(node)
            .is_some_and(|data| data.state.checked.unwrap_or_else(|| data.has_attr("checked")))
    }

    /// Current selectedness of an `<option>`.
    pub fn selected(&self, node: NodeId) -> bool {
        self.node(node)
            .is_some_and(|data| data.state.selected.unwrap_or_else(|| data.has_attr("selected")))
    }

    /// Options of a `<select>` that would be submitted.
    ///
    /// A single-choice select with nothing explicitly selected falls back to its first
    /// enabled option, as a browser does for a drop-down.
    pub fn selected_options(&self, select: NodeId) -> Vec<NodeId> {
        let options: Vec<NodeId> = self
            .descendants(select)
            .filter(|node| self.tag_name(*node) == Some("option"))
            .collect();
        let selected: Vec<NodeId> = options
            .iter()
            .copied()
            .filter(|option| self.selected(*option))
            .collect();
        let multiple = self.get_attribute(select, "multiple").is_some();
        if multiple {
            return selected;
        }
        if let Some(last) = selected.last() {
            return vec![*last];
        }
        options
            .into_iter()
            .find(|option| !self.disabled(*option))
            .into_iter()
            .collect()
    }

    /// The control's current value, like the `.value` property.
    pub fn value(&self, node: NodeId) -> String {
        let Some(data) = self.node(node) else {
            return String::new();
        };
        if let Some(dirty) = &data.state.value {
            return dirty.clone();
        }
        match data.tag() {
            Some("input") => match data.attr("value") {
                Some(value) => value.to_owned(),
                None if matches!(self.control_type(node).as_str(), "checkbox" | "radio") => {
                    String::from("on")
                }
                None => String::new(),
            },
            Some("textarea") => self.text_content(node),
            Some("option") => data
                .attr("value")
                .map_or_else(|| collapse_whitespace(&self.text_content(node)), str::to_owned),
            Some("select") => self
                .selected_options(node)
                .first()
                .map(|option| self.value(*option))
                .unwrap_or_default(),
            _ => data.attr("value").unwrap_or_default().to_owned(),
        }
    }

    /// Whether the control matches `:disabled`.
    ///
    /// Covers the element's own `disabled` attribute, an ancestor `<fieldset disabled>`
    /// (unless the control sits inside that fieldset's first `<legend>`), and options in a
    /// disabled `<optgroup>`.
    pub fn disabled(&self, node: NodeId) -> bool {
        let Some(data) = self.node(node) else {
            return false;
        };
        let Some(tag) = data.tag() else {
            return false;
        };
        if !DISABLEABLE.contains(&tag) {
            return false;
        }
        if data.has_attr("disabled") {
            return true;
        }
        if tag == "option" {
            return self
                .parent_element(node)
                .is_some_and(|parent| {
                    self.tag_name(parent) == Some("optgroup") && self.disabled(parent)
                });
        }
        let mut child = node;
        let mut current = self.parent_element(node);
        while let Some(ancestor) = current {
            if self.tag_name(ancestor) == Some("fieldset")
                && self.get_attribute(ancestor, "disabled").is_some()
            {
                let first_legend = self
                    .element_children(ancestor)
                    .into_iter()
                    .find(|candidate| self.tag_name(*candidate) == Some("legend"));
                if first_legend != Some(child) {
                    return true;
                }
            }
            child = ancestor;
            current = self.parent_element(ancestor);
        }
        false
    }
}

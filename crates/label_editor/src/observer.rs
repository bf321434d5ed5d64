//! Detects the host page rebuilding the label sidebar behind our back.

use dom::{Document, MutationObserver, MutationRecord, NodeId, ObserveOptions, Selector};
use log::{debug, info};

/// Element the host replaces wholesale when it re-renders the sidebar.
pub const SIDEBAR_ROOT_MARKER: &str = "#partial-discussion-sidebar";

/// Whether a batch removed the sidebar root marker (or an ancestor of it).
pub fn is_sidebar_replaced(doc: &Document, marker: &Selector, batch: &[MutationRecord]) -> bool {
    batch
        .iter()
        .flat_map(|record| record.removed.iter().copied())
        .any(|removed| {
            marker.matches(doc, removed)
                || doc
                    .descendants(removed)
                    .any(|node| marker.matches(doc, node))
        })
}

/// Subtree watch on the sidebar container.
#[derive(Debug)]
pub struct SidebarObserver {
    observer: MutationObserver,
    marker: Selector,
}

impl SidebarObserver {
    /// # Errors
    /// Returns an error if the marker selector does not parse.
    pub fn observe(doc: &mut Document, sidebar: NodeId) -> Result<Self, anyhow::Error> {
        let marker = Selector::parse(SIDEBAR_ROOT_MARKER)?;
        let observer = doc.observe(sidebar, ObserveOptions::child_list_subtree());
        Ok(Self { observer, marker })
    }

    /// Drain delivered batches. `true` when at least one of them replaced the sidebar;
    /// any number of such batches yields a single re-derivation.
    pub fn poll(&mut self, doc: &Document) -> bool {
        let batches = self.observer.take_batches();
        if batches.is_empty() {
            return false;
        }
        let replaced = batches
            .iter()
            .filter(|batch| is_sidebar_replaced(doc, &self.marker, batch))
            .count();
        debug!(
            target: "label_editor",
            "observer: {} batches, {replaced} replaced the sidebar",
            batches.len()
        );
        if replaced > 0 {
            info!(target: "label_editor", "Sidebar Updated");
        }
        replaced > 0
    }

    pub fn disconnect(self, doc: &mut Document) {
        doc.disconnect(self.observer.id());
    }
}

//! Mutation records and batched observer delivery.
//!
//! The document queues a record for every registration interested in a change and
//! hands each registration its queued records as one batch when
//! [`Document::flush_mutations`](crate::Document::flush_mutations) runs. This mirrors
//! how a page coalesces raw mutations before observer callbacks fire: one batch may
//! carry many unrelated records, so consumers must evaluate the whole batch.

use indextree::NodeId;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes { name: String },
}

/// A single observed change.
///
/// Removed nodes stay alive (detached) after the mutation, so consumers can still
/// inspect their subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl MutationRecord {
    #[inline]
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub attributes: bool,
}

impl ObserveOptions {
    /// `childList` + `subtree`, the options the sidebar watch uses.
    #[inline]
    pub const fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attributes: false,
        }
    }

    #[inline]
    pub(crate) fn wants(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Attributes { .. } => self.attributes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Document-side bookkeeping for one observer.
#[derive(Debug)]
pub(crate) struct Registration {
    pub id: ObserverId,
    pub target: NodeId,
    pub options: ObserveOptions,
    pub pending: Vec<MutationRecord>,
    pub sender: mpsc::UnboundedSender<Vec<MutationRecord>>,
}

/// Receiving half of an observer registration.
#[derive(Debug)]
pub struct MutationObserver {
    id: ObserverId,
    target: NodeId,
    receiver: mpsc::UnboundedReceiver<Vec<MutationRecord>>,
}

impl MutationObserver {
    pub(crate) fn new(
        id: ObserverId,
        target: NodeId,
        receiver: mpsc::UnboundedReceiver<Vec<MutationRecord>>,
    ) -> Self {
        Self {
            id,
            target,
            receiver,
        }
    }

    #[inline]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Drain every batch delivered so far, oldest first.
    pub fn take_batches(&mut self) -> Vec<Vec<MutationRecord>> {
        let mut batches = Vec::new();
        while let Ok(batch) = self.receiver.try_recv() {
            batches.push(batch);
        }
        batches
    }
}

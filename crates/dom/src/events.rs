//! Event listener registry and bubble-path dispatch.

use indextree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Input,
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub id: ListenerId,
    pub node: NodeId,
    pub event_type: EventType,
}

/// Result of dispatching an event: the listeners that fire, in bubble order.
///
/// The document does not run handlers itself. Whoever owns a listener id looks it
/// up here and reacts, with `target` still pointing at the innermost node.
#[derive(Debug, Clone)]
pub struct DispatchedEvent {
    pub event_type: EventType,
    pub target: NodeId,
    pub listeners: Vec<ListenerId>,
}

impl DispatchedEvent {
    #[inline]
    pub fn reaches(&self, listener: ListenerId) -> bool {
        self.listeners.contains(&listener)
    }
}

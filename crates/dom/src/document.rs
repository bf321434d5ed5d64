//! The live document: an indextree arena plus observer and listener registries.

use crate::events::{DispatchedEvent, EventType, Listener, ListenerId};
use crate::mutation::{
    MutationKind, MutationObserver, MutationRecord, ObserveOptions, ObserverId, Registration,
};
use crate::node::{DOMNode, NodeKind};
use crate::selector::Selector;
use anyhow::{Error, anyhow};
use indextree::{Arena, NodeId};
use log::trace;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug)]
pub struct Document {
    dom: Arena<DOMNode>,
    root: NodeId,
    url: Option<Url>,
    cookie: Option<String>,
    registrations: Vec<Registration>,
    next_observer: u64,
    listeners: Vec<Listener>,
    next_listener: u64,
    /// Roots of removed subtrees, tagged with the flush count at removal time.
    detached: Vec<(NodeId, u64)>,
    flushes: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn is_inclusive_ancestor(dom: &Arena<DOMNode>, ancestor: NodeId, node: NodeId) -> bool {
    node.ancestors(dom).any(|current| current == ancestor)
}

impl Document {
    pub fn new() -> Self {
        let mut dom = Arena::new();
        Self {
            root: dom.new_node(DOMNode::default()),
            dom,
            url: None,
            cookie: None,
            registrations: Vec::new(),
            next_observer: 1,
            listeners: Vec::new(),
            next_listener: 1,
            detached: Vec::new(),
            flushes: 0,
        }
    }

    /// An empty document whose relative URLs resolve against `url`.
    pub fn with_url(url: Url) -> Self {
        let mut doc = Self::new();
        doc.url = Some(url);
        doc
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    #[inline]
    pub fn set_url(&mut self, url: Url) {
        self.url = Some(url);
    }

    /// Session cookies attached to same-origin requests issued from this page.
    #[inline]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    #[inline]
    pub fn set_cookie(&mut self, cookie: impl Into<String>) {
        self.cookie = Some(cookie.into());
    }

    #[inline]
    pub fn node(&self, node: NodeId) -> Option<&DOMNode> {
        self.dom.get(node).map(indextree::Node::get)
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut DOMNode, Error> {
        self.dom
            .get_mut(node)
            .map(indextree::Node::get_mut)
            .ok_or_else(|| anyhow!("Unknown node {node:?}"))
    }

    // -----------------------
    // Tree construction
    // -----------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.dom.new_node(DOMNode::element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.dom.new_node(DOMNode::text(text))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.dom.new_node(DOMNode::comment(text))
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    ///
    /// # Errors
    /// Returns an error if either node is unknown or the append would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        if self.dom.get(parent).is_none() {
            return Err(anyhow!("Unknown node {parent:?}"));
        }
        self.detach_recorded(child)?;
        parent
            .checked_append(child, &mut self.dom)
            .map_err(|err| anyhow!("Cannot append {child:?} to {parent:?}: {err:?}"))?;
        self.queue(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    /// Insert `child` into `parent` right before `reference`, or append when `reference` is `None`.
    ///
    /// # Errors
    /// Returns an error if `reference` is not a child of `parent` or the insertion is invalid.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), Error> {
        let Some(reference) = reference else {
            return self.append_child(parent, child);
        };
        if self.parent(reference) != Some(parent) {
            return Err(anyhow!("{reference:?} is not a child of {parent:?}"));
        }
        self.detach_recorded(child)?;
        reference
            .checked_insert_before(child, &mut self.dom)
            .map_err(|err| anyhow!("Cannot insert {child:?} before {reference:?}: {err:?}"))?;
        self.queue(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    /// Detach `node` from its parent. The subtree stays inspectable until
    /// [`Self::release_detached`] frees it.
    ///
    /// # Errors
    /// Returns an error if `node` has no parent.
    pub fn remove(&mut self, node: NodeId) -> Result<(), Error> {
        if self.parent(node).is_none() {
            return Err(anyhow!("{node:?} is not attached"));
        }
        self.detach_recorded(node)
    }

    /// Replace `old` with `new` in `old`'s parent, emitting one record for both sides.
    ///
    /// # Errors
    /// Returns an error if `old` has no parent or `new` contains `old`'s parent.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Result<(), Error> {
        let parent = self
            .parent(old)
            .ok_or_else(|| anyhow!("{old:?} is not attached"))?;
        if is_inclusive_ancestor(&self.dom, new, parent) {
            return Err(anyhow!("{new:?} is an ancestor of {parent:?}"));
        }
        self.detach_recorded(new)?;
        old.checked_insert_before(new, &mut self.dom)
            .map_err(|err| anyhow!("Cannot insert {new:?} before {old:?}: {err:?}"))?;
        old.detach(&mut self.dom);
        self.detached.push((old, self.flushes));
        self.queue(MutationRecord::child_list(parent, vec![new], vec![old]));
        Ok(())
    }

    /// Remove every child of `node` and append a single text node.
    ///
    /// # Errors
    /// Returns an error if `node` is unknown.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), Error> {
        if self.dom.get(node).is_none() {
            return Err(anyhow!("Unknown node {node:?}"));
        }
        let removed: Vec<NodeId> = node.children(&self.dom).collect();
        for child in &removed {
            child.detach(&mut self.dom);
            self.detached.push((*child, self.flushes));
        }
        let text_node = self.create_text(text);
        node.checked_append(text_node, &mut self.dom)
            .map_err(|err| anyhow!("Cannot set text of {node:?}: {err:?}"))?;
        self.queue(MutationRecord::child_list(node, vec![text_node], removed));
        Ok(())
    }

    fn detach_recorded(&mut self, node: NodeId) -> Result<(), Error> {
        if self.dom.get(node).is_none() {
            return Err(anyhow!("Unknown node {node:?}"));
        }
        if let Some(parent) = self.parent(node) {
            node.detach(&mut self.dom);
            self.detached.push((node, self.flushes));
            self.queue(MutationRecord::child_list(parent, Vec::new(), vec![node]));
        }
        Ok(())
    }

    /// Free removed subtrees whose records went out in an earlier
    /// [`Self::flush_mutations`]. Call it once observers have drained those batches;
    /// subtrees removed since the last flush, or re-inserted, are kept. Returns the number
    /// of subtrees freed.
    pub fn release_detached(&mut self) -> usize {
        let flushes = self.flushes;
        let mut released = 0;
        let mut kept = Vec::new();
        for (node, removed_at) in core::mem::take(&mut self.detached) {
            if node.is_removed(&self.dom) || self.parent(node).is_some() {
                continue;
            }
            if removed_at < flushes {
                node.remove_subtree(&mut self.dom);
                released += 1;
            } else {
                kept.push((node, removed_at));
            }
        }
        self.detached = kept;
        if released > 0 {
            trace!(target: "dom", "released {released} detached subtrees");
        }
        released
    }

    /// Nodes currently allocated in the arena, freed ones excluded.
    pub fn node_count(&self) -> usize {
        self.dom.iter().filter(|node| !node.is_removed()).count()
    }

    /// Deep-copy `node` from another document into this one, returning the detached copy.
    pub fn adopt(&mut self, source: &Self, node: NodeId) -> Option<NodeId> {
        let data = source.node(node)?.clone();
        let copy = self.dom.new_node(data);
        for child in node.children(&source.dom) {
            if let Some(child_copy) = self.adopt(source, child) {
                copy.append(child_copy, &mut self.dom);
            }
        }
        Some(copy)
    }

    // -----------------------
    // Attributes and control state
    // -----------------------

    #[inline]
    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?.attr(name)
    }

    /// Set an attribute and queue an attribute record.
    ///
    /// # Errors
    /// Returns an error if `node` is unknown.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), Error> {
        self.node_mut(node)?.set_attr(name, value);
        self.queue(MutationRecord {
            kind: MutationKind::Attributes {
                name: name.to_ascii_lowercase(),
            },
            target: node,
            added: Vec::new(),
            removed: Vec::new(),
        });
        Ok(())
    }

    /// # Errors
    /// Returns an error if `node` is unknown.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), Error> {
        if self.node_mut(node)?.remove_attr(name).is_some() {
            self.queue(MutationRecord {
                kind: MutationKind::Attributes {
                    name: name.to_ascii_lowercase(),
                },
                target: node,
                added: Vec::new(),
                removed: Vec::new(),
            });
        }
        Ok(())
    }

    /// Add a class token unless it is already present.
    ///
    /// # Errors
    /// Returns an error if `node` is unknown.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), Error> {
        let data = self.node(node).ok_or_else(|| anyhow!("Unknown node {node:?}"))?;
        if data.has_class(class) {
            return Ok(());
        }
        let mut classes: Vec<&str> = data.classes().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attribute(node, "class", &joined)
    }

    #[inline]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).is_some_and(|data| data.has_class(class))
    }

    /// Override the current value of a form control (like assigning `.value`).
    ///
    /// # Errors
    /// Returns an error if `node` is unknown.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), Error> {
        self.node_mut(node)?.state.value = Some(value.to_owned());
        Ok(())
    }

    /// # Errors
    /// Returns an error if `node` is unknown.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<(), Error> {
        self.node_mut(node)?.state.checked = Some(checked);
        Ok(())
    }

    /// # Errors
    /// Returns an error if `node` is unknown.
    pub fn set_selected(&mut self, node: NodeId, selected: bool) -> Result<(), Error> {
        self.node_mut(node)?.state.selected = Some(selected);
        Ok(())
    }

    // -----------------------
    // Traversal
    // -----------------------

    #[inline]
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.node(node)?.tag()
    }

    #[inline]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.dom.get(node)?.parent()
    }

    /// The parent if it is an element (not the document node).
    #[inline]
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node)
            .filter(|parent| self.node(*parent).is_some_and(DOMNode::is_element))
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        if self.dom.get(node).is_none() {
            return Vec::new();
        }
        node.children(&self.dom).collect()
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        if self.dom.get(node).is_none() {
            return Vec::new();
        }
        node.children(&self.dom)
            .filter(|child| self.node(*child).is_some_and(DOMNode::is_element))
            .collect()
    }

    /// Descendants of `node` in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.dom
            .get(node)
            .map(|_| node.descendants(&self.dom).skip(1))
            .into_iter()
            .flatten()
    }

    #[inline]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.dom.get(node).is_some() && is_inclusive_ancestor(&self.dom, ancestor, node)
    }

    /// Whether `node` is currently reachable from the document root.
    #[inline]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        if self.dom.get(node).is_none() {
            return String::new();
        }
        node.descendants(&self.dom)
            .filter_map(|current| match &self.node(current)?.kind {
                NodeKind::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    // -----------------------
    // Selector queries
    // -----------------------

    /// First descendant element of `scope` matching `selector`, in document order.
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .find(|node| selector.matches(self, *node))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|node| selector.matches(self, *node))
            .collect()
    }

    /// Parse `selector` and run [`Self::query_selector`].
    ///
    /// # Errors
    /// Returns an error if `selector` does not parse.
    pub fn query(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, Error> {
        Ok(self.query_selector(scope, &Selector::parse(selector)?))
    }

    /// Parse `selector` and run [`Self::query_selector_all`].
    ///
    /// # Errors
    /// Returns an error if `selector` does not parse.
    pub fn query_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, Error> {
        Ok(self.query_selector_all(scope, &Selector::parse(selector)?))
    }

    /// # Errors
    /// Returns an error if `selector` does not parse.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, Error> {
        Ok(Selector::parse(selector)?.matches(self, node))
    }

    // -----------------------
    // Mutation observers
    // -----------------------

    /// Start observing `target`. Records are delivered on [`Self::flush_mutations`].
    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> MutationObserver {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.registrations.push(Registration {
            id,
            target,
            options,
            pending: Vec::new(),
            sender,
        });
        MutationObserver::new(id, target, receiver)
    }

    /// Stop delivering records to `observer`, dropping anything still queued.
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.registrations
            .retain(|registration| registration.id != observer);
    }

    #[inline]
    pub fn has_observers(&self) -> bool {
        !self.registrations.is_empty()
    }

    fn queue(&mut self, record: MutationRecord) {
        for registration in &mut self.registrations {
            if !registration.options.wants(&record.kind) {
                continue;
            }
            let in_scope = registration.target == record.target
                || (registration.options.subtree
                    && is_inclusive_ancestor(&self.dom, registration.target, record.target));
            if in_scope {
                registration.pending.push(record.clone());
            }
        }
    }

    /// Deliver every registration's queued records as one batch. Returns the number of
    /// batches sent. Registrations whose observer was dropped are pruned.
    pub fn flush_mutations(&mut self) -> usize {
        self.flushes += 1;
        let mut delivered = 0;
        self.registrations.retain_mut(|registration| {
            if registration.pending.is_empty() {
                return !registration.sender.is_closed();
            }
            let batch = core::mem::take(&mut registration.pending);
            trace!(target: "dom", "observer {:?}: delivering {} records", registration.id, batch.len());
            if registration.sender.send(batch).is_err() {
                return false;
            }
            delivered += 1;
            true
        });
        delivered
    }

    // -----------------------
    // Events
    // -----------------------

    pub fn add_event_listener(&mut self, node: NodeId, event_type: EventType) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener {
            id,
            node,
            event_type,
        });
        id
    }

    /// Returns `true` if a listener was removed.
    pub fn remove_event_listener(&mut self, listener: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|current| current.id != listener);
        self.listeners.len() != before
    }

    /// Collect the listeners an event on `target` reaches while bubbling to the root.
    pub fn dispatch_event(&self, target: NodeId, event_type: EventType) -> DispatchedEvent {
        if self.dom.get(target).is_none() {
            return DispatchedEvent {
                event_type,
                target,
                listeners: Vec::new(),
            };
        }
        let listeners = target
            .ancestors(&self.dom)
            .flat_map(|node| {
                self.listeners
                    .iter()
                    .filter(move |listener| listener.node == node && listener.event_type == event_type)
                    .map(|listener| listener.id)
            })
            .collect();
        DispatchedEvent {
            event_type,
            target,
            listeners,
        }
    }
}

//! Headless model of a host page's DOM.
//!
//! The document is an indextree arena. Mutations made through [`Document`] are
//! queued for interested [`MutationObserver`]s and delivered in batches, event
//! dispatch reports which listeners a bubbling event reaches, and html5ever
//! provides the parser for pages and server-rendered fragments.
#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

pub mod document;
pub mod events;
mod forms;
pub mod mutation;
pub mod node;
pub mod parser;
mod printing;
pub mod selector;

pub use document::Document;
pub use events::{DispatchedEvent, EventType, ListenerId};
pub use indextree::NodeId;
pub use mutation::{MutationKind, MutationObserver, MutationRecord, ObserveOptions, ObserverId};
pub use node::{ControlState, DOMNode, NodeKind};
pub use parser::{Fragment, parse_fragment, parse_html};
pub use selector::Selector;

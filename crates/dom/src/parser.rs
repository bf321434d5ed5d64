//! HTML parsing into a [`Document`] using html5ever.

use crate::{DOMNode, Document, NodeKind};
use anyhow::Error;
use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{
    ParseOpts, QualName, local_name, ns, parse_document, parse_fragment as parse_html_fragment,
};
use indextree::NodeId;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use url::Url;

fn walk_tree(handle: &Handle, parent: NodeId, doc: &mut Document) -> Result<(), Error> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let node = doc.create_element(&name.local);
            for attr in &*attrs.borrow() {
                doc.set_attribute(node, &attr.name.local, &attr.value)?;
            }
            doc.append_child(parent, node)?;
            for child in &*handle.children.borrow() {
                walk_tree(child, node, doc)?;
            }
        }
        NodeData::Text { contents } => {
            let node = doc.create_text(&contents.borrow());
            doc.append_child(parent, node)?;
        }
        NodeData::Comment { contents } => {
            let node = doc.create_comment(contents);
            doc.append_child(parent, node)?;
        }
        NodeData::Document => {
            for child in &*handle.children.borrow() {
                walk_tree(child, parent, doc)?;
            }
        }
        _ => {
            // Doctypes and processing instructions carry nothing we read.
        }
    }
    Ok(())
}

fn parse_opts() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: false,
            ..TreeBuilderOpts::default()
        },
        ..ParseOpts::default()
    }
}

fn parse_to_rcdom(html: &str) -> Result<RcDom, Error> {
    Ok(parse_document(RcDom::default(), parse_opts())
        .from_utf8()
        .read_from(&mut html.as_bytes())?)
}

/// Parse a full HTML page.
///
/// The document is built before any observer can exist, so construction emits no
/// records anyone sees.
///
/// # Errors
/// Returns an error if the html5ever sink fails to read the input.
pub fn parse_html(html: &str, url: Option<Url>) -> Result<Document, Error> {
    let dom = parse_to_rcdom(html)?;
    let mut doc = url.map_or_else(Document::new, Document::with_url);
    let root = doc.root();
    walk_tree(&dom.document, root, &mut doc)?;
    Ok(doc)
}

/// A parsed fragment: its own scratch document and the top-level nodes of the fragment.
#[derive(Debug)]
pub struct Fragment {
    pub doc: Document,
    pub nodes: Vec<NodeId>,
}

impl Fragment {
    /// The element the fragment starts with. Only whitespace and comments may precede it;
    /// leading text or an empty fragment yields `None`.
    pub fn first_element(&self) -> Option<NodeId> {
        let leading = self.nodes.iter().copied().find(|node| {
            self.doc.node(*node).is_some_and(|data| match &data.kind {
                NodeKind::Text { text } => !text.trim().is_empty(),
                NodeKind::Comment { .. } => false,
                NodeKind::Element { .. } | NodeKind::Document => true,
            })
        })?;
        self.doc
            .node(leading)
            .is_some_and(DOMNode::is_element)
            .then_some(leading)
    }
}

/// Parse a markup fragment (e.g. a server-rendered partial) the way `innerHTML` on a
/// `<div>` would. Nothing is hoisted into a `<head>`, so the top-level nodes are exactly
/// what the markup starts with.
///
/// # Errors
/// Returns an error if the html5ever sink fails to read the input.
pub fn parse_fragment(html: &str) -> Result<Fragment, Error> {
    let context = QualName::new(None, ns!(html), local_name!("div"));
    let dom = parse_html_fragment(RcDom::default(), parse_opts(), context, Vec::new(), false)
        .from_utf8()
        .read_from(&mut html.as_bytes())?;
    let mut doc = Document::new();
    let root = doc.root();
    // Fragment parsing roots the result in a synthetic <html> element.
    for wrapper in &*dom.document.children.borrow() {
        for child in &*wrapper.children.borrow() {
            walk_tree(child, root, &mut doc)?;
        }
    }
    let nodes = doc.children(root);
    Ok(Fragment { doc, nodes })
}

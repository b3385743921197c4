//! Pick - a small selection-and-mutation layer over a host document
//!
//! ```text
//! pick(doc, "button")         → Picked::Selection(Selection)   chainable wrapper
//! pick(doc, node_id)          → Picked::Selection(Selection)   single node
//! pick(doc, Selector::ready)  → Picked::Ready                  runs once on ready
//! ```
//!
//! The document is always passed in explicitly; there is no global. Any
//! [`Document`] implementation works, [`MemoryDocument`] is the in-memory one.
//!
//! ```ignore
//! select(&doc, ".item")
//!     .set_text("Good job!")?
//!     .set_css("font-size", "20px")?
//!     .set_attr("title", "No more clicks allowed!")?;
//! ```

pub mod selection;

pub use dom::{
    listener, Document, DomError, DomEvent, Listener, MemoryDocument, NodeId, ReadyCallback,
    Result,
};
pub use selection::{Selection, Target};

/// Argument of [`pick`]
pub enum Selector {
    Css(String),
    Node(NodeId),
    Ready(ReadyCallback),
}

impl Selector {
    pub fn ready<F>(callback: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Selector::Ready(Box::new(callback))
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Css(css) => f.debug_tuple("Css").field(css).finish(),
            Selector::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Selector::Ready(_) => f.write_str("Ready(..)"),
        }
    }
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Selector::Css(css.to_string())
    }
}

impl From<String> for Selector {
    fn from(css: String) -> Self {
        Selector::Css(css)
    }
}

impl From<NodeId> for Selector {
    fn from(node: NodeId) -> Self {
        Selector::Node(node)
    }
}

/// Result of [`pick`]
pub enum Picked<'d, D: Document + ?Sized> {
    /// A ready callback was registered; there is nothing to chain on
    Ready,
    Selection(Selection<'d, D>),
}

impl<'d, D: Document + ?Sized> Picked<'d, D> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Picked::Ready)
    }

    pub fn into_selection(self) -> Option<Selection<'d, D>> {
        match self {
            Picked::Ready => None,
            Picked::Selection(selection) => Some(selection),
        }
    }
}

/// Selection factory
pub fn pick<'d, D>(document: &'d D, selector: impl Into<Selector>) -> Picked<'d, D>
where
    D: Document + ?Sized,
{
    match selector.into() {
        Selector::Ready(callback) => {
            document.on_ready(callback);
            Picked::Ready
        }
        Selector::Css(css) => Picked::Selection(Selection::new(document, Target::Css(css))),
        Selector::Node(node) => Picked::Selection(Selection::new(document, Target::Node(node))),
    }
}

/// Select by CSS selector
pub fn select<'d, D>(document: &'d D, css: impl Into<String>) -> Selection<'d, D>
where
    D: Document + ?Sized,
{
    Selection::new(document, Target::Css(css.into()))
}

/// Select a single node, e.g. the target of an event
pub fn node<D>(document: &D, node: NodeId) -> Selection<'_, D>
where
    D: Document + ?Sized,
{
    Selection::new(document, Target::Node(node))
}

/// Run `callback` once the document is ready
pub fn ready<D, F>(document: &D, callback: F)
where
    D: Document + ?Sized,
    F: FnOnce() + 'static,
{
    document.on_ready(Box::new(callback));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_pick_dispatches_on_selector_kind() {
        let doc = MemoryDocument::from_html("<p class='a'>x</p>").unwrap();

        let by_css = pick(&doc, "p.a").into_selection().unwrap();
        assert_eq!(by_css.target(), &Target::Css("p.a".to_string()));
        assert_eq!(by_css.len().unwrap(), 1);

        let p = by_css.first().unwrap().unwrap();
        let by_node = pick(&doc, p).into_selection().unwrap();
        assert_eq!(by_node.text().unwrap().as_deref(), Some("x"));

        let registered = pick(&doc, Selector::ready(|| {}));
        assert!(registered.is_ready());
        assert!(registered.into_selection().is_none());
    }

    #[test]
    fn test_ready_callback_waits_for_signal() {
        let doc = MemoryDocument::new();
        let runs = Rc::new(Cell::new(0));

        let r = Rc::clone(&runs);
        pick(&doc, Selector::ready(move || r.set(r.get() + 1)));
        let r = Rc::clone(&runs);
        ready(&doc, move || r.set(r.get() + 10));
        assert_eq!(runs.get(), 0);

        doc.fire_ready();
        doc.fire_ready();
        assert_eq!(runs.get(), 11);
    }

    #[test]
    fn test_works_through_trait_object() {
        let doc = MemoryDocument::from_html("<b>1</b><b>2</b>").unwrap();
        let host: &dyn Document = &doc;

        select(host, "b").set_text("z").unwrap();
        assert_eq!(select(host, "b").text().unwrap().as_deref(), Some("z"));
        assert_eq!(doc.outer_html(doc.root()).unwrap(), "<b>z</b><b>z</b>");
        assert_eq!(node(host, doc.root()).nodes().unwrap(), vec![doc.root()]);
    }

    #[test]
    fn test_selector_debug() {
        assert_eq!(format!("{:?}", Selector::from("a")), "Css(\"a\")");
        assert_eq!(format!("{:?}", Selector::from(4u32)), "Node(4)");
        assert_eq!(format!("{:?}", Selector::ready(|| {})), "Ready(..)");
    }
}

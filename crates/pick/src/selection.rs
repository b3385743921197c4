//! Selection - the chainable wrapper
//!
//! A selection remembers *what* to select, never *which nodes* it selected.
//! Every operation re-resolves the target against the document, so a
//! selection always reflects the current host state and is never stale.
//!
//! Mutating operations apply to every matched node and return the selection
//! for chaining. Getters read the first matched node only and fall back to
//! the caller's default (or `None`) when there is no node or no value.

use dom::{Document, Listener, NodeId, Result};

/// What a selection resolves against the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// CSS selector, re-queried on every access
    Css(String),
    /// A single node reference (element, or the document itself)
    Node(NodeId),
}

pub struct Selection<'d, D: Document + ?Sized> {
    document: &'d D,
    target: Target,
}

impl<'d, D: Document + ?Sized> Clone for Selection<'d, D> {
    fn clone(&self) -> Self {
        Self {
            document: self.document,
            target: self.target.clone(),
        }
    }
}

impl<'d, D: Document + ?Sized> std::fmt::Debug for Selection<'d, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<'d, D: Document + ?Sized> Selection<'d, D> {
    pub fn new(document: &'d D, target: Target) -> Self {
        Self { document, target }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn document(&self) -> &'d D {
        self.document
    }

    /// Resolve the stack afresh
    fn query(&self) -> Result<Vec<NodeId>> {
        match &self.target {
            Target::Css(selector) => self.document.query_selector_all(selector),
            Target::Node(node) => Ok(vec![*node]),
        }
    }

    /// The nodes currently matched, in document order
    pub fn nodes(&self) -> Result<Vec<NodeId>> {
        self.query()
    }

    pub fn first(&self) -> Result<Option<NodeId>> {
        Ok(self.query()?.first().copied())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.query()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.query()?.is_empty())
    }

    /// Call `callback(node, index, total)` for every matched node
    pub fn each<F>(&self, mut callback: F) -> Result<&Self>
    where
        F: FnMut(NodeId, usize, usize),
    {
        let stack = self.query()?;
        let total = stack.len();
        for (index, node) in stack.into_iter().enumerate() {
            callback(node, index, total);
        }
        Ok(self)
    }

    /// Apply a host operation to every matched node, stopping at the first error
    fn apply<F>(&self, operation: &str, mut op: F) -> Result<&Self>
    where
        F: FnMut(NodeId) -> Result<()>,
    {
        let stack = self.query()?;
        tracing::trace!(selection = ?self.target, operation, nodes = stack.len(), "apply");
        for node in stack {
            op(node)?;
        }
        Ok(self)
    }

    pub fn on(&self, event_type: &str, handler: &Listener) -> Result<&Self> {
        self.apply("on", |node| {
            self.document.add_event_listener(node, event_type, handler)
        })
    }

    /// Detach `handler`; it must be the same `Rc` that was passed to [`on`](Self::on)
    pub fn off(&self, event_type: &str, handler: &Listener) -> Result<&Self> {
        self.apply("off", |node| {
            self.document.remove_event_listener(node, event_type, handler)
        })
    }

    /// Text content of the first node
    pub fn text(&self) -> Result<Option<String>> {
        match self.first()? {
            Some(node) => self.document.text_content(node),
            None => Ok(None),
        }
    }

    pub fn text_or(&self, default: &str) -> Result<String> {
        Ok(self.text()?.unwrap_or_else(|| default.to_string()))
    }

    pub fn set_text(&self, value: &str) -> Result<&Self> {
        self.apply("set_text", |node| self.document.set_text_content(node, value))
    }

    /// Inner markup of the first node
    pub fn html(&self) -> Result<Option<String>> {
        match self.first()? {
            Some(node) => self.document.inner_html(node).map(Some),
            None => Ok(None),
        }
    }

    pub fn html_or(&self, default: &str) -> Result<String> {
        Ok(self.html()?.unwrap_or_else(|| default.to_string()))
    }

    pub fn set_html(&self, value: &str) -> Result<&Self> {
        self.apply("set_html", |node| self.document.set_inner_html(node, value))
    }

    /// Inline style property of the first node; empty counts as unset
    pub fn css(&self, name: &str) -> Result<Option<String>> {
        match self.first()? {
            Some(node) => self.document.style_property(node, name),
            None => Ok(None),
        }
    }

    pub fn css_or(&self, name: &str, default: &str) -> Result<String> {
        Ok(self.css(name)?.unwrap_or_else(|| default.to_string()))
    }

    /// Set an inline style property on every node; `""` removes it
    pub fn set_css(&self, name: &str, value: &str) -> Result<&Self> {
        self.apply("set_css", |node| {
            self.document.set_style_property(node, name, value)
        })
    }

    pub fn attr(&self, name: &str) -> Result<Option<String>> {
        match self.first()? {
            Some(node) => self.document.attribute(node, name),
            None => Ok(None),
        }
    }

    pub fn attr_or(&self, name: &str, default: &str) -> Result<String> {
        Ok(self.attr(name)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn set_attr(&self, name: &str, value: &str) -> Result<&Self> {
        self.apply("set_attr", |node| self.document.set_attribute(node, name, value))
    }

    pub fn del_attr(&self, name: &str) -> Result<&Self> {
        self.apply("del_attr", |node| self.document.remove_attribute(node, name))
    }
}

//! The host document boundary
//!
//! Everything a selection does goes through this trait. The production host
//! in this crate is [`MemoryDocument`](crate::MemoryDocument); embedders can
//! implement it over a real browser binding.
//!
//! All methods take `&self`: hosts are expected to use interior mutability,
//! because event listeners re-enter the document while it dispatches.
//! Errors are the host's own; callers propagate them untouched.

use crate::error::Result;
use crate::events::{Listener, ReadyCallback};
use crate::types::NodeId;

pub trait Document {
    /// Element descendants of the document matching `selector`, in document order
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>>;

    /// DOM `textContent`; `None` for nodes that have none (the document itself)
    fn text_content(&self, node: NodeId) -> Result<Option<String>>;

    fn set_text_content(&self, node: NodeId, text: &str) -> Result<()>;

    fn inner_html(&self, node: NodeId) -> Result<String>;

    fn set_inner_html(&self, node: NodeId, html: &str) -> Result<()>;

    /// Inline style property; an unset or empty property is `None`
    fn style_property(&self, node: NodeId, name: &str) -> Result<Option<String>>;

    /// Set an inline style property; an empty value removes it
    fn set_style_property(&self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>>;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<()>;

    fn add_event_listener(&self, node: NodeId, event_type: &str, listener: &Listener)
        -> Result<()>;

    fn remove_event_listener(
        &self,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> Result<()>;

    /// Run `callback` once, when the document signals it is ready
    fn on_ready(&self, callback: ReadyCallback);
}

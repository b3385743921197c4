//! MemoryDocument - in-memory host document
//!
//! Arena-backed implementation of [`Document`]. It is what tests run
//! against, and it doubles as a headless host for embedders:
//!
//! - Construction from HTML markup or from a CDP `DOM.getDocument` response
//! - Listener registry with bubbling dispatch
//! - One-shot ready signal (`DOMContentLoaded`)
//!
//! Single-threaded by construction (`RefCell` + `Rc` listeners). No borrow
//! is held while user code runs, so listeners and ready callbacks may call
//! back into the document.
//!
//! ## Node storage
//!
//! Node IDs are arena indices and stay valid for the document's lifetime,
//! so nodes replaced by `set_inner_html` (or removed) are detached, not
//! freed. The arena grows with the amount of markup written. Two paths do
//! not grow it: `set_text_content` reuses the element's existing text
//! node, and a failed `set_inner_html` drops everything it parsed.

use std::cell::{Ref, RefCell};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::arena::DomArena;
use crate::document::Document;
use crate::error::{DomError, Result};
use crate::events::{DomEvent, Listener, ListenerRegistry, ReadyCallback};
use crate::markup;
use crate::selector::SelectorList;
use crate::style::StyleDeclarations;
use crate::types::{is_raw_text_element, DomNode, NodeId, NodeType};
use crate::utils;

/// What happens to ready callbacks registered after the ready signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateReady {
    /// Run the callback right away, inside `on_ready`
    RunImmediately,
    /// Drop the callback (plain `DOMContentLoaded` listener semantics)
    Discard,
}

/// Configuration for MemoryDocument
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub initial_capacity: usize,
    pub bubble_events: bool,
    pub late_ready: LateReady,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            bubble_events: true,
            late_ready: LateReady::RunImmediately,
        }
    }
}

enum ReadyState {
    Loading(Vec<ReadyCallback>),
    Complete,
}

pub struct MemoryDocument {
    config: DocumentConfig,
    arena: RefCell<DomArena>,
    /// Detached fragment `set_inner_html` parses into
    staging: NodeId,
    listeners: RefCell<ListenerRegistry>,
    ready: RefCell<ReadyState>,
}

impl MemoryDocument {
    /// Empty document with default config
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Empty document (a lone `#document` root) with custom config
    pub fn with_config(config: DocumentConfig) -> Self {
        let mut arena = DomArena::with_capacity(config.initial_capacity);
        let root = arena.add_node(DomNode::document(0));
        // The node was just added, so this cannot fail
        let _ = arena.set_root(root);
        Self::from_arena(arena, config)
    }

    fn from_arena(mut arena: DomArena, config: DocumentConfig) -> Self {
        let staging = arena.add_node(DomNode::new(
            0,
            NodeType::DocumentFragment,
            "#document-fragment".to_string(),
        ));

        Self {
            config,
            arena: RefCell::new(arena),
            staging,
            listeners: RefCell::new(ListenerRegistry::new()),
            ready: RefCell::new(ReadyState::Loading(Vec::new())),
        }
    }

    /// Parse `html` into a fresh document
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, DocumentConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: DocumentConfig) -> Result<Self> {
        let doc = Self::with_config(config);
        {
            let mut arena = doc.arena.borrow_mut();
            let root = doc.root_in(&arena)?;
            let top = markup::parse_fragment(&mut arena, root, html)?;
            tracing::debug!("Loaded document: {} top-level nodes, {} total", top.len(), arena.len());
        }
        Ok(doc)
    }

    /// Build a document from a CDP `DOM.getDocument` response
    ///
    /// Input format:
    /// ```json
    /// {
    ///   "root": {
    ///     "nodeId": 1,
    ///     "backendNodeId": 1,
    ///     "nodeType": 9,
    ///     "nodeName": "#document",
    ///     "children": [...]
    ///   }
    /// }
    /// ```
    ///
    /// Frames and shadow roots are not part of the queried tree and are skipped.
    pub fn from_cdp_document(cdp_response: &Value) -> Result<Self> {
        Self::from_cdp_document_with_config(cdp_response, DocumentConfig::default())
    }

    pub fn from_cdp_document_with_config(
        cdp_response: &Value,
        config: DocumentConfig,
    ) -> Result<Self> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::Snapshot("Missing 'root' in CDP response".to_string()))?;

        let mut arena = DomArena::with_capacity(config.initial_capacity);
        let root_id = parse_cdp_node(&mut arena, root, None)?;
        arena.set_root(root_id)?;
        tracing::debug!("Loaded CDP document: {} nodes", arena.len());

        Ok(Self::from_arena(arena, config))
    }

    fn root_in(&self, arena: &DomArena) -> Result<NodeId> {
        arena
            .root_id()
            .ok_or_else(|| DomError::Snapshot("Document has no root".to_string()))
    }

    /// The document node itself (a valid event target)
    pub fn root(&self) -> NodeId {
        // Every constructor sets a root
        self.arena.borrow().root_id().unwrap_or(0)
    }

    /// Read access to the underlying tree
    pub fn arena(&self) -> Ref<'_, DomArena> {
        self.arena.borrow()
    }

    pub fn get_element_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        self.arena.borrow().find_by_id(id)
    }

    /// Node that was loaded with the given CDP backend node ID
    pub fn node_by_backend_id(&self, backend_id: u32) -> Option<NodeId> {
        self.arena.borrow().get_node_id_by_backend(backend_id)
    }

    pub fn outer_html(&self, node: NodeId) -> Result<String> {
        markup::outer_html(&self.arena.borrow(), node)
    }

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.arena.borrow_mut().add_node(DomNode::element(0, tag))
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.arena.borrow_mut().append_child(parent, child)
    }

    /// Detach a node from the tree; it stays addressable but no query finds it
    pub fn remove(&self, node: NodeId) -> Result<()> {
        self.arena.borrow_mut().detach(node)
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners.borrow().count(node, event_type)
    }

    /// Dispatch an event at `node`; returns how many listeners ran
    ///
    /// Listeners on the target run first, then (if bubbling is enabled)
    /// those on each ancestor up to the document. A listener removed by an
    /// earlier listener of the same dispatch does not run.
    pub fn dispatch_event(&self, node: NodeId, event_type: &str) -> Result<usize> {
        let path = {
            let arena = self.arena.borrow();
            arena.get(node)?;
            let mut path = vec![node];
            if self.config.bubble_events {
                path.extend(arena.ancestors(node)?);
            }
            path
        };

        let mut invoked = 0;
        for current in path {
            let snapshot = self.listeners.borrow().listeners_for(current, event_type);
            for listener in snapshot {
                if !self.listeners.borrow().contains(current, event_type, &listener) {
                    continue;
                }
                let event = DomEvent {
                    event_type: event_type.to_string(),
                    target: node,
                    current_target: current,
                };
                (*listener)(&event);
                invoked += 1;
            }
        }

        tracing::debug!("Dispatched '{}' at node {}: {} listeners", event_type, node, invoked);
        Ok(invoked)
    }

    /// Fire the ready signal; returns how many callbacks ran
    ///
    /// Only the first call has any effect.
    pub fn fire_ready(&self) -> usize {
        let pending = match std::mem::replace(&mut *self.ready.borrow_mut(), ReadyState::Complete)
        {
            ReadyState::Loading(pending) => pending,
            ReadyState::Complete => return 0,
        };

        tracing::debug!("Document ready: running {} callbacks", pending.len());
        let count = pending.len();
        for callback in pending {
            callback();
        }
        count
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.ready.borrow(), ReadyState::Complete)
    }

    /// Run `f` against an element node, failing for any other node type
    fn with_element<T>(&self, node: NodeId, f: impl FnOnce(&DomNode) -> T) -> Result<T> {
        let arena = self.arena.borrow();
        let element = arena.get(node)?;
        if !element.is_element() {
            return Err(DomError::NotAnElement(node));
        }
        Ok(f(element))
    }

    fn with_element_mut<T>(&self, node: NodeId, f: impl FnOnce(&mut DomNode) -> T) -> Result<T> {
        let mut arena = self.arena.borrow_mut();
        let element = arena.get_mut(node)?;
        if !element.is_element() {
            return Err(DomError::NotAnElement(node));
        }
        Ok(f(element))
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selectors = SelectorList::parse(selector)?;
        let arena = self.arena.borrow();
        let matched = selectors.query(&arena, self.root_in(&arena)?)?;
        tracing::trace!("querySelectorAll('{}') -> {} nodes", selector, matched.len());
        Ok(matched)
    }

    fn text_content(&self, node: NodeId) -> Result<Option<String>> {
        let arena = self.arena.borrow();
        let target = arena.get(node)?;
        match target.node_type {
            NodeType::Element | NodeType::DocumentFragment => {
                Ok(Some(utils::get_text_content(&arena, node)?))
            }
            NodeType::Text
            | NodeType::Comment
            | NodeType::CdataSection
            | NodeType::ProcessingInstruction => Ok(Some(target.node_value.clone())),
            _ => Ok(None),
        }
    }

    fn set_text_content(&self, node: NodeId, text: &str) -> Result<()> {
        let mut arena = self.arena.borrow_mut();
        match arena.get(node)?.node_type {
            NodeType::Element | NodeType::DocumentFragment => {
                let reusable = arena
                    .get(node)?
                    .children_ids
                    .iter()
                    .copied()
                    .find(|&child| arena.get(child).map_or(false, DomNode::is_text));

                arena.clear_children(node)?;
                if !text.is_empty() {
                    let child = match reusable {
                        Some(child) => {
                            arena.get_mut(child)?.node_value = text.to_string();
                            child
                        }
                        None => arena.add_node(DomNode::text(0, text)),
                    };
                    arena.append_child(node, child)?;
                }
            }
            NodeType::Text
            | NodeType::Comment
            | NodeType::CdataSection
            | NodeType::ProcessingInstruction => {
                arena.get_mut(node)?.node_value = text.to_string();
            }
            // Setting textContent on a document or doctype does nothing
            _ => {}
        }
        Ok(())
    }

    fn inner_html(&self, node: NodeId) -> Result<String> {
        self.with_element(node, |_| ())?;
        markup::inner_html(&self.arena.borrow(), node)
    }

    fn set_inner_html(&self, node: NodeId, html: &str) -> Result<()> {
        let tag = self.with_element(node, |element| element.node_name.clone())?;
        if is_raw_text_element(&tag) {
            return self.set_text_content(node, html);
        }

        let mut arena = self.arena.borrow_mut();
        // Parse aside first so a malformed fragment leaves the node untouched
        arena.clear_children(self.staging)?;
        let mark = arena.len();
        let parsed = match markup::parse_fragment(&mut arena, self.staging, html) {
            Ok(parsed) => parsed,
            Err(e) => {
                arena.truncate(mark);
                return Err(e);
            }
        };

        arena.clear_children(node)?;
        for child in parsed {
            arena.append_child(node, child)?;
        }
        Ok(())
    }

    fn style_property(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        self.with_element(node, |element| {
            element.attr("style").and_then(|text| {
                StyleDeclarations::parse(text)
                    .get(name)
                    .map(str::to_string)
            })
        })
    }

    fn set_style_property(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.with_element_mut(node, |element| {
            let mut decls = StyleDeclarations::parse(element.attr("style").unwrap_or(""));
            if !decls.set(name, value) {
                // Ignored like an invalid assignment to `element.style`
                tracing::debug!("Rejected value for style property '{}': {:?}", name, value);
                return;
            }
            if decls.is_empty() {
                element.remove_attr("style");
            } else {
                element.set_attr("style", decls.to_css_text());
            }
        })
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        self.with_element(node, |element| element.attr(name).map(str::to_string))
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        validate_attribute_name(name)?;
        self.with_element_mut(node, |element| element.set_attr(name, value))
    }

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<()> {
        self.with_element_mut(node, |element| {
            element.remove_attr(name);
        })
    }

    fn add_event_listener(
        &self,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> Result<()> {
        self.arena.borrow().get(node)?;
        if self.listeners.borrow_mut().add(node, event_type, listener) {
            tracing::debug!("Added '{}' listener on node {}", event_type, node);
        }
        Ok(())
    }

    fn remove_event_listener(
        &self,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> Result<()> {
        self.arena.borrow().get(node)?;
        if self.listeners.borrow_mut().remove(node, event_type, listener) {
            tracing::debug!("Removed '{}' listener from node {}", event_type, node);
        }
        Ok(())
    }

    fn on_ready(&self, callback: ReadyCallback) {
        {
            let mut state = self.ready.borrow_mut();
            if let ReadyState::Loading(pending) = &mut *state {
                pending.push(callback);
                return;
            }
        }

        match self.config.late_ready {
            LateReady::RunImmediately => callback(),
            LateReady::Discard => {
                tracing::warn!("Ready callback registered after document was ready; discarded")
            }
        }
    }
}

/// Reject names `setAttribute` would throw on
fn validate_attribute_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        });
    if invalid {
        return Err(DomError::InvalidAttributeName(name.to_string()));
    }
    Ok(())
}

/// Recursively parse a CDP node and its children into the arena
fn parse_cdp_node(arena: &mut DomArena, cdp_node: &Value, parent_id: Option<NodeId>) -> Result<NodeId> {
    let node_type_val = cdp_node["nodeType"]
        .as_u64()
        .ok_or_else(|| DomError::Snapshot("Missing nodeType".to_string()))?;

    let node_type = u8::try_from(node_type_val)
        .ok()
        .and_then(NodeType::from_u8)
        .ok_or_else(|| DomError::InvalidNodeType {
            expected: "valid NodeType".to_string(),
            actual: node_type_val.to_string(),
        })?;

    let node_name = cdp_node["nodeName"].as_str().unwrap_or("");
    let mut node = match node_type {
        NodeType::Element => DomNode::element(0, node_name),
        NodeType::DocumentType => DomNode::new(0, node_type, node_name.to_ascii_lowercase()),
        _ => DomNode::new(0, node_type, node_name.to_string()),
    };
    node.node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();
    node.backend_node_id = cdp_node["backendNodeId"]
        .as_u64()
        .and_then(|id| u32::try_from(id).ok());

    // Attributes arrive flattened: [name0, value0, name1, value1, ...]
    if let Some(attrs) = cdp_node["attributes"].as_array() {
        for pair in attrs.chunks_exact(2) {
            if let (Some(key), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                node.set_attr(key, value);
            }
        }
    }

    let node_id = arena.add_node(node);
    if let Some(parent_id) = parent_id {
        arena.append_child(parent_id, node_id)?;
    }

    if let Some(children) = cdp_node["children"].as_array() {
        for child in children {
            parse_cdp_node(arena, child, Some(node_id))?;
        }
    }

    Ok(node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::listener;
    use std::cell::Cell;
    use std::rc::Rc;

    const PAGE: &str = r#"<div id="outer"><button id="go" class="btn">Go</button><p id="msg" style="color: red">Hello <b>world</b></p></div>"#;

    fn counter() -> (Rc<Cell<usize>>, Listener) {
        let calls = Rc::new(Cell::new(0));
        let handler = {
            let calls = Rc::clone(&calls);
            listener(move |_| calls.set(calls.get() + 1))
        };
        (calls, handler)
    }

    #[test]
    fn test_query_and_text() {
        let doc = MemoryDocument::from_html(PAGE).unwrap();
        let msg = doc.get_element_by_id("msg").unwrap().unwrap();

        assert_eq!(doc.query_selector_all("div > *").unwrap().len(), 2);
        assert_eq!(doc.text_content(msg).unwrap().as_deref(), Some("Hello world"));
        assert_eq!(doc.text_content(doc.root()).unwrap(), None);

        doc.set_text_content(msg, "<plain>").unwrap();
        assert_eq!(doc.inner_html(msg).unwrap(), "&lt;plain&gt;");
        assert!(doc.query_selector_all("b").unwrap().is_empty());

        let go = doc.get_element_by_id("go").unwrap().unwrap();
        doc.remove(go).unwrap();
        assert!(doc.query_selector_all(".btn").unwrap().is_empty());
        assert_eq!(doc.arena().get(go).unwrap().node_name, "button");
    }

    #[test]
    fn test_create_and_append() {
        let doc = MemoryDocument::new();
        let li = doc.create_element("LI");
        assert!(doc.query_selector_all("li").unwrap().is_empty());

        doc.append_child(doc.root(), li).unwrap();
        doc.set_attribute(li, "class", "new").unwrap();
        assert_eq!(doc.query_selector_all("li.new").unwrap(), vec![li]);
        assert_eq!(doc.outer_html(li).unwrap(), "<li class=\"new\"></li>");
    }

    #[test]
    fn test_set_inner_html_is_atomic() {
        let doc = MemoryDocument::from_html(PAGE).unwrap();
        let msg = doc.get_element_by_id("msg").unwrap().unwrap();

        assert!(doc.set_inner_html(msg, "<i>broken").is_ok());
        assert_eq!(doc.inner_html(msg).unwrap(), "<i>broken</i>");

        let err = doc.set_inner_html(msg, "<em class='x").unwrap_err();
        assert!(matches!(err, DomError::InvalidMarkup { .. }));
        assert_eq!(doc.inner_html(msg).unwrap(), "<i>broken</i>");
    }

    #[test]
    fn test_repeated_writes_keep_arena_size() {
        let doc = MemoryDocument::from_html(PAGE).unwrap();
        let msg = doc.get_element_by_id("msg").unwrap().unwrap();
        let before = doc.arena().len();

        for i in 0..100 {
            doc.set_text_content(msg, &i.to_string()).unwrap();
        }
        assert_eq!(doc.arena().len(), before);
        assert_eq!(doc.text_content(msg).unwrap().as_deref(), Some("99"));

        for bad in ["<b", "<i>ok</i><em class='x", "<!-- open"] {
            for _ in 0..50 {
                assert!(doc.set_inner_html(msg, bad).is_err());
            }
        }
        assert_eq!(doc.arena().len(), before);
        assert_eq!(doc.inner_html(msg).unwrap(), "99");
        assert!(doc.arena().get(doc.staging).unwrap().children_ids.is_empty());

        doc.set_inner_html(msg, "<i>x</i>").unwrap();
        assert_eq!(doc.arena().len(), before + 2);
        assert!(doc.arena().get(doc.staging).unwrap().children_ids.is_empty());
    }

    #[test]
    fn test_style_lives_in_attribute() {
        let doc = MemoryDocument::from_html(PAGE).unwrap();
        let msg = doc.get_element_by_id("msg").unwrap().unwrap();

        assert_eq!(doc.style_property(msg, "color").unwrap().as_deref(), Some("red"));
        doc.set_style_property(msg, "fontSize", "20px").unwrap();
        assert_eq!(
            doc.attribute(msg, "style").unwrap().as_deref(),
            Some("color: red; font-size: 20px;")
        );

        doc.set_style_property(msg, "color", "blue; background: blue").unwrap();
        assert_eq!(doc.style_property(msg, "color").unwrap().as_deref(), Some("red"));
        assert_eq!(doc.style_property(msg, "background").unwrap(), None);
        assert_eq!(
            doc.attribute(msg, "style").unwrap().as_deref(),
            Some("color: red; font-size: 20px;")
        );

        doc.set_style_property(msg, "color", "").unwrap();
        doc.set_style_property(msg, "font-size", "").unwrap();
        assert_eq!(doc.style_property(msg, "color").unwrap(), None);
        assert_eq!(doc.attribute(msg, "style").unwrap(), None);
    }

    #[test]
    fn test_element_only_operations() {
        let doc = MemoryDocument::from_html(PAGE).unwrap();
        let root = doc.root();

        assert!(matches!(doc.attribute(root, "id"), Err(DomError::NotAnElement(_))));
        assert!(matches!(doc.inner_html(root), Err(DomError::NotAnElement(_))));
        assert!(matches!(doc.attribute(999, "id"), Err(DomError::NodeNotFound(999))));

        let go = doc.get_element_by_id("go").unwrap().unwrap();
        for bad in ["", "a b", "x=y", "<"] {
            assert!(matches!(
                doc.set_attribute(go, bad, "v"),
                Err(DomError::InvalidAttributeName(_))
            ));
        }
    }

    #[test]
    fn test_dispatch_bubbles_to_document() {
        let doc = MemoryDocument::from_html(PAGE).unwrap();
        let go = doc.get_element_by_id("go").unwrap().unwrap();
        let outer = doc.get_element_by_id("outer").unwrap().unwrap();

        let (on_button, button_handler) = counter();
        let (on_root, root_handler) = counter();
        doc.add_event_listener(go, "click", &button_handler).unwrap();
        doc.add_event_listener(go, "click", &button_handler).unwrap();
        doc.add_event_listener(doc.root(), "click", &root_handler).unwrap();
        assert_eq!(doc.listener_count(go, "click"), 1);

        assert_eq!(doc.dispatch_event(go, "click").unwrap(), 2);
        assert_eq!(doc.dispatch_event(outer, "click").unwrap(), 1);
        assert_eq!(on_button.get(), 1);
        assert_eq!(on_root.get(), 2);

        doc.remove_event_listener(go, "click", &button_handler).unwrap();
        assert_eq!(doc.dispatch_event(go, "click").unwrap(), 1);
        assert_eq!(on_button.get(), 1);
    }

    #[test]
    fn test_dispatch_without_bubbling() {
        let config = DocumentConfig {
            bubble_events: false,
            ..DocumentConfig::default()
        };
        let doc = MemoryDocument::from_html_with_config(PAGE, config).unwrap();
        let go = doc.get_element_by_id("go").unwrap().unwrap();

        let (calls, handler) = counter();
        doc.add_event_listener(doc.root(), "click", &handler).unwrap();

        assert_eq!(doc.dispatch_event(go, "click").unwrap(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let doc = Rc::new(MemoryDocument::from_html(PAGE).unwrap());
        let go = doc.get_element_by_id("go").unwrap().unwrap();

        let (second_calls, second) = counter();
        let first = {
            let doc = Rc::clone(&doc);
            let second = Rc::clone(&second);
            listener(move |event| {
                doc.remove_event_listener(event.current_target, "click", &second)
                    .unwrap();
            })
        };
        doc.add_event_listener(go, "click", &first).unwrap();
        doc.add_event_listener(go, "click", &second).unwrap();

        assert_eq!(doc.dispatch_event(go, "click").unwrap(), 1);
        assert_eq!(second_calls.get(), 0);
    }

    #[test]
    fn test_ready_runs_once() {
        let doc = MemoryDocument::new();
        let runs = Rc::new(Cell::new(0));

        let r = Rc::clone(&runs);
        doc.on_ready(Box::new(move || r.set(r.get() + 1)));
        assert_eq!(runs.get(), 0);
        assert!(!doc.is_ready());

        assert_eq!(doc.fire_ready(), 1);
        assert_eq!(doc.fire_ready(), 0);
        assert_eq!(runs.get(), 1);

        // Late registration runs immediately by default
        let r = Rc::clone(&runs);
        doc.on_ready(Box::new(move || r.set(r.get() + 1)));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_late_ready_discard() {
        let config: DocumentConfig = serde_json::from_str(r#"{"late_ready": "discard"}"#).unwrap();
        assert!(config.bubble_events);
        assert_eq!(config.initial_capacity, 1024);

        let doc = MemoryDocument::with_config(config);
        doc.fire_ready();

        let runs = Rc::new(Cell::new(0));
        let r = Rc::clone(&runs);
        doc.on_ready(Box::new(move || r.set(r.get() + 1)));
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn test_from_cdp_document() {
        let cdp_json = serde_json::json!({
            "root": {
                "nodeId": 1,
                "backendNodeId": 1,
                "nodeType": 9,
                "nodeName": "#document",
                "nodeValue": "",
                "children": [{
                    "nodeId": 2,
                    "backendNodeId": 7,
                    "nodeType": 1,
                    "nodeName": "BUTTON",
                    "nodeValue": "",
                    "attributes": ["class", "primary", "title", "Send"],
                    "children": [{
                        "nodeId": 3,
                        "backendNodeId": 8,
                        "nodeType": 3,
                        "nodeName": "#text",
                        "nodeValue": "Send"
                    }]
                }]
            }
        });

        let doc = MemoryDocument::from_cdp_document(&cdp_json).unwrap();
        let button = doc.node_by_backend_id(7).unwrap();

        assert_eq!(doc.query_selector_all("button.primary").unwrap(), vec![button]);
        assert_eq!(doc.attribute(button, "title").unwrap().as_deref(), Some("Send"));
        assert_eq!(doc.outer_html(button).unwrap(), "<button class=\"primary\" title=\"Send\">Send</button>");

        let config = DocumentConfig {
            bubble_events: false,
            ..DocumentConfig::default()
        };
        let quiet = MemoryDocument::from_cdp_document_with_config(&cdp_json, config).unwrap();
        let (calls, handler) = counter();
        quiet.add_event_listener(quiet.root(), "click", &handler).unwrap();
        let button = quiet.node_by_backend_id(7).unwrap();
        assert_eq!(quiet.dispatch_event(button, "click").unwrap(), 0);
        assert_eq!(calls.get(), 0);

        let missing = MemoryDocument::from_cdp_document(&serde_json::json!({}));
        assert!(matches!(missing, Err(DomError::Snapshot(_))));
    }
}

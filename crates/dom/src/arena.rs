//! Arena-based DOM tree storage
//!
//! All nodes live in a single `Vec<DomNode>` and refer to each other by
//! 4-byte index. Detached nodes stay in the arena with `parent_id == None`;
//! they are simply unreachable from the root, which is what every query
//! walks from.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId};
use ahash::AHashMap;

/// Arena allocator for DOM nodes
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Backend node ID → NodeId lookup (for trees loaded from CDP)
    backend_id_map: AHashMap<u32, NodeId>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(1024) // Pre-allocate for typical page
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            backend_id_map: AHashMap::new(),
            root_id: None,
        }
    }

    /// Add a node to the arena, returns its ID
    ///
    /// The node's `node_id` is overwritten with its arena index.
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        if let Some(backend_id) = node.backend_node_id {
            self.backend_id_map.insert(backend_id, node_id);
        }
        self.nodes.push(node);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node ID by backend node ID
    pub fn get_node_id_by_backend(&self, backend_id: u32) -> Option<NodeId> {
        self.backend_id_map.get(&backend_id).copied()
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// Parent chain of a node, nearest first
    pub fn ancestors(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = self.get(node_id)?.parent_id;
        while let Some(id) = current {
            chain.push(id);
            current = self.get(id)?.parent_id;
        }
        Ok(chain)
    }

    /// Append `child` as last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        let parent = self.get(parent_id)?;
        if !parent.node_type.is_container() {
            return Err(DomError::InvalidNodeType {
                expected: "container node".to_string(),
                actual: format!("{:?}", parent.node_type),
            });
        }
        // A node cannot become its own descendant
        if child_id == parent_id || self.ancestors(parent_id)?.contains(&child_id) {
            return Err(DomError::InvalidNodeType {
                expected: "non-ancestor node".to_string(),
                actual: format!("ancestor {}", child_id),
            });
        }
        self.detach(child_id)?;
        self.get_mut(parent_id)?.children_ids.push(child_id);
        self.get_mut(child_id)?.parent_id = Some(parent_id);
        Ok(())
    }

    /// Unlink a node from its parent (no-op for detached nodes)
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(());
        };
        self.get_mut(parent_id)?
            .children_ids
            .retain(|id| *id != node_id);
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Detach every child of a node
    pub fn clear_children(&mut self, node_id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.get_mut(node_id)?.children_ids);
        for child_id in children {
            self.get_mut(child_id)?.parent_id = None;
        }
        Ok(())
    }

    /// Traverse tree depth-first (iterative, no recursion)
    ///
    /// Visits `start_id` first, then descendants in document order.
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Descendants of `start_id` in document order, excluding itself
    pub fn descendants(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut ids = Vec::new();
        self.traverse_df(start_id, |node| {
            if node.node_id != start_id {
                ids.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(ids)
    }

    /// Find first attached element with the given `id` attribute
    pub fn find_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        let Some(root_id) = self.root_id else {
            return Ok(None);
        };
        for node_id in std::iter::once(root_id).chain(self.descendants(root_id)?) {
            let node = self.get(node_id)?;
            if node.is_element() && node.attr("id") == Some(id) {
                return Ok(Some(node_id));
            }
        }
        Ok(None)
    }

    /// Drop every node from index `len` on
    ///
    /// Surviving nodes lose links into the dropped tail, and a dropped
    /// root is unset.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.nodes.len() {
            return;
        }
        self.nodes.truncate(len);
        let in_range = |id: NodeId| (id as usize) < len;
        self.backend_id_map.retain(|_, id| in_range(*id));
        for node in &mut self.nodes {
            node.children_ids.retain(|id| in_range(*id));
            if node.parent_id.is_some_and(|id| !in_range(id)) {
                node.parent_id = None;
            }
        }
        if self.root_id.is_some_and(|id| !in_range(id)) {
            self.root_id = None;
        }
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.backend_id_map.clear();
        self.root_id = None;
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

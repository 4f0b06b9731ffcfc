//! In-memory renderer implementation.

use super::{ElementKind, ListenerId, NodeHandle, PageNodes, RenderResult, Renderer, RendererError};
use crate::input::EventKind;
use kurbo::Size;
use std::collections::BTreeMap;

/// One node of the in-memory tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryNode {
    /// Element kind (`None` for the page-level root, head and body).
    pub kind: Option<ElementKind>,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub markup: Option<String>,
    pub value: String,
    pub parent: Option<NodeHandle>,
    pub children: Vec<NodeHandle>,
}

/// Headless renderer backed by a node arena, for testing and ephemeral use.
#[derive(Debug, Clone)]
pub struct MemoryRenderer {
    nodes: Vec<Option<MemoryNode>>,
    listeners: BTreeMap<ListenerId, (NodeHandle, EventKind)>,
    next_listener: u32,
    page: PageNodes,
    document_size: Size,
    focused: Option<NodeHandle>,
}

impl Default for MemoryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRenderer {
    /// Default document size of a fresh page.
    pub const DEFAULT_DOCUMENT_SIZE: Size = Size::new(1024.0, 768.0);

    /// Create an empty page with a root, head and body.
    pub fn new() -> Self {
        let root = NodeHandle(0);
        let head = NodeHandle(1);
        let body = NodeHandle(2);
        let mut nodes = vec![Some(MemoryNode::default()); 3];
        if let Some(node) = nodes[0].as_mut() {
            node.children = vec![head, body];
        }
        for child in [1, 2] {
            if let Some(node) = nodes[child].as_mut() {
                node.parent = Some(root);
            }
        }
        Self {
            nodes,
            listeners: BTreeMap::new(),
            next_listener: 1,
            page: PageNodes { root, head, body },
            document_size: Self::DEFAULT_DOCUMENT_SIZE,
            focused: None,
        }
    }

    /// Set the reported document size.
    pub fn with_document_size(mut self, size: Size) -> Self {
        self.document_size = size;
        self
    }

    /// Get a live node.
    pub fn node(&self, handle: NodeHandle) -> Option<&MemoryNode> {
        self.nodes.get(handle.0 as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, handle: NodeHandle) -> RenderResult<&mut MemoryNode> {
        self.nodes
            .get_mut(handle.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(RendererError::UnknownNode(handle))
    }

    /// Check whether a handle still refers to a node.
    pub fn is_live(&self, handle: NodeHandle) -> bool {
        self.node(handle).is_some()
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.node(handle).and_then(|n| n.parent)
    }

    pub fn children(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        self.node(handle).map(|n| n.children.clone()).unwrap_or_default()
    }

    /// All live nodes of a kind, in creation order.
    pub fn nodes_of_kind(&self, kind: ElementKind) -> Vec<NodeHandle> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_ref().is_some_and(|n| n.kind == Some(kind)))
            .map(|(i, _)| NodeHandle(i as u32))
            .collect()
    }

    /// Read an inline style property.
    pub fn style(&self, handle: NodeHandle, property: &str) -> Option<&str> {
        self.node(handle)
            .and_then(|n| n.style.get(property))
            .map(String::as_str)
    }

    /// Inner markup previously set on a node.
    pub fn markup(&self, handle: NodeHandle) -> Option<&str> {
        self.node(handle).and_then(|n| n.markup.as_deref())
    }

    /// Number of listeners of `kind` attached to `node`.
    pub fn listeners_on(&self, node: NodeHandle, kind: EventKind) -> usize {
        self.listeners
            .values()
            .filter(|(n, k)| *n == node && *k == kind)
            .count()
    }

    /// Total number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Node currently holding focus.
    pub fn focused(&self) -> Option<NodeHandle> {
        self.focused
    }

    fn detach(&mut self, child: NodeHandle) {
        if let Some(parent) = self.parent(child) {
            if let Ok(p) = self.node_mut(parent) {
                p.children.retain(|c| *c != child);
            }
        }
        if let Ok(c) = self.node_mut(child) {
            c.parent = None;
        }
    }

    fn ensure_live(&self, handle: NodeHandle) -> RenderResult<()> {
        if self.is_live(handle) {
            Ok(())
        } else {
            Err(RendererError::UnknownNode(handle))
        }
    }
}

impl Renderer for MemoryRenderer {
    fn page(&self) -> PageNodes {
        self.page
    }

    fn document_size(&self) -> Size {
        self.document_size
    }

    fn create_node(&mut self, kind: ElementKind, attrs: &[(&str, String)]) -> RenderResult<NodeHandle> {
        let handle = NodeHandle(self.nodes.len() as u32);
        let node = MemoryNode {
            kind: Some(kind),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..MemoryNode::default()
        };
        self.nodes.push(Some(node));
        Ok(handle)
    }

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> RenderResult<()> {
        self.ensure_live(parent)?;
        self.ensure_live(child)?;
        self.detach(child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeHandle,
        child: NodeHandle,
        sibling: NodeHandle,
    ) -> RenderResult<()> {
        self.ensure_live(child)?;
        if self.parent(sibling) != Some(parent) {
            return Err(RendererError::UnknownNode(sibling));
        }
        self.detach(child);
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|c| *c == sibling)
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, node: NodeHandle) -> RenderResult<()> {
        self.ensure_live(node)?;
        self.detach(node);
        let mut pending = vec![node];
        while let Some(handle) = pending.pop() {
            if let Some(removed) = self.nodes.get_mut(handle.0 as usize).and_then(Option::take) {
                pending.extend(removed.children);
            }
            self.listeners.retain(|_, (n, _)| *n != handle);
            if self.focused == Some(handle) {
                self.focused = None;
            }
        }
        Ok(())
    }

    fn attribute(&self, node: NodeHandle, name: &str) -> Option<String> {
        self.node(node).and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, node: NodeHandle, name: &str, value: &str) -> RenderResult<()> {
        self.node_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeHandle, name: &str) -> RenderResult<()> {
        self.node_mut(node)?.attributes.remove(name);
        Ok(())
    }

    fn set_style(&mut self, node: NodeHandle, property: &str, value: &str) -> RenderResult<()> {
        let style = &mut self.node_mut(node)?.style;
        if value.is_empty() {
            style.remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
        Ok(())
    }

    fn tag(&self, node: NodeHandle, key: &str) -> Option<String> {
        self.node(node).and_then(|n| n.tags.get(key).cloned())
    }

    fn set_tag(&mut self, node: NodeHandle, key: &str, value: Option<&str>) -> RenderResult<()> {
        let tags = &mut self.node_mut(node)?.tags;
        match value {
            Some(v) => {
                tags.insert(key.to_string(), v.to_string());
            }
            None => {
                tags.remove(key);
            }
        }
        Ok(())
    }

    fn set_markup(&mut self, node: NodeHandle, markup: &str) -> RenderResult<()> {
        self.node_mut(node)?.markup = Some(markup.to_string());
        Ok(())
    }

    fn value(&self, node: NodeHandle) -> Option<String> {
        self.node(node).map(|n| n.value.clone())
    }

    fn set_value(&mut self, node: NodeHandle, value: &str) -> RenderResult<()> {
        self.node_mut(node)?.value = value.to_string();
        Ok(())
    }

    fn focus(&mut self, node: NodeHandle) -> RenderResult<()> {
        self.ensure_live(node)?;
        self.focused = Some(node);
        Ok(())
    }

    fn listen(&mut self, node: NodeHandle, kind: EventKind) -> RenderResult<ListenerId> {
        self.ensure_live(node)?;
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (node, kind));
        Ok(id)
    }

    fn unlisten(&mut self, listener: ListenerId) -> RenderResult<()> {
        self.listeners
            .remove(&listener)
            .map(|_| ())
            .ok_or(RendererError::UnknownListener(listener))
    }
}

//! Renderer contract consumed by the overlay core.
//!
//! The core never touches the page directly. Everything it draws or listens
//! to goes through a [`Renderer`], which can be the browser DOM (in the
//! `annogram-web` crate) or the in-memory [`MemoryRenderer`] used by tests.

mod memory;

pub use memory::{MemoryNode, MemoryRenderer};

use crate::input::EventKind;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeHandle),
    #[error("Unknown listener: {0:?}")]
    UnknownListener(ListenerId),
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Opaque handle to a visual node owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(pub u32);

/// Handle to one attached listener, so it can be detached individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

/// Kinds of visual nodes the core asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// The `<svg>` overlay surface.
    Svg,
    /// An SVG `<line>`.
    Line,
    /// An SVG `<rect>`.
    Rect,
    /// An SVG `<foreignObject>` hosting HTML content.
    ForeignObject,
    /// An HTML `<textarea>`.
    TextArea,
    /// An HTML `<style>` block.
    Style,
    /// An HTML `<div>` container.
    Container,
    /// An HTML `<a>` used as a menu button.
    Button,
}

impl ElementKind {
    /// Tag name of the element.
    pub fn tag_name(self) -> &'static str {
        match self {
            ElementKind::Svg => "svg",
            ElementKind::Line => "line",
            ElementKind::Rect => "rect",
            ElementKind::ForeignObject => "foreignObject",
            ElementKind::TextArea => "textarea",
            ElementKind::Style => "style",
            ElementKind::Container => "div",
            ElementKind::Button => "a",
        }
    }

    /// Whether the element lives in the SVG namespace.
    pub fn is_svg(self) -> bool {
        matches!(
            self,
            ElementKind::Svg | ElementKind::Line | ElementKind::Rect | ElementKind::ForeignObject
        )
    }
}

/// Handles to the page-level nodes every renderer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNodes {
    /// The document root (`<html>`).
    pub root: NodeHandle,
    pub head: NodeHandle,
    pub body: NodeHandle,
}

/// Trait for rendering backends.
///
/// Mutating operations return [`RenderResult`] so a stale handle is reported
/// instead of silently ignored. Reads return `Option`.
pub trait Renderer {
    /// Page-level nodes.
    fn page(&self) -> PageNodes;

    /// Size of the whole document (not just the viewport).
    fn document_size(&self) -> Size;

    /// Create a detached node with the given attributes.
    fn create_node(&mut self, kind: ElementKind, attrs: &[(&str, String)]) -> RenderResult<NodeHandle>;

    /// Append `child` as the last child of `parent`, moving it if already attached.
    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> RenderResult<()>;

    /// Insert `child` into `parent` right before `sibling`.
    fn insert_before(
        &mut self,
        parent: NodeHandle,
        child: NodeHandle,
        sibling: NodeHandle,
    ) -> RenderResult<()>;

    /// Remove a node and its subtree from the page. The handle becomes stale.
    fn remove(&mut self, node: NodeHandle) -> RenderResult<()>;

    fn attribute(&self, node: NodeHandle, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeHandle, name: &str, value: &str) -> RenderResult<()>;

    fn remove_attribute(&mut self, node: NodeHandle, name: &str) -> RenderResult<()>;

    /// Set an inline style property. An empty value clears the property.
    fn set_style(&mut self, node: NodeHandle, property: &str, value: &str) -> RenderResult<()>;

    /// Read a free-form per-node tag.
    fn tag(&self, node: NodeHandle, key: &str) -> Option<String>;

    /// Write a free-form per-node tag. `None` clears it.
    fn set_tag(&mut self, node: NodeHandle, key: &str, value: Option<&str>) -> RenderResult<()>;

    /// Replace the inner markup (or text, for `<style>`) of a node.
    fn set_markup(&mut self, node: NodeHandle, markup: &str) -> RenderResult<()>;

    /// Current value of a form field such as a textarea.
    fn value(&self, node: NodeHandle) -> Option<String>;

    fn set_value(&mut self, node: NodeHandle, value: &str) -> RenderResult<()>;

    /// Move keyboard focus to a node.
    fn focus(&mut self, node: NodeHandle) -> RenderResult<()>;

    /// Attach a listener for `kind` on `node`.
    fn listen(&mut self, node: NodeHandle, kind: EventKind) -> RenderResult<ListenerId>;

    /// Detach a listener previously returned by [`Renderer::listen`].
    fn unlisten(&mut self, listener: ListenerId) -> RenderResult<()>;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn page(&self) -> PageNodes {
        (**self).page()
    }

    fn document_size(&self) -> Size {
        (**self).document_size()
    }

    fn create_node(&mut self, kind: ElementKind, attrs: &[(&str, String)]) -> RenderResult<NodeHandle> {
        (**self).create_node(kind, attrs)
    }

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> RenderResult<()> {
        (**self).append_child(parent, child)
    }

    fn insert_before(
        &mut self,
        parent: NodeHandle,
        child: NodeHandle,
        sibling: NodeHandle,
    ) -> RenderResult<()> {
        (**self).insert_before(parent, child, sibling)
    }

    fn remove(&mut self, node: NodeHandle) -> RenderResult<()> {
        (**self).remove(node)
    }

    fn attribute(&self, node: NodeHandle, name: &str) -> Option<String> {
        (**self).attribute(node, name)
    }

    fn set_attribute(&mut self, node: NodeHandle, name: &str, value: &str) -> RenderResult<()> {
        (**self).set_attribute(node, name, value)
    }

    fn remove_attribute(&mut self, node: NodeHandle, name: &str) -> RenderResult<()> {
        (**self).remove_attribute(node, name)
    }

    fn set_style(&mut self, node: NodeHandle, property: &str, value: &str) -> RenderResult<()> {
        (**self).set_style(node, property, value)
    }

    fn tag(&self, node: NodeHandle, key: &str) -> Option<String> {
        (**self).tag(node, key)
    }

    fn set_tag(&mut self, node: NodeHandle, key: &str, value: Option<&str>) -> RenderResult<()> {
        (**self).set_tag(node, key, value)
    }

    fn set_markup(&mut self, node: NodeHandle, markup: &str) -> RenderResult<()> {
        (**self).set_markup(node, markup)
    }

    fn value(&self, node: NodeHandle) -> Option<String> {
        (**self).value(node)
    }

    fn set_value(&mut self, node: NodeHandle, value: &str) -> RenderResult<()> {
        (**self).set_value(node, value)
    }

    fn focus(&mut self, node: NodeHandle) -> RenderResult<()> {
        (**self).focus(node)
    }

    fn listen(&mut self, node: NodeHandle, kind: EventKind) -> RenderResult<ListenerId> {
        (**self).listen(node, kind)
    }

    fn unlisten(&mut self, listener: ListenerId) -> RenderResult<()> {
        (**self).unlisten(listener)
    }
}

/// Whether the space-separated `class` attribute of `node` contains `class`.
pub fn has_class(renderer: &dyn Renderer, node: NodeHandle, class: &str) -> bool {
    renderer
        .attribute(node, "class")
        .is_some_and(|list| list.split_whitespace().any(|c| c == class))
}

/// Add `class` to the `class` attribute of `node` if missing.
pub fn add_class(renderer: &mut dyn Renderer, node: NodeHandle, class: &str) -> RenderResult<()> {
    let current = renderer.attribute(node, "class").unwrap_or_default();
    if current.split_whitespace().any(|c| c == class) {
        return Ok(());
    }
    let updated = if current.trim().is_empty() {
        class.to_string()
    } else {
        format!("{} {}", current.trim(), class)
    };
    renderer.set_attribute(node, "class", &updated)
}

/// Remove `class` from the `class` attribute of `node`.
pub fn remove_class(renderer: &mut dyn Renderer, node: NodeHandle, class: &str) -> RenderResult<()> {
    let Some(current) = renderer.attribute(node, "class") else {
        return Ok(());
    };
    let updated: Vec<&str> = current.split_whitespace().filter(|c| *c != class).collect();
    if updated.is_empty() {
        renderer.remove_attribute(node, "class")
    } else {
        renderer.set_attribute(node, "class", &updated.join(" "))
    }
}

/// Add or remove `class` depending on `on`.
pub fn set_class(
    renderer: &mut dyn Renderer,
    node: NodeHandle,
    class: &str,
    on: bool,
) -> RenderResult<()> {
    if on {
        add_class(renderer, node, class)
    } else {
        remove_class(renderer, node, class)
    }
}

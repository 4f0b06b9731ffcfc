//! Browser DOM implementation of the core renderer contract.

use annogram_core::{
    CoordinateSpace, ElementKind, EventKind, Key, ListenerId, NodeHandle, OverlayEvent, PageNodes,
    RenderResult, Renderer, RendererError,
};
use kurbo::{Point, Size};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlTextAreaElement, KeyboardEvent, MouseEvent, SvgElement};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// Attribute carrying the node handle of every element the overlay creates.
const NODE_ATTR: &str = "data-annogram-node";

/// Receives translated events.
pub type EventSink = Rc<dyn Fn(OverlayEvent)>;

fn platform(err: JsValue) -> RendererError {
    RendererError::Platform(format!("{:?}", err))
}

struct DomNode {
    element: Element,
    kind: Option<ElementKind>,
}

struct Listener {
    node: NodeHandle,
    target: Element,
    kind: EventKind,
    closure: Closure<dyn Fn(web_sys::Event)>,
}

/// Renderer backed by the live page.
pub struct DomRenderer {
    document: Document,
    page: PageNodes,
    nodes: HashMap<NodeHandle, DomNode>,
    next_node: u32,
    listeners: HashMap<ListenerId, Listener>,
    next_listener: u32,
    coordinates: CoordinateSpace,
    /// The overlay `<svg>`, for container-relative coordinates.
    overlay: Rc<OnceCell<Element>>,
    sink: EventSink,
}

impl DomRenderer {
    /// Wrap the current document. Events from attached listeners go to `sink`.
    pub fn new(sink: EventSink, coordinates: CoordinateSpace) -> RenderResult<Self> {
        let missing = |what: &str| RendererError::Platform(format!("No {} available", what));
        let window = web_sys::window().ok_or_else(|| missing("window"))?;
        let document = window.document().ok_or_else(|| missing("document"))?;
        let root = document.document_element().ok_or_else(|| missing("document element"))?;
        let head = document.head().ok_or_else(|| missing("head"))?;
        let body = document.body().ok_or_else(|| missing("body"))?;

        let page = PageNodes {
            root: NodeHandle(0),
            head: NodeHandle(1),
            body: NodeHandle(2),
        };
        let mut nodes = HashMap::new();
        for (handle, element) in [
            (page.root, root),
            (page.head, head.unchecked_into::<Element>()),
            (page.body, body.unchecked_into::<Element>()),
        ] {
            nodes.insert(handle, DomNode { element, kind: None });
        }

        Ok(Self {
            document,
            page,
            nodes,
            next_node: 3,
            listeners: HashMap::new(),
            next_listener: 1,
            coordinates,
            overlay: Rc::new(OnceCell::new()),
            sink,
        })
    }

    fn node(&self, handle: NodeHandle) -> RenderResult<&DomNode> {
        self.nodes.get(&handle).ok_or(RendererError::UnknownNode(handle))
    }

    fn element(&self, handle: NodeHandle) -> RenderResult<&Element> {
        self.node(handle).map(|n| &n.element)
    }

    fn detach_listener(listener: &Listener) {
        if let Err(e) = listener.target.remove_event_listener_with_callback(
            listener.kind.dom_name(),
            listener.closure.as_ref().unchecked_ref(),
        ) {
            log::debug!("Failed to detach {} listener: {:?}", listener.kind.dom_name(), e);
        }
    }
}

impl Drop for DomRenderer {
    fn drop(&mut self) {
        for listener in self.listeners.values() {
            Self::detach_listener(listener);
        }
    }
}

/// Handle stored on an element, if it is one of ours.
fn node_handle(element: &Element) -> Option<NodeHandle> {
    element
        .get_attribute(NODE_ATTR)
        .and_then(|raw| raw.parse().ok())
        .map(NodeHandle)
}

fn pointer_position(event: &MouseEvent, space: CoordinateSpace, overlay: &OnceCell<Element>) -> Point {
    match (space, overlay.get()) {
        (CoordinateSpace::Container, Some(surface)) => {
            let rect = surface.get_bounding_client_rect();
            Point::new(
                event.client_x() as f64 - rect.left(),
                event.client_y() as f64 - rect.top(),
            )
        }
        _ => Point::new(event.page_x() as f64, event.page_y() as f64),
    }
}

fn translate(
    event: &web_sys::Event,
    listener: NodeHandle,
    kind: EventKind,
    space: CoordinateSpace,
    overlay: &OnceCell<Element>,
) -> Option<OverlayEvent> {
    match kind {
        EventKind::Click => {
            let mouse = event.dyn_ref::<MouseEvent>()?;
            event.prevent_default();
            event.stop_propagation();
            let target = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(&format!("[{}]", NODE_ATTR)).ok().flatten())
                .and_then(|el| node_handle(&el));
            Some(OverlayEvent::Click {
                listener,
                target,
                position: pointer_position(mouse, space, overlay),
            })
        }
        EventKind::PointerMove => {
            let mouse = event.dyn_ref::<MouseEvent>()?;
            Some(OverlayEvent::PointerMove {
                position: pointer_position(mouse, space, overlay),
            })
        }
        EventKind::KeyUp => {
            let keyboard = event.dyn_ref::<KeyboardEvent>()?;
            let name = keyboard.key();
            let key = if name.is_empty() {
                Key::from_key_code(keyboard.key_code())
            } else {
                Key::from_dom_key(&name)
            };
            Some(OverlayEvent::KeyUp { key })
        }
        EventKind::Blur => Some(OverlayEvent::Blur { node: listener }),
    }
}

impl Renderer for DomRenderer {
    fn page(&self) -> PageNodes {
        self.page
    }

    fn document_size(&self) -> Size {
        let root = self.element(self.page.root).ok();
        let body = self.element(self.page.body).ok();
        let extent = |f: fn(&Element) -> i32| {
            root.into_iter().chain(body).map(f).max().unwrap_or(0) as f64
        };
        Size::new(extent(Element::scroll_width), extent(Element::scroll_height))
    }

    fn create_node(&mut self, kind: ElementKind, attrs: &[(&str, String)]) -> RenderResult<NodeHandle> {
        let element = if kind.is_svg() {
            self.document.create_element_ns(Some(SVG_NS), kind.tag_name())
        } else {
            self.document.create_element(kind.tag_name())
        }
        .map_err(platform)?;

        let handle = NodeHandle(self.next_node);
        self.next_node += 1;
        element
            .set_attribute(NODE_ATTR, &handle.0.to_string())
            .map_err(platform)?;
        for (name, value) in attrs {
            element.set_attribute(name, value).map_err(platform)?;
        }
        if kind == ElementKind::Svg && self.overlay.set(element.clone()).is_err() {
            log::debug!("Overlay surface already registered");
        }
        self.nodes.insert(handle, DomNode { element, kind: Some(kind) });
        Ok(handle)
    }

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> RenderResult<()> {
        let parent = self.element(parent)?;
        let child = self.element(child)?;
        parent.append_child(child).map_err(platform)?;
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeHandle,
        child: NodeHandle,
        sibling: NodeHandle,
    ) -> RenderResult<()> {
        let parent = self.element(parent)?;
        let child = self.element(child)?;
        let sibling: &web_sys::Node = self.element(sibling)?;
        parent.insert_before(child, Some(sibling)).map_err(platform)?;
        Ok(())
    }

    fn remove(&mut self, node: NodeHandle) -> RenderResult<()> {
        let removed = self.element(node)?.clone();
        let gone: Vec<NodeHandle> = self
            .nodes
            .iter()
            .filter(|(_, n)| removed.contains(Some(&*n.element)))
            .map(|(h, _)| *h)
            .collect();

        // Detach first so no closure is dropped while still registered.
        let stale: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|(_, l)| gone.contains(&l.node))
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Some(listener) = self.listeners.remove(&id) {
                Self::detach_listener(&listener);
            }
        }

        removed.remove();
        for handle in gone {
            self.nodes.remove(&handle);
        }
        Ok(())
    }

    fn attribute(&self, node: NodeHandle, name: &str) -> Option<String> {
        self.element(node).ok()?.get_attribute(name)
    }

    fn set_attribute(&mut self, node: NodeHandle, name: &str, value: &str) -> RenderResult<()> {
        self.element(node)?.set_attribute(name, value).map_err(platform)
    }

    fn remove_attribute(&mut self, node: NodeHandle, name: &str) -> RenderResult<()> {
        self.element(node)?.remove_attribute(name).map_err(platform)
    }

    fn set_style(&mut self, node: NodeHandle, property: &str, value: &str) -> RenderResult<()> {
        let element = self.element(node)?;
        let style = if let Some(html) = element.dyn_ref::<HtmlElement>() {
            html.style()
        } else if let Some(svg) = element.dyn_ref::<SvgElement>() {
            svg.style()
        } else {
            return Err(RendererError::Platform(format!(
                "Node {:?} has no inline style",
                node
            )));
        };
        if value.is_empty() {
            style.remove_property(property).map_err(platform)?;
            Ok(())
        } else {
            style.set_property(property, value).map_err(platform)
        }
    }

    fn tag(&self, node: NodeHandle, key: &str) -> Option<String> {
        self.attribute(node, &format!("data-annogram-{}", key))
    }

    fn set_tag(&mut self, node: NodeHandle, key: &str, value: Option<&str>) -> RenderResult<()> {
        let name = format!("data-annogram-{}", key);
        match value {
            Some(value) => self.set_attribute(node, &name, value),
            None => self.remove_attribute(node, &name),
        }
    }

    fn set_markup(&mut self, node: NodeHandle, markup: &str) -> RenderResult<()> {
        let node = self.node(node)?;
        match node.kind {
            Some(ElementKind::Style) | Some(ElementKind::Button) => {
                node.element.set_text_content(Some(markup))
            }
            _ => node.element.set_inner_html(markup),
        }
        Ok(())
    }

    fn value(&self, node: NodeHandle) -> Option<String> {
        self.element(node)
            .ok()?
            .dyn_ref::<HtmlTextAreaElement>()
            .map(HtmlTextAreaElement::value)
    }

    fn set_value(&mut self, node: NodeHandle, value: &str) -> RenderResult<()> {
        let area = self
            .element(node)?
            .dyn_ref::<HtmlTextAreaElement>()
            .ok_or_else(|| RendererError::Platform(format!("Node {:?} has no value", node)))?;
        area.set_value(value);
        Ok(())
    }

    fn focus(&mut self, node: NodeHandle) -> RenderResult<()> {
        let element = self
            .element(node)?
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| RendererError::Platform(format!("Node {:?} is not focusable", node)))?;
        element.focus().map_err(platform)
    }

    fn listen(&mut self, node: NodeHandle, kind: EventKind) -> RenderResult<ListenerId> {
        let target = self.element(node)?.clone();

        let sink = Rc::clone(&self.sink);
        let overlay = Rc::clone(&self.overlay);
        let space = self.coordinates;
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(event) = translate(&event, node, kind, space, &overlay) {
                sink(event);
            }
        }) as Box<dyn Fn(web_sys::Event)>);

        target
            .add_event_listener_with_callback(kind.dom_name(), closure.as_ref().unchecked_ref())
            .map_err(platform)?;

        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(
            id,
            Listener {
                node,
                target,
                kind,
                closure,
            },
        );
        Ok(id)
    }

    fn unlisten(&mut self, listener: ListenerId) -> RenderResult<()> {
        let removed = self
            .listeners
            .remove(&listener)
            .ok_or(RendererError::UnknownListener(listener))?;
        Self::detach_listener(&removed);
        Ok(())
    }
}

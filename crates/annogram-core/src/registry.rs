//! Shape registry: one descriptor per built-in shape type.
//!
//! The session never looks at shape-specific geometry. It asks the registry
//! for the descriptor of a type identifier and drives it through `create`,
//! `update` and `drag`, plus the key and commit policies.

use crate::input::{EventKind, Key};
use crate::renderer::{ElementKind, NodeHandle, PageNodes, RenderResult, Renderer};
use crate::shapes::{
    Geometry, Grip, LineGeometry, RectGeometry, SerializableColor, ShapeInstance, ShapeKind,
    ShapeNodes, TextGeometry,
};
use kurbo::{Point, Size};

/// Tag holding the shape-type identifier of a node.
pub const TAG_SHAPE: &str = "shape";
/// Tag holding the instance id of a node.
pub const TAG_INSTANCE: &str = "instance";
/// Tag flag set while the node's instance is being edited.
pub const TAG_EDITING: &str = "editing";

/// Style applied to newly placed shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementStyle {
    pub color: SerializableColor,
    pub stroke_width: f64,
    pub text_size: Size,
}

impl Default for PlacementStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            stroke_width: 2.0,
            text_size: TextGeometry::DEFAULT_SIZE,
        }
    }
}

/// Create/update behavior of one shape type.
pub trait ShapeDescriptor: Sync {
    fn kind(&self) -> ShapeKind;

    /// Create a new instance at `at` and attach its nodes to `surface`.
    fn create(
        &self,
        renderer: &mut dyn Renderer,
        surface: NodeHandle,
        at: Point,
        style: &PlacementStyle,
    ) -> RenderResult<ShapeInstance>;

    /// Prepare `instance` for an edit session started at `at` and return
    /// the part that follows the pointer.
    fn update(
        &self,
        renderer: &mut dyn Renderer,
        instance: &mut ShapeInstance,
        at: Point,
    ) -> RenderResult<Grip>;

    /// Live update while the pointer moves.
    fn drag(
        &self,
        renderer: &mut dyn Renderer,
        instance: &mut ShapeInstance,
        grip: Grip,
        at: Point,
    ) -> RenderResult<()>;

    /// Listeners owned by an edit session of this type.
    fn edit_listeners(&self, page: PageNodes, _instance: &ShapeInstance) -> Vec<(NodeHandle, EventKind)> {
        vec![(page.root, EventKind::PointerMove), (page.root, EventKind::KeyUp)]
    }

    /// Whether `key` removes the instance being edited.
    fn removes_on(&self, _renderer: &dyn Renderer, _instance: &ShapeInstance, key: &Key) -> bool {
        key.is_removal()
    }

    /// Close an edit session. Returns `false` when the instance should be
    /// discarded instead of kept.
    fn commit(&self, _renderer: &dyn Renderer, _instance: &mut ShapeInstance) -> RenderResult<bool> {
        Ok(true)
    }
}

fn tag_nodes(renderer: &mut dyn Renderer, instance: &ShapeInstance) -> RenderResult<()> {
    let kind = instance.kind().id();
    let id = instance.id().to_string();
    for node in instance.nodes.all() {
        renderer.set_tag(node, TAG_SHAPE, Some(kind))?;
        renderer.set_tag(node, TAG_INSTANCE, Some(id.as_str()))?;
    }
    Ok(())
}

/// Attach a freshly created instance to the surface and tag its nodes.
/// On failure the instance's root is removed again.
fn place(
    renderer: &mut dyn Renderer,
    surface: NodeHandle,
    instance: ShapeInstance,
) -> RenderResult<ShapeInstance> {
    let root = instance.nodes.root;
    let placed = renderer
        .append_child(surface, root)
        .and_then(|_| tag_nodes(renderer, &instance));
    if let Err(err) = placed {
        if let Err(e) = renderer.remove(root) {
            log::debug!("Could not remove unplaced {:?}: {}", root, e);
        }
        return Err(err);
    }
    Ok(instance)
}

fn write_attributes(
    renderer: &mut dyn Renderer,
    node: NodeHandle,
    attrs: &[(&'static str, String)],
) -> RenderResult<()> {
    for (name, value) in attrs {
        renderer.set_attribute(node, name, value)?;
    }
    Ok(())
}

/// Straight lines (arrows in the menu's wording).
#[derive(Debug)]
pub struct LineDescriptor;

impl ShapeDescriptor for LineDescriptor {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Line
    }

    fn create(
        &self,
        renderer: &mut dyn Renderer,
        surface: NodeHandle,
        at: Point,
        style: &PlacementStyle,
    ) -> RenderResult<ShapeInstance> {
        let geometry = LineGeometry::new(at);
        let mut attrs = geometry.attributes();
        attrs.push(("stroke", style.color.to_css()));
        attrs.push(("stroke-width", style.stroke_width.to_string()));
        let node = renderer.create_node(ElementKind::Line, &attrs)?;

        let instance = ShapeInstance::new(
            Geometry::Line(geometry),
            style.color,
            ShapeNodes {
                root: node,
                content: None,
            },
        );
        place(renderer, surface, instance)
    }

    fn update(
        &self,
        _renderer: &mut dyn Renderer,
        instance: &mut ShapeInstance,
        at: Point,
    ) -> RenderResult<Grip> {
        Ok(match &instance.geometry {
            Geometry::Line(line) => line.nearest_grip(at),
            _ => Grip::End,
        })
    }

    fn drag(
        &self,
        renderer: &mut dyn Renderer,
        instance: &mut ShapeInstance,
        grip: Grip,
        at: Point,
    ) -> RenderResult<()> {
        if let Geometry::Line(line) = &mut instance.geometry {
            line.drag(grip, at);
            write_attributes(renderer, instance.nodes.root, &line.attributes())?;
        }
        Ok(())
    }
}

/// Outlined rectangles.
#[derive(Debug)]
pub struct RectDescriptor;

impl RectDescriptor {
    fn sync(renderer: &mut dyn Renderer, node: NodeHandle, rect: &RectGeometry) -> RenderResult<()> {
        write_attributes(renderer, node, &rect.attributes())?;
        match rect.svg_transform() {
            Some(transform) => renderer.set_attribute(node, "transform", &transform),
            None => renderer.remove_attribute(node, "transform"),
        }
    }
}

impl ShapeDescriptor for RectDescriptor {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Rect
    }

    fn create(
        &self,
        renderer: &mut dyn Renderer,
        surface: NodeHandle,
        at: Point,
        style: &PlacementStyle,
    ) -> RenderResult<ShapeInstance> {
        let geometry = RectGeometry::new(at);
        let mut attrs = geometry.attributes();
        attrs.push(("fill", "none".to_string()));
        attrs.push(("stroke", style.color.to_css()));
        attrs.push(("stroke-width", style.stroke_width.to_string()));
        let node = renderer.create_node(ElementKind::Rect, &attrs)?;

        let instance = ShapeInstance::new(
            Geometry::Rect(geometry),
            style.color,
            ShapeNodes {
                root: node,
                content: None,
            },
        );
        place(renderer, surface, instance)
    }

    fn update(
        &self,
        renderer: &mut dyn Renderer,
        instance: &mut ShapeInstance,
        at: Point,
    ) -> RenderResult<Grip> {
        if let Geometry::Rect(rect) = &mut instance.geometry {
            rect.regrip(at);
            Self::sync(renderer, instance.nodes.root, rect)?;
        }
        Ok(Grip::Corner)
    }

    fn drag(
        &self,
        renderer: &mut dyn Renderer,
        instance: &mut ShapeInstance,
        _grip: Grip,
        at: Point,
    ) -> RenderResult<()> {
        if let Geometry::Rect(rect) = &mut instance.geometry {
            rect.drag(at);
            Self::sync(renderer, instance.nodes.root, rect)?;
        }
        Ok(())
    }
}

/// Free text in an auto-sized text box.
#[derive(Debug)]
pub struct TextDescriptor;

impl TextDescriptor {
    fn current_content(renderer: &dyn Renderer, instance: &ShapeInstance) -> String {
        instance
            .nodes
            .content
            .and_then(|node| renderer.value(node))
            .unwrap_or_default()
    }
}

impl ShapeDescriptor for TextDescriptor {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Text
    }

    fn create(
        &self,
        renderer: &mut dyn Renderer,
        surface: NodeHandle,
        at: Point,
        style: &PlacementStyle,
    ) -> RenderResult<ShapeInstance> {
        let geometry = TextGeometry::new(at, style.text_size);
        let object = renderer.create_node(ElementKind::ForeignObject, &geometry.attributes())?;
        let area = renderer.create_node(ElementKind::TextArea, &[])?;
        renderer.set_style(area, "width", &format!("{}px", geometry.size.width))?;
        renderer.set_style(area, "height", &format!("{}px", geometry.size.height))?;
        renderer.set_style(area, "border-color", &style.color.to_css())?;
        renderer.set_style(area, "color", &style.color.to_css())?;
        renderer.append_child(object, area)?;

        let instance = ShapeInstance::new(
            Geometry::Text(geometry),
            style.color,
            ShapeNodes {
                root: object,
                content: Some(area),
            },
        );
        place(renderer, surface, instance)
    }

    fn update(
        &self,
        renderer: &mut dyn Renderer,
        instance: &mut ShapeInstance,
        _at: Point,
    ) -> RenderResult<Grip> {
        if let Some(area) = instance.nodes.content {
            renderer.focus(area)?;
        }
        Ok(Grip::Content)
    }

    fn drag(
        &self,
        _renderer: &mut dyn Renderer,
        _instance: &mut ShapeInstance,
        _grip: Grip,
        _at: Point,
    ) -> RenderResult<()> {
        Ok(())
    }

    fn edit_listeners(&self, page: PageNodes, instance: &ShapeInstance) -> Vec<(NodeHandle, EventKind)> {
        let mut listeners = vec![(page.root, EventKind::PointerMove), (page.root, EventKind::KeyUp)];
        if let Some(area) = instance.nodes.content {
            listeners.push((area, EventKind::Blur));
        }
        listeners
    }

    // Delete must keep working inside the text box, so it only removes an
    // empty box. Escape always removes.
    fn removes_on(&self, renderer: &dyn Renderer, instance: &ShapeInstance, key: &Key) -> bool {
        match key {
            Key::Escape => true,
            Key::Delete => Self::current_content(renderer, instance).trim().is_empty(),
            Key::Other(_) => false,
        }
    }

    fn commit(&self, renderer: &dyn Renderer, instance: &mut ShapeInstance) -> RenderResult<bool> {
        let content = Self::current_content(renderer, instance);
        if let Geometry::Text(text) = &mut instance.geometry {
            text.content = content;
            return Ok(!text.is_empty());
        }
        Ok(true)
    }
}

static LINE: LineDescriptor = LineDescriptor;
static RECT: RectDescriptor = RectDescriptor;
static TEXT: TextDescriptor = TextDescriptor;

/// Descriptor of a built-in shape type.
pub fn descriptor(kind: ShapeKind) -> &'static dyn ShapeDescriptor {
    match kind {
        ShapeKind::Line => &LINE,
        ShapeKind::Rect => &RECT,
        ShapeKind::Text => &TEXT,
    }
}

/// Look up a descriptor by type identifier.
pub fn lookup(id: &str) -> Option<&'static dyn ShapeDescriptor> {
    ShapeKind::from_id(id).map(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MemoryRenderer;

    fn surface(renderer: &mut MemoryRenderer) -> NodeHandle {
        let page = renderer.page();
        let svg = renderer.create_node(ElementKind::Svg, &[]).unwrap();
        renderer.append_child(page.body, svg).unwrap();
        svg
    }

    #[test]
    fn test_lookup() {
        for kind in ShapeKind::all() {
            assert_eq!(lookup(kind.id()).map(|d| d.kind()), Some(*kind));
        }
        assert!(lookup("circle").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_line_create_and_drag() {
        let mut renderer = MemoryRenderer::new();
        let svg = surface(&mut renderer);
        let line = descriptor(ShapeKind::Line);
        let style = PlacementStyle::default();

        let mut instance = line.create(&mut renderer, svg, Point::new(5.0, 5.0), &style).unwrap();
        let node = instance.nodes.root;
        assert_eq!(renderer.children(svg), vec![node]);
        assert_eq!(renderer.tag(node, TAG_SHAPE).as_deref(), Some("line"));
        assert_eq!(
            renderer.tag(node, TAG_INSTANCE),
            Some(instance.id().to_string())
        );
        assert_eq!(renderer.attribute(node, "stroke").as_deref(), Some("#000000"));

        let grip = line.update(&mut renderer, &mut instance, Point::new(5.0, 5.0)).unwrap();
        assert_eq!(grip, Grip::End);
        line.drag(&mut renderer, &mut instance, grip, Point::new(25.0, 45.0)).unwrap();
        assert_eq!(renderer.attribute(node, "x2").as_deref(), Some("25"));
        assert_eq!(renderer.attribute(node, "y2").as_deref(), Some("45"));
        assert_eq!(renderer.attribute(node, "x1").as_deref(), Some("5"));
    }

    #[test]
    fn test_rect_drag_writes_flip_transform() {
        let mut renderer = MemoryRenderer::new();
        let svg = surface(&mut renderer);
        let rect = descriptor(ShapeKind::Rect);

        let mut instance = rect
            .create(&mut renderer, svg, Point::new(50.0, 50.0), &PlacementStyle::default())
            .unwrap();
        let node = instance.nodes.root;
        assert_eq!(renderer.attribute(node, "fill").as_deref(), Some("none"));

        rect.drag(&mut renderer, &mut instance, Grip::Corner, Point::new(10.0, 70.0)).unwrap();
        assert_eq!(renderer.attribute(node, "width").as_deref(), Some("40"));
        assert_eq!(renderer.attribute(node, "height").as_deref(), Some("20"));
        assert_eq!(
            renderer.attribute(node, "transform").as_deref(),
            Some("translate(100 0) scale(-1 1)")
        );

        rect.drag(&mut renderer, &mut instance, Grip::Corner, Point::new(60.0, 70.0)).unwrap();
        assert!(renderer.attribute(node, "transform").is_none());
    }

    #[test]
    fn test_text_create_focus_and_commit() {
        let mut renderer = MemoryRenderer::new();
        let svg = surface(&mut renderer);
        let text = descriptor(ShapeKind::Text);
        let style = PlacementStyle {
            color: SerializableColor::rgb(255, 0, 0),
            ..PlacementStyle::default()
        };

        let mut instance = text.create(&mut renderer, svg, Point::new(10.0, 10.0), &style).unwrap();
        let area = instance.nodes.content.unwrap();
        assert_eq!(renderer.parent(area), Some(instance.nodes.root));
        assert_eq!(renderer.tag(area, TAG_SHAPE).as_deref(), Some("text"));
        assert_eq!(renderer.style(area, "width"), Some("200px"));
        assert_eq!(renderer.style(area, "color"), Some("#ff0000"));

        assert_eq!(text.update(&mut renderer, &mut instance, Point::ZERO).unwrap(), Grip::Content);
        assert_eq!(renderer.focused(), Some(area));

        assert!(!text.commit(&renderer, &mut instance).unwrap());
        renderer.set_value(area, "hello").unwrap();
        assert!(text.commit(&renderer, &mut instance).unwrap());
        assert_eq!(instance.as_text().unwrap().content, "hello");
    }

    #[test]
    fn test_text_key_policy() {
        let mut renderer = MemoryRenderer::new();
        let svg = surface(&mut renderer);
        let text = descriptor(ShapeKind::Text);
        let instance = text
            .create(&mut renderer, svg, Point::ZERO, &PlacementStyle::default())
            .unwrap();
        let area = instance.nodes.content.unwrap();

        assert!(text.removes_on(&renderer, &instance, &Key::Delete));
        renderer.set_value(area, "draft").unwrap();
        assert!(!text.removes_on(&renderer, &instance, &Key::Delete));
        assert!(text.removes_on(&renderer, &instance, &Key::Escape));
        assert!(!text.removes_on(&renderer, &instance, &Key::Other("a".into())));

        let listeners = text.edit_listeners(renderer.page(), &instance);
        assert!(listeners.contains(&(area, EventKind::Blur)));
    }

    #[test]
    fn test_line_removes_on_delete_and_escape() {
        let mut renderer = MemoryRenderer::new();
        let svg = surface(&mut renderer);
        let line = descriptor(ShapeKind::Line);
        let instance = line
            .create(&mut renderer, svg, Point::ZERO, &PlacementStyle::default())
            .unwrap();
        assert!(line.removes_on(&renderer, &instance, &Key::Delete));
        assert!(line.removes_on(&renderer, &instance, &Key::Escape));
        assert!(!line.removes_on(&renderer, &instance, &Key::Other("Enter".into())));
    }

    #[test]
    fn test_failed_placement_leaves_no_nodes() {
        let mut renderer = MemoryRenderer::new();
        let stale = NodeHandle(500);
        for kind in ShapeKind::all() {
            let result = descriptor(*kind).create(&mut renderer, stale, Point::ZERO, &PlacementStyle::default());
            assert!(result.is_err());
        }
        for kind in [
            ElementKind::Line,
            ElementKind::Rect,
            ElementKind::ForeignObject,
            ElementKind::TextArea,
        ] {
            assert!(renderer.nodes_of_kind(kind).is_empty());
        }
    }
}

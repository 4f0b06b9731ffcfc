//! Menu chrome: the toggle, shape-type, color and delete selectors.

use crate::input::EventKind;
use crate::machine::Mode;
use crate::renderer::{set_class, ElementKind, NodeHandle, RenderResult, Renderer};
use crate::shapes::{SerializableColor, ShapeKind};

/// Class shared by every menu button.
pub const BUTTON_CLASS: &str = "annogram-btn";
/// Class marking the selected shape type, the selected color and the
/// toggle while the overlay is visible.
pub const ACTIVE_CLASS: &str = "active";

/// What a menu button does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Toggle,
    Shape(ShapeKind),
    /// Palette index.
    Color(usize),
    /// Remove the instance being edited.
    Delete,
}

/// Menu nodes. Built once per session.
#[derive(Debug, Clone)]
pub struct Menu {
    container: NodeHandle,
    chrome: Option<NodeHandle>,
    toggle: NodeHandle,
    delete: NodeHandle,
    shapes: Vec<(ShapeKind, NodeHandle)>,
    colors: Vec<NodeHandle>,
}

fn button(
    renderer: &mut dyn Renderer,
    parent: NodeHandle,
    class: &str,
    label: &str,
) -> RenderResult<NodeHandle> {
    let node = renderer.create_node(
        ElementKind::Button,
        &[
            ("class", format!("{} {}", BUTTON_CLASS, class)),
            ("href", "#".to_string()),
        ],
    )?;
    renderer.set_markup(node, label)?;
    renderer.append_child(parent, node)?;
    renderer.listen(node, EventKind::Click)?;
    Ok(node)
}

impl Menu {
    /// Build the menu under `parent`. `chrome` is optional decorative markup
    /// placed before the buttons.
    pub fn build(
        renderer: &mut dyn Renderer,
        parent: NodeHandle,
        chrome: Option<&str>,
        palette: &[SerializableColor],
    ) -> RenderResult<Self> {
        let container = renderer.create_node(
            ElementKind::Container,
            &[("class", "annogram-menu".to_string())],
        )?;

        let chrome = match chrome {
            Some(markup) => {
                let node = renderer.create_node(
                    ElementKind::Container,
                    &[("class", "annogram-chrome".to_string())],
                )?;
                renderer.set_markup(node, markup)?;
                renderer.append_child(container, node)?;
                Some(node)
            }
            None => None,
        };

        let delete = button(renderer, container, "annogram-delete", "Del")?;

        let mut shapes = Vec::with_capacity(ShapeKind::all().len());
        for &kind in ShapeKind::all() {
            let class = format!("annogram-shape {}", kind.id());
            let node = button(renderer, container, &class, kind.label())?;
            shapes.push((kind, node));
        }

        let mut colors = Vec::with_capacity(palette.len());
        for color in palette {
            let node = button(renderer, container, "annogram-color", "")?;
            let css = color.to_css();
            renderer.set_style(node, "background-color", &css)?;
            renderer.set_attribute(node, "title", &css)?;
            colors.push(node);
        }

        let toggle = button(renderer, container, "annogram-toggle", "Annotate")?;
        renderer.append_child(parent, container)?;

        let menu = Self {
            container,
            chrome,
            toggle,
            delete,
            shapes,
            colors,
        };
        menu.show_mode(renderer, Mode::Hidden)?;
        Ok(menu)
    }

    pub fn container(&self) -> NodeHandle {
        self.container
    }

    pub fn chrome(&self) -> Option<NodeHandle> {
        self.chrome
    }

    pub fn toggle(&self) -> NodeHandle {
        self.toggle
    }

    pub fn delete(&self) -> NodeHandle {
        self.delete
    }

    pub fn shape_button(&self, kind: ShapeKind) -> Option<NodeHandle> {
        self.shapes.iter().find(|(k, _)| *k == kind).map(|(_, n)| *n)
    }

    pub fn color_button(&self, index: usize) -> Option<NodeHandle> {
        self.colors.get(index).copied()
    }

    /// Selector behind a clicked node.
    pub fn selector(&self, node: NodeHandle) -> Option<Selector> {
        if node == self.toggle {
            return Some(Selector::Toggle);
        }
        if node == self.delete {
            return Some(Selector::Delete);
        }
        if let Some((kind, _)) = self.shapes.iter().find(|(_, n)| *n == node) {
            return Some(Selector::Shape(*kind));
        }
        self.colors
            .iter()
            .position(|n| *n == node)
            .map(Selector::Color)
    }

    fn selectors(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        std::iter::once(self.delete)
            .chain(self.shapes.iter().map(|(_, n)| *n))
            .chain(self.colors.iter().copied())
    }

    /// Show the selectors only while drawing and mark the toggle whenever
    /// the overlay is visible.
    pub fn show_mode(&self, renderer: &mut dyn Renderer, mode: Mode) -> RenderResult<()> {
        let display = if mode.accepts_placement() { "" } else { "none" };
        for node in self.selectors() {
            renderer.set_style(node, "display", display)?;
        }
        set_class(renderer, self.toggle, ACTIVE_CLASS, mode.is_visible())?;
        set_class(renderer, self.toggle, "paused", mode == Mode::Paused)
    }

    /// Mark `kind` as the only active shape selector.
    pub fn mark_shape(&self, renderer: &mut dyn Renderer, kind: ShapeKind) -> RenderResult<()> {
        for &(_, node) in &self.shapes {
            set_class(renderer, node, ACTIVE_CLASS, false)?;
        }
        match self.shape_button(kind) {
            Some(node) => set_class(renderer, node, ACTIVE_CLASS, true),
            None => Ok(()),
        }
    }

    /// Mark palette entry `index` as the only active color selector.
    pub fn mark_color(&self, renderer: &mut dyn Renderer, index: usize) -> RenderResult<()> {
        for &node in &self.colors {
            set_class(renderer, node, ACTIVE_CLASS, false)?;
        }
        match self.color_button(index) {
            Some(node) => set_class(renderer, node, ACTIVE_CLASS, true),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PALETTE;
    use crate::renderer::{has_class, MemoryRenderer};

    fn build(renderer: &mut MemoryRenderer, chrome: Option<&str>) -> Menu {
        let body = renderer.page().body;
        Menu::build(renderer, body, chrome, &DEFAULT_PALETTE).unwrap()
    }

    #[test]
    fn test_build_layout() {
        let mut renderer = MemoryRenderer::new();
        let menu = build(&mut renderer, Some("<b>notes</b>"));
        let body = renderer.page().body;

        assert_eq!(renderer.children(body), vec![menu.container()]);
        let chrome = menu.chrome().unwrap();
        assert_eq!(renderer.markup(chrome), Some("<b>notes</b>"));
        // chrome, delete, three shapes, five colors, toggle
        assert_eq!(renderer.children(menu.container()).len(), 11);
        assert_eq!(renderer.listeners_on(menu.toggle(), EventKind::Click), 1);

        let red = menu.color_button(1).unwrap();
        assert_eq!(renderer.style(red, "background-color"), Some("#ef4444"));
        assert_eq!(renderer.markup(menu.toggle()), Some("Annotate"));
    }

    #[test]
    fn test_build_without_chrome() {
        let mut renderer = MemoryRenderer::new();
        let menu = build(&mut renderer, None);
        assert!(menu.chrome().is_none());
        assert_eq!(renderer.children(menu.container()).len(), 10);
    }

    #[test]
    fn test_selector_lookup() {
        let mut renderer = MemoryRenderer::new();
        let menu = build(&mut renderer, None);

        assert_eq!(menu.selector(menu.toggle()), Some(Selector::Toggle));
        assert_eq!(menu.selector(menu.delete()), Some(Selector::Delete));
        let rect = menu.shape_button(ShapeKind::Rect).unwrap();
        assert_eq!(menu.selector(rect), Some(Selector::Shape(ShapeKind::Rect)));
        let color = menu.color_button(3).unwrap();
        assert_eq!(menu.selector(color), Some(Selector::Color(3)));
        assert_eq!(menu.selector(menu.container()), None);
    }

    #[test]
    fn test_show_mode() {
        let mut renderer = MemoryRenderer::new();
        let menu = build(&mut renderer, None);
        let line = menu.shape_button(ShapeKind::Line).unwrap();
        assert_eq!(renderer.style(line, "display"), Some("none"));
        assert!(!has_class(&renderer, menu.toggle(), ACTIVE_CLASS));

        menu.show_mode(&mut renderer, Mode::Drawing).unwrap();
        assert_eq!(renderer.style(line, "display"), None);
        assert_eq!(renderer.style(menu.delete(), "display"), None);
        assert!(has_class(&renderer, menu.toggle(), ACTIVE_CLASS));

        menu.show_mode(&mut renderer, Mode::Paused).unwrap();
        assert_eq!(renderer.style(line, "display"), Some("none"));
        assert!(has_class(&renderer, menu.toggle(), ACTIVE_CLASS));
        assert!(has_class(&renderer, menu.toggle(), "paused"));
    }

    #[test]
    fn test_marks_are_exclusive() {
        let mut renderer = MemoryRenderer::new();
        let menu = build(&mut renderer, None);

        menu.mark_shape(&mut renderer, ShapeKind::Line).unwrap();
        menu.mark_shape(&mut renderer, ShapeKind::Text).unwrap();
        let active: Vec<_> = ShapeKind::all()
            .iter()
            .filter(|k| has_class(&renderer, menu.shape_button(**k).unwrap(), ACTIVE_CLASS))
            .collect();
        assert_eq!(active, vec![&ShapeKind::Text]);

        menu.mark_color(&mut renderer, 0).unwrap();
        menu.mark_color(&mut renderer, 2).unwrap();
        let active: Vec<_> = (0..DEFAULT_PALETTE.len())
            .filter(|i| has_class(&renderer, menu.color_button(*i).unwrap(), ACTIVE_CLASS))
            .collect();
        assert_eq!(active, vec![2]);
    }
}

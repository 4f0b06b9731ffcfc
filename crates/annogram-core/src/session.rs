//! The overlay session: one surface, the menu, the placed shapes and the
//! interaction state machine driving them.

use crate::assets::{AssetProvider, MENU, OVERLAY, STYLESHEET};
use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::input::{EventKind, Key, OverlayEvent};
use crate::machine::{ClickRoute, EditSession, InteractionMachine, Mode};
use crate::menu::{Menu, Selector};
use crate::registry::{self, ShapeDescriptor, TAG_EDITING, TAG_INSTANCE, TAG_SHAPE};
use crate::renderer::{add_class, has_class, remove_class, set_class, ElementKind, NodeHandle, Renderer};
use crate::shapes::{Grip, ShapeId, ShapeInstance, ShapeKind};
use kurbo::Point;
use std::collections::HashMap;
use uuid::Uuid;

/// Class on the document root marking an initialized page.
pub const MARKER_CLASS: &str = "annogram";
/// Class of the overlay `<svg>`.
pub const SURFACE_CLASS: &str = "annogram-overlay";
/// Class on the root node of the instance being edited.
pub const EDITING_CLASS: &str = "editing";

/// Nodes created by a successful [`OverlaySession::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    /// The overlay `<svg>` holding every shape.
    pub svg: NodeHandle,
    /// The injected `<style>`, absent when no stylesheet asset was found.
    pub style: Option<NodeHandle>,
}

/// One annotation overlay on one page.
#[derive(Debug)]
pub struct OverlaySession<R: Renderer> {
    renderer: R,
    config: OverlayConfig,
    machine: InteractionMachine,
    active_kind: ShapeKind,
    active_color: usize,
    surface: Option<Surface>,
    menu: Option<Menu>,
    instances: HashMap<ShapeId, ShapeInstance>,
    /// Creation order of the live instances.
    z_order: Vec<ShapeId>,
    /// A blur just removed an empty text box. The click that caused it
    /// only dismisses the box.
    dismissed: bool,
}

impl<R: Renderer> OverlaySession<R> {
    pub fn new(renderer: R, config: OverlayConfig) -> Self {
        Self {
            renderer,
            machine: InteractionMachine::new(config.toggle),
            active_kind: config.default_shape,
            active_color: 0,
            surface: None,
            menu: None,
            instances: HashMap::new(),
            z_order: Vec::new(),
            dismissed: false,
            config,
        }
    }

    /// Build the overlay surface and the menu.
    ///
    /// Returns `Ok(false)` without touching the page when the page already
    /// carries an overlay.
    pub fn init(&mut self, assets: &dyn AssetProvider) -> OverlayResult<bool> {
        let page = self.renderer.page();
        if self.surface.is_some() || has_class(&self.renderer, page.root, MARKER_CLASS) {
            log::debug!("Overlay already present on this page, skipping init");
            return Ok(false);
        }
        add_class(&mut self.renderer, page.root, MARKER_CLASS)?;

        let style = match assets.asset(STYLESHEET) {
            Some(css) => {
                let node = self.renderer.create_node(ElementKind::Style, &[])?;
                self.renderer.set_markup(node, css)?;
                self.renderer.append_child(page.head, node)?;
                Some(node)
            }
            None => {
                log::warn!("No {} asset, overlay will be unstyled", STYLESHEET);
                None
            }
        };

        let height = self
            .renderer
            .document_size()
            .height
            .max(self.config.min_surface_height);
        let svg = self.renderer.create_node(
            ElementKind::Svg,
            &[
                ("class", SURFACE_CLASS.to_string()),
                ("height", height.to_string()),
            ],
        )?;
        match assets.asset(OVERLAY) {
            Some(defs) => self.renderer.set_markup(svg, defs)?,
            None => log::debug!("No {} asset, lines have no arrow heads", OVERLAY),
        }
        self.renderer.append_child(page.body, svg)?;
        self.renderer.listen(svg, EventKind::Click)?;

        let chrome = assets.asset(MENU);
        if chrome.is_none() {
            log::debug!("No {} asset, menu has no chrome", MENU);
        }
        let menu = Menu::build(&mut self.renderer, page.body, chrome, &self.config.palette)?;
        menu.mark_shape(&mut self.renderer, self.active_kind)?;
        menu.mark_color(&mut self.renderer, self.active_color)?;

        self.menu = Some(menu);
        self.surface = Some(Surface { svg, style });
        log::info!("Annotation overlay initialized ({}px high)", height);
        Ok(true)
    }

    /// Handle one event, logging and absorbing any failure.
    pub fn handle(&mut self, event: OverlayEvent) {
        let kind = event.kind();
        match self.dispatch(event) {
            Ok(()) => {}
            Err(err @ OverlayError::Renderer(_)) => {
                log::warn!("Failed to handle {:?} event: {}", kind, err);
            }
            Err(err) => log::debug!("Ignored {:?} event: {}", kind, err),
        }
    }

    /// Route one event to its handler.
    pub fn dispatch(&mut self, event: OverlayEvent) -> OverlayResult<()> {
        let surface = self.surface.ok_or(OverlayError::NotInitialized)?;
        match event {
            OverlayEvent::Click {
                listener,
                target,
                position,
            } => {
                let dismissed = std::mem::take(&mut self.dismissed);
                if let Some(selector) = self.menu.as_ref().and_then(|m| m.selector(listener)) {
                    return self.select(selector);
                }
                if listener == surface.svg {
                    if dismissed {
                        log::debug!("Click dismissed an empty text box");
                        return Ok(());
                    }
                    return self.overlay_click(target, position);
                }
                log::debug!("Click on unrouted node {:?}", listener);
                Ok(())
            }
            OverlayEvent::PointerMove { position } => self.pointer_move(position),
            OverlayEvent::KeyUp { key } => self.key_up(&key),
            OverlayEvent::Blur { node } => self.blur(node),
        }
    }

    fn select(&mut self, selector: Selector) -> OverlayResult<()> {
        match selector {
            Selector::Toggle => self.toggle().map(|_| ()),
            Selector::Shape(kind) => self.select_shape(kind),
            Selector::Color(index) => self.select_color(index),
            Selector::Delete => self.delete_editing(),
        }
    }

    /// Advance the overlay mode. An open edit is committed first.
    pub fn toggle(&mut self) -> OverlayResult<Mode> {
        if self.surface.is_none() {
            return Err(OverlayError::NotInitialized);
        }
        if self.machine.is_editing() {
            self.commit_edit()?;
        }
        self.dismissed = false;
        let mode = self.machine.toggle();

        let root = self.renderer.page().root;
        for state in [Mode::Drawing, Mode::Paused] {
            if let Some(class) = state.css_class() {
                set_class(&mut self.renderer, root, class, state == mode)?;
            }
        }
        if let Some(menu) = &self.menu {
            menu.show_mode(&mut self.renderer, mode)?;
        }
        Ok(mode)
    }

    /// Select the shape type placed by the next click. Only while drawing.
    pub fn select_shape(&mut self, kind: ShapeKind) -> OverlayResult<()> {
        if !self.machine.mode().accepts_placement() {
            log::debug!("Shape selection ignored outside drawing mode");
            return Ok(());
        }
        self.active_kind = kind;
        if let Some(menu) = &self.menu {
            menu.mark_shape(&mut self.renderer, kind)?;
        }
        Ok(())
    }

    /// Select the palette color of the next placed shape. Only while drawing.
    pub fn select_color(&mut self, index: usize) -> OverlayResult<()> {
        if !self.machine.mode().accepts_placement() {
            log::debug!("Color selection ignored outside drawing mode");
            return Ok(());
        }
        if index >= self.config.palette.len() {
            log::debug!("Palette has no color {}", index);
            return Ok(());
        }
        self.active_color = index;
        if let Some(menu) = &self.menu {
            menu.mark_color(&mut self.renderer, index)?;
        }
        Ok(())
    }

    fn overlay_click(&mut self, target: Option<NodeHandle>, position: Point) -> OverlayResult<()> {
        let surface = self.surface.ok_or(OverlayError::NotInitialized)?;
        match self.machine.route_click(surface.svg, target) {
            ClickRoute::Ignore => Ok(()),
            ClickRoute::Commit => self.commit_edit(),
            ClickRoute::Create => self.create_at(surface.svg, position),
            ClickRoute::Edit(node) => self.edit_existing(node, position),
        }
    }

    /// Root of the oldest text box. Text boxes stay above other shapes.
    fn first_text_root(&self) -> Option<NodeHandle> {
        self.z_order
            .iter()
            .filter_map(|id| self.instances.get(id))
            .find(|instance| instance.kind() == ShapeKind::Text)
            .map(|instance| instance.nodes.root)
    }

    fn create_at(&mut self, svg: NodeHandle, position: Point) -> OverlayResult<()> {
        let descriptor = registry::descriptor(self.active_kind);
        let style = self.config.placement_style(self.active_color);
        let instance = descriptor.create(&mut self.renderer, svg, position, &style)?;

        if instance.kind() != ShapeKind::Text {
            if let Some(text) = self.first_text_root() {
                let root = instance.nodes.root;
                if let Err(err) = self.renderer.insert_before(svg, root, text) {
                    self.renderer.remove(root)?;
                    return Err(err.into());
                }
            }
        }

        let id = instance.id();
        self.instances.insert(id, instance);
        self.z_order.push(id);

        if let Err(err) = self.start_edit(id, descriptor, position) {
            self.discard(id)?;
            return Err(err);
        }

        log::debug!("Placed {} {} at {:?}", self.active_kind.id(), id, position);
        Ok(())
    }

    fn edit_existing(&mut self, node: NodeHandle, position: Point) -> OverlayResult<()> {
        let Some(descriptor) = self
            .renderer
            .tag(node, TAG_SHAPE)
            .and_then(|kind| registry::lookup(&kind))
        else {
            log::debug!("Click on {:?} without a known shape tag", node);
            return Ok(());
        };
        let Some(id) = self
            .renderer
            .tag(node, TAG_INSTANCE)
            .and_then(|id| Uuid::parse_str(&id).ok())
        else {
            log::debug!("Click on {:?} without an instance tag", node);
            return Ok(());
        };

        self.start_edit(id, descriptor, position)
    }

    /// Let the descriptor pick the grip, then open the edit session.
    fn start_edit(
        &mut self,
        id: ShapeId,
        descriptor: &dyn ShapeDescriptor,
        position: Point,
    ) -> OverlayResult<()> {
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(OverlayError::UnknownShape(id))?;
        let grip = descriptor.update(&mut self.renderer, instance, position)?;
        self.begin_edit(id, grip)
    }

    fn begin_edit(&mut self, id: ShapeId, grip: Grip) -> OverlayResult<()> {
        let instance = self.instances.get(&id).ok_or(OverlayError::UnknownShape(id))?;
        let nodes = instance.nodes;
        let listeners = registry::descriptor(instance.kind()).edit_listeners(self.renderer.page(), instance);

        self.machine
            .enter_edit(&mut self.renderer, id, grip, nodes.content, &listeners)?;

        let marked = add_class(&mut self.renderer, nodes.root, EDITING_CLASS)
            .and_then(|_| self.renderer.set_tag(nodes.root, TAG_EDITING, Some("true")));
        if let Err(err) = marked {
            self.machine.exit_edit(&mut self.renderer);
            return Err(err.into());
        }
        Ok(())
    }

    /// Clear the edit marks of the instance's root. The root may be gone.
    fn unmark(&mut self, root: NodeHandle) {
        let cleared = remove_class(&mut self.renderer, root, EDITING_CLASS)
            .and_then(|_| self.renderer.set_tag(root, TAG_EDITING, None));
        if let Err(err) = cleared {
            log::debug!("Could not clear edit marks on {:?}: {}", root, err);
        }
    }

    fn pointer_move(&mut self, position: Point) -> OverlayResult<()> {
        let Some((id, grip)) = self.machine.editing().map(|s| (s.shape(), s.grip())) else {
            return Ok(());
        };
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(OverlayError::UnknownShape(id))?;
        registry::descriptor(instance.kind()).drag(&mut self.renderer, instance, grip, position)?;
        Ok(())
    }

    fn key_up(&mut self, key: &Key) -> OverlayResult<()> {
        let Some(id) = self.machine.editing().map(EditSession::shape) else {
            return Ok(());
        };
        let instance = self.instances.get(&id).ok_or(OverlayError::UnknownShape(id))?;
        if registry::descriptor(instance.kind()).removes_on(&self.renderer, instance, key) {
            self.delete_editing()?;
        }
        Ok(())
    }

    /// Losing focus removes an empty text box. A box with content stays in
    /// edit until the click that caused the blur commits it. Either way that
    /// click places nothing.
    fn blur(&mut self, node: NodeHandle) -> OverlayResult<()> {
        let Some(id) = self
            .machine
            .editing()
            .filter(|s| s.inner() == Some(node))
            .map(EditSession::shape)
        else {
            return Ok(());
        };
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(OverlayError::UnknownShape(id))?;
        if !registry::descriptor(instance.kind()).commit(&self.renderer, instance)? {
            self.delete_editing()?;
            self.dismissed = true;
        }
        Ok(())
    }

    /// Close the open edit, keeping the instance unless its descriptor
    /// rejects it (an empty text box).
    pub fn commit_edit(&mut self) -> OverlayResult<()> {
        let Some(session) = self.machine.exit_edit(&mut self.renderer) else {
            return Ok(());
        };
        let id = session.shape();
        let root = self
            .instances
            .get(&id)
            .map(|instance| instance.nodes.root)
            .ok_or(OverlayError::UnknownShape(id))?;
        self.unmark(root);

        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(OverlayError::UnknownShape(id))?;
        let keep = registry::descriptor(instance.kind()).commit(&self.renderer, instance)?;
        if !keep {
            log::debug!("Discarding empty {} {}", instance.kind().id(), id);
            self.discard(id)?;
        }
        Ok(())
    }

    /// Remove the instance being edited, if any.
    pub fn delete_editing(&mut self) -> OverlayResult<()> {
        match self.machine.exit_edit(&mut self.renderer) {
            Some(session) => self.discard(session.shape()),
            None => {
                log::debug!("Nothing is being edited");
                Ok(())
            }
        }
    }

    fn discard(&mut self, id: ShapeId) -> OverlayResult<()> {
        let instance = self.instances.remove(&id).ok_or(OverlayError::UnknownShape(id))?;
        self.z_order.retain(|other| *other != id);
        self.renderer.remove(instance.nodes.root)?;
        Ok(())
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    pub fn active_shape(&self) -> ShapeKind {
        self.active_kind
    }

    /// Palette index of the active color.
    pub fn active_color(&self) -> usize {
        self.active_color
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.machine.editing()
    }

    pub fn instance(&self, id: ShapeId) -> Option<&ShapeInstance> {
        self.instances.get(&id)
    }

    /// Live instances, oldest first.
    pub fn instances(&self) -> impl Iterator<Item = &ShapeInstance> + '_ {
        self.z_order.iter().filter_map(|id| self.instances.get(id))
    }

    pub fn surface(&self) -> Option<Surface> {
        self.surface
    }

    pub fn menu(&self) -> Option<&Menu> {
        self.menu.as_ref()
    }
}

//! Interaction state machine: overlay mode and the edit-session guard.

use crate::error::{OverlayError, OverlayResult};
use crate::input::EventKind;
use crate::renderer::{ListenerId, NodeHandle, Renderer};
use crate::shapes::{Grip, ShapeId};
use serde::{Deserialize, Serialize};

/// Overlay mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Overlay not shown.
    #[default]
    Hidden,
    /// Overlay shown and accepting placement clicks.
    Drawing,
    /// Overlay shown, clicks pass through to the page.
    Paused,
}

impl Mode {
    /// Mode after one activation of the toggle control.
    pub fn next(self, variant: ToggleVariant) -> Self {
        match (self, variant) {
            (Mode::Hidden, _) => Mode::Drawing,
            (Mode::Drawing, ToggleVariant::ThreeState) => Mode::Paused,
            (Mode::Drawing, ToggleVariant::TwoState) => Mode::Hidden,
            (Mode::Paused, _) => Mode::Hidden,
        }
    }

    /// Whether the overlay is rendered.
    pub fn is_visible(self) -> bool {
        !matches!(self, Mode::Hidden)
    }

    /// Whether clicks on the overlay place or edit shapes.
    pub fn accepts_placement(self) -> bool {
        matches!(self, Mode::Drawing)
    }

    /// Class set on the document root while in this mode.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Mode::Hidden => None,
            Mode::Drawing => Some("annogram-drawing"),
            Mode::Paused => Some("annogram-paused"),
        }
    }
}

/// How many states the toggle control cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToggleVariant {
    /// Hidden and Drawing only.
    TwoState,
    /// Hidden, Drawing, Paused.
    #[default]
    ThreeState,
}

/// Outcome of routing an overlay click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickRoute {
    /// Not drawing, or the click belongs to the open edit itself.
    Ignore,
    /// An edit is open: the click closes it.
    Commit,
    /// Empty overlay: place a new shape.
    Create,
    /// Existing shape node: start editing it.
    Edit(NodeHandle),
}

/// The open edit: one instance and the listeners attached for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    shape: ShapeId,
    grip: Grip,
    inner: Option<NodeHandle>,
    listeners: Vec<ListenerId>,
}

impl EditSession {
    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Part of the shape following the pointer.
    pub fn grip(&self) -> Grip {
        self.grip
    }

    /// Editable inner node, clicks on which stay inside the edit.
    pub fn inner(&self) -> Option<NodeHandle> {
        self.inner
    }

    pub fn listeners(&self) -> &[ListenerId] {
        &self.listeners
    }
}

/// Mode controller plus the single-writer edit guard.
#[derive(Debug, Clone, Default)]
pub struct InteractionMachine {
    mode: Mode,
    variant: ToggleVariant,
    editing: Option<EditSession>,
}

impl InteractionMachine {
    pub fn new(variant: ToggleVariant) -> Self {
        Self {
            mode: Mode::Hidden,
            variant,
            editing: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn variant(&self) -> ToggleVariant {
        self.variant
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    /// Advance the mode. The caller closes any open edit first.
    pub fn toggle(&mut self) -> Mode {
        self.mode = self.mode.next(self.variant);
        log::debug!("Overlay mode is now {:?}", self.mode);
        self.mode
    }

    /// Decide what a click on the overlay does.
    pub fn route_click(&self, surface: NodeHandle, target: Option<NodeHandle>) -> ClickRoute {
        if !self.mode.accepts_placement() {
            return ClickRoute::Ignore;
        }
        if let Some(session) = &self.editing {
            if target.is_some() && target == session.inner {
                return ClickRoute::Ignore;
            }
            return ClickRoute::Commit;
        }
        match target {
            None => ClickRoute::Create,
            Some(node) if node == surface => ClickRoute::Create,
            Some(node) => ClickRoute::Edit(node),
        }
    }

    /// Open an edit session, attaching every listener in `listeners`.
    ///
    /// Either all listeners are attached and the guard is set, or none are
    /// and the guard stays clear.
    pub fn enter_edit(
        &mut self,
        renderer: &mut dyn Renderer,
        shape: ShapeId,
        grip: Grip,
        inner: Option<NodeHandle>,
        listeners: &[(NodeHandle, EventKind)],
    ) -> OverlayResult<()> {
        if self.editing.is_some() {
            return Err(OverlayError::AlreadyEditing);
        }

        let mut attached = Vec::with_capacity(listeners.len());
        for &(node, kind) in listeners {
            match renderer.listen(node, kind) {
                Ok(id) => attached.push(id),
                Err(err) => {
                    for id in attached {
                        if let Err(e) = renderer.unlisten(id) {
                            log::debug!("Rollback of listener {:?} failed: {}", id, e);
                        }
                    }
                    return Err(err.into());
                }
            }
        }

        self.editing = Some(EditSession {
            shape,
            grip,
            inner,
            listeners: attached,
        });
        Ok(())
    }

    /// Close the edit session, detaching exactly its own listeners.
    pub fn exit_edit(&mut self, renderer: &mut dyn Renderer) -> Option<EditSession> {
        let session = self.editing.take()?;
        for &id in &session.listeners {
            // Listeners on removed nodes are already gone.
            if let Err(e) = renderer.unlisten(id) {
                log::debug!("Listener {:?} was already detached: {}", id, e);
            }
        }
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{ElementKind, MemoryRenderer, RendererError};
    use uuid::Uuid;

    #[test]
    fn test_three_state_cycle() {
        let mut machine = InteractionMachine::default();
        assert_eq!(machine.mode(), Mode::Hidden);
        assert_eq!(machine.toggle(), Mode::Drawing);
        assert_eq!(machine.toggle(), Mode::Paused);
        assert_eq!(machine.toggle(), Mode::Hidden);
    }

    #[test]
    fn test_two_state_cycle() {
        let mut machine = InteractionMachine::new(ToggleVariant::TwoState);
        assert_eq!(machine.toggle(), Mode::Drawing);
        assert_eq!(machine.toggle(), Mode::Hidden);
    }

    #[test]
    fn test_mode_flags() {
        assert!(!Mode::Hidden.is_visible());
        assert!(Mode::Paused.is_visible());
        assert!(Mode::Drawing.accepts_placement());
        assert!(!Mode::Paused.accepts_placement());
        assert_eq!(Mode::Paused.css_class(), Some("annogram-paused"));
        assert_eq!(Mode::Hidden.css_class(), None);
    }

    #[test]
    fn test_route_click() {
        let surface = NodeHandle(10);
        let shape = NodeHandle(11);
        let mut machine = InteractionMachine::default();
        assert_eq!(machine.route_click(surface, Some(surface)), ClickRoute::Ignore);

        machine.toggle();
        assert_eq!(machine.route_click(surface, Some(surface)), ClickRoute::Create);
        assert_eq!(machine.route_click(surface, None), ClickRoute::Create);
        assert_eq!(machine.route_click(surface, Some(shape)), ClickRoute::Edit(shape));
    }

    #[test]
    fn test_route_click_while_editing() {
        let mut renderer = MemoryRenderer::new();
        let root = renderer.page().root;
        let area = renderer.create_node(ElementKind::TextArea, &[]).unwrap();
        let surface = NodeHandle(99);

        let mut machine = InteractionMachine::default();
        machine.toggle();
        machine
            .enter_edit(
                &mut renderer,
                Uuid::new_v4(),
                Grip::Content,
                Some(area),
                &[(root, EventKind::KeyUp)],
            )
            .unwrap();

        assert_eq!(machine.route_click(surface, Some(surface)), ClickRoute::Commit);
        assert_eq!(machine.route_click(surface, None), ClickRoute::Commit);
        assert_eq!(machine.route_click(surface, Some(area)), ClickRoute::Ignore);
    }

    #[test]
    fn test_enter_and_exit_edit() {
        let mut renderer = MemoryRenderer::new();
        let root = renderer.page().root;
        let mut machine = InteractionMachine::default();
        let id = Uuid::new_v4();

        machine
            .enter_edit(
                &mut renderer,
                id,
                Grip::End,
                None,
                &[(root, EventKind::PointerMove), (root, EventKind::KeyUp)],
            )
            .unwrap();
        assert!(machine.is_editing());
        assert_eq!(renderer.listener_count(), 2);
        assert_eq!(machine.editing().map(|s| s.grip()), Some(Grip::End));

        let second = machine.enter_edit(&mut renderer, Uuid::new_v4(), Grip::End, None, &[]);
        assert!(matches!(second, Err(OverlayError::AlreadyEditing)));

        let session = machine.exit_edit(&mut renderer).unwrap();
        assert_eq!(session.shape(), id);
        assert_eq!(session.listeners().len(), 2);
        assert_eq!(renderer.listener_count(), 0);
        assert!(!machine.is_editing());
        assert!(machine.exit_edit(&mut renderer).is_none());
    }

    #[test]
    fn test_enter_edit_rolls_back_on_failure() {
        let mut renderer = MemoryRenderer::new();
        let root = renderer.page().root;
        let mut machine = InteractionMachine::default();

        let result = machine.enter_edit(
            &mut renderer,
            Uuid::new_v4(),
            Grip::Content,
            None,
            &[(root, EventKind::PointerMove), (NodeHandle(500), EventKind::Blur)],
        );
        assert!(matches!(
            result,
            Err(OverlayError::Renderer(RendererError::UnknownNode(NodeHandle(500))))
        ));
        assert!(!machine.is_editing());
        assert_eq!(renderer.listener_count(), 0);
    }
}

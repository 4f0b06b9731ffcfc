//! annogram Core Library
//!
//! Platform-agnostic state machine, geometry and shape registry for an
//! in-page annotation overlay. Rendering goes through the [`Renderer`] trait.

pub mod assets;
pub mod config;
pub mod error;
pub mod input;
pub mod machine;
pub mod menu;
pub mod registry;
pub mod renderer;
pub mod session;
pub mod shapes;

pub use assets::{AssetProvider, InlineAssets};
pub use config::{ConfigError, CoordinateSpace, OverlayConfig};
pub use error::{OverlayError, OverlayResult};
pub use input::{EventKind, Key, OverlayEvent};
pub use machine::{ClickRoute, EditSession, InteractionMachine, Mode, ToggleVariant};
pub use menu::{Menu, Selector};
pub use registry::{descriptor, lookup, PlacementStyle, ShapeDescriptor};
pub use renderer::{
    ElementKind, ListenerId, MemoryRenderer, NodeHandle, PageNodes, RenderResult, Renderer,
    RendererError,
};
pub use session::{OverlaySession, Surface};
pub use shapes::{
    Geometry, Grip, LineGeometry, RectGeometry, SerializableColor, ShapeId, ShapeInstance,
    ShapeKind, TextGeometry,
};

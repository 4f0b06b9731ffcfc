//! Overlay error types.

use crate::renderer::RendererError;
use crate::shapes::ShapeId;
use thiserror::Error;

/// Errors raised while handling overlay events.
///
/// None of these reach the user: the session logs and absorbs them.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Renderer error: {0}")]
    Renderer(#[from] RendererError),
    #[error("An edit session is already open")]
    AlreadyEditing,
    #[error("Unknown shape: {0}")]
    UnknownShape(ShapeId),
    #[error("Overlay is not initialized")]
    NotInitialized,
}

/// Result type for overlay operations.
pub type OverlayResult<T> = Result<T, OverlayError>;

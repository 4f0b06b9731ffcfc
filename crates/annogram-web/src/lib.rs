//! annogram Web Shell
//!
//! Runs the annotation overlay inside a browser page: a DOM renderer for the
//! core renderer contract plus the WASM entry point.

pub mod bootstrap;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use dom::{DomRenderer, EventSink};
#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;

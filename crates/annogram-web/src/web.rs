//! WebAssembly entry point.

use crate::bootstrap::{self, ASSETS_ATTR, CONFIG_ATTR, SCRIPT_SELECTOR};
use crate::dom::{DomRenderer, EventSink};
use annogram_core::{InlineAssets, OverlayConfig, OverlayEvent, OverlaySession};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

type SharedSession = Rc<RefCell<Option<OverlaySession<DomRenderer>>>>;

thread_local! {
    // Keeps the session and its listeners alive for the page's lifetime.
    static SESSION: RefCell<Option<SharedSession>> = const { RefCell::new(None) };
}

/// Read the settings script tag: its config attribute and asset bundle URL.
fn script_settings() -> (Option<String>, Option<String>) {
    let script = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.query_selector(SCRIPT_SELECTOR).ok().flatten());
    match script {
        Some(script) => (
            script.get_attribute(CONFIG_ATTR),
            bootstrap::asset_url(script.get_attribute(ASSETS_ATTR), script.get_attribute("src")),
        ),
        None => (None, None),
    }
}

async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let response: web_sys::Response = wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    let text = wasm_bindgen_futures::JsFuture::from(response.text()?).await?;
    text.as_string()
        .ok_or_else(|| JsValue::from_str("Response body is not text"))
}

/// Event sink forwarding into the shared session.
///
/// Events raised while the session is busy (a blur fired by removing a
/// focused node) are dropped.
fn sink_for(shared: &SharedSession) -> EventSink {
    let weak = Rc::downgrade(shared);
    Rc::new(move |event: OverlayEvent| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let Ok(mut slot) = shared.try_borrow_mut() else {
            log::debug!("Dropped re-entrant {:?} event", event.kind());
            return;
        };
        if let Some(session) = slot.as_mut() {
            session.handle(event);
        }
    })
}

fn start(config: OverlayConfig, assets: &InlineAssets) -> Result<(), JsValue> {
    let shared: SharedSession = Rc::new(RefCell::new(None));
    let renderer = DomRenderer::new(sink_for(&shared), config.coordinates)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let mut session = OverlaySession::new(renderer, config);
    let created = session
        .init(assets)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if !created {
        log::info!("annogram is already running on this page");
        return Ok(());
    }

    *shared.borrow_mut() = Some(session);
    SESSION.with(|cell| *cell.borrow_mut() = Some(shared));
    Ok(())
}

/// Initialize the overlay on the hosting page.
#[wasm_bindgen(start)]
pub async fn run_wasm() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"annogram: logger already initialized".into());
    }

    let (raw_config, assets_url) = script_settings();
    let config = bootstrap::load_config(raw_config.as_deref());

    let fetched = match assets_url {
        Some(url) => match fetch_text(&url).await {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Failed to fetch assets from {}: {:?}", url, e);
                None
            }
        },
        None => None,
    };
    let assets = bootstrap::assets_from_bundle(fetched.as_deref());

    if let Err(e) = start(config, &assets) {
        log::error!("Failed to start annogram: {:?}", e);
    }
}

//! Startup settings read from the hosting `<script>` tag.

use annogram_core::{InlineAssets, OverlayConfig};

/// Selector of the script tag carrying the overlay settings.
pub const SCRIPT_SELECTOR: &str = "script.annogram";
/// Attribute holding the JSON configuration.
pub const CONFIG_ATTR: &str = "data-config";
/// Attribute holding the URL of the asset bundle.
pub const ASSETS_ATTR: &str = "data-assets";

/// Parse the configuration attribute, falling back to defaults.
pub fn load_config(raw: Option<&str>) -> OverlayConfig {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return OverlayConfig::default();
    };
    match OverlayConfig::from_json(raw) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring invalid overlay config: {}", e);
            OverlayConfig::default()
        }
    }
}

/// URL of the asset bundle: the explicit attribute first, then the
/// script's own source, which may carry the bundle in a comment.
pub fn asset_url(data_assets: Option<String>, src: Option<String>) -> Option<String> {
    data_assets
        .into_iter()
        .chain(src)
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
}

/// Assets parsed from a fetched bundle, or the bundled defaults when the
/// fetch failed or the text holds no blocks.
pub fn assets_from_bundle(text: Option<&str>) -> InlineAssets {
    match text.map(InlineAssets::parse) {
        Some(assets) if !assets.is_empty() => assets,
        Some(_) => {
            log::warn!("Fetched asset bundle has no blocks, using bundled assets");
            InlineAssets::bundled()
        }
        None => InlineAssets::bundled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annogram_core::assets::{AssetProvider, STYLESHEET};
    use annogram_core::{CoordinateSpace, ToggleVariant};

    #[test]
    fn test_load_config() {
        assert_eq!(load_config(None), OverlayConfig::default());
        assert_eq!(load_config(Some("  ")), OverlayConfig::default());
        assert_eq!(load_config(Some("{broken")), OverlayConfig::default());

        let config = load_config(Some(r#"{"toggle": "two-state", "coordinates": "container"}"#));
        assert_eq!(config.toggle, ToggleVariant::TwoState);
        assert_eq!(config.coordinates, CoordinateSpace::Container);
    }

    #[test]
    fn test_asset_url_precedence() {
        assert_eq!(
            asset_url(Some("assets.txt".into()), Some("annogram.js".into())).as_deref(),
            Some("assets.txt")
        );
        assert_eq!(
            asset_url(Some(" ".into()), Some("annogram.js".into())).as_deref(),
            Some("annogram.js")
        );
        assert_eq!(asset_url(None, None), None);
    }

    #[test]
    fn test_assets_fallback() {
        let fetched = assets_from_bundle(Some(">>> style.css\nbody {}\n<<< style.css"));
        assert_eq!(fetched.asset(STYLESHEET), Some("body {}"));

        let empty = assets_from_bundle(Some("console.log('no bundle here');"));
        assert_eq!(empty, InlineAssets::bundled());
        assert_eq!(assets_from_bundle(None), InlineAssets::bundled());
    }
}

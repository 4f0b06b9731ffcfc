//! Static markup and style text consumed at initialization.

use std::collections::HashMap;

/// Stylesheet block name.
pub const STYLESHEET: &str = "style.css";
/// Menu chrome markup block name.
pub const MENU: &str = "menu.html";
/// Markup placed inside the overlay `<svg>` (arrow markers and other defs).
pub const OVERLAY: &str = "overlay.svg";

/// Source of named text blocks.
///
/// A missing block is not an error: the feature it backs is skipped.
pub trait AssetProvider {
    fn asset(&self, name: &str) -> Option<&str>;
}

impl AssetProvider for HashMap<String, String> {
    fn asset(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Assets parsed from an inline multipart bundle.
///
/// A block opens with a line `>>> name` and closes with `<<< name`. Lines in
/// between are the block's content; everything else is ignored, which lets a
/// bundle live inside a comment of another file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineAssets {
    blocks: HashMap<String, String>,
}

impl InlineAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a bundle. Unterminated blocks are dropped.
    pub fn parse(text: &str) -> Self {
        let mut blocks = HashMap::new();
        let mut open: Option<(&str, Vec<&str>)> = None;

        for line in text.lines() {
            let trimmed = line.trim();
            match open.as_mut() {
                None => {
                    if let Some(name) = trimmed.strip_prefix(">>>").map(str::trim) {
                        if !name.is_empty() {
                            open = Some((name, Vec::new()));
                        }
                    }
                }
                Some((name, lines)) => {
                    let closes = trimmed
                        .strip_prefix("<<<")
                        .is_some_and(|rest| rest.trim() == *name);
                    if closes {
                        blocks.insert(name.to_string(), lines.join("\n"));
                        open = None;
                    } else {
                        lines.push(line);
                    }
                }
            }
        }

        if let Some((name, _)) = open {
            log::warn!("Asset block '{}' is not terminated, ignoring it", name);
        }
        Self { blocks }
    }

    /// The asset bundle shipped with this crate.
    pub fn bundled() -> Self {
        Self::parse(include_str!("../assets/annogram.txt"))
    }

    /// Add or replace a block.
    pub fn with(mut self, name: &str, text: &str) -> Self {
        self.blocks.insert(name.to_string(), text.to_string());
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl AssetProvider for InlineAssets {
    fn asset(&self, name: &str) -> Option<&str> {
        self.blocks.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks_inside_comment() {
        let text = "/**\nheader text\n\n>>> style.css\n.a { color: red; }\n.b {}\n<<< style.css\n\n>>> menu.html\n<div class=\"menu\"></div>\n<<< menu.html\n**/\ncode();";
        let assets = InlineAssets::parse(text);
        assert_eq!(assets.len(), 2);
        assert_eq!(assets.asset(STYLESHEET), Some(".a { color: red; }\n.b {}"));
        assert_eq!(assets.asset(MENU), Some("<div class=\"menu\"></div>"));
        assert_eq!(assets.asset(OVERLAY), None);
    }

    #[test]
    fn test_closing_marker_must_match_name() {
        let text = ">>> a.css\nline 1\n<<< b.css\nline 2\n<<< a.css";
        let assets = InlineAssets::parse(text);
        assert_eq!(assets.asset("a.css"), Some("line 1\n<<< b.css\nline 2"));
    }

    #[test]
    fn test_unterminated_block_is_dropped() {
        let assets = InlineAssets::parse(">>> style.css\nbody {}\n");
        assert!(assets.is_empty());
    }

    #[test]
    fn test_empty_block() {
        let assets = InlineAssets::parse(">>> empty.txt\n<<< empty.txt");
        assert_eq!(assets.asset("empty.txt"), Some(""));
    }

    #[test]
    fn test_bundled_assets() {
        let assets = InlineAssets::bundled();
        for name in [STYLESHEET, MENU, OVERLAY] {
            assert!(assets.asset(name).is_some(), "missing {}", name);
        }
        assert!(assets.asset(STYLESHEET).unwrap().contains("annogram-overlay"));
    }

    #[test]
    fn test_bundled_arrow_heads_show_while_paused() {
        let css = InlineAssets::bundled().asset(STYLESHEET).unwrap().to_string();
        let rule = css
            .split('}')
            .find(|rule| rule.contains("marker-end"))
            .unwrap();
        assert!(rule.contains("html.annogram-drawing svg.annogram-overlay line"));
        assert!(rule.contains("html.annogram-paused svg.annogram-overlay line"));
    }

    #[test]
    fn test_hash_map_provider() {
        let mut map = HashMap::new();
        map.insert(MENU.to_string(), "<b>hi</b>".to_string());
        assert_eq!(map.asset(MENU), Some("<b>hi</b>"));
        assert_eq!(map.asset(STYLESHEET), None);
        let assets = InlineAssets::new().with(MENU, "x");
        assert_eq!(assets.names().collect::<Vec<_>>(), vec![MENU]);
    }
}

//! WebCraft Renderer - projects structured builder pages into HTML
//!
//! Two modes share one per-kind projection: [`RenderMode::Preview`] is the
//! final look (also used for static export) and [`RenderMode::Canvas`] wraps
//! every component in a frame carrying its id and the remove/drag controls.

pub mod canvas;
pub mod components;
pub mod page;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use canvas::{render_canvas, CanvasAction, CANVAS_ID_ATTRIBUTE};
pub use components::{button_classes, render_component, render_components, youtube_embed_url};
pub use page::{page_file_name, render_page_document, render_preview, RenderedPage, SiteRenderer};

/// Which projection to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Editable frames with controls
    Canvas,
    #[default]
    Preview,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Canvas => write!(f, "canvas"),
            RenderMode::Preview => write!(f, "preview"),
        }
    }
}

/// Context provided to the component projection
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub mode: RenderMode,
    /// Style framework loaded by standalone documents
    pub style_framework_url: String,
    /// Page slug to link target, used to rewrite in-site navigation
    pub links: HashMap<String, String>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(RenderMode::Preview)
    }
}

impl RenderContext {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            style_framework_url: webcraft_core::ExportConfig::default().style_framework_url,
            links: HashMap::new(),
        }
    }

    pub fn with_style_framework<S: Into<String>>(mut self, url: S) -> Self {
        self.style_framework_url = url.into();
        self
    }

    /// Route in-site navigation to `slug` through `target`
    pub fn with_link<S: Into<String>, T: Into<String>>(mut self, slug: S, target: T) -> Self {
        self.links.insert(slug.into(), target.into());
        self
    }

    /// The href a navigation item should carry
    pub fn resolve_link<'a>(&'a self, href: &'a str) -> &'a str {
        self.links.get(href).map(String::as_str).unwrap_or(href)
    }
}

/// Result of rendering a page
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub html: String,
    /// External resources the markup depends on
    pub assets: Vec<Asset>,
    /// Whether the markup carries inline behaviour
    pub has_interactive_content: bool,
}

impl RenderResult {
    pub fn new(html: String) -> Self {
        Self {
            html,
            assets: Vec::new(),
            has_interactive_content: false,
        }
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        if !self.assets.contains(&asset) {
            self.assets.push(asset);
        }
        self
    }

    pub fn with_interactive_content(mut self) -> Self {
        self.has_interactive_content = true;
        self
    }

    /// Append another result's markup, merging its assets and flags
    pub fn absorb(&mut self, other: RenderResult) {
        self.html.push_str(&other.html);
        for asset in other.assets {
            if !self.assets.contains(&asset) {
                self.assets.push(asset);
            }
        }
        self.has_interactive_content |= other.has_interactive_content;
    }
}

/// Asset required by rendered content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_type: AssetType,
    pub url: String,
    /// Whether the page renders wrongly without it
    pub is_critical: bool,
}

impl Asset {
    pub fn new<S: Into<String>>(asset_type: AssetType, url: S, is_critical: bool) -> Self {
        Self {
            asset_type,
            url: url.into(),
            is_critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    JavaScript,
    Image,
    Video,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_resolves_known_slugs_only() {
        let context = RenderContext::new(RenderMode::Preview).with_link("/about", "about.html");
        assert_eq!(context.resolve_link("/about"), "about.html");
        assert_eq!(context.resolve_link("https://x.test"), "https://x.test");
        assert_eq!(context.style_framework_url, "https://cdn.tailwindcss.com");
    }

    #[test]
    fn test_result_deduplicates_assets() {
        let image = Asset::new(AssetType::Image, "a.png", false);
        let result = RenderResult::new(String::new())
            .with_asset(image.clone())
            .with_asset(image);
        assert_eq!(result.assets.len(), 1);
        assert!(!result.has_interactive_content);
    }
}

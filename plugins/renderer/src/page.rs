//! Standalone page documents and static site output

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use webcraft_core::{write_atomic, BuilderState, Page, Result, WebcraftError};

use crate::components::render_components;
use crate::{Asset, AssetType, RenderContext, RenderMode, RenderResult};

/// File name a page is written to: `/` becomes `index.html`
pub fn page_file_name(slug: &str) -> String {
    let trimmed = slug.trim_matches('/');
    if trimmed.is_empty() {
        return "index.html".to_string();
    }
    let stem: String = trimmed
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '-' })
        .collect();
    format!("{}.html", stem)
}

fn page_body(page: &Page, context: &RenderContext) -> RenderResult {
    let mut preview = context.clone();
    preview.mode = RenderMode::Preview;

    let mut body = RenderResult::new(
        "<div class=\"max-w-7xl mx-auto pt-16\"><div class=\"max-w-4xl mx-auto p-8\">".to_string(),
    );
    body.absorb(render_components(&page.components, &preview));
    body.html.push_str("</div></div>");
    body
}

/// A complete document for one page with the final look
pub fn render_page_document(page: &Page, context: &RenderContext) -> RenderResult {
    let body = page_body(page, context);

    let mut head = String::from(
        "<meta charset=\"UTF-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    head.push_str(&format!("<title>{}</title>\n", text(&page.title)));
    let framework = context.style_framework_url.trim();
    if !framework.is_empty() {
        head.push_str(&format!("<script src=\"{}\"></script>\n", attr(framework)));
    }

    let mut document = RenderResult::new(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n{}</head>\n<body class=\"bg-white\">\n",
        head
    ));
    if !framework.is_empty() {
        document = document.with_asset(Asset::new(AssetType::JavaScript, framework, true));
    }
    document.absorb(body);
    document.html.push_str("\n</body>\n</html>\n");
    document
}

/// The in-builder preview of the current page, with its banner
pub fn render_preview(state: &BuilderState, context: &RenderContext) -> RenderResult {
    let title = state.current_page().map(|page| page.title.as_str()).unwrap_or("");
    let mut preview = context.clone();
    preview.mode = RenderMode::Preview;

    let mut result = RenderResult::new(format!(
        "<div class=\"max-w-7xl mx-auto pt-16\">\
         <div class=\"bg-white shadow-sm mb-8 px-4 py-2 text-sm text-gray-500\">Currently previewing: {}</div>\
         <div class=\"max-w-4xl mx-auto p-8\">",
        text(title)
    ));
    result.absorb(render_components(state.components(), &preview));
    result.html.push_str("</div></div>");
    result
}

/// One page of a rendered site
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub page_id: String,
    pub file_name: String,
    pub result: RenderResult,
}

/// Renders every page of a builder site into linked static files
#[derive(Debug, Clone, Default)]
pub struct SiteRenderer {
    context: RenderContext,
}

impl SiteRenderer {
    pub fn new(context: RenderContext) -> Self {
        Self { context }
    }

    pub fn render_site(&self, state: &BuilderState) -> Result<Vec<RenderedPage>> {
        let mut context = self.context.clone();
        let mut owners: HashMap<String, &str> = HashMap::new();
        for page in state.pages() {
            let file_name = page_file_name(&page.slug);
            if let Some(other) = owners.insert(file_name.clone(), &page.title) {
                return Err(WebcraftError::validation(format!(
                    "Pages \"{}\" and \"{}\" would both be written to {}",
                    other, page.title, file_name
                )));
            }
            context.links.insert(page.slug.clone(), file_name);
        }

        let pages = state
            .pages()
            .iter()
            .map(|page| {
                debug!("Rendering page {} ({} components)", page.slug, page.components.len());
                RenderedPage {
                    page_id: page.id.clone(),
                    file_name: page_file_name(&page.slug),
                    result: render_page_document(page, &context),
                }
            })
            .collect();
        Ok(pages)
    }

    /// Render the site and write each page into `dir`
    pub async fn write_site(&self, state: &BuilderState, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for page in self.render_site(state)? {
            let path = dir.join(&page.file_name);
            write_atomic(&path, page.result.html.as_bytes()).await?;
            written.push(path);
        }
        info!("Wrote {} pages to {}", written.len(), dir.display());
        Ok(written)
    }
}

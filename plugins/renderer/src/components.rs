//! Per-kind projection of builder components

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use webcraft_core::{ButtonVariant, Component, ComponentKind, InlineStyle, LinkTarget};

use crate::canvas;
use crate::{Asset, AssetType, RenderContext, RenderMode, RenderResult};

const DEFAULT_FONT_SIZE: u32 = 16;
const DEFAULT_COLUMNS: u32 = 2;
const DEFAULT_SPACING: f32 = 4.0;

const YOUTUBE_ID: &str = r"(?:youtu\.be/|v=|embed/)([^?&]+)";
const YOUTUBE_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

static YOUTUBE_ID_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(YOUTUBE_ID).ok());

/// Normalize a watch, short or embed URL into an embed URL.
///
/// The query string of the input is carried over unchanged.
pub fn youtube_embed_url(url: &str) -> Option<String> {
    let video_id = YOUTUBE_ID_RE.as_ref()?.captures(url)?.get(1)?.as_str();
    let params = url.split('?').nth(1).unwrap_or("");
    if params.is_empty() {
        Some(format!("https://www.youtube.com/embed/{}", video_id))
    } else {
        Some(format!("https://www.youtube.com/embed/{}?{}", video_id, params))
    }
}

pub fn button_classes(variant: ButtonVariant) -> String {
    let variant_classes = match variant {
        ButtonVariant::Primary => "bg-blue-500 text-white hover:bg-blue-600",
        ButtonVariant::Secondary => "bg-gray-500 text-white hover:bg-gray-600",
        ButtonVariant::Outline => "border-2 border-blue-500 text-blue-500 hover:bg-blue-50",
        ButtonVariant::Ghost => "text-blue-500 hover:bg-blue-50",
    };
    format!("px-4 py-2 rounded transition-colors {}", variant_classes)
}

fn social_network(url: &str) -> Option<&'static str> {
    const NETWORKS: [(&str, &str); 7] = [
        ("facebook", "Facebook"),
        ("twitter", "Twitter"),
        ("instagram", "Instagram"),
        ("linkedin", "LinkedIn"),
        ("youtube", "YouTube"),
        ("github", "GitHub"),
        ("gitlab", "GitLab"),
    ];
    NETWORKS
        .iter()
        .find(|(needle, _)| url.contains(needle))
        .map(|(_, label)| *label)
}

/// Base style of a component: font size for textual kinds, then width
fn base_style(component: &Component) -> InlineStyle {
    let style = if component.kind.is_textual() {
        let size = component
            .props
            .font_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_FONT_SIZE);
        InlineStyle::new().with("font-size", format!("{}px", size))
    } else {
        InlineStyle::new()
    };
    style.with_opt("width", component.props.width.as_deref())
}

fn spacing(component: &Component) -> f32 {
    component
        .props
        .spacing
        .filter(|spacing| *spacing > 0.0)
        .unwrap_or(DEFAULT_SPACING)
}

fn link_target(target: Option<LinkTarget>) -> &'static str {
    match target {
        Some(LinkTarget::Blank) => " target=\"_blank\" rel=\"noopener noreferrer\"",
        Some(LinkTarget::SelfFrame) => " target=\"_self\"",
        None => "",
    }
}

fn nav_links(component: &Component, context: &RenderContext, class: &str) -> String {
    component
        .props
        .items
        .iter()
        .flatten()
        .map(|item| {
            format!(
                "<a href=\"{}\" class=\"{}\">{}</a>",
                attr(context.resolve_link(&item.href)),
                class,
                text(&item.label)
            )
        })
        .collect()
}

/// Nested components always render with the final look
fn nested(children: &[Component], context: &RenderContext) -> RenderResult {
    let mut preview = context.clone();
    preview.mode = RenderMode::Preview;
    render_components(children, &preview)
}

/// Final-look markup for one component
fn project(component: &Component, context: &RenderContext) -> RenderResult {
    let props = &component.props;
    let content = component.content.as_str();

    match component.kind {
        ComponentKind::Navbar => RenderResult::new(format!(
            "<nav class=\"bg-white shadow-sm mb-4 fixed top-0 left-0 right-0 z-40\">\
             <div class=\"max-w-7xl mx-auto px-4 sm:px-6 lg:px-8\"><div class=\"flex justify-between h-16\">\
             <div class=\"flex items-center\"><span class=\"text-lg font-semibold\">{}</span></div>\
             <div class=\"flex items-center space-x-4\">{}</div></div></div></nav>",
            text(content),
            nav_links(
                component,
                context,
                "px-3 py-2 rounded-md text-sm font-medium text-gray-700 hover:text-gray-900 hover:bg-gray-50"
            )
        )),
        ComponentKind::Dropdown => RenderResult::new(format!(
            "<div class=\"relative inline-block text-left mb-4\">\
             <button type=\"button\" class=\"inline-flex justify-center w-full rounded-md border border-gray-300 shadow-sm px-4 py-2 bg-white text-sm font-medium text-gray-700 hover:bg-gray-50 focus:outline-none\" \
             onclick=\"this.nextElementSibling.classList.toggle('hidden')\">{}<span class=\"-mr-1 ml-2\">&#9662;</span></button>\
             <div class=\"hidden origin-top-right absolute right-0 mt-2 w-56 rounded-md shadow-lg bg-white ring-1 ring-black ring-opacity-5 z-50\">\
             <div class=\"py-1\">{}</div></div></div>",
            text(content),
            nav_links(
                component,
                context,
                "block w-full text-left px-4 py-2 text-sm text-gray-700 hover:bg-gray-100"
            )
        ))
        .with_interactive_content(),
        ComponentKind::Button => {
            let alignment = props.alignment.map(|a| a.as_str()).unwrap_or("left");
            let wrapper = InlineStyle::new().with_opt("width", props.width.as_deref());
            let font = InlineStyle::new().with(
                "font-size",
                format!("{}px", props.font_size.filter(|s| *s > 0).unwrap_or(DEFAULT_FONT_SIZE)),
            );
            RenderResult::new(format!(
                "<div class=\"mb-4 text-{}\"{}><a href=\"{}\" role=\"button\" class=\"{}\"{}{}>{}</a></div>",
                alignment,
                wrapper.to_attribute(),
                attr(context.resolve_link(props.href.as_deref().unwrap_or("/"))),
                button_classes(props.variant.unwrap_or_default()),
                link_target(props.target),
                font.to_attribute(),
                text(content)
            ))
        }
        ComponentKind::Link => RenderResult::new(format!(
            "<a href=\"{}\" class=\"text-blue-500 hover:text-blue-600 hover:underline mb-4\"{}{}>{}</a>",
            attr(context.resolve_link(props.href.as_deref().unwrap_or("/"))),
            link_target(props.target),
            base_style(component).to_attribute(),
            text(content)
        )),
        ComponentKind::Container => {
            let style = InlineStyle::new()
                .with(
                    "background-color",
                    props.background_color.as_deref().unwrap_or("transparent"),
                )
                .with("padding", props.padding.as_deref().unwrap_or("1rem"))
                .with_opt("width", props.width.as_deref())
                .with_opt("min-height", props.height.as_deref());
            let children = nested(&props.children, context);
            let mut result = RenderResult::new(format!(
                "<div class=\"rounded-lg mb-4\"{}>{}",
                style.to_attribute(),
                text(content)
            ));
            result.absorb(children);
            result.html.push_str("</div>");
            result
        }
        ComponentKind::Heading => RenderResult::new(format!(
            "<h1 class=\"text-2xl font-bold mb-4\"{}>{}</h1>",
            base_style(component).to_attribute(),
            text(content)
        )),
        ComponentKind::Paragraph => RenderResult::new(format!(
            "<p class=\"mb-4 leading-relaxed\"{}>{}</p>",
            base_style(component).to_attribute(),
            text(content)
        )),
        ComponentKind::Image => {
            if content.trim().is_empty() {
                return RenderResult::new(String::new());
            }
            RenderResult::new(format!(
                "<div class=\"mb-4\"{}><img src=\"{}\" alt=\"Content\" class=\"max-w-full h-auto rounded\"></div>",
                base_style(component).to_attribute(),
                attr(content)
            ))
            .with_asset(Asset::new(AssetType::Image, content, false))
        }
        ComponentKind::Youtube => {
            let Some(embed) = youtube_embed_url(content) else {
                debug!("Skipping video {} without a recognizable id", component.id);
                return RenderResult::new(String::new());
            };
            RenderResult::new(format!(
                "<div class=\"mb-4\"{}><div class=\"relative w-full\" style=\"padding-bottom: 56.25%\">\
                 <iframe src=\"{}\" class=\"absolute top-0 left-0 w-full h-full rounded\" allow=\"{}\" allowfullscreen title=\"YouTube video\"></iframe>\
                 </div></div>",
                base_style(component).to_attribute(),
                attr(&embed),
                YOUTUBE_ALLOW
            ))
            .with_asset(Asset::new(AssetType::Video, embed, false))
        }
        ComponentKind::Grid => {
            let columns = props.columns.filter(|c| *c > 0).unwrap_or(DEFAULT_COLUMNS);
            let style = InlineStyle::new()
                .with("display", "grid")
                .with("grid-template-columns", format!("repeat({}, 1fr)", columns))
                .with("gap", format!("{}rem", spacing(component)))
                .with_opt("width", props.width.as_deref());
            let mut result =
                RenderResult::new(format!("<div class=\"mb-4\"{}>", style.to_attribute()));
            if props.children.is_empty() {
                for index in 1..=columns {
                    result.html.push_str(&format!(
                        "<div class=\"bg-gray-100 p-4 rounded\">Grid Column {}</div>",
                        index
                    ));
                }
            } else {
                for child in &props.children {
                    result.html.push_str("<div class=\"bg-gray-100 p-4 rounded\">");
                    result.absorb(nested(std::slice::from_ref(child), context));
                    result.html.push_str("</div>");
                }
            }
            result.html.push_str("</div>");
            result
        }
        // footer content is trusted markup from the site author
        ComponentKind::Footer => RenderResult::new(format!(
            "<footer class=\"bg-gray-800 text-white py-8 px-4 mt-8\"><div class=\"max-w-4xl mx-auto\">\
             <div class=\"prose prose-invert\"{}>{}</div></div></footer>",
            base_style(component).to_attribute(),
            content
        )),
        ComponentKind::Spacer => {
            let style = InlineStyle::new()
                .with("height", format!("{}rem", spacing(component)))
                .with_opt("width", props.width.as_deref());
            RenderResult::new(format!("<div{}></div>", style.to_attribute()))
        }
        ComponentKind::Divider => RenderResult::new(format!(
            "<hr class=\"my-4 border-gray-200\"{}>",
            base_style(component).to_attribute()
        )),
        ComponentKind::Social => {
            let links: String = content
                .split('\n')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(|url| {
                    let full = if url.starts_with("http") {
                        url.to_string()
                    } else {
                        format!("https://{}", url)
                    };
                    format!(
                        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" \
                         class=\"text-gray-600 hover:text-gray-900 transition-colors\">{}</a>",
                        attr(&full),
                        text(social_network(url).unwrap_or(url))
                    )
                })
                .collect();
            RenderResult::new(format!(
                "<div class=\"flex gap-4 mb-4\"{}>{}</div>",
                base_style(component).to_attribute(),
                links
            ))
        }
    }
}

/// Render one component in the context's mode
pub fn render_component(component: &Component, context: &RenderContext) -> RenderResult {
    let projected = project(component, context);
    match context.mode {
        RenderMode::Preview => projected,
        RenderMode::Canvas => canvas::frame(component, projected),
    }
}

/// Render a component sequence in order
pub fn render_components(components: &[Component], context: &RenderContext) -> RenderResult {
    let mut result = RenderResult::new(String::new());
    for component in components {
        result.absorb(render_component(component, context));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcraft_core::{Alignment, ComponentProps, NavItem};

    fn preview(component: &Component) -> String {
        render_component(component, &RenderContext::default()).html
    }

    #[test]
    fn test_youtube_urls_normalize_to_embed() {
        assert_eq!(
            youtube_embed_url("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/embed/abc123").as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        );
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/watch?v=abc123&t=42").as_deref(),
            Some("https://www.youtube.com/embed/abc123?v=abc123&t=42")
        );
        assert_eq!(youtube_embed_url("https://vimeo.com/1234"), None);
        assert_eq!(youtube_embed_url(""), None);
    }

    #[test]
    fn test_youtube_pattern_is_compiled_once_and_reused() {
        assert!(YOUTUBE_ID_RE.is_some());
        let first = YOUTUBE_ID_RE.as_ref().map(|re| re as *const Regex);
        youtube_embed_url("https://youtu.be/a");
        youtube_embed_url("https://youtu.be/b");
        assert_eq!(YOUTUBE_ID_RE.as_ref().map(|re| re as *const Regex), first);
    }

    #[test]
    fn test_button_variants_share_base_classes() {
        assert_eq!(
            button_classes(ButtonVariant::Primary),
            "px-4 py-2 rounded transition-colors bg-blue-500 text-white hover:bg-blue-600"
        );
        assert!(button_classes(ButtonVariant::Outline).contains("border-2 border-blue-500"));
        assert!(button_classes(ButtonVariant::Ghost).ends_with("text-blue-500 hover:bg-blue-50"));
    }

    #[test]
    fn test_textual_kinds_carry_font_size() {
        let heading = Component::new(ComponentKind::Heading).with_content("Hi & bye");
        assert_eq!(
            preview(&heading),
            "<h1 class=\"text-2xl font-bold mb-4\" style=\"font-size: 16px\">Hi &amp; bye</h1>"
        );

        let mut props = ComponentProps::default();
        props.font_size = Some(24);
        props.width = Some("50%".to_string());
        let paragraph = Component::new(ComponentKind::Paragraph)
            .with_content("Body")
            .with_props(props);
        assert!(preview(&paragraph).contains("style=\"font-size: 24px; width: 50%\""));

        let divider = Component::new(ComponentKind::Divider);
        assert_eq!(preview(&divider), "<hr class=\"my-4 border-gray-200\">");
    }

    #[test]
    fn test_grid_and_spacer_defaults() {
        let grid = preview(&Component::new(ComponentKind::Grid));
        assert!(grid.contains("grid-template-columns: repeat(2, 1fr); gap: 4rem"));
        assert_eq!(grid.matches("Grid Column").count(), 2);

        let mut props = ComponentProps::default();
        props.spacing = Some(1.5);
        let spacer = Component::new(ComponentKind::Spacer).with_props(props);
        assert_eq!(preview(&spacer), "<div style=\"height: 1.5rem\"></div>");
    }

    #[test]
    fn test_grid_places_children_in_cells() {
        let mut props = ComponentProps::default();
        props.columns = Some(3);
        props.children = vec![Component::new(ComponentKind::Paragraph).with_content("Cell")];
        let html = preview(&Component::new(ComponentKind::Grid).with_props(props));
        assert!(html.contains("repeat(3, 1fr)"));
        assert!(html.contains("Cell</p></div>"));
        assert!(!html.contains("Grid Column"));
    }

    #[test]
    fn test_empty_media_renders_nothing() {
        assert_eq!(preview(&Component::new(ComponentKind::Image)), "");
        let video = Component::new(ComponentKind::Youtube).with_content("not a video");
        assert_eq!(preview(&video), "");

        let image = Component::new(ComponentKind::Image).with_content("cat.png");
        let result = render_component(&image, &RenderContext::default());
        assert!(result.html.contains("<img src=\"cat.png\" alt=\"Content\""));
        assert_eq!(result.assets, vec![Asset::new(AssetType::Image, "cat.png", false)]);
    }

    #[test]
    fn test_social_links_are_labelled_by_network() {
        let social = Component::new(ComponentKind::Social)
            .with_content("github.com/jane\nhttps://twitter.com/jane\n\nexample.org");
        let html = preview(&social);
        assert!(html.contains("href=\"https://github.com/jane\""));
        assert!(html.contains(">GitHub</a>"));
        assert!(html.contains(">Twitter</a>"));
        assert!(html.contains(">example.org</a>"));
        assert_eq!(html.matches("<a ").count(), 3);
    }

    #[test]
    fn test_navigation_resolves_site_links() {
        let mut props = ComponentProps::default();
        props.items = Some(vec![
            NavItem { label: "Home".into(), href: "/".into() },
            NavItem { label: "Docs".into(), href: "https://docs.test".into() },
        ]);
        let navbar = Component::new(ComponentKind::Navbar)
            .with_content("Acme")
            .with_props(props.clone());
        let context = RenderContext::default().with_link("/", "index.html");
        let html = render_component(&navbar, &context).html;
        assert!(html.contains("<a href=\"index.html\""));
        assert!(html.contains("<a href=\"https://docs.test\""));

        let dropdown = Component::new(ComponentKind::Dropdown).with_props(props);
        assert!(render_component(&dropdown, &context).has_interactive_content);
    }

    #[test]
    fn test_button_alignment_target_and_footer_markup() {
        let mut props = ComponentProps::default();
        props.alignment = Some(Alignment::Center);
        props.href = Some("https://shop.test".into());
        props.target = Some(LinkTarget::Blank);
        props.variant = Some(ButtonVariant::Secondary);
        let button = Component::new(ComponentKind::Button)
            .with_content("Buy")
            .with_props(props);
        let html = preview(&button);
        assert!(html.starts_with("<div class=\"mb-4 text-center\">"));
        assert!(html.contains("bg-gray-500"));
        assert!(html.contains("target=\"_blank\""));

        let footer = Component::new(ComponentKind::Footer).with_content("<p>&copy; Acme</p>");
        assert!(preview(&footer).contains("<p>&copy; Acme</p>"));
    }
}

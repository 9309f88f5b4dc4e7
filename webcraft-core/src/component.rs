//! Component model for the structured builder path

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::WebcraftError;

/// The fixed set of placeable block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Heading,
    Paragraph,
    Image,
    Button,
    Link,
    Container,
    Navbar,
    Dropdown,
    Youtube,
    Grid,
    Footer,
    Spacer,
    Divider,
    Social,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 14] = [
        ComponentKind::Heading,
        ComponentKind::Paragraph,
        ComponentKind::Image,
        ComponentKind::Button,
        ComponentKind::Link,
        ComponentKind::Container,
        ComponentKind::Navbar,
        ComponentKind::Dropdown,
        ComponentKind::Youtube,
        ComponentKind::Grid,
        ComponentKind::Footer,
        ComponentKind::Spacer,
        ComponentKind::Divider,
        ComponentKind::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Heading => "heading",
            ComponentKind::Paragraph => "paragraph",
            ComponentKind::Image => "image",
            ComponentKind::Button => "button",
            ComponentKind::Link => "link",
            ComponentKind::Container => "container",
            ComponentKind::Navbar => "navbar",
            ComponentKind::Dropdown => "dropdown",
            ComponentKind::Youtube => "youtube",
            ComponentKind::Grid => "grid",
            ComponentKind::Footer => "footer",
            ComponentKind::Spacer => "spacer",
            ComponentKind::Divider => "divider",
            ComponentKind::Social => "social",
        }
    }

    /// Kinds whose text honours the `font_size` prop
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            ComponentKind::Heading
                | ComponentKind::Paragraph
                | ComponentKind::Button
                | ComponentKind::Link
        )
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = WebcraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| WebcraftError::validation(format!("Unknown component type: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTarget {
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_self")]
    SelfFrame,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Outline,
    Ghost,
}

/// A navigation entry for navbars and dropdowns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub href: String,
}

/// Type-dependent attribute bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<LinkTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<ButtonVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<NavItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One placeable content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub props: ComponentProps,
}

impl Component {
    /// Create a component with a fresh id and the palette's drop defaults
    pub fn new(kind: ComponentKind) -> Self {
        let mut props = ComponentProps::default();
        match kind {
            ComponentKind::Navbar | ComponentKind::Dropdown => props.items = Some(Vec::new()),
            ComponentKind::Heading | ComponentKind::Paragraph | ComponentKind::Button => {
                props.font_size = Some(16);
                props.color = Some("#000000".to_string());
            }
            _ => {}
        }

        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            content: String::new(),
            props,
        }
    }

    pub fn with_content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_props(mut self, props: ComponentProps) -> Self {
        self.props = props;
        self
    }

    /// Apply a partial update
    pub fn apply(&mut self, update: ComponentUpdate) {
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(props) = update.props {
            self.props = props;
        }
    }
}

/// Partial update for [`Component::apply`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentUpdate {
    pub content: Option<String>,
    pub props: Option<ComponentProps>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_defaults() {
        let heading = Component::new(ComponentKind::Heading);
        assert_eq!(heading.props.font_size, Some(16));
        assert_eq!(heading.props.color.as_deref(), Some("#000000"));

        let navbar = Component::new(ComponentKind::Navbar);
        assert_eq!(navbar.props.items, Some(Vec::new()));

        let image = Component::new(ComponentKind::Image);
        assert_eq!(image.props, ComponentProps::default());
        assert_ne!(image.id, Component::new(ComponentKind::Image).id);
    }

    #[test]
    fn test_json_shape_uses_type_and_camel_case() {
        let json = r##"{
            "id": "c1",
            "type": "container",
            "content": "Hi",
            "props": { "backgroundColor": "#fff", "fontSize": 20, "target": "_blank" }
        }"##;
        let component: Component = serde_json::from_str(json).unwrap();
        assert_eq!(component.kind, ComponentKind::Container);
        assert_eq!(component.props.background_color.as_deref(), Some("#fff"));
        assert_eq!(component.props.font_size, Some(20));
        assert_eq!(component.props.target, Some(LinkTarget::Blank));

        let back = serde_json::to_value(&component).unwrap();
        assert_eq!(back["type"], "container");
        assert!(back["props"].get("columns").is_none());
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("youtube".parse::<ComponentKind>().unwrap(), ComponentKind::Youtube);
        assert!("carousel".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut component = Component::new(ComponentKind::Paragraph).with_content("old");
        component.apply(ComponentUpdate {
            content: Some("new".to_string()),
            props: None,
        });
        assert_eq!(component.content, "new");
        assert_eq!(component.props.font_size, Some(16));
    }
}

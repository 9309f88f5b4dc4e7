//! Builder store: pages and the working component list of the current page

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::component::{Component, ComponentUpdate};
use crate::error::{Result, WebcraftError};

/// One page of the structured site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Page {
    pub fn new<I: Into<String>, T: Into<String>, S: Into<String>>(id: I, title: T, slug: S) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            slug: slug.into(),
            components: Vec::new(),
        }
    }
}

/// Partial update for a page's metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
}

/// Derive a slug from a page title: `/` plus lowercase words joined by `-`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len() + 1);
    let mut pending_dash = false;
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    format!("/{}", slug)
}

/// Builder state with command methods
///
/// `components` mirrors the current page's stored list after every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderState {
    pages: Vec<Page>,
    current_page_id: Option<String>,
    #[serde(skip)]
    components: Vec<Component>,
    #[serde(skip)]
    is_preview_mode: bool,
}

impl Default for BuilderState {
    fn default() -> Self {
        Self {
            pages: vec![Page::new("home", "Home", "/")],
            current_page_id: Some("home".to_string()),
            components: Vec::new(),
            is_preview_mode: false,
        }
    }
}

impl BuilderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from stored pages; the first page becomes current
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let current_page_id = pages.first().map(|page| page.id.clone());
        let mut state = Self {
            pages,
            current_page_id,
            components: Vec::new(),
            is_preview_mode: false,
        };
        state.sync_working_list();
        state
    }

    /// Load a saved site description
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut state: BuilderState = serde_json::from_str(json)?;
        let current_known = state
            .current_page_id
            .as_ref()
            .map(|id| state.pages.iter().any(|page| &page.id == id))
            .unwrap_or(false);
        if !current_known {
            state.current_page_id = state.pages.first().map(|page| page.id.clone());
        }
        state.sync_working_list();
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current_page_id(&self) -> Option<&str> {
        self.current_page_id.as_deref()
    }

    pub fn current_page(&self) -> Option<&Page> {
        let id = self.current_page_id.as_deref()?;
        self.pages.iter().find(|page| page.id == id)
    }

    /// Working component list of the current page
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn is_preview_mode(&self) -> bool {
        self.is_preview_mode
    }

    pub fn page_by_slug(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.slug == slug)
    }

    fn sync_working_list(&mut self) {
        self.components = self
            .current_page()
            .map(|page| page.components.clone())
            .unwrap_or_default();
    }

    pub fn add_page(&mut self, page: Page) {
        debug!("Adding page {} ({})", page.id, page.slug);
        self.pages.push(page);
    }

    /// Create a page from a title and make it current
    pub fn create_page(&mut self, title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(WebcraftError::validation("Page title cannot be empty"));
        }
        let id = Uuid::new_v4().to_string();
        self.add_page(Page::new(id.clone(), title, slugify(title)));
        self.set_current_page(&id);
        Ok(id)
    }

    /// Remove a page; removing the current page promotes the first remaining one
    pub fn remove_page(&mut self, id: &str) {
        let before = self.pages.len();
        self.pages.retain(|page| page.id != id);
        if self.pages.len() == before {
            return;
        }
        debug!("Removed page {}", id);

        if self.current_page_id.as_deref() == Some(id) {
            self.current_page_id = self.pages.first().map(|page| page.id.clone());
            self.sync_working_list();
        }
    }

    /// Make a page current; unknown ids leave the state untouched
    pub fn set_current_page(&mut self, id: &str) {
        if !self.pages.iter().any(|page| page.id == id) {
            debug!("Ignoring switch to unknown page {}", id);
            return;
        }
        self.current_page_id = Some(id.to_string());
        self.sync_working_list();
    }

    /// Switch to the page with this slug; returns whether one matched
    pub fn navigate_to_slug(&mut self, slug: &str) -> bool {
        match self.page_by_slug(slug).map(|page| page.id.clone()) {
            Some(id) => {
                self.set_current_page(&id);
                true
            }
            None => false,
        }
    }

    pub fn update_page(&mut self, id: &str, update: PageUpdate) {
        if let Some(page) = self.pages.iter_mut().find(|page| page.id == id) {
            if let Some(title) = update.title {
                page.title = title;
            }
            if let Some(slug) = update.slug {
                page.slug = slug;
            }
        }
    }

    pub fn toggle_preview_mode(&mut self) -> bool {
        self.is_preview_mode = !self.is_preview_mode;
        self.is_preview_mode
    }

    /// Apply `edit` to the current page's stored list, then refresh the working list
    fn edit_components<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut Vec<Component>),
    {
        let Some(current) = self.current_page_id.clone() else {
            return;
        };
        let Some(page) = self.pages.iter_mut().find(|page| page.id == current) else {
            return;
        };
        edit(&mut page.components);
        self.components = page.components.clone();
    }

    pub fn add_component(&mut self, component: Component) {
        debug!("Adding {} component {}", component.kind, component.id);
        self.edit_components(|components| components.push(component));
    }

    pub fn remove_component(&mut self, id: &str) {
        self.edit_components(|components| components.retain(|component| component.id != id));
    }

    pub fn update_component(&mut self, id: &str, update: ComponentUpdate) {
        self.edit_components(|components| {
            if let Some(component) = components.iter_mut().find(|component| component.id == id) {
                component.apply(update);
            }
        });
    }

    /// Move `moved_id` to the position currently held by `target_id`
    pub fn reorder_components(&mut self, moved_id: &str, target_id: &str) {
        self.edit_components(|components| {
            let from = components.iter().position(|component| component.id == moved_id);
            let to = components.iter().position(|component| component.id == target_id);
            if let (Some(from), Some(to)) = (from, to) {
                let moved = components.remove(from);
                components.insert(to, moved);
            }
        });
    }
}

/// Shared handle to a [`BuilderState`]
#[derive(Clone, Default)]
pub struct BuilderStore {
    state: Arc<RwLock<BuilderState>>,
}

impl BuilderStore {
    pub fn new(state: BuilderState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> BuilderState {
        self.state.read().await.clone()
    }

    /// Run a command against the state under the write lock
    pub async fn apply<F, T>(&self, command: F) -> T
    where
        F: FnOnce(&mut BuilderState) -> T,
    {
        let mut state = self.state.write().await;
        command(&mut state)
    }

    pub async fn add_page(&self, page: Page) {
        self.apply(|state| state.add_page(page)).await
    }

    pub async fn remove_page(&self, id: &str) {
        self.apply(|state| state.remove_page(id)).await
    }

    pub async fn set_current_page(&self, id: &str) {
        self.apply(|state| state.set_current_page(id)).await
    }

    pub async fn add_component(&self, component: Component) {
        self.apply(|state| state.add_component(component)).await
    }

    pub async fn remove_component(&self, id: &str) {
        self.apply(|state| state.remove_component(id)).await
    }

    pub async fn update_component(&self, id: &str, update: ComponentUpdate) {
        self.apply(|state| state.update_component(id, update)).await
    }

    pub async fn reorder_components(&self, moved_id: &str, target_id: &str) {
        self.apply(|state| state.reorder_components(moved_id, target_id))
            .await
    }

    pub async fn components(&self) -> Vec<Component> {
        self.state.read().await.components().to_vec()
    }
}

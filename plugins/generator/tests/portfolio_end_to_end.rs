use async_trait::async_trait;
use std::sync::Arc;
use webcraft_core::{
    EditorConfig, GeneratorConfig, HandoffKey, HandoffStore, Result, WebcraftError,
};
use webcraft_generator::{GenerationClient, GenerationRequest, TextGenerator};
use webcraft_live_editor::{Gesture, GestureOutcome, LiveEditor, SelectionMode};

const REPLY: &str = r##"Here is your website.

HTML_START
<header class="bg-gray-900 text-white">
  <nav class="flex justify-between p-4"><a href="#projects" data-editable="true" id="nav-projects">Projects</a></nav>
  <section class="hero p-16">
    <h1 id="hero-title" data-editable="true" class="text-5xl">Alex Rivera</h1>
    <p id="hero-tagline" data-editable="true">Product designer</p>
    <img id="hero-photo" data-editable="image" src="https://placehold.co/400x400" alt="Alex">
    <button id="contact-btn" data-editable="true" onclick="openContact()">Contact</button>
  </section>
</header>
HTML_END

CSS_START
.hero { min-height: 60vh; }
CSS_END

JS_START
function openContact() { document.getElementById('contact').scrollIntoView(); }
JS_END
"##;

struct PortfolioBackend;

#[async_trait]
impl TextGenerator for PortfolioBackend {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String> {
        if !request.prompt.contains("portfolio") {
            return Err(WebcraftError::generation("unexpected prompt"));
        }
        Ok(REPLY.to_string())
    }
}

#[tokio::test]
async fn test_portfolio_prompt_is_generated_edited_and_captured() {
    let client = GenerationClient::new(Arc::new(PortfolioBackend), GeneratorConfig::default());
    let handoff = HandoffStore::in_memory();

    let (site, _) = client
        .generate_into(
            "Create a modern portfolio site for a product designer",
            &handoff,
            "https://cdn.tailwindcss.com",
        )
        .await
        .unwrap();
    assert!(!site.html.is_empty());
    assert_eq!(site.css, ".hero { min-height: 60vh; }");

    let mut editor = LiveEditor::new(EditorConfig::default());
    editor
        .load(&handoff.editor_document().await.unwrap())
        .unwrap();
    assert!(editor.interactivity().has_click_handlers);

    let heading = editor.document().unwrap().first_element_by_tag("h1").unwrap();
    let outcome = editor.dispatch(Gesture::Click { target: heading }).unwrap();
    assert!(matches!(
        outcome,
        GestureOutcome::Selected { mode: SelectionMode::EditingText, .. }
    ));
    editor
        .dispatch(Gesture::Input { text: "Jordan Lee".to_string() })
        .unwrap();

    let captured = editor.capture().unwrap();
    assert!(captured.contains(">Jordan Lee</h1>"));
    assert!(!captured.contains("Alex Rivera"));
    assert!(!captured.contains("data-wb-"));
    assert!(!captured.contains("contenteditable"));
    assert!(captured.contains("onclick=\"openContact()\""));
    assert!(captured.contains("function openContact()"));

    editor.save(&handoff).await.unwrap();
    assert_eq!(handoff.get(HandoffKey::EditedContent).await.unwrap(), captured);
    assert!(!editor.has_unsaved_changes().unwrap());
}

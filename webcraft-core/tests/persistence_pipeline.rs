use std::path::PathBuf;

use tempfile::TempDir;
use webcraft_core::{
    BuilderState, Component, ComponentKind, Config, ConfigLoadContext, Document, ExportConfig,
    Exporter, HandoffKey, HandoffStore, ValidationStatus, HANDLER_SHIM, SHIM_ATTRIBUTE,
};

#[tokio::test]
async fn test_generated_site_survives_handoff_file_and_export() {
    let dir = TempDir::new().unwrap();
    let handoff_path = dir.path().join("handoff.json");
    let document = "<!DOCTYPE html><html><head><title>Shop</title></head>\
        <body><button onclick=\"buy()\">Buy</button></body></html>";

    {
        let store = HandoffStore::open(&handoff_path).await.unwrap();
        store
            .store_generated("<button onclick=\"buy()\">Buy</button>", "", "function buy() {}", document)
            .await
            .unwrap();
    }

    let reopened = HandoffStore::open(&handoff_path).await.unwrap();
    assert_eq!(reopened.editor_document().await.unwrap(), document);
    assert_eq!(
        reopened.get(HandoffKey::GeneratedJs).await.as_deref(),
        Some("function buy() {}")
    );

    let exporter = Exporter::new(ExportConfig::default());
    let target = exporter.download_path(dir.path());
    exporter
        .export(&reopened.editor_document().await.unwrap(), &target)
        .await
        .unwrap();

    let written = tokio::fs::read_to_string(&target).await.unwrap();
    let parsed = Document::parse(&written);
    let head = parsed.head().unwrap();
    let shim = parsed
        .elements_by_tag("script")
        .into_iter()
        .find(|script| parsed.has_attribute(*script, SHIM_ATTRIBUTE))
        .unwrap();
    assert_eq!(parsed.parent(shim), Some(head));
    assert!(written.contains(HANDLER_SHIM));
    assert!(written.contains("<button onclick=\"buy()\">Buy</button>"));

    // exporting twice keeps a single shim
    assert_eq!(exporter.prepare(&written), written);
}

#[tokio::test]
async fn test_export_into_missing_directory_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let target: PathBuf = dir.path().join("missing").join("site.html");
    let exporter = Exporter::new(ExportConfig::default());

    let err = exporter.export("<p>x</p>", &target).await.unwrap_err();
    assert!(matches!(err, webcraft_core::WebcraftError::Persistence(_)));
    assert!(!target.exists());
}

#[test]
fn test_builder_site_round_trips_through_json() {
    let mut state = BuilderState::new();
    state.add_component(Component::new(ComponentKind::Heading).with_content("Welcome"));
    let about = state.create_page("About Us").unwrap();
    state.add_component(Component::new(ComponentKind::Paragraph).with_content("Who we are"));

    let restored = BuilderState::from_json(&state.to_json().unwrap()).unwrap();
    assert_eq!(restored.pages().len(), 2);
    assert_eq!(restored.current_page_id(), Some(about.as_str()));
    assert_eq!(restored.components().len(), 1);
    assert_eq!(restored.components()[0].content, "Who we are");
    assert_eq!(restored.page_by_slug("/about-us").map(|page| page.title.as_str()), Some("About Us"));
}

#[test]
fn test_config_file_with_environment_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("webcraft.json");
    let mut config = Config::default();
    config.export.file_name = "portfolio.html".to_string();
    config.save_to_file(&path).unwrap();

    let mut context = ConfigLoadContext::default();
    context.base_path = Some(path.clone());
    context
        .environment_overrides
        .insert("WEBCRAFT_GENERATOR_MODEL".to_string(), "gemini-pro".to_string());

    let (loaded, metadata) = Config::load_with_context(&context).unwrap();
    assert_eq!(loaded.export.file_name, "portfolio.html");
    assert_eq!(loaded.generator.model, "gemini-pro");
    assert_eq!(metadata.source_files, vec![path]);
    assert_eq!(metadata.validation_status, ValidationStatus::Valid);
}

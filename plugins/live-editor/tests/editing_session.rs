use std::sync::Arc;

use webcraft_core::{
    EditorConfig, ExportConfig, Exporter, HandoffKey, HandoffStore, InMemoryObjectStore, NodeId,
    StorageConfig, WebcraftError, HANDLER_SHIM,
};
use webcraft_live_editor::{
    marks, FixedLayout, Gesture, GestureOutcome, ImageFile, ImageSource, ImageTarget,
    ImageUploader, ListenerTarget, LiveEditor, Rect, SelectionMode,
};

fn loaded(source: &str) -> LiveEditor {
    let mut editor = LiveEditor::new(EditorConfig::default());
    editor.load(source).unwrap();
    editor
}

fn first(editor: &LiveEditor, tag: &str) -> NodeId {
    editor.document().unwrap().first_element_by_tag(tag).unwrap()
}

fn uploader(store: &InMemoryObjectStore) -> ImageUploader {
    ImageUploader::new(
        Arc::new(store.clone()),
        &StorageConfig::default(),
        &EditorConfig::default(),
    )
}

#[test]
fn test_converting_an_element_to_an_image() {
    let mut editor = loaded(
        "<body><div class=\"hero\"><h2 data-editable=\"true\">Old</h2></div></body>",
    );
    let h2 = first(&editor, "h2");
    editor.dispatch(Gesture::Click { target: h2 }).unwrap();

    assert_eq!(editor.begin_image_replacement(true).unwrap(), ImageTarget::Convert);
    let image = editor.apply_image_source("https://img.test/new.png").unwrap();

    assert_eq!(editor.selected(), Some(image));
    assert_eq!(editor.selection_mode(), SelectionMode::Selected);
    let html = editor.capture().unwrap();
    assert!(!html.contains("<h2"));
    assert_eq!(
        html,
        "<body><div class=\"hero\"><img src=\"https://img.test/new.png\" style=\"max-width: 100%\"></div></body>"
    );
}

#[tokio::test]
async fn test_invalid_uploads_leave_everything_as_it_was() {
    let store = InMemoryObjectStore::default();
    let uploader = uploader(&store);
    let source = "<body><p>Intro</p><img src=\"old.png\"></body>";
    let mut editor = loaded(source);
    let img = first(&editor, "img");

    let outcome = editor.dispatch(Gesture::Click { target: img }).unwrap();
    assert!(matches!(outcome, GestureOutcome::ImageReplacementRequested { .. }));

    let oversized = ImageFile::new("huge.png", "image/png", vec![0; 5 * 1024 * 1024 + 1]);
    let err = editor
        .replace_image(&uploader, ImageSource::File(oversized))
        .await
        .unwrap_err();
    assert!(matches!(err, WebcraftError::Validation(ref m) if m.contains("5MB")));

    let text = ImageFile::new("notes.txt", "text/plain", b"hello".to_vec());
    let err = editor
        .replace_image(&uploader, ImageSource::File(text))
        .await
        .unwrap_err();
    assert!(matches!(err, WebcraftError::Validation(_)));

    assert_eq!(store.upload_count(), 0);
    assert_eq!(editor.selection_mode(), SelectionMode::AwaitingImageReplacement);

    editor.cancel_modal();
    assert_eq!(editor.selection_mode(), SelectionMode::Idle);
    assert_eq!(editor.capture().unwrap(), source);
}

#[tokio::test]
async fn test_uploaded_file_replaces_image_source() {
    let store = InMemoryObjectStore::new("https://cdn.test");
    let uploader = uploader(&store);
    let mut editor = loaded("<body><img src=\"old.png\" alt=\"Logo\"></body>");
    let img = first(&editor, "img");
    editor.dispatch(Gesture::Click { target: img }).unwrap();

    let file = ImageFile::new("logo.png", "image/png", vec![137, 80, 78, 71]);
    editor
        .replace_image(&uploader, ImageSource::File(file))
        .await
        .unwrap();

    assert_eq!(store.upload_count(), 1);
    let html = editor.capture().unwrap();
    assert!(html.contains("src=\"https://cdn.test/website-images/"));
    assert!(html.contains("-logo.png\" alt=\"Logo\">"));
}

#[test]
fn test_cancelling_the_image_modal_keeps_the_previous_selection() {
    let mut editor = loaded("<body><p>Intro</p><img src=\"a.png\"></body>");
    let p = first(&editor, "p");
    let img = first(&editor, "img");

    editor.dispatch(Gesture::Click { target: p }).unwrap();
    editor.dispatch(Gesture::Click { target: img }).unwrap();
    let before = editor.document().unwrap().serialize();

    let restored = editor.cancel_modal().unwrap();
    assert_eq!(restored.node(), p);
    assert_eq!(editor.selection_mode(), SelectionMode::EditingText);
    assert_eq!(editor.document().unwrap().serialize(), before);
}

#[test]
fn test_overlay_follows_the_pointer() {
    let mut editor = loaded("<body><img src=\"a.png\"></body>");
    let img = first(&editor, "img");
    let frame = editor.document().unwrap().parent(img).unwrap();

    assert_eq!(
        editor.dispatch(Gesture::PointerEnter { target: frame }).unwrap(),
        GestureOutcome::OverlayShown
    );
    assert_eq!(
        editor.dispatch(Gesture::PointerLeave { target: frame }).unwrap(),
        GestureOutcome::OverlayHidden
    );
    assert_eq!(editor.capture().unwrap(), "<body><img src=\"a.png\"></body>");
}

fn drag_handle(editor: &LiveEditor, container: NodeId) -> NodeId {
    let doc = editor.document().unwrap();
    doc.children(container)
        .iter()
        .copied()
        .find(|child| marks::ui_kind(doc, *child) == Some(marks::UiKind::DragHandle))
        .unwrap()
}

#[test]
fn test_repeated_drags_never_leak_listeners() {
    let sizing = loaded("<body><section>A</section></body>");
    let body = sizing.document().unwrap().body().unwrap();
    let section = first(&sizing, "section");
    let layout = FixedLayout::new()
        .with_box(body, Rect::new(0.0, 0.0, 800.0, 600.0))
        .with_box(section, Rect::new(10.0, 10.0, 200.0, 50.0));

    let mut editor = LiveEditor::new(EditorConfig::default()).with_layout(layout);
    editor.load("<body><section>A</section></body>").unwrap();
    let handle = drag_handle(&editor, section);
    let baseline = editor.listeners().len();

    for _ in 0..3 {
        let started = editor
            .dispatch(Gesture::PointerDown { target: handle, x: 15.0, y: 15.0 })
            .unwrap();
        assert!(matches!(started, GestureOutcome::DragStarted { .. }));
        assert_eq!(editor.selection_mode(), SelectionMode::BeingDragged);
        assert_eq!(editor.listeners().count_for(ListenerTarget::Realm), 2);

        let moved = editor
            .dispatch(Gesture::PointerMove { x: 105.0, y: 55.0 })
            .unwrap();
        assert_eq!(moved, GestureOutcome::DragMoved { left: 100.0, top: 50.0 });

        let ended = editor.dispatch(Gesture::PointerUp { x: 105.0, y: 55.0 }).unwrap();
        assert_eq!(ended, GestureOutcome::DragEnded);
        assert_eq!(editor.listeners().count_for(ListenerTarget::Realm), 0);
        assert_eq!(editor.listeners().len(), baseline);
        assert_eq!(editor.selection_mode(), SelectionMode::Selected);
    }

    assert_eq!(
        editor.dispatch(Gesture::PointerMove { x: 1.0, y: 1.0 }).unwrap(),
        GestureOutcome::Unhandled
    );
    assert_eq!(
        editor.capture().unwrap(),
        "<body><section style=\"position: absolute; left: 100px; top: 50px\">A</section></body>"
    );
}

#[test]
fn test_drag_keeps_data_url_backgrounds_intact() {
    let mut editor = loaded(
        "<body><section style=\"background:url(data:image/png;base64,AAAA)\">A</section></body>",
    );
    let section = first(&editor, "section");
    let handle = drag_handle(&editor, section);

    editor
        .dispatch(Gesture::PointerDown { target: handle, x: 0.0, y: 0.0 })
        .unwrap();
    editor.dispatch(Gesture::PointerMove { x: 10.0, y: 5.0 }).unwrap();
    editor.dispatch(Gesture::PointerUp { x: 10.0, y: 5.0 }).unwrap();

    assert_eq!(
        editor.capture().unwrap(),
        "<body><section style=\"background: url(data:image/png;base64,AAAA); position: absolute; left: 10px; top: 5px\">A</section></body>"
    );
}

#[test]
fn test_drag_interrupted_by_deselect_releases_listeners() {
    let mut editor = loaded("<body><section>A</section></body>");
    let section = first(&editor, "section");
    let handle = drag_handle(&editor, section);

    editor
        .dispatch(Gesture::PointerDown { target: handle, x: 0.0, y: 0.0 })
        .unwrap();
    assert!(editor.is_dragging());
    editor.deselect().unwrap();
    assert!(!editor.is_dragging());
    assert_eq!(editor.listeners().count_for(ListenerTarget::Realm), 0);
}

#[tokio::test]
async fn test_heading_edit_reaches_handoff_and_export() {
    let generated = "<!DOCTYPE html><html><head><title>Site</title></head><body>\
        <header><h1 data-editable=\"true\" class=\"text-4xl\">Welcome</h1></header>\
        <button onclick=\"alert('hi')\">Say hi</button></body></html>";
    let store = HandoffStore::in_memory();
    store
        .set(HandoffKey::EditedContent, generated.to_string())
        .await
        .unwrap();

    let mut editor = LiveEditor::new(EditorConfig::default());
    editor.load(&store.editor_document().await.unwrap()).unwrap();
    let h1 = first(&editor, "h1");

    let outcome = editor.dispatch(Gesture::Click { target: h1 }).unwrap();
    assert!(matches!(
        outcome,
        GestureOutcome::Selected { mode: SelectionMode::EditingText, .. }
    ));
    editor
        .dispatch(Gesture::Input { text: "Hello from Rust".to_string() })
        .unwrap();

    let html = editor.capture().unwrap();
    assert!(html.contains("<h1 data-editable=\"true\" class=\"text-4xl\">Hello from Rust</h1>"));
    assert!(!html.contains("data-wb-"));
    assert!(!html.contains("contenteditable"));
    assert!(html.contains("onclick=\"alert('hi')\""));

    editor.save(&store).await.unwrap();
    assert_eq!(store.get(HandoffKey::EditedContent).await.unwrap(), html);

    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::new(ExportConfig::default());
    let path = exporter.download_path(dir.path());
    editor.export(&exporter, &path).await.unwrap();

    let exported = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(path.ends_with("my-website.html"));
    assert!(exported.contains("Hello from Rust"));
    assert!(exported.contains(HANDLER_SHIM));
}

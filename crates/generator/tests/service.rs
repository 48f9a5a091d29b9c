mod common;

use common::{FailingModel, ScriptedModel, StubFetcher, StubSearch};
use deck_core::prompt::SYSTEM_PROMPT;
use deck_core::{Error, ImageRef, Outline, SlideOutline};
use deck_generator::store::PPTX_CONTENT_TYPE;
use deck_generator::{
    request_outline, DeckAssembler, DeckRequest, DeckService, FsBlobStore, TextModel,
};
use deck_pptx::{fixtures, Template};
use tempfile::TempDir;

const MODEL_ANSWER: &str = r#"Sure! Here is your presentation:
[
  {"title": "Cloud Trends"},
  {
    "title": "Serverless",
    "content": [{"text": "**Functions** everywhere", "subpoints": ["Pay per **call**",]},],
    "notes": "Mention cold starts.",
    "image_url": "serverless diagram",
  },
]
Let me know if you need more."#;

fn service(model: Box<dyn TextModel>, dir: &TempDir) -> DeckService {
    DeckService::new(
        Box::new(StubFetcher),
        Box::new(FsBlobStore::open(dir.path()).unwrap()),
        DeckAssembler::new(fixtures::standard_template()),
    )
    .with_model(model)
}

fn stored_files(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[test]
fn test_generate_with_enrichment() {
    let dir = tempfile::tempdir().unwrap();
    let model = ScriptedModel::new(MODEL_ANSWER);
    let prompts = model.prompts.clone();
    let service = service(Box::new(model), &dir)
        .with_search(Box::new(StubSearch(vec!["https://ok/found.png".into()])));

    let request = DeckRequest::new("Cloud Trends 2025", 3).with_image_enrichment(true);
    let generated = service.generate(&request).unwrap();

    assert_eq!(generated.file_name, "Cloud_Trends_2025.pptx");
    assert_eq!(generated.slide_count, 2);
    assert_eq!(generated.outline.title, "Cloud Trends");
    assert_eq!(
        generated.outline.slides[0].image,
        Some(ImageRef::Url("https://ok/found.png".into()))
    );

    let prompts = prompts.borrow();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].0, SYSTEM_PROMPT);
    assert!(prompts[0].1.starts_with("Topic: Cloud Trends 2025"));
    assert!(prompts[0].1.contains("up to 3 slides"));

    let stored = service.download(&generated.id).unwrap();
    assert_eq!(stored.name, "Cloud_Trends_2025.pptx");
    assert_eq!(stored.content_type, PPTX_CONTENT_TYPE);
    assert_eq!(
        stored.content_disposition(),
        "attachment; filename=Cloud_Trends_2025.pptx"
    );

    let deck = Template::from_bytes(&stored.bytes).unwrap();
    assert_eq!(deck.slide_count(), 2);
    assert!(deck.part("ppt/media/image1.png").is_some());
    let text = deck.slide_document(1).unwrap().text();
    assert!(text.contains("Functions everywhere"));
    assert!(text.contains("Pay per call"));
    assert_eq!(
        deck.notes_text(1).unwrap().as_deref(),
        Some("Mention cold starts.")
    );
}

#[test]
fn test_generate_without_enrichment_marks_hint() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Box::new(ScriptedModel::new(MODEL_ANSWER)), &dir)
        .with_search(Box::new(StubSearch(vec!["https://ok/found.png".into()])));

    let generated = service
        .generate(&DeckRequest::new("Cloud Trends", 3))
        .unwrap();
    assert_eq!(
        generated.outline.slides[0].image,
        Some(ImageRef::Query("serverless diagram".into()))
    );

    let deck = Template::from_bytes(&service.download(&generated.id).unwrap().bytes).unwrap();
    let text = deck.slide_document(1).unwrap().text();
    assert!(text.contains("status code: 404 -> serverless diagram"));
}

#[test]
fn test_enrichment_without_search_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Box::new(ScriptedModel::new(MODEL_ANSWER)), &dir);

    let request = DeckRequest::new("Cloud Trends", 3).with_image_enrichment(true);
    let generated = service.generate(&request).unwrap();
    assert!(generated.outline.slides[0].image.as_ref().unwrap().is_query());
}

#[test]
fn test_preview_does_not_store() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Box::new(ScriptedModel::new(MODEL_ANSWER)), &dir);

    let outline = service
        .preview_outline(&DeckRequest::new("Cloud Trends", 3))
        .unwrap();
    assert_eq!(outline.slides.len(), 1);
    assert_eq!(outline.slides[0].content[0].subpoints, vec!["Pay per **call**"]);
    assert_eq!(stored_files(&dir), 0);
}

#[test]
fn test_invalid_request_skips_model() {
    let dir = tempfile::tempdir().unwrap();
    let model = ScriptedModel::new(MODEL_ANSWER);
    let prompts = model.prompts.clone();
    let service = service(Box::new(model), &dir);

    for request in [DeckRequest::new("", 3), DeckRequest::new("AI", 0)] {
        let err = service.generate(&request).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(err.is_client_error());
    }
    assert!(prompts.borrow().is_empty());
}

#[test]
fn test_model_failure_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Box::new(FailingModel), &dir);

    let err = service
        .generate(&DeckRequest::new("AI", 3))
        .unwrap_err();
    assert!(matches!(err, Error::RemoteFetch(_)));
    assert!(!err.is_client_error());
    assert_eq!(stored_files(&dir), 0);
}

#[test]
fn test_unparsable_answer() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Box::new(ScriptedModel::new("I cannot help with that.")), &dir);

    let err = service.generate(&DeckRequest::new("AI", 3)).unwrap_err();
    assert!(matches!(err, Error::OutlineParse(_)));
    assert_eq!(stored_files(&dir), 0);
}

#[test]
fn test_build_supplied_outline() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Box::new(FailingModel), &dir);

    let mut outline = Outline::new("My Own Deck");
    outline.add_slide(SlideOutline::new("Agenda").with_notes("Short intro"));
    let generated = service.build(outline).unwrap();

    assert_eq!(generated.file_name, "My_Own_Deck.pptx");
    assert_eq!(generated.slide_count, 2);
    let stored = service.download(&generated.id).unwrap();
    assert_eq!(stored.name, "My_Own_Deck.pptx");
    // Deck plus metadata sidecar.
    assert_eq!(stored_files(&dir), 2);
}

#[test]
fn test_preview_without_model() {
    let dir = tempfile::tempdir().unwrap();
    let service = DeckService::new(
        Box::new(StubFetcher),
        Box::new(FsBlobStore::open(dir.path()).unwrap()),
        DeckAssembler::new(fixtures::standard_template()),
    );

    let err = service
        .preview_outline(&DeckRequest::new("AI", 3))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    assert!(service.build(Outline::new("Still works")).is_ok());
}

#[test]
fn test_request_outline_directly() {
    let outline = request_outline(&ScriptedModel::new(MODEL_ANSWER), &DeckRequest::new("AI", 2))
        .unwrap();
    assert_eq!(outline.title, "Cloud Trends");
    assert!(matches!(
        request_outline(&FailingModel, &DeckRequest::new("", 2)),
        Err(Error::InvalidRequest(_))
    ));
}

#[test]
fn test_download_unknown_id() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Box::new(FailingModel), &dir);

    let err = service
        .download("00000000-0000-4000-8000-000000000000")
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(err.is_client_error());
}

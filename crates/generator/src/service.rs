//! Request-level deck generation.

use crate::assembler::DeckAssembler;
use crate::fetch::ImageFetcher;
use crate::llm::TextModel;
use crate::search::ImageSearch;
use crate::store::{BlobStore, StoredDeck};
use deck_core::prompt::{outline_prompt, SYSTEM_PROMPT};
use deck_core::{parse_outline, Error, ImageRef, Outline, Result};
use serde::{Deserialize, Serialize};

/// File name used when an outline has no title.
const FALLBACK_TITLE: &str = "Generated Presentation";

/// What the caller asks the model for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckRequest {
    /// Presentation topic, also used for the file name.
    pub title: String,
    /// Upper bound on the number of slides the model should write.
    pub slide_count: usize,
    /// Look up pictures for slides through image search.
    #[serde(default)]
    pub enrich_images: bool,
}

impl DeckRequest {
    pub fn new(title: impl Into<String>, slide_count: usize) -> Self {
        Self {
            title: title.into(),
            slide_count,
            enrich_images: false,
        }
    }

    pub fn with_image_enrichment(mut self, enabled: bool) -> Self {
        self.enrich_images = enabled;
        self
    }

    /// Reject requests the model cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidRequest("title must not be empty".to_string()));
        }
        if self.slide_count == 0 {
            return Err(Error::InvalidRequest(
                "slide count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A generated and stored deck.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDeck {
    pub id: String,
    pub file_name: String,
    pub slide_count: usize,
    pub outline: Outline,
}

/// Generates, stores and serves decks.
pub struct DeckService {
    model: Option<Box<dyn TextModel>>,
    search: Option<Box<dyn ImageSearch>>,
    fetcher: Box<dyn ImageFetcher>,
    store: Box<dyn BlobStore>,
    assembler: DeckAssembler,
}

impl DeckService {
    /// A service that can render, store and serve decks. Outline
    /// generation needs a model from [`DeckService::with_model`].
    pub fn new(
        fetcher: Box<dyn ImageFetcher>,
        store: Box<dyn BlobStore>,
        assembler: DeckAssembler,
    ) -> Self {
        Self {
            model: None,
            search: None,
            fetcher,
            store,
            assembler,
        }
    }

    pub fn with_model(mut self, model: Box<dyn TextModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Enable image enrichment through `search`.
    pub fn with_search(mut self, search: Box<dyn ImageSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Ask the model for an outline without rendering it.
    pub fn preview_outline(&self, request: &DeckRequest) -> Result<Outline> {
        let model = self
            .model
            .as_deref()
            .ok_or_else(|| Error::InvalidRequest("no text model configured".to_string()))?;
        request_outline(model, request)
    }

    /// Generate an outline, render it and store the deck.
    pub fn generate(&self, request: &DeckRequest) -> Result<GeneratedDeck> {
        let mut outline = self.preview_outline(request)?;

        if request.enrich_images {
            match &self.search {
                Some(search) => {
                    let found = enrich_images(search.as_ref(), &mut outline);
                    log::debug!("Image search filled {} slides", found);
                }
                None => log::warn!("Image enrichment requested but no image search is configured"),
            }
        }

        self.store_rendered(outline, file_name_for(&request.title))
    }

    /// Render and store an outline supplied by the caller.
    pub fn build(&self, outline: Outline) -> Result<GeneratedDeck> {
        let file_name = file_name_for(&outline.title);
        self.store_rendered(outline, file_name)
    }

    /// Load a stored deck.
    pub fn download(&self, id: &str) -> Result<StoredDeck> {
        self.store.retrieve(id.trim())
    }

    fn store_rendered(&self, outline: Outline, file_name: String) -> Result<GeneratedDeck> {
        let deck = self.assembler.assemble(&outline, self.fetcher.as_ref())?;
        let id = self.store.store(&deck.bytes, &file_name)?;
        log::info!(
            "Generated {} ({} slides) with id {}",
            file_name,
            deck.slide_count,
            id
        );

        Ok(GeneratedDeck {
            id,
            file_name,
            slide_count: deck.slide_count,
            outline,
        })
    }
}

/// Validate `request`, ask `model` for an outline and repair its answer.
pub fn request_outline(model: &dyn TextModel, request: &DeckRequest) -> Result<Outline> {
    request.validate()?;
    let prompt = outline_prompt(request.title.trim(), request.slide_count);
    let text = model.complete(SYSTEM_PROMPT, &prompt)?;
    log::debug!("Model returned {} characters", text.len());

    let outline = parse_outline(&text)?;
    log::debug!(
        "Outline '{}' has {} slides",
        outline.title,
        outline.slides.len()
    );
    Ok(outline)
}

/// Output file name for a presentation title.
pub fn file_name_for(title: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() { FALLBACK_TITLE } else { title };
    format!("{}.pptx", title.replace(' ', "_"))
}

/// Resolve search hints, and give slides without an image the first search
/// hit for their title. Returns the number of slides that received an image.
///
/// Failed or empty searches are logged and leave the slide unchanged.
pub fn enrich_images(search: &dyn ImageSearch, outline: &mut Outline) -> usize {
    let mut found = 0;

    for slide in &mut outline.slides {
        let query = match &slide.image {
            None => slide.title.trim().to_string(),
            Some(ImageRef::Query(query)) => query.clone(),
            Some(_) => continue,
        };
        if query.is_empty() {
            continue;
        }

        match search.search(&query) {
            Ok(links) => {
                let hit = links
                    .iter()
                    .filter_map(|link| ImageRef::parse(link))
                    .find(|image| !image.is_query());
                match hit {
                    Some(image) => {
                        slide.image = Some(image);
                        found += 1;
                    }
                    None => log::warn!("No image results for '{}'", query),
                }
            }
            Err(e) => log::warn!("Image search for '{}' failed: {}", query, e),
        }
    }

    found
}

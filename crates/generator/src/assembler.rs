//! Turning an outline into finished deck bytes.

use crate::fetch::{FetchResolver, ImageFetcher};
use deck_core::{Outline, Result, SlideExpander};
use deck_pptx::Template;
use std::path::Path;

/// A rendered presentation.
#[derive(Debug, Clone)]
pub struct RenderedDeck {
    pub bytes: Vec<u8>,
    /// Physical slides in the deck, title slide included.
    pub slide_count: usize,
}

/// Renders outlines against one template.
#[derive(Debug, Clone)]
pub struct DeckAssembler {
    template: Vec<u8>,
    expander: SlideExpander,
}

impl DeckAssembler {
    /// Assemble from template bytes with the default expander.
    pub fn new(template: Vec<u8>) -> Self {
        Self {
            template,
            expander: SlideExpander::default(),
        }
    }

    /// Load the template from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading template {}", path.display());
        Ok(Self::new(std::fs::read(path)?))
    }

    pub fn with_expander(mut self, expander: SlideExpander) -> Self {
        self.expander = expander;
        self
    }

    /// Render `outline`, fetching images through `fetcher`.
    ///
    /// Any error aborts the whole deck. Images that cannot be fetched only
    /// leave a marker on their slide.
    pub fn assemble(&self, outline: &Outline, fetcher: &dyn ImageFetcher) -> Result<RenderedDeck> {
        let plan = self.expander.expand(outline);
        let layouts = plan.layouts();
        let slides = plan.render();
        log::debug!(
            "Planned {} slides for {} outline entries ({} with code)",
            plan.physical_len(),
            outline.slides.len(),
            outline.code_slide_count()
        );

        let mut template = Template::from_bytes(&self.template)?;
        template.prepare(&layouts)?;

        let summaries = template.fill_all(&slides, &FetchResolver::new(fetcher))?;
        let pictures: usize = summaries.iter().map(|s| s.pictures).sum();
        let failures: usize = summaries.iter().map(|s| s.image_failures).sum();
        if failures > 0 {
            log::warn!("{} slide images could not be embedded", failures);
        }
        log::debug!("Filled {} slides with {} pictures", summaries.len(), pictures);

        Ok(RenderedDeck {
            bytes: template.into_bytes()?,
            slide_count: plan.physical_len(),
        })
    }
}

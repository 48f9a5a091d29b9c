//! Render model: the content of one physical slide, decided before any
//! document is touched.

use crate::expand::{CodeChunk, PlanEntry, RenderMode};
use crate::markup::{parse_markup, StyledSpan};
use crate::types::{BulletItem, ImageRef};
use serde::Serialize;

/// Prefix of the title shown on code slides.
pub const CODE_TITLE_PREFIX: &str = "Example: ";

/// One paragraph of a slide body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyParagraph {
    /// Indentation level (0 for bullets, 1 for sub-bullets).
    pub level: u8,

    /// Styled runs with markup delimiters already consumed.
    pub spans: Vec<StyledSpan>,
}

impl BodyParagraph {
    /// Parse `text` markup into a paragraph at `level`.
    pub fn from_markup(text: &str, level: u8) -> Self {
        Self {
            level,
            spans: parse_markup(text),
        }
    }

    /// Concatenated paragraph text.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Everything the placeholder filler needs for one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSlide {
    /// Text for `{title}`.
    pub title: String,

    /// Paragraphs for `{content}`. `None` leaves the token untouched.
    pub body: Option<Vec<BodyParagraph>>,

    /// Code for `{code}` and `codetitle`. `None` removes the code shape.
    pub code: Option<CodeChunk>,

    /// Text for the speaker notes.
    pub notes: Option<String>,

    /// Image for `imageurl`.
    pub image: Option<ImageRef>,
}

impl RenderSlide {
    /// The presentation title slide.
    pub fn title_slide(title: &str) -> Self {
        Self {
            title: title.to_string(),
            body: None,
            code: None,
            notes: None,
            image: None,
        }
    }

    /// Render model for one plan entry.
    ///
    /// Content slides carry bullets, notes and image but never code; code
    /// slides carry the chunk and notes under an "Example:" title.
    pub fn from_plan_entry(entry: &PlanEntry<'_>) -> Self {
        let source = entry.source;
        match entry.mode {
            RenderMode::Content => Self {
                title: source.title.clone(),
                body: Some(bullet_paragraphs(&source.content)),
                code: None,
                notes: source.notes.clone(),
                image: source.image.clone(),
            },
            RenderMode::Code => Self {
                title: format!("{}{}", CODE_TITLE_PREFIX, source.title),
                body: Some(Vec::new()),
                code: entry.chunk.clone(),
                notes: source.notes.clone(),
                image: None,
            },
        }
    }
}

/// Flatten bullet items into level-0 and level-1 paragraphs.
///
/// A bullet with empty text contributes only its sub-bullets.
pub fn bullet_paragraphs(items: &[BulletItem]) -> Vec<BodyParagraph> {
    let mut paragraphs = Vec::new();
    for item in items {
        if !item.text.is_empty() {
            paragraphs.push(BodyParagraph::from_markup(&item.text, 0));
        }
        for sub in &item.subpoints {
            paragraphs.push(BodyParagraph::from_markup(sub, 1));
        }
    }
    paragraphs
}

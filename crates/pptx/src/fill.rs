//! Placeholder filling: lowers one [`RenderSlide`] into a parsed slide.
//!
//! Tokens are matched on a run's trimmed text. A text body holding
//! `{content}` is expanded into bullets as a whole and skipped by the
//! per-run pass. Unknown text is left alone.

use crate::picture::{failure_marker, picture_element, EmbeddedImage, ImageOutcome};
use crate::slide::{PlaceholderRef, Rect, Shape, SlideDocument, SpShape};
use crate::text::{ParagraphStyle, Run, RunStyle, TextBody};
use crate::xml::Element;
use deck_core::expand::CodeChunk;
use deck_core::render::{BodyParagraph, RenderSlide};
use deck_core::{ImageRef, Result};

pub const TITLE_TOKEN: &str = "{title}";
pub const CONTENT_TOKEN: &str = "{content}";
pub const CODE_TOKEN: &str = "{code}";
pub const CODE_TITLE_TOKEN: &str = "codetitle";
pub const NOTES_TOKEN: &str = "{notes}";
pub const IMAGE_TOKEN: &str = "imageurl";

const BLACK: &str = "000000";

/// Space after each bullet paragraph, in points.
const BULLET_SPACE_AFTER: u32 = 5;

fn bullet_style() -> RunStyle {
    RunStyle::new().font("Calibri").size_pt(22).color(BLACK)
}

fn code_style() -> RunStyle {
    RunStyle::new().font("Consolas").size_pt(14).color(BLACK)
}

fn code_title_style() -> RunStyle {
    RunStyle::new().font("Calibri").size_pt(24).bold(false)
}

/// What the filler needs from the package around the slide.
pub trait SlideResources {
    /// Resolve an image reference into embeddable bytes.
    fn resolve_image(&mut self, image: &ImageRef) -> ImageOutcome;

    /// Frame of the layout placeholder a shape inherits its position from.
    fn inherited_frame(&self, placeholder: &PlaceholderRef) -> Option<Rect>;

    /// Store the image as a media part related to the slide; returns the
    /// relationship id.
    fn embed_image(&mut self, image: &EmbeddedImage) -> Result<String>;
}

/// What happened while filling one slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillSummary {
    /// Tokens replaced, cleared or expanded.
    pub tokens: usize,

    /// Pictures inserted.
    pub pictures: usize,

    /// Image references that ended as a visible marker.
    pub image_failures: usize,

    /// Speaker notes requested through `{notes}`.
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Title,
    CodeTitle,
    Code,
    Notes,
    Image,
}

impl Token {
    /// Per-run token named by a run's text.
    fn of(text: &str) -> Option<Self> {
        match text.trim() {
            TITLE_TOKEN => Some(Self::Title),
            CODE_TITLE_TOKEN => Some(Self::CodeTitle),
            CODE_TOKEN => Some(Self::Code),
            NOTES_TOKEN => Some(Self::Notes),
            IMAGE_TOKEN => Some(Self::Image),
            _ => None,
        }
    }
}

enum ShapeAction {
    Keep,
    Replace(Element),
    Remove,
}

/// Fill the tokens of `doc` from `slide`.
pub fn fill_slide(
    doc: &mut SlideDocument,
    slide: &RenderSlide,
    resources: &mut dyn SlideResources,
) -> Result<FillSummary> {
    let mut summary = FillSummary::default();
    let mut next_id = doc.max_shape_id();

    let mut shapes = Vec::with_capacity(doc.shapes.len());
    for shape in std::mem::take(&mut doc.shapes) {
        match shape {
            Shape::Sp(mut sp) => {
                match fill_shape(&mut sp, slide, resources, &mut next_id, &mut summary)? {
                    ShapeAction::Keep => shapes.push(Shape::Sp(sp)),
                    ShapeAction::Replace(element) => shapes.push(Shape::Other(element)),
                    ShapeAction::Remove => {}
                }
            }
            other => shapes.push(other),
        }
    }
    doc.shapes = shapes;

    log::debug!(
        "Filled slide \"{}\": {} tokens, {} pictures, {} image failures",
        slide.title,
        summary.tokens,
        summary.pictures,
        summary.image_failures
    );
    Ok(summary)
}

fn fill_shape(
    sp: &mut SpShape,
    slide: &RenderSlide,
    resources: &mut dyn SlideResources,
    next_id: &mut u32,
    summary: &mut FillSummary,
) -> Result<ShapeAction> {
    let own_frame = sp.frame();
    let placeholder = sp.placeholder();

    let Some(text) = sp.text.as_mut() else {
        return Ok(ShapeAction::Keep);
    };

    if let Some(body) = &slide.body {
        if text.has_token(CONTENT_TOKEN) {
            expand_bullets(text, body);
            summary.tokens += 1;
            return Ok(ShapeAction::Keep);
        }
    }

    let mut code_token = false;
    let mut picture = None;

    for run in text.runs_mut() {
        let Some(token) = Token::of(&run.text) else {
            continue;
        };
        summary.tokens += 1;

        match token {
            Token::Title => run.text = slide.title.clone(),
            Token::CodeTitle => match &slide.code {
                Some(code) => {
                    run.text = code.title.clone();
                    run.apply_style(&code_title_style());
                }
                None => run.text.clear(),
            },
            Token::Code => code_token = true,
            Token::Notes => {
                if let Some(notes) = &slide.notes {
                    summary.notes = Some(notes.clone());
                }
                run.text.clear();
            }
            Token::Image => {
                let Some(image) = &slide.image else {
                    run.text.clear();
                    continue;
                };

                let frame = own_frame.or_else(|| {
                    placeholder
                        .as_ref()
                        .and_then(|ph| resources.inherited_frame(ph))
                });

                match (resources.resolve_image(image), frame) {
                    (ImageOutcome::Ready(embedded), Some(frame)) => {
                        let rel_id = resources.embed_image(&embedded)?;
                        *next_id += 1;
                        picture = Some(picture_element(*next_id, &rel_id, frame));
                        run.text.clear();
                        summary.pictures += 1;
                    }
                    (ImageOutcome::Ready(_), None) => {
                        log::warn!("No frame for picture {}", image.as_str());
                        run.text = failure_marker("no placeholder frame", image);
                        summary.image_failures += 1;
                    }
                    (ImageOutcome::Failed(reason), _) => {
                        log::warn!("Could not add image {}: {}", image.as_str(), reason);
                        run.text = failure_marker(&reason, image);
                        summary.image_failures += 1;
                    }
                }
            }
        }
    }

    if code_token {
        match &slide.code {
            Some(chunk) => write_code(text, chunk),
            None => return Ok(ShapeAction::Remove),
        }
    }

    Ok(match picture {
        Some(element) => ShapeAction::Replace(element),
        None => ShapeAction::Keep,
    })
}

/// Replace the body with one paragraph per bullet, reusing the first
/// paragraph's properties for all of them.
fn expand_bullets(text: &mut TextBody, body: &[BodyParagraph]) {
    text.set_shape_autofit();
    let base = text.reset().clone();
    if body.is_empty() {
        return;
    }

    let style = bullet_style();
    text.paragraphs = body
        .iter()
        .map(|source| {
            let mut paragraph = base.clone();
            paragraph.apply_style(&ParagraphStyle {
                level: Some(source.level),
                align: Some("just".to_string()),
                space_after: Some(BULLET_SPACE_AFTER),
            });
            for span in &source.spans {
                paragraph.push_run(Run::from_span(span, &style));
            }
            paragraph
        })
        .collect();
}

/// Replace the body with the chunk as one paragraph of line-broken runs.
fn write_code(text: &mut TextBody, chunk: &CodeChunk) {
    text.set_shape_autofit();
    let style = code_style();
    let paragraph = text.reset();
    paragraph.apply_style(&ParagraphStyle {
        level: Some(0),
        ..Default::default()
    });

    for (idx, line) in chunk.display_text().split('\n').enumerate() {
        if idx > 0 {
            paragraph.push_break();
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !line.is_empty() {
            let mut run = Run::new(line);
            run.apply_style(&style);
            paragraph.push_run(run);
        }
    }
}

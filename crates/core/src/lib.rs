//! Core outline types, model-output repair, slide expansion and the
//! render model for AI-generated presentation decks.

pub mod error;
pub mod expand;
pub mod lenient;
pub mod markup;
pub mod prompt;
pub mod render;
pub mod sanitize;
pub mod types;

pub use error::{Error, Result};
pub use expand::{CodeChunk, PlanEntry, RenderMode, SlideExpander, SlidePlan};
pub use markup::StyledSpan;
pub use render::{BodyParagraph, RenderSlide};
pub use sanitize::parse_outline;
pub use types::{BulletItem, CodeBlock, ImageRef, Outline, SlideOutline};

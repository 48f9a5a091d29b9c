//! PPTX (Office Open XML) template editing for generated decks.
//!
//! A template is a ZIP package of XML parts. Slides are cloned from the
//! template's own slides, parsed into a small shape tree, filled from a
//! render model and written back once.

pub mod content_types;
pub mod fill;
pub mod notes;
pub mod package;
pub mod picture;
pub mod rels;
pub mod slide;
pub mod template;
pub mod text;
pub mod xml;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use fill::{FillSummary, SlideResources};
pub use package::Package;
pub use picture::{EmbeddedImage, ImageFormat, ImageOutcome, ImageResolver};
pub use slide::{PlaceholderRef, Rect, SlideDocument};
pub use template::Template;

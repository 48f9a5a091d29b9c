//! Domain types for representing a generated slide outline.

use crate::{Error, Result};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A complete outline as produced by the model: a presentation title
/// followed by the logical slides.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    /// Presentation-level title (the first array element).
    pub title: String,

    /// Logical slides in presentation order.
    pub slides: Vec<SlideOutline>,
}

impl Outline {
    /// Create a new outline with the given title and no slides.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the outline.
    pub fn add_slide(&mut self, slide: SlideOutline) {
        self.slides.push(slide);
    }

    /// Build an outline from the raw entries of the model's JSON array.
    ///
    /// The first entry supplies the presentation title. When the model put a
    /// body on that entry anyway, it is kept as a regular slide too, so no
    /// content is ever discarded. Any entry that does not match the slide
    /// shape fails the whole outline.
    pub fn from_entries(entries: Vec<Value>) -> Result<Self> {
        let mut iter = entries.into_iter().enumerate();

        let (_, first) = iter
            .next()
            .ok_or_else(|| Error::OutlineParse("outline array is empty".to_string()))?;

        let first: SlideOutline = serde_json::from_value(first)
            .map_err(|e| Error::OutlineParse(format!("entry 0: {}", e)))?;

        let mut outline = Outline::new(first.title.clone());
        if first.has_body() {
            log::debug!("Title entry carries a body, keeping it as a slide");
            outline.add_slide(first);
        }

        for (idx, entry) in iter {
            let slide: SlideOutline = serde_json::from_value(entry)
                .map_err(|e| Error::OutlineParse(format!("entry {}: {}", idx, e)))?;
            outline.add_slide(slide);
        }

        Ok(outline)
    }

    /// Number of logical slides carrying a non-empty code block.
    pub fn code_slide_count(&self) -> usize {
        self.slides.iter().filter(|s| s.code().is_some()).count()
    }
}

impl Serialize for Outline {
    /// Serializes back into the model's array shape:
    /// `[{"title": ...}, slide, slide, ...]`.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct TitleEntry<'a> {
            title: &'a str,
        }

        let mut seq = serializer.serialize_seq(Some(self.slides.len() + 1))?;
        seq.serialize_element(&TitleEntry { title: &self.title })?;
        for slide in &self.slides {
            seq.serialize_element(slide)?;
        }
        seq.end()
    }
}

/// One logical slide of the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideOutline {
    /// Slide heading.
    pub title: String,

    /// Bullet items in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<BulletItem>,

    /// Optional code block shown on dedicated code slides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeBlock>,

    /// Optional speaker notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Optional image: inline data, URL, or a search hint.
    #[serde(
        default,
        rename = "image_url",
        alias = "image",
        deserialize_with = "image_from_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<ImageRef>,
}

impl SlideOutline {
    /// Create a new slide with the given title and no body.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: Vec::new(),
            code: None,
            notes: None,
            image: None,
        }
    }

    /// Add a bullet item.
    pub fn with_bullet(mut self, item: BulletItem) -> Self {
        self.content.push(item);
        self
    }

    /// Attach a code block.
    pub fn with_code(mut self, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        self.code = Some(CodeBlock {
            title: title.into(),
            snippet: snippet.into(),
        });
        self
    }

    /// Attach speaker notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach an image reference.
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    /// The code block, if it has a non-blank snippet.
    pub fn code(&self) -> Option<&CodeBlock> {
        self.code.as_ref().filter(|c| !c.snippet.trim().is_empty())
    }

    /// Whether the entry carries anything beyond its title.
    pub fn has_body(&self) -> bool {
        !self.content.is_empty() || self.code().is_some()
    }
}

/// A bullet with optional sub-bullets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BulletRepr")]
pub struct BulletItem {
    /// Bullet text, possibly with `**bold**` and `*italic*` markup.
    pub text: String,

    /// Sub-bullets rendered one level deeper.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subpoints: Vec<String>,
}

impl BulletItem {
    /// Create a bullet without sub-bullets.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            subpoints: Vec::new(),
        }
    }

    /// Add a sub-bullet.
    pub fn with_subpoint(mut self, text: impl Into<String>) -> Self {
        self.subpoints.push(text.into());
        self
    }
}

/// Accepted wire shapes for a bullet: a plain string or an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum BulletRepr {
    Text(String),
    Item {
        #[serde(default)]
        text: String,
        #[serde(default, deserialize_with = "null_as_default")]
        subpoints: Vec<String>,
    },
}

impl From<BulletRepr> for BulletItem {
    fn from(repr: BulletRepr) -> Self {
        match repr {
            BulletRepr::Text(text) => BulletItem::new(text),
            BulletRepr::Item { text, subpoints } => BulletItem { text, subpoints },
        }
    }
}

/// A titled code snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CodeRepr")]
pub struct CodeBlock {
    /// Caption shown above the code.
    pub title: String,

    /// Source text, lines separated by `\n`.
    pub snippet: String,
}

/// Accepted wire shapes for code: a bare snippet string or an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum CodeRepr {
    Snippet(String),
    Block {
        #[serde(default)]
        title: String,
        #[serde(default)]
        snippet: String,
    },
}

impl From<CodeRepr> for CodeBlock {
    fn from(repr: CodeRepr) -> Self {
        match repr {
            CodeRepr::Snippet(snippet) => CodeBlock {
                title: String::new(),
                snippet,
            },
            CodeRepr::Block { title, snippet } => CodeBlock { title, snippet },
        }
    }
}

/// Where a slide image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Inline `data:image/...;base64,...` reference.
    Inline(String),
    /// Remote `http(s)` URL.
    Url(String),
    /// Free-text hint to be resolved through image search.
    Query(String),
}

impl ImageRef {
    /// Classify a raw reference. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("data:image") {
            Some(Self::Inline(raw.to_string()))
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(Self::Url(raw.to_string()))
        } else {
            Some(Self::Query(raw.to_string()))
        }
    }

    /// The reference as written.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(s) | Self::Url(s) | Self::Query(s) => s,
        }
    }

    /// Whether the reference still needs an image search.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn image_from_string<'de, D>(deserializer: D) -> std::result::Result<Option<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ImageRef::parse))
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_entries_splits_title() {
        let outline = Outline::from_entries(vec![
            json!({"title": "Demo"}),
            json!({"title": "S1", "content": [{"text": "**Point** one"}]}),
        ])
        .unwrap();

        assert_eq!(outline.title, "Demo");
        assert_eq!(outline.slides.len(), 1);
        assert_eq!(outline.slides[0].content[0].text, "**Point** one");
    }

    #[test]
    fn test_from_entries_keeps_title_entry_with_body() {
        let outline = Outline::from_entries(vec![
            json!({"title": "Demo", "content": ["first"]}),
            json!({"title": "S1"}),
        ])
        .unwrap();

        assert_eq!(outline.title, "Demo");
        assert_eq!(outline.slides.len(), 2);
        assert_eq!(outline.slides[0].title, "Demo");
    }

    #[test]
    fn test_from_entries_rejects_bad_entry() {
        let err = Outline::from_entries(vec![json!({"title": "Demo"}), json!({"content": []})])
            .unwrap_err();
        assert!(matches!(err, Error::OutlineParse(msg) if msg.starts_with("entry 1")));
    }

    #[test]
    fn test_from_entries_empty() {
        assert!(matches!(
            Outline::from_entries(Vec::new()),
            Err(Error::OutlineParse(_))
        ));
    }

    #[test]
    fn test_lenient_entry_shapes() {
        let slide: SlideOutline = serde_json::from_value(json!({
            "title": "Intro",
            "content": ["plain", {"text": "rich", "subpoints": ["a", "b"]}],
            "code": "print(1)",
            "notes": null,
            "image_url": ""
        }))
        .unwrap();

        assert_eq!(slide.content[0], BulletItem::new("plain"));
        assert_eq!(slide.content[1].subpoints, vec!["a", "b"]);
        assert_eq!(slide.code().unwrap().title, "");
        assert_eq!(slide.code().unwrap().snippet, "print(1)");
        assert_eq!(slide.notes, None);
        assert_eq!(slide.image, None);
    }

    #[test]
    fn test_blank_code_is_absent() {
        let slide = SlideOutline::new("S").with_code("Example", "  \n ");
        assert!(slide.code().is_none());
        assert!(!slide.has_body());
    }

    #[test]
    fn test_code_slide_count() {
        let mut outline = Outline::new("Deck");
        outline.add_slide(SlideOutline::new("A").with_code("Loop", "for x in y {}"));
        outline.add_slide(SlideOutline::new("B").with_code("Blank", " \n"));
        outline.add_slide(SlideOutline::new("C"));
        assert_eq!(outline.code_slide_count(), 1);
    }

    #[test]
    fn test_image_ref_parse() {
        assert_eq!(
            ImageRef::parse("data:image/png;base64,AAAA"),
            Some(ImageRef::Inline("data:image/png;base64,AAAA".into()))
        );
        assert_eq!(
            ImageRef::parse(" https://example.com/a.png "),
            Some(ImageRef::Url("https://example.com/a.png".into()))
        );
        assert_eq!(
            ImageRef::parse("cloud architecture diagram"),
            Some(ImageRef::Query("cloud architecture diagram".into()))
        );
        assert_eq!(ImageRef::parse("   "), None);
    }

    #[test]
    fn test_image_alias() {
        let slide: SlideOutline =
            serde_json::from_value(json!({"title": "S", "image": "rust logo"})).unwrap();
        assert!(slide.image.unwrap().is_query());
    }

    #[test]
    fn test_serialize_array_shape() {
        let mut outline = Outline::new("Demo");
        outline.add_slide(
            SlideOutline::new("S1")
                .with_bullet(BulletItem::new("one"))
                .with_image(ImageRef::Url("https://x/y.png".into())),
        );

        let value = serde_json::to_value(&outline).unwrap();
        assert_eq!(
            value,
            json!([
                {"title": "Demo"},
                {"title": "S1", "content": [{"text": "one"}], "image_url": "https://x/y.png"}
            ])
        );

        let entries = value.as_array().unwrap().clone();
        assert_eq!(Outline::from_entries(entries).unwrap(), outline);
    }
}

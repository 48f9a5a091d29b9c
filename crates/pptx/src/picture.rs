//! Embedded pictures and the `p:pic` element that shows them.

use crate::slide::Rect;
use crate::xml::{self, Element};
use deck_core::ImageRef;

/// Picture formats that can be embedded without conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detect PNG or JPEG from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    /// File extension used for the media part.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// MIME type registered for the extension.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Image bytes ready to be stored as a media part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl EmbeddedImage {
    /// Wrap PNG or JPEG bytes; other data yields `None`.
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        let format = ImageFormat::detect(&bytes)?;
        Some(Self { bytes, format })
    }
}

/// Result of resolving an image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Ready(EmbeddedImage),
    /// Resolution failed; the reason is shown on the slide.
    Failed(String),
}

/// Turns an image reference into embeddable bytes.
pub trait ImageResolver {
    fn resolve(&self, image: &ImageRef) -> ImageOutcome;
}

impl<F> ImageResolver for F
where
    F: Fn(&ImageRef) -> ImageOutcome,
{
    fn resolve(&self, image: &ImageRef) -> ImageOutcome {
        self(image)
    }
}

/// Visible text left in place of a picture that could not be resolved.
pub fn failure_marker(reason: &str, image: &ImageRef) -> String {
    format!("status code: {} -> {}", reason, image.as_str())
}

/// Build a stretched `p:pic` showing relationship `rel_id` over `frame`.
pub fn picture_element(id: u32, rel_id: &str, frame: Rect) -> Element {
    let id_text = id.to_string();
    let name = format!("Picture {}", id.saturating_sub(1));
    let (x, y, cx, cy) = (
        frame.x.to_string(),
        frame.y.to_string(),
        frame.cx.to_string(),
        frame.cy.to_string(),
    );

    let leaf = |name: &str, attrs: &[(&str, &str)]| {
        Element::from_parts(xml::start_tag(name, attrs), Vec::new())
    };
    let node = |name: &str, children: Vec<Element>| {
        Element::from_parts(xml::start_tag(name, &[]), children)
    };

    let nv_pic_pr = node(
        "p:nvPicPr",
        vec![
            leaf("p:cNvPr", &[("id", id_text.as_str()), ("name", name.as_str())]),
            node(
                "p:cNvPicPr",
                vec![leaf("a:picLocks", &[("noChangeAspect", "1")])],
            ),
            leaf("p:nvPr", &[]),
        ],
    );
    let blip_fill = node(
        "p:blipFill",
        vec![
            leaf("a:blip", &[("r:embed", rel_id)]),
            node("a:stretch", vec![leaf("a:fillRect", &[])]),
        ],
    );
    let sp_pr = node(
        "p:spPr",
        vec![
            node(
                "a:xfrm",
                vec![
                    leaf("a:off", &[("x", x.as_str()), ("y", y.as_str())]),
                    leaf("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())]),
                ],
            ),
            Element::from_parts(
                xml::start_tag("a:prstGeom", &[("prst", "rect")]),
                vec![leaf("a:avLst", &[])],
            ),
        ],
    );

    node("p:pic", vec![nv_pic_pr, blip_fill, sp_pr])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            ImageFormat::detect(b"\x89PNG\r\n\x1a\nrest"),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::detect(b"GIF89a"), None);
        assert!(EmbeddedImage::new(b"GIF89a".to_vec()).is_none());
    }

    #[test]
    fn test_failure_marker() {
        let image = ImageRef::Url("https://x/y.png".into());
        assert_eq!(
            failure_marker("404", &image),
            "status code: 404 -> https://x/y.png"
        );
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |_: &ImageRef| ImageOutcome::Failed("offline".into());
        assert_eq!(
            resolver.resolve(&ImageRef::Query("cat".into())),
            ImageOutcome::Failed("offline".into())
        );
    }

    #[test]
    fn test_picture_element() {
        let frame = Rect {
            x: 1,
            y: 2,
            cx: 3,
            cy: 4,
        };
        let pic = picture_element(9, "rId4", frame);
        let xml = String::from_utf8(xml::write_events(&pic.events).unwrap()).unwrap();
        assert!(xml.starts_with(r#"<p:pic><p:nvPicPr><p:cNvPr id="9" name="Picture 8"/>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId4"/>"#));
        assert!(xml.contains(r#"<a:off x="1" y="2"/><a:ext cx="3" cy="4"/>"#));
    }
}

//! Parsed shape tree of a slide-like part (slide, layout or notes slide).
//!
//! A part is split into the events before the shape tree, the top-level
//! shapes of `p:spTree`, and the events after it. Editing happens on the
//! shape list; [`SlideDocument::to_xml`] lowers everything in one pass.

use crate::text::TextBody;
use crate::xml::{self, Element, OwnedEvent};
use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// The `p:ph` reference of a placeholder shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    pub kind: Option<String>,
    pub idx: Option<u32>,
}

impl PlaceholderRef {
    /// Whether `other` refers to the same layout placeholder.
    ///
    /// Indexes win when both sides have one; otherwise the type decides,
    /// with a missing type meaning `obj`.
    pub fn matches(&self, other: &PlaceholderRef) -> bool {
        if let (Some(a), Some(b)) = (self.idx, other.idx) {
            return a == b;
        }
        self.kind.as_deref().unwrap_or("obj") == other.kind.as_deref().unwrap_or("obj")
    }
}

/// A `p:sp` shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SpShape {
    tag: BytesStart<'static>,
    pub nv_sp_pr: Option<Element>,
    pub sp_pr: Option<Element>,
    pub style: Option<Element>,
    pub text: Option<TextBody>,
    rest: Vec<Element>,
}

impl SpShape {
    fn parse(element: &Element) -> Result<Self> {
        let tag = element
            .tag()
            .cloned()
            .ok_or_else(|| Error::XmlError("shape without start tag".to_string()))?;

        let mut shape = Self {
            tag,
            nv_sp_pr: None,
            sp_pr: None,
            style: None,
            text: None,
            rest: Vec::new(),
        };

        for child in element.children() {
            match child.local_name() {
                b"nvSpPr" => shape.nv_sp_pr = Some(child),
                b"spPr" => shape.sp_pr = Some(child),
                b"style" => shape.style = Some(child),
                b"txBody" => shape.text = Some(TextBody::parse(&child)?),
                _ => shape.rest.push(child),
            }
        }

        Ok(shape)
    }

    fn to_element(&self) -> Element {
        let mut children = Vec::new();
        children.extend(self.nv_sp_pr.clone());
        children.extend(self.sp_pr.clone());
        children.extend(self.style.clone());
        children.extend(self.text.as_ref().map(TextBody::to_element));
        children.extend(self.rest.iter().cloned());
        Element::from_parts(self.tag.clone(), children)
    }

    /// `cNvPr name`.
    pub fn name(&self) -> Option<String> {
        self.nv_sp_pr
            .as_ref()
            .and_then(|nv| nv.find(b"cNvPr"))
            .and_then(|c| xml::attr(c, "name"))
    }

    /// Placeholder reference, when the shape is a placeholder.
    pub fn placeholder(&self) -> Option<PlaceholderRef> {
        let ph = self.nv_sp_pr.as_ref()?.find(b"ph")?;
        Some(PlaceholderRef {
            kind: xml::attr(ph, "type"),
            idx: xml::attr(ph, "idx").and_then(|v| v.parse().ok()),
        })
    }

    /// The shape's own transform, if it has one.
    pub fn frame(&self) -> Option<Rect> {
        let xfrm = self
            .sp_pr
            .as_ref()?
            .children()
            .into_iter()
            .find(|c| c.local_name() == b"xfrm")?;
        let off = xfrm.find(b"off")?;
        let ext = xfrm.find(b"ext")?;

        Some(Rect {
            x: xml::attr(off, "x")?.parse().ok()?,
            y: xml::attr(off, "y")?.parse().ok()?,
            cx: xml::attr(ext, "cx")?.parse().ok()?,
            cy: xml::attr(ext, "cy")?.parse().ok()?,
        })
    }
}

/// A top-level entry of the shape tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sp(SpShape),
    /// Group properties, pictures, graphic frames and other elements,
    /// kept verbatim.
    Other(Element),
}

impl Shape {
    fn to_element(&self) -> Element {
        match self {
            Shape::Sp(sp) => sp.to_element(),
            Shape::Other(element) => element.clone(),
        }
    }
}

/// A slide-like part split around its shape tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDocument {
    prolog: Vec<OwnedEvent>,
    pub shapes: Vec<Shape>,
    epilog: Vec<OwnedEvent>,
}

impl SlideDocument {
    /// Parse a slide, slide layout or notes slide part.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let events = xml::read_events(xml)?;

        let tree_start = events
            .iter()
            .position(|e| {
                matches!(e, Event::Start(_)) && xml::event_local_name(e) == Some(b"spTree".as_slice())
            })
            .ok_or_else(|| Error::CorruptedFile("part has no shape tree".to_string()))?;
        let tree_end = xml::element_end(&events, tree_start)?;

        let mut shapes = Vec::new();
        let mut idx = tree_start + 1;
        while idx < tree_end {
            match &events[idx] {
                Event::Start(_) | Event::Empty(_) => {
                    let end = xml::element_end(&events, idx)?;
                    let element = Element::new(events[idx..=end].to_vec());
                    shapes.push(if element.local_name() == b"sp" {
                        Shape::Sp(SpShape::parse(&element)?)
                    } else {
                        Shape::Other(element)
                    });
                    idx = end + 1;
                }
                _ => idx += 1,
            }
        }

        Ok(Self {
            prolog: events[..=tree_start].to_vec(),
            shapes,
            epilog: events[tree_end..].to_vec(),
        })
    }

    /// Lower to XML bytes.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let shapes: Vec<Element> = self.shapes.iter().map(Shape::to_element).collect();
        xml::write_events(
            self.prolog
                .iter()
                .chain(shapes.iter().flat_map(|s| s.events.iter()))
                .chain(self.epilog.iter()),
        )
    }

    /// `p:sp` shapes in tree order.
    pub fn sp_shapes(&self) -> impl Iterator<Item = &SpShape> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Sp(sp) => Some(sp),
            Shape::Other(_) => None,
        })
    }

    /// Largest `cNvPr id` anywhere in the shape tree.
    pub fn max_shape_id(&self) -> u32 {
        self.shapes
            .iter()
            .map(Shape::to_element)
            .flat_map(|e| e.events)
            .filter_map(|event| match event {
                Event::Start(ref t) | Event::Empty(ref t)
                    if xml::local_name(t.name().as_ref()) == b"cNvPr" =>
                {
                    xml::attr(t, "id").and_then(|v| v.parse::<u32>().ok())
                }
                _ => None,
            })
            .max()
            .unwrap_or(1)
    }

    /// Frame of the placeholder matching `placeholder`, if this part has one.
    pub fn placeholder_frame(&self, placeholder: &PlaceholderRef) -> Option<Rect> {
        self.sp_shapes()
            .filter(|sp| sp.placeholder().is_some_and(|ph| ph.matches(placeholder)))
            .find_map(SpShape::frame)
    }

    /// Concatenated text of all shapes, one line per paragraph.
    pub fn text(&self) -> String {
        self.sp_shapes()
            .filter_map(|sp| sp.text.as_ref())
            .map(TextBody::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="7" name="Image 6"/><p:cNvSpPr/><p:nvPr><p:ph idx="3"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="100" y="200"/><a:ext cx="300" cy="400"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>imageurl</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#;

    #[test]
    fn test_parse_shapes() {
        let doc = SlideDocument::parse(SLIDE.as_bytes()).unwrap();
        assert_eq!(doc.shapes.len(), 4);
        assert_eq!(doc.sp_shapes().count(), 2);

        let title = doc.sp_shapes().next().unwrap();
        assert_eq!(title.name().as_deref(), Some("Title 1"));
        assert_eq!(
            title.placeholder(),
            Some(PlaceholderRef {
                kind: Some("title".into()),
                idx: None
            })
        );
        assert_eq!(title.frame(), None);
        assert_eq!(doc.max_shape_id(), 7);
    }

    #[test]
    fn test_round_trip_is_identity() {
        let doc = SlideDocument::parse(SLIDE.as_bytes()).unwrap();
        assert_eq!(String::from_utf8(doc.to_xml().unwrap()).unwrap(), SLIDE);
    }

    #[test]
    fn test_frame_and_placeholder_lookup() {
        let doc = SlideDocument::parse(SLIDE.as_bytes()).unwrap();
        let rect = Rect {
            x: 100,
            y: 200,
            cx: 300,
            cy: 400,
        };

        let by_idx = PlaceholderRef {
            kind: Some("pic".into()),
            idx: Some(3),
        };
        assert_eq!(doc.placeholder_frame(&by_idx), Some(rect));

        let by_kind = PlaceholderRef {
            kind: Some("title".into()),
            idx: None,
        };
        assert_eq!(doc.placeholder_frame(&by_kind), None);
    }

    #[test]
    fn test_remove_shape() {
        let mut doc = SlideDocument::parse(SLIDE.as_bytes()).unwrap();
        doc.shapes.retain(|s| match s {
            Shape::Sp(sp) => sp.name().as_deref() != Some("Image 6"),
            Shape::Other(_) => true,
        });
        let xml = String::from_utf8(doc.to_xml().unwrap()).unwrap();
        assert!(!xml.contains("imageurl"));
        assert!(xml.contains("{title}"));
        assert!(xml.ends_with("</p:sld>"));
    }

    #[test]
    fn test_missing_shape_tree() {
        assert!(matches!(
            SlideDocument::parse(b"<p:sld><p:cSld/></p:sld>"),
            Err(Error::CorruptedFile(_))
        ));
    }

    #[test]
    fn test_placeholder_matching() {
        let body = PlaceholderRef {
            kind: None,
            idx: Some(1),
        };
        let obj = PlaceholderRef {
            kind: Some("obj".into()),
            idx: None,
        };
        assert!(body.matches(&obj));
        assert!(!body.matches(&PlaceholderRef {
            kind: Some("body".into()),
            idx: Some(2)
        }));
    }
}

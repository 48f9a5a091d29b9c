//! The `[Content_Types].xml` part.

use crate::xml::{self, OwnedEvent};
use deck_core::Result;
use quick_xml::events::{BytesDecl, Event};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

pub const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
pub const CT_NOTES_SLIDE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";

const TYPES_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Default (by extension) and override (by part) content types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse `[Content_Types].xml`.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut types = Self::default();

        for event in xml::read_events(xml)? {
            if let Event::Start(ref e) | Event::Empty(ref e) = event {
                let content_type = xml::attr(e, "ContentType").unwrap_or_default();
                match xml::local_name(e.name().as_ref()) {
                    b"Default" => {
                        if let Some(ext) = xml::attr(e, "Extension") {
                            types.defaults.push((ext.to_ascii_lowercase(), content_type));
                        }
                    }
                    b"Override" => {
                        if let Some(part) = xml::attr(e, "PartName") {
                            types.overrides.push((part, content_type));
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(types)
    }

    /// Serialize back to XML.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut events: Vec<OwnedEvent> = vec![
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
            xml::start("Types", &[("xmlns", TYPES_NAMESPACE)]),
        ];

        for (ext, content_type) in &self.defaults {
            events.push(xml::empty(
                "Default",
                &[("Extension", ext.as_str()), ("ContentType", content_type.as_str())],
            ));
        }
        for (part, content_type) in &self.overrides {
            events.push(xml::empty(
                "Override",
                &[("PartName", part.as_str()), ("ContentType", content_type.as_str())],
            ));
        }

        events.push(xml::end("Types"));
        xml::write_events(&events)
    }

    /// Register a default for `extension` unless one exists.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let extension = extension.to_ascii_lowercase();
        if !self.defaults.iter().any(|(ext, _)| *ext == extension) {
            self.defaults.push((extension, content_type.to_string()));
        }
    }

    /// Set the override for package part `part` (given without leading `/`).
    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let name = format!("/{}", part);
        self.overrides.retain(|(p, _)| *p != name);
        self.overrides.push((name, content_type.to_string()));
    }

    /// Drop the override for `part`.
    pub fn remove_override(&mut self, part: &str) {
        let name = format!("/{}", part);
        self.overrides.retain(|(p, _)| *p != name);
    }

    /// Content type of `part`, from its override or its extension default.
    pub fn content_type(&self, part: &str) -> Option<&str> {
        let name = format!("/{}", part);
        if let Some((_, ct)) = self.overrides.iter().find(|(p, _)| *p == name) {
            return Some(ct);
        }

        let ext = part.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/></Types>"#;

    #[test]
    fn test_lookup() {
        let types = ContentTypes::parse(TYPES.as_bytes()).unwrap();
        assert_eq!(types.content_type("ppt/slides/slide1.xml"), Some(CT_SLIDE));
        assert_eq!(types.content_type("ppt/other.xml"), Some("application/xml"));
        assert_eq!(types.content_type("ppt/media/image1.png"), None);
    }

    #[test]
    fn test_modify_and_round_trip() {
        let mut types = ContentTypes::parse(TYPES.as_bytes()).unwrap();
        types.ensure_default("PNG", "image/png");
        types.ensure_default("png", "image/x-png");
        types.set_override("ppt/slides/slide2.xml", CT_SLIDE);
        types.remove_override("ppt/slides/slide1.xml");

        let reparsed = ContentTypes::parse(&types.to_xml().unwrap()).unwrap();
        assert_eq!(reparsed, types);
        assert_eq!(reparsed.content_type("ppt/media/image1.png"), Some("image/png"));
        assert_eq!(reparsed.content_type("ppt/slides/slide1.xml"), Some("application/xml"));
        assert_eq!(reparsed.content_type("ppt/slides/slide2.xml"), Some(CT_SLIDE));
    }
}

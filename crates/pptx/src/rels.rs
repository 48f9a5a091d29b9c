//! OPC relationship parts (`*.rels`).

use crate::xml::{self, OwnedEvent};
use deck_core::{Error, Result};
use quick_xml::events::{BytesDecl, Event};

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_NOTES_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
pub const REL_NOTES_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const RELS_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub target_mode: Option<String>,
}

/// The relationships of one part, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty relationship set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut items = Vec::new();

        for event in xml::read_events(xml)? {
            if let Event::Start(ref e) | Event::Empty(ref e) = event {
                if xml::local_name(e.name().as_ref()) != b"Relationship" {
                    continue;
                }

                let id = xml::attr(e, "Id")
                    .ok_or_else(|| Error::CorruptedFile("Relationship without Id".to_string()))?;
                items.push(Relationship {
                    id,
                    rel_type: xml::attr(e, "Type").unwrap_or_default(),
                    target: xml::attr(e, "Target").unwrap_or_default(),
                    target_mode: xml::attr(e, "TargetMode"),
                });
            }
        }

        Ok(Self { items })
    }

    /// Serialize to a `.rels` part.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut events: Vec<OwnedEvent> = vec![
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
            xml::start("Relationships", &[("xmlns", RELS_NAMESPACE)]),
        ];

        for rel in &self.items {
            let mut attrs = vec![
                ("Id", rel.id.as_str()),
                ("Type", rel.rel_type.as_str()),
                ("Target", rel.target.as_str()),
            ];
            if let Some(mode) = &rel.target_mode {
                attrs.push(("TargetMode", mode.as_str()));
            }
            events.push(xml::empty("Relationship", &attrs));
        }

        events.push(xml::end("Relationships"));
        xml::write_events(&events)
    }

    /// All relationships.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship of the given type.
    pub fn find_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// Add a relationship under a fresh id and return that id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: None,
        });
        id
    }

    /// Remove a relationship by id.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Copy without relationships of the given type.
    pub fn without_type(&self, rel_type: &str) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|r| r.rel_type != rel_type)
                .cloned()
                .collect(),
        }
    }

    /// Smallest `rIdN` not in use and above every numbered id.
    fn next_id(&self) -> String {
        let max = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }
}

/// Path of the relationship part belonging to `part`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to the part that owns it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Relative target from `source_part` to `target_part`.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dir: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = target_part.split('/').collect();

    let common = source_dir
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; source_dir.len() - common];
    parts.extend(&target[common..]);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/></Relationships>"#;

    #[test]
    fn test_parse_and_lookup() {
        let rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(
            rels.find_by_type(REL_SLIDE_LAYOUT).unwrap().target,
            "../slideLayouts/slideLayout2.xml"
        );
        assert_eq!(rels.get("rId2").unwrap().rel_type, REL_NOTES_SLIDE);
    }

    #[test]
    fn test_add_uses_next_id() {
        let mut rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();
        assert_eq!(rels.add(REL_IMAGE, "../media/image1.png"), "rId3");
        assert_eq!(rels.add(REL_IMAGE, "../media/image2.png"), "rId4");
        assert!(rels.remove("rId3").is_some());
        assert_eq!(rels.len(), 3);
    }

    #[test]
    fn test_without_type() {
        let rels = Relationships::parse(SLIDE_RELS.as_bytes()).unwrap();
        let copy = rels.without_type(REL_NOTES_SLIDE);
        assert_eq!(copy.len(), 1);
        assert!(copy.find_by_type(REL_NOTES_SLIDE).is_none());
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut rels = Relationships::new();
        rels.add(REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        let parsed = Relationships::parse(&rels.to_xml().unwrap()).unwrap();
        assert_eq!(parsed, rels);
    }

    #[test]
    fn test_rels_path() {
        assert_eq!(rels_path("ppt/slides/slide3.xml"), "ppt/slides/_rels/slide3.xml.rels");
        assert_eq!(rels_path("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../slideLayouts/slideLayout2.xml"),
            "ppt/slideLayouts/slideLayout2.xml"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide1.xml"),
            "ppt/slides/slide1.xml"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "/ppt/slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(
            relative_target("ppt/slides/slide1.xml", "ppt/media/image1.png"),
            "../media/image1.png"
        );
        assert_eq!(
            relative_target("ppt/presentation.xml", "ppt/slides/slide4.xml"),
            "slides/slide4.xml"
        );
    }
}

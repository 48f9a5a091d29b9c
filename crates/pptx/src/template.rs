//! Template decks: slide cloning, slot binding and per-slide filling.
//!
//! The slides of a template double as its layouts: slide `i` of the file as
//! opened is layout `i`. Pristine copies of those slides are taken at open
//! time, so every clone starts from the untouched layout even after earlier
//! slides have been filled.

use crate::content_types::{ContentTypes, CT_NOTES_SLIDE, CT_SLIDE};
use crate::fill::{self, FillSummary, SlideResources};
use crate::notes::{self, BLANK_NOTES_XML};
use crate::package::Package;
use crate::picture::{EmbeddedImage, ImageOutcome, ImageResolver};
use crate::rels::{
    rels_path, relative_target, resolve_target, Relationships, REL_IMAGE, REL_NOTES_MASTER,
    REL_NOTES_SLIDE, REL_OFFICE_DOCUMENT, REL_SLIDE, REL_SLIDE_LAYOUT,
};
use crate::slide::{PlaceholderRef, Rect, SlideDocument};
use crate::xml::{self, Element, OwnedEvent};
use deck_core::render::RenderSlide;
use deck_core::{Error, ImageRef, Result};
use quick_xml::events::Event;
use std::io::{Read, Seek};
use std::path::Path;

const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Smallest id PowerPoint accepts in `p:sldIdLst`.
const MIN_SLIDE_ID: u32 = 256;

/// A slide of the presentation, in `p:sldIdLst` order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SlideEntry {
    id: u32,
    rel_id: String,
    part: String,
    /// Layout the slide currently holds.
    layout: usize,
}

/// Untouched copy of a layout slide.
#[derive(Debug, Clone)]
struct LayoutSnapshot {
    xml: Vec<u8>,
    rels: Relationships,
}

/// An opened template deck being turned into an output deck.
#[derive(Debug, Clone)]
pub struct Template {
    package: Package,
    presentation_part: String,
    presentation_rels: Relationships,
    content_types: ContentTypes,
    slides: Vec<SlideEntry>,
    layouts: Vec<LayoutSnapshot>,
}

impl Template {
    /// Open a template from a reader.
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self> {
        let package = Package::open(reader)?;
        Self::from_package(package)
    }

    /// Open a template from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Open a template file.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    fn from_package(package: Package) -> Result<Self> {
        let presentation_part = package
            .relationships("")?
            .find_by_type(REL_OFFICE_DOCUMENT)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| DEFAULT_PRESENTATION_PART.to_string());
        let presentation_rels = package.relationships(&presentation_part)?;
        let content_types = package.content_types()?;

        let mut slides = Vec::new();
        for event in xml::read_events(package.require(&presentation_part)?)? {
            let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                continue;
            };
            if xml::local_name(e.name().as_ref()) != b"sldId" {
                continue;
            }

            let id = xml::attr(e, "id").and_then(|v| v.parse().ok()).unwrap_or(0);
            let rel_id = xml::attr(e, "r:id")
                .ok_or_else(|| Error::CorruptedFile("slide id without r:id".to_string()))?;
            let rel = presentation_rels.get(&rel_id).ok_or_else(|| {
                Error::CorruptedFile(format!("presentation has no relationship {}", rel_id))
            })?;

            slides.push(SlideEntry {
                id,
                rel_id,
                part: resolve_target(&presentation_part, &rel.target),
                layout: slides.len(),
            });
        }

        let mut layouts = Vec::with_capacity(slides.len());
        for slide in &slides {
            layouts.push(LayoutSnapshot {
                xml: package.require(&slide.part)?.to_vec(),
                rels: package.relationships(&slide.part)?.without_type(REL_NOTES_SLIDE),
            });
        }

        log::debug!(
            "Opened template with {} slides ({})",
            slides.len(),
            presentation_part
        );

        Ok(Self {
            package,
            presentation_part,
            presentation_rels,
            content_types,
            slides,
            layouts,
        })
    }

    /// Number of slides currently in the deck.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Number of layouts (slides of the template as opened).
    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    /// Part names of the slides, in presentation order.
    pub fn slide_parts(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.part.as_str()).collect()
    }

    /// Check that every index in `layouts` names a template slide.
    pub fn validate_layouts(&self, layouts: &[usize]) -> Result<()> {
        match layouts.iter().find(|&&idx| idx >= self.layouts.len()) {
            Some(&index) => Err(Error::TemplateLayoutMissing {
                index,
                available: self.layouts.len(),
            }),
            None => Ok(()),
        }
    }

    /// Append copies of layout slides until every slot of `layouts` has a
    /// slide. Existing slides are left in place. Returns the number added.
    pub fn clone_to_fit(&mut self, layouts: &[usize]) -> Result<usize> {
        self.validate_layouts(layouts)?;

        let mut added = 0;
        while self.slides.len() < layouts.len() {
            self.append_slide(layouts[self.slides.len()])?;
            added += 1;
        }

        if added > 0 {
            log::debug!("Cloned {} slides, deck now has {}", added, self.slides.len());
        }
        Ok(added)
    }

    /// Re-seed every slot whose slide holds a different layout than
    /// `layouts` asks for. Returns the number of slots re-seeded.
    pub fn bind_layouts(&mut self, layouts: &[usize]) -> Result<usize> {
        self.validate_layouts(layouts)?;

        let mut rebound = 0;
        for (slot, &layout) in layouts.iter().enumerate().take(self.slides.len()) {
            if self.slides[slot].layout != layout {
                self.reseed(slot, layout)?;
                rebound += 1;
            }
        }
        Ok(rebound)
    }

    /// Remove slides beyond the first `count`.
    pub fn truncate_slides(&mut self, count: usize) {
        if count >= self.slides.len() {
            return;
        }

        let removed: Vec<SlideEntry> = self.slides.drain(count..).collect();
        for slide in &removed {
            self.detach_notes(&slide.part);
            self.package.remove(&slide.part);
            self.package.remove(&rels_path(&slide.part));
            self.content_types.remove_override(&slide.part);
            self.presentation_rels.remove(&slide.rel_id);
        }
        log::debug!("Removed {} surplus template slides", removed.len());
    }

    /// Make the deck hold exactly one slide per entry of `layouts`, each
    /// starting as a copy of its layout.
    pub fn prepare(&mut self, layouts: &[usize]) -> Result<()> {
        self.validate_layouts(layouts)?;
        self.clone_to_fit(layouts)?;
        self.bind_layouts(layouts)?;
        self.truncate_slides(layouts.len());
        Ok(())
    }

    /// Fill slide `index` from `slide`, resolving images through `resolver`.
    pub fn fill_slide(
        &mut self,
        index: usize,
        slide: &RenderSlide,
        resolver: &dyn ImageResolver,
    ) -> Result<FillSummary> {
        let part = self.slide_part(index)?.to_string();
        let mut doc = SlideDocument::parse(self.package.require(&part)?)?;
        let rels = self.package.relationships(&part)?;

        let layout = rels
            .find_by_type(REL_SLIDE_LAYOUT)
            .map(|r| resolve_target(&part, &r.target))
            .and_then(|p| self.package.get(&p))
            .and_then(|xml| SlideDocument::parse(xml).ok());

        let mut context = SlideContext {
            package: &mut self.package,
            content_types: &mut self.content_types,
            part: &part,
            rels,
            layout,
            resolver,
        };
        let summary = fill::fill_slide(&mut doc, slide, &mut context)?;
        let mut rels = context.rels;

        // A slot kept from the template must not carry the template's notes.
        if summary.notes.is_none() && rels.find_by_type(REL_NOTES_SLIDE).is_some() {
            self.detach_notes(&part);
            rels = rels.without_type(REL_NOTES_SLIDE);
            log::debug!("Dropped template notes of {}", part);
        }

        self.package.put_relationships(&part, &rels)?;
        self.package.put(&part, doc.to_xml()?);

        if let Some(text) = &summary.notes {
            self.write_notes(index, text)?;
        }
        Ok(summary)
    }

    /// Fill every slide, `slides[i]` into slot `i`.
    pub fn fill_all(
        &mut self,
        slides: &[RenderSlide],
        resolver: &dyn ImageResolver,
    ) -> Result<Vec<FillSummary>> {
        if slides.len() != self.slides.len() {
            return Err(Error::InvalidRequest(format!(
                "{} render slides for a deck of {} slides",
                slides.len(),
                self.slides.len()
            )));
        }

        slides
            .iter()
            .enumerate()
            .map(|(idx, slide)| self.fill_slide(idx, slide, resolver))
            .collect()
    }

    /// Write speaker notes for slide `index`, creating its notes slide from
    /// the notes master when needed. Returns `false` when the deck has no
    /// notes master to create one from.
    pub fn write_notes(&mut self, index: usize, text: &str) -> Result<bool> {
        let part = self.slide_part(index)?.to_string();
        let mut slide_rels = self.package.relationships(&part)?;

        if let Some(rel) = slide_rels.find_by_type(REL_NOTES_SLIDE) {
            let notes_part = resolve_target(&part, &rel.target);
            let mut doc = SlideDocument::parse(self.package.require(&notes_part)?)?;
            notes::write_notes(&mut doc, text)?;
            self.package.put(&notes_part, doc.to_xml()?);
            return Ok(true);
        }

        let Some(master) = self.presentation_rels.find_by_type(REL_NOTES_MASTER) else {
            log::warn!("Template has no notes master, skipping notes for {}", part);
            return Ok(false);
        };
        let master_part = resolve_target(&self.presentation_part, &master.target);

        let notes_part = self
            .package
            .next_part_name("ppt/notesSlides/notesSlide", "xml");
        let mut doc = SlideDocument::parse(BLANK_NOTES_XML.as_bytes())?;
        notes::write_notes(&mut doc, text)?;
        self.package.put(&notes_part, doc.to_xml()?);

        let mut notes_rels = Relationships::new();
        notes_rels.add(REL_NOTES_MASTER, &relative_target(&notes_part, &master_part));
        notes_rels.add(REL_SLIDE, &relative_target(&notes_part, &part));
        self.package.put_relationships(&notes_part, &notes_rels)?;

        slide_rels.add(REL_NOTES_SLIDE, &relative_target(&part, &notes_part));
        self.package.put_relationships(&part, &slide_rels)?;
        self.content_types.set_override(&notes_part, CT_NOTES_SLIDE);

        log::debug!("Created {} for {}", notes_part, part);
        Ok(true)
    }

    /// Speaker notes of slide `index`, if it has a notes slide.
    pub fn notes_text(&self, index: usize) -> Result<Option<String>> {
        let part = self.slide_part(index)?;
        let rels = self.package.relationships(part)?;
        let Some(rel) = rels.find_by_type(REL_NOTES_SLIDE) else {
            return Ok(None);
        };

        let notes_part = resolve_target(part, &rel.target);
        let doc = SlideDocument::parse(self.package.require(&notes_part)?)?;
        Ok(notes::read_notes(&doc))
    }

    /// Parsed shape tree of slide `index`.
    pub fn slide_document(&self, index: usize) -> Result<SlideDocument> {
        SlideDocument::parse(self.package.require(self.slide_part(index)?)?)
    }

    /// Relationships of slide `index`.
    pub fn slide_relationships(&self, index: usize) -> Result<Relationships> {
        self.package.relationships(self.slide_part(index)?)
    }

    /// Raw content of a package part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.package.get(name)
    }

    /// Serialize the deck.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let presentation = self.presentation_xml()?;
        self.package.put(&self.presentation_part, presentation);
        self.package
            .put_relationships(&self.presentation_part, &self.presentation_rels)?;
        self.package.put_content_types(&self.content_types)?;
        self.package.to_bytes()
    }

    fn slide_part(&self, index: usize) -> Result<&str> {
        self.slides
            .get(index)
            .map(|s| s.part.as_str())
            .ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "slide {} out of range (deck has {} slides)",
                    index,
                    self.slides.len()
                ))
            })
    }

    fn append_slide(&mut self, layout: usize) -> Result<()> {
        let snapshot = &self.layouts[layout];
        let part = self.package.next_part_name("ppt/slides/slide", "xml");

        self.package.put(&part, snapshot.xml.clone());
        self.package.put_relationships(&part, &snapshot.rels)?;
        self.content_types.set_override(&part, CT_SLIDE);

        let rel_id = self
            .presentation_rels
            .add(REL_SLIDE, &relative_target(&self.presentation_part, &part));
        let id = self
            .slides
            .iter()
            .map(|s| s.id + 1)
            .max()
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID);

        self.slides.push(SlideEntry {
            id,
            rel_id,
            part,
            layout,
        });
        Ok(())
    }

    fn reseed(&mut self, slot: usize, layout: usize) -> Result<()> {
        let part = self.slides[slot].part.clone();
        self.detach_notes(&part);

        let snapshot = &self.layouts[layout];
        self.package.put(&part, snapshot.xml.clone());
        self.package.put_relationships(&part, &snapshot.rels)?;
        self.slides[slot].layout = layout;

        log::debug!("Re-seeded slot {} ({}) from layout {}", slot, part, layout);
        Ok(())
    }

    /// Remove the notes slide owned by `part`, if any.
    fn detach_notes(&mut self, part: &str) {
        let Ok(rels) = self.package.relationships(part) else {
            return;
        };
        let Some(rel) = rels.find_by_type(REL_NOTES_SLIDE) else {
            return;
        };

        let notes_part = resolve_target(part, &rel.target);
        self.package.remove(&notes_part);
        self.package.remove(&rels_path(&notes_part));
        self.content_types.remove_override(&notes_part);
    }

    /// `presentation.xml` with `p:sldIdLst` rewritten from the slide list.
    fn presentation_xml(&self) -> Result<Vec<u8>> {
        let events = xml::read_events(self.package.require(&self.presentation_part)?)?;
        let prefix = events
            .iter()
            .find_map(|e| match e {
                Event::Start(t) => Some(String::from_utf8_lossy(t.name().as_ref()).into_owned()),
                _ => None,
            })
            .and_then(|name| name.split_once(':').map(|(p, _)| format!("{}:", p)))
            .unwrap_or_default();

        let list = self.slide_id_list(&prefix);
        let position = |name: &[u8]| {
            events
                .iter()
                .position(|e| xml::event_local_name(e) == Some(name) && !matches!(e, Event::End(_)))
        };

        let mut out: Vec<OwnedEvent> = Vec::with_capacity(events.len() + list.events.len());
        if let Some(start) = position(b"sldIdLst".as_slice()) {
            let end = xml::element_end(&events, start)?;
            out.extend_from_slice(&events[..start]);
            out.extend(list.events);
            out.extend_from_slice(&events[end + 1..]);
        } else {
            let anchor = ["notesMasterIdLst", "sldMasterIdLst"]
                .iter()
                .find_map(|name| position(name.as_bytes()))
                .ok_or_else(|| {
                    Error::CorruptedFile("presentation has no slide master list".to_string())
                })?;
            let end = xml::element_end(&events, anchor)?;
            out.extend_from_slice(&events[..=end]);
            out.extend(list.events);
            out.extend_from_slice(&events[end + 1..]);
        }

        xml::write_events(&out)
    }

    fn slide_id_list(&self, prefix: &str) -> Element {
        let children = self
            .slides
            .iter()
            .map(|s| {
                let id = s.id.to_string();
                Element::from_parts(
                    xml::start_tag(
                        &format!("{}sldId", prefix),
                        &[("id", id.as_str()), ("r:id", s.rel_id.as_str())],
                    ),
                    Vec::new(),
                )
            })
            .collect();
        Element::from_parts(xml::start_tag(&format!("{}sldIdLst", prefix), &[]), children)
    }
}

/// Package access for filling one slide.
struct SlideContext<'a> {
    package: &'a mut Package,
    content_types: &'a mut ContentTypes,
    part: &'a str,
    rels: Relationships,
    layout: Option<SlideDocument>,
    resolver: &'a dyn ImageResolver,
}

impl SlideResources for SlideContext<'_> {
    fn resolve_image(&mut self, image: &ImageRef) -> ImageOutcome {
        self.resolver.resolve(image)
    }

    fn inherited_frame(&self, placeholder: &PlaceholderRef) -> Option<Rect> {
        self.layout.as_ref()?.placeholder_frame(placeholder)
    }

    fn embed_image(&mut self, image: &EmbeddedImage) -> Result<String> {
        let ext = image.format.extension();
        let media = self.package.next_part_name("ppt/media/image", ext);
        self.package.put(&media, image.bytes.clone());
        self.content_types
            .ensure_default(ext, image.format.content_type());
        Ok(self
            .rels
            .add(REL_IMAGE, &relative_target(self.part, &media)))
    }
}

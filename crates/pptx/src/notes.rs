//! Speaker-notes slides.

use crate::slide::{Shape, SlideDocument, SpShape};
use crate::text::{Run, TextBody};
use deck_core::{Error, Result};

/// A notes slide with an empty notes placeholder, linked to the notes master
/// through its relationships.
pub const BLANK_NOTES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"#;

/// Replace the notes text of a parsed notes slide, one paragraph per line.
pub fn write_notes(doc: &mut SlideDocument, notes: &str) -> Result<()> {
    let body = notes_body(doc)
        .ok_or_else(|| Error::CorruptedFile("notes slide has no notes placeholder".to_string()))?;

    let base = body.reset().clone();
    body.paragraphs = notes
        .lines()
        .map(|line| {
            let mut paragraph = base.clone();
            if !line.is_empty() {
                paragraph.push_run(Run::new(line));
            }
            paragraph
        })
        .collect();
    if body.paragraphs.is_empty() {
        body.paragraphs.push(base);
    }

    Ok(())
}

/// Current notes text, if the slide has a notes placeholder.
pub fn read_notes(doc: &SlideDocument) -> Option<String> {
    doc.sp_shapes()
        .find(|sp| is_notes_body(sp))
        .and_then(|sp| sp.text.as_ref())
        .map(TextBody::text)
}

fn notes_body(doc: &mut SlideDocument) -> Option<&mut TextBody> {
    doc.shapes.iter_mut().find_map(|shape| match shape {
        Shape::Sp(sp) if is_notes_body(sp) => sp.text.as_mut(),
        _ => None,
    })
}

fn is_notes_body(sp: &SpShape) -> bool {
    sp.placeholder()
        .is_some_and(|ph| ph.kind.as_deref() == Some("body"))
}

//! In-memory template packages for tests.
//!
//! The standard template has three slides acting as layouts: a title slide,
//! a content slide (with a speaker-notes slide attached) and a code slide.
//! The content slide's picture placeholder has no transform of its own and
//! inherits its frame from the slide layout.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_BASE: &str = "application/vnd.openxmlformats-officedocument";

/// Frame of the layout's picture placeholder.
pub const LAYOUT_PICTURE_FRAME: (i64, i64, i64, i64) = (6096000, 1600200, 5486400, 4114800);

/// A text shape whose single run holds `text`.
pub fn text_shape(id: u32, name: &str, ph: Option<&str>, text: &str) -> String {
    let ph = ph.map(|attrs| format!("<p:ph {}/>", attrs)).unwrap_or_default();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr/><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
    )
}

/// A complete slide part holding `shapes`.
pub fn slide_xml(shapes: &[String]) -> String {
    format!(
        r#"{DECL}<p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        shapes.concat()
    )
}

fn rels_xml(rels: &[(&str, &str, &str)]) -> String {
    let items: String = rels
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL_BASE}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(r#"{DECL}<Relationships xmlns="{RELS_NS}">{items}</Relationships>"#)
}

fn title_layout() -> String {
    slide_xml(&[text_shape(2, "Title 1", Some(r#"type="ctrTitle""#), "{title}")])
}

fn content_layout() -> String {
    slide_xml(&[
        text_shape(2, "Title 1", Some(r#"type="title""#), "{title}"),
        text_shape(3, "Content Placeholder 2", Some(r#"idx="1""#), "{content}"),
        text_shape(4, "Picture Placeholder 3", Some(r#"type="pic" idx="2""#), "imageurl"),
        text_shape(5, "Notes Hint 4", None, "{notes}"),
    ])
}

fn code_layout() -> String {
    slide_xml(&[
        text_shape(2, "Title 1", Some(r#"type="title""#), "{title}"),
        text_shape(3, "Code Title 2", None, "codetitle"),
        text_shape(4, "Code 3", None, "{code}"),
        text_shape(5, "Notes Hint 4", None, "{notes}"),
    ])
}

fn slide_layout_part() -> String {
    let (x, y, cx, cy) = LAYOUT_PICTURE_FRAME;
    format!(
        r#"{DECL}<p:sldLayout {NS} type="obj"><p:cSld name="Title and Content"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Picture Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="pic" idx="2"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm></p:spPr></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

fn slide_master_part() -> String {
    format!(
        r#"{DECL}<p:sldMaster {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn notes_master_part() -> String {
    format!(
        r#"{DECL}<p:notesMaster {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/></p:notesMaster>"#
    )
}

fn notes_slide_part(text: &str) -> String {
    format!(
        r#"{DECL}<p:notes {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:notes>"#,
        text_shape(2, "Notes Placeholder 1", Some(r#"type="body" idx="1""#), text)
    )
}

/// Options for [`template`].
#[derive(Debug, Clone)]
pub struct TemplateSpec {
    /// Slide parts in presentation order.
    pub slides: Vec<String>,
    /// Include a notes master.
    pub notes_master: bool,
    /// Attach an existing notes slide to the second slide.
    pub content_notes: bool,
}

impl Default for TemplateSpec {
    fn default() -> Self {
        Self {
            slides: vec![title_layout(), content_layout(), code_layout()],
            notes_master: true,
            content_notes: true,
        }
    }
}

/// The standard three-slide template.
pub fn standard_template() -> Vec<u8> {
    template(&TemplateSpec::default())
}

/// The standard template without a notes master.
pub fn template_without_notes_master() -> Vec<u8> {
    template(&TemplateSpec {
        notes_master: false,
        content_notes: false,
        ..TemplateSpec::default()
    })
}

/// A template with only the first `count` standard slides.
pub fn truncated_template(count: usize) -> Vec<u8> {
    let mut spec = TemplateSpec::default();
    spec.slides.truncate(count);
    spec.content_notes = spec.content_notes && count > 1;
    template(&spec)
}

/// Build a template package.
pub fn template(spec: &TemplateSpec) -> Vec<u8> {
    let mut parts: Vec<(String, String)> = Vec::new();
    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), "presentationml.presentation.main+xml"),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), "presentationml.slideMaster+xml"),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), "presentationml.slideLayout+xml"),
        ("/ppt/theme/theme1.xml".to_string(), "theme+xml"),
    ];

    let mut pres_rels = vec![
        ("rId1".to_string(), "slideMaster", "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), "theme", "theme/theme1.xml".to_string()),
    ];
    let mut sld_ids = String::new();

    for (idx, slide) in spec.slides.iter().enumerate() {
        let n = idx + 1;
        let rel_id = format!("rId{}", 10 + n);
        parts.push((format!("ppt/slides/slide{}.xml", n), slide.clone()));
        overrides.push((format!("/ppt/slides/slide{}.xml", n), "presentationml.slide+xml"));
        pres_rels.push((rel_id.clone(), "slide", format!("slides/slide{}.xml", n)));
        sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + n, rel_id));

        let mut slide_rels = vec![("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")];
        if spec.content_notes && idx == 1 {
            slide_rels.push(("rId2", "notesSlide", "../notesSlides/notesSlide1.xml"));
        }
        parts.push((format!("ppt/slides/_rels/slide{}.xml.rels", n), rels_xml(&slide_rels)));
    }

    let mut notes_master_list = String::new();
    if spec.notes_master {
        pres_rels.push(("rId3".to_string(), "notesMaster", "notesMasters/notesMaster1.xml".to_string()));
        overrides.push(("/ppt/notesMasters/notesMaster1.xml".to_string(), "presentationml.notesMaster+xml"));
        notes_master_list = r#"<p:notesMasterIdLst><p:notesMasterId r:id="rId3"/></p:notesMasterIdLst>"#.to_string();
        parts.push(("ppt/notesMasters/notesMaster1.xml".to_string(), notes_master_part()));
        parts.push((
            "ppt/notesMasters/_rels/notesMaster1.xml.rels".to_string(),
            rels_xml(&[("rId1", "theme", "../theme/theme1.xml")]),
        ));
    }

    if spec.content_notes {
        overrides.push(("/ppt/notesSlides/notesSlide1.xml".to_string(), "presentationml.notesSlide+xml"));
        parts.push((
            "ppt/notesSlides/notesSlide1.xml".to_string(),
            notes_slide_part("Template notes"),
        ));
        parts.push((
            "ppt/notesSlides/_rels/notesSlide1.xml.rels".to_string(),
            rels_xml(&[
                ("rId1", "notesMaster", "../notesMasters/notesMaster1.xml"),
                ("rId2", "slide", "../slides/slide2.xml"),
            ]),
        ));
    }

    let presentation = format!(
        r#"{DECL}<p:presentation {NS} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{notes_master_list}<p:sldIdLst>{sld_ids}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    );
    parts.push(("ppt/presentation.xml".to_string(), presentation));

    let pres_rels: Vec<(&str, &str, &str)> = pres_rels
        .iter()
        .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
        .collect();
    parts.push(("ppt/_rels/presentation.xml.rels".to_string(), rels_xml(&pres_rels)));

    parts.push(("ppt/slideLayouts/slideLayout1.xml".to_string(), slide_layout_part()));
    parts.push((
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
        rels_xml(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
    ));
    parts.push(("ppt/slideMasters/slideMaster1.xml".to_string(), slide_master_part()));
    parts.push((
        "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
        rels_xml(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "theme", "../theme/theme1.xml"),
        ]),
    ));
    parts.push((
        "ppt/theme/theme1.xml".to_string(),
        format!(r#"{DECL}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"/>"#),
    ));
    parts.push((
        "_rels/.rels".to_string(),
        rels_xml(&[("rId1", "officeDocument", "ppt/presentation.xml")]),
    ));

    let override_xml: String = overrides
        .iter()
        .map(|(part, kind)| {
            format!(r#"<Override PartName="{part}" ContentType="{CT_BASE}.{kind}"/>"#)
        })
        .collect();
    let content_types = format!(
        r#"{DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{override_xml}</Types>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    let all = std::iter::once(("[Content_Types].xml".to_string(), content_types)).chain(parts);
    for (name, content) in all {
        zip.start_file(name, options).expect("fixture entry");
        zip.write_all(content.as_bytes()).expect("fixture write");
    }
    zip.finish().expect("fixture zip").into_inner()
}

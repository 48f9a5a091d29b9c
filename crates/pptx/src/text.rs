//! DrawingML text bodies (`p:txBody`) as a small tree of paragraphs and runs.
//!
//! Formatting elements the editor does not touch (`a:pPr`, `a:rPr`, fields,
//! extension lists) are carried through as opaque [`Element`]s.

use crate::xml::{self, Element};
use deck_core::markup::StyledSpan;
use deck_core::{Error, Result};
use quick_xml::events::BytesStart;

/// Font size in hundredths of a point, as DrawingML stores it.
pub fn points(pt: u32) -> u32 {
    pt * 100
}

/// A text body: body properties, list style and paragraphs.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBody {
    tag: BytesStart<'static>,
    pub body_pr: Option<Element>,
    pub lst_style: Option<Element>,
    pub paragraphs: Vec<Paragraph>,
    extra: Vec<Element>,
}

impl TextBody {
    /// Parse a `p:txBody` (or `a:txBody`) element.
    pub fn parse(element: &Element) -> Result<Self> {
        let tag = element
            .tag()
            .cloned()
            .ok_or_else(|| Error::XmlError("text body without start tag".to_string()))?;

        let mut body = Self {
            tag,
            body_pr: None,
            lst_style: None,
            paragraphs: Vec::new(),
            extra: Vec::new(),
        };

        for child in element.children() {
            match child.local_name() {
                b"bodyPr" => body.body_pr = Some(child),
                b"lstStyle" => body.lst_style = Some(child),
                b"p" => body.paragraphs.push(Paragraph::parse(&child)),
                _ => body.extra.push(child),
            }
        }

        Ok(body)
    }

    /// Lower back to an element. An empty body gets one empty paragraph.
    pub fn to_element(&self) -> Element {
        let mut children = Vec::new();
        children.extend(self.body_pr.clone());
        children.extend(self.lst_style.clone());
        if self.paragraphs.is_empty() {
            children.push(Paragraph::default().to_element());
        }
        children.extend(self.paragraphs.iter().map(Paragraph::to_element));
        children.extend(self.extra.iter().cloned());
        Element::from_parts(self.tag.clone(), children)
    }

    /// Plain text, paragraphs separated by `\n`.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether any run's trimmed text equals `token`.
    pub fn has_token(&self, token: &str) -> bool {
        self.runs().any(|r| r.text.trim() == token)
    }

    /// All runs in document order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.paragraphs.iter().flat_map(|p| p.runs())
    }

    /// Mutable runs in document order.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.paragraphs.iter_mut().flat_map(|p| p.runs_mut())
    }

    /// Drop every paragraph but the first and clear the first one's content,
    /// keeping its paragraph properties. Returns that first paragraph.
    pub fn reset(&mut self) -> &mut Paragraph {
        self.paragraphs.truncate(1);
        if self.paragraphs.is_empty() {
            self.paragraphs.push(Paragraph::default());
        }
        let first = &mut self.paragraphs[0];
        first.items.clear();
        first
    }

    /// Resize the shape to fit its text (`a:spAutoFit`).
    pub fn set_shape_autofit(&mut self) {
        let autofit = Element::from_parts(xml::start_tag("a:spAutoFit", &[]), Vec::new());
        self.body_pr = Some(restyle(
            self.body_pr.as_ref(),
            "a:bodyPr",
            &[],
            &["noAutofit", "normAutofit", "spAutoFit"],
            vec![autofit],
            body_pr_rank,
        ));
    }

    /// Whether the body resizes the shape to fit its text.
    pub fn has_shape_autofit(&self) -> bool {
        self.body_pr
            .as_ref()
            .is_some_and(|b| b.find(b"spAutoFit").is_some())
    }
}

/// One `a:p` paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub props: Option<Element>,
    pub items: Vec<TextItem>,
    pub end_props: Option<Element>,
}

/// Content of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum TextItem {
    Run(Run),
    /// Line breaks, fields and anything else kept verbatim.
    Other(Element),
}

impl Paragraph {
    fn parse(element: &Element) -> Self {
        let mut paragraph = Self::default();
        for child in element.children() {
            match child.local_name() {
                b"pPr" => paragraph.props = Some(child),
                b"r" => paragraph.items.push(TextItem::Run(Run::parse(&child))),
                b"endParaRPr" => paragraph.end_props = Some(child),
                _ => paragraph.items.push(TextItem::Other(child)),
            }
        }
        paragraph
    }

    fn to_element(&self) -> Element {
        let mut children = Vec::new();
        children.extend(self.props.clone());
        for item in &self.items {
            children.push(match item {
                TextItem::Run(run) => run.to_element(),
                TextItem::Other(element) => element.clone(),
            });
        }
        children.extend(self.end_props.clone());
        Element::from_parts(xml::start_tag("a:p", &[]), children)
    }

    /// Concatenated text of runs and fields; line breaks become `\n`.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|item| match item {
                TextItem::Run(run) => run.text.clone(),
                TextItem::Other(e) if e.local_name() == b"br" => "\n".to_string(),
                TextItem::Other(e) => e.text(),
            })
            .collect()
    }

    /// Runs of this paragraph.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.items.iter().filter_map(|item| match item {
            TextItem::Run(run) => Some(run),
            TextItem::Other(_) => None,
        })
    }

    /// Mutable runs of this paragraph.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.items.iter_mut().filter_map(|item| match item {
            TextItem::Run(run) => Some(run),
            TextItem::Other(_) => None,
        })
    }

    /// Append a run.
    pub fn push_run(&mut self, run: Run) {
        self.items.push(TextItem::Run(run));
    }

    /// Append an `a:br` line break.
    pub fn push_break(&mut self) {
        self.items.push(TextItem::Other(Element::from_parts(
            xml::start_tag("a:br", &[]),
            Vec::new(),
        )));
    }

    /// Apply paragraph-level formatting to the existing properties.
    pub fn apply_style(&mut self, style: &ParagraphStyle) {
        self.props = Some(style.apply(self.props.as_ref()));
    }

    /// Paragraph level from `a:pPr lvl`, 0 when absent.
    pub fn level(&self) -> u8 {
        self.props
            .as_ref()
            .and_then(Element::tag)
            .and_then(|t| xml::attr(t, "lvl"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

/// One `a:r` run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub props: Option<Element>,
    pub text: String,
}

impl Run {
    /// A run with the given text and no properties.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            props: None,
            text: text.into(),
        }
    }

    /// A run for a markup span, styled with `base` plus the span's emphasis.
    pub fn from_span(span: &StyledSpan, base: &RunStyle) -> Self {
        let mut style = base.clone();
        if span.bold {
            style.bold = Some(true);
        }
        if span.italic {
            style.italic = Some(true);
        }

        let mut run = Self::new(span.text.clone());
        run.apply_style(&style);
        run
    }

    fn parse(element: &Element) -> Self {
        let mut run = Self::default();
        for child in element.children() {
            match child.local_name() {
                b"rPr" => run.props = Some(child),
                b"t" => run.text = child.text(),
                _ => {}
            }
        }
        run
    }

    fn to_element(&self) -> Element {
        let mut t = vec![xml::start("a:t", &[])];
        if !self.text.is_empty() {
            t.push(xml::text(&self.text));
        }
        t.push(xml::end("a:t"));

        let mut children = Vec::new();
        children.extend(self.props.clone());
        children.push(Element::new(t));
        Element::from_parts(xml::start_tag("a:r", &[]), children)
    }

    /// Apply character formatting to the existing properties.
    pub fn apply_style(&mut self, style: &RunStyle) {
        self.props = Some(style.apply(self.props.as_ref()));
    }

    /// Value of an `a:rPr` attribute.
    pub fn prop(&self, key: &str) -> Option<String> {
        self.props.as_ref().and_then(Element::tag).and_then(|t| xml::attr(t, key))
    }

    /// Latin typeface, if set on the run.
    pub fn typeface(&self) -> Option<String> {
        self.props
            .as_ref()
            .and_then(|p| p.find(b"latin"))
            .and_then(|t| xml::attr(t, "typeface"))
    }
}

/// Character formatting. `None` fields leave the existing value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub font: Option<String>,
    /// Hundredths of a point.
    pub size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// `RRGGBB` hex.
    pub color: Option<String>,
}

impl RunStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font(mut self, typeface: &str) -> Self {
        self.font = Some(typeface.to_string());
        self
    }

    pub fn size_pt(mut self, pt: u32) -> Self {
        self.size = Some(points(pt));
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn color(mut self, rgb: &str) -> Self {
        self.color = Some(rgb.to_string());
        self
    }

    /// Build `a:rPr` from `base` with this style applied.
    pub fn apply(&self, base: Option<&Element>) -> Element {
        let mut attrs = Vec::new();
        if let Some(size) = self.size {
            attrs.push(("sz", size.to_string()));
        }
        if let Some(bold) = self.bold {
            attrs.push(("b", flag(bold)));
        }
        if let Some(italic) = self.italic {
            attrs.push(("i", flag(italic)));
        }

        let mut replace = Vec::new();
        let mut add = Vec::new();
        if let Some(color) = &self.color {
            replace.extend(FILL_ELEMENTS);
            add.push(Element::from_parts(
                xml::start_tag("a:solidFill", &[]),
                vec![Element::from_parts(
                    xml::start_tag("a:srgbClr", &[("val", color.as_str())]),
                    Vec::new(),
                )],
            ));
        }
        if let Some(font) = &self.font {
            replace.push("latin");
            add.push(Element::from_parts(
                xml::start_tag("a:latin", &[("typeface", font.as_str())]),
                Vec::new(),
            ));
        }

        restyle(base, "a:rPr", &attrs, &replace, add, run_pr_rank)
    }
}

/// Paragraph formatting. `None` fields leave the existing value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphStyle {
    pub level: Option<u8>,
    /// `a:pPr algn` value, e.g. `just`.
    pub align: Option<String>,
    /// Space after the paragraph, in points.
    pub space_after: Option<u32>,
}

impl ParagraphStyle {
    /// Build `a:pPr` from `base` with this style applied.
    pub fn apply(&self, base: Option<&Element>) -> Element {
        let mut attrs = Vec::new();
        if let Some(level) = self.level {
            attrs.push(("lvl", level.to_string()));
        }
        if let Some(align) = &self.align {
            attrs.push(("algn", align.clone()));
        }

        let mut replace = Vec::new();
        let mut add = Vec::new();
        if let Some(pt) = self.space_after {
            replace.push("spcAft");
            let val = points(pt).to_string();
            add.push(Element::from_parts(
                xml::start_tag("a:spcAft", &[]),
                vec![Element::from_parts(
                    xml::start_tag("a:spcPts", &[("val", val.as_str())]),
                    Vec::new(),
                )],
            ));
        }

        restyle(base, "a:pPr", &attrs, &replace, add, para_pr_rank)
    }
}

const FILL_ELEMENTS: [&str; 6] = [
    "noFill",
    "solidFill",
    "gradFill",
    "blipFill",
    "pattFill",
    "grpFill",
];

fn flag(value: bool) -> String {
    let flag = if value { "1" } else { "0" };
    flag.to_string()
}

/// Rebuild a properties element: set `attrs`, drop children named in
/// `replace`, add `add`, and order children by the schema rank.
fn restyle(
    base: Option<&Element>,
    name: &str,
    attrs: &[(&str, String)],
    replace: &[&str],
    add: Vec<Element>,
    rank: fn(&[u8]) -> u8,
) -> Element {
    let mut tag = match base.and_then(Element::tag) {
        Some(tag) => tag.clone(),
        None => xml::start_tag(name, &[]),
    };
    for (key, value) in attrs {
        tag = xml::with_attr(&tag, key, value);
    }

    let mut children: Vec<Element> = base
        .map(Element::children)
        .unwrap_or_default()
        .into_iter()
        .filter(|c| !replace.iter().any(|r| r.as_bytes() == c.local_name()))
        .collect();
    children.extend(add);
    children.sort_by_key(|c| rank(c.local_name()));

    Element::from_parts(tag, children)
}

fn run_pr_rank(name: &[u8]) -> u8 {
    match name {
        b"ln" => 0,
        b"noFill" | b"solidFill" | b"gradFill" | b"blipFill" | b"pattFill" | b"grpFill" => 1,
        b"effectLst" | b"effectDag" => 2,
        b"highlight" => 3,
        b"uLnTx" | b"uLn" => 4,
        b"uFillTx" | b"uFill" => 5,
        b"latin" => 6,
        b"ea" => 7,
        b"cs" => 8,
        b"sym" => 9,
        b"hlinkClick" => 10,
        b"hlinkMouseOver" => 11,
        b"rtl" => 12,
        _ => 13,
    }
}

fn para_pr_rank(name: &[u8]) -> u8 {
    match name {
        b"lnSpc" => 0,
        b"spcBef" => 1,
        b"spcAft" => 2,
        b"buClrTx" | b"buClr" => 3,
        b"buSzTx" | b"buSzPct" | b"buSzPts" => 4,
        b"buFontTx" | b"buFont" => 5,
        b"buNone" | b"buAutoNum" | b"buChar" | b"buBlip" => 6,
        b"tabLst" => 7,
        b"defRPr" => 8,
        _ => 9,
    }
}

fn body_pr_rank(name: &[u8]) -> u8 {
    match name {
        b"prstTxWarp" => 0,
        b"noAutofit" | b"normAutofit" | b"spAutoFit" => 1,
        b"scene3d" => 2,
        b"sp3d" => 3,
        b"flatTx" => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(xml: &str) -> TextBody {
        TextBody::parse(&Element::new(xml::read_events(xml.as_bytes()).unwrap())).unwrap()
    }

    fn lower(body: &TextBody) -> String {
        String::from_utf8(xml::write_events(&body.to_element().events).unwrap()).unwrap()
    }

    const TWO_PARAGRAPHS: &str = r#"<p:txBody><a:bodyPr><a:normAutofit/></a:bodyPr><a:lstStyle/><a:p><a:pPr lvl="0"/><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{content}</a:t></a:r></a:p><a:p><a:r><a:t>second</a:t></a:r><a:br/><a:r><a:t>line</a:t></a:r><a:endParaRPr lang="en-US"/></a:p></p:txBody>"#;

    #[test]
    fn test_parse_structure() {
        let body = body(TWO_PARAGRAPHS);
        assert_eq!(body.paragraphs.len(), 2);
        assert!(body.has_token("{content}"));
        assert!(!body.has_token("second line"));
        assert_eq!(body.text(), "{content}\nsecond\nline");
        assert!(body.paragraphs[1].end_props.is_some());
    }

    #[test]
    fn test_round_trip_is_identity() {
        assert_eq!(lower(&body(TWO_PARAGRAPHS)), TWO_PARAGRAPHS);
    }

    #[test]
    fn test_reset_keeps_first_props() {
        let mut body = body(TWO_PARAGRAPHS);
        body.reset();
        assert_eq!(body.paragraphs.len(), 1);
        assert!(body.paragraphs[0].items.is_empty());
        assert!(body.paragraphs[0].props.is_some());
    }

    #[test]
    fn test_shape_autofit_replaces_norm() {
        let mut body = body(TWO_PARAGRAPHS);
        body.set_shape_autofit();
        assert!(body.has_shape_autofit());
        assert!(!lower(&body).contains("normAutofit"));
        assert!(lower(&body).contains("<a:bodyPr><a:spAutoFit/></a:bodyPr>"));
    }

    #[test]
    fn test_run_style_keeps_attrs_and_orders_children() {
        let mut body = body(r#"<p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"><a:latin typeface="Arial"/><a:solidFill><a:schemeClr val="tx1"/></a:solidFill></a:rPr><a:t>x</a:t></a:r></a:p></p:txBody>"#);
        let style = RunStyle::new().font("Calibri").size_pt(22).bold(true).color("000000");
        let run = body.runs_mut().next().unwrap();
        run.apply_style(&style);

        assert_eq!(run.prop("lang").as_deref(), Some("en-US"));
        assert_eq!(run.prop("sz").as_deref(), Some("2200"));
        assert_eq!(run.prop("b").as_deref(), Some("1"));
        assert_eq!(run.typeface().as_deref(), Some("Calibri"));

        let xml = lower(&body);
        let fill = xml.find("<a:solidFill><a:srgbClr val=\"000000\"/></a:solidFill>").unwrap();
        let latin = xml.find("<a:latin typeface=\"Calibri\"/>").unwrap();
        assert!(fill < latin);
        assert!(!xml.contains("schemeClr"));
    }

    #[test]
    fn test_paragraph_style() {
        let mut paragraph = Paragraph::default();
        paragraph.apply_style(&ParagraphStyle {
            level: Some(1),
            align: Some("just".to_string()),
            space_after: Some(5),
        });
        assert_eq!(paragraph.level(), 1);

        let xml = String::from_utf8(xml::write_events(&paragraph.to_element().events).unwrap()).unwrap();
        assert_eq!(
            xml,
            r#"<a:p><a:pPr lvl="1" algn="just"><a:spcAft><a:spcPts val="500"/></a:spcAft></a:pPr></a:p>"#
        );
    }

    #[test]
    fn test_run_from_span() {
        let base = RunStyle::new().font("Calibri");
        let run = Run::from_span(&StyledSpan::italic("x"), &base);
        assert_eq!(run.prop("i").as_deref(), Some("1"));
        assert_eq!(run.prop("b"), None);
    }

    #[test]
    fn test_text_is_escaped() {
        let mut paragraph = Paragraph::default();
        paragraph.push_run(Run::new("a < b & c"));
        paragraph.push_break();
        let xml = String::from_utf8(xml::write_events(&paragraph.to_element().events).unwrap()).unwrap();
        assert_eq!(xml, "<a:p><a:r><a:t>a &lt; b &amp; c</a:t></a:r><a:br/></a:p>");
    }
}

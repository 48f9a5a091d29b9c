//! Small helpers over `quick-xml` events shared by the part editors.
//!
//! Parts are tokenized once into owned events; editors then work on index
//! ranges of that token list and write a fresh token list back out.

use deck_core::{Error, Result};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// An event that owns its data.
pub type OwnedEvent = Event<'static>;

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Tokenize an XML part into owned events.
pub fn read_events(xml: &[u8]) -> Result<Vec<OwnedEvent>> {
    let mut reader = Reader::from_reader(xml);
    let mut events = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => events.push(event.into_owned()),
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
    }

    Ok(events)
}

/// Serialize events back into XML bytes.
pub fn write_events<'a, I>(events: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a OwnedEvent>,
{
    let mut writer = Writer::new(Vec::new());
    for event in events {
        writer
            .write_event(event)
            .map_err(|e| Error::XmlError(format!("Failed to write XML: {}", e)))?;
    }
    Ok(writer.into_inner())
}

/// Local name of a start, empty or end event.
pub fn event_local_name(event: &OwnedEvent) -> Option<&[u8]> {
    match event {
        Event::Start(e) | Event::Empty(e) => Some(local_name(e.name().into_inner())),
        Event::End(e) => Some(local_name(e.name().into_inner())),
        _ => None,
    }
}

/// Value of attribute `key` (matched on the full qualified name).
pub fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Copy of `e` with attribute `key` set to `value`, keeping the others.
pub fn with_attr(e: &BytesStart<'_>, key: &str, value: &str) -> BytesStart<'static> {
    let mut out = BytesStart::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for a in e.attributes().flatten() {
        if a.key.as_ref() != key.as_bytes() {
            out.push_attribute(Attribute {
                key: a.key,
                value: a.value,
            });
        }
    }
    out.push_attribute((key, value));
    out
}

/// Build an owned start tag.
pub fn start_tag(name: &str, attrs: &[(&str, &str)]) -> BytesStart<'static> {
    let mut tag = BytesStart::new(name.to_string());
    for &(k, v) in attrs {
        tag.push_attribute((k, v));
    }
    tag
}

/// `<name attrs...>`
pub fn start(name: &str, attrs: &[(&str, &str)]) -> OwnedEvent {
    Event::Start(start_tag(name, attrs))
}

/// `<name attrs.../>`
pub fn empty(name: &str, attrs: &[(&str, &str)]) -> OwnedEvent {
    Event::Empty(start_tag(name, attrs))
}

/// `</name>`
pub fn end(name: &str) -> OwnedEvent {
    Event::End(BytesEnd::new(name.to_string()))
}

/// Escaped character data.
pub fn text(content: &str) -> OwnedEvent {
    Event::Text(BytesText::new(content)).into_owned()
}

/// Index of the event closing the element opened at `start`.
///
/// For an empty element this is `start` itself.
pub fn element_end(events: &[OwnedEvent], start: usize) -> Result<usize> {
    if matches!(events.get(start), Some(Event::Empty(_))) {
        return Ok(start);
    }

    let mut depth = 0usize;
    for (idx, event) in events.iter().enumerate().skip(start) {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }

    Err(Error::XmlError("Unbalanced element".to_string()))
}

/// A complete element subtree held as raw events.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub events: Vec<OwnedEvent>,
}

impl Element {
    /// Wrap events that form exactly one element.
    pub fn new(events: Vec<OwnedEvent>) -> Self {
        Self { events }
    }

    /// Build an element from a start tag and child elements.
    pub fn from_parts(tag: BytesStart<'static>, children: Vec<Element>) -> Self {
        if children.is_empty() {
            return Self::new(vec![Event::Empty(tag)]);
        }

        let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
        let mut events = vec![Event::Start(tag)];
        for child in children {
            events.extend(child.events);
        }
        events.push(end(&name));
        Self::new(events)
    }

    /// The opening tag.
    pub fn tag(&self) -> Option<&BytesStart<'static>> {
        match self.events.first() {
            Some(Event::Start(e)) | Some(Event::Empty(e)) => Some(e),
            _ => None,
        }
    }

    /// Local name of the element.
    pub fn local_name(&self) -> &[u8] {
        self.events.first().and_then(event_local_name).unwrap_or_default()
    }

    /// Direct child elements. Text between children is dropped.
    pub fn children(&self) -> Vec<Element> {
        let mut children = Vec::new();
        if !matches!(self.events.first(), Some(Event::Start(_))) {
            return children;
        }

        let last = self.events.len().saturating_sub(1);
        let mut idx = 1;
        while idx < last {
            match &self.events[idx] {
                Event::Start(_) | Event::Empty(_) => {
                    let end_idx = element_end(&self.events, idx).unwrap_or(last - 1);
                    children.push(Element::new(self.events[idx..=end_idx].to_vec()));
                    idx = end_idx + 1;
                }
                _ => idx += 1,
            }
        }
        children
    }

    /// Concatenated unescaped text of the subtree.
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Text(t) => t.unescape().ok().map(|s| s.into_owned()),
                _ => None,
            })
            .collect()
    }

    /// First descendant (or self) with the given local name.
    pub fn find(&self, name: &[u8]) -> Option<&BytesStart<'static>> {
        self.events.iter().find_map(|e| match e {
            Event::Start(t) | Event::Empty(t) if local_name(t.name().into_inner()) == name => Some(t),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_read_write_round_trip() {
        let xml = br#"<a:p><a:r><a:t>A &amp; B</a:t></a:r><a:br/></a:p>"#;
        let events = read_events(xml).unwrap();
        assert_eq!(write_events(&events).unwrap(), xml.to_vec());
    }

    #[test]
    fn test_element_children_and_text() {
        let events = read_events(b"<a:rPr b=\"1\"><a:solidFill><a:srgbClr val=\"000000\"/></a:solidFill><a:latin typeface=\"Calibri\"/></a:rPr>").unwrap();
        let element = Element::new(events);
        let children = element.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].local_name(), b"solidFill");
        assert_eq!(children[1].local_name(), b"latin");
        assert_eq!(attr(element.tag().unwrap(), "b").as_deref(), Some("1"));
        assert!(element.find(b"srgbClr").is_some());
    }

    #[test]
    fn test_with_attr_replaces() {
        let tag = start_tag("a:pPr", &[("lvl", "0"), ("marL", "10")]);
        let tag = with_attr(&tag, "lvl", "1");
        assert_eq!(attr(&tag, "lvl").as_deref(), Some("1"));
        assert_eq!(attr(&tag, "marL").as_deref(), Some("10"));
    }

    #[test]
    fn test_from_parts_empty() {
        let element = Element::from_parts(start_tag("a:bodyPr", &[]), Vec::new());
        assert_eq!(write_events(&element.events).unwrap(), b"<a:bodyPr/>".to_vec());
    }

    #[test]
    fn test_text_escaping() {
        let events = vec![start("a:t", &[]), text("x < y"), end("a:t")];
        assert_eq!(
            write_events(&events).unwrap(),
            b"<a:t>x &lt; y</a:t>".to_vec()
        );
    }
}

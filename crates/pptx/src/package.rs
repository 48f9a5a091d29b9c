//! An OPC package (the PPTX ZIP container) held fully in memory.

use crate::content_types::{ContentTypes, CONTENT_TYPES_PART};
use crate::rels::{rels_path, Relationships};
use deck_core::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// All parts of a package, keyed by part name (no leading `/`).
///
/// Archive order is kept for parts that came from the input; new parts are
/// appended in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
    order: Vec<String>,
}

impl Package {
    /// Read a package from a ZIP reader.
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut package = Self::default();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            package.put(&name, content);
        }

        if !package.contains(CONTENT_TYPES_PART) {
            return Err(Error::CorruptedFile(format!("missing {}", CONTENT_TYPES_PART)));
        }

        log::debug!("Opened package with {} parts", package.parts.len());
        Ok(package)
    }

    /// Read a package from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::open(Cursor::new(bytes))
    }

    /// Whether `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Raw content of `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Content of `name`, failing when the part is missing.
    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| Error::CorruptedFile(format!("missing part {}", name)))
    }

    /// Insert or replace a part.
    pub fn put(&mut self, name: &str, content: Vec<u8>) {
        if self.parts.insert(name.to_string(), content).is_none() {
            self.order.push(name.to_string());
        }
    }

    /// Remove a part.
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        let removed = self.parts.remove(name)?;
        self.order.retain(|n| n != name);
        Some(removed)
    }

    /// Part names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Parsed relationships of `part`; empty when it has no `.rels` part.
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        match self.get(&rels_path(part)) {
            Some(xml) => Relationships::parse(xml),
            None => Ok(Relationships::new()),
        }
    }

    /// Write the relationships of `part`.
    pub fn put_relationships(&mut self, part: &str, rels: &Relationships) -> Result<()> {
        let xml = rels.to_xml()?;
        self.put(&rels_path(part), xml);
        Ok(())
    }

    /// Parsed `[Content_Types].xml`.
    pub fn content_types(&self) -> Result<ContentTypes> {
        ContentTypes::parse(self.require(CONTENT_TYPES_PART)?)
    }

    /// Write `[Content_Types].xml`.
    pub fn put_content_types(&mut self, types: &ContentTypes) -> Result<()> {
        let xml = types.to_xml()?;
        self.put(CONTENT_TYPES_PART, xml);
        Ok(())
    }

    /// First free part name of the form `{prefix}{n}.{ext}`, counting from 1.
    pub fn next_part_name(&self, prefix: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{}{}.{}", prefix, n, ext))
            .find(|name| !self.contains(name))
            .unwrap_or_default()
    }

    /// Serialize to a writer. `[Content_Types].xml` is always written first.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let names = std::iter::once(CONTENT_TYPES_PART)
            .chain(self.names().filter(|n| *n != CONTENT_TYPES_PART));
        for name in names {
            let Some(content) = self.get(name) else {
                continue;
            };
            zip.start_file(name, options)
                .map_err(|e| Error::ZipError(format!("Failed to add {}: {}", name, e)))?;
            zip.write_all(content)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write(Cursor::new(Vec::new()))?.into_inner())
    }
}

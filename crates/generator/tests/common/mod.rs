//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use deck_core::{Error, ImageRef, Result};
use deck_generator::{ImageFetcher, ImageSearch, TextModel};
use deck_pptx::{EmbeddedImage, ImageOutcome};
use std::cell::RefCell;
use std::rc::Rc;

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake image data";

/// Returns a canned answer and records the prompts it was given.
pub struct ScriptedModel {
    pub answer: String,
    pub prompts: Rc<RefCell<Vec<(String, String)>>>,
}

impl ScriptedModel {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl TextModel for ScriptedModel {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.prompts
            .borrow_mut()
            .push((system.to_string(), user.to_string()));
        Ok(self.answer.clone())
    }
}

/// A model whose provider is down.
pub struct FailingModel;

impl TextModel for FailingModel {
    fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Err(Error::RemoteFetch("Groq returned 503".into()))
    }
}

/// Serves a PNG for URLs under `https://ok/`, 404 for everything else.
pub struct StubFetcher;

impl ImageFetcher for StubFetcher {
    fn fetch(&self, image: &ImageRef) -> ImageOutcome {
        match image {
            ImageRef::Url(url) if url.starts_with("https://ok/") => {
                ImageOutcome::Ready(EmbeddedImage::new(PNG.to_vec()).expect("png magic"))
            }
            _ => ImageOutcome::Failed("404".into()),
        }
    }
}

/// Answers every query with the same links.
pub struct StubSearch(pub Vec<String>);

impl ImageSearch for StubSearch {
    fn search(&self, _query: &str) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

//! Deck generation: model clients, image search and download, deck
//! assembly from a template, and persistence of the rendered files.

pub mod assembler;
pub mod config;
pub mod fetch;
mod http;
pub mod llm;
pub mod search;
pub mod service;
pub mod store;

pub use assembler::{DeckAssembler, RenderedDeck};
pub use config::{GeneratorConfig, ModelKind};
pub use fetch::{FetchResolver, HttpImageFetcher, ImageFetcher};
pub use llm::{GeminiClient, GroqClient, TextModel};
pub use search::{GoogleImageSearch, ImageSearch};
pub use service::{
    enrich_images, file_name_for, request_outline, DeckRequest, DeckService, GeneratedDeck,
};
pub use store::{BlobStore, FsBlobStore, StoredDeck};

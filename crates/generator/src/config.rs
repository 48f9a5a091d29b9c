//! Generator configuration.

use deck_core::expand::{CODE_LAYOUT, CONTENT_LAYOUT, DEFAULT_CHUNK_LINES, TITLE_LAYOUT};
use deck_core::SlideExpander;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "template.pptx";

/// Directory rendered decks are stored in by default.
pub const DEFAULT_STORE_DIR: &str = "decks";

/// Per-call timeout for model requests.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-call timeout for image searches.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Which model provider writes the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    #[default]
    Groq,
    Gemini,
}

impl ModelKind {
    /// Environment variable holding the provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ModelKind::Groq => "GROQ_API_KEY",
            ModelKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Groq => write!(f, "groq"),
            ModelKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ModelKind::Groq),
            "gemini" => Ok(ModelKind::Gemini),
            other => Err(format!("unknown model provider '{}'", other)),
        }
    }
}

/// Paths and knobs for a deck generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub template_path: PathBuf,
    pub store_dir: PathBuf,
    pub chunk_lines: usize,
    pub title_layout: usize,
    pub content_layout: usize,
    pub code_layout: usize,
    pub model_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from(DEFAULT_TEMPLATE),
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            chunk_lines: DEFAULT_CHUNK_LINES,
            title_layout: TITLE_LAYOUT,
            content_layout: CONTENT_LAYOUT,
            code_layout: CODE_LAYOUT,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = path.into();
        self
    }

    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    pub fn with_chunk_lines(mut self, lines: usize) -> Self {
        self.chunk_lines = lines;
        self
    }

    /// Template slide indexes for the title, content and code layouts.
    pub fn with_layouts(mut self, title: usize, content: usize, code: usize) -> Self {
        self.title_layout = title;
        self.content_layout = content;
        self.code_layout = code;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Slide expander matching this configuration.
    pub fn expander(&self) -> SlideExpander {
        SlideExpander::new()
            .with_chunk_lines(self.chunk_lines)
            .with_layouts(self.title_layout, self.content_layout, self.code_layout)
    }
}

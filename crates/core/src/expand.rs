//! Expansion of a logical outline into a physical slide plan.
//!
//! Every logical slide becomes one content slide. A slide with code is
//! followed by one code slide per chunk, so long listings never overflow a
//! single slide.

use crate::render::RenderSlide;
use crate::types::{Outline, SlideOutline};
use serde::Serialize;

/// Default maximum number of code lines on one slide.
pub const DEFAULT_CHUNK_LINES: usize = 25;

/// Template slide used for the title slot.
pub const TITLE_LAYOUT: usize = 0;

/// Template slide used for content slides.
pub const CONTENT_LAYOUT: usize = 1;

/// Template slide used for code slides.
pub const CODE_LAYOUT: usize = 2;

/// How a plan entry is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Title, bullets, notes and image.
    Content,
    /// One chunk of the slide's code.
    Code,
}

/// One chunk of a split code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeChunk {
    /// Code title, suffixed with the part number when split.
    pub title: String,

    /// Chunk lines, each keeping its original line terminator.
    pub snippet: String,
}

impl CodeChunk {
    /// Snippet text without the final line terminator.
    pub fn display_text(&self) -> &str {
        let text = self.snippet.strip_suffix('\n').unwrap_or(&self.snippet);
        text.strip_suffix('\r').unwrap_or(text)
    }
}

/// One physical slide of the plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry<'a> {
    /// Logical slide this entry was expanded from.
    pub source: &'a SlideOutline,

    /// Rendering mode.
    pub mode: RenderMode,

    /// Template slide index to clone for this entry.
    pub layout: usize,

    /// Code chunk, present for code-mode entries only.
    pub chunk: Option<CodeChunk>,
}

/// The physical slide plan: a title slot followed by the expanded entries.
#[derive(Debug, Clone, Serialize)]
pub struct SlidePlan<'a> {
    /// Presentation title for slot 0.
    pub title: &'a str,

    /// Template slide index used for slot 0.
    pub title_layout: usize,

    /// Entries in output order, occupying slots `1..`.
    pub entries: Vec<PlanEntry<'a>>,
}

impl SlidePlan<'_> {
    /// Number of slides the rendered deck will contain.
    pub fn physical_len(&self) -> usize {
        self.entries.len() + 1
    }

    /// Layout index required by each physical slot, title slot first.
    pub fn layouts(&self) -> Vec<usize> {
        std::iter::once(self.title_layout)
            .chain(self.entries.iter().map(|e| e.layout))
            .collect()
    }

    /// Render model of each physical slot, title slot first.
    pub fn render(&self) -> Vec<RenderSlide> {
        std::iter::once(RenderSlide::title_slide(self.title))
            .chain(self.entries.iter().map(RenderSlide::from_plan_entry))
            .collect()
    }
}

/// Expands outlines into physical slide plans.
#[derive(Debug, Clone)]
pub struct SlideExpander {
    /// Maximum code lines per code slide.
    chunk_lines: usize,
    title_layout: usize,
    content_layout: usize,
    code_layout: usize,
}

impl Default for SlideExpander {
    fn default() -> Self {
        Self {
            chunk_lines: DEFAULT_CHUNK_LINES,
            title_layout: TITLE_LAYOUT,
            content_layout: CONTENT_LAYOUT,
            code_layout: CODE_LAYOUT,
        }
    }
}

impl SlideExpander {
    /// Create an expander with 25 code lines per slide and the standard
    /// title/content/code layouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of code lines per slide.
    pub fn with_chunk_lines(mut self, lines: usize) -> Self {
        self.chunk_lines = lines.max(1); // At least 1 line per slide
        self
    }

    /// Use different template slides for the title, content and code layouts.
    pub fn with_layouts(mut self, title: usize, content: usize, code: usize) -> Self {
        self.title_layout = title;
        self.content_layout = content;
        self.code_layout = code;
        self
    }

    /// Maximum code lines per slide.
    pub fn chunk_lines(&self) -> usize {
        self.chunk_lines
    }

    /// Expand `outline` into a physical plan.
    pub fn expand<'a>(&self, outline: &'a Outline) -> SlidePlan<'a> {
        let mut entries = Vec::with_capacity(outline.slides.len());

        for slide in &outline.slides {
            entries.push(PlanEntry {
                source: slide,
                mode: RenderMode::Content,
                layout: self.content_layout,
                chunk: None,
            });

            let Some(code) = slide.code() else {
                continue;
            };

            let chunks = split_code(&code.snippet, self.chunk_lines);
            let total = chunks.len();
            for (idx, snippet) in chunks.into_iter().enumerate() {
                entries.push(PlanEntry {
                    source: slide,
                    mode: RenderMode::Code,
                    layout: self.code_layout,
                    chunk: Some(CodeChunk {
                        title: chunk_title(&code.title, idx + 1, total),
                        snippet,
                    }),
                });
            }
        }

        log::debug!(
            "Expanded {} logical slides into {} plan entries",
            outline.slides.len(),
            entries.len()
        );

        SlidePlan {
            title: &outline.title,
            title_layout: self.title_layout,
            entries,
        }
    }
}

/// Split `snippet` into chunks of at most `max_lines` lines.
///
/// Lines keep their terminators, so concatenating the chunks yields the
/// input unchanged. Boundaries depend only on line counts.
pub fn split_code(snippet: &str, max_lines: usize) -> Vec<String> {
    let max_lines = max_lines.max(1);
    let lines: Vec<&str> = snippet.split_inclusive('\n').collect();
    lines.chunks(max_lines).map(|chunk| chunk.concat()).collect()
}

fn chunk_title(title: &str, part: usize, total: usize) -> String {
    if total <= 1 {
        title.to_string()
    } else if title.is_empty() {
        format!("Part {}", part)
    } else {
        format!("{} (Part {})", title, part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BulletItem;

    fn numbered_lines(n: usize) -> String {
        (1..=n).map(|i| format!("line {}\n", i)).collect()
    }

    #[test]
    fn test_no_code_one_entry_per_slide() {
        let mut outline = Outline::new("Deck");
        for i in 0..4 {
            outline.add_slide(SlideOutline::new(format!("S{}", i)));
        }

        let plan = SlideExpander::new().expand(&outline);
        assert_eq!(plan.entries.len(), 4);
        assert!(plan.entries.iter().all(|e| e.mode == RenderMode::Content));
        let titles: Vec<&str> = plan.entries.iter().map(|e| e.source.title.as_str()).collect();
        assert_eq!(titles, vec!["S0", "S1", "S2", "S3"]);
        assert_eq!(plan.physical_len(), 5);
        assert_eq!(plan.layouts(), vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_code_chunk_count() {
        for (lines, chunk, expected) in [(1, 25, 1), (25, 25, 1), (26, 25, 2), (60, 25, 3), (7, 3, 3)] {
            let mut outline = Outline::new("Deck");
            outline.add_slide(SlideOutline::new("Code").with_code("Listing", numbered_lines(lines)));

            let plan = SlideExpander::new().with_chunk_lines(chunk).expand(&outline);
            assert_eq!(plan.entries.len(), 1 + expected, "{} lines / {}", lines, chunk);
            assert_eq!(plan.entries[0].mode, RenderMode::Content);
            assert!(plan.entries[1..].iter().all(|e| e.mode == RenderMode::Code && e.layout == CODE_LAYOUT));
        }
    }

    #[test]
    fn test_chunks_concatenate_to_original() {
        let snippet = "fn main() {\n    println!(\"hi\");\r\n}\n\n// end";
        for k in 1..6 {
            let chunks = split_code(snippet, k);
            assert_eq!(chunks.concat(), snippet);
            assert!(chunks.iter().all(|c| c.split_inclusive('\n').count() <= k));
        }
    }

    #[test]
    fn test_chunk_titles() {
        let mut outline = Outline::new("Deck");
        outline.add_slide(SlideOutline::new("A").with_code("Loop", numbered_lines(30)));
        outline.add_slide(SlideOutline::new("B").with_code("Short", "x = 1"));

        let plan = SlideExpander::new().expand(&outline);
        let titles: Vec<String> = plan
            .entries
            .iter()
            .filter_map(|e| e.chunk.as_ref().map(|c| c.title.clone()))
            .collect();
        assert_eq!(titles, vec!["Loop (Part 1)", "Loop (Part 2)", "Short"]);
    }

    #[test]
    fn test_empty_content_with_code() {
        let mut outline = Outline::new("Deck");
        outline.add_slide(SlideOutline::new("Only code").with_code("C", "a\nb"));

        let plan = SlideExpander::new().expand(&outline);
        assert_eq!(plan.entries.len(), 2);
        assert_eq!(plan.entries[0].mode, RenderMode::Content);
        assert!(plan.entries[0].source.content.is_empty());
    }

    #[test]
    fn test_blank_code_not_expanded() {
        let mut outline = Outline::new("Deck");
        outline.add_slide(
            SlideOutline::new("S")
                .with_bullet(BulletItem::new("x"))
                .with_code("C", "   "),
        );
        assert_eq!(SlideExpander::new().expand(&outline).entries.len(), 1);
    }

    #[test]
    fn test_chunk_lines_minimum() {
        let expander = SlideExpander::new().with_chunk_lines(0);
        assert_eq!(expander.chunk_lines(), 1);
        assert_eq!(split_code("a\nb", 0), vec!["a\n", "b"]);
    }

    #[test]
    fn test_display_text_drops_final_terminator() {
        let chunk = CodeChunk {
            title: String::new(),
            snippet: "a\nb\r\n".to_string(),
        };
        assert_eq!(chunk.display_text(), "a\nb");
    }
}

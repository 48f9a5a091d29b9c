//! Prompt sent to the text model.
//!
//! The wording is part of the contract with downstream consumers of the
//! outline: field names and the title-first array shape must not drift.

/// System instruction for every outline request.
pub const SYSTEM_PROMPT: &str = "You are a professional presentation writer. Produce a JSON array of slides for the given topic. Return ONLY valid JSON.";

/// Build the user prompt asking for up to `slide_count` slides on `topic`.
pub fn outline_prompt(topic: &str, slide_count: usize) -> String {
    format!(
        r#"Topic: {topic}

Produce up to {slide_count} slides. Return only a valid JSON array where each slide is an object with the following fields:

- title (string) → concise slide heading
- content (array) → 4-6 bullet objects. Each bullet "text" MUST have **keywords in bold** using Markdown.
  - Each bullet may optionally contain a "subpoints" field, which is an array of 1–3 short sub-bullet strings (with **keywords** in bold).
- code (optional object) → include only if a relevant detailed code snippet, syntax, or example improves the slide: {{"title": "short caption", "snippet": "code with lines separated by \n"}}.
- notes (optional string) → speaker notes or explanation (1–3 sentences).
- image_url (optional string) → suggested image/diagram link, or a short image search phrase, if it would support the slide content.

The final output must be ONLY a valid JSON array with first array only with title, no extra text.

Return only a valid JSON array like:

[
  {{ "title": "Your Presentation Title" }},
  {{
    "title": "Introduction",
    "content": [
      {{"text": "**Definition** of AI", "subpoints": ["Focus on **machine learning**", "Includes **deep learning**"]}},
      {{"text": "Impact on **industries**"}}
    ],
    "code": {{"title": "Hello function", "snippet": "def example():\n    return 'Hello, World!'"}},
    "notes": "Speaker notes go here.",
    "image_url": "https://example.com/image.png"
  }}
]"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::parse_outline;

    #[test]
    fn test_prompt_mentions_topic_and_count() {
        let prompt = outline_prompt("Cloud Trends 2025", 8);
        assert!(prompt.starts_with("Topic: Cloud Trends 2025\n"));
        assert!(prompt.contains("Produce up to 8 slides."));
        for field in ["title", "content", "subpoints", "code", "snippet", "notes", "image_url"] {
            assert!(prompt.contains(field), "missing field {}", field);
        }
    }

    #[test]
    fn test_prompt_example_is_a_valid_outline() {
        let prompt = outline_prompt("AI", 2);
        let example = &prompt[prompt.find("like:").unwrap()..];
        let outline = parse_outline(example).unwrap();
        assert_eq!(outline.title, "Your Presentation Title");
        assert_eq!(outline.slides.len(), 1);
        assert_eq!(outline.slides[0].code().unwrap().title, "Hello function");
    }
}

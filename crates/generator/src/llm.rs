//! Text-model clients that write slide outlines.

use crate::http;
use deck_core::{Error, Result};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// A chat-style model that answers one user prompt under a system instruction.
pub trait TextModel {
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Groq's OpenAI-compatible chat completions API.
pub struct GroqClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GroqClient {
    pub const DEFAULT_MODEL: &'static str = "meta-llama/llama-4-maverick-17b-128e-instruct";
    pub const DEFAULT_BASE_URL: &'static str = "https://api.groq.com/openai/v1";

    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http::client(Some(timeout))?,
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl TextModel for GroqClient {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        log::debug!("Requesting outline from Groq model {}", self.model);
        let request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&chat_request(&self.model, system, user));
        chat_response_text(&http::send_json(request, "Groq")?)
    }
}

/// Google's Gemini `generateContent` API.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http::client(Some(timeout))?,
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl TextModel for GeminiClient {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        log::debug!("Requesting outline from Gemini model {}", self.model);
        let request = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&gemini_request(system, user));
        gemini_response_text(&http::send_json(request, "Gemini")?)
    }
}

fn chat_request(model: &str, system: &str, user: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user},
        ],
    })
}

fn chat_response_text(body: &Value) -> Result<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::RemoteFetch("Groq response has no message content".to_string()))
}

fn gemini_request(system: &str, user: &str) -> Value {
    json!({
        "systemInstruction": {"parts": [{"text": system}]},
        "contents": [{"role": "user", "parts": [{"text": user}]}],
    })
}

fn gemini_response_text(body: &Value) -> Result<String> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| Error::RemoteFetch("Gemini response has no candidate parts".to_string()))?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.is_empty() {
        return Err(Error::RemoteFetch(
            "Gemini response has no text parts".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let body = chat_request("m", "sys", "hello");
        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_chat_response_text() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "[{\"title\": \"A\"}]"}}]});
        assert_eq!(chat_response_text(&body).unwrap(), "[{\"title\": \"A\"}]");

        let err = chat_response_text(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, Error::RemoteFetch(_)));
    }

    #[test]
    fn test_gemini_request_sets_system_instruction() {
        let body = gemini_request("sys", "hello");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_gemini_response_joins_parts() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "[{\"title\""}, {"text": ": \"A\"}]"}]}}]});
        assert_eq!(gemini_response_text(&body).unwrap(), "[{\"title\": \"A\"}]");

        assert!(gemini_response_text(&json!({"candidates": []})).is_err());
        let empty = json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]});
        assert!(gemini_response_text(&empty).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = GroqClient::new("key", Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
        assert_eq!(client.model, GroqClient::DEFAULT_MODEL);
    }
}

//! Image search used to turn slide hints into picture URLs.

use crate::config::SEARCH_TIMEOUT;
use crate::http;
use deck_core::Result;
use reqwest::blocking::Client;
use serde_json::Value;

/// Finds image URLs for a free-text query, most relevant first.
pub trait ImageSearch {
    fn search(&self, query: &str) -> Result<Vec<String>>;
}

/// Google Custom Search restricted to images.
pub struct GoogleImageSearch {
    http: Client,
    api_key: String,
    cx: String,
    endpoint: String,
}

impl GoogleImageSearch {
    pub const ENDPOINT: &'static str = "https://www.googleapis.com/customsearch/v1";

    /// Create a client for search engine `cx`.
    pub fn new(api_key: impl Into<String>, cx: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http::client(Some(SEARCH_TIMEOUT))?,
            api_key: api_key.into(),
            cx: cx.into(),
            endpoint: Self::ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl ImageSearch for GoogleImageSearch {
    fn search(&self, query: &str) -> Result<Vec<String>> {
        log::debug!("Searching images for '{}'", query);
        let request = self.http.get(&self.endpoint).query(&[
            ("q", query),
            ("cx", self.cx.as_str()),
            ("searchType", "image"),
            ("key", self.api_key.as_str()),
        ]);
        Ok(result_links(&http::send_json(request, "Image search")?))
    }
}

/// `items[].link` of a search response; no items means no results.
fn result_links(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["link"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_links_in_order() {
        let body = json!({
            "items": [
                {"link": "https://a/1.png", "title": "one"},
                {"title": "no link"},
                {"link": "https://a/2.jpg"}
            ]
        });
        assert_eq!(result_links(&body), vec!["https://a/1.png", "https://a/2.jpg"]);
    }

    #[test]
    fn test_no_items() {
        assert!(result_links(&json!({"searchInformation": {"totalResults": "0"}})).is_empty());
    }
}

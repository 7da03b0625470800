//! Web document loading
//!
//! Fetches each configured page and reduces its HTML to visible text.
//! Loads are sequential; a failed fetch aborts the run with the URL in
//! the error.

use crate::errors::{LuminaError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One fetched page reduced to plain text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub text: String,
}

/// HTTP loader for source pages
pub struct WebLoader {
    client: Client,
}

impl WebLoader {
    /// Create a loader with a bounded request timeout
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("lumina/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Fetch one page and extract its visible text
    pub async fn load(&self, url: &str) -> Result<Document> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LuminaError::FetchError {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(LuminaError::FetchError {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| LuminaError::FetchError {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Document {
            url: url.to_string(),
            text: html_to_text(&body),
        })
    }

    /// Fetch all pages in order, flattening into one document sequence
    pub async fn load_all(&self, urls: &[String]) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(urls.len());
        for url in urls {
            documents.push(self.load(url).await?);
        }
        Ok(documents)
    }
}

impl Default for WebLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce an HTML page to its visible text
///
/// Drops script/style content, strips tags, decodes common entities, and
/// collapses runs of whitespace to single spaces.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len() / 2);
    let mut chars = html.chars();
    let mut skip_until: Option<&'static str> = None;

    while let Some(c) = chars.next() {
        if c != '<' {
            if skip_until.is_none() {
                text.push(c);
            }
            continue;
        }

        // Collect the tag up to '>'
        let mut tag = String::new();
        for t in chars.by_ref() {
            if t == '>' {
                break;
            }
            tag.push(t);
        }
        let tag_lower = tag.to_ascii_lowercase();
        let tag_name = tag_lower
            .trim_start_matches('/')
            .split(|ch: char| ch.is_whitespace() || ch == '/')
            .next()
            .unwrap_or("");

        match skip_until {
            Some(closing) => {
                if tag_lower.starts_with('/') && tag_name == closing {
                    skip_until = None;
                }
            }
            None => {
                if tag_name == "script" && !tag_lower.starts_with('/') {
                    skip_until = Some("script");
                } else if tag_name == "style" && !tag_lower.starts_with('/') {
                    skip_until = Some("style");
                } else {
                    // Tags separate words once stripped
                    text.push(' ');
                }
            }
        }
    }

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

//! Open Library search for books.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{non_empty, LegalDatabase, LookupQuery};
use crate::domain::LookupRecord;

pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

const SEARCH_FIELDS: &str = "title,author_name,publisher,first_publish_year,key";

/// Open Library client
pub struct OpenLibraryClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Default, Deserialize)]
struct Doc {
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    publisher: Vec<String>,
    first_publish_year: Option<i32>,
    key: Option<String>,
}

impl OpenLibraryClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// `author:... title:...` when fields are known, else free text
    fn search_terms(query: &LookupQuery) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(author) = query.author.as_deref().filter(|a| !a.trim().is_empty()) {
            parts.push(format!("author:{}", author));
        }
        if let Some(title) = query.title.as_deref().filter(|t| !t.trim().is_empty()) {
            parts.push(format!("title:{}", title));
        }
        if parts.is_empty() {
            return query.text.clone();
        }
        Some(parts.join(" "))
    }
}

impl Doc {
    fn into_record(self, base: &str) -> LookupRecord {
        let authors: Vec<String> = self.author_name.into_iter().take(2).collect();
        LookupRecord {
            title: non_empty(self.title),
            author: non_empty(Some(authors.join(" & "))),
            publisher: non_empty(self.publisher.into_iter().next()),
            year: self.first_publish_year,
            url: non_empty(self.key).map(|key| format!("{}{}", base, key)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl LegalDatabase for OpenLibraryClient {
    fn name(&self) -> &str {
        "Open Library"
    }

    async fn query(&self, query: &LookupQuery) -> Result<Option<LookupRecord>> {
        let Some(search) = Self::search_terms(query) else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/search.json", self.base()))
            .query(&[("q", search.as_str()), ("limit", "1"), ("fields", SEARCH_FIELDS)])
            .send()
            .await
            .context("Failed to reach Open Library")?;
        if !response.status().is_success() {
            anyhow::bail!("Open Library returned HTTP {}", response.status());
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse Open Library response")?;
        debug!(results = body.docs.len(), "Open Library search");

        Ok(body.docs.into_iter().next().map(|doc| doc.into_record(self.base())))
    }
}

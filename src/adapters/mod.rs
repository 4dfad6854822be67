//! Adapter interfaces for external legal databases.
//!
//! Each database answers a structured query with zero or one best match.
//! "No results" is `Ok(None)`; only transport or decoding failures are
//! errors, and the lookup coordinator turns those into not-found results.

pub mod courtlistener;
pub mod crossref;
pub mod ecfr;
pub mod openlibrary;
pub mod website;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Citation, CitationType, LookupRecord};

pub use courtlistener::CourtListenerClient;
pub use crossref::CrossRefClient;
pub use ecfr::EcfrClient;
pub use openlibrary::OpenLibraryClient;
pub use website::WebsiteClient;

/// Best-effort subset of known fields sent to a database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupQuery {
    pub citation_type: Option<CitationType>,
    pub parties: Vec<String>,
    pub volume: Option<String>,
    pub reporter: Option<String>,
    pub page: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub title_number: Option<String>,
    pub code: Option<String>,
    pub section: Option<String>,
    pub year: Option<i32>,
    pub url: Option<String>,
    /// Free-text search, used when looking for sources for a claim
    pub text: Option<String>,
}

impl LookupQuery {
    pub fn from_citation(citation: &Citation) -> Self {
        let fields = &citation.fields;
        Self {
            citation_type: Some(citation.citation_type),
            parties: fields.parties.clone(),
            volume: fields.volume.clone(),
            reporter: fields.reporter.clone(),
            page: fields.page.clone(),
            author: fields.author.clone(),
            title: fields.title.clone(),
            title_number: fields.title_number.clone(),
            code: fields.code.clone(),
            section: fields.section.clone(),
            year: fields.year,
            url: fields.url.clone(),
            text: None,
        }
    }

    pub fn free_text(citation_type: CitationType, text: impl Into<String>) -> Self {
        Self {
            citation_type: Some(citation_type),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// `347 U.S. 483` when volume, reporter and page are all known
    pub fn reporter_cite(&self) -> Option<String> {
        match (&self.volume, &self.reporter, &self.page) {
            (Some(volume), Some(reporter), Some(page)) => {
                Some(format!("{} {} {}", volume, reporter, page))
            }
            _ => None,
        }
    }

    /// `Brown v. Board` when two parties are known
    pub fn case_name(&self) -> Option<String> {
        match self.parties.as_slice() {
            [first, second, ..] => Some(format!("{} v. {}", first, second)),
            _ => None,
        }
    }

    /// Author and title joined for bibliographic search, or the free text
    pub fn bibliographic(&self) -> Option<String> {
        let parts: Vec<&str> = [self.author.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            self.text.clone()
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Trait for external legal databases
#[async_trait]
pub trait LegalDatabase: Send + Sync {
    /// Human-readable database name, reported as the lookup source
    fn name(&self) -> &str;

    /// Best match for the query, or `None` when nothing matches
    async fn query(&self, query: &LookupQuery) -> Result<Option<LookupRecord>>;
}

/// Shared HTTP client for the database adapters
pub fn http_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Empty strings from upstream JSON become `None`
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

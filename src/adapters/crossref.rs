//! CrossRef works search for law review articles.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{non_empty, LegalDatabase, LookupQuery};
use crate::domain::LookupRecord;

pub const DEFAULT_BASE_URL: &str = "https://api.crossref.org/works";

const SELECT_FIELDS: &str = "title,author,container-title,volume,page,published,DOI,URL";

/// CrossRef REST client
pub struct CrossRefClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    message: WorksMessage,
}

#[derive(Debug, Default, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<Work>,
}

#[derive(Debug, Default, Deserialize)]
struct Work {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<Author>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    volume: Option<String>,
    page: Option<String>,
    published: Option<DateParts>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    pub given: Option<String>,
    pub family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DateParts {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<i32>>,
}

impl CrossRefClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

impl Work {
    fn into_record(self) -> LookupRecord {
        LookupRecord {
            title: non_empty(self.title.into_iter().next()),
            author: non_empty(Some(format_authors(&self.author))),
            journal: non_empty(self.container_title.into_iter().next()),
            volume: non_empty(self.volume),
            // First page of a "2021-2070" range
            page: non_empty(self.page)
                .map(|p| p.split(['-', '\u{2013}']).next().unwrap_or_default().to_string()),
            year: self
                .published
                .and_then(|p| p.date_parts.into_iter().next())
                .and_then(|parts| parts.into_iter().next()),
            doi: non_empty(self.doi),
            url: non_empty(self.url),
            ..Default::default()
        }
    }
}

/// Bluebook author list: `A`, `A & B`, `A, B & C`, or `A et al.` beyond three
pub fn format_authors(authors: &[Author]) -> String {
    let names: Vec<String> = authors
        .iter()
        .take(3)
        .filter_map(|a| {
            match (
                a.given.as_deref().filter(|g| !g.is_empty()),
                a.family.as_deref().filter(|f| !f.is_empty()),
            ) {
                (Some(given), Some(family)) => Some(format!("{} {}", given, family)),
                (None, Some(family)) => Some(family.to_string()),
                _ => None,
            }
        })
        .collect();

    match names.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [one, two] => format!("{} & {}", one, two),
        [first, ..] if authors.len() > 3 => format!("{} et al.", first),
        [init @ .., last] => format!("{} & {}", init.join(", "), last),
    }
}

#[async_trait]
impl LegalDatabase for CrossRefClient {
    fn name(&self) -> &str {
        "CrossRef"
    }

    async fn query(&self, query: &LookupQuery) -> Result<Option<LookupRecord>> {
        let Some(search) = query.bibliographic() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("query.bibliographic", search.as_str()),
                ("rows", "1"),
                ("select", SELECT_FIELDS),
            ])
            .send()
            .await
            .context("Failed to reach CrossRef")?;
        if !response.status().is_success() {
            anyhow::bail!("CrossRef returned HTTP {}", response.status());
        }

        let body: WorksResponse = response
            .json()
            .await
            .context("Failed to parse CrossRef response")?;
        debug!(results = body.message.items.len(), "CrossRef search");

        Ok(body.message.items.into_iter().next().map(Work::into_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(given: &str, family: &str) -> Author {
        Author {
            given: Some(given.to_string()),
            family: Some(family.to_string()),
        }
    }

    #[test]
    fn test_format_authors() {
        assert_eq!(format_authors(&[]), "");
        assert_eq!(format_authors(&[author("Cass R.", "Sunstein")]), "Cass R. Sunstein");
        assert_eq!(
            format_authors(&[author("Jane", "Roe"), author("John", "Doe")]),
            "Jane Roe & John Doe"
        );
        assert_eq!(
            format_authors(&[author("A", "One"), author("B", "Two"), author("C", "Three")]),
            "A One, B Two & C Three"
        );
        assert_eq!(
            format_authors(&[
                author("A", "One"),
                author("B", "Two"),
                author("C", "Three"),
                author("D", "Four")
            ]),
            "A One et al."
        );
    }

    #[test]
    fn test_work_into_record() {
        let body: WorksResponse = serde_json::from_value(serde_json::json!({
            "message": {
                "items": [{
                    "title": ["On the Expressive Function of Law"],
                    "author": [{"given": "Cass R.", "family": "Sunstein"}],
                    "container-title": ["University of Pennsylvania Law Review"],
                    "volume": "144",
                    "page": "2021-2053",
                    "published": {"date-parts": [[1996, 5]]},
                    "DOI": "10.2307/3312647"
                }]
            }
        }))
        .unwrap();

        let record = body.message.items.into_iter().next().unwrap().into_record();
        assert_eq!(record.author.as_deref(), Some("Cass R. Sunstein"));
        assert_eq!(record.journal.as_deref(), Some("University of Pennsylvania Law Review"));
        assert_eq!(record.page.as_deref(), Some("2021"));
        assert_eq!(record.year, Some(1996));
        assert_eq!(record.url, None);
    }
}

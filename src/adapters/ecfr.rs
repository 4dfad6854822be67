//! eCFR versioner lookups for regulations, plus Cornell LII links for
//! U.S. Code sections.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{non_empty, LegalDatabase, LookupQuery};
use crate::domain::{CitationType, LookupRecord};

pub const DEFAULT_BASE_URL: &str = "https://www.ecfr.gov/api/versioner/v1";

/// eCFR client
pub struct EcfrClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct VersionsResponse {
    #[serde(default)]
    content_versions: Vec<ContentVersion>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentVersion {
    identifier: Option<String>,
    name: Option<String>,
    date: Option<String>,
}

impl EcfrClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn versions_url(&self, title: &str) -> String {
        format!(
            "{}/versions/title-{}.json",
            self.base_url.trim_end_matches('/'),
            title
        )
    }

    async fn regulation(&self, title: &str, section: &str) -> Result<Option<LookupRecord>> {
        let response = self
            .client
            .get(self.versions_url(title))
            .query(&[("section", section)])
            .send()
            .await
            .context("Failed to reach eCFR")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("eCFR returned HTTP {}", response.status());
        }

        let body: VersionsResponse = response
            .json()
            .await
            .context("Failed to parse eCFR response")?;
        debug!(versions = body.content_versions.len(), "eCFR versions");

        // Versions are listed oldest first
        Ok(body
            .content_versions
            .into_iter()
            .last()
            .map(|version| version.into_record(title, section)))
    }
}

impl ContentVersion {
    fn into_record(self, title: &str, section: &str) -> LookupRecord {
        LookupRecord {
            title_number: Some(title.to_string()),
            section: non_empty(self.identifier).or_else(|| Some(section.to_string())),
            title: non_empty(self.name),
            year: self
                .date
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse().ok()),
            url: Some(format!(
                "https://www.ecfr.gov/current/title-{}/section-{}",
                title, section
            )),
            ..Default::default()
        }
    }
}

/// Link record for a U.S. Code section; needs no network
pub fn us_code_record(title: &str, section: &str) -> LookupRecord {
    LookupRecord {
        title_number: Some(title.to_string()),
        section: Some(section.to_string()),
        url: Some(format!(
            "https://www.law.cornell.edu/uscode/text/{}/{}",
            title, section
        )),
        ..Default::default()
    }
}

#[async_trait]
impl LegalDatabase for EcfrClient {
    fn name(&self) -> &str {
        "eCFR"
    }

    async fn query(&self, query: &LookupQuery) -> Result<Option<LookupRecord>> {
        let (Some(title), Some(section)) = (query.title_number.as_deref(), query.section.as_deref())
        else {
            return Ok(None);
        };

        match (query.citation_type, query.code.as_deref()) {
            (Some(CitationType::Statute), Some("U.S.C.")) => Ok(Some(us_code_record(title, section))),
            (Some(CitationType::Regulation), _) => self.regulation(title, section).await,
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EcfrClient {
        EcfrClient::new(DEFAULT_BASE_URL, reqwest::Client::new())
    }

    #[test]
    fn test_versions_url() {
        assert_eq!(
            client().versions_url("40"),
            "https://www.ecfr.gov/api/versioner/v1/versions/title-40.json"
        );
    }

    #[tokio::test]
    async fn test_us_code_link_without_network() {
        let query = LookupQuery {
            citation_type: Some(CitationType::Statute),
            title_number: Some("42".into()),
            code: Some("U.S.C.".into()),
            section: Some("1983".into()),
            ..Default::default()
        };
        let record = client().query(&query).await.unwrap().unwrap();
        assert_eq!(
            record.url.as_deref(),
            Some("https://www.law.cornell.edu/uscode/text/42/1983")
        );
    }

    #[tokio::test]
    async fn test_incomplete_statute_is_not_found() {
        let query = LookupQuery {
            citation_type: Some(CitationType::Statute),
            code: Some("Cal. Civ. Code".into()),
            section: Some("1714".into()),
            ..Default::default()
        };
        assert!(client().query(&query).await.unwrap().is_none());
    }

    #[test]
    fn test_version_into_record() {
        let body: VersionsResponse = serde_json::from_value(serde_json::json!({
            "content_versions": [
                {"identifier": "1.1", "name": "§ 1.1 Definitions.", "date": "2017-01-19"},
                {"identifier": "1.1", "name": "§ 1.1 Definitions.", "date": "2021-03-01"}
            ]
        }))
        .unwrap();
        let record = body
            .content_versions
            .into_iter()
            .last()
            .unwrap()
            .into_record("40", "1.1");
        assert_eq!(record.year, Some(2021));
        assert_eq!(record.section.as_deref(), Some("1.1"));
    }
}

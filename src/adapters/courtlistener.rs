//! CourtListener case-law search.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::{non_empty, LegalDatabase, LookupQuery};
use crate::domain::LookupRecord;

pub const DEFAULT_BASE_URL: &str = "https://www.courtlistener.com/api/rest/v3";

static REPORTER_CITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+([A-Za-z0-9.\s']+?)\s+(\d+)$").unwrap());

/// CourtListener REST client
pub struct CourtListenerClient {
    base_url: String,
    /// Optional API token (anonymous access is rate limited)
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(rename = "caseName")]
    case_name: Option<String>,
    #[serde(default)]
    citation: Vec<String>,
    court: Option<String>,
    #[serde(rename = "dateFiled")]
    date_filed: Option<String>,
    absolute_url: Option<String>,
}

impl CourtListenerClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            client,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search/", self.base_url.trim_end_matches('/'))
    }

    /// Search parameters: the reporter cite when known, else the case name
    fn params(query: &LookupQuery) -> Option<Vec<(&'static str, String)>> {
        let mut params = vec![("type", "o".to_string()), ("order_by", "score desc".to_string())];
        if let Some(cite) = query.reporter_cite() {
            params.push(("citation", cite));
        } else if let Some(name) = query.case_name() {
            params.push(("case_name", name));
        } else if let Some(text) = &query.text {
            params.push(("q", text.clone()));
        } else {
            return None;
        }
        Some(params)
    }
}

impl SearchResult {
    fn into_record(self) -> LookupRecord {
        let mut record = LookupRecord {
            case_name: non_empty(self.case_name),
            court: non_empty(self.court),
            year: self
                .date_filed
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse().ok()),
            url: non_empty(self.absolute_url)
                .map(|path| format!("https://www.courtlistener.com{}", path)),
            ..Default::default()
        };

        if let Some(caps) = self
            .citation
            .iter()
            .find_map(|c| REPORTER_CITE.captures(c.trim()))
        {
            record.volume = Some(caps[1].to_string());
            record.reporter = Some(caps[2].trim().to_string());
            record.page = Some(caps[3].to_string());
        }
        record
    }
}

#[async_trait]
impl LegalDatabase for CourtListenerClient {
    fn name(&self) -> &str {
        "CourtListener"
    }

    async fn query(&self, query: &LookupQuery) -> Result<Option<LookupRecord>> {
        let Some(params) = Self::params(query) else {
            return Ok(None);
        };

        let mut request = self.client.get(self.search_url()).query(&params);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {}", token));
        }

        let response = request
            .send()
            .await
            .context("Failed to reach CourtListener")?;
        if !response.status().is_success() {
            anyhow::bail!("CourtListener returned HTTP {}", response.status());
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse CourtListener response")?;
        debug!(results = body.results.len(), "CourtListener search");

        Ok(body.results.into_iter().next().map(SearchResult::into_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let client = CourtListenerClient::new(
            "https://example.test/api/",
            None,
            reqwest::Client::new(),
        );
        assert_eq!(client.search_url(), "https://example.test/api/search/");
    }

    #[test]
    fn test_params_prefer_reporter_cite() {
        let query = LookupQuery {
            parties: vec!["Brown".into(), "Board".into()],
            volume: Some("347".into()),
            reporter: Some("U.S.".into()),
            page: Some("483".into()),
            ..Default::default()
        };
        let params = CourtListenerClient::params(&query).unwrap();
        assert!(params.contains(&("citation", "347 U.S. 483".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "case_name"));

        assert!(CourtListenerClient::params(&LookupQuery::default()).is_none());
    }

    #[test]
    fn test_result_into_record() {
        let body: SearchResponse = serde_json::from_value(serde_json::json!({
            "results": [{
                "caseName": "Brown v. Board of Education",
                "citation": ["347 U.S. 483", "74 S. Ct. 686"],
                "court": "Supreme Court of the United States",
                "dateFiled": "1954-05-17",
                "absolute_url": "/opinion/105221/brown-v-board-of-education/"
            }]
        }))
        .unwrap();

        let record = body.results.into_iter().next().unwrap().into_record();
        assert_eq!(record.case_name.as_deref(), Some("Brown v. Board of Education"));
        assert_eq!(record.volume.as_deref(), Some("347"));
        assert_eq!(record.reporter.as_deref(), Some("U.S."));
        assert_eq!(record.page.as_deref(), Some("483"));
        assert_eq!(record.year, Some(1954));
        assert_eq!(
            record.url.as_deref(),
            Some("https://www.courtlistener.com/opinion/105221/brown-v-board-of-education/")
        );
    }
}

//! Page metadata for website citations.
//!
//! Fetches the cited URL and reads the `<title>` element and the common
//! `<meta>` tags (author, publication date, site name).

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use super::{non_empty, LegalDatabase, LookupQuery};
use crate::domain::LookupRecord;

/// Bytes of the page scanned for metadata; `<head>` sits at the top
const MAX_SCANNED_BYTES: usize = 256 * 1024;

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title[^>]*>([^<]+)</title>").unwrap());

static META: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\s[^>]*>").unwrap());

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").unwrap());

/// Website metadata client
pub struct WebsiteClient {
    client: reqwest::Client,
}

impl WebsiteClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LegalDatabase for WebsiteClient {
    fn name(&self) -> &str {
        "URL Metadata"
    }

    async fn query(&self, query: &LookupQuery) -> Result<Option<LookupRecord>> {
        let Some(url) = non_empty(query.url.clone()) else {
            return Ok(None);
        };
        if Url::parse(&url).is_err() {
            return Ok(None);
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        if !response.status().is_success() {
            debug!(status = %response.status(), url = %url, "Page not available");
            return Ok(None);
        }

        let html = response.text().await.context("Failed to read page body")?;
        let record = page_record(&url, &html);
        Ok(record.title.is_some().then_some(record))
    }
}

/// Metadata from a fetched page. The site name falls back to the host.
pub fn page_record(url: &str, html: &str) -> LookupRecord {
    let mut end = html.len().min(MAX_SCANNED_BYTES);
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    let head = &html[..end];

    let mut og_title = None;
    let mut author = None;
    let mut published = None;
    let mut site_name = None;

    for tag in META.find_iter(head) {
        let mut key = None;
        let mut content = None;
        for attr in ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = attr.get(2).or_else(|| attr.get(3)).map(|m| m.as_str());
            match attr[1].to_lowercase().as_str() {
                "name" | "property" => key = value.map(str::to_lowercase),
                "content" => content = value.map(decode_entities),
                _ => {}
            }
        }
        let (Some(key), Some(content)) = (key, content) else {
            continue;
        };
        let slot = match key.as_str() {
            "og:title" => &mut og_title,
            "author" | "article:author" => &mut author,
            "article:published_time" | "date" | "dc.date" => &mut published,
            "og:site_name" => &mut site_name,
            _ => continue,
        };
        if slot.is_none() {
            *slot = non_empty(Some(content));
        }
    }

    let title = TITLE
        .captures(head)
        .and_then(|c| non_empty(Some(decode_entities(&c[1]))))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .or(og_title);
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()));

    LookupRecord {
        title,
        author,
        year: published
            .as_deref()
            .and_then(|d| YEAR.find(d))
            .and_then(|m| m.as_str().parse().ok()),
        publisher: site_name.or(host),
        url: Some(url.to_string()),
        ..Default::default()
    }
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <title>Guidance on
          Workplace Safety &amp; Health</title>
        <meta content="Jane Roe" name="author">
        <meta property="article:published_time" content="2020-03-05T10:00:00Z" />
        <meta property='og:site_name' content='Department of Labor'>
        </head><body>ignored</body></html>"#;

    #[test]
    fn test_page_record_reads_head() {
        let record = page_record("https://www.dol.gov/guidance", PAGE);
        assert_eq!(record.title.as_deref(), Some("Guidance on Workplace Safety & Health"));
        assert_eq!(record.author.as_deref(), Some("Jane Roe"));
        assert_eq!(record.year, Some(2020));
        assert_eq!(record.publisher.as_deref(), Some("Department of Labor"));
        assert_eq!(record.url.as_deref(), Some("https://www.dol.gov/guidance"));
    }

    #[test]
    fn test_site_name_falls_back_to_host() {
        let html = r#"<head><meta property="og:title" content="Annual Report"></head>"#;
        let record = page_record("https://www.example.org/report", html);
        assert_eq!(record.title.as_deref(), Some("Annual Report"));
        assert_eq!(record.publisher.as_deref(), Some("example.org"));
        assert_eq!(record.author, None);
        assert_eq!(record.year, None);
    }

    #[tokio::test]
    async fn test_query_without_url_is_none() {
        let client = WebsiteClient::new(reqwest::Client::new());
        assert_eq!(client.query(&LookupQuery::default()).await.unwrap(), None);
        let query = LookupQuery {
            url: Some("not a url".into()),
            ..Default::default()
        };
        assert_eq!(client.query(&query).await.unwrap(), None);
    }
}

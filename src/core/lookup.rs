//! Lookup coordination.
//!
//! Routes each citation to the database for its type, bounds every call
//! with its own timeout, and folds the answer back into the citation
//! without overwriting anything already present. A lookup never fails the
//! analysis: unreachable databases, timeouts and empty answers all come
//! back as `found == false`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::adapters::{
    courtlistener, crossref, ecfr, http_client, openlibrary, CourtListenerClient, CrossRefClient,
    EcfrClient, LegalDatabase, LookupQuery, OpenLibraryClient, WebsiteClient,
};
use crate::domain::{
    Citation, CitationType, ClaimType, Field, LookupRecord, LookupResult, UnsourcedClaim,
};
use crate::normalize::{split_parties, Normalizer};

fn default_enabled() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("bluebook/{} (citation checker)", env!("CARGO_PKG_VERSION"))
}

fn default_courtlistener_url() -> String {
    courtlistener::DEFAULT_BASE_URL.to_string()
}

fn default_crossref_url() -> String {
    crossref::DEFAULT_BASE_URL.to_string()
}

fn default_openlibrary_url() -> String {
    openlibrary::DEFAULT_BASE_URL.to_string()
}

fn default_ecfr_url() -> String {
    ecfr::DEFAULT_BASE_URL.to_string()
}

/// External database settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-lookup timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_courtlistener_url")]
    pub courtlistener_url: String,

    #[serde(default, skip_serializing)]
    pub courtlistener_token: Option<String>,

    #[serde(default = "default_crossref_url")]
    pub crossref_url: String,

    #[serde(default = "default_openlibrary_url")]
    pub openlibrary_url: String,

    #[serde(default = "default_ecfr_url")]
    pub ecfr_url: String,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            courtlistener_url: default_courtlistener_url(),
            courtlistener_token: None,
            crossref_url: default_crossref_url(),
            openlibrary_url: default_openlibrary_url(),
            ecfr_url: default_ecfr_url(),
        }
    }
}

impl LookupSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Routes citations to external databases and merges what they return
#[derive(Clone)]
pub struct LookupCoordinator {
    case_law: Option<Arc<dyn LegalDatabase>>,
    articles: Option<Arc<dyn LegalDatabase>>,
    books: Option<Arc<dyn LegalDatabase>>,
    regulations: Option<Arc<dyn LegalDatabase>>,
    websites: Option<Arc<dyn LegalDatabase>>,
    timeout: Duration,
    max_concurrent: usize,
    normalizer: Normalizer,
}

impl LookupCoordinator {
    /// Coordinator with no databases attached; every lookup is not-found
    pub fn new(timeout: Duration) -> Self {
        Self {
            case_law: None,
            articles: None,
            books: None,
            regulations: None,
            websites: None,
            timeout,
            max_concurrent: 8,
            normalizer: Normalizer::new(),
        }
    }

    /// Coordinator wired to the public databases
    pub fn from_settings(settings: &LookupSettings) -> Result<Self> {
        let client = http_client(&settings.user_agent, settings.timeout())?;
        Ok(Self::new(settings.timeout())
            .with_case_law(Arc::new(CourtListenerClient::new(
                settings.courtlistener_url.clone(),
                settings.courtlistener_token.clone(),
                client.clone(),
            )))
            .with_articles(Arc::new(CrossRefClient::new(
                settings.crossref_url.clone(),
                client.clone(),
            )))
            .with_books(Arc::new(OpenLibraryClient::new(
                settings.openlibrary_url.clone(),
                client.clone(),
            )))
            .with_regulations(Arc::new(EcfrClient::new(
                settings.ecfr_url.clone(),
                client.clone(),
            )))
            .with_websites(Arc::new(WebsiteClient::new(client))))
    }

    pub fn with_case_law(mut self, database: Arc<dyn LegalDatabase>) -> Self {
        self.case_law = Some(database);
        self
    }

    pub fn with_articles(mut self, database: Arc<dyn LegalDatabase>) -> Self {
        self.articles = Some(database);
        self
    }

    pub fn with_books(mut self, database: Arc<dyn LegalDatabase>) -> Self {
        self.books = Some(database);
        self
    }

    pub fn with_regulations(mut self, database: Arc<dyn LegalDatabase>) -> Self {
        self.regulations = Some(database);
        self
    }

    pub fn with_websites(mut self, database: Arc<dyn LegalDatabase>) -> Self {
        self.websites = Some(database);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Database responsible for a citation type
    pub fn database_for(&self, citation_type: CitationType) -> Option<&Arc<dyn LegalDatabase>> {
        match citation_type {
            CitationType::Case => self.case_law.as_ref(),
            CitationType::LawReview => self.articles.as_ref(),
            CitationType::Book => self.books.as_ref(),
            CitationType::Statute | CitationType::Regulation => self.regulations.as_ref(),
            CitationType::Website => self.websites.as_ref(),
            CitationType::Other => None,
        }
    }

    /// Whether a lookup would be issued for this citation
    pub fn wants_lookup(&self, citation: &Citation) -> bool {
        !citation.is_short_form() && self.database_for(citation.citation_type).is_some()
    }

    /// Issue one lookup for a citation
    pub async fn lookup(&self, citation: &Citation) -> LookupResult {
        if citation.is_short_form() {
            return LookupResult::not_found(None);
        }
        match self.database_for(citation.citation_type) {
            Some(database) => {
                run_lookup(
                    Arc::clone(database),
                    LookupQuery::from_citation(citation),
                    self.timeout,
                )
                .await
            }
            None => LookupResult::not_found(None),
        }
    }

    /// Record the result on the citation, fill its gaps, and regrade
    pub fn apply(&self, mut citation: Citation, result: LookupResult) -> Citation {
        if let (true, Some(record)) = (result.found, result.data.as_ref()) {
            fill_missing(&mut citation, record);
        }
        citation.lookup_results = Some(result);
        self.normalizer.grade(&mut citation);
        citation
    }

    /// Look up and apply
    pub async fn complete(&self, citation: Citation) -> Citation {
        let result = self.lookup(&citation).await;
        self.apply(citation, result)
    }

    /// Look up many citations concurrently, at most `max_lookups` of them.
    /// Output order matches input order.
    pub async fn complete_all(&self, citations: Vec<Citation>, max_lookups: usize) -> Vec<Citation> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let mut issued = 0;

        for (index, citation) in citations.iter().enumerate() {
            if issued >= max_lookups {
                warn!(max_lookups, "Lookup limit reached; remaining citations left as extracted");
                break;
            }
            let Some(database) = self.database_for(citation.citation_type) else {
                continue;
            };
            if citation.is_short_form() {
                continue;
            }
            issued += 1;

            let database = Arc::clone(database);
            let query = LookupQuery::from_citation(citation);
            let timeout = self.timeout;
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, run_lookup(database, query, timeout).await)
            });
        }

        let mut results: Vec<Option<LookupResult>> = vec![None; citations.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!(error = %e, "Lookup task failed"),
            }
        }

        let found = results.iter().flatten().filter(|r| r.found).count();
        info!(issued, found, "Lookups finished");

        citations
            .into_iter()
            .zip(results)
            .map(|(citation, result)| match result {
                Some(result) => self.apply(citation, result),
                None => citation,
            })
            .collect()
    }

    /// Search for a source that could support an unsourced claim
    pub async fn suggest_sources(&self, claim: &UnsourcedClaim) -> LookupResult {
        let terms: Vec<&str> = claim
            .suggested_search_terms
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        if terms.is_empty() {
            return LookupResult::not_found(None);
        }

        let citation_type = match claim.claim_type {
            ClaimType::Legal | ClaimType::Quotation => CitationType::Case,
            ClaimType::Statistical | ClaimType::Factual => CitationType::LawReview,
        };
        match self.database_for(citation_type) {
            Some(database) => {
                let query = LookupQuery::free_text(citation_type, terms.join(" "));
                run_lookup(Arc::clone(database), query, self.timeout).await
            }
            None => LookupResult::not_found(None),
        }
    }
}

/// One bounded call; every failure becomes a not-found result
async fn run_lookup(
    database: Arc<dyn LegalDatabase>,
    query: LookupQuery,
    timeout: Duration,
) -> LookupResult {
    let source = database.name().to_string();
    match tokio::time::timeout(timeout, database.query(&query)).await {
        Ok(Ok(Some(record))) => {
            debug!(source = %source, "Lookup matched");
            LookupResult::found(source, record)
        }
        Ok(Ok(None)) => {
            debug!(source = %source, "Lookup found nothing");
            LookupResult::not_found(Some(&source))
        }
        Ok(Err(e)) => {
            warn!(source = %source, error = %e, "Lookup failed");
            LookupResult::failed(Some(&source), format!("{:#}", e))
        }
        Err(_) => {
            warn!(source = %source, timeout_secs = timeout.as_secs_f64(), "Lookup timed out");
            LookupResult::failed(
                Some(&source),
                format!("timed out after {:.1}s", timeout.as_secs_f64()),
            )
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        if let Some(value) = value {
            *slot = Some(value.clone());
        }
    }
}

fn fill_text(slot: &mut Option<String>, value: &Option<String>) {
    if slot.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true) {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            *slot = Some(value.trim().to_string());
        }
    }
}

/// Copy record values into empty fields only
pub fn fill_missing(citation: &mut Citation, record: &LookupRecord) {
    let citation_type = citation.citation_type;
    let fields = &mut citation.fields;

    match citation_type {
        CitationType::Case => {
            if !fields.has(Field::Parties) {
                if let Some(name) = &record.case_name {
                    let parties = split_parties(name);
                    if parties.len() >= 2 {
                        fields.parties = parties;
                    }
                }
            }
            fill_text(&mut fields.volume, &record.volume);
            fill_text(&mut fields.reporter, &record.reporter);
            fill_text(&mut fields.page, &record.page);
            fill_text(&mut fields.court, &record.court);
        }
        CitationType::LawReview => {
            fill_text(&mut fields.author, &record.author);
            fill_text(&mut fields.title, &record.title);
            fill_text(&mut fields.journal, &record.journal);
            fill_text(&mut fields.volume, &record.volume);
            fill_text(&mut fields.page, &record.page);
        }
        CitationType::Book => {
            fill_text(&mut fields.author, &record.author);
            fill_text(&mut fields.title, &record.title);
            fill_text(&mut fields.publisher, &record.publisher);
        }
        CitationType::Statute | CitationType::Regulation => {
            fill_text(&mut fields.title_number, &record.title_number);
            fill_text(&mut fields.section, &record.section);
        }
        CitationType::Website => {
            fill_text(&mut fields.title, &record.title);
            fill_text(&mut fields.author, &record.author);
        }
        CitationType::Other => {}
    }

    fill(&mut fields.year, &record.year);
    fill_text(&mut fields.url, &record.url);

    // Filled values cannot leave a structural gap open
    citation.structural_gaps.retain(|gap| !citation.fields.has(*gap));
}

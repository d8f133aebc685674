//! PubMed literature lookup over NCBI E-utilities.
//!
//! A lookup is one `esearch` followed by one `efetch` per PMID, in the order
//! the search returned them. It is all-or-nothing: the first failure discards
//! whatever was already fetched and the caller gets [`LookupOutcome::Failed`].

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LookupError;

/// Sent as the `tool` parameter so NCBI can identify the caller.
pub const TOOL_NAME: &str = "pubmed-chat";

/// One retrieved PubMed entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub pmid: String,
    pub abstract_text: String,
}

/// Result of a whole lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(Vec<Record>),
    /// Description of the failure that aborted the lookup.
    Failed(String),
}

#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// PMIDs matching `query`, at most `max`, in service relevance order.
    async fn search(&self, query: &str, max: usize) -> Result<Vec<String>, LookupError>;

    /// Plain-text abstract for one PMID.
    async fn fetch_abstract(&self, pmid: &str) -> Result<String, LookupError>;
}

static PMID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("invalid pmid regex"));

fn check_pmid(pmid: &str) -> Result<(), LookupError> {
    if PMID_RE.is_match(pmid) {
        Ok(())
    } else {
        Err(LookupError::InvalidId(pmid.to_string()))
    }
}

/// Runs search then sequential fetches, folding any error into `Failed`.
pub async fn lookup(source: &dyn LiteratureSource, query: &str, max_results: usize) -> LookupOutcome {
    match try_lookup(source, query, max_results).await {
        Ok(records) => {
            debug!(count = records.len(), "pubmed lookup finished");
            LookupOutcome::Found(records)
        }
        Err(err) => {
            warn!(error = %err, "pubmed lookup failed");
            LookupOutcome::Failed(err.to_string())
        }
    }
}

async fn try_lookup(
    source: &dyn LiteratureSource,
    query: &str,
    max_results: usize,
) -> Result<Vec<Record>, LookupError> {
    let ids = source.search(query, max_results).await?;
    let mut records = Vec::with_capacity(ids.len());
    for pmid in ids {
        check_pmid(&pmid)?;
        let abstract_text = source.fetch_abstract(&pmid).await?;
        records.push(Record {
            pmid,
            abstract_text,
        });
    }
    Ok(records)
}

#[derive(Deserialize)]
struct SearchEnvelope {
    esearchresult: SearchResult,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Option<Vec<String>>,
    #[serde(default, rename = "ERROR")]
    error: Option<String>,
}

fn parse_search(body: &str) -> Result<Vec<String>, LookupError> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    if let Some(err) = envelope.esearchresult.error {
        return Err(LookupError::Malformed(err));
    }
    envelope
        .esearchresult
        .idlist
        .ok_or_else(|| LookupError::Malformed("missing idlist".to_string()))
}

/// E-utilities client (`esearch` + `efetch`).
pub struct EntrezClient {
    client: Client,
    base_url: String,
    email: String,
    api_key: Option<String>,
}

impl EntrezClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            email: email.into(),
            api_key,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}.fcgi", self.base_url.trim_end_matches('/'))
    }

    /// Query parameters every call carries besides its own.
    fn identity(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("tool", TOOL_NAME.to_string()),
            ("email", self.email.clone()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    async fn get_text(
        &self,
        endpoint: &'static str,
        params: &[(&'static str, String)],
    ) -> Result<String, LookupError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(params)
            .query(&self.identity())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl LiteratureSource for EntrezClient {
    async fn search(&self, query: &str, max: usize) -> Result<Vec<String>, LookupError> {
        let params = [
            ("db", "pubmed".to_string()),
            ("term", query.to_string()),
            ("retmax", max.to_string()),
            ("retmode", "json".to_string()),
        ];
        let body = self.get_text("esearch", &params).await?;
        parse_search(&body)
    }

    async fn fetch_abstract(&self, pmid: &str) -> Result<String, LookupError> {
        let params = [
            ("db", "pubmed".to_string()),
            ("id", pmid.to_string()),
            ("rettype", "abstract".to_string()),
            ("retmode", "text".to_string()),
        ];
        self.get_text("efetch", &params).await
    }
}

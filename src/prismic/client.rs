//! HTTP client for the content API

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::SiteConfig;
use crate::content::RawDocument;

/// Upper bound on any single backend call; a hung backend fails the build
/// instead of wedging it
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Content API failure
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("content API request failed")]
    Transport(#[from] reqwest::Error),

    #[error("content API returned HTTP {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("invalid content API URL: {0}")]
    InvalidUrl(String),

    #[error("content repository exposes no master ref")]
    NoMasterRef,
}

/// Options for a document query
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Backend ordering expression, e.g. `[post.last_publication_date desc]`
    pub orderings: Option<String>,
    pub page_size: Option<usize>,
    /// Only return documents positioned after this document id
    pub after: Option<String>,
    /// Revision to query; the master ref is resolved when absent
    pub reference: Option<String>,
}

/// One page of query results
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results_size: u32,
    pub results: Vec<RawDocument>,
    /// Opaque cursor to the next page; absent on the last page
    #[serde(default)]
    pub next_page: Option<Url>,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    refs: Vec<RepositoryRef>,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default, rename = "isMasterRef")]
    is_master_ref: bool,
}

/// Client for one content repository
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    api_url: Url,
    access_token: Option<String>,
}

impl Client {
    /// Create a client for the repository named in the configuration
    pub fn new(config: &SiteConfig) -> Result<Self, ApiError> {
        let api_url = Url::parse(config.api_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url,
            access_token: config.access_token.clone(),
        })
    }

    /// Base URL of the repository API
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Resolve the repository's current master ref
    pub async fn master_ref(&self) -> Result<String, ApiError> {
        let mut url = self.api_url.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let response = self.http.get(url.clone()).send().await?;
        check_status(&url, response.status())?;
        let info: RepositoryInfo = response.json().await?;

        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(ApiError::NoMasterRef)
    }

    /// Query documents matching a predicate
    pub async fn query(
        &self,
        predicate: &str,
        options: &QueryOptions,
    ) -> Result<QueryResponse, ApiError> {
        let reference = match &options.reference {
            Some(r) => r.clone(),
            None => self.master_ref().await?,
        };

        let mut url = Url::parse(&format!("{}/documents/search", self.api_url))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &reference);
            pairs.append_pair("q", &format!("[[{}]]", predicate));
            if let Some(orderings) = &options.orderings {
                pairs.append_pair("orderings", orderings);
            }
            if let Some(page_size) = options.page_size {
                pairs.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(after) = &options.after {
                pairs.append_pair("after", after);
            }
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }

        self.fetch_page(&url).await
    }

    /// Resolve a single document by uid, or `None` when the repository has
    /// no such document
    pub async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Option<RawDocument>, ApiError> {
        let response = self
            .query(
                &super::at(&format!("my.{}.uid", doc_type), uid),
                &QueryOptions {
                    page_size: Some(1),
                    reference: reference.map(str::to_string),
                    ..Default::default()
                },
            )
            .await?;

        Ok(response.results.into_iter().next())
    }

    /// Fetch a page of results from an opaque cursor URL
    pub async fn fetch_page(&self, url: &Url) -> Result<QueryResponse, ApiError> {
        let response = self.http.get(url.clone()).send().await?;
        check_status(url, response.status())?;
        Ok(response.json().await?)
    }
}

fn check_status(url: &Url, status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ApiError::Status {
            status,
            url: url.to_string(),
        })
    }
}

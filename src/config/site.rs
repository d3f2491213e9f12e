//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // Content backend
    /// Base URL of the content repository API, e.g.
    /// `https://spacetraveling.cdn.prismic.io/api/v2`
    pub api_url: String,
    /// Optional access token for private repositories
    pub access_token: Option<String>,
    /// Document type queried for articles
    pub document_type: String,

    // Directory
    pub public_dir: String,

    // Pagination
    /// Documents per query page. The site has always queried one document
    /// at a time; raise this once the intended production scale is known.
    pub page_size: usize,

    // Revalidation
    /// Staleness budget for generated pages, in seconds
    pub revalidate: u64,

    // Server
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            author: String::new(),
            language: "pt-BR".to_string(),

            api_url: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "post".to_string(),

            public_dir: "public".to_string(),

            page_size: 1,

            revalidate: 1800,

            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Local server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 4000,
        }
    }
}

use super::response::parse_feature_collection;
use super::Session;
use crate::catalog::{Catalog, Downloader, SearchQuery};
use crate::config::{Config, Credentials};
use crate::error::Error;
use crate::scene::{DownloadHandle, SceneRecord};
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(120);

/// ASF search API client. Downloads need an Earthdata `Session`; without one the provider is
/// search-only.
pub struct Provider {
    client: reqwest::Client,
    search_url: Url,
    session: Option<Session>,
}

impl Provider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .user_agent(concat!("s1-acquire/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let search_url = Url::parse(&config.catalog.search_url)?;
        Ok(Self {
            client,
            search_url,
            session: None,
        })
    }

    /// Builds the provider and, if credentials are usable, its download session.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut provider = Self::new(config)?;

        let login = Credentials::read(config.credentials_path()).and_then(|c| c.asf_login());
        match login {
            Ok(login) => match Session::new(login) {
                Ok(session) => {
                    log::info!("ASF session initialised");
                    provider.session = Some(session);
                }
                Err(e) => {
                    log::error!("ASF session initialisation failed: {:#}", e);
                    log::info!("Search continues, but downloads are not possible");
                }
            },
            Err(e) => {
                log::warn!("{}", e);
                log::warn!(
                    "Copy credentials_template.toml to {} and fill in your Earthdata login",
                    config.credentials_path().display()
                );
                log::info!("Search is available, but downloads require authentication");
            }
        }
        Ok(provider)
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn can_download(self: &Self) -> bool {
        self.session.is_some()
    }

    pub fn search_url(self: &Self, query: &SearchQuery) -> Result<Url> {
        let max_results = query.max_results.to_string();
        let start = query.date_range.start_param();
        let end = query.date_range.end_param();
        let url = Url::parse_with_params(
            self.search_url.as_str(),
            &[
                ("platform", query.platform.as_str()),
                ("processingLevel", query.processing_level.as_str()),
                ("beamMode", query.beam_mode.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("intersectsWith", query.aoi_wkt.as_str()),
                ("maxResults", max_results.as_str()),
                ("output", "geojson"),
            ],
        )?;
        Ok(url)
    }
}

impl Catalog for Provider {
    async fn search(self: &Self, query: &SearchQuery) -> Result<Vec<SceneRecord>> {
        let url = self.search_url(query)?;
        log::debug!("Query: {}", url);

        let body: Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_feature_collection(&body)
    }
}

impl Downloader for Provider {
    async fn download(self: &Self, handle: &DownloadHandle, dir: &Path) -> Result<PathBuf> {
        let session = self.session.as_ref().ok_or(Error::NoSession)?;
        session.download(handle, dir).await
    }
}

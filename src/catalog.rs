//! The seam between this crate and the remote archive.
use crate::config::{Aoi, Config};
use crate::date_range::DateRange;
use crate::error::Error;
use crate::scene::{DownloadHandle, SceneRecord};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_RESULTS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub platform: String,
    pub processing_level: String,
    pub beam_mode: String,
    pub date_range: DateRange,
    pub aoi: Aoi,
    pub aoi_wkt: String,
    pub max_results: usize,
}

impl SearchQuery {
    pub fn new(config: &Config, date_range: DateRange, max_results: usize) -> Self {
        Self {
            platform: config.sentinel1.platform.clone(),
            processing_level: config.sentinel1.processing_level.clone(),
            beam_mode: config.sentinel1.beam_mode.clone(),
            date_range,
            aoi: config.aoi.clone(),
            aoi_wkt: config.aoi_wkt(),
            max_results,
        }
    }
}

pub trait Catalog {
    async fn search(self: &Self, query: &SearchQuery) -> Result<Vec<SceneRecord>>;
}

pub trait Downloader {
    /// Fetches one scene into `dir`, returning the local path of the product.
    async fn download(self: &Self, handle: &DownloadHandle, dir: &Path) -> Result<PathBuf>;
}

/// Runs a query and never fails: any error is logged and yields an empty result set.
pub async fn search_products(catalog: &impl Catalog, query: &SearchQuery) -> Vec<SceneRecord> {
    log::info!("Searching: {}", query.date_range);
    log::info!("Area: {}", query.aoi.name);

    match catalog.search(query).await {
        Ok(scenes) => {
            log::info!(
                "Search conditions: {} {}, {} mode, all orbit directions",
                query.platform,
                query.processing_level,
                query.beam_mode
            );
            log::info!("Search complete: {} products found", scenes.len());
            scenes
        }
        Err(e) => {
            let err = Error::Search(format!("{:#}", e));
            log::error!("{}", err);
            vec![]
        }
    }
}

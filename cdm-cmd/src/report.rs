//! Build the dashboard bundle for one reporting date.

use crate::config::Config;
use anyhow::Context;
use cdm_bulletin::commune_map::CommuneStationMap;
use cdm_bulletin::fetcher::{BulletinClient, FallbackData};
use cdm_bulletin::persistence::{load_latest, PersistenceIndex};
use cdm_data::bundle::Bundle;
use cdm_data::fusion::{load_base_features, merge};
use cdm_utils::dates::{format_date, reporting_month};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::path::Path;

/// Run the pipeline; any mandatory failure becomes a failure bundle
/// carrying the full cause chain.
pub async fn build_bundle(config: &Config, today: &NaiveDate) -> Bundle {
    match try_build_bundle(config, today).await {
        Ok(bundle) => bundle,
        Err(e) => {
            error!("Bundle build failed: {:#}", e);
            Bundle::failure(format!("{:#}", e))
        }
    }
}

pub async fn try_build_bundle(config: &Config, today: &NaiveDate) -> anyhow::Result<Bundle> {
    let window = reporting_month(today);
    info!("Building bundle for {} (reporting month {})", format_date(today), window);

    let fallback = FallbackData::load(&config.paths.fallback);
    let client = BulletinClient::new(&config.api.base_url, config.api.timeout_secs, fallback)
        .context("failed to build bulletin client")?;

    let current = client
        .get_current(window.year(), window.month())
        .await
        .context("failed to obtain current drought data")?;
    info!("{} commune records for {}", current.len(), window);

    let base = load_base_features(&config.paths.base_geojson).context("failed to load base polygons")?;

    let stations = load_stations(config, today);
    let communes = load_communes(config.paths.commune_map.as_deref());
    let history = client
        .get_historical(window, config.api.historical_months)
        .await;

    let merged = merge(base, &current, &stations, &communes);
    Ok(Bundle::success(merged, &current, history))
}

fn load_stations(config: &Config, today: &NaiveDate) -> PersistenceIndex {
    let dir = config.indices_dir();
    match load_latest(&dir, today, config.persistence.search_depth) {
        Ok(index) => {
            info!("Loaded indices for {} stations", index.len());
            index
        }
        Err(e) => {
            warn!("Persistence indices unavailable, periods will be null: {}", e);
            PersistenceIndex::unavailable()
        }
    }
}

fn load_communes(path: Option<&Path>) -> CommuneStationMap {
    let loaded = match path {
        Some(path) => CommuneStationMap::load(path),
        None => CommuneStationMap::bundled(),
    };
    loaded.unwrap_or_else(|e| {
        warn!("Commune station map unavailable, no periods will be averaged: {}", e);
        CommuneStationMap::default()
    })
}

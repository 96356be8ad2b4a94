use crate::drought_record::{load_fallback, parse_payload, DroughtRecord};
use crate::error::{BulletinError, Result};
use log::warn;
use std::path::Path;

#[cfg(feature = "api")]
use crate::historical::{group_historical, HistoricalSeries};
#[cfg(feature = "api")]
use cdm_utils::dates::YearMonth;
#[cfg(feature = "api")]
use log::info;
#[cfg(feature = "api")]
use reqwest::Client;
use std::time::Duration;

/// Drought monitor API root; the bulletin lives under `getdp3/{year}/{month}`.
pub const DEFAULT_BASE_URL: &str = "https://prodatos.meteochile.gob.cl/intranet/caster";

pub const MIN_TIMEOUT_SECS: u64 = 10;
pub const MAX_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Months fetched for the regional history, including the reporting month.
pub const DEFAULT_HISTORICAL_MONTHS: u32 = 6;

/// Per-request timeout; configured seconds are clamped to 10..=30.
pub fn request_timeout(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
}

/// URL of one monthly bulletin. The month is not zero padded.
pub fn bulletin_url(base_url: &str, year: i32, month: u32) -> String {
    format!("{}/getdp3/{}/{}", base_url.trim_end_matches('/'), year, month)
}

/// Interpret a primary API response. Only a 200 whose `datos` holds at
/// least one valid record is a success.
pub fn records_from_response(url: &str, status: u16, body: &str) -> Result<Vec<DroughtRecord>> {
    if status != 200 {
        return Err(BulletinError::RemoteFetch {
            url: url.to_string(),
            reason: format!("unexpected status {status}"),
        });
    }
    parse_payload(body).map_err(|e| BulletinError::RemoteFetch {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// The static dataset used when the API cannot be used. Loaded once;
/// a load failure is remembered so it can be reported later.
#[derive(Debug, Clone)]
pub enum FallbackData {
    Loaded(Vec<DroughtRecord>),
    Unusable(String),
}

impl FallbackData {
    pub fn load(path: &Path) -> FallbackData {
        match load_fallback(path) {
            Ok(records) => FallbackData::Loaded(records),
            Err(e) => {
                warn!("Fallback dataset {} is unusable: {}", path.display(), e);
                FallbackData::Unusable(format!("fallback {} unusable: {}", path.display(), e))
            }
        }
    }
}

/// Resolve a primary fetch result against the fallback: a failed primary
/// is replaced by the fallback records (one attempt, no retry).
pub fn resolve_with_fallback(
    year: i32,
    month: u32,
    primary: Result<Vec<DroughtRecord>>,
    fallback: &FallbackData,
) -> Result<Vec<DroughtRecord>> {
    let primary_error = match primary {
        Ok(records) => return Ok(records),
        Err(e) => e,
    };
    warn!(
        "Bulletin {}-{:02} unavailable, using fallback: {}",
        year, month, primary_error
    );
    match fallback {
        FallbackData::Loaded(records) => Ok(records.clone()),
        FallbackData::Unusable(reason) => Err(BulletinError::NoDataAvailable {
            year,
            month,
            cause: format!("{primary_error}; {reason}"),
        }),
    }
}

/// Client for the monthly drought bulletin with a local fallback.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct BulletinClient {
    client: Client,
    base_url: String,
    fallback: FallbackData,
}

#[cfg(feature = "api")]
impl BulletinClient {
    /// Build a client; `timeout_secs` is clamped to 10..=30 seconds.
    pub fn new(base_url: &str, timeout_secs: u64, fallback: FallbackData) -> Result<BulletinClient> {
        let client = Client::builder()
            .timeout(request_timeout(timeout_secs))
            .user_agent(concat!("cdm-bulletin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(BulletinClient {
            client,
            base_url: base_url.to_string(),
            fallback,
        })
    }

    async fn fetch_primary(&self, year: i32, month: u32) -> Result<Vec<DroughtRecord>> {
        let url = bulletin_url(&self.base_url, year, month);
        info!("Fetching drought bulletin {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BulletinError::RemoteFetch {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| BulletinError::RemoteFetch {
            url: url.clone(),
            reason: format!("failed to read body: {e}"),
        })?;
        records_from_response(&url, status, &body)
    }

    /// Records of one bulletin month, from the API or else the fallback.
    pub async fn get_current(&self, year: i32, month: u32) -> Result<Vec<DroughtRecord>> {
        let primary = self.fetch_primary(year, month).await;
        resolve_with_fallback(year, month, primary, &self.fallback)
    }

    /// Per-region history of `months` bulletins ending at `base`.
    /// Months that cannot be fetched are left out.
    pub async fn get_historical(&self, base: YearMonth, months: u32) -> HistoricalSeries {
        let mut fetched = Vec::new();
        for months_back in 0..months {
            let year_month = base.minus_months(months_back);
            match self.get_current(year_month.year(), year_month.month()).await {
                Ok(records) => fetched.push((year_month, records)),
                Err(e) => warn!("Skipping bulletin {} in history: {}", year_month, e),
            }
        }
        info!(
            "Collected {} of {} historical bulletins",
            fetched.len(),
            months
        );
        group_historical(fetched)
    }
}

//! Precipitation-persistence indices (SPI / SPEI) per weather station.
//!
//! Monthly index files are comma-separated text named `{YYYY}_{MM}_indices.txt`:
//!
//! ```text
//! Estacion,3,9,12,24,48
//! E000330002,-1.2,-0.8,-0.5,0.1,0.3
//! ```
//!
//! Numeric header cells are time scales in months and become period
//! labels (`3` -> `p_3m`). Some exports write the first scale as
//! `meses:3`; the cells after it are read the same way.

use crate::error::{BulletinError, Result};
use cdm_utils::dates::YearMonth;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How many months back to look for an index file by default.
pub const DEFAULT_SEARCH_DEPTH: u32 = 6;

/// Period labels the dashboard renders.
pub const STANDARD_PERIODS: [&str; 5] = ["p_3m", "p_9m", "p_12m", "p_24m", "p_48m"];

const PERIOD_PREFIX: &str = "p_";
const MONTHS_PREFIX: &str = "meses:";

/// A cell of an index row: numeric when it parses as a finite float,
/// otherwise the raw token.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(untagged)]
pub enum IndexValue {
    Number(f64),
    Text(String),
}

impl IndexValue {
    pub fn parse(token: &str) -> IndexValue {
        let token = token.trim();
        match parse_finite(token) {
            Some(value) => IndexValue::Number(value),
            None => IndexValue::Text(token.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            IndexValue::Number(value) => Some(*value),
            IndexValue::Text(_) => None,
        }
    }
}

fn parse_finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Label for a time scale given in months, e.g. `"12"` -> `"p_12m"`.
pub fn period_label(months: &str) -> String {
    format!("{PERIOD_PREFIX}{}m", months.trim())
}

pub fn is_period_label(label: &str) -> bool {
    label.starts_with(PERIOD_PREFIX)
}

fn period_months(label: &str) -> Option<f64> {
    label
        .strip_prefix(PERIOD_PREFIX)
        .and_then(|rest| rest.strip_suffix('m'))
        .and_then(parse_finite)
}

/// Index values of one station, keyed by header label.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct StationRecord {
    #[serde(skip)]
    pub station_code: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, IndexValue>,
}

impl StationRecord {
    pub fn new(station_code: impl Into<String>) -> StationRecord {
        StationRecord {
            station_code: station_code.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Numeric value recorded for a period label, if any.
    pub fn period(&self, label: &str) -> Option<f64> {
        self.fields.get(label).and_then(IndexValue::as_number)
    }

    pub fn with_field(mut self, label: impl Into<String>, value: IndexValue) -> StationRecord {
        self.fields.insert(label.into(), value);
        self
    }
}

/// Parsed index file: stations by code plus the header's period labels.
#[derive(Debug, PartialEq, Clone, Default, Serialize)]
pub struct PersistenceIndex {
    pub stations: BTreeMap<String, StationRecord>,
    pub periods: Vec<String>,
}

impl PersistenceIndex {
    /// Index used when no file could be loaded: no stations, standard periods.
    pub fn unavailable() -> PersistenceIndex {
        PersistenceIndex {
            stations: BTreeMap::new(),
            periods: STANDARD_PERIODS.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn insert(&mut self, record: StationRecord) {
        self.stations.insert(record.station_code.clone(), record);
    }

    pub fn station(&self, code: &str) -> Option<&StationRecord> {
        self.stations.get(code)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Every period label known to this index (header periods and labels
    /// found on any station), ordered by time scale.
    pub fn period_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.periods.clone();
        for record in self.stations.values() {
            for label in record.fields.keys().filter(|l| is_period_label(l)) {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }
        labels.sort_by(|a, b| {
            let (ma, mb) = (period_months(a), period_months(b));
            match (ma, mb) {
                (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.cmp(b),
            }
        });
        labels
    }

    /// Parse the content of an index file.
    pub fn parse(raw: &str) -> Result<PersistenceIndex> {
        if raw.trim().is_empty() {
            return Err(BulletinError::PersistenceParseEmpty);
        }
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(raw.as_bytes());

        let mut rows = rdr
            .records()
            .filter(|row| !matches!(row, Ok(record) if is_blank(record)));

        let header = match rows.next() {
            Some(row) => row?,
            None => return Err(BulletinError::PersistenceParseEmpty),
        };
        let labels = header_labels(&header);

        let mut index = PersistenceIndex {
            stations: BTreeMap::new(),
            periods: labels.iter().filter(|l| is_period_label(l)).cloned().collect(),
        };

        for row in rows {
            let record = row?;
            let station_code = match record.get(0) {
                Some(code) if !code.is_empty() => code.to_string(),
                _ => continue,
            };
            let fields = labels
                .iter()
                .zip(record.iter())
                .map(|(label, token)| (label.clone(), IndexValue::parse(token)))
                .collect();
            index.insert(StationRecord {
                station_code,
                fields,
            });
        }
        debug!(
            "Parsed persistence index: {} stations, periods {:?}",
            index.len(),
            index.periods
        );
        Ok(index)
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

fn header_labels(header: &StringRecord) -> Vec<String> {
    header
        .iter()
        .map(|cell| {
            if let Some(months) = cell.strip_prefix(MONTHS_PREFIX) {
                if parse_finite(months.trim()).is_some() {
                    return period_label(months);
                }
            }
            if parse_finite(cell).is_some() {
                period_label(cell)
            } else {
                cell.to_string()
            }
        })
        .collect()
}

/// File name of the index for a month, e.g. `2024_05_indices.txt`.
pub fn index_file_name(year_month: YearMonth) -> String {
    format!("{}_indices.txt", year_month.file_stem())
}

/// Find the newest index file in `dir`, checking the `depth` months
/// before `today` (most recent first).
pub fn find_latest_index_file(dir: &Path, today: &NaiveDate, depth: u32) -> Result<PathBuf> {
    let current = YearMonth::from_date(today);
    for months_back in 1..=depth {
        let candidate = dir.join(index_file_name(current.minus_months(months_back)));
        if candidate.is_file() {
            return Ok(candidate);
        }
        debug!("No index file at {}", candidate.display());
    }
    Err(BulletinError::NoPersistenceDataAvailable {
        dir: dir.to_path_buf(),
        depth,
    })
}

/// Locate and parse the newest index file in `dir`.
pub fn load_latest(dir: &Path, today: &NaiveDate, depth: u32) -> Result<PersistenceIndex> {
    let path = find_latest_index_file(dir, today, depth)?;
    info!("Loading persistence index {}", path.display());
    let raw = std::fs::read_to_string(&path).map_err(|source| BulletinError::Io {
        path: path.clone(),
        source,
    })?;
    PersistenceIndex::parse(&raw)
}

//! Merge bulletin records and station indices into commune polygons.
//!
//! Commune codes (`CUT_COM`) are written with or without a leading zero
//! depending on the source (`5101` vs `05101`); both widths resolve to
//! the same record. Enrichment overwrites properties, so merging an
//! already enriched collection again yields the same values.

use crate::error::{FusionError, Result};
use cdm_bulletin::commune_map::CommuneStationMap;
use cdm_bulletin::drought_record::{code_from_json, DroughtRecord};
use cdm_bulletin::persistence::PersistenceIndex;
use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

/// Commune code property of the base polygons.
pub const CODE_PROPERTY: &str = "CUT_COM";

/// Commune name property of the base polygons.
pub const NAME_PROPERTY: &str = "COMUNA";

/// The same code written with the other zero-padding width, if any.
pub fn alternate_width(code: &str) -> Option<String> {
    match code.len() {
        5 if code.starts_with('0') => Some(code[1..].to_string()),
        4 => Some(format!("0{code}")),
        _ => None,
    }
}

/// Bulletin records by commune code, with 5-digit aliases for 4-digit codes.
#[derive(Debug)]
pub struct RecordIndex<'a> {
    by_code: HashMap<String, &'a DroughtRecord>,
}

impl<'a> RecordIndex<'a> {
    pub fn new(records: &'a [DroughtRecord]) -> RecordIndex<'a> {
        let mut by_code = HashMap::with_capacity(records.len() * 2);
        for record in records {
            by_code.insert(record.code.clone(), record);
        }
        for record in records {
            if record.code.len() == 4 {
                by_code.entry(format!("0{}", record.code)).or_insert(record);
            }
        }
        RecordIndex { by_code }
    }

    /// Exact code first, then the opposite width.
    pub fn lookup(&self, code: &str) -> Option<&'a DroughtRecord> {
        if let Some(record) = self.by_code.get(code) {
            return Some(*record);
        }
        alternate_width(code).and_then(|alt| self.by_code.get(&alt).copied())
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// Mean of `period` over the stations that report a numeric value for it.
pub fn station_mean(station_codes: &[String], index: &PersistenceIndex, period: &str) -> Option<f64> {
    let values: Vec<f64> = station_codes
        .iter()
        .filter_map(|code| index.station(code))
        .filter_map(|record| record.period(period))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Counts reported after a merge.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct MergeSummary {
    pub features: usize,
    pub with_bulletin: usize,
    pub with_stations: usize,
}

/// Enrich `collection` in place.
pub fn merge_into(
    collection: &mut FeatureCollection,
    current: &[DroughtRecord],
    stations: &PersistenceIndex,
    communes: &CommuneStationMap,
) -> MergeSummary {
    let records = RecordIndex::new(current);
    let periods = stations.period_labels();
    let mut summary = MergeSummary::default();

    for feature in collection.features.iter_mut() {
        summary.features += 1;
        let properties = feature.properties.get_or_insert_with(JsonObject::new);

        let code = properties.get(CODE_PROPERTY).and_then(code_from_json);
        match code.as_deref().and_then(|c| records.lookup(c)) {
            Some(record) => {
                properties.extend(record.to_properties());
                summary.with_bulletin += 1;
            }
            None => debug!("No bulletin record for commune code {:?}", code),
        }

        let name = properties
            .get(NAME_PROPERTY)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        let station_codes = communes.resolve_stations(&name);
        if station_codes.is_empty() {
            debug!("Commune {:?} has no mapped stations", name);
        } else {
            summary.with_stations += 1;
        }
        for period in &periods {
            let value = station_mean(station_codes, stations, period)
                .map(JsonValue::from)
                .unwrap_or(JsonValue::Null);
            properties.insert(period.clone(), value);
        }
    }

    info!(
        "Merged {} features: {} with bulletin data, {} with station indices",
        summary.features, summary.with_bulletin, summary.with_stations
    );
    summary
}

/// Enrich the base polygons with bulletin records and averaged station
/// indices. Unmatched features keep their properties; every period label
/// of `stations` is set, `null` where no station contributes a value.
pub fn merge(
    mut base: FeatureCollection,
    current: &[DroughtRecord],
    stations: &PersistenceIndex,
    communes: &CommuneStationMap,
) -> FeatureCollection {
    merge_into(&mut base, current, stations, communes);
    base
}

/// Load the commune polygons.
pub fn load_base_features(path: &Path) -> Result<FeatureCollection> {
    if !path.is_file() {
        return Err(FusionError::BasePolygonFileMissing(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| FusionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let invalid = |reason: String| FusionError::InvalidBaseGeoJson {
        path: path.to_path_buf(),
        reason,
    };
    let geojson = raw.parse::<GeoJson>().map_err(|e| invalid(e.to_string()))?;
    FeatureCollection::try_from(geojson).map_err(|e| invalid(e.to_string()))
}

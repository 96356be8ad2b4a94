use crate::error::{BulletinError, Result};
use cdm_utils::text::normalize_commune_name;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Embedded commune -> station mapping for the Valparaíso region.
pub static COMMUNE_STATIONS_JSON: &str = include_str!("../../fixtures/commune_stations.json");

/// Key wrapping the mapping in dashboard configuration files.
pub const MAP_KEY: &str = "MAPA_COMUNA_A_ESTACIONES";

/// Weather stations whose indices represent each commune.
///
/// Static reference data: built once and only read afterwards. Names
/// are stored normalized (see [`normalize_commune_name`]).
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CommuneStationMap {
    stations: BTreeMap<String, Vec<String>>,
}

impl CommuneStationMap {
    /// Parse a mapping given either flat (`{"NAME": ["CODE", ...]}`) or
    /// wrapped under `MAPA_COMUNA_A_ESTACIONES`.
    pub fn from_json(raw: &str) -> Result<CommuneStationMap> {
        let value: Value = serde_json::from_str(raw)?;
        let mapping = match value.get(MAP_KEY) {
            Some(inner) => inner,
            None => &value,
        };
        let object = mapping
            .as_object()
            .ok_or_else(|| BulletinError::InvalidCommuneMap("expected a JSON object".to_string()))?;

        let mut map = CommuneStationMap::default();
        for (name, codes) in object {
            let codes = codes.as_array().ok_or_else(|| {
                BulletinError::InvalidCommuneMap(format!("stations of {name} are not a list"))
            })?;
            let codes = codes
                .iter()
                .map(|code| {
                    code.as_str().map(|c| c.trim().to_string()).ok_or_else(|| {
                        BulletinError::InvalidCommuneMap(format!("station code of {name} is not a string"))
                    })
                })
                .collect::<Result<Vec<String>>>()?;
            map.insert(name, codes);
        }
        Ok(map)
    }

    pub fn load(path: &Path) -> Result<CommuneStationMap> {
        let raw = std::fs::read_to_string(path).map_err(|source| BulletinError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CommuneStationMap::from_json(&raw)
    }

    /// The embedded default mapping.
    pub fn bundled() -> Result<CommuneStationMap> {
        CommuneStationMap::from_json(COMMUNE_STATIONS_JSON)
    }

    pub fn insert(&mut self, commune_name: &str, station_codes: Vec<String>) {
        self.stations
            .insert(normalize_commune_name(commune_name), station_codes);
    }

    /// Station codes for a commune; empty when the commune is not mapped.
    pub fn resolve_stations(&self, commune_name: &str) -> &[String] {
        self.stations
            .get(&normalize_commune_name(commune_name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

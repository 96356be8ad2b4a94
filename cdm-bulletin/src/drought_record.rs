use crate::category::{Category, CategoryValues};
use crate::error::{BulletinError, Result};
use chrono::NaiveDate;
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Key of the region code in bulletin entries.
pub const CODE_KEY: &str = "Code";

/// Key under which the reporting date is serialized.
pub const REPORT_DATE_KEY: &str = "fecha";

/// Drought coverage of one commune for one bulletin month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroughtRecord {
    /// Numeric commune code, 4 or 5 digits depending on the source
    #[serde(rename = "Code")]
    pub code: String,
    /// Percent of commune area per category
    #[serde(flatten)]
    pub categories: CategoryValues,
    /// Fields of the bulletin entry not interpreted here (e.g. `D0D4`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Set when the record is part of a historical series
    #[serde(rename = "fecha", skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDate>,
}

impl DroughtRecord {
    /// Properties written onto a matching GeoJSON feature: the code,
    /// the six categories and any passthrough fields.
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut properties = self.extra.clone();
        properties.insert(CODE_KEY.to_string(), Value::String(self.code.clone()));
        for (category, value) in self.categories.iter() {
            properties.insert(category.key().to_string(), Value::from(*value));
        }
        properties
    }

    pub fn with_report_date(mut self, date: NaiveDate) -> DroughtRecord {
        self.report_date = Some(date);
        self
    }
}

/// Read a code that may arrive as a JSON string or number.
pub fn code_from_json(value: &Value) -> Option<String> {
    let code = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(u), _) => u.to_string(),
            (None, Some(f)) if f >= 0.0 && f.fract() == 0.0 => format!("{f:.0}"),
            _ => return None,
        },
        _ => return None,
    };
    if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
        Some(code)
    } else {
        None
    }
}

fn percent_from_json(category: Category, value: Option<&Value>) -> std::result::Result<f64, String> {
    let percent = match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("{category} is not a finite number"))?,
        Some(Value::String(s)) if s.trim().is_empty() => 0.0,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("{category} is not numeric: {s:?}"))?,
        Some(other) => return Err(format!("{category} has unexpected value {other}")),
    };
    if !percent.is_finite() || percent < 0.0 {
        return Err(format!("{category} out of range: {percent}"));
    }
    Ok(percent)
}

impl TryFrom<&Map<String, Value>> for DroughtRecord {
    type Error = String;

    fn try_from(entry: &Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let code = entry
            .get(CODE_KEY)
            .and_then(code_from_json)
            .ok_or_else(|| format!("missing or non-numeric {CODE_KEY}"))?;

        let mut categories = CategoryValues::default();
        for category in Category::ALL {
            *categories.get_mut(category) = percent_from_json(category, entry.get(category.key()))
                .map_err(|e| format!("{code}: {e}"))?;
        }

        let extra = entry
            .iter()
            .filter(|(k, _)| {
                k.as_str() != CODE_KEY
                    && k.as_str() != REPORT_DATE_KEY
                    && !Category::ALL.iter().any(|c| c.key() == k.as_str())
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(DroughtRecord {
            code,
            categories,
            extra,
            report_date: None,
        })
    }
}

/// Parse a bulletin body of the form `{"datos": [ {Code, SA, D0..D4, ...}, ... ]}`.
///
/// Entries that are not objects, lack a numeric code or carry invalid
/// percentages are skipped. A payload with no usable entry is an error.
pub fn parse_payload(body: &str) -> Result<Vec<DroughtRecord>> {
    let payload: Value = serde_json::from_str(body)?;
    let entries = match payload.get("datos").and_then(Value::as_array) {
        Some(entries) => entries,
        None => return Err(BulletinError::EmptyPayload),
    };

    let records = entries
        .iter()
        .filter_map(|entry| {
            let object = match entry.as_object() {
                Some(object) => object,
                None => {
                    warn!("Skipping non-object bulletin entry: {}", entry);
                    return None;
                }
            };
            match DroughtRecord::try_from(object) {
                Ok(record) => Some(record),
                Err(reason) => {
                    warn!("Skipping bulletin entry: {}", reason);
                    None
                }
            }
        })
        .collect::<Vec<DroughtRecord>>();

    if records.is_empty() {
        Err(BulletinError::EmptyPayload)
    } else {
        Ok(records)
    }
}

/// Load the static fallback dataset (same shape as the API payload).
pub fn load_fallback(path: &Path) -> Result<Vec<DroughtRecord>> {
    let body = std::fs::read_to_string(path).map_err(|source| BulletinError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_payload(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAYLOAD: &str = r#"{"datos":[
        {"Code":"5101","SA":10,"D0":20,"D1":30,"D2":20,"D3":10,"D4":10,"D0D4":"D1"},
        {"Code":5102,"SA":"50.5","D0":49.5,"D1":0,"D2":0,"D3":0,"D4":0},
        {"Code":"05103","SA":100}
    ]}"#;

    #[test]
    fn test_parse_payload() {
        let records = parse_payload(PAYLOAD).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].code, "5101");
        assert_eq!(records[0].categories.d1, 30.0);
        assert_eq!(records[0].extra["D0D4"], json!("D1"));
        assert_eq!(records[1].code, "5102");
        assert_eq!(records[1].categories.sa, 50.5);
        assert_eq!(records[2].code, "05103");
        assert_eq!(records[2].categories.d4, 0.0);
        assert!(records.iter().all(|r| r.report_date.is_none()));
    }

    #[test]
    fn test_parse_payload_rejects_empty_shapes() {
        assert!(matches!(parse_payload(r#"{"datos":[]}"#), Err(BulletinError::EmptyPayload)));
        assert!(matches!(parse_payload(r#"{"other":1}"#), Err(BulletinError::EmptyPayload)));
        assert!(matches!(parse_payload("[]"), Err(BulletinError::EmptyPayload)));
        assert!(matches!(parse_payload("<html>"), Err(BulletinError::Json(_))));
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let body = r#"{"datos":[
            {"Code":"51A1","SA":1},
            {"SA":1},
            {"Code":"5104","SA":-3},
            {"Code":"5105","D2":"n/a"},
            "junk",
            {"Code":"5106","D3":7}
        ]}"#;
        let records = parse_payload(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "5106");
        assert_eq!(records[0].categories.d3, 7.0);
    }

    #[test]
    fn test_serialize_record() {
        let records = parse_payload(PAYLOAD).unwrap();
        let dated = records[0]
            .clone()
            .with_report_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let json = serde_json::to_value(&dated).unwrap();
        assert_eq!(json["Code"], json!("5101"));
        assert_eq!(json["SA"].as_f64(), Some(10.0));
        assert_eq!(json["D0D4"], json!("D1"));
        assert_eq!(json["fecha"], json!("2024-05-01"));

        let undated = serde_json::to_value(&records[1]).unwrap();
        assert!(undated.get("fecha").is_none());
    }

    #[test]
    fn test_to_properties() {
        let records = parse_payload(PAYLOAD).unwrap();
        let properties = records[0].to_properties();
        assert_eq!(properties["Code"], json!("5101"));
        assert_eq!(properties["D2"].as_f64(), Some(20.0));
        assert_eq!(properties["D0D4"], json!("D1"));
        assert_eq!(properties.len(), 8);
    }

    #[test]
    fn test_load_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy_api_data.json");
        std::fs::write(&path, PAYLOAD).unwrap();
        assert_eq!(load_fallback(&path).unwrap().len(), 3);

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_fallback(&missing), Err(BulletinError::Io { .. })));
    }

    #[test]
    fn test_bundled_fallback_fixture() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures/dummy_api_data.json"));
        let records = load_fallback(path).unwrap();
        assert_eq!(records.len(), 13);
        assert!(records.iter().all(|r| r.code.len() == 4));
        for record in &records {
            let total: f64 = record.categories.iter().map(|(_, v)| *v).sum();
            assert!((total - 100.0).abs() < 1e-6, "{} sums to {}", record.code, total);
        }
    }
}

//! Dashboard payload.

use crate::aggregate::{current_averages, historical_series, RegionalSeries};
use cdm_bulletin::category::CategoryValues;
use cdm_bulletin::drought_record::DroughtRecord;
use cdm_bulletin::historical::HistoricalSeries;
use geojson::FeatureCollection;
use serde::Serialize;

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Sidebar {
    pub promedios: CategoryValues,
    pub historico: RegionalSeries,
}

impl Sidebar {
    pub fn new(current: &[DroughtRecord], history: &HistoricalSeries) -> Sidebar {
        Sidebar {
            promedios: current_averages(current),
            historico: historical_series(history),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBundle {
    pub success: bool,
    pub geojson_data: FeatureCollection,
    pub datos_historicos_comunales: HistoricalSeries,
    pub datos_sidebar: Sidebar,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct FailureBundle {
    pub success: bool,
    pub message: String,
}

/// Either outcome of one pipeline run, serialized untagged.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(untagged)]
pub enum Bundle {
    Success(Box<SuccessBundle>),
    Failure(FailureBundle),
}

impl Bundle {
    pub fn success(
        geojson_data: FeatureCollection,
        current: &[DroughtRecord],
        history: HistoricalSeries,
    ) -> Bundle {
        let datos_sidebar = Sidebar::new(current, &history);
        Bundle::Success(Box::new(SuccessBundle {
            success: true,
            geojson_data,
            datos_historicos_comunales: history,
            datos_sidebar,
        }))
    }

    pub fn failure(message: impl Into<String>) -> Bundle {
        Bundle::Failure(FailureBundle {
            success: false,
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Bundle::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdm_bulletin::drought_record::parse_payload;
    use cdm_bulletin::historical::group_historical;
    use cdm_utils::dates::YearMonth;
    use serde_json::json;

    #[test]
    fn test_failure_shape() {
        let bundle = Bundle::failure("no drought data available for 2024-05: timeout");
        assert!(!bundle.is_success());
        assert_eq!(
            serde_json::to_value(&bundle).unwrap(),
            json!({"success": false, "message": "no drought data available for 2024-05: timeout"})
        );
    }

    #[test]
    fn test_success_shape() {
        let current = parse_payload(r#"{"datos":[{"Code":"5101","SA":10,"D1":30}]}"#).unwrap();
        let history = group_historical(vec![(YearMonth::new(2024, 4).unwrap(), current.clone())]);
        let collection = FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        };
        let bundle = Bundle::success(collection, &current, history);
        assert!(bundle.is_success());

        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["geojsonData"]["type"], json!("FeatureCollection"));
        assert_eq!(value["datosHistoricosComunales"]["5101"][0]["fecha"], json!("2024-04-01"));
        assert_eq!(value["datosHistoricosComunales"]["5101"][0]["Code"], json!("5101"));
        assert_eq!(value["datosSidebar"]["promedios"]["SA"], json!(10.0));
        assert_eq!(value["datosSidebar"]["historico"]["labels"], json!(["2024-04"]));
        assert_eq!(value["datosSidebar"]["historico"]["series"]["D1"], json!([30.0]));
    }
}

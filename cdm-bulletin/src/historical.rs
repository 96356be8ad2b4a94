use crate::drought_record::DroughtRecord;
use cdm_utils::dates::YearMonth;
use std::collections::BTreeMap;

/// Region code -> records of that region, ascending by report date.
pub type HistoricalSeries = BTreeMap<String, Vec<DroughtRecord>>;

/// Group monthly bulletins into per-region series.
///
/// Each record is tagged with the first day of its bulletin month. The
/// order in which months are supplied does not matter.
pub fn group_historical<I>(months: I) -> HistoricalSeries
where
    I: IntoIterator<Item = (YearMonth, Vec<DroughtRecord>)>,
{
    let mut series = HistoricalSeries::new();
    for (year_month, records) in months {
        let report_date = year_month.first_day();
        for record in records {
            series
                .entry(record.code.clone())
                .or_default()
                .push(record.with_report_date(report_date));
        }
    }
    for records in series.values_mut() {
        records.sort_by_key(|record| record.report_date);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drought_record::parse_payload;
    use chrono::NaiveDate;

    fn month(year: i32, month: u32, body: &str) -> (YearMonth, Vec<DroughtRecord>) {
        (YearMonth::new(year, month).unwrap(), parse_payload(body).unwrap())
    }

    #[test]
    fn test_group_historical_sorts_ascending() {
        let months = vec![
            month(2024, 5, r#"{"datos":[{"Code":"5101","D1":30},{"Code":"5102","D1":10}]}"#),
            month(2024, 3, r#"{"datos":[{"Code":"5101","D1":10}]}"#),
            month(2024, 4, r#"{"datos":[{"Code":"5101","D1":20}]}"#),
        ];
        let series = group_historical(months);
        assert_eq!(series.len(), 2);

        let valparaiso = &series["5101"];
        let dates: Vec<NaiveDate> = valparaiso.iter().filter_map(|r| r.report_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            ]
        );
        let d1: Vec<f64> = valparaiso.iter().map(|r| r.categories.d1).collect();
        assert_eq!(d1, vec![10.0, 20.0, 30.0]);
        assert_eq!(series["5102"].len(), 1);
    }

    #[test]
    fn test_group_historical_empty() {
        assert!(group_historical(Vec::new()).is_empty());
    }
}

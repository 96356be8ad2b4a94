use cdm_bulletin::category::{ByCategory, Category, CategoryValues};
use cdm_bulletin::drought_record::DroughtRecord;
use cdm_bulletin::historical::HistoricalSeries;
use cdm_utils::dates::YearMonth;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean per category over `records`; all zeros for an empty slice.
pub fn current_averages(records: &[DroughtRecord]) -> CategoryValues {
    mean_of(records.iter())
}

fn mean_of<'a>(records: impl Iterator<Item = &'a DroughtRecord>) -> CategoryValues {
    let mut sums = CategoryValues::default();
    let mut count = 0usize;
    for record in records {
        count += 1;
        for category in Category::ALL {
            *sums.get_mut(category) += *record.categories.get(category);
        }
    }
    if count == 0 {
        return sums;
    }
    sums.map(|sum| sum / count as f64)
}

/// Regional monthly means, one value array per category parallel to `labels`.
#[derive(Debug, PartialEq, Clone, Default, Serialize)]
pub struct RegionalSeries {
    pub labels: Vec<String>,
    pub series: ByCategory<Vec<f64>>,
}

/// Average every record of `history` across communes, grouped by the
/// `YYYY-MM` of its report date. Records without a date are ignored.
pub fn historical_series(history: &HistoricalSeries) -> RegionalSeries {
    let mut by_month: BTreeMap<YearMonth, Vec<&DroughtRecord>> = BTreeMap::new();
    for record in history.values().flatten() {
        if let Some(date) = record.report_date {
            by_month
                .entry(YearMonth::from_date(&date))
                .or_default()
                .push(record);
        }
    }

    let mut regional = RegionalSeries::default();
    for (month, records) in by_month {
        regional.labels.push(month.key());
        let means = mean_of(records.into_iter());
        for (category, mean) in means.iter() {
            regional.series.get_mut(category).push(*mean);
        }
    }
    regional
}

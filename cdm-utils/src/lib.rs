//! Shared utility functions for CDM crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};
    use std::fmt;

    /// Day of month from which the previous month's bulletin is considered final.
    pub const BULLETIN_PUBLICATION_DAY: u32 = 17;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// A calendar month. The month is always in `1..=12`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct YearMonth {
        year: i32,
        month: u32,
    }

    impl YearMonth {
        pub fn new(year: i32, month: u32) -> Option<YearMonth> {
            if (1..=12).contains(&month) {
                Some(YearMonth { year, month })
            } else {
                None
            }
        }

        pub fn from_date(date: &NaiveDate) -> YearMonth {
            YearMonth {
                year: date.year(),
                month: date.month(),
            }
        }

        pub fn year(&self) -> i32 {
            self.year
        }

        pub fn month(&self) -> u32 {
            self.month
        }

        /// Step back `n` months, rolling the year over as needed.
        pub fn minus_months(self, n: u32) -> YearMonth {
            let total = self.year * 12 + (self.month as i32 - 1) - n as i32;
            YearMonth {
                year: total.div_euclid(12),
                month: total.rem_euclid(12) as u32 + 1,
            }
        }

        /// First day of the month, used as the reporting date of a bulletin.
        pub fn first_day(&self) -> NaiveDate {
            NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
        }

        /// "YYYY-MM"
        pub fn key(&self) -> String {
            format!("{:04}-{:02}", self.year, self.month)
        }

        /// "YYYY_MM", the prefix of monthly index file names.
        pub fn file_stem(&self) -> String {
            format!("{:04}_{:02}", self.year, self.month)
        }
    }

    impl fmt::Display for YearMonth {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.key())
        }
    }

    /// The most recent bulletin month that is complete on `today`.
    ///
    /// Before the 17th the previous month may still be provisional, so the
    /// window reaches two months back; from the 17th on, one month back.
    pub fn reporting_month(today: &NaiveDate) -> YearMonth {
        let current = YearMonth::from_date(today);
        if today.day() < BULLETIN_PUBLICATION_DAY {
            current.minus_months(2)
        } else {
            current.minus_months(1)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_reporting_month_before_publication_day() {
            for day in 1..=16 {
                let today = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
                assert_eq!(reporting_month(&today), YearMonth::new(2024, 4).unwrap());
            }
        }

        #[test]
        fn test_reporting_month_from_publication_day() {
            for day in 17..=30 {
                let today = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
                assert_eq!(reporting_month(&today), YearMonth::new(2024, 5).unwrap());
            }
            let today = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
            assert_eq!(reporting_month(&today), YearMonth::new(2024, 6).unwrap());
        }

        #[test]
        fn test_reporting_month_rolls_year() {
            let jan5 = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
            assert_eq!(reporting_month(&jan5), YearMonth::new(2024, 11).unwrap());

            let feb3 = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
            assert_eq!(reporting_month(&feb3), YearMonth::new(2024, 12).unwrap());

            let jan20 = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
            assert_eq!(reporting_month(&jan20), YearMonth::new(2024, 12).unwrap());
        }

        #[test]
        fn test_minus_months() {
            let ym = YearMonth::new(2024, 3).unwrap();
            assert_eq!(ym.minus_months(0), ym);
            assert_eq!(ym.minus_months(3), YearMonth::new(2023, 12).unwrap());
            assert_eq!(ym.minus_months(15), YearMonth::new(2022, 12).unwrap());
        }

        #[test]
        fn test_month_keys() {
            let ym = YearMonth::new(2024, 3).unwrap();
            assert_eq!(ym.key(), "2024-03");
            assert_eq!(ym.file_stem(), "2024_03");
            assert_eq!(ym.first_day(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
            assert!(YearMonth::new(2024, 13).is_none());
            assert!(YearMonth::new(2024, 0).is_none());
        }

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
            assert!(parse_date("15/06/2023").is_err());
        }
    }
}

/// Text normalization
pub mod text {
    const ACCENTED: [(char, char); 10] = [
        ('Á', 'A'),
        ('É', 'E'),
        ('Í', 'I'),
        ('Ó', 'O'),
        ('Ú', 'U'),
        ('á', 'a'),
        ('é', 'e'),
        ('í', 'i'),
        ('ó', 'o'),
        ('ú', 'u'),
    ];

    /// Normalize a commune name for lookups: trimmed, acute vowels
    /// unaccented, uppercase. Other letters (e.g. `Ñ`) are kept.
    pub fn normalize_commune_name(name: &str) -> String {
        name.trim()
            .chars()
            .map(|c| {
                ACCENTED
                    .iter()
                    .find(|(accented, _)| *accented == c)
                    .map_or(c, |(_, plain)| *plain)
            })
            .collect::<String>()
            .to_uppercase()
    }

}

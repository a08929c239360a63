//! Cumulative, day-bucketed catalog growth report

use std::collections::BTreeMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use tally_core::types::{format_report_date, report_date, Timestamp};

/// Packages first seen on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Packages whose earliest upload falls on this day
    pub new: usize,
    /// Packages seen up to and including this day
    pub total: usize,
}

/// Growth report keyed by day, in chronological order.
///
/// Only days with at least one new package appear. Serializes as an object
/// whose keys are `M/D/YYYY` dates in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    days: Vec<(NaiveDate, ReportEntry)>,
}

impl Report {
    /// Bucket timestamps by UTC day and accumulate running totals
    pub fn from_timestamps<I>(timestamps: I) -> Self
    where
        I: IntoIterator<Item = Timestamp>,
    {
        let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for timestamp in timestamps {
            *counts.entry(report_date(&timestamp)).or_default() += 1;
        }

        let mut total = 0;
        let days = counts
            .into_iter()
            .map(|(date, new)| {
                total += new;
                (date, ReportEntry { new, total })
            })
            .collect();

        Self { days }
    }

    /// Days in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, ReportEntry)> + '_ {
        self.days.iter().copied()
    }

    /// Entry for a formatted `M/D/YYYY` date
    pub fn get(&self, date: &str) -> Option<ReportEntry> {
        self.days
            .iter()
            .find(|(day, _)| format_report_date(*day) == date)
            .map(|(_, entry)| *entry)
    }

    /// Number of days with new packages
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Packages counted across the whole report
    pub fn total(&self) -> usize {
        self.days.last().map_or(0, |(_, entry)| entry.total)
    }

    /// Report keyed by formatted date, preserving chronological order
    pub fn to_map(&self) -> IndexMap<String, ReportEntry> {
        self.days
            .iter()
            .map(|(day, entry)| (format_report_date(*day), *entry))
            .collect()
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.days
                .iter()
                .map(|(day, entry)| (format_report_date(*day), entry)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_groups_by_day_with_running_total() {
        let report = Report::from_timestamps([at(2016, 1, 1, 3), at(2016, 1, 2, 0), at(2016, 1, 1, 22)]);

        assert_eq!(report.len(), 2);
        assert_eq!(report.get("1/1/2016"), Some(ReportEntry { new: 2, total: 2 }));
        assert_eq!(report.get("1/2/2016"), Some(ReportEntry { new: 1, total: 3 }));
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_days_sort_chronologically_not_lexically() {
        // "10/1/2015" sorts before "9/30/2015" as a string
        let report = Report::from_timestamps([at(2015, 10, 1, 0), at(2015, 9, 30, 0), at(2014, 12, 25, 0)]);

        let keys: Vec<String> = report.to_map().into_keys().collect();
        assert_eq!(keys, vec!["12/25/2014", "9/30/2015", "10/1/2015"]);

        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"12/25/2014":{"new":1,"total":1},"9/30/2015":{"new":1,"total":2},"10/1/2015":{"new":1,"total":3}}"#
        );
    }

    #[test]
    fn test_empty_report() {
        let report = Report::from_timestamps(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.total(), 0);
        assert_eq!(serde_json::to_string(&report).unwrap(), "{}");
    }

    proptest! {
        #[test]
        fn prop_totals_are_cumulative(secs in prop::collection::vec(0i64..2_000_000_000i64, 0..64)) {
            let timestamps: Vec<Timestamp> =
                secs.iter().map(|s| Utc.timestamp_opt(*s, 0).unwrap()).collect();
            let report = Report::from_timestamps(timestamps);

            let mut running = 0;
            let mut previous: Option<NaiveDate> = None;
            for (day, entry) in report.iter() {
                prop_assert!(entry.new > 0);
                prop_assert!(previous.map_or(true, |p| p < day));
                running += entry.new;
                prop_assert_eq!(entry.total, running);
                previous = Some(day);
            }
            prop_assert_eq!(report.total(), secs.len());
        }
    }
}

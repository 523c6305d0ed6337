use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use crate::date::PurchaseDate;

/// Holds the sales records loaded from a royalty report.
///
/// To create a new, empty `Report`, use [`Report::new`].
///
/// To add sales data, use [`Report::read_csv`] (or [`Report::add_sale`] for
/// individual records).
///
/// To aggregate, use [`Report::daily_totals`] for combined daily sales or
/// [`Report::per_title`] for a per-book breakdown suitable for stacking.
#[derive(Debug, Default)]
pub struct Report {
    records: Vec<Record>,
}

impl Report {
    /// Creates a new, empty report with no sales data.
    #[must_use]
    pub fn new() -> Report {
        Self::default()
    }

    /// Reads sales records from the CSV file at `path`, and adds them to the
    /// report.
    ///
    /// # Errors
    ///
    /// Returns any errors from opening or parsing the CSV file.
    pub fn read_csv(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let mut rdr = csv::Reader::from_path(&path)?;
        for result in rdr.deserialize() {
            let record: Record = result.with_context(|| format!("{}", path.as_ref().display()))?;
            self.records.push(record);
        }
        debug!(
            "{} records loaded from {}",
            self.records.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Adds a single sale of `title` on `date` to the report.
    pub fn add_sale(&mut self, date: NaiveDate, title: &str) {
        self.records.push(Record {
            date: date.into(),
            title: title.to_string(),
        });
    }

    /// Returns the total number of sales records in the report.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the report contains no sales records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of sales on each date, across all books.
    ///
    /// One entry per distinct date in the data, in ascending date order. The
    /// counts sum to [`Report::len`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use royalties::Report;
    ///
    /// let day = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
    /// let mut report = Report::new();
    /// report.add_sale(day, "The Python Apprentice");
    /// report.add_sale(day, "The Python Journeyman");
    /// assert_eq!(report.daily_totals(), vec![(day, 2)]);
    /// ```
    #[must_use]
    pub fn daily_totals(&self) -> Vec<(NaiveDate, u64)> {
        let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.date.0).or_default() += 1;
        }
        totals.into_iter().collect()
    }

    /// Returns the per-book daily sales breakdown for `titles`.
    ///
    /// The breakdown covers every date on which at least one of the given
    /// titles sold, and carries one series per given title, in the given
    /// order, aligned to those dates. A title with no sales on some date has
    /// a zero there; a title with no sales at all yields an all-zero series.
    ///
    /// Dates on which only *other* titles sold are not covered. When `titles`
    /// names every title in the data, the series for a date sum to the
    /// [`Report::daily_totals`] count for that date.
    #[must_use]
    pub fn per_title(&self, titles: &[String]) -> TitleBreakdown {
        let mut groups: BTreeMap<(NaiveDate, &str), u64> = BTreeMap::new();
        for record in &self.records {
            *groups
                .entry((record.date.0, record.title.as_str()))
                .or_default() += 1;
        }
        let charts: Vec<DailyCounts> = titles
            .iter()
            .map(|title| {
                DailyCounts(
                    groups
                        .iter()
                        .filter(|((_, t), _)| *t == title.as_str())
                        .map(|((date, _), count)| (*date, *count))
                        .collect(),
                )
            })
            .collect();
        let dates: Vec<NaiveDate> = charts
            .iter()
            .flat_map(DailyCounts::dates)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let series = titles
            .iter()
            .zip(&charts)
            .map(|(title, chart)| TitleSeries {
                title: title.clone(),
                counts: dates.iter().map(|&date| chart.count_on(date)).collect(),
            })
            .collect();
        TitleBreakdown { dates, series }
    }
}

/// Defines the CSV format for royalty-report sales data.
///
/// Columns beyond these two are ignored.
#[derive(Debug, Deserialize)]
pub struct Record {
    #[serde(rename = "Date Purchased (UTC)", alias = "Date Purchased")]
    pub date: PurchaseDate,
    #[serde(rename = "Book Title", alias = "Title")]
    pub title: String,
}

/// Counts of sales per date for one book.
///
/// Lookup falls back to zero: a date with no recorded sales answers 0, not
/// an absence.
#[derive(Debug, Default)]
pub struct DailyCounts(BTreeMap<NaiveDate, u64>);

impl DailyCounts {
    /// Returns the number of sales on `date`, or zero if none were recorded.
    #[must_use]
    pub fn count_on(&self, date: NaiveDate) -> u64 {
        self.0.get(&date).copied().unwrap_or(0)
    }

    /// Returns the dates with at least one recorded sale, in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.keys().copied()
    }
}

/// Daily sales of several books, aligned on a common set of dates.
#[derive(Debug)]
pub struct TitleBreakdown {
    /// Every date on which any of the requested titles sold, ascending.
    pub dates: Vec<NaiveDate>,
    /// One series per requested title, in request order; each series has one
    /// count per entry in `dates`.
    pub series: Vec<TitleSeries>,
}

/// Daily sales counts for a single book title.
#[derive(Debug)]
pub struct TitleSeries {
    pub title: String,
    pub counts: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn read_csv_fn_correctly_parses_leanpub_data() {
        let mut report = Report::new();
        report.read_csv("testdata/leanpub.csv").unwrap();
        assert_eq!(report.len(), 8, "wrong record count");
    }

    #[test]
    fn read_csv_fn_returns_error_for_missing_date_column() {
        let mut report = Report::new();
        assert!(report.read_csv("testdata/headers.bad.csv").is_err());
    }

    #[test]
    fn daily_totals_fn_counts_sales_per_date() {
        let mut report = Report::new();
        report.read_csv("testdata/leanpub.csv").unwrap();
        assert_eq!(
            report.daily_totals(),
            vec![
                (date("2021-01-04"), 3),
                (date("2021-01-05"), 2),
                (date("2021-01-07"), 3),
            ]
        );
    }

    #[test]
    fn daily_totals_sum_to_record_count() {
        let mut report = Report::new();
        report.read_csv("testdata/leanpub.csv").unwrap();
        let total: u64 = report.daily_totals().iter().map(|(_, count)| count).sum();
        assert_eq!(total, report.len() as u64);
    }

    #[test]
    fn per_title_fn_aligns_series_on_common_dates() {
        let mut report = Report::new();
        report.read_csv("testdata/leanpub.csv").unwrap();
        let breakdown = report.per_title(&titles(&[
            "The Python Apprentice",
            "The Python Journeyman",
            "The Python Master",
        ]));
        assert_eq!(
            breakdown.dates,
            vec![
                date("2021-01-04"),
                date("2021-01-05"),
                date("2021-01-07"),
            ]
        );
        let counts: Vec<Vec<u64>> = breakdown.series.iter().map(|s| s.counts.clone()).collect();
        assert_eq!(counts, vec![vec![2, 1, 1], vec![1, 0, 1], vec![0, 1, 1]]);
    }

    #[test]
    fn per_title_fn_handles_two_titles_over_two_dates() {
        let mut report = Report::new();
        report.add_sale(date("2021-01-01"), "A");
        report.add_sale(date("2021-01-01"), "B");
        report.add_sale(date("2021-01-02"), "A");
        assert_eq!(
            report.daily_totals(),
            vec![(date("2021-01-01"), 2), (date("2021-01-02"), 1)]
        );
        let breakdown = report.per_title(&titles(&["A", "B"]));
        assert_eq!(breakdown.dates, vec![date("2021-01-01"), date("2021-01-02")]);
        assert_eq!(breakdown.series[0].counts, vec![1, 1]);
        assert_eq!(breakdown.series[1].counts, vec![1, 0]);
    }

    #[test]
    fn per_title_fn_returns_empty_breakdown_for_empty_report() {
        let report = Report::new();
        assert!(report.is_empty());
        assert_eq!(report.daily_totals(), vec![]);
        let breakdown = report.per_title(&titles(&["A", "B"]));
        assert!(breakdown.dates.is_empty());
        assert_eq!(breakdown.series.len(), 2);
        assert!(breakdown.series.iter().all(|s| s.counts.is_empty()));
    }

    #[test]
    fn per_title_fn_zero_fills_title_with_no_sales() {
        let mut report = Report::new();
        report.add_sale(date("2021-01-01"), "A");
        report.add_sale(date("2021-01-02"), "A");
        let breakdown = report.per_title(&titles(&["A", "Unsold"]));
        assert_eq!(breakdown.dates.len(), 2);
        assert_eq!(breakdown.series[1].title, "Unsold");
        assert_eq!(breakdown.series[1].counts, vec![0, 0]);
    }

    #[test]
    fn per_title_fn_ignores_dates_sold_only_under_other_titles() {
        let mut report = Report::new();
        report.add_sale(date("2021-01-01"), "A");
        report.add_sale(date("2021-01-02"), "Unlisted");
        let breakdown = report.per_title(&titles(&["A"]));
        assert_eq!(breakdown.dates, vec![date("2021-01-01")]);
        assert_eq!(breakdown.series[0].counts, vec![1]);
    }

    #[test]
    fn aggregators_are_idempotent() {
        let mut report = Report::new();
        report.read_csv("testdata/leanpub.csv").unwrap();
        assert_eq!(report.daily_totals(), report.daily_totals());
        let names = titles(&["The Python Apprentice", "The Python Master"]);
        let first = report.per_title(&names);
        let second = report.per_title(&names);
        assert_eq!(first.dates, second.dates);
        for (a, b) in first.series.iter().zip(&second.series) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.counts, b.counts);
        }
    }
}

#![doc = include_str!("../README.md")]

pub mod chart;
pub mod date;
pub mod report;

pub use chart::BarChart;
pub use date::PurchaseDate;
pub use report::{DailyCounts, Record, Report, TitleBreakdown, TitleSeries};

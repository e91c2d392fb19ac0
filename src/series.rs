//! Time Series Builder. Turns per-day estimates into an ordered series with calendar features.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::volume::DayEstimate;

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no usable days to analyze")]
pub struct EmptyInputError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub tx_count: Option<u64>,
}

impl From<DayEstimate> for DayRecord {
    fn from(estimate: DayEstimate) -> Self {
        Self {
            date: estimate.date,
            tx_count: estimate.tx_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesDay {
    pub date: NaiveDate,
    pub tx_count: u64,
    /// 0 is Monday.
    pub weekday: u8,
    pub day_name: &'static str,
    pub is_weekend: bool,
    pub month: u32,
}

impl SeriesDay {
    pub fn new(date: NaiveDate, tx_count: u64) -> Self {
        let weekday = date.weekday().num_days_from_monday() as u8;
        Self {
            date,
            tx_count,
            weekday,
            day_name: DAY_NAMES[weekday as usize],
            is_weekend: weekday >= 5,
            month: date.month(),
        }
    }
}

/// Days ordered by date, without duplicates. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    days: Vec<SeriesDay>,
}

/// Builds the series. Records without a count are dropped, a date seen twice keeps the last
/// record.
pub fn build(records: impl IntoIterator<Item = DayRecord>) -> Result<DailySeries, EmptyInputError> {
    let mut by_date = BTreeMap::new();
    for record in records {
        by_date.insert(record.date, record.tx_count);
    }

    let days: Vec<SeriesDay> = by_date
        .into_iter()
        .filter_map(|(date, tx_count)| tx_count.map(|tx_count| SeriesDay::new(date, tx_count)))
        .collect();

    if days.is_empty() {
        return Err(EmptyInputError);
    }

    Ok(DailySeries { days })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekendSummary {
    pub weekday_mean: Option<f64>,
    pub weekend_mean: Option<f64>,
    /// Weekend minus weekday.
    pub difference: Option<f64>,
    /// Difference as a percentage of the weekday mean.
    pub percent_difference: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfWeekSummary {
    pub day_name: &'static str,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub count: usize,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

impl DailySeries {
    pub fn days(&self) -> &[SeriesDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.days[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.days[self.days.len() - 1].date
    }

    fn counts_where(&self, weekend: bool) -> Vec<f64> {
        self.days
            .iter()
            .filter(|day| day.is_weekend == weekend)
            .map(|day| day.tx_count as f64)
            .collect()
    }

    pub fn weekday_counts(&self) -> Vec<f64> {
        self.counts_where(false)
    }

    pub fn weekend_counts(&self) -> Vec<f64> {
        self.counts_where(true)
    }

    /// Counts per day of the week, Monday first. Days without data are empty.
    pub fn day_of_week_groups(&self) -> [Vec<f64>; 7] {
        let mut groups: [Vec<f64>; 7] = Default::default();
        for day in &self.days {
            groups[day.weekday as usize].push(day.tx_count as f64);
        }
        groups
    }

    pub fn weekend_summary(&self) -> WeekendSummary {
        let weekday_mean = mean(&self.weekday_counts());
        let weekend_mean = mean(&self.weekend_counts());
        let difference = weekday_mean
            .zip(weekend_mean)
            .map(|(weekday, weekend)| weekend - weekday);
        let percent_difference = difference
            .zip(weekday_mean)
            .filter(|(_, weekday)| *weekday != 0.0)
            .map(|(difference, weekday)| difference / weekday * 100.0);

        WeekendSummary {
            weekday_mean,
            weekend_mean,
            difference,
            percent_difference,
        }
    }

    pub fn day_of_week_summary(&self) -> Vec<DayOfWeekSummary> {
        self.day_of_week_groups()
            .iter()
            .enumerate()
            .filter_map(|(index, counts)| {
                mean(counts).map(|mean| DayOfWeekSummary {
                    day_name: DAY_NAMES[index],
                    mean,
                    std_dev: sample_std_dev(counts),
                    count: counts.len(),
                })
            })
            .collect()
    }
}

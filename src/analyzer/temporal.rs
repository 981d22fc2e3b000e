use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::aggregate::CumulativePoint;

/// Time bucket used by growth-over-time charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Auto,
    Day,
    Week,
    Month,
    Quarter,
}

impl Granularity {
    /// Header label, e.g. "Monthly".
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Auto => "Automatic",
            Granularity::Day => "Daily",
            Granularity::Week => "Weekly",
            Granularity::Month => "Monthly",
            Granularity::Quarter => "Quarterly",
        }
    }

    /// Replaces `Auto` by the bucket suited to the `[from, to]` span.
    pub fn resolve(self, from: NaiveDate, to: NaiveDate) -> Granularity {
        match self {
            Granularity::Auto => auto_granularity((to - from).num_days()),
            other => other,
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Granularity::Auto),
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            "quarter" | "quarterly" => Ok(Granularity::Quarter),
            other => Err(format!("unknown time frame: {}", other)),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Determines granularity automatically based on number of days in range.
/// ≤ 14 days → day, < 30 days → week, < 365 days → month, else → quarter
pub fn auto_granularity(days: i64) -> Granularity {
    if days <= 14 {
        Granularity::Day
    } else if days < 30 {
        Granularity::Week
    } else if days < 365 {
        Granularity::Month
    } else {
        Granularity::Quarter
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub key: String,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPoint {
    pub key: String,
    pub label: String,
    pub cumulative: f64,
}

/// Generates every period touching `[date_from, date_to]`.
/// `Auto` is resolved from the span first.
pub fn generate_periods(date_from: NaiveDate, date_to: NaiveDate, granularity: Granularity) -> Vec<Period> {
    match granularity.resolve(date_from, date_to) {
        Granularity::Day => generate_day_keys(date_from, date_to),
        Granularity::Week => generate_week_keys(date_from, date_to),
        Granularity::Quarter => generate_quarter_keys(date_from, date_to),
        _ => generate_month_keys(date_from, date_to),
    }
}

/// Collapses a sorted cumulative series onto periods. Each period holds the
/// last cumulative value reached by its end; empty periods carry the previous
/// value forward. `bounds` defaults to the first and last point.
pub fn bucket_cumulative(
    points: &[CumulativePoint],
    bounds: Option<(NaiveDate, NaiveDate)>,
    granularity: Granularity,
) -> Vec<PeriodPoint> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f.date, l.date),
        _ => return Vec::new(),
    };
    let (from, to) = bounds.unwrap_or((first, last));
    if from > to {
        return Vec::new();
    }

    let mut cursor = 0;
    let mut cumulative = 0.0;
    generate_periods(from, to, granularity)
        .into_iter()
        .map(|period| {
            while cursor < points.len() && points[cursor].date <= period.end {
                cumulative = points[cursor].cumulative;
                cursor += 1;
            }
            PeriodPoint {
                key: period.key,
                label: period.label,
                cumulative,
            }
        })
        .collect()
}

fn generate_day_keys(date_from: NaiveDate, date_to: NaiveDate) -> Vec<Period> {
    let mut result = Vec::new();
    let mut current = date_from;

    while current <= date_to {
        result.push(Period {
            key: current.format("%Y-%m-%d").to_string(),
            label: format!("{} {}", short_month_name(current.month()), current.day()),
            start: current,
            end: current,
        });
        current += Duration::days(1);
    }

    result
}

fn generate_week_keys(date_from: NaiveDate, date_to: NaiveDate) -> Vec<Period> {
    let mut result = Vec::new();

    // Find the Monday of the week containing date_from
    let days_from_monday = date_from.weekday().num_days_from_monday() as i64;
    let mut current_monday = date_from - Duration::days(days_from_monday);

    while current_monday <= date_to {
        let iw = current_monday.iso_week();
        result.push(Period {
            key: format!("{:04}-W{:02}", iw.year(), iw.week()),
            label: format!("Wk {}", iw.week()),
            start: current_monday,
            end: current_monday + Duration::days(6),
        });
        current_monday += Duration::days(7);
    }

    result
}

fn generate_month_keys(date_from: NaiveDate, date_to: NaiveDate) -> Vec<Period> {
    let mut result = Vec::new();
    let mut year = date_from.year();
    let mut month = date_from.month();

    while (year, month) <= (date_to.year(), date_to.month()) {
        let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) else {
            break;
        };
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .map(|d| d - Duration::days(1))
            .unwrap_or(start);

        result.push(Period {
            key: format!("{:04}-{:02}", year, month),
            label: format!("{} {}", short_month_name(month), year),
            start,
            end,
        });

        year = next_year;
        month = next_month;
    }

    result
}

fn generate_quarter_keys(date_from: NaiveDate, date_to: NaiveDate) -> Vec<Period> {
    let mut result = Vec::new();
    let mut year = date_from.year();
    let mut quarter = (date_from.month() - 1) / 3 + 1;
    let end_quarter = (date_to.month() - 1) / 3 + 1;

    while (year, quarter) <= (date_to.year(), end_quarter) {
        let start_month = (quarter - 1) * 3 + 1;
        let Some(start) = NaiveDate::from_ymd_opt(year, start_month, 1) else {
            break;
        };
        let (next_year, next_quarter) = if quarter == 4 { (year + 1, 1) } else { (year, quarter + 1) };
        let end = NaiveDate::from_ymd_opt(next_year, (next_quarter - 1) * 3 + 1, 1)
            .map(|d| d - Duration::days(1))
            .unwrap_or(start);

        result.push(Period {
            key: format!("{:04}-Q{}", year, quarter),
            label: format!("Q{} {}", quarter, year),
            start,
            end,
        });

        year = next_year;
        quarter = next_quarter;
    }

    result
}

fn short_month_name(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "???",
    }
}

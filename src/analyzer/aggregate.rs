use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::stats;
use crate::dataset::coerce::{date_value, numeric_value};
use crate::dataset::{Scalar, SubView};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotal {
    pub key: Scalar,
    pub total: f64,
    pub rows: usize,
}

/// Outcome of averaging a column. `NoData` is distinct from a real 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum Mean {
    Value(f64),
    NoData,
}

impl Mean {
    pub fn value(&self) -> Option<f64> {
        match self {
            Mean::Value(v) => Some(*v),
            Mean::NoData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub value: f64,
    pub cumulative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub label: String,
    pub value: f64,
}

/// Sums `value_field` per distinct `key_field`, groups in first-appearance
/// order. Rows with a missing key share one `Missing` group so that the
/// group totals always add up to [`total`] over the same view.
pub fn grouped_sum(
    view: &SubView<'_>,
    key_field: &str,
    value_field: &str,
) -> Result<Vec<GroupTotal>, AppError> {
    let key_idx = view.source().column_index(key_field)?;
    let value_idx = view.source().column_index(value_field)?;

    let mut groups: Vec<GroupTotal> = Vec::new();
    let mut positions: HashMap<Option<String>, usize> = HashMap::new();

    for row in view.rows() {
        let key = &row[key_idx];
        let value = numeric_value(value_field, &row[value_idx])?.unwrap_or(0.0);
        let lookup = if key.is_missing() {
            None
        } else {
            Some(key.to_string())
        };
        let pos = *positions.entry(lookup).or_insert_with(|| {
            groups.push(GroupTotal {
                key: key.clone(),
                total: 0.0,
                rows: 0,
            });
            groups.len() - 1
        });
        groups[pos].total += value;
        groups[pos].rows += 1;
    }

    Ok(groups)
}

/// Ungrouped sum of `field`; missing cells count for nothing.
pub fn total(view: &SubView<'_>, field: &str) -> Result<f64, AppError> {
    let values = numeric_values(view, field)?;
    Ok(stats::sum(&values))
}

/// Mean of `field` over the view, skipping missing cells.
pub fn mean(view: &SubView<'_>, field: &str) -> Result<Mean, AppError> {
    let values = numeric_values(view, field)?;
    Ok(stats::mean(&values).map_or(Mean::NoData, Mean::Value))
}

/// Sorts the view by `date_field` (stable) and running-totals `value_field`.
/// Rows without a date are dropped, a missing value adds zero.
pub fn cumulative_sum(
    view: &SubView<'_>,
    date_field: &str,
    value_field: &str,
) -> Result<Vec<CumulativePoint>, AppError> {
    let date_idx = view.source().column_index(date_field)?;
    let value_idx = view.source().column_index(value_field)?;

    let mut dated = Vec::with_capacity(view.len());
    for row in view.rows() {
        if let Some(date) = date_value(date_field, &row[date_idx])? {
            let value = numeric_value(value_field, &row[value_idx])?.unwrap_or(0.0);
            dated.push((date, value));
        }
    }
    dated.sort_by_key(|(date, _)| *date);

    let values: Vec<f64> = dated.iter().map(|(_, v)| *v).collect();
    let running = stats::running_total(&values);

    Ok(dated
        .into_iter()
        .zip(running)
        .map(|((date, value), cumulative)| CumulativePoint {
            date,
            value,
            cumulative,
        })
        .collect())
}

/// Reads `fields` from the first row of the view, e.g. the stages of a
/// funnel. An empty view has no stages.
pub fn first_record_stages(view: &SubView<'_>, fields: &[&str]) -> Result<Vec<Stage>, AppError> {
    let Some(row) = view.rows().next() else {
        return Ok(Vec::new());
    };
    fields
        .iter()
        .map(|field| {
            let idx = view.source().column_index(field)?;
            Ok(Stage {
                label: field.to_string(),
                value: numeric_value(field, &row[idx])?.unwrap_or(0.0),
            })
        })
        .collect()
}

fn numeric_values(view: &SubView<'_>, field: &str) -> Result<Vec<f64>, AppError> {
    let mut values = Vec::with_capacity(view.len());
    for cell in view.column(field)? {
        if let Some(v) = numeric_value(field, cell)? {
            values.push(v);
        }
    }
    Ok(values)
}

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::coerce::date_value;
use crate::dataset::{Scalar, SubView};
use crate::error::AppError;

/// Value a control sends to disable filtering on its field.
pub const ALL: &str = "All";

/// Current value of one control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FilterValue {
    All,
    Value { value: Scalar },
    Range { start: NaiveDate, end: NaiveDate },
}

impl FilterValue {
    /// Wraps a single control value, mapping the "All" text to [`FilterValue::All`].
    pub fn from_scalar(value: Scalar) -> Self {
        match &value {
            Scalar::Text(t) if t == ALL => FilterValue::All,
            _ => FilterValue::Value { value },
        }
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        FilterValue::Range { start, end }
    }
}

/// Filter selections keyed by control id. One entry per control.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    values: BTreeMap<String, FilterValue>,
}

impl Selection {
    pub fn get(&self, control_id: &str) -> Option<&FilterValue> {
        self.values.get(control_id)
    }

    pub fn contains(&self, control_id: &str) -> bool {
        self.values.contains_key(control_id)
    }

    /// Stores `value` and returns the previous selection of the control.
    pub fn set(&mut self, control_id: &str, value: FilterValue) -> Option<FilterValue> {
        self.values.insert(control_id.to_string(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Equality filter: keeps the rows whose `field` matches the selected value.
/// `All` keeps everything.
pub fn equals<'a>(
    view: &SubView<'a>,
    field: &str,
    selection: &FilterValue,
) -> Result<SubView<'a>, AppError> {
    let idx = view.source().column_index(field)?;
    match selection {
        FilterValue::All => Ok(view.clone()),
        FilterValue::Value { value } => Ok(view.retain(|row| row[idx].matches(value))),
        FilterValue::Range { .. } => Err(AppError::InvalidSelection {
            target: field.to_string(),
            reason: "a date range cannot drive an equality filter".to_string(),
        }),
    }
}

/// Range filter: keeps the rows whose date `field` lies in `[start, end]`.
/// `start > end` yields an empty view; rows without a date are dropped.
pub fn within<'a>(
    view: &SubView<'a>,
    field: &str,
    selection: &FilterValue,
) -> Result<SubView<'a>, AppError> {
    let idx = view.source().column_index(field)?;
    match selection {
        FilterValue::All => Ok(view.clone()),
        FilterValue::Range { start, end } if start > end => Ok(view.retain(|_| false)),
        FilterValue::Range { start, end } => view.try_retain(|row| {
            Ok(date_value(field, &row[idx])?.map_or(false, |d| *start <= d && d <= *end))
        }),
        FilterValue::Value { .. } => Err(AppError::InvalidSelection {
            target: field.to_string(),
            reason: "a range filter needs a start and an end date".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ResultSet;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn subscribers() -> ResultSet {
        ResultSet::new(
            vec!["Region", "StreamingPlatform", "SignupDate"],
            vec![
                vec!["Taiwan".into(), "HBO Max".into(), Scalar::Date(day("2024-01-03"))],
                vec!["Japan".into(), "Netflix".into(), Scalar::Date(day("2024-01-20"))],
                vec!["Taiwan".into(), "Netflix".into(), Scalar::Missing],
                vec!["Korea".into(), "HBO Max".into(), Scalar::Date(day("2024-02-11"))],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_scalar_all_sentinel() {
        assert_eq!(FilterValue::from_scalar(Scalar::text("All")), FilterValue::All);
        assert_eq!(
            FilterValue::from_scalar(Scalar::text("Japan")),
            FilterValue::Value { value: Scalar::text("Japan") }
        );
    }

    #[test]
    fn test_equals_keeps_matching_rows() {
        let rs = subscribers();
        let sel = FilterValue::from_scalar(Scalar::text("Taiwan"));
        let view = equals(&rs.all(), "Region", &sel).unwrap();
        assert_eq!(view.indices(), &[0, 2]);
    }

    #[test]
    fn test_equals_all_returns_everything() {
        let rs = subscribers();
        let view = equals(&rs.all(), "Region", &FilterValue::All).unwrap();
        assert_eq!(view.len(), rs.len());
        assert_eq!(view.to_result_set(), rs);
    }

    #[test]
    fn test_equals_no_match_is_empty_not_error() {
        let rs = subscribers();
        let sel = FilterValue::from_scalar(Scalar::text("Mongolia"));
        let view = equals(&rs.all(), "Region", &sel).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_equals_chains() {
        let rs = subscribers();
        let taiwan = equals(&rs.all(), "Region", &FilterValue::from_scalar("Taiwan".into())).unwrap();
        let view = equals(&taiwan, "StreamingPlatform", &FilterValue::from_scalar("Netflix".into())).unwrap();
        assert_eq!(view.indices(), &[2]);
    }

    #[test]
    fn test_equals_rejects_range_and_unknown_column() {
        let rs = subscribers();
        let range = FilterValue::range(day("2024-01-01"), day("2024-12-31"));
        assert!(matches!(
            equals(&rs.all(), "Region", &range),
            Err(AppError::InvalidSelection { .. })
        ));
        assert!(matches!(
            equals(&rs.all(), "Country", &FilterValue::All),
            Err(AppError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_within_inclusive_bounds() {
        let rs = subscribers();
        let range = FilterValue::range(day("2024-01-03"), day("2024-01-20"));
        let view = within(&rs.all(), "SignupDate", &range).unwrap();
        assert_eq!(view.indices(), &[0, 1]);
    }

    #[test]
    fn test_within_inverted_range_is_empty() {
        let rs = subscribers();
        let range = FilterValue::range(day("2024-03-01"), day("2024-01-01"));
        let view = within(&rs.all(), "SignupDate", &range).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_within_propagates_coercion_failure() {
        let rs = ResultSet::new(vec!["SignupDate"], vec![vec![Scalar::text("soon")]]).unwrap();
        let range = FilterValue::range(day("2024-01-01"), day("2024-12-31"));
        assert!(matches!(
            within(&rs.all(), "SignupDate", &range),
            Err(AppError::Coercion { .. })
        ));
    }

    #[test]
    fn test_selection_set_returns_previous() {
        let mut sel = Selection::default();
        assert_eq!(sel.set("region-dropdown", FilterValue::All), None);
        let prev = sel.set("region-dropdown", FilterValue::from_scalar("Japan".into()));
        assert_eq!(prev, Some(FilterValue::All));
        assert_eq!(sel.len(), 1);
    }
}

//! The market expansion dashboard: which controls exist, what they offer,
//! and which projection and chart each one drives.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzer::{
    bucket_cumulative, cumulative_sum, equals, first_record_stages, grouped_sum, mean, within,
    FilterValue, GroupTotal, Mean, PeriodPoint, Stage, ALL,
};
use crate::chart::{render, ChartKind, ChartStyle};
use crate::config::AppConfig;
use crate::db::queries::{
    col, CAMPAIGN_EFFECTIVENESS, GENRE_PREFERENCES, SUBSCRIBER_GROWTH, SUBSCRIBER_SIGNUPS,
    USER_COMPLAINTS,
};
use crate::dataset::{Dataset, ResultSet, Scalar, SubView};
use crate::engine::Engine;
use crate::error::AppError;

// ─── Control and slot ids ─────────────────────────────────────────────────────

pub const REGION_CONTROL: &str = "region-dropdown";
pub const PLATFORM_CONTROL: &str = "platform-dropdown";
pub const LANGUAGE_CONTROL: &str = "language-dropdown";
pub const CAMPAIGN_CONTROL: &str = "campaign-dropdown";
pub const DATE_CONTROL: &str = "date-dropdown";
pub const SIGNUP_RANGE_CONTROL: &str = "signup-range";

pub const SUBSCRIBER_GROWTH_SLOT: &str = "subscriber-growth-chart";
pub const REGION_MAP_SLOT: &str = "subscriber-region-map";
pub const GENRE_PREFERENCES_SLOT: &str = "genre-preferences-chart";
pub const CAMPAIGN_EFFECTIVENESS_SLOT: &str = "campaign-effectiveness-chart";
pub const USER_COMPLAINTS_SLOT: &str = "user-complaints-chart";
pub const GROWTH_TIMELINE_SLOT: &str = "subscriber-growth-timeline";

// ─── Page description ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub title: String,
    pub badges: Vec<String>,
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub title: String,
    pub control: Control,
    pub slot: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub id: String,
    #[serde(flatten)]
    pub widget: Widget,
    pub initial: FilterValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "camelCase")]
pub enum Widget {
    Dropdown { options: Vec<OptionItem> },
    DateRange { min: Option<NaiveDate>, max: Option<NaiveDate> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionItem {
    pub label: String,
    pub value: Scalar,
}

impl PageLayout {
    pub fn panel(&self, slot: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.slot == slot)
    }
}

// ─── Control construction ─────────────────────────────────────────────────────

fn options(values: &[Scalar]) -> Vec<OptionItem> {
    values
        .iter()
        .map(|v| OptionItem {
            label: v.to_string(),
            value: v.clone(),
        })
        .collect()
}

/// Dropdown led by an "All" entry; starts on All.
fn dropdown_with_all(id: &str, all_label: &str, values: &[Scalar]) -> Control {
    let mut items = vec![OptionItem {
        label: all_label.to_string(),
        value: Scalar::text(ALL),
    }];
    items.extend(options(values));
    Control {
        id: id.to_string(),
        widget: Widget::Dropdown { options: items },
        initial: FilterValue::All,
    }
}

/// Dropdown starting on `initial`, or on All when there is nothing to pick.
fn dropdown(id: &str, values: &[Scalar], initial: Option<&Scalar>) -> Control {
    Control {
        id: id.to_string(),
        widget: Widget::Dropdown {
            options: options(values),
        },
        initial: initial
            .map(|v| FilterValue::Value { value: v.clone() })
            .unwrap_or(FilterValue::All),
    }
}

fn date_range(id: &str, min: Option<NaiveDate>, max: Option<NaiveDate>) -> Control {
    let initial = match (min, max) {
        (Some(start), Some(end)) => FilterValue::range(start, end),
        _ => FilterValue::All,
    };
    Control {
        id: id.to_string(),
        widget: Widget::DateRange { min, max },
        initial,
    }
}

fn date_bounds(dataset: &Dataset, source: &str, column: &str) -> Result<(Option<NaiveDate>, Option<NaiveDate>), AppError> {
    date_span(&dataset.get(source)?.all(), column)
}

fn date_span(view: &SubView<'_>, column: &str) -> Result<(Option<NaiveDate>, Option<NaiveDate>), AppError> {
    let dates: Vec<NaiveDate> = view.column(column)?.filter_map(Scalar::as_date).collect();
    Ok((dates.iter().min().copied(), dates.iter().max().copied()))
}

/// Narrows a selected range to the dates the data actually covers, so an
/// oversized selection cannot produce an unbounded number of periods.
fn clamp_range(
    start: NaiveDate,
    end: NaiveDate,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
) -> Option<(NaiveDate, NaiveDate)> {
    match (first, last) {
        (Some(first), Some(last)) => Some((start.max(first), end.min(last))),
        _ => None,
    }
}

fn earliest(values: &[Scalar]) -> Option<&Scalar> {
    values
        .iter()
        .filter(|v| v.as_date().is_some())
        .min_by_key(|v| v.as_date())
}

// ─── Projections ──────────────────────────────────────────────────────────────

fn platform_totals_for_region(rs: &ResultSet, value: &FilterValue) -> Result<Vec<GroupTotal>, AppError> {
    let view = equals(&rs.all(), col::REGION, value)?;
    grouped_sum(&view, col::STREAMING_PLATFORM, col::SUBSCRIBER_COUNT)
}

fn region_totals_for_platform(rs: &ResultSet, value: &FilterValue) -> Result<Vec<GroupTotal>, AppError> {
    let view = equals(&rs.all(), col::STREAMING_PLATFORM, value)?;
    grouped_sum(&view, col::REGION, col::SUBSCRIBER_COUNT)
}

fn genre_views_for_language(rs: &ResultSet, value: &FilterValue) -> Result<Vec<GroupTotal>, AppError> {
    let view = equals(&rs.all(), col::LANGUAGE, value)?;
    grouped_sum(&view, col::GENRE, col::VIEWS)
}

/// Impressions, clicks and conversions of the selected campaign's first row.
/// Conversions are shown as whole numbers.
fn campaign_funnel(rs: &ResultSet, value: &FilterValue) -> Result<Vec<Stage>, AppError> {
    let view = equals(&rs.all(), col::CAMPAIGN_NAME, value)?;
    let mut stages = first_record_stages(&view, &[col::IMPRESSIONS, col::CLICKS, col::CONVERSION])?;
    for stage in stages.iter_mut().filter(|s| s.label == col::CONVERSION) {
        stage.value = stage.value.trunc();
    }
    Ok(stages)
}

fn complaints_on_date(rs: &ResultSet, value: &FilterValue) -> Result<Mean, AppError> {
    let view = equals(&rs.all(), col::DATE, value)?;
    mean(&view, col::USER_COMPLAINTS)
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Builds the page description and an engine with every panel bound.
/// The dataset is moved into the engine; nothing is rendered yet.
pub fn build_dashboard(dataset: Dataset, config: &AppConfig) -> Result<(Engine, PageLayout), AppError> {
    let regions = dataset.distinct(SUBSCRIBER_GROWTH, col::REGION);
    let platforms = dataset.distinct(SUBSCRIBER_GROWTH, col::STREAMING_PLATFORM);
    let languages = dataset.distinct(GENRE_PREFERENCES, col::LANGUAGE);
    let campaigns = dataset.distinct(CAMPAIGN_EFFECTIVENESS, col::CAMPAIGN_NAME);
    let dates = dataset.distinct(USER_COMPLAINTS, col::DATE);
    let (first_signup, last_signup) = date_bounds(&dataset, SUBSCRIBER_SIGNUPS, col::SIGNUP_DATE)?;

    let panel = |title: &str, control: Control, slot: &str| Panel {
        title: title.to_string(),
        control,
        slot: slot.to_string(),
    };

    let layout = PageLayout {
        title: config.title.clone(),
        badges: vec![
            "Region: All Regions".to_string(),
            format!("Time Frame: {}", config.time_frame.label()),
        ],
        panels: vec![
            panel(
                "Subscriber Growth by Streaming Platform",
                dropdown_with_all(REGION_CONTROL, "All Regions", regions),
                SUBSCRIBER_GROWTH_SLOT,
            ),
            panel(
                "Subscribers by Region",
                dropdown_with_all(PLATFORM_CONTROL, "All Platforms", platforms),
                REGION_MAP_SLOT,
            ),
            panel(
                "Genre Preferences of Taiwanese Viewers",
                dropdown(LANGUAGE_CONTROL, languages, languages.first()),
                GENRE_PREFERENCES_SLOT,
            ),
            panel(
                "Campaign Effectiveness",
                dropdown(CAMPAIGN_CONTROL, campaigns, campaigns.first()),
                CAMPAIGN_EFFECTIVENESS_SLOT,
            ),
            panel(
                "User Complaints",
                dropdown(DATE_CONTROL, dates, earliest(dates)),
                USER_COMPLAINTS_SLOT,
            ),
            panel(
                "Subscriber Growth Over Time",
                date_range(SIGNUP_RANGE_CONTROL, first_signup, last_signup),
                GROWTH_TIMELINE_SLOT,
            ),
        ],
    };

    let mut engine = Engine::new(dataset);
    for p in &layout.panels {
        engine.declare_control(&p.control.id, p.control.initial.clone())?;
    }

    engine.bind(
        REGION_CONTROL,
        SUBSCRIBER_GROWTH_SLOT,
        SUBSCRIBER_GROWTH,
        ChartStyle::new(ChartKind::Bar, "Subscriber Growth", config),
        platform_totals_for_region,
        |groups: &Vec<GroupTotal>, style: &ChartStyle| render::stacked_bars(groups, style),
    )?;

    engine.bind(
        PLATFORM_CONTROL,
        REGION_MAP_SLOT,
        SUBSCRIBER_GROWTH,
        ChartStyle::new(ChartKind::Choropleth, "Subscribers by Region", config),
        region_totals_for_platform,
        |groups: &Vec<GroupTotal>, style: &ChartStyle| render::choropleth(groups, style),
    )?;

    let palette = config.palette.clone();
    engine.bind(
        LANGUAGE_CONTROL,
        GENRE_PREFERENCES_SLOT,
        GENRE_PREFERENCES,
        ChartStyle::new(ChartKind::Bar, "Number of Views by Genre", config),
        genre_views_for_language,
        move |groups: &Vec<GroupTotal>, style: &ChartStyle| {
            render::colored_bars(groups, &palette, "Genre", style)
        },
    )?;

    engine.bind(
        CAMPAIGN_CONTROL,
        CAMPAIGN_EFFECTIVENESS_SLOT,
        CAMPAIGN_EFFECTIVENESS,
        ChartStyle::new(ChartKind::Funnel, "Campaign Effectiveness", config),
        campaign_funnel,
        |stages: &Vec<Stage>, style: &ChartStyle| render::funnel(stages, style),
    )?;

    let gauge = config.gauge.clone();
    engine.bind(
        DATE_CONTROL,
        USER_COMPLAINTS_SLOT,
        USER_COMPLAINTS,
        ChartStyle::new(ChartKind::Gauge, "User Complaints (%)", config),
        complaints_on_date,
        move |average: &Mean, style: &ChartStyle| {
            render::gauge(average.value().unwrap_or(f64::NAN), &gauge, style)
        },
    )?;

    let time_frame = config.time_frame;
    engine.bind(
        SIGNUP_RANGE_CONTROL,
        GROWTH_TIMELINE_SLOT,
        SUBSCRIBER_SIGNUPS,
        ChartStyle::new(
            ChartKind::Line,
            &format!("Cumulative Subscribers ({})", time_frame.label()),
            config,
        ),
        move |rs: &ResultSet, value: &FilterValue| -> Result<Vec<PeriodPoint>, AppError> {
            let view = within(&rs.all(), col::SIGNUP_DATE, value)?;
            let points = cumulative_sum(&view, col::SIGNUP_DATE, col::NEW_SUBSCRIBERS)?;
            let bounds = match value {
                FilterValue::Range { start, end } => {
                    let (first, last) = date_span(&rs.all(), col::SIGNUP_DATE)?;
                    clamp_range(*start, *end, first, last)
                }
                _ => None,
            };
            Ok(bucket_cumulative(&points, bounds, time_frame))
        },
        |points: &Vec<PeriodPoint>, style: &ChartStyle| render::line(points, "Subscribers", style),
    )?;

    log::info!(
        "Dashboard ready: {} panels over {} result sets",
        layout.panels.len(),
        engine.dataset().names().count()
    );
    Ok((engine, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Trace;
    use crate::db::queries::load_dataset;
    use rusqlite::Connection;

    fn fixture_dataset() -> Dataset {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("db/sql/fixture.sql")).unwrap();
        load_dataset(&conn).unwrap()
    }

    fn built() -> (Engine, PageLayout) {
        build_dashboard(fixture_dataset(), &AppConfig::default()).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_layout_controls_and_initial_values() {
        let (_, layout) = built();
        assert_eq!(layout.panels.len(), 6);
        assert_eq!(layout.badges[1], "Time Frame: Monthly");

        let region = &layout.panel(SUBSCRIBER_GROWTH_SLOT).unwrap().control;
        assert_eq!(region.initial, FilterValue::All);
        match &region.widget {
            Widget::Dropdown { options } => {
                assert_eq!(options[0].label, "All Regions");
                assert_eq!(options[0].value, Scalar::text("All"));
                assert_eq!(options.len(), 6);
            }
            other => panic!("unexpected widget {:?}", other),
        }

        let date = &layout.panel(USER_COMPLAINTS_SLOT).unwrap().control;
        assert_eq!(
            date.initial,
            FilterValue::Value {
                value: Scalar::Date(day("2024-01-31"))
            }
        );

        let campaign = &layout.panel(CAMPAIGN_EFFECTIVENESS_SLOT).unwrap().control;
        assert_eq!(
            campaign.initial,
            FilterValue::Value {
                value: Scalar::text("Lunar New Year Launch")
            }
        );

        let range = &layout.panel(GROWTH_TIMELINE_SLOT).unwrap().control;
        assert_eq!(range.initial, FilterValue::range(day("2024-01-04"), day("2024-05-30")));
    }

    #[test]
    fn test_layout_serializes_widget_tag() {
        let (_, layout) = built();
        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["panels"][0]["control"]["widget"], "dropdown");
        assert_eq!(json["panels"][5]["control"]["widget"], "dateRange");
        assert_eq!(json["panels"][5]["control"]["initial"]["kind"], "range");
        assert_eq!(json["panels"][5]["control"]["initial"]["start"], "2024-01-04");
    }

    #[test]
    fn test_initial_render() {
        let (mut engine, _) = built();
        let updates = engine.render_all().unwrap();
        assert_eq!(updates.len(), 6);
        assert!(updates.iter().all(|u| !u.figure.is_placeholder()));

        let growth = engine.figure(SUBSCRIBER_GROWTH_SLOT).unwrap();
        let total: f64 = growth
            .data
            .iter()
            .map(|t| match t {
                Trace::Bar(b) => b.x.iter().sum::<f64>(),
                _ => 0.0,
            })
            .sum();
        assert_eq!(total, 12.0);

        match &engine.figure(USER_COMPLAINTS_SLOT).unwrap().data[0] {
            Trace::Indicator(i) => assert_eq!(i.value, 15.0),
            other => panic!("unexpected trace {:?}", other),
        }

        match &engine.figure(CAMPAIGN_EFFECTIVENESS_SLOT).unwrap().data[0] {
            Trace::Funnel(f) => {
                assert_eq!(f.y, vec!["Impressions", "Clicks", "Conversion"]);
                assert_eq!(f.x, vec![120000.0, 8400.0, 612.0]);
            }
            other => panic!("unexpected trace {:?}", other),
        }
    }

    #[test]
    fn test_growth_timeline_monthly_buckets() {
        let (mut engine, _) = built();
        engine.render_all().unwrap();
        match &engine.figure(GROWTH_TIMELINE_SLOT).unwrap().data[0] {
            Trace::Scatter(s) => {
                assert_eq!(s.x, vec!["Jan 2024", "Feb 2024", "Mar 2024", "Apr 2024", "May 2024"]);
                assert_eq!(s.y, vec![3.0, 6.0, 8.0, 9.0, 11.0]);
            }
            other => panic!("unexpected trace {:?}", other),
        }
    }

    #[test]
    fn test_region_filter_narrows_platform_bars() {
        let (mut engine, _) = built();
        engine.render_all().unwrap();
        let updates = engine
            .on_change(REGION_CONTROL, FilterValue::from_scalar("Taiwan".into()))
            .unwrap();
        assert_eq!(updates.len(), 1);
        let mut bars: Vec<(String, f64)> = updates[0]
            .figure
            .data
            .iter()
            .filter_map(|t| match t {
                Trace::Bar(b) => Some((b.name.clone(), b.x[0])),
                _ => None,
            })
            .collect();
        bars.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            bars,
            vec![
                ("Disney+".to_string(), 1.0),
                ("HBO Max".to_string(), 2.0),
                ("Netflix".to_string(), 2.0),
            ]
        );
    }

    #[test]
    fn test_date_without_complaints_shows_placeholder() {
        let (mut engine, _) = built();
        let updates = engine
            .on_change(DATE_CONTROL, FilterValue::from_scalar(Scalar::text("2024-04-30")))
            .unwrap();
        assert!(updates[0].figure.is_placeholder());
        assert_eq!(updates[0].figure.kind, ChartKind::Gauge);
    }

    #[test]
    fn test_inverted_signup_range_shows_placeholder() {
        let (mut engine, _) = built();
        let updates = engine
            .on_change(
                SIGNUP_RANGE_CONTROL,
                FilterValue::range(day("2024-05-01"), day("2024-01-01")),
            )
            .unwrap();
        assert!(updates[0].figure.is_placeholder());
    }

    #[test]
    fn test_oversized_signup_range_is_clamped_to_data() {
        let (mut engine, _) = built();
        let updates = engine
            .on_change(
                SIGNUP_RANGE_CONTROL,
                FilterValue::range(day("0001-01-01"), day("9999-12-31")),
            )
            .unwrap();
        match &updates[0].figure.data[0] {
            Trace::Scatter(s) => {
                assert_eq!(s.x, vec!["Jan 2024", "Feb 2024", "Mar 2024", "Apr 2024", "May 2024"]);
                assert_eq!(s.y, vec![3.0, 6.0, 8.0, 9.0, 11.0]);
            }
            other => panic!("unexpected trace {:?}", other),
        }
    }

    #[test]
    fn test_clamp_range() {
        let (first, last) = (Some(day("2024-01-04")), Some(day("2024-05-30")));
        assert_eq!(
            clamp_range(day("2024-02-01"), day("2030-01-01"), first, last),
            Some((day("2024-02-01"), day("2024-05-30")))
        );
        assert_eq!(clamp_range(day("2024-02-01"), day("2024-03-01"), None, None), None);
    }

    #[test]
    fn test_equality_control_rejects_range() {
        let (mut engine, _) = built();
        let err = engine
            .on_change(REGION_CONTROL, FilterValue::range(day("2024-01-01"), day("2024-02-01")))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSelection { .. }));
        assert_eq!(engine.selection().get(REGION_CONTROL), Some(&FilterValue::All));
    }

    #[test]
    fn test_empty_dataset_still_builds() {
        let mut dataset = Dataset::new();
        for spec in crate::db::queries::QUERIES {
            let columns: Vec<&str> = match spec.name {
                SUBSCRIBER_GROWTH => vec![col::STREAMING_PLATFORM, col::REGION, col::SUBSCRIBER_COUNT],
                GENRE_PREFERENCES => vec![col::GENRE, col::LANGUAGE, col::VIEWS],
                CAMPAIGN_EFFECTIVENESS => vec![col::CAMPAIGN_NAME, col::IMPRESSIONS, col::CLICKS, col::CONVERSION],
                USER_COMPLAINTS => vec![col::DATE, col::USER_COMPLAINTS],
                _ => vec![col::SIGNUP_DATE, col::NEW_SUBSCRIBERS],
            };
            let rs = ResultSet::new(columns, Vec::new()).unwrap();
            dataset.insert(spec.name, rs, spec.distinct).unwrap();
        }
        let (mut engine, layout) = build_dashboard(dataset, &AppConfig::default()).unwrap();
        assert_eq!(
            layout.panel(GROWTH_TIMELINE_SLOT).unwrap().control.initial,
            FilterValue::All
        );
        let updates = engine.render_all().unwrap();
        assert!(updates.iter().all(|u| u.figure.is_placeholder()));
    }
}

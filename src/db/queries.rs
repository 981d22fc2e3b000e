use rusqlite::{types::ValueRef, Connection};

use crate::dataset::{ColumnKind, Dataset, ResultSet, Scalar};
use crate::error::AppError;

// ─── Result set names ─────────────────────────────────────────────────────────

pub const SUBSCRIBER_GROWTH: &str = "subscriber_growth";
pub const GENRE_PREFERENCES: &str = "genre_preferences";
pub const CAMPAIGN_EFFECTIVENESS: &str = "campaign_effectiveness";
pub const USER_COMPLAINTS: &str = "user_complaints";
pub const SUBSCRIBER_SIGNUPS: &str = "subscriber_signups";

// ─── Column names produced by the queries ─────────────────────────────────────

pub mod col {
    pub const STREAMING_PLATFORM: &str = "StreamingPlatform";
    pub const REGION: &str = "Region";
    pub const SUBSCRIBER_COUNT: &str = "SubscriberCount";
    pub const GENRE: &str = "Genre";
    pub const LANGUAGE: &str = "Language";
    pub const VIEWS: &str = "Views";
    pub const CAMPAIGN_NAME: &str = "CampaignName";
    pub const IMPRESSIONS: &str = "Impressions";
    pub const CLICKS: &str = "Clicks";
    pub const CONVERSION: &str = "Conversion";
    pub const DATE: &str = "Date";
    pub const USER_COMPLAINTS: &str = "UserComplaints";
    pub const SIGNUP_DATE: &str = "SignupDate";
    pub const NEW_SUBSCRIBERS: &str = "NewSubscribers";
}

/// One fixed startup query and how its columns are read.
pub struct QuerySpec {
    pub name: &'static str,
    pub sql: &'static str,
    pub coercions: &'static [(&'static str, ColumnKind)],
    /// Columns whose distinct values feed dropdown options.
    pub distinct: &'static [&'static str],
}

pub const QUERIES: &[QuerySpec] = &[
    QuerySpec {
        name: SUBSCRIBER_GROWTH,
        sql: "SELECT StreamingPlatform, Region, COUNT(SubscriberID) AS SubscriberCount
              FROM Subscribers
              GROUP BY StreamingPlatform, Region",
        coercions: &[(col::SUBSCRIBER_COUNT, ColumnKind::Numeric)],
        distinct: &[col::REGION, col::STREAMING_PLATFORM],
    },
    QuerySpec {
        name: GENRE_PREFERENCES,
        sql: "SELECT Genre, Language, Views
              FROM Content
              WHERE Language = 'Mandarin'",
        coercions: &[(col::VIEWS, ColumnKind::Numeric)],
        distinct: &[col::LANGUAGE],
    },
    QuerySpec {
        name: CAMPAIGN_EFFECTIVENESS,
        sql: "SELECT CampaignName, Impressions, Clicks, Conversion
              FROM MarketingCampaigns",
        coercions: &[
            (col::IMPRESSIONS, ColumnKind::Numeric),
            (col::CLICKS, ColumnKind::Numeric),
            (col::CONVERSION, ColumnKind::Numeric),
        ],
        distinct: &[col::CAMPAIGN_NAME],
    },
    QuerySpec {
        name: USER_COMPLAINTS,
        sql: "SELECT Date, UserComplaints
              FROM PlatformMetrics",
        coercions: &[
            (col::DATE, ColumnKind::Date),
            (col::USER_COMPLAINTS, ColumnKind::Numeric),
        ],
        distinct: &[col::DATE],
    },
    QuerySpec {
        name: SUBSCRIBER_SIGNUPS,
        sql: "SELECT SignupDate, COUNT(SubscriberID) AS NewSubscribers
              FROM Subscribers
              GROUP BY SignupDate",
        coercions: &[
            (col::SIGNUP_DATE, ColumnKind::Date),
            (col::NEW_SUBSCRIBERS, ColumnKind::Numeric),
        ],
        distinct: &[],
    },
];

fn scalar_from(value: ValueRef<'_>) -> Scalar {
    match value {
        ValueRef::Null => Scalar::Missing,
        ValueRef::Integer(i) => Scalar::Integer(i),
        ValueRef::Real(r) => Scalar::Real(r),
        ValueRef::Text(t) => Scalar::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Scalar::Missing,
    }
}

/// Materializes one query and applies its column coercions. Cells that
/// cannot be coerced become `Missing` and are reported, never fatal.
pub fn run_query(conn: &Connection, spec: &QuerySpec) -> Result<ResultSet, AppError> {
    let mut stmt = conn.prepare(spec.sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(scalar_from))
                .collect::<Result<Vec<_>, _>>()
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut result_set = ResultSet::new(columns, rows)?;
    for (column, kind) in spec.coercions {
        let coerced = result_set.coerce_column(column, *kind)?;
        if coerced > 0 {
            log::warn!(
                "{}: {} cell(s) in {} could not be read as {:?} and were set to missing",
                spec.name,
                coerced,
                column,
                kind
            );
        }
    }

    log::info!("{}: {} row(s) loaded", spec.name, result_set.len());
    Ok(result_set)
}

/// Runs every startup query once. Any storage error aborts the load.
pub fn load_dataset(conn: &Connection) -> Result<Dataset, AppError> {
    let mut dataset = Dataset::new();
    for spec in QUERIES {
        let result_set = run_query(conn, spec)?;
        dataset.insert(spec.name, result_set, spec.distinct)?;
    }
    Ok(dataset)
}

use std::io::{BufRead, Write};

use serde::Deserialize;

use crate::analyzer::FilterValue;
use crate::config::AppConfig;
use crate::dashboard::{build_dashboard, PageLayout};
use crate::dataset::coerce::parse_date;
use crate::dataset::{Dataset, Scalar};
use crate::engine::{Engine, SlotUpdate};
use crate::error::AppError;

/// One "value changed" notification from the page.
///
/// Dropdowns send `value`; date ranges send `start` and `end` as ISO dates.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlEvent {
    pub control: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl ControlEvent {
    pub fn filter_value(&self) -> Result<FilterValue, AppError> {
        match (&self.start, &self.end, &self.value) {
            (Some(start), Some(end), _) => Ok(FilterValue::range(
                self.date(start)?,
                self.date(end)?,
            )),
            (Some(_), None, _) | (None, Some(_), _) => Err(AppError::InvalidSelection {
                target: self.control.clone(),
                reason: "a date range needs both start and end".to_string(),
            }),
            (None, None, Some(value)) => Ok(FilterValue::from_scalar(Scalar::from_json(value))),
            (None, None, None) => Err(AppError::InvalidSelection {
                target: self.control.clone(),
                reason: "no value given".to_string(),
            }),
        }
    }

    fn date(&self, raw: &str) -> Result<chrono::NaiveDate, AppError> {
        parse_date(raw).ok_or_else(|| AppError::Coercion {
            column: self.control.clone(),
            value: raw.to_string(),
            expected: "date",
        })
    }
}

/// A running dashboard: the engine with its bound panels and the page
/// description it was built from.
pub struct Session {
    engine: Engine,
    layout: PageLayout,
}

impl Session {
    pub fn new(dataset: Dataset, config: &AppConfig) -> Result<Self, AppError> {
        let (engine, layout) = build_dashboard(dataset, config)?;
        Ok(Self { engine, layout })
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Renders every panel from the controls' initial values.
    pub fn initial_figures(&mut self) -> Result<Vec<SlotUpdate>, AppError> {
        self.engine.render_all()
    }

    pub fn apply(&mut self, event: &ControlEvent) -> Result<Vec<SlotUpdate>, AppError> {
        let value = event.filter_value()?;
        self.engine.on_change(&event.control, value)
    }
}

/// Reads one JSON event per line and answers with one line per updated slot.
/// A rejected event (including a line that is not UTF-8) gets an
/// `{"error": ...}` line and the loop goes on; only I/O failures end it.
pub fn run_event_loop<R: BufRead, W: Write>(
    session: &mut Session,
    mut reader: R,
    mut writer: W,
) -> Result<(), AppError> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let outcome = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => serde_json::from_str::<ControlEvent>(line.trim())
                .map_err(AppError::from)
                .and_then(|event| session.apply(&event)),
            Err(e) => Err(AppError::Custom(format!("Event is not valid UTF-8: {}", e))),
        };

        match outcome {
            Ok(updates) => {
                for update in &updates {
                    serde_json::to_writer(&mut writer, update)?;
                    writeln!(writer)?;
                }
            }
            Err(e) => {
                log::warn!("Event rejected: {}", e);
                serde_json::to_writer(&mut writer, &serde_json::json!({ "error": e }))?;
                writeln!(writer)?;
            }
        }
        writer.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{REGION_CONTROL, SIGNUP_RANGE_CONTROL, SUBSCRIBER_GROWTH_SLOT};
    use crate::db::queries::load_dataset;
    use rusqlite::Connection;
    use std::io::Cursor;

    fn session() -> Session {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("db/sql/fixture.sql")).unwrap();
        Session::new(load_dataset(&conn).unwrap(), &AppConfig::default()).unwrap()
    }

    fn event(json: &str) -> ControlEvent {
        serde_json::from_str(json).unwrap()
    }

    fn output_lines(out: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_event_to_filter_value() {
        assert_eq!(
            event(r#"{"control":"region-dropdown","value":"All"}"#).filter_value().unwrap(),
            FilterValue::All
        );
        assert_eq!(
            event(r#"{"control":"region-dropdown","value":"Japan"}"#).filter_value().unwrap(),
            FilterValue::Value {
                value: Scalar::text("Japan")
            }
        );
        let range = event(r#"{"control":"signup-range","start":"2024-02-01","end":"2024-03-31"}"#)
            .filter_value()
            .unwrap();
        assert!(matches!(range, FilterValue::Range { .. }));
    }

    #[test]
    fn test_event_rejections() {
        let err = event(r#"{"control":"signup-range","start":"yesterday","end":"2024-03-31"}"#)
            .filter_value()
            .unwrap_err();
        assert!(matches!(err, AppError::Coercion { .. }));

        let err = event(r#"{"control":"signup-range","start":"2024-01-01"}"#)
            .filter_value()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSelection { .. }));

        let err = event(r#"{"control":"region-dropdown"}"#).filter_value().unwrap_err();
        assert!(matches!(err, AppError::InvalidSelection { .. }));
    }

    #[test]
    fn test_apply_updates_only_bound_slot() {
        let mut session = session();
        session.initial_figures().unwrap();
        let updates = session
            .apply(&event(r#"{"control":"region-dropdown","value":"Taiwan"}"#))
            .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].slot, SUBSCRIBER_GROWTH_SLOT);
        assert_eq!(
            session.engine().selection().get(REGION_CONTROL),
            Some(&FilterValue::Value {
                value: Scalar::text("Taiwan")
            })
        );
    }

    #[test]
    fn test_event_loop_keeps_going_after_errors() {
        let mut session = session();
        session.initial_figures().unwrap();
        let input = format!(
            "{}\n\nnot json\n{}\n{}\n",
            r#"{"control":"genre-dropdown","value":"Drama"}"#,
            r#"{"control":"signup-range","start":"2024-02-01","end":"2024-03-31"}"#,
            r#"{"control":"region-dropdown","value":"Japan"}"#,
        );
        let mut out = Vec::new();
        run_event_loop(&mut session, Cursor::new(input), &mut out).unwrap();

        let lines = output_lines(out);
        assert_eq!(lines.len(), 4);
        assert!(lines[0]["error"].as_str().unwrap().contains("genre-dropdown"));
        assert!(lines[1]["error"].is_string());
        assert_eq!(lines[2]["slot"], "subscriber-growth-timeline");
        assert_eq!(lines[2]["figure"]["data"][0]["type"], "scatter");
        assert_eq!(lines[3]["slot"], SUBSCRIBER_GROWTH_SLOT);
        assert!(matches!(
            session.engine().selection().get(SIGNUP_RANGE_CONTROL),
            Some(FilterValue::Range { .. })
        ));
    }

    #[test]
    fn test_event_loop_survives_invalid_utf8() {
        let mut session = session();
        let mut input = b"{\"control\":\"region-dropdown\",\"value\":\"Ja\xffpan\"}\n".to_vec();
        input.extend_from_slice(b"{\"control\":\"region-dropdown\",\"value\":\"Japan\"}");
        let mut out = Vec::new();
        run_event_loop(&mut session, Cursor::new(input), &mut out).unwrap();

        let lines = output_lines(out);
        assert_eq!(lines.len(), 2);
        assert!(lines[0]["error"].as_str().unwrap().contains("UTF-8"));
        assert_eq!(lines[1]["slot"], SUBSCRIBER_GROWTH_SLOT);
        assert_eq!(
            session.engine().selection().get(REGION_CONTROL),
            Some(&FilterValue::Value {
                value: Scalar::text("Japan")
            })
        );
    }
}

//! Figure model handed to the charting front end. Field names follow the
//! plotly JSON schema so a figure can be passed to `Plotly.react` unchanged.

use serde::Serialize;

use crate::config::{AppConfig, ThemeConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Funnel,
    Gauge,
    Choropleth,
    Line,
}

/// Everything a render function needs besides the data itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub kind: ChartKind,
    pub title: String,
    pub theme: ThemeConfig,
    pub no_data_label: String,
}

impl ChartStyle {
    pub fn new(kind: ChartKind, title: &str, config: &AppConfig) -> Self {
        Self {
            kind,
            title: title.to_string(),
            theme: config.theme.clone(),
            no_data_label: config.no_data_label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub kind: ChartKind,
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// True for the "no data" stand-in published for empty projections.
    pub fn is_placeholder(&self) -> bool {
        self.data.is_empty() && !self.layout.annotations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar(BarTrace),
    Funnel(FunnelTrace),
    Indicator(IndicatorTrace),
    Choropleth(ChoroplethTrace),
    Scatter(ScatterTrace),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarTrace {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<String>,
    pub orientation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelTrace {
    pub y: Vec<String>,
    pub x: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorTrace {
    pub mode: &'static str,
    pub value: f64,
    pub gauge: Gauge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub axis: GaugeAxis,
    pub steps: Vec<GaugeBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeAxis {
    pub range: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeBand {
    pub range: [f64; 2],
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethTrace {
    pub locations: Vec<String>,
    pub z: Vec<f64>,
    pub locationmode: &'static str,
    pub colorscale: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub font: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Layout {
    /// Dark-theme layout with nothing but a title.
    pub fn themed(title: &str, theme: &ThemeConfig) -> Self {
        Self {
            title: title.to_string(),
            paper_bgcolor: theme.paper_bgcolor.clone(),
            plot_bgcolor: theme.plot_bgcolor.clone(),
            font: Font::from_theme(theme),
            barmode: None,
            legend: None,
            geo: None,
            xaxis: None,
            yaxis: None,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub color: String,
    pub family: String,
}

impl Font {
    pub fn from_theme(theme: &ThemeConfig) -> Self {
        Self {
            color: theme.font_color.clone(),
            family: theme.font_family.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: LegendTitle,
    pub orientation: &'static str,
    pub x: f64,
    pub y: f64,
    pub bgcolor: String,
    pub bordercolor: String,
    pub borderwidth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geo {
    pub bgcolor: String,
    pub showframe: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub showarrow: bool,
    pub x: f64,
    pub y: f64,
    pub xref: &'static str,
    pub yref: &'static str,
    pub font: Font,
}

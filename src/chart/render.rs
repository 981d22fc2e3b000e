use super::figure::{
    Annotation, Axis, BarTrace, ChartStyle, ChoroplethTrace, Figure, Font, FunnelTrace, Gauge,
    GaugeAxis, GaugeBand, Geo, IndicatorTrace, Layout, Legend, LegendTitle, Marker, ScatterTrace,
    Trace,
};
use crate::analyzer::{GroupTotal, PeriodPoint, Stage};
use crate::config::GaugeConfig;

/// Stand-in figure for an empty projection: hidden axes and a centered label.
pub fn placeholder(style: &ChartStyle) -> Figure {
    let mut layout = Layout::themed(&style.title, &style.theme);
    layout.xaxis = Some(Axis { visible: false });
    layout.yaxis = Some(Axis { visible: false });
    layout.annotations.push(Annotation {
        text: style.no_data_label.clone(),
        showarrow: false,
        x: 0.5,
        y: 0.5,
        xref: "paper",
        yref: "paper",
        font: Font::from_theme(&style.theme),
    });
    Figure {
        kind: style.kind,
        data: Vec::new(),
        layout,
    }
}

/// One horizontal bar trace per group, stacked.
pub fn stacked_bars(groups: &[GroupTotal], style: &ChartStyle) -> Figure {
    if groups.is_empty() {
        return placeholder(style);
    }
    let data = groups
        .iter()
        .map(|g| Trace::Bar(bar(g, None)))
        .collect();
    let mut layout = Layout::themed(&style.title, &style.theme);
    layout.barmode = Some("stack");
    Figure {
        kind: style.kind,
        data,
        layout,
    }
}

/// Stacked horizontal bars colored from `palette` (cycling) with a framed
/// legend to the right of the plot.
pub fn colored_bars(
    groups: &[GroupTotal],
    palette: &[String],
    legend_title: &str,
    style: &ChartStyle,
) -> Figure {
    if groups.is_empty() {
        return placeholder(style);
    }
    let data = groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let color = (!palette.is_empty()).then(|| palette[i % palette.len()].clone());
            Trace::Bar(bar(g, color))
        })
        .collect();
    let mut layout = Layout::themed(&style.title, &style.theme);
    layout.barmode = Some("stack");
    layout.legend = Some(Legend {
        title: LegendTitle {
            text: legend_title.to_string(),
        },
        orientation: "v",
        x: 1.02,
        y: 1.0,
        bgcolor: style.theme.paper_bgcolor.clone(),
        bordercolor: style.theme.font_color.clone(),
        borderwidth: 1,
    });
    Figure {
        kind: style.kind,
        data,
        layout,
    }
}

pub fn funnel(stages: &[Stage], style: &ChartStyle) -> Figure {
    if stages.is_empty() {
        return placeholder(style);
    }
    let trace = FunnelTrace {
        y: stages.iter().map(|s| s.label.clone()).collect(),
        x: stages.iter().map(|s| s.value).collect(),
    };
    Figure {
        kind: style.kind,
        data: vec![Trace::Funnel(trace)],
        layout: Layout::themed(&style.title, &style.theme),
    }
}

/// Gauge with the configured range and colored bands. The value is
/// expected to be a real number: "no data" never reaches this function.
pub fn gauge(value: f64, config: &GaugeConfig, style: &ChartStyle) -> Figure {
    if !value.is_finite() {
        return placeholder(style);
    }
    let trace = IndicatorTrace {
        mode: "gauge+number",
        value,
        gauge: Gauge {
            axis: GaugeAxis {
                range: [config.min, config.max],
            },
            steps: config
                .steps
                .iter()
                .map(|s| GaugeBand {
                    range: [s.from, s.to],
                    color: s.color.clone(),
                })
                .collect(),
        },
    };
    Figure {
        kind: style.kind,
        data: vec![Trace::Indicator(trace)],
        layout: Layout::themed(&style.title, &style.theme),
    }
}

/// Country-level choropleth; group keys are taken as country names.
pub fn choropleth(groups: &[GroupTotal], style: &ChartStyle) -> Figure {
    let located: Vec<&GroupTotal> = groups.iter().filter(|g| !g.key.is_missing()).collect();
    if located.is_empty() {
        return placeholder(style);
    }
    let trace = ChoroplethTrace {
        locations: located.iter().map(|g| g.key.to_string()).collect(),
        z: located.iter().map(|g| g.total).collect(),
        locationmode: "country names",
        colorscale: "Viridis",
    };
    let mut layout = Layout::themed(&style.title, &style.theme);
    layout.geo = Some(Geo {
        bgcolor: style.theme.plot_bgcolor.clone(),
        showframe: false,
    });
    Figure {
        kind: style.kind,
        data: vec![Trace::Choropleth(trace)],
        layout,
    }
}

pub fn line(points: &[PeriodPoint], series_name: &str, style: &ChartStyle) -> Figure {
    if points.is_empty() {
        return placeholder(style);
    }
    let trace = ScatterTrace {
        name: series_name.to_string(),
        x: points.iter().map(|p| p.label.clone()).collect(),
        y: points.iter().map(|p| p.cumulative).collect(),
        mode: "lines+markers",
    };
    Figure {
        kind: style.kind,
        data: vec![Trace::Scatter(trace)],
        layout: Layout::themed(&style.title, &style.theme),
    }
}

fn bar(group: &GroupTotal, color: Option<String>) -> BarTrace {
    let label = group.key.to_string();
    BarTrace {
        name: label.clone(),
        x: vec![group.total],
        y: vec![label],
        orientation: "h",
        marker: color.map(|color| Marker { color }),
    }
}

//! Plotly figure JSON and the self-contained HTML page.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use cfv_model::SelectedStat;

use crate::error::{DashboardError, Result};
use crate::views::DashboardView;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const CASE_COLOR: &str = "#FF4B4B";
const FLIGHT_COLOR: &str = "#1F77B4";

/// `0.53`, or `n/a` when the correlation is undefined.
pub fn format_correlation(r: Option<f64>) -> String {
    r.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"))
}

fn series_title(view: &DashboardView, stat: SelectedStat) -> String {
    let r = view
        .correlations
        .iter()
        .find(|(candidate, _)| *candidate == stat)
        .and_then(|(_, r)| *r);
    format!(
        "{} vs Flight Volume into {} (r = {})",
        stat.label(),
        view.focus,
        format_correlation(r)
    )
}

/// Dual-axis line chart with a stat dropdown and a range slider.
pub fn time_series_figure(view: &DashboardView) -> Value {
    let stats = SelectedStat::all();
    let months = &view.series.months;

    let mut data: Vec<Value> = stats
        .iter()
        .map(|&stat| {
            json!({
                "type": "scatter",
                "mode": "lines+markers",
                "x": months,
                "y": view.series.values(stat).unwrap_or_default(),
                "name": stat.label(),
                "line": { "color": CASE_COLOR, "width": 3 },
                "yaxis": "y",
                "visible": stat == view.selected,
            })
        })
        .collect();
    data.push(json!({
        "type": "scatter",
        "mode": "lines+markers",
        "x": months,
        "y": view.series.flights,
        "name": "Flight Volume",
        "line": { "color": FLIGHT_COLOR, "width": 3 },
        "yaxis": "y2",
        "visible": true,
    }));

    let buttons: Vec<Value> = stats
        .iter()
        .map(|&stat| {
            let mut visible: Vec<bool> = stats.iter().map(|&s| s == stat).collect();
            visible.push(true);
            json!({
                "label": stat.label(),
                "method": "update",
                "args": [
                    { "visible": visible },
                    {
                        "title": { "text": series_title(view, stat) },
                        "yaxis.title.text": stat.label(),
                    }
                ],
            })
        })
        .collect();
    let active = stats
        .iter()
        .position(|&stat| stat == view.selected)
        .unwrap_or(0);

    json!({
        "data": data,
        "layout": {
            "title": { "text": series_title(view, view.selected) },
            "xaxis": {
                "title": { "text": "Month" },
                "tickangle": 45,
                "rangeslider": { "visible": true },
            },
            "yaxis": {
                "title": { "text": view.selected.label(), "font": { "color": CASE_COLOR } },
                "tickfont": { "color": CASE_COLOR },
            },
            "yaxis2": {
                "title": { "text": "Flight Volume", "font": { "color": FLIGHT_COLOR } },
                "tickfont": { "color": FLIGHT_COLOR },
                "overlaying": "y",
                "side": "right",
            },
            "updatemenus": [{
                "buttons": buttons,
                "active": active,
                "direction": "down",
                "showactive": true,
                "x": 0.0,
                "xanchor": "left",
                "y": 1.2,
                "yanchor": "top",
            }],
            "legend": { "orientation": "h", "y": -0.45 },
            "hovermode": "x unified",
            "height": 550,
        },
    })
}

fn geo(x: [f64; 2]) -> Value {
    json!({
        "scope": "world",
        "showframe": false,
        "showcoastlines": true,
        "projection": { "type": "equirectangular" },
        "domain": { "x": x, "y": [0, 1] },
    })
}

/// Side-by-side world maps of inbound flight volume and monthly cases.
pub fn choropleth_figure(view: &DashboardView) -> Value {
    let maps = &view.choropleth;
    let (flight_names, flight_values): (Vec<&str>, Vec<f64>) = maps
        .flights_by_origin
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .unzip();
    let (case_names, case_values): (Vec<&str>, Vec<f64>) = maps
        .cases_by_country
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .unzip();
    let range = format!("{} to {}", view.range.start, view.range.end);

    json!({
        "data": [
            {
                "type": "choropleth",
                "locations": flight_names,
                "z": flight_values,
                "locationmode": "country names",
                "colorscale": "Viridis",
                "name": "Flight Volume",
                "zmin": 0,
                "zmax": maps.flights_zmax,
                "colorbar": { "title": { "text": "Flights" }, "x": 0.46 },
                "geo": "geo",
            },
            {
                "type": "choropleth",
                "locations": case_names,
                "z": case_values,
                "locationmode": "country names",
                "colorscale": "Reds",
                "name": "COVID Cases",
                "zmin": 0,
                "zmax": maps.cases_zmax,
                "colorbar": { "title": { "text": "Cases" }, "x": 0.98 },
                "geo": "geo2",
            },
        ],
        "layout": {
            "geo": geo([0.0, 0.46]),
            "geo2": geo([0.52, 0.98]),
            "width": 1200,
            "height": 500,
            "autosize": false,
            "annotations": [
                {
                    "text": format!("Flight Volume into {} by Origin Country ({range})", view.focus),
                    "showarrow": false,
                    "x": 0.05, "y": 1.1, "xref": "paper", "yref": "paper",
                    "font": { "size": 14 },
                },
                {
                    "text": format!("COVID Cases (monthly new) by Country ({range})"),
                    "showarrow": false,
                    "x": 0.725, "y": 1.1, "xref": "paper", "yref": "paper",
                    "font": { "size": 14 },
                },
            ],
        },
    })
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// JSON for inline `<script>` use; `</` cannot close the script element.
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Render the complete dashboard page.
pub fn render_html(view: &DashboardView) -> Result<String> {
    let focus = escape_html(&view.focus);
    let selected_r = view
        .correlations
        .iter()
        .find(|(stat, _)| *stat == view.selected)
        .and_then(|(_, r)| *r);
    let series = script_json(&time_series_figure(view))?;
    let maps = script_json(&choropleth_figure(view))?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>COVID-19 Cases and Flight Volume: {focus}</title>
<script src="{PLOTLY_CDN}"></script>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
.note {{ color: #555; }}
</style>
</head>
<body>
<h1>COVID-19 Cases and Flight Volume into {focus}</h1>
<p class="note">Months {start} to {end}.</p>
<div id="timeseries"></div>
<p>Correlation coefficient between {stat} and flights: {r}</p>
<h2>Global view</h2>
<div id="choropleth"></div>
<script>
const series = {series};
Plotly.newPlot("timeseries", series.data, series.layout, {{responsive: true}});
const maps = {maps};
Plotly.newPlot("choropleth", maps.data, maps.layout);
</script>
</body>
</html>
"#,
        start = view.range.start,
        end = view.range.end,
        stat = escape_html(&view.selected.label().to_lowercase()),
        r = format_correlation(selected_r),
    ))
}

/// Render the dashboard and write it to `path`.
pub fn write_html(view: &DashboardView, path: &Path) -> Result<()> {
    let html = render_html(view)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| DashboardError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, html).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })
}

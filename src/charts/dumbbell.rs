//! Country indicators, 2020 vs 2021, as a dumbbell chart.

use crate::charts::axis_horizontal;
use crate::data::numeric_cell;
use crate::scale::{BandScale, LinearScale};
use crate::surface::{num, Surface};
use serde::Deserialize;
use std::cmp::Ordering;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 10.0;
const MARGIN_LEFT: f64 = 100.0;
const CHART_WIDTH: f64 = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
const CHART_HEIGHT: f64 = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

/// Country that gets the highlighted band
pub const FOCUS_COUNTRY: &str = "Myanmar";

/// One indicator row of the country table. Year cells stay raw because the
/// table marks missing values with `..`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct IndicatorRow {
    #[serde(rename = "Country Name")]
    pub country: String,
    #[serde(rename = "2020 [YR2020]", default)]
    pub y2020: String,
    #[serde(rename = "2021 [YR2021]", default)]
    pub y2021: String,
    #[serde(rename = "2022 [YR2022]", default)]
    pub y2022: String,
    #[serde(rename = "Series Name", default)]
    pub series: String,
    #[serde(rename = "Series Code", default)]
    pub series_code: String,
}

impl IndicatorRow {
    pub fn value_2020(&self) -> Option<f64> {
        numeric_cell(&self.y2020)
    }

    pub fn value_2021(&self) -> Option<f64> {
        numeric_cell(&self.y2021)
    }

    pub fn value_2022(&self) -> Option<f64> {
        numeric_cell(&self.y2022)
    }
}

/// A selectable indicator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub code: String,
}

/// Unique (name, code) pairs in first-appearance order
pub fn series_catalog(rows: &[IndicatorRow]) -> Vec<Series> {
    let mut out: Vec<Series> = Vec::new();
    for row in rows {
        if row.series_code.is_empty() {
            continue;
        }
        if !out.iter().any(|s| s.code == row.series_code && s.name == row.series) {
            out.push(Series {
                name: row.series.clone(),
                code: row.series_code.clone(),
            });
        }
    }
    out
}

/// Plain-language description of the known indicator codes
pub fn series_description(code: &str) -> Option<&'static str> {
    let text = match code {
        "NY.GDP.MKTP.CD" => "The total market value of all final goods and services produced within the country in a given year.",
        "SP.POP.TOTL" => "The total number of people residing in the country.",
        "NY.GDP.PCAP.CD" => "The average economic output per person, calculated by dividing the country's GDP by its total population.",
        "NV.AGR.TOTL.CD" => "The total value of all agricultural products and services produced within the country in a given year.",
        "GE.PER.RNK" => "A composite measure of the quality of public services, the civil service, and the credibility of the government's commitment to its policies. A rank of 90 means it performs better than 90% of other countries.",
        "NV.IND.TOTL.CD" => "The total value of all industrial products and services produced within the country in a given year.",
        "TX.VAL.MRCH.CD.WT" => "The total value of all goods and services exported by the country to other countries in a given year.",
        "TM.VAL.MRCH.CD.WT" => "The total value of all goods and services imported by the country from other countries in a given year.",
        "MS.MIL.XPND.GD.ZS" => "The percentage of the country's GDP that is spent on the military and defense.",
        _ => return None,
    };
    Some(text)
}

/// Which series to draw and which country, if any, to leave out
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DumbbellQuery {
    pub series_code: String,
    pub exclude_country: Option<String>,
}

impl DumbbellQuery {
    /// Query for the first series in the table
    pub fn first_series(rows: &[IndicatorRow]) -> Self {
        Self {
            series_code: rows.first().map(|r| r.series_code.clone()).unwrap_or_default(),
            exclude_country: None,
        }
    }
}

/// Rows of the selected series, largest 2020 value first, missing values last
pub fn select_rows<'a>(rows: &'a [IndicatorRow], query: &DumbbellQuery) -> Vec<&'a IndicatorRow> {
    let mut selected: Vec<&IndicatorRow> = rows
        .iter()
        .filter(|r| r.series_code == query.series_code)
        .filter(|r| query.exclude_country.as_deref() != Some(r.country.as_str()))
        .collect();
    selected.sort_by(|a, b| match (a.value_2020(), b.value_2020()) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    selected
}

/// Short tick labels: whole billions and millions, thousands with two decimals
pub fn format_indicator(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.0}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.0}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), format_indicator)
}

pub fn draw_dumbbell(rows: &[IndicatorRow], query: &DumbbellQuery) -> Surface {
    let selected = select_rows(rows, query);
    let max = selected
        .iter()
        .flat_map(|r| [r.value_2020(), r.value_2021()])
        .flatten()
        .fold(f64::NEG_INFINITY, f64::max);
    let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
    let x = LinearScale::new((0.0, max), (0.0, CHART_WIDTH));
    let countries: Vec<String> = selected.iter().map(|r| r.country.clone()).collect();
    let y = BandScale::new(&countries, (0.0, CHART_HEIGHT), 0.0);
    let half_band = y.bandwidth() / 2.0;

    let mut surface = Surface::new(WIDTH, HEIGHT);
    surface.add_style(
        ".dumbbell-row:hover circle{r:8px;}.dumbbell-row:hover .dumbbell-line{stroke-width:8;}",
    );
    let root = surface.root();
    if let Some(text) = series_description(&query.series_code) {
        surface.append(root, "desc").text(text);
    }
    let chart = surface
        .append(root, "g")
        .attr("class", "chart-group")
        .attr("transform", format!("translate({},{})", num(MARGIN_LEFT), num(MARGIN_TOP)))
        .id();

    let x_ticks: Vec<(f64, String)> = x
        .ticks(10)
        .into_iter()
        .map(|t| (x.scale(t), format_indicator(t)))
        .collect();
    axis_horizontal(&mut surface, chart, 0.0, (0.0, CHART_WIDTH), &x_ticks, true);

    let y_axis = surface.group(chart, "axis axis-left");
    surface
        .append(y_axis, "line")
        .attr("x1", "0")
        .attr("x2", "0")
        .attr("y1", "0")
        .attr("y2", num(CHART_HEIGHT))
        .attr("stroke", "currentColor");
    for country in &countries {
        let Some(top) = y.position(country) else {
            continue;
        };
        surface
            .append(y_axis, "text")
            .attr("x", "-9")
            .attr("y", num(top + half_band))
            .attr("dy", "0.32em")
            .attr("text-anchor", "end")
            .attr("font-size", "10px")
            .text(country.as_str());
    }

    for row in &selected {
        let Some(top) = y.position(&row.country) else {
            continue;
        };
        let cy = top + half_band;
        let (v2020, v2021) = (row.value_2020(), row.value_2021());
        let g = surface
            .append(chart, "g")
            .attr("class", "dumbbell-row")
            .attr("data-country", &row.country)
            .id();
        surface.append(g, "title").text(format!(
            "{}\n2020: {}\n2021: {}",
            row.country,
            format_optional(v2020),
            format_optional(v2021)
        ));

        if let (Some(a), Some(b)) = (v2020, v2021) {
            surface
                .append(g, "line")
                .attr("class", "dumbbell-line")
                .attr("x1", num(x.scale(a)))
                .attr("x2", num(x.scale(b)))
                .attr("y1", num(cy))
                .attr("y2", num(cy))
                .attr("stroke", if b > a { "green" } else { "red" })
                .attr("stroke-width", "5");
        }
        for (class, value, fill) in [("circle-2020", v2020, "blue"), ("circle-2021", v2021, "orange")] {
            surface
                .append(g, "circle")
                .attr("class", class)
                .attr("cx", num(value.map_or(0.0, |v| x.scale(v))))
                .attr("cy", num(cy))
                .attr("r", "5")
                .attr("fill", fill)
                .attr("opacity", if value.is_some() { "1" } else { "0" });
        }

        let na_x = match (v2020, v2021) {
            (None, _) => Some(5.0),
            (Some(a), None) => Some(x.scale(a) + 10.0),
            _ => None,
        };
        if let Some(na_x) = na_x {
            surface
                .append(g, "text")
                .attr("class", "na-label")
                .attr("x", num(na_x))
                .attr("y", num(cy + 5.0))
                .attr("fill", "darkgray")
                .attr("font-size", "14px")
                .text("N/A");
        }
    }

    // Painted underneath everything else in the chart group
    for &(tx, _) in &x_ticks {
        surface
            .prepend(chart, "line")
            .attr("class", "x-tick-line")
            .attr("x1", num(tx))
            .attr("x2", num(tx))
            .attr("y1", "0")
            .attr("y2", num(CHART_HEIGHT))
            .attr("stroke", "#cccccc")
            .attr("stroke-dasharray", "2,2");
    }
    if let Some(focus_top) = y.position(&FOCUS_COUNTRY.to_string()) {
        surface
            .prepend(chart, "rect")
            .attr("class", "focus-band")
            .attr("x", "-80")
            .attr("y", num(focus_top))
            .attr("width", num(CHART_WIDTH + 80.0))
            .attr("height", num(y.bandwidth()))
            .attr("fill", "#ffff99");
        for (i, country) in countries.iter().enumerate() {
            if i % 2 == 0 || country == FOCUS_COUNTRY {
                continue;
            }
            let Some(top) = y.position(country) else {
                continue;
            };
            surface
                .prepend(chart, "rect")
                .attr("class", "gray-band")
                .attr("x", "-80")
                .attr("y", num(top))
                .attr("width", num(CHART_WIDTH + 80.0))
                .attr("height", num(y.bandwidth()))
                .attr("fill", "#f0f0f0");
        }
    }

    draw_legends(&mut surface);
    surface
}

fn draw_legends(surface: &mut Surface) {
    let root = surface.root();
    let legend = surface
        .append(root, "g")
        .attr("class", "legend")
        .attr("transform", format!("translate({},{})", num(MARGIN_LEFT), num(MARGIN_TOP - 40.0)))
        .id();
    for (i, (label, color)) in [("2020", "blue"), ("2021", "orange")].into_iter().enumerate() {
        let cx = i as f64 * 70.0;
        surface
            .append(legend, "circle")
            .attr("cx", num(cx))
            .attr("cy", "0")
            .attr("r", "8")
            .attr("fill", color);
        surface
            .append(legend, "text")
            .attr("x", num(cx + 12.0))
            .attr("y", "4")
            .attr("font-size", "12px")
            .attr("fill", "#333")
            .text(label);
    }

    let lines = surface
        .append(root, "g")
        .attr("class", "line-legend")
        .attr("transform", format!("translate({},{})", num(MARGIN_LEFT + 200.0), num(MARGIN_TOP - 40.0)))
        .id();
    let entries = [
        ("Increase from 2020 to 2021", "green"),
        ("Decrease from 2020 to 2021", "red"),
    ];
    for (i, (label, color)) in entries.into_iter().enumerate() {
        let x0 = i as f64 * 200.0;
        surface
            .append(lines, "line")
            .attr("x1", num(x0))
            .attr("y1", "5")
            .attr("x2", num(x0 + 180.0))
            .attr("y2", "5")
            .attr("stroke", color)
            .attr("stroke-width", "5");
        surface
            .append(lines, "text")
            .attr("x", num(x0 + 18.0))
            .attr("y", "0")
            .attr("font-size", "12px")
            .attr("fill", "#333")
            .text(label);
    }
}

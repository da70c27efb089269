//! Region fills keyed by administrative name, with a gradient legend and
//! reference city markers.

use crate::color::{Interpolator, SequentialScale};
use crate::map::Basemap;
use crate::surface::{num, Surface};
use serde::Deserialize;
use std::collections::HashMap;

/// One row of the per-region events/fatalities table
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AdminRow {
    #[serde(rename = "ADMIN1")]
    pub admin1: String,
    #[serde(rename = "FATALITIES")]
    pub fatalities: f64,
    #[serde(rename = "EVENTS")]
    pub events: f64,
}

/// Which column a choropleth encodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Fatalities,
    Events,
}

impl Metric {
    pub fn title(self) -> &'static str {
        match self {
            Self::Fatalities => "Fatalities",
            Self::Events => "Events",
        }
    }

    pub fn interpolator(self) -> Interpolator {
        match self {
            Self::Fatalities => Interpolator::Reds,
            Self::Events => Interpolator::Purples,
        }
    }

    pub fn value(self, row: &AdminRow) -> f64 {
        match self {
            Self::Fatalities => row.fatalities,
            Self::Events => row.events,
        }
    }

    /// Output file stem
    pub fn chart_name(self) -> &'static str {
        match self {
            Self::Fatalities => "choropleth-fatalities",
            Self::Events => "choropleth-events",
        }
    }
}

/// Region name to value, built once before drawing
#[derive(Clone, Debug, Default)]
pub struct ValueIndex {
    values: HashMap<String, f64>,
    max: Option<f64>,
}

impl ValueIndex {
    /// Later entries for the same name replace earlier ones
    pub fn build<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut values = HashMap::new();
        for (name, value) in pairs {
            values.insert(name.to_string(), value);
        }
        let max = values.values().copied().filter(|v| v.is_finite()).reduce(f64::max);
        Self { values, max }
    }

    pub fn from_rows(rows: &[AdminRow], metric: Metric) -> Self {
        Self::build(rows.iter().map(|r| (r.admin1.as_str(), metric.value(r))))
    }

    /// Value for a region; regions without a row count as 0
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Color domain `[0, max]`, or `[0, 1]` when there is nothing positive
    pub fn domain(&self) -> (f64, f64) {
        match self.max {
            Some(m) if m > 0.0 => (0.0, m),
            _ => (0.0, 1.0),
        }
    }
}

/// A labelled reference city
#[derive(Clone, Copy, Debug)]
pub struct City {
    pub name: &'static str,
    pub lon: f64,
    pub lat: f64,
    pub population: u64,
    pub text_offset: (f64, f64),
    pub capital: bool,
}

pub const REFERENCE_CITIES: [City; 7] = [
    City { name: "Naypyidaw", lon: 96.0844, lat: 19.7633, population: 924_608, text_offset: (-27.0, 16.0), capital: true },
    City { name: "Mandalay", lon: 96.0830, lat: 21.9757, population: 1_250_000, text_offset: (-24.0, 16.0), capital: false },
    City { name: "Yangon", lon: 96.1580, lat: 16.8409, population: 5_400_000, text_offset: (-18.0, 16.0), capital: false },
    City { name: "Mawlamyine", lon: 97.6350, lat: 16.4900, population: 300_000, text_offset: (-30.0, 16.0), capital: false },
    City { name: "Taunggyi", lon: 97.0372, lat: 20.7894, population: 150_000, text_offset: (-27.0, 16.0), capital: false },
    City { name: "Bago", lon: 96.4647, lat: 17.3363, population: 250_000, text_offset: (-12.0, -8.0), capital: false },
    City { name: "Sagaing", lon: 95.7010, lat: 22.1366, population: 100_000, text_offset: (-20.0, -10.0), capital: false },
];

const LEGEND_WIDTH: f64 = 20.0;
const LEGEND_HEIGHT: f64 = 200.0;

/// Fill every tagged region of `surface` from `index`
pub fn shade_regions(surface: &mut Surface, index: &ValueIndex, scale: &SequentialScale, title: &str) {
    let names = surface.region_names().to_vec();
    for name in names {
        let value = index.get(&name);
        let fill = scale.color(value);
        for id in surface.region_paths(&name).to_vec() {
            surface.set_attr(id, "fill", fill);
            surface.set_attr(id, "stroke", "#333");
            surface.set_attr(id, "opacity", "0.8");
            let title_id = surface
                .children(id)
                .iter()
                .copied()
                .find(|&c| surface.tag(c) == "title");
            if let Some(title_id) = title_id {
                surface.set_attr(title_id, "data-value", num(value));
                surface.set_text(title_id, format!("{name}\n{title}: {}", num(value)));
            }
        }
    }
}

/// Draw one choropleth onto a copy of the basemap
pub fn draw_choropleth(basemap: &Basemap, rows: &[AdminRow], metric: Metric) -> Surface {
    let index = ValueIndex::from_rows(rows, metric);
    let scale = SequentialScale::new(index.domain(), metric.interpolator());

    let mut surface = basemap.surface.clone();
    surface.clear_styles();
    surface.add_style(".region:hover{stroke:#000;stroke-width:2;}");
    shade_regions(&mut surface, &index, &scale, metric.title());
    draw_legend(&mut surface, basemap, &scale, metric);
    draw_cities(&mut surface, basemap);
    surface
}

fn legend_ticks(max: f64) -> Vec<f64> {
    let mut ticks: Vec<f64> = [0.0, 5000.0, 10000.0, 15000.0, 20000.0]
        .into_iter()
        .filter(|&t| t < max)
        .collect();
    ticks.push(max);
    ticks
}

fn draw_legend(surface: &mut Surface, basemap: &Basemap, scale: &SequentialScale, metric: Metric) {
    let root = surface.root();
    let x = (basemap.viewport.width - LEGEND_WIDTH - 40.0).max(0.0);
    let y = (basemap.viewport.height - LEGEND_HEIGHT - 40.0).max(20.0);
    let legend = surface
        .append(root, "g")
        .attr("class", "legend")
        .attr("transform", format!("translate({},{})", num(x), num(y)))
        .id();

    let gradient_id = format!("legend-gradient-{}", metric.title());
    let defs = surface.append(legend, "defs").id();
    let gradient = surface
        .append(defs, "linearGradient")
        .attr("id", &gradient_id)
        .attr("x1", "0%")
        .attr("x2", "0%")
        .attr("y1", "100%")
        .attr("y2", "0%")
        .id();
    let (_, max) = scale.domain;
    for step in 0..=100 {
        let t = f64::from(step) / 100.0;
        surface
            .append(gradient, "stop")
            .attr("offset", format!("{step}%"))
            .attr("stop-color", scale.color(t * max));
    }
    surface
        .append(legend, "rect")
        .attr("width", num(LEGEND_WIDTH))
        .attr("height", num(LEGEND_HEIGHT))
        .attr("fill", format!("url(#{gradient_id})"))
        .attr("stroke", "#999")
        .attr("stroke-width", "0.5");

    for tick in legend_ticks(max) {
        let ty = LEGEND_HEIGHT - tick / max * LEGEND_HEIGHT;
        surface
            .append(legend, "text")
            .attr("class", "legend-tick")
            .attr("x", num(LEGEND_WIDTH + 4.0))
            .attr("y", num(ty))
            .attr("dy", "0.32em")
            .attr("font-size", "10px")
            .text(format!("{tick:.0}"));
    }
    surface
        .append(legend, "text")
        .attr("x", "0")
        .attr("y", "-15")
        .attr("font-size", "12px")
        .attr("fill", "white")
        .text(metric.title());
}

fn draw_cities(surface: &mut Surface, basemap: &Basemap) {
    let root = surface.root();
    let layer = surface.group(root, "cities");
    for city in &REFERENCE_CITIES {
        let p = basemap.projection.project(city.lon, city.lat);
        surface
            .append(layer, "circle")
            .attr("class", "city")
            .attr("cx", num(p.x))
            .attr("cy", num(p.y))
            .attr("r", num((city.population as f64).log2() / 5.0))
            .attr("fill", if city.capital { "red" } else { "blue" })
            .attr("stroke", "#fff")
            .attr("stroke-width", "1");
        surface
            .append(layer, "text")
            .attr("class", "city-label")
            .attr("x", num(p.x + city.text_offset.0))
            .attr("y", num(p.y + city.text_offset.1))
            .attr("font-size", "12px")
            .attr("fill", "#000")
            .attr("paint-order", "stroke")
            .attr("stroke", "#fff")
            .attr("stroke-width", "2")
            .text(city.name);
    }
}

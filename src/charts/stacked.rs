//! Deaths per year, stacked by opposing side.

use crate::charts::{axis_horizontal, axis_left, class_slug};
use crate::color::{OrdinalScale, SidePalette, UNKNOWN_COLOR};
use crate::scale::{format_tick, BandScale, LinearScale};
use crate::surface::{num, Surface};
use serde::Deserialize;
use std::collections::HashMap;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 400.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 60.0;
const MARGIN_LEFT: f64 = 70.0;

/// One (year, side) observation
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TimeseriesRow {
    pub year: i32,
    pub total_deaths: f64,
    pub cumulative_deaths: f64,
    #[serde(rename = "side_b")]
    pub side: String,
}

/// Stacked layout: `segments[year][side] = (y0, y1)`
#[derive(Clone, Debug, PartialEq)]
pub struct StackedSeries {
    pub years: Vec<i32>,
    pub sides: Vec<String>,
    pub segments: Vec<Vec<(f64, f64)>>,
}

impl StackedSeries {
    /// Sum of all sides for the year at `index`
    pub fn total(&self, index: usize) -> f64 {
        self.segments[index].last().map_or(0.0, |&(_, top)| top)
    }

    pub fn max_total(&self) -> f64 {
        (0..self.years.len()).map(|i| self.total(i)).fold(0.0, f64::max)
    }
}

/// Pivot rows into years × sides and stack sides in first-appearance order.
/// A missing (year, side) pair counts as 0; duplicates keep the first row.
pub fn stack(rows: &[TimeseriesRow], cumulative: bool) -> StackedSeries {
    let mut years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();

    let mut sides: Vec<String> = Vec::new();
    for row in rows {
        if !sides.contains(&row.side) {
            sides.push(row.side.clone());
        }
    }

    let mut pivot: HashMap<(i32, &str), f64> = HashMap::with_capacity(rows.len());
    for row in rows {
        let value = if cumulative {
            row.cumulative_deaths
        } else {
            row.total_deaths
        };
        pivot.entry((row.year, row.side.as_str())).or_insert(value);
    }

    let segments = years
        .iter()
        .map(|&year| {
            let mut base = 0.0;
            sides
                .iter()
                .map(|side| {
                    let value = pivot.get(&(year, side.as_str())).copied().unwrap_or(0.0);
                    let segment = (base, base + value);
                    base += value;
                    segment
                })
                .collect()
        })
        .collect();

    StackedSeries {
        years,
        sides,
        segments,
    }
}

/// Draw the stacked bars. Colors come from the symbol map's palette when
/// one is available, otherwise from Category10 over the sides.
pub fn draw_stacked(rows: &[TimeseriesRow], cumulative: bool, palette: Option<&SidePalette>) -> Surface {
    let series = stack(rows, cumulative);
    let color_of: Box<dyn Fn(&str) -> String> = match palette {
        Some(p) => {
            let p = p.extended(&series.sides);
            Box::new(move |side: &str| p.color(side).to_string())
        }
        None => {
            let scale = OrdinalScale::category10().with_domain(&series.sides);
            Box::new(move |side: &str| scale.color(side).unwrap_or(UNKNOWN_COLOR).to_string())
        }
    };

    let x = BandScale::new(&series.years, (MARGIN_LEFT, WIDTH - MARGIN_RIGHT), 0.2);
    let y = LinearScale::new((0.0, series.max_total()), (HEIGHT - MARGIN_BOTTOM, MARGIN_TOP)).nice(10);
    let y_ticks = y.ticks(10);
    let y_step = y.tick_step(10);

    let mut surface = Surface::new(WIDTH, HEIGHT);
    surface.add_style(".stacks:hover .year-stack rect{opacity:0.3;}.stacks .year-stack:hover rect{opacity:1;}");
    let root = surface.root();

    let grid = surface.group(root, "grid");
    for &tick in &y_ticks {
        let ty = y.scale(tick);
        surface
            .append(grid, "line")
            .attr("x1", num(MARGIN_LEFT))
            .attr("x2", num(WIDTH - MARGIN_RIGHT))
            .attr("y1", num(ty))
            .attr("y2", num(ty))
            .attr("stroke", "#aaaaaa")
            .attr("stroke-dasharray", "2,2");
    }

    let stacks = surface.group(root, "stacks");
    for (i, &year) in series.years.iter().enumerate() {
        let Some(x0) = x.position(&year) else {
            continue;
        };
        let g = surface
            .append(stacks, "g")
            .attr("class", "year-stack")
            .attr("data-year", year)
            .attr("transform", format!("translate({},0)", num(x0)))
            .id();

        let breakdown: Vec<String> = series
            .sides
            .iter()
            .zip(&series.segments[i])
            .map(|(side, (y0, y1))| format!("{side}: {}", num(y1 - y0)))
            .collect();
        surface
            .append(g, "title")
            .text(format!("Year: {year}\n{}", breakdown.join("\n")));

        for (side, &(y0, y1)) in series.sides.iter().zip(&series.segments[i]) {
            surface
                .append(g, "rect")
                .attr("class", format!("segment segment-{}", class_slug(side)))
                .attr("data-side", side)
                .attr("x", "0")
                .attr("y", num(y.scale(y1)))
                .attr("width", num(x.bandwidth()))
                .attr("height", num(y.scale(y0) - y.scale(y1)))
                .attr("fill", color_of(side));
        }

        let total = series.total(i);
        surface
            .append(g, "text")
            .attr("class", "stack-total")
            .attr("x", num(x.bandwidth() / 2.0))
            .attr("y", num(y.scale(total) - 5.0))
            .attr("text-anchor", "middle")
            .attr("font-size", "10px")
            .attr("fill", "black")
            .text(num(total));
    }

    let y_labels: Vec<(f64, String)> = y_ticks.iter().map(|&t| (t, format_tick(t, y_step))).collect();
    axis_left(&mut surface, root, MARGIN_LEFT, &y, &y_labels);

    let x_labels: Vec<(f64, String)> = series
        .years
        .iter()
        .step_by(2)
        .filter_map(|year| x.position(year).map(|p| (p + x.bandwidth() / 2.0, year.to_string())))
        .collect();
    axis_horizontal(
        &mut surface,
        root,
        HEIGHT - MARGIN_BOTTOM,
        (MARGIN_LEFT, WIDTH - MARGIN_RIGHT),
        &x_labels,
        false,
    );

    surface
        .append(root, "text")
        .attr("transform", "rotate(-90)")
        .attr("y", num(MARGIN_LEFT / 4.0))
        .attr("x", num(-(HEIGHT / 2.0)))
        .attr("text-anchor", "middle")
        .attr("font-size", "14px")
        .text(if cumulative { "Cumulative Deaths" } else { "Total Deaths" });

    let legend = surface
        .append(root, "g")
        .attr("class", "legend")
        .attr("transform", format!("translate({},{})", num(MARGIN_LEFT), num(MARGIN_TOP)))
        .id();
    for (i, side) in series.sides.iter().enumerate() {
        let column = (i / 2) as f64 * 80.0;
        let row = if i % 2 == 0 { 0.0 } else { 20.0 };
        surface
            .append(legend, "rect")
            .attr("x", num(column))
            .attr("y", num(row))
            .attr("width", "20")
            .attr("height", "15")
            .attr("fill", color_of(side));
        surface
            .append(legend, "text")
            .attr("x", num(column + 25.0))
            .attr("y", num(row + 12.0))
            .attr("fill", "black")
            .attr("font-size", "12px")
            .text(side.as_str());
    }

    surface
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, total: f64, cumulative: f64, side: &str) -> TimeseriesRow {
        TimeseriesRow {
            year,
            total_deaths: total,
            cumulative_deaths: cumulative,
            side: side.to_string(),
        }
    }

    fn rows() -> Vec<TimeseriesRow> {
        vec![
            row(2022, 30.0, 40.0, "KIO"),
            row(2021, 10.0, 10.0, "KIO"),
            row(2021, 5.0, 5.0, "NUG"),
            row(2022, 7.0, 12.0, "NUG"),
            row(2023, 2.0, 42.0, "KIO"),
            row(2022, 99.0, 99.0, "KIO"),
        ]
    }

    #[test]
    fn test_stack_pivots_and_fills_gaps() {
        let s = stack(&rows(), false);
        assert_eq!(s.years, vec![2021, 2022, 2023]);
        assert_eq!(s.sides, vec!["KIO".to_string(), "NUG".to_string()]);
        assert_eq!(s.segments[0], vec![(0.0, 10.0), (10.0, 15.0)]);
        // duplicate 2022/KIO row is ignored
        assert_eq!(s.segments[1], vec![(0.0, 30.0), (30.0, 37.0)]);
        // NUG has no 2023 row
        assert_eq!(s.segments[2], vec![(0.0, 2.0), (2.0, 2.0)]);
        assert_eq!(s.max_total(), 37.0);
    }

    #[test]
    fn test_totals_equal_sum_of_sides() {
        let s = stack(&rows(), true);
        for (i, &year) in s.years.iter().enumerate() {
            let sum: f64 = rows()
                .iter()
                .filter(|r| r.year == year)
                .fold(HashMap::new(), |mut acc: HashMap<String, f64>, r| {
                    acc.entry(r.side.clone()).or_insert(r.cumulative_deaths);
                    acc
                })
                .values()
                .sum();
            assert_eq!(s.total(i), sum);
        }
    }

    #[test]
    fn test_draw_uses_shared_palette() {
        let palette = SidePalette::new(["NUG", "KIO"]);
        let surface = draw_stacked(&rows(), false, Some(&palette));
        let kio = surface.find_by_class("segment-KIO").next().unwrap();
        assert_eq!(surface.attr(kio, "fill"), Some(palette.color("KIO")));
        let nug = surface.find_by_class("segment-NUG").next().unwrap();
        assert_eq!(surface.attr(nug, "fill"), Some("purple"));
    }

    #[test]
    fn test_draw_without_palette_uses_category10() {
        let surface = draw_stacked(&rows(), true, None);
        let kio = surface.find_by_class("segment-KIO").next().unwrap();
        assert_eq!(surface.attr(kio, "fill"), Some("#1f77b4"));
        assert_eq!(surface.find_by_class("year-stack").count(), 3);
        let totals: Vec<_> = surface
            .find_by_class("stack-total")
            .filter_map(|id| surface.text(id).map(str::to_string))
            .collect();
        assert_eq!(totals, vec!["15", "52", "42"]);
    }
}

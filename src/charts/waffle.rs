//! 10×10 waffle of event shares.

use crate::color::{OrdinalScale, UNKNOWN_COLOR};
use crate::surface::{num, Surface};
use serde::Deserialize;

const TILE_SIZE: f64 = 40.0;
const TILES_PER_ROW: usize = 10;
const GRID_TILES: usize = TILES_PER_ROW * TILES_PER_ROW;
const GAP: f64 = 2.0;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SummaryRow {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Absolute")]
    pub absolute: f64,
    #[serde(rename = "Percentage")]
    pub percentage: f64,
}

impl SummaryRow {
    /// Percentage rounded half-up, never negative
    pub fn tile_count(&self) -> usize {
        let rounded = (self.percentage + 0.5).floor();
        if rounded.is_finite() && rounded > 0.0 {
            rounded as usize
        } else {
            0
        }
    }
}

/// A placed waffle cell; `row_index` points into the input rows
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaffleTile {
    pub x: f64,
    pub y: f64,
    pub row_index: usize,
}

/// Lay tiles out row-major, continuing where the previous category stopped.
/// Tiles past the 10×10 grid are dropped.
pub fn layout(rows: &[SummaryRow]) -> Vec<WaffleTile> {
    rows.iter()
        .enumerate()
        .flat_map(|(row_index, row)| std::iter::repeat(row_index).take(row.tile_count()))
        .take(GRID_TILES)
        .enumerate()
        .map(|(i, row_index)| WaffleTile {
            x: (i % TILES_PER_ROW) as f64 * TILE_SIZE,
            y: (i / TILES_PER_ROW) as f64 * TILE_SIZE,
            row_index,
        })
        .collect()
}

pub fn draw_waffle(rows: &[SummaryRow]) -> Surface {
    let colors = OrdinalScale::new(["#888888", "#ee3333"]).with_domain(rows.iter().map(|r| r.kind.as_str()));
    let mut surface = Surface::new(400.0, 400.0);
    let root = surface.root();
    let layer = surface.group(root, "waffle");

    for tile in layout(rows) {
        let row = &rows[tile.row_index];
        let id = surface
            .append(layer, "rect")
            .attr("class", "waffle-tile")
            .attr("x", num(tile.x))
            .attr("y", num(tile.y))
            .attr("rx", "4")
            .attr("ry", "4")
            .attr("width", num(TILE_SIZE - GAP))
            .attr("height", num(TILE_SIZE - GAP))
            .attr("fill", colors.color(&row.kind).unwrap_or(UNKNOWN_COLOR))
            .attr("stroke", "#fff")
            .attr("stroke-width", "1")
            .id();
        surface.append(id, "title").text(format!(
            "{}\nAbsolute: {}\nPercentage: {}%",
            row.kind,
            num(row.absolute),
            row.tile_count()
        ));
    }
    surface
}

//! Dot map: one circle per battle event, grouped and colored by opposing side.

use crate::charts::class_slug;
use crate::color::SidePalette;
use crate::map::Basemap;
use crate::surface::{num, Surface};
use glam::DVec2;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// One geolocated battle event
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BattleRow {
    pub latitude: String,
    pub longitude: String,
    pub side_b: String,
}

impl BattleRow {
    fn position(&self) -> Option<(f64, f64)> {
        let lon = self.longitude.trim().parse::<f64>().ok()?;
        let lat = self.latitude.trim().parse::<f64>().ok()?;
        (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
    }
}

/// Events of one side, in input order
#[derive(Clone, Debug)]
pub struct SideGroup {
    pub side: String,
    pub points: Vec<DVec2>,
}

/// Project every event through the basemap projection and group by side.
/// Sides keep their first-appearance order.
pub fn group_events(basemap: &Basemap, rows: &[BattleRow]) -> Vec<SideGroup> {
    let projection = basemap.projection;
    let projected: Vec<Option<DVec2>> = rows
        .par_iter()
        .map(|row| row.position().map(|(lon, lat)| projection.project(lon, lat)))
        .collect();

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<SideGroup> = Vec::new();
    let mut skipped = 0usize;
    for (row, point) in rows.iter().zip(projected) {
        let Some(point) = point else {
            skipped += 1;
            continue;
        };
        let slot = *index.entry(row.side_b.as_str()).or_insert_with(|| {
            groups.push(SideGroup {
                side: row.side_b.clone(),
                points: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].points.push(point);
    }
    if skipped > 0 {
        debug!(skipped, "battle rows without usable coordinates");
    }
    groups
}

/// Draw the dot map and return the side palette for downstream charts
pub fn draw_symbols(basemap: &Basemap, rows: &[BattleRow]) -> (Surface, SidePalette) {
    let groups = group_events(basemap, rows);
    let palette = SidePalette::new(groups.iter().map(|g| g.side.as_str()));

    let mut surface = basemap.surface.clone();
    surface.clear_styles();
    surface.add_style(
        ".side-groups:hover .battle-circle{r:2px;}.side-groups .side-group:hover .battle-circle{r:5px;}",
    );
    let root = surface.root();
    let layer = surface.group(root, "side-groups");

    for group in &groups {
        let g = surface
            .append(layer, "g")
            .attr("class", format!("side-group side-group-{}", class_slug(&group.side)))
            .attr("data-side", &group.side)
            .id();
        surface
            .append(g, "title")
            .text(format!("Against: {}", group.side));
        let fill = palette.base_color(&group.side).to_string();
        for p in &group.points {
            surface
                .append(g, "circle")
                .attr("class", "battle-circle")
                .attr("cx", num(p.x))
                .attr("cy", num(p.y))
                .attr("r", "4")
                .attr("fill", &fill)
                .attr("stroke", "#333")
                .attr("stroke-width", "0.5");
        }
    }

    let legend_y = (basemap.viewport.height - 170.0).max(20.0);
    let legend = surface
        .append(root, "g")
        .attr("class", "legend")
        .attr("transform", format!("translate(20,{})", num(legend_y)))
        .id();
    surface
        .append(legend, "circle")
        .attr("r", "4")
        .attr("fill", "white")
        .attr("stroke", "#333")
        .attr("stroke-width", "0.5");
    surface
        .append(legend, "text")
        .attr("x", "10")
        .attr("y", "4")
        .attr("font-size", "12px")
        .attr("fill", "white")
        .text("1 dot = 1 battle");

    (surface, palette)
}

use crate::error::Result;
use crate::map::boundary::RegionBoundary;
use crate::map::projection::{Projection, Viewport};
use crate::map::tiles::{project_rect, PixelRect, TileAddress, TileRange};
use crate::surface::{num, ElementId, Surface};
use rayon::prelude::*;
use std::fmt::Write;
use tracing::debug;

/// Presentation settings for the basemap layers
#[derive(Clone, Debug)]
pub struct BasemapStyle {
    /// Tile image location with `{z}`, `{x}` and `{y}` placeholders
    pub tile_template: String,
    pub region_fill: String,
    pub region_stroke: String,
    pub hover_fill: String,
    pub hover_stroke: String,
}

impl Default for BasemapStyle {
    fn default() -> Self {
        Self {
            tile_template: "tiles/{z}_{x}_{y}.jfif".to_string(),
            region_fill: "rgba(200, 200, 200, 0.2)".to_string(),
            region_stroke: "rgba(255, 255, 255, 0.3)".to_string(),
            hover_fill: "rgba(255, 255, 0, 0.3)".to_string(),
            hover_stroke: "rgba(255, 255, 0, 0.6)".to_string(),
        }
    }
}

/// A tile together with where it landed on the surface
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedTile {
    pub address: TileAddress,
    pub rect: PixelRect,
}

/// A rendered basemap: the surface plus the projection every overlay must reuse
#[derive(Clone, Debug)]
pub struct Basemap {
    pub surface: Surface,
    pub projection: Projection,
    pub viewport: Viewport,
    pub tiles: Vec<PlacedTile>,
    pub tile_layer: ElementId,
    pub region_layer: ElementId,
}

/// Fit a projection to `boundaries`, lay tiles under it and draw name-tagged
/// region paths on top.
pub fn build_basemap(
    boundaries: &[RegionBoundary],
    viewport: Viewport,
    tile_range: &TileRange,
    style: &BasemapStyle,
) -> Result<Basemap> {
    let projection = Projection::fit(boundaries, viewport)?;
    debug!(
        regions = boundaries.len(),
        scale = projection.scale(),
        "fitted basemap projection"
    );

    let mut surface = Surface::new(viewport.width, viewport.height);
    surface.add_style(format!(
        ".region:hover{{fill:{};stroke:{};}}",
        style.hover_fill, style.hover_stroke
    ));
    let root = surface.root();
    let tile_layer = surface.group(root, "tiles");
    let region_layer = surface.group(root, "vectors");

    let tiles: Vec<PlacedTile> = tile_range
        .iter()
        .map(|address| PlacedTile {
            address,
            rect: project_rect(&projection, address.bounds()),
        })
        .collect();

    for tile in &tiles {
        surface
            .append(tile_layer, "image")
            .attr("id", format!("tile-{}", tile.address.key()))
            .attr("xlink:href", tile.address.href(&style.tile_template))
            .attr("x", num(tile.rect.x))
            .attr("y", num(tile.rect.y))
            .attr("width", num(tile.rect.width))
            .attr("height", num(tile.rect.height))
            .attr("preserveAspectRatio", "none");
    }

    let paths: Vec<String> = boundaries
        .par_iter()
        .map(|region| region_path(&projection, region))
        .collect();

    for (region, d) in boundaries.iter().zip(paths) {
        let id = surface
            .append(region_layer, "path")
            .attr("class", "region")
            .attr("data-region-name", &region.name)
            .attr("d", d)
            .attr("fill", &style.region_fill)
            .attr("stroke", &style.region_stroke)
            .id();
        surface.append(id, "title").text(region.name.as_str());
        surface.tag_region(&region.name, id);
    }

    Ok(Basemap {
        surface,
        projection,
        viewport,
        tiles,
        tile_layer,
        region_layer,
    })
}

/// SVG path data for every ring of a region
pub fn region_path(projection: &Projection, region: &RegionBoundary) -> String {
    let mut d = String::with_capacity(region.vertex_count() * 16);
    for ring in region.polygons.iter().flatten() {
        for (i, &(lon, lat)) in ring.iter().enumerate() {
            let p = projection.project(lon, lat);
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{},{}", num(p.x), num(p.y));
        }
        if !ring.is_empty() {
            d.push('Z');
        }
    }
    d
}

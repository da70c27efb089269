use crate::braille::BrailleCanvas;
use crate::map::boundary::RegionBoundary;
use crate::map::geometry::{draw_rect, draw_ring};
use crate::map::projection::ScaledProjection;
use crate::map::spatial::RegionGrid;
use crate::map::tiles::{TileAddress, TileRange};
use glam::DVec2;

/// Grid cell size for hover lookups, in degrees
const GRID_CELL_DEG: f64 = 0.5;

/// Which layers the preview draws
#[derive(Clone, Debug)]
pub struct LayerSettings {
    pub show_regions: bool,
    pub show_tiles: bool,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            show_regions: true,
            show_tiles: true,
        }
    }
}

/// Rendered Braille layers, composited back to front by the UI
pub struct MapLayers {
    pub tiles: BrailleCanvas,
    pub regions: BrailleCanvas,
    pub highlight: BrailleCanvas,
    /// (column, row, text) overlays in character coordinates
    pub labels: Vec<(u16, u16, String)>,
}

/// Draws region outlines and tile footprints through a shared projection
pub struct MapRenderer {
    regions: Vec<RegionBoundary>,
    tiles: Vec<TileAddress>,
    grid: RegionGrid,
    pub settings: LayerSettings,
}

impl MapRenderer {
    pub fn new(regions: Vec<RegionBoundary>, tiles: &TileRange) -> Self {
        let grid = RegionGrid::build(&regions, GRID_CELL_DEG);
        Self {
            regions,
            tiles: tiles.iter().collect(),
            grid,
            settings: LayerSettings::default(),
        }
    }

    pub fn regions(&self) -> &[RegionBoundary] {
        &self.regions
    }

    /// Index of the region under a geographic point
    pub fn region_at(&self, lon: f64, lat: f64) -> Option<usize> {
        self.grid.hit(&self.regions, lon, lat)
    }

    /// Render all layers into canvases of `width` x `height` characters
    pub fn render(
        &self,
        width: usize,
        height: usize,
        projection: &ScaledProjection,
        highlight: Option<usize>,
    ) -> MapLayers {
        let mut layers = MapLayers {
            tiles: BrailleCanvas::new(width, height),
            regions: BrailleCanvas::new(width, height),
            highlight: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        };

        if self.settings.show_tiles {
            for tile in &self.tiles {
                let bounds = tile.bounds();
                let nw = projection.project(bounds.nw.0, bounds.nw.1);
                let se = projection.project(bounds.se.0, bounds.se.1);
                draw_rect(&mut layers.tiles, nw, se);
            }
        }

        if self.settings.show_regions {
            for (idx, region) in self.regions.iter().enumerate() {
                if Some(idx) == highlight {
                    continue;
                }
                draw_region(&mut layers.regions, region, projection);
            }
        }

        if let Some(region) = highlight.and_then(|idx| self.regions.get(idx)) {
            draw_region(&mut layers.highlight, region, projection);
            if let Some((min_lon, min_lat, max_lon, max_lat)) = region.bbox() {
                let center = projection.project((min_lon + max_lon) / 2.0, (min_lat + max_lat) / 2.0);
                if center.x >= 0.0 && center.y >= 0.0 {
                    let col = (center.x / 2.0) as usize;
                    let row = (center.y / 4.0) as usize;
                    if col < width && row < height {
                        let start = col.saturating_sub(region.name.chars().count() / 2);
                        layers.labels.push((start as u16, row as u16, region.name.clone()));
                    }
                }
            }
        }

        layers
    }

    pub fn toggle_regions(&mut self) {
        self.settings.show_regions = !self.settings.show_regions;
    }

    pub fn toggle_tiles(&mut self) {
        self.settings.show_tiles = !self.settings.show_tiles;
    }
}

fn draw_region(canvas: &mut BrailleCanvas, region: &RegionBoundary, projection: &ScaledProjection) {
    let mut points: Vec<DVec2> = Vec::new();
    for ring in region.polygons.iter().flatten() {
        points.clear();
        points.extend(ring.iter().map(|&(lon, lat)| projection.project(lon, lat)));
        draw_ring(canvas, &points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::fixtures::two_squares;
    use crate::map::projection::{Projection, Viewport};

    fn setup() -> (MapRenderer, ScaledProjection) {
        let regions = two_squares();
        // 40x20 dots, squares fill it exactly
        let projection = Projection::fit(&regions, Viewport::new(200.0, 100.0))
            .unwrap()
            .rescaled(DVec2::splat(0.2));
        let range = TileRange::new(128..=128, 127..=127, 8).unwrap();
        (MapRenderer::new(regions, &range), projection)
    }

    #[test]
    fn test_region_at_uses_exact_containment() {
        let (renderer, _) = setup();
        assert_eq!(renderer.region_at(0.5, 0.5), Some(0));
        assert_eq!(renderer.region_at(1.5, 0.5), Some(1));
        assert_eq!(renderer.region_at(5.0, 5.0), None);
    }

    #[test]
    fn test_highlight_drawn_on_its_own_layer() {
        let (renderer, projection) = setup();
        let layers = renderer.render(20, 5, &projection, Some(1));
        // Square B spans dots x 20..40; its left edge sits at x = 20
        assert!(layers.highlight.is_set(20, 10));
        assert!(!layers.highlight.is_set(5, 10));
        assert!(layers.regions.is_set(0, 10));
        assert_eq!(layers.labels.len(), 1);
        assert_eq!(layers.labels[0].2, "B");
    }

    #[test]
    fn test_toggles_hide_layers() {
        let (mut renderer, projection) = setup();
        renderer.toggle_regions();
        renderer.toggle_tiles();
        let layers = renderer.render(20, 5, &projection, None);
        assert!(layers.regions.rows().all(|r| r.chars().all(|c| c == '\u{2800}')));
        assert!(layers.tiles.rows().all(|r| r.chars().all(|c| c == '\u{2800}')));
    }
}

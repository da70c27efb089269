use crate::map::boundary::RegionBoundary;
use std::collections::HashMap;

/// Spatial index over region bounding boxes for hover hit-testing.
/// Each region is inserted into every cell its bbox overlaps, so a lookup
/// never misses a region; candidates are confirmed with point-in-polygon.
#[derive(Clone, Debug)]
pub struct RegionGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl RegionGrid {
    /// Build from region bounding boxes; `cell_size` is in degrees
    pub fn build(regions: &[RegionBoundary], cell_size: f64) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            cell_size,
        };
        for (idx, region) in regions.iter().enumerate() {
            let Some((min_lon, min_lat, max_lon, max_lat)) = region.bbox() else {
                continue;
            };
            let min_cell = grid.to_cell(min_lon, min_lat);
            let max_cell = grid.to_cell(max_lon, max_lat);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Regions whose bbox cell contains the point, in drawing order
    pub fn candidates(&self, lon: f64, lat: f64) -> &[usize] {
        if !lon.is_finite() || !lat.is_finite() {
            return &[];
        }
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Topmost region containing the point. Later regions paint over
    /// earlier ones, so the last match wins.
    pub fn hit(&self, regions: &[RegionBoundary], lon: f64, lat: f64) -> Option<usize> {
        self.candidates(lon, lat)
            .iter()
            .rev()
            .copied()
            .find(|&idx| regions.get(idx).is_some_and(|r| r.contains(lon, lat)))
    }
}

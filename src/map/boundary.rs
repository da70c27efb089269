use crate::geo::{ring_contains, LonLat};

/// A closed ring of lon/lat positions
pub type Ring = Vec<LonLat>;

/// Exterior ring followed by any holes
pub type Polygon = Vec<Ring>;

/// A named administrative region in lon/lat
#[derive(Clone, Debug, PartialEq)]
pub struct RegionBoundary {
    pub name: String,
    pub polygons: Vec<Polygon>,
}

impl RegionBoundary {
    pub fn new(name: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        Self {
            name: name.into(),
            polygons,
        }
    }

    /// Build a single-ring region, mostly useful for fixtures
    pub fn from_ring(name: impl Into<String>, ring: Ring) -> Self {
        Self::new(name, vec![vec![ring]])
    }

    /// All positions of every ring
    pub fn vertices(&self) -> impl Iterator<Item = LonLat> + '_ {
        self.polygons.iter().flatten().flatten().copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.polygons.iter().flatten().map(Vec::len).sum()
    }

    /// Bounding box as (min_lon, min_lat, max_lon, max_lat)
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.vertices().fold(None, |acc, (lon, lat)| match acc {
            None => Some((lon, lat, lon, lat)),
            Some((a, b, c, d)) => Some((a.min(lon), b.min(lat), c.max(lon), d.max(lat))),
        })
    }

    /// Point-in-region test; holes are handled by even-odd parity per polygon
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygons.iter().any(|polygon| {
            polygon
                .iter()
                .filter(|ring| ring_contains(ring, lon, lat))
                .count()
                % 2
                == 1
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::rect;
    use super::*;

    #[test]
    fn bbox_spans_all_rings() {
        let mut region = rect("R", 0.0, 0.0, 1.0, 1.0);
        region.polygons.push(vec![vec![(5.0, -2.0), (6.0, -2.0), (6.0, 3.0), (5.0, -2.0)]]);
        assert_eq!(region.bbox(), Some((0.0, -2.0, 6.0, 3.0)));
        assert_eq!(region.vertex_count(), 9);
    }

    #[test]
    fn hole_is_not_contained() {
        let outer = vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)];
        let hole = vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)];
        let region = RegionBoundary::new("donut", vec![vec![outer, hole]]);
        assert!(region.contains(0.5, 0.5));
        assert!(!region.contains(2.0, 2.0));
    }

    #[test]
    fn empty_region_has_no_bbox() {
        assert_eq!(RegionBoundary::new("empty", vec![]).bbox(), None);
    }
}

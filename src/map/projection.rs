use crate::error::{AtlasError, Result};
use crate::geo::{inverse_mercator_y, mercator_y, LonLat};
use crate::map::boundary::RegionBoundary;
use glam::DVec2;
use serde::Deserialize;

/// Pixel dimensions of a drawing surface
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(AtlasError::invalid(format!(
                "viewport must be positive, got {}x{}",
                self.width, self.height
            )))
        }
    }

    /// Check if a projected point lies inside the surface (inclusive edges)
    pub fn contains(&self, p: DVec2, tolerance: f64) -> bool {
        p.x >= -tolerance
            && p.x <= self.width + tolerance
            && p.y >= -tolerance
            && p.y <= self.height + tolerance
    }
}

/// Mercator projection fitted to a boundary set.
///
/// `x = k·λ + tx`, `y = ty − k·ln(tan(π/4 + φ/2))`, so screen y grows
/// southward. The struct is `Copy`; every overlay receives the same value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    scale: f64,
    translate: DVec2,
}

impl Projection {
    /// Fit so the union of all boundaries fills `viewport` on its limiting
    /// axis and is centered on the other.
    pub fn fit(boundaries: &[RegionBoundary], viewport: Viewport) -> Result<Self> {
        viewport.validate()?;
        if boundaries.is_empty() {
            return Err(AtlasError::invalid("no region boundaries to fit a projection to"));
        }

        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for region in boundaries {
            if region.vertex_count() == 0 {
                return Err(AtlasError::invalid(format!(
                    "region `{}` has no vertices",
                    region.name
                )));
            }
            for (lon, lat) in region.vertices() {
                if !lon.is_finite() || !lat.is_finite() {
                    return Err(AtlasError::invalid(format!(
                        "region `{}` has a non-finite coordinate ({lon}, {lat})",
                        region.name
                    )));
                }
                let raw = DVec2::new(lon.to_radians(), mercator_y(lat));
                min = min.min(raw);
                max = max.max(raw);
            }
        }

        let extent = max - min;
        if extent.x <= 0.0 && extent.y <= 0.0 {
            return Err(AtlasError::invalid(
                "region boundaries collapse to a single point",
            ));
        }

        // A zero extent on one axis leaves the other axis to decide the scale
        let kx = if extent.x > 0.0 { viewport.width / extent.x } else { f64::INFINITY };
        let ky = if extent.y > 0.0 { viewport.height / extent.y } else { f64::INFINITY };
        let scale = kx.min(ky);

        let translate = DVec2::new(
            (viewport.width - scale * (min.x + max.x)) / 2.0,
            (viewport.height + scale * (min.y + max.y)) / 2.0,
        );

        Ok(Self { scale, translate })
    }

    /// Pixels per radian of longitude
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> DVec2 {
        self.translate
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        DVec2::new(
            self.translate.x + self.scale * lon.to_radians(),
            self.translate.y - self.scale * mercator_y(lat),
        )
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn invert(&self, p: DVec2) -> LonLat {
        let lon = ((p.x - self.translate.x) / self.scale).to_degrees();
        let lat = inverse_mercator_y((self.translate.y - p.y) / self.scale);
        (lon, lat)
    }

    /// Same projection magnified by `factor` around a fixed pixel
    pub fn zoomed_at(&self, factor: f64, anchor: DVec2) -> Self {
        Self {
            scale: self.scale * factor,
            translate: anchor + (self.translate - anchor) * factor,
        }
    }

    /// Same projection shifted by a pixel delta
    pub fn panned(&self, delta: DVec2) -> Self {
        Self {
            scale: self.scale,
            translate: self.translate + delta,
        }
    }

    /// Uniformly rescale pixel space, e.g. from SVG pixels to Braille dots
    pub fn rescaled(&self, factor: DVec2) -> ScaledProjection {
        ScaledProjection {
            base: *self,
            factor,
        }
    }
}

/// A projection followed by a per-axis pixel scale
#[derive(Clone, Copy, Debug)]
pub struct ScaledProjection {
    base: Projection,
    factor: DVec2,
}

impl ScaledProjection {
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        self.base.project(lon, lat) * self.factor
    }

    pub fn invert(&self, p: DVec2) -> LonLat {
        self.base.invert(p / self.factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::boundary::fixtures::{rect, two_squares};

    const EPS: f64 = 1e-6;

    fn projected_bbox(projection: &Projection, boundaries: &[RegionBoundary]) -> (DVec2, DVec2) {
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for (lon, lat) in boundaries.iter().flat_map(|b| b.vertices()) {
            let p = projection.project(lon, lat);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    #[test]
    fn test_fit_two_squares_corners() {
        let vp = Viewport::new(200.0, 100.0);
        let projection = Projection::fit(&two_squares(), vp).unwrap();

        let sw = projection.project(0.0, 0.0);
        let ne = projection.project(2.0, 1.0);
        assert!(sw.x.abs() < 0.05, "{sw:?}");
        assert!((sw.y - 100.0).abs() < EPS, "{sw:?}");
        assert!((ne.x - 200.0).abs() < 0.05, "{ne:?}");
        assert!(ne.y.abs() < EPS, "{ne:?}");
    }

    #[test]
    fn test_fit_is_tight_and_centered() {
        let boundaries = vec![rect("tall", 92.0, 10.0, 101.0, 28.5)];
        let vp = Viewport::new(300.0, 600.0);
        let projection = Projection::fit(&boundaries, vp).unwrap();
        let (min, max) = projected_bbox(&projection, &boundaries);

        assert!(vp.contains(min, EPS) && vp.contains(max, EPS));

        // One axis spans edge to edge, the other is centered
        let spans_x = min.x.abs() < EPS && (max.x - vp.width).abs() < EPS;
        let spans_y = min.y.abs() < EPS && (max.y - vp.height).abs() < EPS;
        assert!(spans_x || spans_y);
        assert!((min.x - (vp.width - max.x)).abs() < EPS);
        assert!((min.y - (vp.height - max.y)).abs() < EPS);
    }

    #[test]
    fn test_fit_rejects_empty() {
        let err = Projection::fit(&[], Viewport::new(10.0, 10.0)).unwrap_err();
        assert!(matches!(err, AtlasError::InvalidInput(_)));
    }

    #[test]
    fn test_fit_rejects_degenerate_inputs() {
        let point = RegionBoundary::from_ring("p", vec![(1.0, 1.0), (1.0, 1.0)]);
        assert!(matches!(
            Projection::fit(&[point], Viewport::new(10.0, 10.0)),
            Err(AtlasError::InvalidInput(_))
        ));

        let nan = RegionBoundary::from_ring("n", vec![(f64::NAN, 1.0), (2.0, 2.0)]);
        assert!(Projection::fit(&[nan], Viewport::new(10.0, 10.0)).is_err());

        assert!(Projection::fit(&two_squares(), Viewport::new(0.0, 10.0)).is_err());
        assert!(Projection::fit(&[RegionBoundary::new("hollow", vec![])], Viewport::new(10.0, 10.0)).is_err());
    }

    #[test]
    fn test_flat_extent_uses_other_axis() {
        let line = RegionBoundary::from_ring("line", vec![(0.0, 5.0), (4.0, 5.0)]);
        let projection = Projection::fit(&[line], Viewport::new(100.0, 50.0)).unwrap();
        let a = projection.project(0.0, 5.0);
        let b = projection.project(4.0, 5.0);
        assert!((b.x - a.x - 100.0).abs() < EPS);
        assert!((a.y - 25.0).abs() < EPS);
    }

    #[test]
    fn test_refit_is_deterministic() {
        let vp = Viewport::new(300.0, 600.0);
        let a = Projection::fit(&two_squares(), vp).unwrap();
        let b = Projection::fit(&two_squares(), vp).unwrap();
        for (lon, lat) in [(0.3, 0.7), (1.9, 0.1), (-5.0, 20.0)] {
            assert!((a.project(lon, lat) - b.project(lon, lat)).length() < 1e-12);
        }
    }

    #[test]
    fn test_invert_round_trip() {
        let projection = Projection::fit(&two_squares(), Viewport::new(200.0, 100.0)).unwrap();
        let (lon, lat) = projection.invert(projection.project(1.25, 0.4));
        assert!((lon - 1.25).abs() < 1e-9);
        assert!((lat - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let projection = Projection::fit(&two_squares(), Viewport::new(200.0, 100.0)).unwrap();
        let anchor = projection.project(1.0, 0.5);
        let zoomed = projection.zoomed_at(1.5, anchor);
        assert!((zoomed.project(1.0, 0.5) - anchor).length() < 1e-9);
        assert!((zoomed.scale() - projection.scale() * 1.5).abs() < 1e-9);
    }
}

//! Slippy tile addressing.
//!
//! Tile row `y` counts southward from the top of the world, the same
//! direction screen `y` grows in, so a tile's NW corner is
//! `(lon(x), lat(y))` and its SE corner is `(lon(x + 1), lat(y + 1))`
//! with no extra sign flip on latitude.

use crate::error::{AtlasError, Result};
use crate::map::projection::Projection;
use serde::Deserialize;
use std::f64::consts::PI;

/// Highest zoom whose `2^z` still fits comfortably in a u32 index
pub const MAX_ZOOM: u8 = 30;

/// Tiles per axis at zoom `z`
#[inline]
fn world_tiles(z: u8) -> f64 {
    2f64.powi(i32::from(z))
}

/// Longitude of the west edge of tile column `x`
#[inline]
pub fn tile_to_lon(x: f64, z: u8) -> f64 {
    x / world_tiles(z) * 360.0 - 180.0
}

/// Latitude of the north edge of tile row `y` (inverse Mercator)
#[inline]
pub fn tile_to_lat(y: f64, z: u8) -> f64 {
    let n = PI - 2.0 * PI * y / world_tiles(z);
    n.sinh().atan().to_degrees()
}

/// A raster tile address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileAddress {
    /// Checked address: `z` at most [`MAX_ZOOM`], `x` and `y` below `2^z`
    pub fn new(x: u32, y: u32, z: u8) -> Result<Self> {
        if z > MAX_ZOOM {
            return Err(AtlasError::invalid(format!("zoom {z} exceeds {MAX_ZOOM}")));
        }
        let n = 1u32 << z;
        if x >= n || y >= n {
            return Err(AtlasError::invalid(format!(
                "tile {x}/{y} out of range for zoom {z} (max {})",
                n - 1
            )));
        }
        Ok(Self { x, y, z })
    }

    /// Geographic corners of this tile
    pub fn bounds(&self) -> TileBounds {
        let (x, y) = (f64::from(self.x), f64::from(self.y));
        TileBounds {
            nw: (tile_to_lon(x, self.z), tile_to_lat(y, self.z)),
            se: (tile_to_lon(x + 1.0, self.z), tile_to_lat(y + 1.0, self.z)),
        }
    }

    /// `{z}_{x}_{y}` key used for image names and element ids
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.z, self.x, self.y)
    }

    /// Expand a template containing `{z}`, `{x}` and `{y}` placeholders
    pub fn href(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// North-west and south-east corners as (lon, lat)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileBounds {
    pub nw: (f64, f64),
    pub se: (f64, f64),
}

impl TileBounds {
    /// Bounds of an arbitrary geographic rectangle
    pub fn from_extent(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            nw: (min_lon, max_lat),
            se: (max_lon, min_lat),
        }
    }
}

/// Axis-aligned rectangle in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Place a geographic rectangle in pixel space through `projection`
pub fn project_rect(projection: &Projection, bounds: TileBounds) -> PixelRect {
    let nw = projection.project(bounds.nw.0, bounds.nw.1);
    let se = projection.project(bounds.se.0, bounds.se.1);
    PixelRect {
        x: nw.x,
        y: nw.y,
        width: se.x - nw.x,
        height: se.y - nw.y,
    }
}

/// Inclusive rectangular range of tile indices at one zoom
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTileRange")]
pub struct TileRange {
    x_min: u32,
    x_max: u32,
    y_min: u32,
    y_max: u32,
    zoom: u8,
}

#[derive(Deserialize)]
struct RawTileRange {
    x: [u32; 2],
    y: [u32; 2],
    zoom: u8,
}

impl TryFrom<RawTileRange> for TileRange {
    type Error = AtlasError;

    fn try_from(raw: RawTileRange) -> Result<Self> {
        TileRange::new(raw.x[0]..=raw.x[1], raw.y[0]..=raw.y[1], raw.zoom)
    }
}

impl TileRange {
    /// x 48–49, y 33–37 at zoom 6
    pub const DEFAULT: TileRange = TileRange {
        x_min: 48,
        x_max: 49,
        y_min: 33,
        y_max: 37,
        zoom: 6,
    };

    pub fn new(
        xs: std::ops::RangeInclusive<u32>,
        ys: std::ops::RangeInclusive<u32>,
        zoom: u8,
    ) -> Result<Self> {
        if zoom > MAX_ZOOM {
            return Err(AtlasError::invalid(format!("zoom {zoom} exceeds {MAX_ZOOM}")));
        }
        let (x_min, x_max, y_min, y_max) = (*xs.start(), *xs.end(), *ys.start(), *ys.end());
        if x_min > x_max || y_min > y_max {
            return Err(AtlasError::invalid(format!(
                "empty tile range x {x_min}..={x_max}, y {y_min}..={y_max}"
            )));
        }
        let n = 1u32 << zoom;
        if x_max >= n || y_max >= n {
            return Err(AtlasError::invalid(format!(
                "tile index out of range for zoom {zoom} (max {})",
                n - 1
            )));
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
            zoom,
        })
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn len(&self) -> usize {
        ((self.x_max - self.x_min + 1) as usize) * ((self.y_max - self.y_min + 1) as usize)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Column-major: every row of column `x_min` first
    pub fn iter(&self) -> impl Iterator<Item = TileAddress> + '_ {
        (self.x_min..=self.x_max)
            .flat_map(move |x| {
                (self.y_min..=self.y_max).map(move |y| TileAddress { x, y, z: self.zoom })
            })
    }
}

mod basemap;
mod boundary;
pub mod geometry;
mod projection;
mod renderer;
mod spatial;
pub mod tiles;

pub use basemap::{build_basemap, region_path, Basemap, BasemapStyle, PlacedTile};
pub use boundary::{Polygon, RegionBoundary, Ring};
pub use projection::{Projection, ScaledProjection, Viewport};
pub use renderer::{LayerSettings, MapLayers, MapRenderer};
pub use spatial::RegionGrid;
pub use tiles::{project_rect, PixelRect, TileAddress, TileBounds, TileRange};

#[cfg(test)]
pub(crate) use boundary::fixtures;

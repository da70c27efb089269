//! Tile-aligned Mercator basemaps and the editorial charts drawn on them.
//!
//! The article build is a [`pipeline::Pipeline`] of chart stages that each
//! render into an SVG [`surface::Surface`]. The same projection also drives
//! a Braille terminal preview ([`app`], [`ui`]).

pub mod app;
pub mod braille;
pub mod charts;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod map;
pub mod pipeline;
pub mod scale;
pub mod surface;
pub mod ui;

pub use error::{AtlasError, Result};

//! Chart overlays and standalone charts.
//!
//! Map overlays take the [`Basemap`](crate::map::Basemap) they draw onto
//! and reuse its projection; they never fit their own.

pub mod choropleth;
pub mod dumbbell;
pub mod stacked;
pub mod symbol;
pub mod waffle;

use crate::scale::LinearScale;
use crate::surface::{num, ElementId, Surface};

/// One finished chart, written out as `<name>.svg`
#[derive(Clone, Debug)]
pub struct ChartOutput {
    pub name: String,
    pub surface: Surface,
}

impl ChartOutput {
    pub fn new(name: impl Into<String>, surface: Surface) -> Self {
        Self {
            name: name.into(),
            surface,
        }
    }
}

/// Sanitize a label for use inside a CSS class name
pub(crate) fn class_slug(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Vertical axis at `x` with tick marks and labels on the left
pub(crate) fn axis_left(
    surface: &mut Surface,
    parent: ElementId,
    x: f64,
    scale: &LinearScale,
    ticks: &[(f64, String)],
) -> ElementId {
    let axis = surface.group(parent, "axis axis-left");
    surface
        .append(axis, "line")
        .attr("x1", num(x))
        .attr("x2", num(x))
        .attr("y1", num(scale.range.0))
        .attr("y2", num(scale.range.1))
        .attr("stroke", "currentColor");
    for (value, label) in ticks {
        let y = scale.scale(*value);
        surface
            .append(axis, "line")
            .attr("x1", num(x - 6.0))
            .attr("x2", num(x))
            .attr("y1", num(y))
            .attr("y2", num(y))
            .attr("stroke", "currentColor");
        surface
            .append(axis, "text")
            .attr("x", num(x - 9.0))
            .attr("y", num(y))
            .attr("dy", "0.32em")
            .attr("text-anchor", "end")
            .attr("font-size", "12px")
            .text(label.as_str());
    }
    axis
}

/// Horizontal axis at `y`; each tick is (x position, label)
pub(crate) fn axis_horizontal(
    surface: &mut Surface,
    parent: ElementId,
    y: f64,
    span: (f64, f64),
    ticks: &[(f64, String)],
    labels_above: bool,
) -> ElementId {
    let axis = surface.group(parent, "axis axis-horizontal");
    surface
        .append(axis, "line")
        .attr("x1", num(span.0))
        .attr("x2", num(span.1))
        .attr("y1", num(y))
        .attr("y2", num(y))
        .attr("stroke", "currentColor");
    let (tick_end, label_y) = if labels_above {
        (y - 6.0, y - 9.0)
    } else {
        (y + 6.0, y + 18.0)
    };
    for (x, label) in ticks {
        surface
            .append(axis, "line")
            .attr("x1", num(*x))
            .attr("x2", num(*x))
            .attr("y1", num(y))
            .attr("y2", num(tick_end))
            .attr("stroke", "currentColor");
        surface
            .append(axis, "text")
            .attr("x", num(*x))
            .attr("y", num(label_y))
            .attr("text-anchor", "middle")
            .attr("font-size", "12px")
            .text(label.as_str());
    }
    axis
}

use crate::map::{MapRenderer, Projection, ScaledProjection, Viewport};
use glam::DVec2;

const ZOOM_STEP: f64 = 1.25;

/// Preview state: the article projection, the terminal view onto it and
/// the region under the mouse.
pub struct App {
    pub map_renderer: MapRenderer,
    /// SVG viewport the article projection was fitted to
    pub viewport: Viewport,
    base: Projection,
    view: Projection,
    /// Braille pixel size of the map area
    dots: (usize, usize),
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    pub hovered: Option<usize>,
}

impl App {
    pub fn new(map_renderer: MapRenderer, projection: Projection, viewport: Viewport, width: usize, height: usize) -> Self {
        let mut app = Self {
            map_renderer,
            viewport,
            base: projection,
            view: projection,
            dots: (0, 0),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            hovered: None,
        };
        app.resize(width, height);
        app
    }

    /// Update map size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        // Account for border (2 chars horizontal, 2 chars vertical plus the status bar)
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(3);
        self.dots = (inner_width * 2, inner_height * 4);
    }

    /// Dots per SVG pixel, fitting the whole article viewport on screen
    fn factor(&self) -> f64 {
        let fx = self.dots.0 as f64 / self.viewport.width;
        let fy = self.dots.1 as f64 / self.viewport.height;
        fx.min(fy).max(f64::MIN_POSITIVE)
    }

    /// Projection from lon/lat straight to Braille dots
    pub fn screen_projection(&self) -> ScaledProjection {
        self.view.rescaled(DVec2::splat(self.factor()))
    }

    /// Convert terminal cell to the dot at its center, inside the border
    fn cell_to_dot(col: u16, row: u16) -> Option<DVec2> {
        if col == 0 || row == 0 {
            return None;
        }
        Some(DVec2::new(
            f64::from(col - 1) * 2.0 + 1.0,
            f64::from(row - 1) * 4.0 + 2.0,
        ))
    }

    /// Pan the map by a number of dots
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let delta = DVec2::new(f64::from(dx), f64::from(dy)) / self.factor();
        self.view = self.view.panned(delta);
        self.refresh_hover();
    }

    pub fn zoom_in(&mut self) {
        self.zoom_about(self.center_dot(), ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_about(self.center_dot(), 1.0 / ZOOM_STEP);
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some(dot) = Self::cell_to_dot(col, row) {
            self.zoom_about(dot, ZOOM_STEP);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some(dot) = Self::cell_to_dot(col, row) {
            self.zoom_about(dot, 1.0 / ZOOM_STEP);
        }
    }

    fn center_dot(&self) -> DVec2 {
        DVec2::new(self.dots.0 as f64, self.dots.1 as f64) / 2.0
    }

    fn zoom_about(&mut self, dot: DVec2, factor: f64) {
        let anchor = dot / self.factor();
        self.view = self.view.zoomed_at(factor, anchor);
        self.refresh_hover();
    }

    /// Back to the article framing
    pub fn reset(&mut self) {
        self.view = self.base;
        self.refresh_hover();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Zoom relative to the article framing
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.view.scale() / self.base.scale())
    }

    pub fn hovered_name(&self) -> Option<&str> {
        self.hovered
            .and_then(|idx| self.map_renderer.regions().get(idx))
            .map(|r| r.name.as_str())
    }

    /// Geographic position under the mouse
    pub fn cursor_lon_lat(&self) -> Option<(f64, f64)> {
        let (col, row) = self.mouse_pos?;
        let dot = Self::cell_to_dot(col, row)?;
        Some(self.screen_projection().invert(dot))
    }

    pub fn cursor_coords(&self) -> String {
        match self.cursor_lon_lat() {
            Some((lon, lat)) => format!(
                "{:.2}°{}, {:.2}°{}",
                lat.abs(),
                if lat >= 0.0 { "N" } else { "S" },
                lon.abs(),
                if lon >= 0.0 { "E" } else { "W" }
            ),
            None => "-".to_string(),
        }
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.refresh_hover();
    }

    /// Mouse position in Braille dots within the map area
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        let (col, row) = self.mouse_pos?;
        let dot = Self::cell_to_dot(col, row)?;
        Some((dot.x as i32, dot.y as i32))
    }

    fn refresh_hover(&mut self) {
        self.hovered = self
            .cursor_lon_lat()
            .and_then(|(lon, lat)| self.map_renderer.region_at(lon, lat));
    }

    /// Pan by the mouse movement since the last drag event
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (i32::from(col) - i32::from(last_col)) * 2;
            let dy = (i32::from(row) - i32::from(last_row)) * 4;
            if dx != 0 || dy != 0 {
                self.pan(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::fixtures::two_squares;
    use crate::map::TileRange;

    /// 102x28 terminal → 100x25 cells → 200x100 dots, factor 1
    fn app() -> App {
        let regions = two_squares();
        let viewport = Viewport::new(200.0, 100.0);
        let projection = Projection::fit(&regions, viewport).unwrap();
        let range = TileRange::new(128..=128, 127..=127, 8).unwrap();
        App::new(MapRenderer::new(regions, &range), projection, viewport, 102, 28)
    }

    #[test]
    fn test_hover_finds_region_under_mouse() {
        let mut app = app();
        // column 26 → dot x 51, inside square A
        app.set_mouse_pos(26, 12);
        assert_eq!(app.hovered_name(), Some("A"));
        // column 76 → dot x 151, inside square B
        app.set_mouse_pos(76, 12);
        assert_eq!(app.hovered_name(), Some("B"));
        app.set_mouse_pos(0, 0);
        assert_eq!(app.hovered_name(), None);
    }

    #[test]
    fn test_pan_moves_hover() {
        let mut app = app();
        app.set_mouse_pos(76, 12);
        assert_eq!(app.hovered_name(), Some("B"));
        // drag the map 100 dots right: square A now sits under the mouse
        app.pan(100, 0);
        assert_eq!(app.hovered_name(), Some("A"));
        app.reset();
        assert_eq!(app.hovered_name(), Some("B"));
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let mut app = app();
        app.set_mouse_pos(26, 12);
        let before = app.cursor_lon_lat().unwrap();
        app.zoom_in_at(26, 12);
        let after = app.cursor_lon_lat().unwrap();
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
        assert!((app.view.scale() / app.base.scale() - ZOOM_STEP).abs() < 1e-12);
    }
}

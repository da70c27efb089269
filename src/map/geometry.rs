use crate::braille::BrailleCanvas;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Whether the segment's bounding box touches the canvas
fn segment_visible(canvas: &BrailleCanvas, a: DVec2, b: DVec2) -> bool {
    let (w, h) = (canvas.pixel_width() as f64, canvas.pixel_height() as f64);
    !(a.x.max(b.x) < 0.0 || a.y.max(b.y) < 0.0 || a.x.min(b.x) >= w || a.y.min(b.y) >= h)
}

/// Draw a closed ring of pixel-space points, skipping off-canvas segments
pub fn draw_ring(canvas: &mut BrailleCanvas, points: &[DVec2]) {
    if points.len() < 2 {
        return;
    }
    let limit = (canvas.pixel_width() + canvas.pixel_height()) as f64 * 4.0;
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        if !a.is_finite() || !b.is_finite() || !segment_visible(canvas, a, b) {
            continue;
        }
        // Segments far outside the canvas would spin Bresenham for nothing
        if a.x.abs().max(a.y.abs()).max(b.x.abs()).max(b.y.abs()) > limit {
            continue;
        }
        draw_line(
            canvas,
            a.x.round() as i32,
            a.y.round() as i32,
            b.x.round() as i32,
            b.y.round() as i32,
        );
    }
}

/// Axis-aligned rectangle outline between two corners
pub fn draw_rect(canvas: &mut BrailleCanvas, nw: DVec2, se: DVec2) {
    draw_ring(
        canvas,
        &[nw, DVec2::new(se.x, nw.y), se, DVec2::new(nw.x, se.y)],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_ring_closes() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_rect(&mut canvas, DVec2::new(0.0, 0.0), DVec2::new(7.0, 7.0));
        for i in 0..8 {
            assert!(canvas.is_set(i, 0) && canvas.is_set(i, 7));
            assert!(canvas.is_set(0, i) && canvas.is_set(7, i));
        }
        assert!(!canvas.is_set(3, 3));
    }

    #[test]
    fn test_offscreen_segments_skipped() {
        let mut canvas = BrailleCanvas::new(2, 1);
        draw_ring(
            &mut canvas,
            &[DVec2::new(-50.0, -50.0), DVec2::new(-10.0, -50.0), DVec2::new(f64::NAN, 0.0)],
        );
        assert_eq!(canvas.to_string(), "⠀⠀");
    }
}

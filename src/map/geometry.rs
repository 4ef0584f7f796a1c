use crate::braille::BrailleCanvas;

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

/// Clip a segment to the box `0..width` x `0..height` (Liang-Barsky).
/// Returns `None` when no part of it is inside.
pub fn clip_line(
    (x0, y0): (i32, i32),
    (x1, y1): (i32, i32),
    width: usize,
    height: usize,
) -> Option<((i32, i32), (i32, i32))> {
    let (fx0, fy0) = (x0 as f64, y0 as f64);
    let (dx, dy) = ((x1 - x0) as f64, (y1 - y0) as f64);
    let (max_x, max_y) = (width as f64 - 1.0, height as f64 - 1.0);

    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [(-dx, fx0), (dx, max_x - fx0), (-dy, fy0), (dy, max_y - fy0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f64| ((fx0 + t * dx).round() as i32, (fy0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

/// Draw a circle outline (midpoint algorithm), used as a halo around the
/// marker whose popup is open
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (px, py) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            canvas.set_pixel_signed(cx + px, cy + py);
        }

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
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
    fn test_clip_line() {
        // Inside stays as is
        assert_eq!(clip_line((1, 1), (5, 3), 10, 10), Some(((1, 1), (5, 3))));
        // Long horizontal segment is cut to the box
        assert_eq!(clip_line((-1000, 4), (100_000, 4), 10, 10), Some(((0, 4), (9, 4))));
        // Entirely outside
        assert_eq!(clip_line((-5, -5), (-1, 20), 10, 10), None);
        assert_eq!(clip_line((20, 0), (30, 9), 10, 10), None);
    }

    #[test]
    fn test_ring_leaves_center_empty() {
        let mut canvas = BrailleCanvas::new(6, 3);
        draw_ring(&mut canvas, 6, 6, 4);
        // Center dot (6, 6) lives in cell (3, 1) at bit 0x04; the ring never sets it
        let center_cell = canvas.glyph(3, 1).map(|c| c as u32 - 0x2800).unwrap_or(0);
        assert_eq!(center_cell & 0x04, 0);
        assert!(canvas.glyphs().count() > 4);
    }
}

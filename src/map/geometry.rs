use crate::braille::BrailleCanvas;

/// 2x2 ordered-dither thresholds
const BAYER_2X2: [[f32; 2]; 2] = [[0.125, 0.625], [0.875, 0.375]];

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

/// Three offset passes of `draw_line`, for heavier strokes
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Circle outline (midpoint algorithm)
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }

    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (px, py) in [
            (x, y), (y, x), (-y, x), (-x, y),
            (-x, -y), (-y, -x), (y, -x), (x, -y),
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

/// Fill a disc, lighting only the share of dots given by `opacity`
pub fn fill_circle_dithered(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32, opacity: f32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let x = cx + dx;
            let y = cy + dy;
            let threshold = BAYER_2X2[y.rem_euclid(2) as usize][x.rem_euclid(2) as usize];
            if opacity > threshold {
                canvas.set_pixel_signed(x, y);
            }
        }
    }
}

/// Circle marker: dithered fill plus a solid outline
pub fn draw_circle_marker(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32, fill_opacity: f32) {
    fill_circle_dithered(canvas, cx, cy, radius, fill_opacity);
    draw_ring(canvas, cx, cy, radius);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(canvas: &BrailleCanvas) -> u32 {
        canvas
            .rows()
            .flat_map(|row| row.chars().collect::<Vec<_>>())
            .map(|ch| (ch as u32 - 0x2800).count_ones())
            .sum()
    }

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
    fn test_thick_line_sets_more_dots() {
        let mut thin = BrailleCanvas::new(10, 3);
        let mut thick = BrailleCanvas::new(10, 3);
        draw_line(&mut thin, 0, 4, 15, 4);
        draw_thick_line(&mut thick, 0, 4, 15, 4);
        assert!(lit(&thick) > lit(&thin));
    }

    #[test]
    fn test_ring_is_hollow() {
        let mut canvas = BrailleCanvas::new(10, 5);
        draw_ring(&mut canvas, 10, 10, 4);
        assert!(canvas.is_set(14, 10));
        assert!(canvas.is_set(10, 6));
        assert!(!canvas.is_set(10, 10));
    }

    #[test]
    fn test_half_opacity_fills_about_half() {
        let mut canvas = BrailleCanvas::new(20, 10);
        fill_circle_dithered(&mut canvas, 20, 20, 8, 0.5);
        let mut full = BrailleCanvas::new(20, 10);
        fill_circle_dithered(&mut full, 20, 20, 8, 1.0);

        let half = lit(&canvas) as f64;
        let all = lit(&full) as f64;
        assert!(half / all > 0.4 && half / all < 0.6, "{half}/{all}");
    }

    #[test]
    fn test_zero_radius_marker_is_a_dot() {
        let mut canvas = BrailleCanvas::new(1, 1);
        draw_circle_marker(&mut canvas, 0, 0, 0, 0.5);
        assert!(canvas.is_set(0, 0));
    }
}

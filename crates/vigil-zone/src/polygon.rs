use vigil_proto::Point;

/// Inside-or-on-boundary test for a closed polygon given by its vertices.
/// Degenerate input (fewer than 3 vertices) contains nothing.
pub fn contains(poly: &[Point], p: Point) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    if on_boundary(poly, p) {
        return true;
    }

    // Ray casting towards +x
    let (px, py) = (p.x as f64, p.y as f64);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (poly[i].x as f64, poly[i].y as f64);
        let (xj, yj) = (poly[j].x as f64, poly[j].y as f64);
        if (yi > py) != (yj > py) {
            let x_cross = xi + (py - yi) * (xj - xi) / (yj - yi);
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_boundary(poly: &[Point], p: Point) -> bool {
    let n = poly.len();
    (0..n).any(|i| on_segment(poly[i], poly[(i + 1) % n], p))
}

// exact in i128: i32 differences need 33 bits, their products 66
fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let (ax, ay) = (a.x as i128, a.y as i128);
    let (bx, by) = (b.x as i128, b.y as i128);
    let (px, py) = (p.x as i128, p.y as i128);
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    cross == 0 && px >= ax.min(bx) && px <= ax.max(bx) && py >= ay.min(by) && py <= ay.max(by)
}

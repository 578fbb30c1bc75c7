use egui::{Pos2, Rect, Vec2};

// Strict overlap: rectangles that only share an edge do not overlap.
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

// Inclusive containment of `inner` by `outer`.
pub fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.min.x <= inner.min.x
        && outer.min.y <= inner.min.y
        && inner.max.x <= outer.max.x
        && inner.max.y <= outer.max.y
}

pub fn rect_from_points(a: Pos2, b: Pos2) -> Rect {
    Rect::from_min_max(
        Pos2::new(a.x.min(b.x), a.y.min(b.y)),
        Pos2::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

// Distance from point P to segment AB
pub fn point_segment_distance(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ap = Vec2::new(p.x - a.x, p.y - a.y);
    let ab = Vec2::new(b.x - a.x, b.y - a.y);
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len2).clamp(0.0, 1.0);
    let proj = Pos2::new(a.x + ab.x * t, a.y + ab.y * t);
    ((p.x - proj.x).powi(2) + (p.y - proj.y).powi(2)).sqrt()
}

/// Liang-Barsky clip of segment AB against `rect`. Touching the boundary counts.
pub fn segment_intersects_rect(a: Pos2, b: Pos2, rect: Rect) -> bool {
    let d = b - a;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    let checks = [
        (-d.x, a.x - rect.min.x),
        (d.x, rect.max.x - a.x),
        (-d.y, a.y - rect.min.y),
        (d.y, rect.max.y - a.y),
    ];
    for (p, q) in checks {
        if p.abs() <= f32::EPSILON {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 { return false; }
            if r > t0 { t0 = r; }
        } else {
            if r < t0 { return false; }
            if r < t1 { t1 = r; }
        }
    }
    t0 <= t1
}

pub fn align_to_grid(point: Pos2, grid: f32) -> Pos2 {
    if grid <= 0.0 {
        return point;
    }
    Pos2::new((point.x / grid).round() * grid, (point.y / grid).round() * grid)
}

/// Cubic curve used for link routing and link hit testing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub p0: Pos2,
    pub p1: Pos2,
    pub p2: Pos2,
    pub p3: Pos2,
}

impl CubicBezier {
    pub const SEGMENTS: usize = 24;

    pub fn new(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Curve leaving `start` along `start_dir` and entering `end` against `end_dir`.
    pub fn from_endpoints(start: Pos2, start_dir: Vec2, end: Pos2, end_dir: Vec2, strength: f32) -> Self {
        // Short links get softer tangents so they don't overshoot
        let reach = ((end - start).length() * 0.5).min(strength.max(0.0));
        Self::new(start, start + start_dir * reach, end + end_dir * reach, end)
    }

    pub fn straight(start: Pos2, end: Pos2) -> Self {
        Self::new(start, start, end, end)
    }

    pub fn point_at(&self, t: f32) -> Pos2 {
        let u = 1.0 - t;
        let w0 = u * u * u;
        let w1 = 3.0 * u * u * t;
        let w2 = 3.0 * u * t * t;
        let w3 = t * t * t;
        Pos2::new(
            w0 * self.p0.x + w1 * self.p1.x + w2 * self.p2.x + w3 * self.p3.x,
            w0 * self.p0.y + w1 * self.p1.y + w2 * self.p2.y + w3 * self.p3.y,
        )
    }

    pub fn flatten(&self) -> Vec<Pos2> {
        (0..=Self::SEGMENTS)
            .map(|i| self.point_at(i as f32 / Self::SEGMENTS as f32))
            .collect()
    }

    pub fn distance_to(&self, point: Pos2) -> f32 {
        self.flatten()
            .windows(2)
            .map(|w| point_segment_distance(point, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }

    // Convex hull of the control points bounds the whole curve
    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::from_min_max(self.p0, self.p0);
        for p in [self.p1, self.p2, self.p3] {
            rect.extend_with(p);
        }
        rect
    }

    pub fn intersects_rect(&self, rect: Rect) -> bool {
        if !overlaps(self.bounds().expand(1.0), rect) {
            return false;
        }
        self.flatten()
            .windows(2)
            .any(|w| segment_intersects_rect(w[0], w[1], rect))
    }

    pub fn inside_rect(&self, rect: Rect) -> bool {
        self.flatten().iter().all(|p| rect.contains(*p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn shared_edge_is_not_an_overlap() {
        let a = Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0));
        let b = Rect::from_min_max(pos2(10.0, 0.0), pos2(20.0, 10.0));
        let c = Rect::from_min_max(pos2(9.0, 9.0), pos2(20.0, 20.0));
        assert!(!overlaps(a, b));
        assert!(overlaps(a, c));
    }

    #[test]
    fn containment_is_inclusive() {
        let outer = Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0));
        assert!(contains_rect(outer, outer));
        assert!(contains_rect(outer, Rect::from_min_max(pos2(2.0, 2.0), pos2(5.0, 5.0))));
        assert!(!contains_rect(outer, Rect::from_min_max(pos2(2.0, 2.0), pos2(11.0, 5.0))));
    }

    #[test]
    fn segment_rect_clipping() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0));
        assert!(segment_intersects_rect(pos2(-5.0, 5.0), pos2(15.0, 5.0), rect));
        assert!(segment_intersects_rect(pos2(2.0, 2.0), pos2(3.0, 3.0), rect));
        assert!(!segment_intersects_rect(pos2(-5.0, -5.0), pos2(-1.0, 20.0), rect));
        assert!(!segment_intersects_rect(pos2(11.0, 0.0), pos2(11.0, 10.0), rect));
    }

    #[test]
    fn curve_distance_and_rect_hits() {
        let curve = CubicBezier::straight(pos2(0.0, 0.0), pos2(100.0, 0.0));
        assert!(curve.distance_to(pos2(50.0, 3.0)) < 3.5);
        assert!(curve.distance_to(pos2(50.0, 30.0)) > 29.0);
        assert!(curve.intersects_rect(Rect::from_min_max(pos2(40.0, -5.0), pos2(60.0, 5.0))));
        assert!(!curve.intersects_rect(Rect::from_min_max(pos2(40.0, 5.0), pos2(60.0, 15.0))));
        assert!(curve.inside_rect(Rect::from_min_max(pos2(-1.0, -1.0), pos2(101.0, 1.0))));
    }

    #[test]
    fn grid_alignment_rounds_to_nearest_cell() {
        assert_eq!(align_to_grid(pos2(7.0, 9.0), 16.0), pos2(0.0, 16.0));
        assert_eq!(align_to_grid(pos2(7.0, 9.0), 0.0), pos2(7.0, 9.0));
    }
}

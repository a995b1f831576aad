use crate::animation::ease::Ease;
use crate::foundation::core::Point;

const BISECTION_STEPS: usize = 10;

/// Time remapping applied while a keyframe blends toward the next one.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Tween {
    /// Identity: progress equals normalized time.
    None,
    /// Named easing function.
    Ease(Ease),
    /// Custom cubic Bézier ease.
    Custom(BezierEase),
}

impl Tween {
    /// Map normalized time `t` in `[0, 1]` to normalized progress.
    pub fn interpolate(&self, t: f64) -> f64 {
        match self {
            Self::None => t.clamp(0.0, 1.0),
            Self::Ease(e) => e.apply(t),
            Self::Custom(c) => c.interpolate(t),
        }
    }
}

/// Piecewise cubic Bézier in `(time, progress)` space.
///
/// Control points run `p0 c0 c1 p1 c2 c3 p2 ...`: segment `k` uses points `[3k, 3k + 4)`, so
/// consecutive segments share an endpoint.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BezierEase {
    /// Flat control polygon.
    pub points: Vec<Point>,
}

impl BezierEase {
    /// Build from a flat control polygon.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Number of complete cubic segments.
    pub fn segment_count(&self) -> usize {
        if self.points.len() < 4 {
            0
        } else {
            (self.points.len() - 1) / 3
        }
    }

    fn segment(&self, k: usize) -> [Point; 4] {
        let i = 3 * k;
        [
            self.points[i],
            self.points[i + 1],
            self.points[i + 2],
            self.points[i + 3],
        ]
    }

    /// Evaluate progress at normalized time `t`.
    ///
    /// Finds the segment spanning `t`, bisects its time coordinate, then linearly interpolates the
    /// output coordinate across the final bracket.
    pub fn interpolate(&self, t: f64) -> f64 {
        let n = self.segment_count();
        if n == 0 {
            return t.clamp(0.0, 1.0);
        }
        let t = t.clamp(0.0, 1.0);

        let k = (0..n)
            .find(|&k| t <= self.segment(k)[3].x)
            .unwrap_or(n - 1);
        let seg = self.segment(k);

        let mut lo = 0.0;
        let mut hi = 1.0;
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if cubic(seg, mid).x < t {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let a = cubic(seg, lo);
        let b = cubic(seg, hi);
        let span = b.x - a.x;
        if span.abs() < f64::EPSILON {
            return a.y;
        }
        let f = ((t - a.x) / span).clamp(0.0, 1.0);
        a.y + (b.y - a.y) * f
    }
}

fn cubic(p: [Point; 4], s: f64) -> Point {
    let u = 1.0 - s;
    let w0 = u * u * u;
    let w1 = 3.0 * u * u * s;
    let w2 = 3.0 * u * s * s;
    let w3 = s * s * s;
    Point::new(
        w0 * p[0].x + w1 * p[1].x + w2 * p[2].x + w3 * p[3].x,
        w0 * p[0].y + w1 * p[1].y + w2 * p[2].y + w3 * p[3].y,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/animation/tween.rs"]
mod tests;

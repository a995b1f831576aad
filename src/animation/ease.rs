use std::f64::consts::PI;

/// Base easing curves. Each is defined by its ease-in form; out and in/out are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Curve {
    /// `t^2`.
    Quad,
    /// `t^3`.
    Cubic,
    /// `t^4`.
    Quart,
    /// `t^5`.
    Quint,
    /// Quarter sine wave.
    Sine,
    /// Overshooting cubic.
    Back,
    /// Quarter circle.
    Circ,
    /// Decaying bounces.
    Bounce,
    /// Decaying sine oscillation.
    Elastic,
}

impl Curve {
    /// Every curve, in declaration order.
    pub const ALL: [Curve; 9] = [
        Curve::Quad,
        Curve::Cubic,
        Curve::Quart,
        Curve::Quint,
        Curve::Sine,
        Curve::Back,
        Curve::Circ,
        Curve::Bounce,
        Curve::Elastic,
    ];

    fn name(self) -> &'static str {
        match self {
            Curve::Quad => "quad",
            Curve::Cubic => "cubic",
            Curve::Quart => "quart",
            Curve::Quint => "quint",
            Curve::Sine => "sine",
            Curve::Back => "back",
            Curve::Circ => "circ",
            Curve::Bounce => "bounce",
            Curve::Elastic => "elastic",
        }
    }

    fn ease_in(self, t: f64) -> f64 {
        match self {
            Curve::Quad => t * t,
            Curve::Cubic => t * t * t,
            Curve::Quart => t.powi(4),
            Curve::Quint => t.powi(5),
            Curve::Sine => 1.0 - (t * PI / 2.0).cos(),
            Curve::Back => {
                const C1: f64 = 1.70158;
                (C1 + 1.0) * t * t * t - C1 * t * t
            }
            Curve::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Curve::Bounce => 1.0 - bounce_out(1.0 - t),
            Curve::Elastic => {
                if t <= 0.0 || t >= 1.0 {
                    return t;
                }
                let c4 = (2.0 * PI) / 3.0;
                -(2f64.powf(10.0 * t - 10.0)) * ((10.0 * t - 10.75) * c4).sin()
            }
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Easing functions used to map normalized keyframe progress.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Classic motion-tween ease with intensity in `[-100, 100]`.
    ///
    /// Negative values ease in, positive values ease out; `0` is linear.
    Classic {
        /// Ease strength.
        intensity: f64,
    },
    /// Ease-in form of a curve.
    In(Curve),
    /// Ease-out form of a curve.
    Out(Curve),
    /// Ease-in for the first half, ease-out for the second.
    InOut(Curve),
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    ///
    /// The endpoints are exact: `apply(0) == 0` and `apply(1) == 1`.
    pub fn apply(self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::Classic { intensity } => {
                let k = (intensity / 100.0).clamp(-1.0, 1.0);
                t + k * t * (1.0 - t)
            }
            Self::In(c) => c.ease_in(t),
            Self::Out(c) => 1.0 - c.ease_in(1.0 - t),
            Self::InOut(c) => {
                if t < 0.5 {
                    c.ease_in(2.0 * t) / 2.0
                } else {
                    1.0 - c.ease_in(2.0 - 2.0 * t) / 2.0
                }
            }
        }
    }

    /// Resolve an exported ease method name such as `quadIn`, `bounceInOut`, or `none`.
    ///
    /// `classic` resolves to [`Ease::Classic`] with the given `intensity`.
    pub fn from_method(method: &str, intensity: f64) -> Option<Self> {
        let m = method.trim();
        match m {
            "" | "none" | "linear" => return Some(Self::Linear),
            "classic" => return Some(Self::Classic { intensity }),
            _ => {}
        }
        Curve::ALL.into_iter().find_map(|c| {
            let rest = m.strip_prefix(c.name())?;
            match rest {
                "In" => Some(Self::In(c)),
                "Out" => Some(Self::Out(c)),
                "InOut" => Some(Self::InOut(c)),
                _ => None,
            }
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;

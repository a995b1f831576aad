/// Distance kept below an exclusive end frame when clamping (`end - FRAME_EPSILON`).
pub const FRAME_EPSILON: f64 = 1e-4;

/// Wrap `time` into `[0, duration)`.
///
/// A zero (or negative) duration always maps to `0.0`.
pub fn wrap_time(time: f64, duration: f64) -> f64 {
    if duration <= 0.0 || !time.is_finite() {
        return 0.0;
    }
    let mut t = time;
    if t >= duration || t < 0.0 {
        t = t.rem_euclid(duration);
    }
    // rem_euclid can round up to exactly `duration` for tiny negative inputs.
    if t >= duration { 0.0 } else { t }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

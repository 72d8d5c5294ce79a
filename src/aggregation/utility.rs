/// Largest value, ignoring NaN. Returns 0.0 for empty input or when every
/// value is below zero.
pub fn max_or_zero(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, f64::max)
}

/// Percentage change from `from` to `to`. A zero base reads as no change.
pub fn percent_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

/// Tick step close to `span / count`, rounded to 1, 2 or 5 times a power of ten.
pub fn tick_step(span: f64, count: usize) -> f64 {
    if !(span > 0.0) || count == 0 || !span.is_finite() {
        return 0.0;
    }

    let raw = span / count as f64;
    let power = raw.log10().floor();
    let magnitude = 10f64.powi(power as i32);
    let error = raw / magnitude;

    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    factor * magnitude
}

/// Extends `max` up to a round tick boundary for a `[0, max]` axis with about
/// ten ticks.
pub fn nice_max(max: f64) -> f64 {
    let mut stop = max;
    let mut prev_step = 0.0;

    // The step depends on the extent, so settle after a few rounds
    for _ in 0..10 {
        let step = tick_step(stop, 10);
        if step == 0.0 || step == prev_step {
            break;
        }
        stop = (stop / step).ceil() * step;
        prev_step = step;
    }

    stop
}

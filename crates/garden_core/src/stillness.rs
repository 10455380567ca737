//! Stillness timing for the world transition.

/// Marker value meaning no quantized second has been processed yet.
pub const UNSET_MARKER: i32 = -1;

/// Seconds spent standing still near a sculpture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StillnessTimer {
    elapsed: f32,
    /// Last quantized second whose event was processed
    marker: i32,
}

impl Default for StillnessTimer {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            marker: UNSET_MARKER,
        }
    }
}

impl StillnessTimer {
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn marker(&self) -> i32 {
        self.marker
    }

    /// Whole seconds elapsed.
    pub fn quantized(&self) -> i32 {
        self.elapsed as i32
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    pub fn mark(&mut self, second: i32) {
        self.marker = second;
    }

    /// Start a new stillness period.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Fog start distance after `elapsed` seconds of stillness.
///
/// Shrinks from `base - 1` at zero as the world closes in.
pub fn fog_start_distance(base: f32, rate: f32, elapsed: f32) -> f32 {
    base - (rate * elapsed).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fog_formula() {
        assert!((fog_start_distance(50.0, 0.3, 0.0) - 49.0).abs() < 1e-6);
        let at_ten = 50.0 - (3.0f32).exp();
        assert!((fog_start_distance(50.0, 0.3, 10.0) - at_ten).abs() < 1e-4);
    }

    #[test]
    fn test_fog_decreases_with_time() {
        let mut previous = fog_start_distance(50.0, 0.3, 0.0);
        for step in 1..=300 {
            let fog = fog_start_distance(50.0, 0.3, step as f32 * 0.1);
            assert!(fog < previous);
            previous = fog;
        }
    }

    #[test]
    fn test_timer_quantizes_and_resets() {
        let mut timer = StillnessTimer::default();
        assert_eq!(timer.marker(), UNSET_MARKER);
        timer.advance(5.99);
        assert_eq!(timer.quantized(), 5);
        timer.advance(0.02);
        assert_eq!(timer.quantized(), 6);

        timer.mark(6);
        timer.reset();
        assert_eq!(timer.elapsed(), 0.0);
        assert_eq!(timer.marker(), UNSET_MARKER);
    }

    #[test]
    fn test_negative_dt_does_not_rewind() {
        let mut timer = StillnessTimer::default();
        timer.advance(1.0);
        timer.advance(-0.5);
        assert_eq!(timer.elapsed(), 1.0);
    }
}

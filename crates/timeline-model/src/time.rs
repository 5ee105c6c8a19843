//! Rational time values and ranges.

use serde::{Deserialize, Serialize};

/// A point in time expressed as `value` units at `rate` units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RationalTime {
    pub value: f64,
    pub rate: f64,
}

impl RationalTime {
    pub fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }

    /// The same instant expressed at another rate.
    ///
    /// Non-positive rates on either side leave the value untouched.
    pub fn rescaled_to(&self, rate: f64) -> Self {
        if self.rate == rate || self.rate <= 0.0 || rate <= 0.0 {
            return Self::new(self.value, rate);
        }
        Self::new(self.value * rate / self.rate, rate)
    }

    /// Whole frames at `rate`, rounded to the nearest frame.
    pub fn to_frames(&self, rate: f64) -> i64 {
        self.rescaled_to(rate).value.round() as i64
    }

    /// Sum of two times, expressed at `self`'s rate.
    pub fn add(&self, other: &RationalTime) -> Self {
        Self::new(self.value + other.rescaled_to(self.rate).value, self.rate)
    }
}

/// A span of time: `start_time` plus `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_time: RationalTime,
    pub duration: RationalTime,
}

impl TimeRange {
    pub fn new(start_time: RationalTime, duration: RationalTime) -> Self {
        Self {
            start_time,
            duration,
        }
    }

    /// Shorthand for a range whose start and duration share one rate.
    pub fn from_frames(start: f64, duration: f64, rate: f64) -> Self {
        Self::new(RationalTime::new(start, rate), RationalTime::new(duration, rate))
    }

    pub fn end_time_exclusive(&self) -> RationalTime {
        self.start_time.add(&self.duration)
    }

    /// The last unit inside the range.
    ///
    /// Ranges shorter than one unit collapse onto their start.
    pub fn end_time_inclusive(&self) -> RationalTime {
        let duration = self.duration.rescaled_to(self.start_time.rate);
        if duration.value > 1.0 {
            RationalTime::new(
                self.start_time.value + duration.value - 1.0,
                self.start_time.rate,
            )
        } else {
            self.start_time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_end_time_inclusive_is_last_frame() {
        let range = TimeRange::from_frames(10.0, 80.0, 30.0);
        assert_eq!(range.end_time_inclusive().value, 89.0);
        assert_eq!(range.end_time_exclusive().value, 90.0);
    }

    #[test]
    fn test_single_frame_range_collapses_to_start() {
        let range = TimeRange::from_frames(5.0, 1.0, 24.0);
        assert_eq!(range.end_time_inclusive().value, 5.0);
    }

    #[test]
    fn test_rescale_between_rates() {
        let t = RationalTime::new(48.0, 24.0);
        assert_eq!(t.rescaled_to(30.0).value, 60.0);
        assert_eq!(t.to_frames(30.0), 60);
    }

    #[test]
    fn test_add_uses_left_rate() {
        let a = RationalTime::new(24.0, 24.0);
        let b = RationalTime::new(30.0, 30.0);
        assert_eq!(a.add(&b), RationalTime::new(48.0, 24.0));
    }

    proptest! {
        #[test]
        fn frames_survive_rate_round_trip(
            frames in 0i64..1_000_000,
            rate in prop::sample::select(vec![24.0, 25.0, 30.0, 48.0, 60.0]),
        ) {
            let t = RationalTime::new(frames as f64, rate);
            let back = t.rescaled_to(1000.0).rescaled_to(rate);
            prop_assert_eq!(back.value.round() as i64, frames);
        }
    }
}

use log::debug;

use crate::core_data_types::{Axis, ThreeAxes};
use crate::error::CompassError;
use crate::simple_ring_buffer::RingBuffer;

/// Deepest supported smoothing history.
pub const MAX_SMOOTHING_STEPS: usize = 10;

/// Rolling average over the last `steps` calibrated samples.
///
/// In advanced mode one maximum and one minimum entry per axis are dropped
/// before averaging. Until `steps` samples have been pushed the unwritten
/// history slots count as zero, so early outputs are biased towards zero;
/// check [`SmoothingFilter::is_steady`] before trusting them.
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    history: RingBuffer<ThreeAxes<i32>, MAX_SMOOTHING_STEPS>,
    totals: ThreeAxes<i64>,
    advanced: bool,
}

impl SmoothingFilter {
    pub fn new(steps: u8, advanced: bool) -> Result<Self, CompassError> {
        let steps = validate(steps, advanced)?;
        Ok(Self {
            history: RingBuffer::with_depth(steps),
            totals: ThreeAxes::default(),
            advanced,
        })
    }

    /// Changes depth and mode. Depths above 10 are clamped to 10.
    /// History is cleared on success and left alone on error.
    pub fn configure(&mut self, steps: u8, advanced: bool) -> Result<(), CompassError> {
        *self = Self::new(steps, advanced)?;
        debug!("smoothing: steps={} advanced={}", self.steps(), advanced);
        Ok(())
    }

    pub fn steps(&self) -> usize {
        self.history.depth()
    }

    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    /// True once the history holds `steps` real samples.
    pub fn is_steady(&self) -> bool {
        self.history.is_full()
    }

    pub fn reset(&mut self) {
        self.history.reset();
        self.totals = ThreeAxes::default();
    }

    pub fn push(&mut self, sample: ThreeAxes<i32>) -> ThreeAxes<i32> {
        let evicted = self.history.push_cyclic(sample);
        self.totals = self
            .totals
            .zip_with(sample, |t, s| t + i64::from(s))
            .zip_with(evicted, |t, e| t - i64::from(e));

        let mut out = ThreeAxes::default();
        for axis in Axis::ALL {
            *out.get_mut(axis) = self.average(axis);
        }
        out
    }

    fn average(&self, axis: Axis) -> i32 {
        let total = self.totals.get(axis);
        let steps = self.steps() as i64;
        if !self.advanced {
            return rounded_div(total, steps);
        }

        let mut max = i32::MIN;
        let mut min = i32::MAX;
        for slot in self.history.slots() {
            let v = slot.get(axis);
            max = max.max(v);
            min = min.min(v);
        }
        rounded_div(total - i64::from(max) - i64::from(min), steps - 2)
    }
}

fn validate(steps: u8, advanced: bool) -> Result<usize, CompassError> {
    if steps == 0 {
        return Err(CompassError::InvalidConfiguration("smoothing steps must be at least 1"));
    }
    let steps = usize::from(steps).min(MAX_SMOOTHING_STEPS);
    if advanced && steps < 3 {
        return Err(CompassError::InvalidConfiguration(
            "advanced smoothing needs at least 3 steps",
        ));
    }
    Ok(steps)
}

fn rounded_div(total: i64, count: i64) -> i32 {
    libm::round(total as f64 / count as f64) as i32
}

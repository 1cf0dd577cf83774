//! Collaborators injected into the core.

use crate::core_data_types::RawSample;

/// Anything that can produce one raw magnetometer sample per call.
pub trait RawSource {
    type Error: core::fmt::Debug;

    fn read_raw(&mut self) -> Result<RawSample, Self::Error>;
}

/// Monotonic millisecond clock, only used for elapsed-time arithmetic.
pub trait MonotonicClock {
    fn now_ms(&self) -> u64;
}

/// Receives calibration progress, `fraction` in `[0, 1]`.
pub trait ProgressSink {
    fn progress(&mut self, fraction: f32, changed: bool);
}

impl<F: FnMut(f32, bool)> ProgressSink for F {
    fn progress(&mut self, fraction: f32, changed: bool) {
        self(fraction, changed)
    }
}

impl<S: RawSource + ?Sized> RawSource for &mut S {
    type Error = S::Error;

    fn read_raw(&mut self) -> Result<RawSample, Self::Error> {
        (**self).read_raw()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

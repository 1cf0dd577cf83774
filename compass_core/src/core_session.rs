//! Interactive calibration run.
//!
//! The caller rotates the sensor through every orientation while the session
//! polls the source, widening the tracked extrema. Calibration is derived once
//! from the final extrema when the time is up.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use crate::core_calibrate::{derive_from_min_max, CalibrationTracker, DerivedCalibration};
use crate::error::Error;
use crate::traits::{MonotonicClock, ProgressSink, RawSource};

/// Used when a session is requested with a duration of zero.
pub const DEFAULT_SESSION_SECONDS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionReport {
    /// Calibration committed at the end; on cancellation, what would have been.
    pub derived: DerivedCalibration,
    /// Successful reads, including the seed sample.
    pub samples: u32,
    pub failed_reads: u32,
    pub cancelled: bool,
}

/// Blocking calibration run of a fixed duration.
///
/// Emits `progress(0.0, true)` before sampling, one `progress(fraction,
/// changed)` per loop iteration, and `progress(1.0, false)` at the end.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationSession<'a> {
    duration_ms: u64,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> CalibrationSession<'a> {
    pub fn new(seconds: u32) -> Self {
        let seconds = if seconds == 0 { DEFAULT_SESSION_SECONDS } else { seconds };
        Self {
            duration_ms: u64::from(seconds) * 1000,
            cancel: None,
        }
    }

    /// Stop early once `token` is set. A cancelled run leaves the tracker as
    /// it was before the session.
    pub fn with_cancel(mut self, token: &'a AtomicBool) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, |t| t.load(Ordering::Relaxed))
    }

    pub fn run<S, C, P>(
        &self,
        tracker: &mut CalibrationTracker,
        source: &mut S,
        clock: &C,
        sink: &mut P,
    ) -> Result<SessionReport, Error<S::Error>>
    where
        S: RawSource + ?Sized,
        C: MonotonicClock + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let seed = source.read_raw().map_err(Error::Io)?;
        let previous = tracker.clone();
        tracker.seed(seed);
        info!("calibration session: {} ms", self.duration_ms);

        let mut samples = 1u32;
        let mut failed_reads = 0u32;
        let mut cancelled = false;
        let start = clock.now_ms();

        sink.progress(0.0, true);
        loop {
            let elapsed = clock.now_ms().saturating_sub(start).min(self.duration_ms);
            let fraction = elapsed as f32 / self.duration_ms as f32;

            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            let changed = match source.read_raw() {
                Ok(raw) => {
                    samples = samples.saturating_add(1);
                    tracker.track_extrema(raw)
                }
                Err(e) => {
                    failed_reads = failed_reads.saturating_add(1);
                    warn!("calibration session: read skipped: {:?}", e);
                    false
                }
            };
            sink.progress(fraction, changed);

            if elapsed >= self.duration_ms {
                break;
            }
        }

        let derived = if cancelled {
            let derived = derive_from_min_max(tracker.min(), tracker.max());
            *tracker = previous;
            debug!("calibration session cancelled after {} samples", samples);
            derived
        } else {
            tracker.apply_tracked()
        };
        sink.progress(1.0, false);

        Ok(SessionReport {
            derived,
            samples,
            failed_reads,
            cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_calibrate::Calibration;
    use crate::core_data_types::{AxisFlags, RawSample, ThreeAxes};
    use core::cell::Cell;
    use std::vec::Vec;

    /// Advances by `step_ms` on every read.
    struct SteppingClock {
        now: Cell<u64>,
        step_ms: u64,
    }

    impl SteppingClock {
        fn new(step_ms: u64) -> Self {
            Self { now: Cell::new(5_000), step_ms }
        }
    }

    impl MonotonicClock for SteppingClock {
        fn now_ms(&self) -> u64 {
            let t = self.now.get();
            self.now.set(t + self.step_ms);
            t
        }
    }

    /// Cycles through a script; `None` entries fail.
    struct ScriptedSource {
        script: Vec<Option<RawSample>>,
        pos: usize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Option<RawSample>>) -> Self {
            Self { script, pos: 0 }
        }
    }

    impl RawSource for ScriptedSource {
        type Error = &'static str;

        fn read_raw(&mut self) -> Result<RawSample, Self::Error> {
            let item = self.script[self.pos % self.script.len()];
            self.pos += 1;
            item.ok_or("bus error")
        }
    }

    fn rotation() -> Vec<Option<RawSample>> {
        vec![
            Some(RawSample::new(0, 0, 0)),
            Some(RawSample::new(200, 0, 0)),
            Some(RawSample::new(0, 100, 0)),
            Some(RawSample::new(-200, 0, 0)),
            Some(RawSample::new(0, -300, 0)),
        ]
    }

    #[test]
    fn emits_initial_and_final_events() {
        let mut tracker = CalibrationTracker::new();
        let mut source = ScriptedSource::new(rotation());
        let clock = SteppingClock::new(100);
        let mut events = Vec::new();
        let mut sink = |p: f32, c: bool| events.push((p, c));

        let report = CalibrationSession::new(1)
            .run(&mut tracker, &mut source, &clock, &mut sink)
            .unwrap();

        assert_eq!(events.first(), Some(&(0.0, true)));
        assert_eq!(events.last(), Some(&(1.0, false)));
        let loop_events = &events[1..events.len() - 1];
        assert!(loop_events.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(loop_events.iter().all(|(p, _)| (0.0..=1.0).contains(p)));
        assert_eq!(loop_events.last().map(|e| e.0), Some(1.0));
        assert!(loop_events.iter().any(|(_, c)| *c));
        assert!(!report.cancelled);
        assert_eq!(report.failed_reads, 0);
        assert_eq!(report.samples as usize, loop_events.len() + 1);
    }

    #[test]
    fn flat_z_axis_clamps_scale() {
        let mut tracker = CalibrationTracker::new();
        let mut source = ScriptedSource::new(rotation());
        let clock = SteppingClock::new(250);

        let report = CalibrationSession::new(2)
            .run(&mut tracker, &mut source, &clock, &mut |_: f32, _: bool| {})
            .unwrap();

        let cal = tracker.calibration();
        assert_eq!(cal.scale.z, 1.0);
        assert!(cal.scale.is_finite());
        assert_eq!(report.derived.degenerate, AxisFlags::Z);
        assert_eq!(cal.offset, ThreeAxes::new(0.0, -100.0, 0.0));
        assert_eq!(tracker.min(), ThreeAxes::new(-200, -300, 0));
        assert_eq!(tracker.max(), ThreeAxes::new(200, 100, 0));
    }

    #[test]
    fn zero_duration_means_default() {
        assert_eq!(CalibrationSession::new(0).duration_ms(), 10_000);
        assert_eq!(CalibrationSession::new(3).duration_ms(), 3_000);
    }

    #[test]
    fn failed_reads_are_skipped() {
        let mut tracker = CalibrationTracker::new();
        let mut script = rotation();
        script.insert(2, None);
        let mut source = ScriptedSource::new(script);
        let clock = SteppingClock::new(100);

        let report = CalibrationSession::new(1)
            .run(&mut tracker, &mut source, &clock, &mut |_: f32, _: bool| {})
            .unwrap();

        assert!(report.failed_reads > 0);
        assert_eq!(tracker.min(), ThreeAxes::new(-200, -300, 0));
    }

    #[test]
    fn failed_seed_read_touches_nothing() {
        let mut tracker = CalibrationTracker::new();
        tracker.set_offsets(1.0, 2.0, 3.0).unwrap();
        let before = tracker.clone();
        let mut source = ScriptedSource::new(vec![None]);
        let clock = SteppingClock::new(100);
        let mut events = 0;

        let result = CalibrationSession::new(1).run(
            &mut tracker,
            &mut source,
            &clock,
            &mut |_: f32, _: bool| events += 1,
        );

        assert!(matches!(result, Err(Error::Io("bus error"))));
        assert_eq!(events, 0);
        assert_eq!(tracker.state(), before.state());
    }

    #[test]
    fn cancelled_session_restores_tracker() {
        let mut tracker = CalibrationTracker::new();
        let token = AtomicBool::new(true);
        let mut source = ScriptedSource::new(rotation());
        let clock = SteppingClock::new(100);
        let mut events = Vec::new();
        let mut sink = |p: f32, c: bool| events.push((p, c));

        let report = CalibrationSession::new(5)
            .with_cancel(&token)
            .run(&mut tracker, &mut source, &clock, &mut sink)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(events, vec![(0.0, true), (1.0, false)]);
        assert_eq!(tracker.calibration(), Calibration::IDENTITY);
        assert_eq!(tracker.state(), CalibrationTracker::new().state());
    }
}

use core::sync::atomic::AtomicBool;

use log::{debug, trace};

use crate::configs::CompassConfig;
use crate::core_calibrate::{Calibration, CalibrationTracker, DerivedCalibration};
use crate::core_data_types::{RawSample, ThreeAxes};
use crate::core_filters::SmoothingFilter;
use crate::core_heading::{self, BearingSector, Declination};
use crate::core_session::{CalibrationSession, SessionReport};
use crate::error::{CompassError, Error};
use crate::traits::{MonotonicClock, ProgressSink, RawSource};

/// One magnetometer and everything derived from it.
///
/// Each [`Compass::read`] runs raw sample -> optional auto calibration ->
/// offset/scale correction -> optional smoothing, and keeps the result of every
/// stage for the accessors. Not thread-safe; wrap it in a mutex to share it.
pub struct Compass<S> {
    source: S,
    tracker: CalibrationTracker,
    smoothing: Option<SmoothingFilter>,
    auto_calibrate: bool,
    declination: Declination,
    raw: RawSample,
    calibrated: ThreeAxes<i32>,
    smoothed: ThreeAxes<i32>,
}

impl<S> Compass<S> {
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn release(self) -> S {
        self.source
    }
}

impl<S: RawSource> Compass<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tracker: CalibrationTracker::new(),
            smoothing: None,
            auto_calibrate: false,
            declination: Declination::ZERO,
            raw: RawSample::default(),
            calibrated: ThreeAxes::default(),
            smoothed: ThreeAxes::default(),
        }
    }

    pub fn with_config(source: S, config: CompassConfig) -> Result<Self, CompassError> {
        let smoothing = config.smoothing.map(|s| s.build()).transpose()?;
        let mut compass = Self::new(source);
        compass.smoothing = smoothing;
        compass.auto_calibrate = config.auto_calibrate;
        compass.declination = config.declination;
        Ok(compass)
    }

    pub fn set_auto_calibrate(&mut self, enabled: bool) {
        self.auto_calibrate = enabled;
    }

    pub fn auto_calibrate(&self) -> bool {
        self.auto_calibrate
    }

    pub fn set_smoothing(&mut self, steps: u8, advanced: bool) -> Result<(), CompassError> {
        let filter = SmoothingFilter::new(steps, advanced)?;
        debug!("smoothing: steps={} advanced={}", filter.steps(), advanced);
        self.smoothing = Some(filter);
        self.smoothed = self.calibrated;
        Ok(())
    }

    pub fn disable_smoothing(&mut self) {
        self.smoothing = None;
    }

    pub fn smoothing(&self) -> Option<&SmoothingFilter> {
        self.smoothing.as_ref()
    }

    pub fn set_magnetic_declination(&mut self, degrees: i16, minutes: u8) {
        self.declination = Declination::from_degrees_minutes(degrees, minutes);
    }

    pub fn set_declination(&mut self, declination: Declination) {
        self.declination = declination;
    }

    pub fn declination(&self) -> Declination {
        self.declination
    }

    pub fn tracker(&self) -> &CalibrationTracker {
        &self.tracker
    }

    pub fn set_calibration_offsets(&mut self, x: f32, y: f32, z: f32) -> Result<(), CompassError> {
        self.tracker.set_offsets(x, y, z)?;
        self.restart_smoothing();
        Ok(())
    }

    pub fn set_calibration_scales(&mut self, x: f32, y: f32, z: f32) -> Result<(), CompassError> {
        self.tracker.set_scales(x, y, z)?;
        self.restart_smoothing();
        Ok(())
    }

    /// Derives offsets and scales from known per-axis extrema.
    pub fn set_calibration(
        &mut self,
        x_min: i32,
        x_max: i32,
        y_min: i32,
        y_max: i32,
        z_min: i32,
        z_max: i32,
    ) -> DerivedCalibration {
        let derived = self.tracker.apply_min_max(x_min, x_max, y_min, y_max, z_min, z_max);
        self.restart_smoothing();
        derived
    }

    pub fn restore_calibration(&mut self, calibration: Calibration) -> Result<(), CompassError> {
        self.tracker.set_calibration(calibration)?;
        self.restart_smoothing();
        Ok(())
    }

    pub fn calibration(&self) -> Calibration {
        self.tracker.calibration()
    }

    /// Identity calibration plus a fresh extrema pass.
    pub fn clear_calibration(&mut self) {
        self.tracker.reset();
        self.tracker.reset_extrema();
        self.restart_smoothing();
    }

    /// The history was corrected with the previous calibration; drop it and
    /// show the last calibrated sample until the next read.
    fn restart_smoothing(&mut self) {
        if let Some(filter) = self.smoothing.as_mut() {
            filter.reset();
        }
        self.smoothed = self.calibrated;
    }

    pub fn calibration_offset(&self, index: usize) -> Result<f32, CompassError> {
        self.tracker.offset(index)
    }

    pub fn calibration_scale(&self, index: usize) -> Result<f32, CompassError> {
        self.tracker.scale(index)
    }

    /// Reads and processes one sample. Returns true when auto calibration saw
    /// a new extremum. On error nothing is updated.
    pub fn read(&mut self) -> Result<bool, Error<S::Error>> {
        let raw = self.source.read_raw().map_err(Error::Io)?;

        let mut tracker = self.tracker.clone();
        let found = self.auto_calibrate && tracker.observe(raw);
        let calibrated = tracker.correct(raw)?;

        self.tracker = tracker;
        self.raw = raw;
        self.calibrated = calibrated;
        if let Some(filter) = self.smoothing.as_mut() {
            self.smoothed = filter.push(calibrated);
        }
        trace!("read raw={:?} calibrated={:?}", raw, calibrated);
        Ok(found)
    }

    pub fn calibrate<C, P>(
        &mut self,
        seconds: u32,
        clock: &C,
        sink: &mut P,
    ) -> Result<SessionReport, Error<S::Error>>
    where
        C: MonotonicClock + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let report = CalibrationSession::new(seconds).run(&mut self.tracker, &mut self.source, clock, sink)?;
        self.after_session(&report);
        Ok(report)
    }

    pub fn calibrate_with_cancel<C, P>(
        &mut self,
        seconds: u32,
        clock: &C,
        sink: &mut P,
        cancel: &AtomicBool,
    ) -> Result<SessionReport, Error<S::Error>>
    where
        C: MonotonicClock + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let report = CalibrationSession::new(seconds)
            .with_cancel(cancel)
            .run(&mut self.tracker, &mut self.source, clock, sink)?;
        self.after_session(&report);
        Ok(report)
    }

    fn after_session(&mut self, report: &SessionReport) {
        if !report.cancelled {
            self.restart_smoothing();
        }
    }
}

impl<S> Compass<S> {
    pub fn raw(&self) -> RawSample {
        self.raw
    }

    pub fn calibrated(&self) -> ThreeAxes<i32> {
        self.calibrated
    }

    pub fn smoothed(&self) -> ThreeAxes<i32> {
        self.smoothed
    }

    /// Smoothed axes when smoothing is enabled, calibrated axes otherwise.
    pub fn axes(&self) -> ThreeAxes<i32> {
        if self.smoothing.is_some() {
            self.smoothed
        } else {
            self.calibrated
        }
    }

    pub fn x(&self) -> i32 {
        self.axes().x
    }

    pub fn y(&self) -> i32 {
        self.axes().y
    }

    pub fn z(&self) -> i32 {
        self.axes().z
    }

    pub fn azimuth(&self) -> f32 {
        core_heading::azimuth(self.x(), self.y(), self.declination.degrees())
    }

    pub fn bearing(&self) -> BearingSector {
        BearingSector::from_azimuth(self.azimuth())
    }

    pub fn direction(&self) -> &'static str {
        self.bearing().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::{SmoothingConfig, CONFIG_AUTO_CALIBRATE};
    use std::vec::Vec;

    struct QueueSource {
        samples: Vec<Result<RawSample, ()>>,
    }

    impl QueueSource {
        fn new(samples: &[Result<RawSample, ()>]) -> Self {
            let mut samples = samples.to_vec();
            samples.reverse();
            Self { samples }
        }
    }

    impl RawSource for QueueSource {
        type Error = ();

        fn read_raw(&mut self) -> Result<RawSample, ()> {
            self.samples.pop().unwrap_or(Err(()))
        }
    }

    #[test]
    fn due_east_vector_reads_north() {
        let mut compass = Compass::new(QueueSource::new(&[Ok(RawSample::new(100, 0, 0))]));
        assert!(!compass.read().unwrap());
        assert_eq!(compass.azimuth(), 0.0);
        assert_eq!(compass.bearing().index(), 0);
        assert_eq!(compass.direction(), "  N");
        assert_eq!(compass.axes(), ThreeAxes::new(100, 0, 0));
    }

    #[test]
    fn declination_shifts_heading() {
        let mut compass = Compass::new(QueueSource::new(&[Ok(RawSample::new(0, 50, 0))]));
        compass.set_magnetic_declination(90, 0);
        compass.read().unwrap();
        assert!((compass.azimuth() - 180.0).abs() < 1e-3);
        assert_eq!(compass.direction(), "  S");
    }

    #[test]
    fn failed_read_keeps_previous_outputs() {
        let mut compass = Compass::new(QueueSource::new(&[Ok(RawSample::new(0, 40, 0)), Err(())]));
        compass.set_auto_calibrate(true);
        compass.read().unwrap();
        let tracker_before = *compass.tracker().state();
        let axes_before = compass.axes();

        assert!(matches!(compass.read(), Err(Error::Io(()))));
        assert_eq!(compass.axes(), axes_before);
        assert_eq!(compass.tracker().state(), &tracker_before);
    }

    #[test]
    fn overflowing_correction_does_not_commit() {
        let mut compass = Compass::new(QueueSource::new(&[Ok(RawSample::new(i16::MAX, 0, 0))]));
        compass.set_calibration_scales(f32::MAX, 1.0, 1.0).unwrap();
        let before = compass.calibration();

        assert!(matches!(compass.read(), Err(Error::Compass(CompassError::NonFinite))));
        assert_eq!(compass.calibration(), before);
        assert_eq!(compass.raw(), RawSample::default());
    }

    #[test]
    fn auto_calibration_reports_new_extrema() {
        let samples = [
            Ok(RawSample::new(-100, -100, -100)),
            Ok(RawSample::new(100, 100, 100)),
            Ok(RawSample::new(100, 100, 100)),
            Ok(RawSample::new(50, 0, 0)),
        ];
        let mut compass = Compass::new(QueueSource::new(&samples));
        compass.set_auto_calibrate(true);

        assert!(compass.read().unwrap());
        assert!(compass.read().unwrap());
        assert!(!compass.read().unwrap());
        assert!(!compass.read().unwrap());
        assert_eq!(compass.calibration_offset(0), Ok(0.0));
        assert_eq!(compass.calibration_scale(2), Ok(1.0));
        assert_eq!(compass.calibrated(), ThreeAxes::new(50, 0, 0));
        assert!(compass.calibration_offset(3).is_err());
    }

    #[test]
    fn smoothing_feeds_axes() {
        let samples: Vec<_> = [10, 10, 10, 10, 30]
            .iter()
            .map(|&v| Ok(RawSample::new(v, 0, 0)))
            .collect();
        let mut compass = Compass::new(QueueSource::new(&samples));
        compass.set_smoothing(5, false).unwrap();
        for _ in 0..5 {
            compass.read().unwrap();
        }
        assert_eq!(compass.calibrated().x, 30);
        assert_eq!(compass.x(), 14);
        assert!(compass.smoothing().unwrap().is_steady());

        compass.disable_smoothing();
        assert_eq!(compass.x(), 30);
    }

    #[test]
    fn enabling_smoothing_shows_latest_sample() {
        let mut compass = Compass::new(QueueSource::new(&[Ok(RawSample::new(0, 40, 0))]));
        compass.read().unwrap();
        compass.set_smoothing(5, false).unwrap();
        assert_eq!(compass.axes(), ThreeAxes::new(0, 40, 0));
        assert_eq!(compass.direction(), "  E");
    }

    #[test]
    fn new_calibration_restarts_smoothing_history() {
        let samples: Vec<_> = (0..4).map(|_| Ok(RawSample::new(100, 0, 0))).collect();
        let mut compass = Compass::new(QueueSource::new(&samples));
        compass.set_smoothing(2, false).unwrap();
        compass.read().unwrap();
        compass.read().unwrap();
        assert_eq!(compass.x(), 100);

        compass.set_calibration_offsets(100.0, 0.0, 0.0).unwrap();
        assert_eq!(compass.x(), 100);
        assert!(!compass.smoothing().unwrap().is_steady());

        // stale 100s in the window would give 50 here
        compass.read().unwrap();
        assert_eq!(compass.x(), 0);
        compass.read().unwrap();
        assert_eq!(compass.x(), 0);
    }

    #[test]
    fn with_config_validates_smoothing() {
        let bad = CompassConfig {
            smoothing: Some(SmoothingConfig { steps: 2, advanced: true }),
            ..CompassConfig::default()
        };
        assert!(Compass::with_config(QueueSource::new(&[]), bad).is_err());

        let compass = Compass::with_config(QueueSource::new(&[]), CONFIG_AUTO_CALIBRATE).unwrap();
        assert!(compass.auto_calibrate());
        assert_eq!(compass.smoothing().map(|s| s.steps()), Some(5));
    }

    #[test]
    fn restored_calibration_is_applied() {
        let mut compass = Compass::new(QueueSource::new(&[Ok(RawSample::new(110, 20, 0))]));
        let saved = Calibration::new(ThreeAxes::new(10.0, 20.0, 0.0), ThreeAxes::new(0.5, 1.0, 1.0)).unwrap();
        compass.restore_calibration(saved).unwrap();
        compass.read().unwrap();
        assert_eq!(compass.calibrated(), ThreeAxes::new(50, 0, 0));

        compass.clear_calibration();
        assert_eq!(compass.calibration(), Calibration::IDENTITY);
    }

    #[test]
    fn cancelled_calibration_keeps_previous_values() {
        struct FixedClock;
        impl MonotonicClock for FixedClock {
            fn now_ms(&self) -> u64 {
                0
            }
        }

        let mut compass = Compass::new(QueueSource::new(&[Ok(RawSample::new(5, 5, 5))]));
        compass.set_calibration_offsets(1.0, 2.0, 3.0).unwrap();
        compass.set_declination(Declination::from_degrees(12.5).unwrap());
        let cancel = AtomicBool::new(true);

        let report = compass
            .calibrate_with_cancel(30, &FixedClock, &mut |_: f32, _: bool| {}, &cancel)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.samples, 1);
        assert_eq!(compass.calibration_offset(1), Ok(2.0));
        assert_eq!(compass.declination().degrees(), 12.5);
    }
}

//! Hard-iron / soft-iron calibration.
//!
//! Offsets centre each axis on the midpoint of its observed range; scales
//! stretch each axis so that all three ranges match their average half-range.

use log::{debug, warn};

use crate::core_data_types::{Axis, AxisFlags, RawSample, ThreeAxes};
use crate::error::CompassError;

/// Initial minimum. Larger than any 16-bit reading so the first sample replaces it.
pub const MIN_SENTINEL: i32 = 65_000;
/// Initial maximum.
pub const MAX_SENTINEL: i32 = -65_000;

/// Offset and scale correction factors. Callers persist these themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub offset: ThreeAxes<f32>,
    pub scale: ThreeAxes<f32>,
}

impl Calibration {
    pub const IDENTITY: Calibration = Calibration {
        offset: ThreeAxes::splat(0.0),
        scale: ThreeAxes::splat(1.0),
    };

    pub fn new(offset: ThreeAxes<f32>, scale: ThreeAxes<f32>) -> Result<Self, CompassError> {
        if !offset.is_finite() || !scale.is_finite() {
            return Err(CompassError::NonFinite);
        }
        Ok(Self { offset, scale })
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Result of deriving a calibration from per-axis extrema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedCalibration {
    pub calibration: Calibration,
    /// Axes whose range was empty; their scale was clamped to 1.0.
    pub degenerate: AxisFlags,
}

impl DerivedCalibration {
    pub fn is_degenerate(&self) -> bool {
        !self.degenerate.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    pub calibration: Calibration,
    pub min: ThreeAxes<i32>,
    pub max: ThreeAxes<i32>,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            calibration: Calibration::IDENTITY,
            min: ThreeAxes::splat(MIN_SENTINEL),
            max: ThreeAxes::splat(MAX_SENTINEL),
        }
    }
}

/// Derives offset and scale from observed extrema.
///
/// Offset is the midpoint `(min + max) / 2` on every axis. Scale is
/// `avg_delta / delta` with `delta = (max - min) / 2`. An axis with no
/// positive range gets scale 1.0 and is flagged in `degenerate`.
pub fn derive_from_min_max(min: ThreeAxes<i32>, max: ThreeAxes<i32>) -> DerivedCalibration {
    let offset = min.zip_with(max, |lo, hi| (lo as f32 + hi as f32) / 2.0);
    let delta = min.zip_with(max, |lo, hi| (hi as f32 - lo as f32) / 2.0);
    let avg_delta = (delta.x + delta.y + delta.z) / 3.0;

    let mut degenerate = AxisFlags::empty();
    let mut scale = ThreeAxes::splat(1.0f32);
    for axis in Axis::ALL {
        let d = delta.get(axis);
        if d > 0.0 && avg_delta > 0.0 {
            *scale.get_mut(axis) = avg_delta / d;
        } else {
            degenerate |= axis.flag();
        }
    }

    DerivedCalibration {
        calibration: Calibration { offset, scale },
        degenerate,
    }
}

/// `round((raw - offset) * scale)` per axis, halves rounded away from zero.
pub fn correct(raw: RawSample, calibration: &Calibration) -> Result<ThreeAxes<i32>, CompassError> {
    let corrected = raw
        .map(f32::from)
        .zip_with(calibration.offset, |r, o| r - o)
        .zip_with(calibration.scale, |v, s| v * s);
    if !corrected.is_finite() {
        return Err(CompassError::NonFinite);
    }
    let rounded = corrected.map(libm::roundf);
    // i32::MAX is not representable in f32; 2^31 is the first value past it
    let limit = -(i32::MIN as f32);
    if rounded.to_array().iter().any(|&v| v < -limit || v >= limit) {
        return Err(CompassError::OutOfRange);
    }
    Ok(rounded.map(|v| v as i32))
}

/// Owns the calibration state and keeps it in step with incoming samples.
#[derive(Debug, Clone, Default)]
pub struct CalibrationTracker {
    state: CalibrationState,
    degenerate: AxisFlags,
}

impl CalibrationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn calibration(&self) -> Calibration {
        self.state.calibration
    }

    pub fn min(&self) -> ThreeAxes<i32> {
        self.state.min
    }

    pub fn max(&self) -> ThreeAxes<i32> {
        self.state.max
    }

    /// Updates the extrema and, if any moved, re-derives the calibration.
    pub fn observe(&mut self, raw: RawSample) -> bool {
        let changed = self.track_extrema(raw);
        if changed {
            let derived = derive_from_min_max(self.state.min, self.state.max);
            if derived.degenerate != self.degenerate {
                if derived.is_degenerate() {
                    warn!("auto calibration: no range on axes {:?}", derived.degenerate);
                } else {
                    debug!("auto calibration: all axes have range");
                }
            }
            self.degenerate = derived.degenerate;
            self.state.calibration = derived.calibration;
        }
        changed
    }

    /// Updates the extrema only. Returns true iff any axis changed.
    pub fn track_extrema(&mut self, raw: RawSample) -> bool {
        let raw = raw.widen();
        let mut changed = false;
        for axis in Axis::ALL {
            let v = raw.get(axis);
            let min = self.state.min.get_mut(axis);
            if v < *min {
                *min = v;
                changed = true;
            }
            let max = self.state.max.get_mut(axis);
            if v > *max {
                *max = v;
                changed = true;
            }
        }
        changed
    }

    /// Starts a tracking pass at `raw`: min = max = raw.
    pub fn seed(&mut self, raw: RawSample) {
        self.state.min = raw.widen();
        self.state.max = raw.widen();
    }

    pub fn reset_extrema(&mut self) {
        self.state.min = ThreeAxes::splat(MIN_SENTINEL);
        self.state.max = ThreeAxes::splat(MAX_SENTINEL);
    }

    /// Offset back to zero, scale back to one. Extrema are kept.
    pub fn reset(&mut self) {
        self.state.calibration = Calibration::IDENTITY;
        self.degenerate = AxisFlags::empty();
    }

    /// Axes the last derived calibration could not scale.
    pub fn degenerate_axes(&self) -> AxisFlags {
        self.degenerate
    }

    pub fn set_offsets(&mut self, x: f32, y: f32, z: f32) -> Result<(), CompassError> {
        let calibration = Calibration::new(ThreeAxes::new(x, y, z), self.state.calibration.scale)?;
        self.state.calibration = calibration;
        Ok(())
    }

    pub fn set_scales(&mut self, x: f32, y: f32, z: f32) -> Result<(), CompassError> {
        let calibration = Calibration::new(self.state.calibration.offset, ThreeAxes::new(x, y, z))?;
        self.state.calibration = calibration;
        Ok(())
    }

    pub fn set_calibration(&mut self, calibration: Calibration) -> Result<(), CompassError> {
        self.state.calibration = Calibration::new(calibration.offset, calibration.scale)?;
        Ok(())
    }

    /// Derives and commits a calibration from explicit extrema.
    pub fn apply_min_max(
        &mut self,
        x_min: i32,
        x_max: i32,
        y_min: i32,
        y_max: i32,
        z_min: i32,
        z_max: i32,
    ) -> DerivedCalibration {
        let derived = derive_from_min_max(
            ThreeAxes::new(x_min, y_min, z_min),
            ThreeAxes::new(x_max, y_max, z_max),
        );
        self.commit(derived)
    }

    /// Derives and commits a calibration from the tracked extrema.
    pub fn apply_tracked(&mut self) -> DerivedCalibration {
        self.commit(derive_from_min_max(self.state.min, self.state.max))
    }

    fn commit(&mut self, derived: DerivedCalibration) -> DerivedCalibration {
        if derived.is_degenerate() {
            warn!(
                "calibration: no range on axes {:?}, scale clamped to 1.0",
                derived.degenerate
            );
        }
        self.state.calibration = derived.calibration;
        self.degenerate = derived.degenerate;
        debug!("calibration: {:?}", derived.calibration);
        derived
    }

    pub fn offset(&self, index: usize) -> Result<f32, CompassError> {
        self.state.calibration.offset.index(index)
    }

    pub fn scale(&self, index: usize) -> Result<f32, CompassError> {
        self.state.calibration.scale.index(index)
    }

    pub fn correct(&self, raw: RawSample) -> Result<ThreeAxes<i32>, CompassError> {
        correct(raw, &self.state.calibration)
    }
}

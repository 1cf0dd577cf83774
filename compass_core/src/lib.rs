//! Signal conditioning for 3-axis magnetometers used as a compass.
//!
//! Raw samples flow through hard/soft-iron calibration, an optional rolling
//! smoothing filter, and finally heading derivation (azimuth, declination,
//! 16-point bearing). The bus is abstracted behind [`RawSource`], so the same
//! pipeline runs on a real chip driver or a scripted test source.
#![cfg_attr(not(test), no_std)]

pub mod configs;
pub mod core_calibrate;
pub mod core_compass;
pub mod core_data_types;
pub mod core_filters;
pub mod core_heading;
pub mod core_session;
pub mod error;
pub mod simple_ring_buffer;
pub mod traits;

pub use configs::{CompassConfig, SmoothingConfig};
pub use core_calibrate::{
    correct, derive_from_min_max, Calibration, CalibrationState, CalibrationTracker,
    DerivedCalibration,
};
pub use core_compass::Compass;
pub use core_data_types::{Axis, AxisFlags, RawSample, ThreeAxes};
pub use core_filters::{SmoothingFilter, MAX_SMOOTHING_STEPS};
pub use core_heading::{azimuth, bearing_sector, direction_name, BearingSector, Declination, BEARINGS};
pub use core_session::{CalibrationSession, SessionReport, DEFAULT_SESSION_SECONDS};
pub use error::{CompassError, Error};
pub use traits::{MonotonicClock, ProgressSink, RawSource};

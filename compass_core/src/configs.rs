use crate::core_filters::SmoothingFilter;
use crate::core_heading::Declination;
use crate::error::CompassError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothingConfig {
    /// History depth, `1..=10`; larger values are clamped to 10.
    pub steps: u8,
    /// Drop one max and one min entry per axis before averaging. Needs `steps >= 3`.
    pub advanced: bool,
}

impl SmoothingConfig {
    pub const DEFAULT: SmoothingConfig = SmoothingConfig {
        steps: 5,
        advanced: false,
    };

    pub fn build(&self) -> Result<SmoothingFilter, CompassError> {
        SmoothingFilter::new(self.steps, self.advanced)
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Processing options for a [`crate::Compass`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompassConfig {
    /// Widen the tracked extrema and re-derive calibration on every read.
    pub auto_calibrate: bool,
    /// `None` disables smoothing.
    pub smoothing: Option<SmoothingConfig>,
    pub declination: Declination,
}

pub const CONFIG_PLAIN: CompassConfig = CompassConfig {
    auto_calibrate: false,
    smoothing: None,
    declination: Declination::ZERO,
};

pub const CONFIG_SMOOTHED: CompassConfig = CompassConfig {
    auto_calibrate: false,
    smoothing: Some(SmoothingConfig {
        steps: 10,
        advanced: true,
    }),
    declination: Declination::ZERO,
};

pub const CONFIG_AUTO_CALIBRATE: CompassConfig = CompassConfig {
    auto_calibrate: true,
    smoothing: Some(SmoothingConfig::DEFAULT),
    declination: Declination::ZERO,
};

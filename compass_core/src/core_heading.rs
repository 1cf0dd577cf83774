//! Azimuth, declination and 16-point bearings.

use core::f64::consts::PI;

use crate::error::CompassError;

/// Width of one bearing sector in degrees.
pub const SECTOR_WIDTH: f64 = 22.5;

/// 16-point compass rose, right-aligned to three characters.
pub static BEARINGS: [&str; 16] = [
    "  N", "NNE", " NE", "ENE", "  E", "ESE", " SE", "SSE",
    "  S", "SSW", " SW", "WSW", "  W", "WNW", " NW", "NNW",
];

/// Magnetic declination in decimal degrees, added to the sensor azimuth.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Declination {
    degrees: f32,
}

impl Declination {
    pub const ZERO: Declination = Declination { degrees: 0.0 };

    /// `degrees + minutes / 60`. The minutes are always added, whatever the
    /// sign of `degrees`, and are not limited to `0..60`.
    pub fn from_degrees_minutes(degrees: i16, minutes: u8) -> Self {
        Self {
            degrees: f32::from(degrees) + f32::from(minutes) / 60.0,
        }
    }

    pub fn from_degrees(degrees: f32) -> Result<Self, CompassError> {
        if !degrees.is_finite() {
            return Err(CompassError::InvalidConfiguration("declination must be finite"));
        }
        Ok(Self { degrees })
    }

    pub fn degrees(&self) -> f32 {
        self.degrees
    }
}

/// Folds any finite angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let mut d = libm::fmod(degrees, 360.0);
    if d < 0.0 {
        d += 360.0;
    }
    // -tiny + 360 rounds up to 360
    if d >= 360.0 {
        d -= 360.0;
    }
    d
}

/// Heading of the horizontal field vector plus declination, in `[0, 360)`.
pub fn azimuth(x: i32, y: i32, declination_degrees: f32) -> f32 {
    let heading = libm::atan2(f64::from(y), f64::from(x)) * 180.0 / PI;
    let heading = normalize_degrees(heading + f64::from(declination_degrees)) as f32;
    // f64 -> f32 can round 359.99999999 up to 360
    if heading >= 360.0 {
        0.0
    } else {
        heading
    }
}

/// Integral part of an azimuth, for display.
pub fn whole_degrees(azimuth: f32) -> u16 {
    libm::truncf(azimuth) as u16
}

/// Sector index `0..=15` for an azimuth in degrees.
///
/// `floor(azimuth / 22.5 + 0.5) mod 16`, so a boundary belongs to the sector
/// clockwise of it (11.25° is NNE). The one exception is the wraparound
/// boundary: 348.75° stays NNW.
pub fn bearing_sector(azimuth: f32) -> u8 {
    let sectors = BEARINGS.len() as f64;
    let scaled = normalize_degrees(f64::from(azimuth)) / SECTOR_WIDTH + 0.5;
    if scaled == sectors {
        return (sectors as u8) - 1;
    }
    (libm::floor(scaled) as u32 % BEARINGS.len() as u32) as u8
}

pub fn direction_name(sector: u8) -> Result<&'static str, CompassError> {
    BEARINGS
        .get(usize::from(sector))
        .copied()
        .ok_or(CompassError::InvalidArgument("bearing sector must be 0..=15"))
}

/// One of the 16 compass rose sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BearingSector(u8);

impl BearingSector {
    pub fn new(index: u8) -> Result<Self, CompassError> {
        direction_name(index).map(|_| Self(index))
    }

    pub fn from_azimuth(azimuth: f32) -> Self {
        Self(bearing_sector(azimuth))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        BEARINGS[usize::from(self.0)]
    }

    /// Centre of the sector in degrees.
    pub fn center_degrees(self) -> f32 {
        (f64::from(self.0) * SECTOR_WIDTH) as f32
    }
}

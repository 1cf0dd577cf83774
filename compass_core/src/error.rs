use core::fmt;

/// Failures of the numeric core. None of them leave calibration or smoothing
/// state modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassError {
    /// Rejected at configuration time (smoothing depth, declination).
    InvalidConfiguration(&'static str),
    /// Out-of-range axis or sector index.
    InvalidArgument(&'static str),
    /// A calibration parameter or corrected value was NaN or infinite.
    NonFinite,
    /// A corrected value does not fit in an `i32`.
    OutOfRange,
}

impl fmt::Display for CompassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompassError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            CompassError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            CompassError::NonFinite => f.write_str("non-finite calibration value"),
            CompassError::OutOfRange => f.write_str("corrected value out of i32 range"),
        }
    }
}

/// Error of an operation that also talks to the sample source.
#[derive(Debug)]
pub enum Error<E> {
    Io(E),
    Compass(CompassError),
}

impl<E> From<CompassError> for Error<E> {
    fn from(e: CompassError) -> Self {
        Error::Compass(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "sample read failed: {:?}", e),
            Error::Compass(e) => fmt::Display::fmt(e, f),
        }
    }
}

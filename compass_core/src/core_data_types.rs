use bitflags::bitflags;

use crate::error::CompassError;

/// One value per sensor axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThreeAxes<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

/// Three signed 16-bit readings, as produced by one bus transaction.
pub type RawSample = ThreeAxes<i16>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn flag(self) -> AxisFlags {
        match self {
            Axis::X => AxisFlags::X,
            Axis::Y => AxisFlags::Y,
            Axis::Z => AxisFlags::Z,
        }
    }
}

impl TryFrom<usize> for Axis {
    type Error = CompassError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Axis::X),
            1 => Ok(Axis::Y),
            2 => Ok(Axis::Z),
            _ => Err(CompassError::InvalidArgument("axis index must be 0, 1 or 2")),
        }
    }
}

bitflags! {
    /// Set of axes, used to report which axes a calibration could not scale.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct AxisFlags: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
    }
}

impl<T: Copy> ThreeAxes<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: T) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn from_array(v: [T; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn to_array(self) -> [T; 3] {
        [self.x, self.y, self.z]
    }

    pub fn get(&self, axis: Axis) -> T {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Checked positional access, `index` in `0..3`.
    pub fn index(&self, index: usize) -> Result<T, CompassError> {
        Axis::try_from(index).map(|axis| self.get(axis))
    }

    pub fn map<U: Copy>(self, mut f: impl FnMut(T) -> U) -> ThreeAxes<U> {
        ThreeAxes::new(f(self.x), f(self.y), f(self.z))
    }

    pub fn zip_with<U: Copy, V: Copy>(
        self,
        other: ThreeAxes<U>,
        mut f: impl FnMut(T, U) -> V,
    ) -> ThreeAxes<V> {
        ThreeAxes::new(f(self.x, other.x), f(self.y, other.y), f(self.z, other.z))
    }
}

impl ThreeAxes<f32> {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl RawSample {
    /// Decodes X, Y, Z from six little-endian bytes.
    pub fn from_le_bytes(buf: [u8; 6]) -> Self {
        Self::new(
            i16::from_le_bytes([buf[0], buf[1]]),
            i16::from_le_bytes([buf[2], buf[3]]),
            i16::from_le_bytes([buf[4], buf[5]]),
        )
    }

    pub fn widen(self) -> ThreeAxes<i32> {
        self.map(i32::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_axes() {
        let raw = RawSample::from_le_bytes([0x64, 0x00, 0x00, 0x80, 0xFF, 0x7F]);
        assert_eq!(raw, RawSample::new(100, i16::MIN, i16::MAX));
    }

    #[test]
    fn checked_index_rejects_out_of_range() {
        let v = ThreeAxes::new(1.0f32, 2.0, 3.0);
        assert_eq!(v.index(2), Ok(3.0));
        assert!(matches!(v.index(3), Err(CompassError::InvalidArgument(_))));
    }

    #[test]
    fn axis_flags_follow_axis_order() {
        let flags = Axis::ALL
            .iter()
            .fold(AxisFlags::empty(), |acc, axis| acc | axis.flag());
        assert_eq!(flags, AxisFlags::all());
    }
}

use bitflags::bitflags;

macro_rules! registers {
    (
        $enum_name:ident {
            $($name:ident = $val:expr),* $(,)?
        }
    ) => {
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum $enum_name {
            $($name = $val),*
        }

        impl $enum_name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($enum_name::$name => stringify!($name),)*
                }
            }
        }

        impl Register for $enum_name {
            fn addr(self) -> u8 {
                self as u8
            }
        }

        impl NamedRegister for $enum_name {
            fn name(&self) -> &'static str {
                self.name()
            }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegOp {
    Read,
    Write
}

pub trait NamedRegister: Register {
    fn name(&self) -> &'static str;
}

pub trait Register: Copy {
    fn addr(self) -> u8;
}

pub struct RegConfig<R: Register> {
    pub op: RegOp,
    pub reg: R,
    pub value: u8,
}

registers! {
    QmcReg {
        DataXLsb = 0x00,
        DataXMsb = 0x01,
        DataYLsb = 0x02,
        DataYMsb = 0x03,
        DataZLsb = 0x04,
        DataZMsb = 0x05,
        Status = 0x06,
        TempLsb = 0x07,
        TempMsb = 0x08,
        Control1 = 0x09,
        Control2 = 0x0A,
        SetResetPeriod = 0x0B,
        ChipId = 0x0D,
    }
}

/// Fixed content of the chip id register.
pub const QMC_CHIP_ID: u8 = 0xFF;

/// Recommended SET/RESET period value.
pub const QMC_SET_RESET_PERIOD: u8 = 0x01;

/* STATUS
 * B7   B6   B5   B4   B3   B2   B1   B0
 * 0    0    0    0    0    DOR  OVL  DRDY
*/
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const DOR  = 1 << 2;
        const OVL  = 1 << 1;
        const DRDY = 1 << 0;
    }
}

/* CONTROL1
 * B7   B6   B5   B4   B3   B2   B1   B0
 * OSR1 OSR0 RNG1 RNG0 ODR1 ODR0 MODE1 MODE0
*/
pub const QMC_MODE_LOC: u8 = 0;
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QmcMode {
    Standby     = 0,
    Continuous  = 1,
}

pub const QMC_ODR_LOC: u8 = 2;
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QmcOdr {
    Hz10    = 0,
    Hz50    = 1,
    Hz100   = 2,
    Hz200   = 3,
}

pub const QMC_RNG_LOC: u8 = 4;
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QmcRange {
    G2  = 0,
    G8  = 1,
}

pub const QMC_OSR_LOC: u8 = 6;
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QmcOsr {
    Osr512  = 0,
    Osr256  = 1,
    Osr128  = 2,
    Osr64   = 3,
}

/* CONTROL2
 * B7   B6   B5   B4   B3   B2   B1   B0
 * SOFT ROL  0    0    0    0    0    INT
 * RST  PNT                          ENB
*/
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control2Flags: u8 {
        const SOFT_RST = 1 << 7;
        const ROL_PNT  = 1 << 6;
        const INT_ENB  = 1 << 0;
    }
}

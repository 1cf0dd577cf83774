use crate::registers::*;

/// Field values for CONTROL1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModeConfig {
    pub mode: QmcMode,
    pub odr: QmcOdr,
    pub range: QmcRange,
    pub osr: QmcOsr,
}

impl ModeConfig {
    pub const fn bits(&self) -> u8 {
        (self.mode as u8) << QMC_MODE_LOC
            | (self.odr as u8) << QMC_ODR_LOC
            | (self.range as u8) << QMC_RNG_LOC
            | (self.osr as u8) << QMC_OSR_LOC
    }
}

pub const MODE_CONTINUOUS_200HZ_8G: ModeConfig = ModeConfig {
    mode: QmcMode::Continuous,
    odr: QmcOdr::Hz200,
    range: QmcRange::G8,
    osr: QmcOsr::Osr512,
};

pub const CONFIG_WAKEUP_QMC5883L: &[RegConfig<QmcReg>] = &[
    RegConfig {
        reg: QmcReg::SetResetPeriod,
        value: QMC_SET_RESET_PERIOD,
        op: RegOp::Write,
    },
    RegConfig {
        reg: QmcReg::Control1,
        value: MODE_CONTINUOUS_200HZ_8G.bits(), // 0x1D
        op: RegOp::Write,
    },
    RegConfig {
        reg: QmcReg::Control1,
        value: 0x00,
        op: RegOp::Read,
    },
];

pub const CONFIG_RESET: &[RegConfig<QmcReg>] = &[
    RegConfig {
        op: RegOp::Write,
        reg: QmcReg::Control2,
        value: Control2Flags::SOFT_RST.bits(),
    },
];

pub const CONFIG_STANDBY: &[RegConfig<QmcReg>] = &[
    RegConfig {
        op: RegOp::Write,
        reg: QmcReg::Control1,
        value: QmcMode::Standby as u8,
    },
];

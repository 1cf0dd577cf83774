#![no_std]

pub mod registers;
pub mod configs;

use embedded_hal::i2c::I2c;
use log::{debug, trace};

use compass_core::{Compass, RawSample, RawSource};
use registers::*;

pub use configs::*;

/// Trait alias to support both I2c<SevenBitAddress> and I2c without address mode.
pub trait CompatibleI2c<E>: I2c<Error = E> {}
impl<T, E> CompatibleI2c<E> for T where T: I2c<Error = E> {}

pub const DEFAULT_ADDRESS: u8 = 0x0D;

/// A QMC5883L behind the full calibration / smoothing / heading pipeline.
pub type Qmc5883lCompass<I2C, E> = Compass<Qmc5883l<I2C, E>>;

pub struct Qmc5883l<I2C, E> {
    i2c: I2C,
    address: u8,
    _error: core::marker::PhantomData<E>,
}

impl<I2C, E> Qmc5883l<I2C, E> {
    pub fn i2c(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    I2c(E),
    /// Chip id register did not read 0xFF.
    InvalidDevice(u8),
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "i2c error: {:?}", e),
            Error::InvalidDevice(id) => write!(f, "unexpected chip id {:#04x}", id),
        }
    }
}

impl<I2C, E> Qmc5883l<I2C, E>
where
    I2C: CompatibleI2c<E>,
    E: core::fmt::Debug,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            _error: core::marker::PhantomData,
        }
    }

    pub fn default(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_ADDRESS)
    }

    pub fn destroy(self) -> I2C {
        self.i2c
    }

    pub fn chip_id(&mut self) -> Result<u8, Error<E>> {
        self.read_reg(QmcReg::ChipId as u8)
    }

    pub fn verify(&mut self) -> Result<(), Error<E>> {
        match self.chip_id()? {
            QMC_CHIP_ID => Ok(()),
            other => Err(Error::InvalidDevice(other)),
        }
    }

    /// SET/RESET period, then continuous mode at 200 Hz, 8 G, OSR 512.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.apply_config(CONFIG_WAKEUP_QMC5883L)
    }

    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.apply_config(CONFIG_RESET)
    }

    pub fn standby(&mut self) -> Result<(), Error<E>> {
        self.apply_config(CONFIG_STANDBY)
    }

    pub fn set_mode(&mut self, config: ModeConfig) -> Result<(), Error<E>> {
        debug!("set_mode {:?} = {:#04x}", config, config.bits());
        self.write_reg(QmcReg::Control1 as u8, config.bits())
    }

    pub fn status(&mut self) -> Result<StatusFlags, Error<E>> {
        let bits = self.read_reg(QmcReg::Status as u8)?;
        Ok(StatusFlags::from_bits_truncate(bits))
    }

    /// One X/Y/Z sample from the data registers.
    pub fn read_raw(&mut self) -> Result<RawSample, Error<E>> {
        let mut buf = [0u8; 6];
        self.read_bytes(QmcReg::DataXLsb as u8, &mut buf)?;
        let raw = RawSample::from_le_bytes(buf);
        trace!("read_raw {:?}", raw);
        Ok(raw)
    }

    pub fn read_reg(&mut self, reg: u8) -> Result<u8, Error<E>> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    pub fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.address, &[reg, val])
            .map_err(Error::I2c)?;
        Ok(())
    }

    pub fn read_bytes(&mut self, start_reg: u8, buffer: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c
            .write_read(self.address, &[start_reg], buffer)
            .map_err(Error::I2c)
    }

    /// Accepts any register type that implements the `Register` trait
    pub fn apply_config<R>(&mut self, config: &[RegConfig<R>]) -> Result<(), Error<E>>
    where
        R: Register + NamedRegister + Copy,
    {
        for entry in config {
            let addr = entry.reg.addr();
            match entry.op {
                RegOp::Write => {
                    debug!("write_reg {:<15}({:#04X}) = {:#04x}", entry.reg.name(), addr, entry.value);
                    self.write_reg(addr, entry.value)?
                },
                RegOp::Read => {
                    let data = self.read_reg(addr)?;
                    debug!("read_reg {:<15}({:#04X}) = {:#04x}", entry.reg.name(), addr, data);
                }
            }
        }
        Ok(())
    }
}

impl<I2C, E> RawSource for Qmc5883l<I2C, E>
where
    I2C: CompatibleI2c<E>,
    E: core::fmt::Debug,
{
    type Error = Error<E>;

    fn read_raw(&mut self) -> Result<RawSample, Self::Error> {
        Qmc5883l::read_raw(self)
    }
}

/// Initializes the chip at the default address and wraps it in a [`Compass`].
pub fn new_compass<I2C, E>(i2c: I2C) -> Result<Qmc5883lCompass<I2C, E>, Error<E>>
where
    I2C: CompatibleI2c<E>,
    E: core::fmt::Debug,
{
    let mut chip = Qmc5883l::default(i2c);
    chip.init()?;
    Ok(Compass::new(chip))
}

#![cfg_attr(not(test), no_std)]

//! Blocking driver for the MFRC522 contactless reader chip, built on the
//! [`embedded-hal`] 1.0 traits. On top of the chip's command layer it can
//! store a short text payload on an NTAG-family tag and read it back; see
//! the [`ntag`] module for the payload operations.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/1.0.0

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Mode, SpiBus, MODE_0};
use heapless::Vec;

use crate::consts::{PcdCommand, PcdError, PcdRegister, PiccCommand, MAX_LEN};

pub mod consts;
pub mod ntag;


/// SPI mode the chip speaks (clock idle low, capture on first edge).
pub const SPI_MODE: Mode = MODE_0;

/// Reference SPI clock the poll ceilings below were tuned against.
///
/// The polls count bus transactions rather than wall-clock time, so a much
/// faster or slower bus shifts the effective timeouts with it.
pub const SPI_CLOCK_HZ: u32 = 1_000_000;

const CRC_POLL_TRIES: usize = 255;
const TRANSCEIVE_POLL_TRIES: usize = 2000;

/// Bytes drained from the chip's FIFO after a transceive cycle.
pub type Response = Vec<u8, MAX_LEN>;

/// MFRC522 driver owning the SPI bus and the chip-select pin.
pub struct Mfrc522<S, C>
where
    S: SpiBus,
    C: OutputPin,
{
    spi: S,
    cs: C,
}

impl<S, C> Mfrc522<S, C>
where
    S: SpiBus,
    C: OutputPin,
{
    pub fn new(spi: S, cs: C) -> Self {
        Self { spi, cs }
    }

    /// Soft-resets the chip, programs the timer and modulation registers
    /// and switches the antenna drivers on.
    ///
    /// The bus itself must already be configured for [`SPI_MODE`]; the
    /// chip-select line is raised to its idle level here.
    pub fn init(&mut self) -> Result<(), PcdError> {
        self.cs.set_high().map_err(|_| PcdError::Bus)?;

        self.write_reg(PcdRegister::COMMAND_REG, PcdCommand::SOFT_RESET)?;

        self.write_reg(PcdRegister::T_MODE_REG, 0x8D)?;
        self.write_reg(PcdRegister::T_PRESCALER_REG, 0x3E)?;
        self.write_reg(PcdRegister::T_RELOAD_REG_L, 30)?;
        self.write_reg(PcdRegister::T_COUNTER_VAL_REG_H, 0)?;

        self.write_reg(PcdRegister::TX_ASK_REG, 0x40)?;
        self.write_reg(PcdRegister::MODE_REG, 0x3D)?;

        self.antenna_on()?;

        log::debug!("MFRC522 version {:#04x}", self.version()?);
        Ok(())
    }

    pub fn antenna_on(&mut self) -> Result<(), PcdError> {
        self.set_bit_mask(PcdRegister::TX_CONTROL_REG, 0x03)
    }

    pub fn antenna_off(&mut self) -> Result<(), PcdError> {
        self.clear_bit_mask(PcdRegister::TX_CONTROL_REG, 0x03)
    }

    pub fn version(&mut self) -> Result<u8, PcdError> {
        self.read_reg(PcdRegister::VERSION_REG)
    }

    /// Checks whether a tag answers a REQA with the expected 2-byte ATQA.
    ///
    /// This only confirms that *some* tag is in range; it performs no
    /// anticollision or selection.
    pub fn detect_card(&mut self) -> Result<bool, PcdError> {
        // REQA is a short frame, 7 bits in its only byte.
        self.write_reg(PcdRegister::BIT_FRAMING_REG, 0x07)?;

        match self.transceive(PcdCommand::TRANSCEIVE, &[PiccCommand::REQA]) {
            Ok(atqa) => Ok(atqa.len() == 2),
            Err(PcdError::Chip) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Runs `cmd` over `send_data` through the chip's command/poll/drain
    /// cycle and returns the FIFO contents the chip answered with.
    ///
    /// The outcome is decided by the error register alone; an exhausted
    /// poll with clean error flags still counts as success (typically with
    /// an empty response).
    pub fn transceive(&mut self, cmd: u8, send_data: &[u8]) -> Result<Response, PcdError> {
        self.write_reg(PcdRegister::COMMAND_REG, PcdCommand::IDLE)?;
        self.set_bit_mask(PcdRegister::FIFO_LEVEL_REG, 0x80)?;
        self.clear_bit_mask(PcdRegister::COM_IRQ_REG, 0x80)?;
        self.write_reg(PcdRegister::COM_IEN_REG, 0x77)?;

        for &byte in send_data {
            self.write_reg(PcdRegister::FIFO_DATA_REG, byte)?;
        }

        self.write_reg(PcdRegister::COMMAND_REG, cmd)?;
        if cmd == PcdCommand::TRANSCEIVE {
            self.set_bit_mask(PcdRegister::BIT_FRAMING_REG, 0x80)?;
        }

        for _ in 0..TRANSCEIVE_POLL_TRIES {
            let n = self.read_reg(PcdRegister::COM_IRQ_REG)?;
            if n & 0x30 != 0 {
                break;
            }
        }

        self.clear_bit_mask(PcdRegister::BIT_FRAMING_REG, 0x80)?;

        let error = self.read_reg(PcdRegister::ERROR_REG)?;
        if error & 0x1B != 0 {
            return Err(PcdError::Chip);
        }

        // Drain to the chip-reported level; anything past MAX_LEN is dropped.
        let mut back_data = Response::new();
        if cmd == PcdCommand::TRANSCEIVE {
            let n = self.read_reg(PcdRegister::FIFO_LEVEL_REG)?;
            for _ in 0..n {
                let byte = self.read_reg(PcdRegister::FIFO_DATA_REG)?;
                let _ = back_data.push(byte);
            }
        }

        Ok(back_data)
    }

    /// Feeds `data` through the chip's CRC coprocessor and returns the
    /// result as `[low, high]`.
    pub fn calculate_crc(&mut self, data: &[u8]) -> Result<[u8; 2], PcdError> {
        self.write_reg(PcdRegister::COMMAND_REG, PcdCommand::IDLE)?;
        self.clear_bit_mask(PcdRegister::DIV_IEN_REG, 0x04)?;
        self.set_bit_mask(PcdRegister::FIFO_LEVEL_REG, 0x80)?;

        for &byte in data {
            self.write_reg(PcdRegister::FIFO_DATA_REG, byte)?;
        }

        self.write_reg(PcdRegister::COMMAND_REG, PcdCommand::CALC_CRC)?;

        for _ in 0..CRC_POLL_TRIES {
            let n = self.read_reg(PcdRegister::DIV_IEN_REG)?;
            if n & 0x04 != 0 {
                break;
            }
        }

        // The result registers are read whether or not the poll observed
        // completion.
        Ok([
            self.read_reg(PcdRegister::CRC_RESULT_REG_L)?,
            self.read_reg(PcdRegister::CRC_RESULT_REG_H)?,
        ])
    }

    pub fn set_bit_mask(&mut self, reg: u8, mask: u8) -> Result<(), PcdError> {
        let tmp = self.read_reg(reg)?;
        self.write_reg(reg, tmp | mask)
    }

    pub fn clear_bit_mask(&mut self, reg: u8, mask: u8) -> Result<(), PcdError> {
        let tmp = self.read_reg(reg)?;
        self.write_reg(reg, tmp & !mask)
    }

    pub fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), PcdError> {
        let mut read_buff = [0u8; 1];
        self.with_cs_low(|spi| {
            spi.transfer(&mut read_buff, &[(reg << 1) & 0x7E])?;
            spi.transfer(&mut read_buff, &[val])
        })
    }

    pub fn read_reg(&mut self, reg: u8) -> Result<u8, PcdError> {
        let mut read_buff = [0u8; 1];
        self.with_cs_low(|spi| {
            spi.transfer(&mut read_buff, &[((reg << 1) & 0x7E) | 0x80])?;
            spi.transfer(&mut read_buff, &[0x00])
        })?;

        Ok(read_buff[0])
    }

    // Chip-select is released even when the transfer inside fails, so the
    // bus is never left asserted.
    fn with_cs_low<T>(
        &mut self,
        f: impl FnOnce(&mut S) -> Result<T, S::Error>,
    ) -> Result<T, PcdError> {
        self.cs.set_low().map_err(|_| PcdError::Bus)?;
        let res = f(&mut self.spi).map_err(|_| PcdError::Bus);
        let released = self.cs.set_high().map_err(|_| PcdError::Bus);

        let val = res?;
        released?;
        Ok(val)
    }
}

//! Register map, command bytes and error codes of the MFRC522.

/// Largest frame kept from the chip's FIFO after a transceive cycle.
pub const MAX_LEN: usize = 16;

/// Register addresses (datasheet section 9.2).
pub struct PcdRegister;

impl PcdRegister {
    pub const COMMAND_REG: u8 = 0x01;
    pub const COM_IEN_REG: u8 = 0x02;
    pub const DIV_IEN_REG: u8 = 0x03;
    pub const COM_IRQ_REG: u8 = 0x04;
    pub const ERROR_REG: u8 = 0x06;
    pub const FIFO_DATA_REG: u8 = 0x09;
    pub const FIFO_LEVEL_REG: u8 = 0x0A;
    pub const BIT_FRAMING_REG: u8 = 0x0D;
    pub const MODE_REG: u8 = 0x11;
    pub const TX_CONTROL_REG: u8 = 0x14;
    pub const TX_ASK_REG: u8 = 0x15;
    pub const CRC_RESULT_REG_H: u8 = 0x21;
    pub const CRC_RESULT_REG_L: u8 = 0x22;
    pub const T_MODE_REG: u8 = 0x2A;
    pub const T_PRESCALER_REG: u8 = 0x2B;
    pub const T_RELOAD_REG_L: u8 = 0x2D;
    pub const T_COUNTER_VAL_REG_H: u8 = 0x2E;
    pub const VERSION_REG: u8 = 0x37;
}

/// Command set of the chip's command register.
pub struct PcdCommand;

impl PcdCommand {
    pub const IDLE: u8 = 0x00;
    pub const CALC_CRC: u8 = 0x03;
    pub const TRANSCEIVE: u8 = 0x0C;
    pub const SOFT_RESET: u8 = 0x0F;
}

/// Card command bytes understood by NTAG-family tags.
pub struct PiccCommand;

impl PiccCommand {
    pub const REQA: u8 = 0x26;
    pub const READ: u8 = 0x30;
    pub const WRITE: u8 = 0xA2;
}

/// Failure codes surfaced by the register and protocol layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdError {
    /// SPI transfer or chip-select toggle failed.
    Bus,
    /// The chip's error register flagged the last command (collision,
    /// parity, CRC, protocol or buffer-overflow bits).
    Chip,
    /// A page read delivered fewer bytes than the tag's block-read format
    /// returns.
    ShortFrame,
}

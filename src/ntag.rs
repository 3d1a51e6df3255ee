//! Text payload storage on the tag's user pages.
//!
//! The payload occupies pages 4-6. Each page frame carries the first 4
//! bytes of that page's 16-byte window of the padded payload, so of the
//! 48-byte buffer only bytes 0-3, 16-19 and 32-35 ever reach the tag; a
//! read back returns exactly those 12 characters.

use core::ops::Range;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use heapless::{String, Vec};

use crate::consts::{PcdCommand, PcdError, PiccCommand};
use crate::Mfrc522;

/// Capacity of the padded payload buffer in bytes.
pub const TEXT_LEN: usize = 48;

/// User pages carrying the payload.
pub const USER_PAGES: Range<u8> = 4..7;

impl<S, C> Mfrc522<S, C>
where
    S: SpiBus,
    C: OutputPin,
{
    /// Writes `text` to the tag's user pages.
    ///
    /// The payload is space-padded, or silently truncated, to exactly
    /// [`TEXT_LEN`] bytes before partitioning; see the module docs for
    /// which of those bytes are actually transmitted.
    ///
    /// Returns `false` when no tag answers or a page transfer fails.
    /// Pages written before a failure stay written.
    pub fn write_text(&mut self, text: &str) -> bool {
        if !matches!(self.detect_card(), Ok(true)) {
            return false;
        }

        let mut data = [b' '; TEXT_LEN];
        for (slot, byte) in data.iter_mut().zip(text.bytes()) {
            *slot = byte;
        }

        for page in USER_PAGES {
            let start = (page - USER_PAGES.start) as usize * 16;
            let window = &data[start..start + 16];

            // Only the first 4 bytes of the window go out with this page.
            if let Err(err) = self.write_page(page, &window[..4]) {
                log::debug!("write to page {page} failed: {err:?}");
                return false;
            }
        }

        true
    }

    /// Reads the stored payload back from the tag's user pages.
    ///
    /// Returns the empty string when no tag answers or any page fails to
    /// deliver a full block; pages decoded before a failure are discarded.
    pub fn read_text(&mut self) -> String<TEXT_LEN> {
        let mut text = String::new();
        if !matches!(self.detect_card(), Ok(true)) {
            return text;
        }

        for page in USER_PAGES {
            match self.read_page(page) {
                Ok(chunk) => {
                    for byte in chunk {
                        let _ = text.push(byte as char);
                    }
                }
                Err(err) => {
                    log::debug!("read of page {page} failed: {err:?}");
                    return String::new();
                }
            }
        }

        text
    }

    fn write_page(&mut self, page: u8, chunk: &[u8]) -> Result<(), PcdError> {
        let mut frame: Vec<u8, 8> = Vec::new();
        let _ = frame.push(PiccCommand::WRITE);
        let _ = frame.push(page);
        let _ = frame.extend_from_slice(chunk);

        let crc = self.calculate_crc(&frame)?;
        let _ = frame.extend_from_slice(&crc);

        self.transceive(PcdCommand::TRANSCEIVE, &frame)?;
        Ok(())
    }

    fn read_page(&mut self, page: u8) -> Result<[u8; 4], PcdError> {
        let mut frame: Vec<u8, 4> = Vec::new();
        let _ = frame.push(PiccCommand::READ);
        let _ = frame.push(page);

        let crc = self.calculate_crc(&frame)?;
        let _ = frame.extend_from_slice(&crc);

        let back = self.transceive(PcdCommand::TRANSCEIVE, &frame)?;

        // The tag answers a page read with a full 16-byte block of which
        // only the first 4 bytes belong to the addressed page.
        if back.len() < 16 {
            return Err(PcdError::ShortFrame);
        }

        Ok([back[0], back[1], back[2], back[3]])
    }
}

//! Minimal async SSD1306 driver for a 128x32 panel over I2C.
//!
//! Only what the readout needs: the power-on init sequence and a full-frame
//! flush of a [`MonoFramebuffer`]. Horizontal addressing mode is set during
//! `init()`, so a flush is one window command followed by the page-layout
//! bytes in order.
//!
//! Every I2C write starts with a control byte: `0x00` for a command stream,
//! `0x40` for display data.

use embedded_hal_async::i2c::I2c;

use crate::config::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use crate::framebuffer::MonoFramebuffer;

/// Default 7-bit I2C address (SA0 low).
pub const DEFAULT_ADDRESS: u8 = 0x3C;

// Control bytes
const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;

// Commands
const DISPLAY_OFF: u8 = 0xAE;
const DISPLAY_ON: u8 = 0xAF;
const SET_CLOCK_DIV: u8 = 0xD5;
const SET_MULTIPLEX: u8 = 0xA8;
const SET_DISPLAY_OFFSET: u8 = 0xD3;
const SET_START_LINE: u8 = 0x40;
const CHARGE_PUMP: u8 = 0x8D;
const MEMORY_MODE: u8 = 0x20;
const SEG_REMAP: u8 = 0xA1;
const COM_SCAN_DEC: u8 = 0xC8;
const SET_COM_PINS: u8 = 0xDA;
const SET_CONTRAST: u8 = 0x81;
const SET_PRECHARGE: u8 = 0xD9;
const SET_VCOM_DETECT: u8 = 0xDB;
const RESUME_FROM_RAM: u8 = 0xA4;
const NORMAL_DISPLAY: u8 = 0xA6;
const COLUMN_ADDR: u8 = 0x21;
const PAGE_ADDR: u8 = 0x22;

const LAST_COLUMN: u8 = (DISPLAY_WIDTH_PX - 1) as u8;
const LAST_PAGE: u8 = (DISPLAY_HEIGHT_PX / 8 - 1) as u8;

/// Display data bytes per I2C write.
const DATA_CHUNK: usize = 16;

/// Power-on configuration for a 128x32 module with internal charge pump.
const INIT_SEQUENCE: &[u8] = &[
    DISPLAY_OFF,
    SET_CLOCK_DIV,
    0x80,
    SET_MULTIPLEX,
    (DISPLAY_HEIGHT_PX - 1) as u8,
    SET_DISPLAY_OFFSET,
    0x00,
    SET_START_LINE,
    CHARGE_PUMP,
    0x14,
    MEMORY_MODE,
    0x00, // horizontal addressing
    SEG_REMAP,
    COM_SCAN_DEC,
    SET_COM_PINS,
    0x02, // sequential COM, required for 32 rows
    SET_CONTRAST,
    0x8F,
    SET_PRECHARGE,
    0xF1,
    SET_VCOM_DETECT,
    0x40,
    RESUME_FROM_RAM,
    NORMAL_DISPLAY,
    DISPLAY_ON,
];

/// SSD1306 over an async I2C bus.
pub struct Ssd1306<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Ssd1306<I> {
    /// Create a driver for the panel at `address`.
    pub fn new(
        i2c: I,
        address: u8,
    ) -> Self {
        Self { i2c, address }
    }

    /// Send the power-on configuration and switch the panel on.
    pub async fn init(&mut self) -> Result<(), I::Error> { self.write_commands(INIT_SEQUENCE).await }

    /// Send a full frame.
    pub async fn flush(
        &mut self,
        frame: &MonoFramebuffer,
    ) -> Result<(), I::Error> {
        self.write_commands(&[COLUMN_ADDR, 0, LAST_COLUMN, PAGE_ADDR, 0, LAST_PAGE])
            .await?;

        let mut packet = [0u8; DATA_CHUNK + 1];
        packet[0] = CONTROL_DATA;
        for chunk in frame.as_bytes().chunks(DATA_CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c.write(self.address, &packet[..=chunk.len()]).await?;
        }
        Ok(())
    }

    /// Give the bus back.
    pub fn release(self) -> I { self.i2c }

    async fn write_commands(
        &mut self,
        commands: &[u8],
    ) -> Result<(), I::Error> {
        // Longest command stream is the init sequence
        let mut packet = [0u8; INIT_SEQUENCE.len() + 1];
        packet[0] = CONTROL_COMMAND;
        packet[1..=commands.len()].copy_from_slice(commands);
        self.i2c.write(self.address, &packet[..=commands.len()]).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

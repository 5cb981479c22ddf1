//! Character LCD controller command definitions
//!
//! This module defines the instruction bytes understood by HD44780-compatible
//! character LCD controllers. Instructions are sent with the register-select
//! line low; character data is sent with it high.
//!
//! ## Transfer Structure
//!
//! Every byte travels in its own frame:
//! 1. Assert CS (active high on this board)
//! 2. Drive RS low (command) or high (data)
//! 3. Shift the byte out
//! 4. Wait for the controller to latch it
//! 5. Release CS
//!
//! ## Example
//!
//! ```
//! use charlcd_spi::command::{self, BusWidth, DisplayControl, FontSize, FunctionSet, Lines};
//!
//! let function = FunctionSet {
//!     bus: BusWidth::EightBit,
//!     lines: Lines::Two,
//!     font: FontSize::Small,
//! };
//! assert_eq!(function.bits(), command::FUNCTION_8B_2L_FSML);
//! assert_eq!(DisplayControl::default().bits(), command::DISPLAY_DON_COFF_BOFF);
//! assert_eq!(command::set_ddram_address(0x40), command::RETURN_LINE2);
//! ```

// Basic instructions

/// Clear display command (0x01)
///
/// Writes spaces to every DDRAM cell and returns the cursor to address 0.
/// One of the slow instructions; the long settle interval covers it.
pub const CLEAR_DISPLAY: u8 = 0b0000_0001;

/// Return home command (0x02)
///
/// Moves the cursor to address 0 and undoes any display shift.
pub const RETURN_HOME: u8 = 0b0000_0010;

/// Jump to the start of line 2 (0xC0)
///
/// Equivalent to setting the DDRAM address to 0x40.
pub const RETURN_LINE2: u8 = 0b1100_0000;

// Entry mode set

/// Entry mode: increment, no display shift (0x06)
pub const ENTRY_MODE_INC_NO_S: u8 = 0b0000_0110;
/// Entry mode: decrement, no display shift (0x04)
pub const ENTRY_MODE_DEC_NO_S: u8 = 0b0000_0100;
/// Entry mode: increment, display shift (0x07)
pub const ENTRY_MODE_INC_S: u8 = 0b0000_0111;
/// Entry mode: decrement, display shift (0x05)
pub const ENTRY_MODE_DEC_S: u8 = 0b0000_0101;

// Display on/off control

/// Display on, cursor on, blink on (0x0F)
pub const DISPLAY_DON_CON_BON: u8 = 0b0000_1111;
/// Display on, cursor on, blink off (0x0E)
pub const DISPLAY_DON_CON_BOFF: u8 = 0b0000_1110;
/// Display on, cursor off, blink on (0x0D)
pub const DISPLAY_DON_COFF_BON: u8 = 0b0000_1101;
/// Display on, cursor off, blink off (0x0C)
pub const DISPLAY_DON_COFF_BOFF: u8 = 0b0000_1100;
/// Display off, cursor on, blink on (0x0B)
pub const DISPLAY_DOFF_CON_BON: u8 = 0b0000_1011;
/// Display off, cursor on, blink off (0x0A)
pub const DISPLAY_DOFF_CON_BOFF: u8 = 0b0000_1010;
/// Display off, cursor off, blink on (0x09)
pub const DISPLAY_DOFF_COFF_BON: u8 = 0b0000_1001;
/// Display off, cursor off, blink off (0x08)
pub const DISPLAY_DOFF_COFF_BOFF: u8 = 0b0000_1000;

// Function set

/// 8-bit bus, 2 lines, 5x10 font (0x3C)
pub const FUNCTION_8B_2L_FBIG: u8 = 0b0011_1100;
/// 8-bit bus, 2 lines, 5x8 font (0x38)
///
/// The mode this board runs in.
pub const FUNCTION_8B_2L_FSML: u8 = 0b0011_1000;
/// 8-bit bus, 1 line, 5x10 font (0x34)
pub const FUNCTION_8B_1L_FBIG: u8 = 0b0011_0100;
/// 8-bit bus, 1 line, 5x8 font (0x30)
pub const FUNCTION_8B_1L_FSML: u8 = 0b0011_0000;
/// 4-bit bus, 2 lines, 5x10 font (0x2C)
pub const FUNCTION_4B_2L_FBIG: u8 = 0b0010_1100;
/// 4-bit bus, 2 lines, 5x8 font (0x28)
pub const FUNCTION_4B_2L_FSML: u8 = 0b0010_1000;
/// 4-bit bus, 1 line, 5x10 font (0x24)
pub const FUNCTION_4B_1L_FBIG: u8 = 0b0010_0100;
/// 4-bit bus, 1 line, 5x8 font (0x20)
pub const FUNCTION_4B_1L_FSML: u8 = 0b0010_0000;

// DDRAM addressing

/// Set DDRAM address command (0x80)
///
/// Bits 6-0 carry the address:
/// - line 1: 0x00..=0x0F
/// - line 2: 0x40..=0x4F
pub const SET_DDRAM_ADDRESS: u8 = 0b1000_0000;

/// DDRAM address of the first cell on line 2
pub const LINE2_ADDRESS: u8 = 0x40;

/// Highest DDRAM address that maps to a visible cell on a 2x16 panel
pub const MAX_DDRAM_ADDRESS: u8 = 0x4F;

/// Encode a set-DDRAM-address command
///
/// Only the low 7 bits of `address` are used; bit 7 is the opcode.
pub const fn set_ddram_address(address: u8) -> u8 {
    SET_DDRAM_ADDRESS | (address & 0x7F)
}

/// Cursor movement after each data write
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorDirection {
    /// Address counter increments (cursor moves right)
    #[default]
    Increment,
    /// Address counter decrements (cursor moves left)
    Decrement,
}

/// Entry mode set instruction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryMode {
    /// Direction of the address counter
    pub direction: CursorDirection,
    /// Shift the whole display instead of moving the cursor
    pub shift: bool,
}

impl EntryMode {
    /// Encode as a command byte
    pub const fn bits(self) -> u8 {
        let mut command = 0b0000_0100;
        if matches!(self.direction, CursorDirection::Increment) {
            command |= 0b0000_0010;
        }
        if self.shift {
            command |= 0b0000_0001;
        }
        command
    }
}

/// Display on/off control instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayControl {
    /// Display output enabled
    pub display: bool,
    /// Underline cursor visible
    pub cursor: bool,
    /// Block cursor blinking
    pub blink: bool,
}

impl Default for DisplayControl {
    fn default() -> Self {
        Self {
            display: true,
            cursor: false,
            blink: false,
        }
    }
}

impl DisplayControl {
    /// Encode as a command byte
    pub const fn bits(self) -> u8 {
        let mut command = 0b0000_1000;
        if self.display {
            command |= 0b0000_0100;
        }
        if self.cursor {
            command |= 0b0000_0010;
        }
        if self.blink {
            command |= 0b0000_0001;
        }
        command
    }
}

/// Interface data length
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BusWidth {
    /// 8-bit transfers (the only mode this driver speaks)
    #[default]
    EightBit,
    /// 4-bit transfers
    FourBit,
}

/// Number of display lines
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lines {
    /// Single line
    One,
    /// Two lines
    #[default]
    Two,
}

/// Character font
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontSize {
    /// 5x8 dots
    #[default]
    Small,
    /// 5x10 dots
    Large,
}

/// Function set instruction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FunctionSet {
    /// Interface data length
    pub bus: BusWidth,
    /// Number of lines
    pub lines: Lines,
    /// Character font
    pub font: FontSize,
}

impl FunctionSet {
    /// Encode as a command byte
    pub const fn bits(self) -> u8 {
        let mut command = 0b0010_0000;
        if matches!(self.bus, BusWidth::EightBit) {
            command |= 0b0001_0000;
        }
        if matches!(self.lines, Lines::Two) {
            command |= 0b0000_1000;
        }
        if matches!(self.font, FontSize::Large) {
            command |= 0b0000_0100;
        }
        command
    }
}

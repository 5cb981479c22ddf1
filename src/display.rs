//! Core display operations

use core::ffi::CStr;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::command::{
    CLEAR_DISPLAY, DISPLAY_DON_COFF_BOFF, DisplayControl, ENTRY_MODE_INC_NO_S, EntryMode,
    FUNCTION_8B_2L_FSML, LINE2_ADDRESS, MAX_DDRAM_ADDRESS, RETURN_HOME, RETURN_LINE2,
    set_ddram_address,
};
use crate::error::Error;
use crate::interface::LcdInterface;

type LcdResult<I> = core::result::Result<(), Error<I>>;

/// Instructions sent by [`Lcd::initialize`], in order
///
/// Function set must come before the display and entry mode instructions.
pub const INIT_SEQUENCE: [u8; 5] = [
    CLEAR_DISPLAY,
    FUNCTION_8B_2L_FSML,
    DISPLAY_DON_COFF_BOFF,
    ENTRY_MODE_INC_NO_S,
    RETURN_HOME,
];

/// A character cell on the 2x16 panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    /// Zero-based row; any non-zero value selects line 2
    pub row: u8,
    /// Zero-based column
    pub column: u8,
}

impl Position {
    /// Create a new position
    pub const fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }

    /// Raw DDRAM address, without range checking
    ///
    /// Row 0 starts at 0x00, row 1 at 0x40. Computed in 16 bits so large
    /// columns cannot wrap back into range.
    pub const fn address(self) -> u16 {
        let base = if self.row != 0 { LINE2_ADDRESS } else { 0x00 };
        base as u16 + self.column as u16
    }

    /// DDRAM address if it is within the panel's range (0x00..=0x4F)
    pub const fn ddram_address(self) -> Option<u8> {
        let address = self.address();
        if address <= MAX_DDRAM_ADDRESS as u16 {
            Some(address as u8)
        } else {
            None
        }
    }
}

/// Driver for an HD44780-compatible 2x16 character LCD
///
/// Generic over the byte transport; see [`RegisterInterface`](crate::RegisterInterface)
/// and [`HalInterface`](crate::HalInterface).
///
/// Call [`configure`](Self::configure) once, then [`initialize`](Self::initialize),
/// before writing text.
#[derive(Debug)]
pub struct Lcd<I>
where
    I: LcdInterface,
{
    /// Hardware interface
    interface: I,
}

impl<I> Lcd<I>
where
    I: LcdInterface,
{
    /// Create a new Lcd instance
    pub fn new(interface: I) -> Self {
        Self { interface }
    }

    /// Configure the SPI peripheral and control lines
    ///
    /// Safe to repeat, but not meant for reconfiguration while writing.
    pub fn configure(&mut self) -> LcdResult<I> {
        self.interface.configure().map_err(Error::Interface)
    }

    /// Bring the controller into 8-bit, 2-line, 5x8 mode with the display on,
    /// cursor and blink off, auto-increment, and the cursor home
    pub fn initialize<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<I> {
        debug!("initializing LCD controller");
        for command in INIT_SEQUENCE {
            self.write_command(command, delay)?;
        }
        Ok(())
    }

    /// Send a raw instruction byte
    pub fn write_command<D: DelayNs>(&mut self, command: u8, delay: &mut D) -> LcdResult<I> {
        self.interface
            .write_command(command, delay)
            .map_err(Error::Interface)
    }

    /// Write one byte to DDRAM at the cursor
    pub fn write_data<D: DelayNs>(&mut self, byte: u8, delay: &mut D) -> LcdResult<I> {
        self.interface
            .write_data(byte, delay)
            .map_err(Error::Interface)
    }

    /// Write bytes up to, not including, the first 0 byte
    ///
    /// A slice without a terminator is written in full.
    pub fn write_null_terminated<D: DelayNs>(
        &mut self,
        text: &[u8],
        delay: &mut D,
    ) -> LcdResult<I> {
        for &byte in text.iter().take_while(|&&byte| byte != 0) {
            self.write_data(byte, delay)?;
        }
        Ok(())
    }

    /// Write a C string (terminator excluded)
    pub fn write_c_str<D: DelayNs>(&mut self, text: &CStr, delay: &mut D) -> LcdResult<I> {
        self.write_buffer(text.to_bytes(), delay)
    }

    /// Write exactly `buffer.len()` bytes, zeros included
    pub fn write_buffer<D: DelayNs>(&mut self, buffer: &[u8], delay: &mut D) -> LcdResult<I> {
        for &byte in buffer {
            self.write_data(byte, delay)?;
        }
        Ok(())
    }

    /// Write the bytes of a string as-is
    ///
    /// The controller's character ROM decides what non-ASCII bytes look like.
    pub fn write_str<D: DelayNs>(&mut self, text: &str, delay: &mut D) -> LcdResult<I> {
        self.write_buffer(text.as_bytes(), delay)
    }

    /// Move the cursor to `row`, `column` (both zero-based)
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAddress` without touching the bus if the
    /// computed DDRAM address is above 0x4F.
    pub fn set_position<D: DelayNs>(
        &mut self,
        row: u8,
        column: u8,
        delay: &mut D,
    ) -> LcdResult<I> {
        let position = Position::new(row, column);
        let Some(address) = position.ddram_address() else {
            let address = position.address();
            warn!("rejecting cursor position ({row}, {column}): DDRAM address {address:#x}");
            return Err(Error::InvalidAddress {
                row,
                column,
                address,
            });
        };
        self.write_command(set_ddram_address(address), delay)
    }

    /// Clear the display and home the cursor
    pub fn clear<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<I> {
        self.write_command(CLEAR_DISPLAY, delay)
    }

    /// Home the cursor and undo display shift
    pub fn return_home<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<I> {
        self.write_command(RETURN_HOME, delay)
    }

    /// Move the cursor to the start of line 2
    pub fn return_line2<D: DelayNs>(&mut self, delay: &mut D) -> LcdResult<I> {
        self.write_command(RETURN_LINE2, delay)
    }

    /// Set cursor direction and display shift
    pub fn set_entry_mode<D: DelayNs>(&mut self, mode: EntryMode, delay: &mut D) -> LcdResult<I> {
        self.write_command(mode.bits(), delay)
    }

    /// Set display, cursor and blink visibility
    pub fn set_display_control<D: DelayNs>(
        &mut self,
        control: DisplayControl,
        delay: &mut D,
    ) -> LcdResult<I> {
        self.write_command(control.bits(), delay)
    }

    /// Access the interface
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Mutable access to the interface
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Release the interface
    pub fn release(self) -> I {
        self.interface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CursorDirection;
    use crate::config::{Builder, Config, GpioPort, Pin};
    use crate::interface::{InterfaceError, RegisterInterface};
    use crate::mock::{Event, Frame, Log, MockDelay, MockPort};
    use crate::port::Field;
    use alloc::vec;
    use alloc::vec::Vec;

    const CS: Pin = Pin::new(GpioPort::B, 14);
    const RS: Pin = Pin::new(GpioPort::B, 13);

    fn test_lcd(log: &Log) -> (Lcd<RegisterInterface<MockPort>>, MockDelay) {
        let port = MockPort::new(log.clone());
        let lcd = Lcd::new(RegisterInterface::new(port, Config::default()).unwrap());
        (lcd, MockDelay { log: log.clone() })
    }

    #[test]
    fn test_initialize_sequence() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.initialize(&mut delay).unwrap();

        assert_eq!(log.commands(RS), vec![0x01, 0x38, 0x0C, 0x06, 0x02]);
        assert!(log.data(RS).is_empty());
    }

    #[test]
    fn test_set_position_all_valid_cells() {
        for row in 0..2u8 {
            for column in 0..16u8 {
                let log = Log::default();
                let (mut lcd, mut delay) = test_lcd(&log);
                lcd.set_position(row, column, &mut delay).unwrap();

                let address = row * 0x40 + column;
                assert_eq!(Position::new(row, column).ddram_address(), Some(address));
                assert_eq!(log.commands(RS), vec![0x80 | address]);
            }
        }
    }

    #[test]
    fn test_set_position_origin_and_line2() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.set_position(0, 0, &mut delay).unwrap();
        lcd.set_position(1, 0, &mut delay).unwrap();
        assert_eq!(log.commands(RS), vec![0x80, 0xC0]);
    }

    #[test]
    fn test_set_position_past_line2_is_rejected() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        let result = lcd.set_position(1, 16, &mut delay);

        assert!(matches!(
            result,
            Err(Error::InvalidAddress {
                row: 1,
                column: 16,
                address: 0x50
            })
        ));
        assert_eq!(result.unwrap_err().code(), -1000);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_set_position_large_column_does_not_wrap() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        let result = lcd.set_position(1, 0xF0, &mut delay);
        assert!(matches!(
            result,
            Err(Error::InvalidAddress { address: 0x130, .. })
        ));
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_set_position_checks_address_not_column() {
        // Only the address is range-checked, not the column
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.set_position(0, 0x4F, &mut delay).unwrap();
        assert_eq!(log.commands(RS), vec![0xCF]);

        let result = lcd.set_position(0, 0x50, &mut delay);
        assert!(matches!(result, Err(Error::InvalidAddress { .. })));
    }

    #[test]
    fn test_any_nonzero_row_selects_line2() {
        assert_eq!(Position::new(7, 3).address(), 0x43);
    }

    #[test]
    fn test_write_buffer_empty_is_silent() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.write_buffer(&[], &mut delay).unwrap();
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_write_buffer_frames_every_byte() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        let payload = [b'A', 0x00, 0xFF];
        lcd.write_buffer(&payload, &mut delay).unwrap();

        let writes = log.writes();
        assert_eq!(writes.len(), payload.len() * 6);
        for (chunk, byte) in writes.chunks(6).zip(payload) {
            assert_eq!(
                chunk,
                [
                    Event::Write(Field::Latch(CS), 1),
                    Event::Write(Field::Latch(RS), 1),
                    Event::Write(Field::Buffer, u16::from(byte)),
                    Event::DelayUs(100),
                    Event::Write(Field::Latch(CS), 0),
                    Event::Write(Field::Latch(RS), 0),
                ]
            );
        }
    }

    #[test]
    fn test_write_null_terminated_stops_at_zero() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.write_null_terminated(b"Hi\0junk", &mut delay).unwrap();
        assert_eq!(log.data(RS), b"Hi".to_vec());
    }

    #[test]
    fn test_write_null_terminated_without_terminator() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.write_null_terminated(b"abc", &mut delay).unwrap();
        assert_eq!(log.data(RS), b"abc".to_vec());
    }

    #[test]
    fn test_write_null_terminated_leading_zero() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.write_null_terminated(b"\0abc", &mut delay).unwrap();
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_write_c_str() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.write_c_str(c"Hey", &mut delay).unwrap();
        assert_eq!(log.data(RS), b"Hey".to_vec());
    }

    #[test]
    fn test_write_str() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.write_str("Line 1", &mut delay).unwrap();
        assert_eq!(log.data(RS), b"Line 1".to_vec());
        assert!(log.commands(RS).is_empty());
    }

    #[test]
    fn test_command_waits_long_settle_data_does_not() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);

        lcd.write_command(CLEAR_DISPLAY, &mut delay).unwrap();
        let command_delays: Vec<Event> = log
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::DelayUs(_) | Event::DelayMs(_)))
            .collect();
        assert_eq!(command_delays, vec![Event::DelayUs(100), Event::DelayMs(2)]);
        assert_eq!(log.events().last(), Some(&Event::DelayMs(2)));

        log.clear();
        lcd.write_data(b'x', &mut delay).unwrap();
        let data_delays: Vec<Event> = log
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::DelayUs(_) | Event::DelayMs(_)))
            .collect();
        assert_eq!(data_delays, vec![Event::DelayUs(100)]);
    }

    #[test]
    fn test_convenience_commands() {
        let log = Log::default();
        let (mut lcd, mut delay) = test_lcd(&log);
        lcd.clear(&mut delay).unwrap();
        lcd.return_home(&mut delay).unwrap();
        lcd.return_line2(&mut delay).unwrap();
        lcd.set_entry_mode(
            EntryMode {
                direction: CursorDirection::Decrement,
                shift: true,
            },
            &mut delay,
        )
        .unwrap();
        lcd.set_display_control(
            DisplayControl {
                display: true,
                cursor: true,
                blink: true,
            },
            &mut delay,
        )
        .unwrap();

        assert_eq!(log.commands(RS), vec![0x01, 0x02, 0xC0, 0x05, 0x0F]);
    }

    #[test]
    fn test_interface_failure_is_wrapped() {
        let log = Log::default();
        let mut port = MockPort::new(log.clone());
        port.stuck = true;
        let config = Builder::new().poll_limit(3).build().unwrap();
        let mut lcd = Lcd::new(RegisterInterface::new(port, config).unwrap());
        let mut delay = MockDelay { log: log.clone() };

        let result = lcd.write_data(b'a', &mut delay);
        assert!(matches!(
            result,
            Err(Error::Interface(InterfaceError::Timeout))
        ));
        assert_eq!(result.unwrap_err().code(), -1);
    }

    #[test]
    fn test_write_buffer_stops_at_first_failure() {
        let log = Log::default();
        let mut port = MockPort::new(log.clone());
        port.stuck = true;
        let config = Builder::new().poll_limit(1).build().unwrap();
        let mut lcd = Lcd::new(RegisterInterface::new(port, config).unwrap());
        let mut delay = MockDelay { log: log.clone() };

        assert!(lcd.write_buffer(b"abc", &mut delay).is_err());
        assert_eq!(
            log.frames(RS),
            vec![Frame {
                data: true,
                byte: b'a'
            }]
        );
    }
}

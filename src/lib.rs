//! SPI Character LCD Driver
//!
//! A driver for HD44780-compatible 2x16 character LCD boards whose controller
//! is fed through a serial-to-parallel SPI front end, with an active-high
//! chip select and a separate register-select line.
//!
//! ## Features
//!
//! - `no_std` compatible
//! - `embedded-hal` v1.0 support
//! - Register-level SPI setup through a pluggable [`Port`](port::Port)
//! - Volatile memory-mapped port (with `mmio` feature)
//! - Bounded busy-wait on transfer completion
//! - Built-in bring-up self test
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::OutputPin;
//! use embedded_hal::spi::SpiBus;
//! use charlcd_spi::{HalInterface, Lcd};
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiBus for MockSpi {
//! #     fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let spi = MockSpi;
//! # let cs = MockPin;
//! # let rs = MockPin;
//! # let mut delay = MockDelay;
//! let mut lcd = Lcd::new(HalInterface::new(spi, cs, rs));
//! let _ = lcd.configure();
//! let _ = lcd.initialize(&mut delay);
//! let _ = lcd.write_str("Line 1", &mut delay);
//! if lcd.set_position(1, 10, &mut delay).is_ok() {
//!     let _ = lcd.write_str("Text 2", &mut delay);
//! }
//! ```

#![no_std]

#[cfg(test)]
extern crate alloc;

/// Controller instruction set
pub mod command;
/// Board configuration types and builder
pub mod config;
/// Core display operations
pub mod display;
/// Error types for the driver
pub mod error;
/// Byte transport abstraction
pub mod interface;
/// Register field access
pub mod port;

#[cfg(test)]
mod mock;

pub use config::{
    Builder, ClockConfig, ClockPolarity, Config, GpioPort, OutputEdge, Pin, PinMap,
    PrimaryPrescaler, RemappablePin, SamplePhase, Timing,
};
pub use display::{INIT_SEQUENCE, Lcd, Position};
pub use error::{BuilderError, Error, INTERFACE_ERROR_CODE, INVALID_DDRAM_ADDRESS_CODE};
pub use interface::{HalInterface, InterfaceError, LcdInterface, RegisterInterface};
pub use port::{Field, Port};

#[cfg(feature = "mmio")]
pub use port::MmioPort;

//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and display operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors during display operations
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level hardware communication errors
//!
//! ## Status Codes
//!
//! Firmware that still speaks integer status codes can use [`Error::code`]:
//! `0` is success, [`INVALID_DDRAM_ADDRESS_CODE`] marks a rejected cursor
//! position and [`INTERFACE_ERROR_CODE`] everything the hardware reported.
//!
//! ## Example
//!
//! ```
//! use charlcd_spi::{Builder, BuilderError};
//!
//! let result = Builder::new().secondary_prescaler(0).build();
//! assert!(matches!(result, Err(BuilderError::InvalidPrescaler { ratio: 0 })));
//! ```

use crate::config::Pin;
use crate::interface::LcdInterface;

/// Status code for a cursor position outside DDRAM
pub const INVALID_DDRAM_ADDRESS_CODE: i32 = -1000;

/// Status code for any transport failure
pub const INTERFACE_ERROR_CODE: i32 = -1;

/// Errors that can occur when talking to the display
///
/// Generic over the interface type to preserve the specific error type.
#[derive(Debug)]
pub enum Error<I: LcdInterface> {
    /// Interface error (SPI peripheral, control lines, or completion timeout)
    ///
    /// Wraps the underlying error from the [`LcdInterface`] implementation.
    Interface(I::Error),
    /// Cursor position maps outside the visible DDRAM range
    ///
    /// Row 0 covers 0x00..=0x0F and row 1 covers 0x40..=0x4F. Nothing was
    /// sent to the controller.
    InvalidAddress {
        /// Requested row
        row: u8,
        /// Requested column
        column: u8,
        /// Address the position computed to
        address: u16,
    },
}

impl<I: LcdInterface> Error<I> {
    /// Integer status code for this error
    pub const fn code(&self) -> i32 {
        match self {
            Self::Interface(_) => INTERFACE_ERROR_CODE,
            Self::InvalidAddress { .. } => INVALID_DDRAM_ADDRESS_CODE,
        }
    }
}

impl<I: LcdInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(e) => write!(f, "Interface error: {e:?}"),
            Self::InvalidAddress {
                row,
                column,
                address,
            } => write!(
                f,
                "Invalid DDRAM address {address:#04x} for row {row}, column {column}"
            ),
        }
    }
}

impl<I: LcdInterface + core::fmt::Debug> core::error::Error for Error<I> {}

/// Errors that can occur when building configuration
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// Secondary prescaler ratio outside 1..=8
    InvalidPrescaler {
        /// Requested ratio
        ratio: u8,
    },
    /// Peripheral pin select number does not fit the 7-bit field
    InvalidRemappablePin {
        /// Requested RPn / RPIn number
        number: u8,
    },
    /// Pin index beyond the 16 bits of a port
    InvalidPinIndex {
        /// Requested index
        index: u8,
    },
    /// A control line shares its pin with another signal
    ConflictingPins {
        /// The control pin that clashes
        pin: Pin,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidPrescaler { ratio } => {
                write!(f, "Invalid secondary prescaler {ratio}:1 (must be 1..=8)")
            }
            Self::InvalidRemappablePin { number } => {
                write!(f, "Invalid remappable pin RP{number} (max 127)")
            }
            Self::InvalidPinIndex { index } => {
                write!(f, "Invalid pin index {index} (max 15)")
            }
            Self::ConflictingPins { pin } => {
                write!(f, "Control pin R{:?}{} is already in use", pin.port, pin.index)
            }
        }
    }
}

impl core::error::Error for BuilderError {}

//! Hardware interface abstraction
//!
//! This module provides the [`LcdInterface`] trait, the byte transport the
//! display layer is written against, and two implementations:
//!
//! - [`RegisterInterface`] drives the SPI module, pin select matrix and
//!   control lines itself through a register [`Port`].
//! - [`HalInterface`] sits on top of an `embedded-hal` [`SpiBus`] and two
//!   [`OutputPin`]s for boards where a HAL already owns the SPI peripheral.
//!
//! ## Hardware Requirements
//!
//! - SPI master, 8-bit, clock idle low, output on the idle-to-active edge
//! - 2 GPIO outputs:
//!   - **CS**: Chip/enable select (active **high** on this board)
//!   - **RS**: Register select (low = command, high = data)
//!
//! ## Frame Timing
//!
//! ```text
//! command: CS↑ RS↓ [byte] wait-complete latch CS↓ command-settle
//! data:    CS↑ RS↑ [byte] wait-complete latch CS↓ RS↓
//! ```
//!
//! RS handling differs between the two sequences and each must stay as
//! written relative to the CS edges.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::{debug, trace, warn};

use crate::config::{ClockPolarity, Config, OutputEdge, SamplePhase, Timing};
use crate::error::BuilderError;
use crate::port::{Field, Port, SCK2_OUTPUT_FUNCTION, SDO2_OUTPUT_FUNCTION};

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Interface error of a [`RegisterInterface`] over port `P`
pub type PortInterfaceError<P> = InterfaceError<<P as Port>::Error, <P as Port>::Error>;

/// Trait for the byte transport to the LCD controller
///
/// Every call is a complete, blocking, single-byte transaction.
pub trait LcdInterface {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Bring the transport up
    ///
    /// Idempotent; calling it again rewrites the same configuration.
    fn configure(&mut self) -> InterfaceResult<(), Self::Error>;

    /// Send an instruction byte (RS low)
    ///
    /// Ends with the long command settle interval.
    fn write_command<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> InterfaceResult<(), Self::Error>;

    /// Send a character data byte (RS high)
    ///
    /// Ends with RS back low and only the short latch interval spent.
    fn write_data<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> InterfaceResult<(), Self::Error>;
}

/// Errors that can occur at the interface level
///
/// Generic over bus and control-line error types.
#[derive(Debug)]
pub enum InterfaceError<BusErr, PinErr> {
    /// SPI peripheral error
    Bus(BusErr),
    /// Control line (CS/RS) error
    Pin(PinErr),
    /// Transfer never reported completion within the poll limit
    Timeout,
}

impl<BusErr: Debug, PinErr: Debug> core::fmt::Display for InterfaceError<BusErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "SPI error: {e:?}"),
            Self::Pin(e) => write!(f, "Pin error: {e:?}"),
            Self::Timeout => write!(f, "Timeout waiting for transfer to complete"),
        }
    }
}

impl<BusErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<BusErr, PinErr> {}

/// Register-level transport
///
/// Owns the SPI module through a [`Port`] and drives CS/RS as port latch
/// bits. All pin numbers, clock settings and settle intervals come from
/// [`Config`].
///
/// ## Example
///
/// ```rust,no_run
/// use charlcd_spi::{Config, Lcd, RegisterInterface};
/// use charlcd_spi::port::{Field, Port};
/// # use core::convert::Infallible;
/// # use embedded_hal::delay::DelayNs;
/// # struct BoardPort;
/// # impl Port for BoardPort {
/// #     type Error = Infallible;
/// #     fn write_field(&mut self, _field: Field, _value: u16) -> Result<(), Self::Error> { Ok(()) }
/// #     fn read_field(&mut self, _field: Field) -> Result<u16, Self::Error> { Ok(0) }
/// # }
/// # struct MockDelay;
/// # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
/// # fn main() -> Result<(), charlcd_spi::BuilderError> {
/// # let mut delay = MockDelay;
/// let interface = RegisterInterface::new(BoardPort, Config::default())?;
/// let mut lcd = Lcd::new(interface);
/// let _ = lcd.configure();
/// let _ = lcd.initialize(&mut delay);
/// let _ = lcd.write_str("Hello", &mut delay);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RegisterInterface<P> {
    /// Register access
    port: P,
    /// Board configuration
    config: Config,
}

impl<P: Port> RegisterInterface<P> {
    /// Create a new interface over `port`
    ///
    /// # Errors
    ///
    /// Returns the first [`Config::validate`] error for a configuration that
    /// did not come from [`Builder`](crate::Builder).
    pub fn new(port: P, config: Config) -> Result<Self, BuilderError> {
        config.validate()?;
        Ok(Self { port, config })
    }

    /// Access the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Release the port
    pub fn release(self) -> P {
        self.port
    }

    fn bus(&mut self, field: Field, value: u16) -> InterfaceResult<(), PortInterfaceError<P>> {
        self.port.write_field(field, value).map_err(InterfaceError::Bus)
    }

    fn line(&mut self, field: Field, value: u16) -> InterfaceResult<(), PortInterfaceError<P>> {
        self.port.write_field(field, value).map_err(InterfaceError::Pin)
    }

    fn chip_select(&mut self, active: bool) -> InterfaceResult<(), PortInterfaceError<P>> {
        self.line(Field::Latch(self.config.pins.chip_select), u16::from(active))
    }

    fn register_select(&mut self, data: bool) -> InterfaceResult<(), PortInterfaceError<P>> {
        self.line(Field::Latch(self.config.pins.register_select), u16::from(data))
    }

    /// Load the transmit buffer, spin until the shifted-in byte shows up in
    /// the receive buffer, settle, then drain it
    fn shift<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> InterfaceResult<(), PortInterfaceError<P>> {
        self.bus(Field::Buffer, u16::from(byte))?;

        if let Err(e) = self.wait_transfer_complete() {
            // Leave both lines idle so the next frame starts clean
            self.chip_select(false)?;
            self.register_select(false)?;
            return Err(e);
        }

        delay.delay_us(self.config.timing.latch_us);
        let _ = self
            .port
            .read_field(Field::Buffer)
            .map_err(InterfaceError::Bus)?;
        Ok(())
    }

    fn wait_transfer_complete(&mut self) -> InterfaceResult<(), PortInterfaceError<P>> {
        let limit = self.config.poll_limit;
        let mut polls = 0u32;

        while self
            .port
            .flag(Field::RxBufferEmpty)
            .map_err(InterfaceError::Bus)?
        {
            polls = polls.saturating_add(1);
            if limit > 0 && polls >= limit {
                warn!("SPI transfer did not complete after {polls} polls");
                return Err(InterfaceError::Timeout);
            }
            core::hint::spin_loop();
        }

        Ok(())
    }
}

impl<P: Port> LcdInterface for RegisterInterface<P> {
    type Error = PortInterfaceError<P>;

    fn configure(&mut self) -> InterfaceResult<(), Self::Error> {
        let clock = self.config.clock;
        let pins = self.config.pins;
        debug!(
            "configuring SPI: {:?}, SCK RP{}, SDO RP{}, SDI RPI{}",
            clock, pins.sck.number, pins.sdo.number, pins.sdi.number
        );

        // SPIxCON1
        self.bus(Field::ClockDisable, 0)?;
        self.bus(Field::SdoDisable, 0)?;
        self.bus(Field::WordWide, 0)?;
        self.bus(
            Field::SampleAtEnd,
            u16::from(clock.sample_phase == SamplePhase::End),
        )?;
        self.bus(
            Field::OutputOnIdleToActive,
            u16::from(clock.output_edge == OutputEdge::IdleToActive),
        )?;
        self.bus(Field::SlaveSelectEnable, 0)?;
        self.bus(
            Field::ClockIdleHigh,
            u16::from(clock.polarity == ClockPolarity::IdleHigh),
        )?;
        self.bus(Field::MasterEnable, 1)?;
        self.bus(Field::SecondaryPrescale, clock.secondary_bits())?;
        self.bus(Field::PrimaryPrescale, clock.primary as u16)?;

        // SPIxCON2
        self.bus(Field::FramedEnable, 0)?;
        self.bus(Field::FrameSyncInput, 0)?;
        self.bus(Field::FramePolarityHigh, 0)?;
        self.bus(Field::FrameDelay, 0)?;
        self.bus(Field::EnhancedBuffer, 1)?;

        // SCK must be mapped as both input and output in master mode
        self.bus(Field::SdiInput, u16::from(pins.sdi.number))?;
        self.bus(Field::OutputFunction(pins.sdo.number), SDO2_OUTPUT_FUNCTION)?;
        self.bus(Field::SckInput, u16::from(pins.sck.number))?;
        self.bus(Field::OutputFunction(pins.sck.number), SCK2_OUTPUT_FUNCTION)?;

        // Released levels latched before the lines become outputs
        self.chip_select(false)?;
        self.register_select(false)?;
        self.line(Field::Direction(pins.chip_select), 0)?;
        self.line(Field::Direction(pins.register_select), 0)?;

        for pin in pins.pins() {
            self.line(Field::Analog(pin), 0)?;
        }

        self.bus(Field::StopInIdle, 0)?;
        self.bus(Field::Enable, 1)?;

        debug!("SPI enabled");
        Ok(())
    }

    fn write_command<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> InterfaceResult<(), Self::Error> {
        trace!("command {byte:#04x}");
        self.chip_select(true)?;
        self.register_select(false)?;
        self.shift(byte, delay)?;
        self.chip_select(false)?;
        delay.delay_ms(self.config.timing.command_ms);
        Ok(())
    }

    fn write_data<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> InterfaceResult<(), Self::Error> {
        trace!("data {byte:#04x}");
        self.chip_select(true)?;
        self.register_select(true)?;
        self.shift(byte, delay)?;
        self.chip_select(false)?;
        self.register_select(false)?;
        Ok(())
    }
}

/// `embedded-hal` transport
///
/// The HAL configures the SPI bus (mode 0 equivalent, see module docs);
/// this type only frames bytes with CS and RS and applies the settle
/// intervals. Completion is [`SpiBus::flush`].
///
/// ## Type Parameters
///
/// * `SPI` - SPI bus implementing [`SpiBus`]
/// * `CS` - Chip-select pin implementing [`OutputPin`] (active high)
/// * `RS` - Register-select pin implementing [`OutputPin`]
///
/// ## Example
///
/// ```rust,no_run
/// use charlcd_spi::{HalInterface, Lcd};
/// # use core::convert::Infallible;
/// # use embedded_hal::delay::DelayNs;
/// # use embedded_hal::digital::OutputPin;
/// # use embedded_hal::spi::SpiBus;
/// # struct MockSpi;
/// # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
/// # impl SpiBus for MockSpi {
/// #     fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> { Ok(()) }
/// #     fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> { Ok(()) }
/// #     fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> { Ok(()) }
/// #     fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> { Ok(()) }
/// #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # struct MockPin;
/// # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
/// # impl OutputPin for MockPin {
/// #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # struct MockDelay;
/// # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
/// # let mut delay = MockDelay;
/// let interface = HalInterface::new(MockSpi, MockPin, MockPin);
/// let mut lcd = Lcd::new(interface);
/// let _ = lcd.self_test(&mut delay);
/// ```
#[derive(Debug)]
pub struct HalInterface<SPI, CS, RS> {
    /// SPI bus
    spi: SPI,
    /// Chip select (active high)
    cs: CS,
    /// Register select (low=command, high=data)
    rs: RS,
    /// Settle intervals
    timing: Timing,
}

impl<SPI, CS, RS> HalInterface<SPI, CS, RS>
where
    SPI: SpiBus,
    CS: OutputPin,
    RS: OutputPin,
{
    /// Create a new interface with the default settle intervals
    pub fn new(spi: SPI, cs: CS, rs: RS) -> Self {
        Self {
            spi,
            cs,
            rs,
            timing: Timing::default(),
        }
    }

    /// Override the settle intervals
    pub fn set_timing(&mut self, timing: Timing) -> &mut Self {
        self.timing = timing;
        self
    }

    /// Get the settle intervals
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, CS, RS) {
        (self.spi, self.cs, self.rs)
    }
}

impl<SPI, CS, RS, PinErr> HalInterface<SPI, CS, RS>
where
    SPI: SpiBus,
    SPI::Error: Debug,
    CS: OutputPin<Error = PinErr>,
    RS: OutputPin<Error = PinErr>,
    PinErr: Debug,
{
    fn shift<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> InterfaceResult<(), InterfaceError<SPI::Error, PinErr>> {
        let mut frame = [byte];
        self.spi
            .transfer_in_place(&mut frame)
            .map_err(InterfaceError::Bus)?;
        self.spi.flush().map_err(InterfaceError::Bus)?;
        delay.delay_us(self.timing.latch_us);
        Ok(())
    }
}

impl<SPI, CS, RS, PinErr> LcdInterface for HalInterface<SPI, CS, RS>
where
    SPI: SpiBus,
    SPI::Error: Debug,
    CS: OutputPin<Error = PinErr>,
    RS: OutputPin<Error = PinErr>,
    PinErr: Debug,
{
    type Error = InterfaceError<SPI::Error, PinErr>;

    fn configure(&mut self) -> InterfaceResult<(), Self::Error> {
        debug!("releasing CS/RS control lines");
        self.cs.set_low().map_err(InterfaceError::Pin)?;
        self.rs.set_low().map_err(InterfaceError::Pin)?;
        Ok(())
    }

    fn write_command<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> InterfaceResult<(), Self::Error> {
        trace!("command {byte:#04x}");
        self.cs.set_high().map_err(InterfaceError::Pin)?;
        self.rs.set_low().map_err(InterfaceError::Pin)?;
        self.shift(byte, delay)?;
        self.cs.set_low().map_err(InterfaceError::Pin)?;
        delay.delay_ms(self.timing.command_ms);
        Ok(())
    }

    fn write_data<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> InterfaceResult<(), Self::Error> {
        trace!("data {byte:#04x}");
        self.cs.set_high().map_err(InterfaceError::Pin)?;
        self.rs.set_high().map_err(InterfaceError::Pin)?;
        self.shift(byte, delay)?;
        self.cs.set_low().map_err(InterfaceError::Pin)?;
        self.rs.set_low().map_err(InterfaceError::Pin)?;
        Ok(())
    }
}

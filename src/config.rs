//! Board configuration types and builder
//!
//! SPI module setup, pin routing, control-line pins and settle intervals are
//! fixed per board and live in [`Config`]. The defaults reproduce the LCD
//! board wiring:
//!
//! | Signal | Pin        | Board header |
//! |--------|------------|--------------|
//! | SCK    | RP42 (RB10)| 21           |
//! | SDO    | RP43 (RB11)| 22           |
//! | SDI    | RPI44 (RB12)| 23          |
//! | RS     | RB13       | 24           |
//! | CS     | RB14       | 25           |

pub use crate::error::BuilderError;

/// Instruction clock the default prescalers were chosen for (60 MHz)
pub const DEFAULT_FCY_HZ: u32 = 60_000_000;

/// Default settle time after each byte before CS is released
pub const DEFAULT_LATCH_US: u32 = 100;

/// Default settle time after a command frame, covering slow instructions
pub const DEFAULT_COMMAND_MS: u32 = 2;

/// Default bound on "transfer complete" polls before giving up
///
/// At the default bit rate a byte takes well under 10k polls; 0 disables the
/// bound entirely.
pub const DEFAULT_POLL_LIMIT: u32 = 100_000;

/// Highest number accepted by the peripheral pin select fields (7 bits)
pub const MAX_REMAPPABLE_PIN: u8 = 0x7F;

/// General-purpose I/O port
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpioPort {
    /// PORTA
    A,
    /// PORTB
    B,
    /// PORTC
    C,
    /// PORTD
    D,
    /// PORTE
    E,
    /// PORTF
    F,
    /// PORTG
    G,
}

impl GpioPort {
    /// Zero-based port index (A = 0)
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A single physical port pin, e.g. RB13
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pin {
    /// Port the pin belongs to
    pub port: GpioPort,
    /// Bit within the port, 0..=15
    pub index: u8,
}

impl Pin {
    /// Create a pin reference
    pub const fn new(port: GpioPort, index: u8) -> Self {
        Self { port, index }
    }
}

/// A pin reachable through the peripheral pin select matrix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemappablePin {
    /// RPn / RPIn number used in the PPS registers
    pub number: u8,
    /// Physical pin behind that number
    pub pin: Pin,
}

impl RemappablePin {
    /// Create a remappable pin reference
    pub const fn new(number: u8, pin: Pin) -> Self {
        Self { number, pin }
    }
}

/// SPI and control-line pin assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinMap {
    /// Serial clock, routed as both output and input in master mode
    pub sck: RemappablePin,
    /// Serial data out
    pub sdo: RemappablePin,
    /// Serial data in
    pub sdi: RemappablePin,
    /// Chip/enable select, active high on this board
    pub chip_select: Pin,
    /// Register select (low = command, high = data)
    pub register_select: Pin,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            sck: RemappablePin::new(42, Pin::new(GpioPort::B, 10)),
            sdo: RemappablePin::new(43, Pin::new(GpioPort::B, 11)),
            sdi: RemappablePin::new(44, Pin::new(GpioPort::B, 12)),
            chip_select: Pin::new(GpioPort::B, 14),
            register_select: Pin::new(GpioPort::B, 13),
        }
    }
}

impl PinMap {
    /// Every physical pin the driver touches
    pub fn pins(&self) -> [Pin; 5] {
        [
            self.sck.pin,
            self.sdo.pin,
            self.sdi.pin,
            self.chip_select,
            self.register_select,
        ]
    }
}

/// Clock idle level (CKP)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockPolarity {
    /// Idle low, active high
    #[default]
    IdleLow,
    /// Idle high, active low
    IdleHigh,
}

/// Clock edge on which output data changes (CKE)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputEdge {
    /// Data changes on the active-to-idle transition
    ActiveToIdle,
    /// Data changes on the idle-to-active transition
    #[default]
    IdleToActive,
}

/// Input sample point (SMP)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplePhase {
    /// Sampled in the middle of the data output time
    #[default]
    Middle,
    /// Sampled at the end of the data output time
    End,
}

/// Primary SPI clock prescaler (PPRE)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum PrimaryPrescaler {
    /// 64:1
    #[default]
    Div64 = 0b00,
    /// 16:1
    Div16 = 0b01,
    /// 4:1
    Div4 = 0b10,
    /// 1:1
    Div1 = 0b11,
}

impl PrimaryPrescaler {
    /// Division ratio
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div64 => 64,
            Self::Div16 => 16,
            Self::Div4 => 4,
            Self::Div1 => 1,
        }
    }
}

/// SPI clock settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockConfig {
    /// Clock idle level
    pub polarity: ClockPolarity,
    /// Edge on which output data changes
    pub output_edge: OutputEdge,
    /// Input sample point
    pub sample_phase: SamplePhase,
    /// Primary prescaler
    pub primary: PrimaryPrescaler,
    /// Secondary prescaler ratio, 1..=8
    pub secondary: u8,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            polarity: ClockPolarity::IdleLow,
            output_edge: OutputEdge::IdleToActive,
            sample_phase: SamplePhase::Middle,
            primary: PrimaryPrescaler::Div64,
            secondary: 1,
        }
    }
}

impl ClockConfig {
    /// SPRE field encoding (8:1 = 0b000 ... 1:1 = 0b111)
    pub const fn secondary_bits(&self) -> u16 {
        (8u8.wrapping_sub(self.secondary) & 0b111) as u16
    }

    /// Serial clock rate for a given instruction clock
    pub const fn bit_rate(&self, fcy_hz: u32) -> u32 {
        let secondary = if self.secondary == 0 {
            1
        } else {
            self.secondary as u32
        };
        fcy_hz / (self.primary.divisor() * secondary)
    }
}

/// Post-transfer settle intervals
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Wait after the byte is shifted, before CS is released (microseconds)
    pub latch_us: u32,
    /// Extra wait after a command frame is released (milliseconds)
    pub command_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            latch_us: DEFAULT_LATCH_US,
            command_ms: DEFAULT_COMMAND_MS,
        }
    }
}

/// Driver configuration
///
/// Use [`Builder`] to create a validated Config, or `Config::default()` for
/// the stock LCD board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Pin assignment
    pub pins: PinMap,
    /// SPI clock settings
    pub clock: ClockConfig,
    /// Settle intervals
    pub timing: Timing,
    /// Bound on completion polls per byte (0 = wait forever)
    pub poll_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pins: PinMap::default(),
            clock: ClockConfig::default(),
            timing: Timing::default(),
            poll_limit: DEFAULT_POLL_LIMIT,
        }
    }
}

impl Config {
    /// Check the configuration against the hardware limits
    ///
    /// # Errors
    ///
    /// - `BuilderError::InvalidPrescaler` if the secondary ratio is outside 1..=8
    /// - `BuilderError::InvalidRemappablePin` if a PPS number exceeds 7 bits
    /// - `BuilderError::InvalidPinIndex` if a pin index exceeds 15
    /// - `BuilderError::ConflictingPins` if CS or RS share a pin with another signal
    pub fn validate(&self) -> Result<(), BuilderError> {
        if !(1..=8).contains(&self.clock.secondary) {
            return Err(BuilderError::InvalidPrescaler {
                ratio: self.clock.secondary,
            });
        }

        for remappable in [self.pins.sck, self.pins.sdo, self.pins.sdi] {
            if remappable.number > MAX_REMAPPABLE_PIN {
                return Err(BuilderError::InvalidRemappablePin {
                    number: remappable.number,
                });
            }
        }

        let pins = self.pins.pins();
        if let Some(pin) = pins.iter().find(|pin| pin.index > 15) {
            return Err(BuilderError::InvalidPinIndex { index: pin.index });
        }

        let controls = [self.pins.chip_select, self.pins.register_select];
        for (i, control) in controls.iter().enumerate() {
            let clashes = pins
                .iter()
                .enumerate()
                .any(|(j, other)| j != 3 + i && other == control);
            if clashes {
                return Err(BuilderError::ConflictingPins { pin: *control });
            }
        }

        Ok(())
    }
}

/// Builder for constructing driver configuration
///
/// # Example
///
/// ```
/// use charlcd_spi::{Builder, Pin, GpioPort, PrimaryPrescaler};
///
/// let config = match Builder::new()
///     .chip_select(Pin::new(GpioPort::B, 14))
///     .primary_prescaler(PrimaryPrescaler::Div16)
///     .secondary_prescaler(2)
///     .build()
/// {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.clock.bit_rate(60_000_000), 1_875_000);
/// ```
#[must_use]
#[derive(Debug)]
pub struct Builder {
    pins: PinMap,
    clock: ClockConfig,
    timing: Timing,
    poll_limit: u32,
}

impl Default for Builder {
    fn default() -> Self {
        let config = Config::default();
        Self {
            pins: config.pins,
            clock: config.clock,
            timing: config.timing,
            poll_limit: config.poll_limit,
        }
    }
}

impl Builder {
    /// Create a new Builder with the LCD board defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole pin map
    pub fn pins(mut self, pins: PinMap) -> Self {
        self.pins = pins;
        self
    }

    /// Set the serial clock pin
    pub fn sck(mut self, pin: RemappablePin) -> Self {
        self.pins.sck = pin;
        self
    }

    /// Set the serial data out pin
    pub fn sdo(mut self, pin: RemappablePin) -> Self {
        self.pins.sdo = pin;
        self
    }

    /// Set the serial data in pin
    pub fn sdi(mut self, pin: RemappablePin) -> Self {
        self.pins.sdi = pin;
        self
    }

    /// Set the chip-select pin
    pub fn chip_select(mut self, pin: Pin) -> Self {
        self.pins.chip_select = pin;
        self
    }

    /// Set the register-select pin
    pub fn register_select(mut self, pin: Pin) -> Self {
        self.pins.register_select = pin;
        self
    }

    /// Set clock polarity
    pub fn polarity(mut self, polarity: ClockPolarity) -> Self {
        self.clock.polarity = polarity;
        self
    }

    /// Set the edge on which output data changes
    pub fn output_edge(mut self, edge: OutputEdge) -> Self {
        self.clock.output_edge = edge;
        self
    }

    /// Set the input sample point
    pub fn sample_phase(mut self, phase: SamplePhase) -> Self {
        self.clock.sample_phase = phase;
        self
    }

    /// Set the primary prescaler
    pub fn primary_prescaler(mut self, prescaler: PrimaryPrescaler) -> Self {
        self.clock.primary = prescaler;
        self
    }

    /// Set the secondary prescaler ratio (1..=8)
    pub fn secondary_prescaler(mut self, ratio: u8) -> Self {
        self.clock.secondary = ratio;
        self
    }

    /// Set the latch settle interval in microseconds
    pub fn latch_us(mut self, us: u32) -> Self {
        self.timing.latch_us = us;
        self
    }

    /// Set the command settle interval in milliseconds
    pub fn command_ms(mut self, ms: u32) -> Self {
        self.timing.command_ms = ms;
        self
    }

    /// Set the completion poll bound (0 = unbounded)
    pub fn poll_limit(mut self, polls: u32) -> Self {
        self.poll_limit = polls;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// See [`Config::validate`].
    pub fn build(self) -> Result<Config, BuilderError> {
        let config = Config {
            pins: self.pins,
            clock: self.clock,
            timing: self.timing,
            poll_limit: self.poll_limit,
        };
        config.validate()?;
        Ok(config)
    }
}

//! Register-level access to the SPI module, pin select matrix and GPIO ports
//!
//! The driver never touches memory-mapped registers directly. It goes through
//! the [`Port`] trait, which exposes atomic reads and writes of named
//! [`Field`]s. A board binds it to real hardware with [`MmioPort`] (feature
//! `mmio`); tests bind it to an in-memory recorder.
//!
//! ## Field Layout
//!
//! [`Field::location`] describes where each field sits inside its 16-bit
//! register, following the dsPIC33E SPI/PPS layout:
//!
//! | Register  | Fields                                                       |
//! |-----------|--------------------------------------------------------------|
//! | SPIxSTAT  | SPIEN(15) SPISIDL(13) SRXMPT(5)                              |
//! | SPIxCON1  | DISSCK(12) DISSDO(11) MODE16(10) SMP(9) CKE(8) SSEN(7) CKP(6) MSTEN(5) SPRE(4:2) PPRE(1:0) |
//! | SPIxCON2  | FRMEN(15) SPIFSD(14) FRMPOL(13) FRMDLY(1) SPIBEN(0)          |
//! | RPINR22   | SCK2INR(14:8) SDI2R(6:0)                                     |
//! | RPORx     | RP(odd)R(13:8) RP(even)R(5:0)                                |
//!
//! Which RPORx holds a given pin varies across the family, so output select
//! registers are identified by pin number and the [`RegisterMap`] resolves
//! them. [`gp50x_output_select`] covers the pins used by the LCD board.

use core::fmt::Debug;

use crate::config::{GpioPort, Pin};

/// Output function code that routes SPI2 data out to a remappable pin
pub const SDO2_OUTPUT_FUNCTION: u16 = 0b00_1000;

/// Output function code that routes SPI2 clock out to a remappable pin
pub const SCK2_OUTPUT_FUNCTION: u16 = 0b00_1001;

/// A named hardware register field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// DISSCK: 1 disables the internal master clock
    ClockDisable,
    /// DISSDO: 1 disables the data out pin
    SdoDisable,
    /// MODE16: 1 for 16-bit words, 0 for bytes
    WordWide,
    /// SMP: 1 samples input at the end of the output time
    SampleAtEnd,
    /// CKE: 1 changes output on the idle-to-active clock edge
    OutputOnIdleToActive,
    /// SSEN: 1 enables the slave-select input
    SlaveSelectEnable,
    /// CKP: 1 idles the clock high
    ClockIdleHigh,
    /// MSTEN: 1 selects master mode
    MasterEnable,
    /// SPRE: secondary prescaler, 3 bits
    SecondaryPrescale,
    /// PPRE: primary prescaler, 2 bits
    PrimaryPrescale,
    /// FRMEN: framed SPI support
    FramedEnable,
    /// SPIFSD: 1 makes the frame sync pin an input
    FrameSyncInput,
    /// FRMPOL: 1 for active-high frame sync
    FramePolarityHigh,
    /// FRMDLY: 1 makes frame sync coincide with the first bit
    FrameDelay,
    /// SPIBEN: enhanced (FIFO) buffer mode
    EnhancedBuffer,
    /// SPISIDL: 1 stops the module in CPU idle
    StopInIdle,
    /// SPIEN: module enable
    Enable,
    /// SRXMPT: 1 while the receive FIFO is empty (read-only)
    RxBufferEmpty,
    /// SPIxBUF: transmit on write, receive on read
    Buffer,
    /// SDI2R: remappable input feeding SPI2 data in
    SdiInput,
    /// SCK2INR: remappable input feeding SPI2 clock in
    SckInput,
    /// RPnR: output function driven onto remappable pin `n`
    OutputFunction(u8),
    /// TRISx bit: 1 input, 0 output
    Direction(Pin),
    /// LATx bit: output latch
    Latch(Pin),
    /// ANSELx bit: 1 analog, 0 digital
    Analog(Pin),
}

/// A 16-bit hardware register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    /// SPIxSTAT
    SpiStat,
    /// SPIxCON1
    SpiCon1,
    /// SPIxCON2
    SpiCon2,
    /// SPIxBUF
    SpiBuf,
    /// RPINR22 (SPI2 clock and data inputs)
    Rpinr22,
    /// Output select register holding the RPnR field of pin `n`
    ///
    /// Two pins share each register; see [`gp50x_output_select`].
    OutputSelect(u8),
    /// TRISx
    Tris(GpioPort),
    /// LATx
    Lat(GpioPort),
    /// ANSELx
    Ansel(GpioPort),
}

/// Position of a field inside its register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLocation {
    /// Register holding the field
    pub register: Register,
    /// Bit offset of the least significant bit
    pub shift: u8,
    /// Width in bits
    pub width: u8,
}

impl FieldLocation {
    const fn new(register: Register, shift: u8, width: u8) -> Self {
        Self {
            register,
            shift,
            width,
        }
    }

    /// Unshifted mask covering `width` bits
    pub const fn mask(&self) -> u16 {
        if self.width >= 16 {
            u16::MAX
        } else {
            (1u16 << self.width) - 1
        }
    }

    /// Whether the field spans the whole register
    pub const fn is_whole_register(&self) -> bool {
        self.shift == 0 && self.width >= 16
    }

    /// Merge `value` into a register word
    pub const fn insert(&self, word: u16, value: u16) -> u16 {
        let mask = self.mask() << self.shift;
        (word & !mask) | ((value & self.mask()) << self.shift)
    }

    /// Extract the field from a register word
    pub const fn extract(&self, word: u16) -> u16 {
        (word >> self.shift) & self.mask()
    }
}

impl Field {
    /// Where this field lives
    pub const fn location(self) -> FieldLocation {
        use Register::*;
        match self {
            Self::ClockDisable => FieldLocation::new(SpiCon1, 12, 1),
            Self::SdoDisable => FieldLocation::new(SpiCon1, 11, 1),
            Self::WordWide => FieldLocation::new(SpiCon1, 10, 1),
            Self::SampleAtEnd => FieldLocation::new(SpiCon1, 9, 1),
            Self::OutputOnIdleToActive => FieldLocation::new(SpiCon1, 8, 1),
            Self::SlaveSelectEnable => FieldLocation::new(SpiCon1, 7, 1),
            Self::ClockIdleHigh => FieldLocation::new(SpiCon1, 6, 1),
            Self::MasterEnable => FieldLocation::new(SpiCon1, 5, 1),
            Self::SecondaryPrescale => FieldLocation::new(SpiCon1, 2, 3),
            Self::PrimaryPrescale => FieldLocation::new(SpiCon1, 0, 2),
            Self::FramedEnable => FieldLocation::new(SpiCon2, 15, 1),
            Self::FrameSyncInput => FieldLocation::new(SpiCon2, 14, 1),
            Self::FramePolarityHigh => FieldLocation::new(SpiCon2, 13, 1),
            Self::FrameDelay => FieldLocation::new(SpiCon2, 1, 1),
            Self::EnhancedBuffer => FieldLocation::new(SpiCon2, 0, 1),
            Self::Enable => FieldLocation::new(SpiStat, 15, 1),
            Self::StopInIdle => FieldLocation::new(SpiStat, 13, 1),
            Self::RxBufferEmpty => FieldLocation::new(SpiStat, 5, 1),
            Self::Buffer => FieldLocation::new(SpiBuf, 0, 16),
            Self::SckInput => FieldLocation::new(Rpinr22, 8, 7),
            Self::SdiInput => FieldLocation::new(Rpinr22, 0, 7),
            Self::OutputFunction(rp) => {
                FieldLocation::new(OutputSelect(rp), if rp % 2 == 0 { 0 } else { 8 }, 6)
            }
            Self::Direction(pin) => pin_bit(Tris(pin.port), pin),
            Self::Latch(pin) => pin_bit(Lat(pin.port), pin),
            Self::Analog(pin) => pin_bit(Ansel(pin.port), pin),
        }
    }
}

/// One port bit; indices past 15 resolve to an empty field
const fn pin_bit(register: Register, pin: Pin) -> FieldLocation {
    if pin.index < 16 {
        FieldLocation::new(register, pin.index, 1)
    } else {
        FieldLocation::new(register, 0, 0)
    }
}

/// RPORx index holding the output function of pin `rp` on the
/// dsPIC33EPxxxGP50x
///
/// Covers RPOR0..=RPOR4 (RP20, RP35..=RP43). Returns `None` for pins outside
/// that range, including input-only RPI pins.
///
/// ```
/// use charlcd_spi::port::gp50x_output_select;
///
/// assert_eq!(gp50x_output_select(42), Some(4));
/// assert_eq!(gp50x_output_select(43), Some(4));
/// assert_eq!(gp50x_output_select(44), None);
/// ```
pub const fn gp50x_output_select(rp: u8) -> Option<u8> {
    match rp {
        20 | 35 => Some(0),
        36..=43 => Some((rp - 34) / 2),
        _ => None,
    }
}

/// Capability to read and write named hardware fields
///
/// Each call is one atomic field access from the driver's point of view.
/// Implementations must not reorder writes.
pub trait Port {
    /// Error type for register access
    type Error: Debug;

    /// Write `value` into `field`, leaving the rest of its register untouched
    fn write_field(&mut self, field: Field, value: u16) -> Result<(), Self::Error>;

    /// Read the current value of `field`
    fn read_field(&mut self, field: Field) -> Result<u16, Self::Error>;

    /// Write a single-bit field
    fn set_flag(&mut self, field: Field, on: bool) -> Result<(), Self::Error> {
        self.write_field(field, u16::from(on))
    }

    /// Read a single-bit field
    fn flag(&mut self, field: Field) -> Result<bool, Self::Error> {
        Ok(self.read_field(field)? != 0)
    }
}

impl<P: Port + ?Sized> Port for &mut P {
    type Error = P::Error;

    fn write_field(&mut self, field: Field, value: u16) -> Result<(), Self::Error> {
        (**self).write_field(field, value)
    }

    fn read_field(&mut self, field: Field) -> Result<u16, Self::Error> {
        (**self).read_field(field)
    }
}

/// Resolves registers to their memory-mapped addresses
///
/// Addresses are device-specific; a board support crate provides them.
/// [`Register::OutputSelect`] names a pin, not an RPORx index, so the map
/// must translate it (for example with [`gp50x_output_select`]).
pub trait RegisterMap {
    /// Address of `register`
    fn address(&self, register: Register) -> usize;
}

#[cfg(feature = "mmio")]
pub use mmio::MmioPort;

#[cfg(feature = "mmio")]
#[allow(unsafe_code)]
mod mmio {
    use super::{Field, Port, RegisterMap};

    /// [`Port`] bound to volatile memory-mapped registers
    #[derive(Debug)]
    pub struct MmioPort<M> {
        map: M,
    }

    impl<M: RegisterMap> MmioPort<M> {
        /// Create a port over the registers described by `map`
        ///
        /// # Safety
        ///
        /// Every address `map` returns must be a valid, 2-byte aligned
        /// special function register that nothing else accesses while this
        /// port is alive.
        pub unsafe fn new(map: M) -> Self {
            Self { map }
        }

        /// Release the register map
        pub fn release(self) -> M {
            self.map
        }
    }

    impl<M: RegisterMap> Port for MmioPort<M> {
        type Error = core::convert::Infallible;

        fn write_field(&mut self, field: Field, value: u16) -> Result<(), Self::Error> {
            let location = field.location();
            if location.width == 0 {
                return Ok(());
            }
            let register = self.map.address(location.register) as *mut u16;
            // Whole-register fields (the SPI buffer) must not be read first:
            // reading SPIxBUF pops the receive FIFO.
            if location.is_whole_register() {
                unsafe { register.write_volatile(value) };
            } else {
                let word = unsafe { register.read_volatile() };
                unsafe { register.write_volatile(location.insert(word, value)) };
            }
            Ok(())
        }

        fn read_field(&mut self, field: Field) -> Result<u16, Self::Error> {
            let location = field.location();
            let register = self.map.address(location.register) as *const u16;
            let word = unsafe { register.read_volatile() };
            Ok(location.extract(word))
        }
    }

}

//! Recording test doubles shared by the unit tests

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorType as SpiErrorType, SpiBus};

use crate::config::Pin;
use crate::port::{Field, Port};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Write(Field, u16),
    Read(Field),
    Line(&'static str, bool),
    Transfer(u8),
    Flush,
    DelayNs(u32),
    DelayUs(u32),
    DelayMs(u32),
}

/// One byte as the controller saw it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub data: bool,
    pub byte: u8,
}

#[derive(Clone, Debug, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Everything except register reads: field writes, line levels,
    /// transfers and delays
    pub fn writes(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|event| !matches!(event, Event::Read(_)))
            .collect()
    }

    /// Decode transmitted bytes with the register-select level at send time
    pub fn frames(&self, rs: Pin) -> Vec<Frame> {
        let mut data = false;
        let mut frames = Vec::new();
        for event in self.events() {
            match event {
                Event::Write(Field::Latch(pin), level) if pin == rs => data = level != 0,
                Event::Line("rs", level) => data = level,
                Event::Write(Field::Buffer, byte) => frames.push(Frame {
                    data,
                    byte: byte as u8,
                }),
                Event::Transfer(byte) => frames.push(Frame { data, byte }),
                _ => {}
            }
        }
        frames
    }

    pub fn commands(&self, rs: Pin) -> Vec<u8> {
        self.frames(rs)
            .into_iter()
            .filter(|frame| !frame.data)
            .map(|frame| frame.byte)
            .collect()
    }

    pub fn data(&self, rs: Pin) -> Vec<u8> {
        self.frames(rs)
            .into_iter()
            .filter(|frame| frame.data)
            .map(|frame| frame.byte)
            .collect()
    }
}

/// In-memory register port
///
/// Each transmitted byte reports "receive empty" for `busy_polls` polls
/// before completing. A stuck port never completes.
#[derive(Debug)]
pub struct MockPort {
    pub log: Log,
    pub busy_polls: u32,
    pub stuck: bool,
    remaining: u32,
}

impl MockPort {
    pub fn new(log: Log) -> Self {
        Self {
            log,
            busy_polls: 0,
            stuck: false,
            remaining: 0,
        }
    }
}

impl Port for MockPort {
    type Error = Infallible;

    fn write_field(&mut self, field: Field, value: u16) -> Result<(), Self::Error> {
        if field == Field::Buffer {
            self.remaining = self.busy_polls;
        }
        self.log.push(Event::Write(field, value));
        Ok(())
    }

    fn read_field(&mut self, field: Field) -> Result<u16, Self::Error> {
        self.log.push(Event::Read(field));
        match field {
            Field::RxBufferEmpty if self.stuck => Ok(1),
            Field::RxBufferEmpty if self.remaining > 0 => {
                self.remaining -= 1;
                Ok(1)
            }
            Field::RxBufferEmpty => Ok(0),
            Field::Buffer => Ok(0xFF),
            _ => Ok(0),
        }
    }
}

#[derive(Debug)]
pub struct MockDelay {
    pub log: Log,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(Event::DelayNs(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayMs(ms));
    }
}

#[derive(Debug)]
pub struct MockSpi {
    pub log: Log,
}

impl SpiErrorType for MockSpi {
    type Error = Infallible;
}

impl SpiBus for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0xFF);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for word in words {
            self.log.push(Event::Transfer(*word));
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        read.fill(0xFF);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.write(words)?;
        words.fill(0xFF);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Flush);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockLine {
    pub name: &'static str,
    pub log: Log,
}

impl PinErrorType for MockLine {
    type Error = Infallible;
}

impl OutputPin for MockLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Line(self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Line(self.name, true));
        Ok(())
    }
}

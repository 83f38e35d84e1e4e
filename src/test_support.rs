//! Test doubles shared by the unit tests.

use core::cell::Cell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// A single shared line. Clones see the same level, so one clone can be the
/// transmitter's output pin and another the receiver's input pin.
#[derive(Debug, Clone, Default)]
pub(crate) struct Wire(Rc<Cell<bool>>);

impl Wire {
    pub(crate) fn set(&self, level: bool) {
        self.0.set(level);
    }

    pub(crate) fn toggle(&self) {
        self.0.set(!self.0.get());
    }

    pub(crate) fn level(&self) -> bool {
        self.0.get()
    }
}

impl ErrorType for Wire {
    type Error = Infallible;
}

impl OutputPin for Wire {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

impl InputPin for Wire {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

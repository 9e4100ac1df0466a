use crate::{
    microcontroller_src::peripherals::{Peripheral, PeripheralError},
    utils::auxiliary::{SharableRef, SharableRefExt},
};
use esp_idf_svc::hal::gpio::*;

/// Enums the different errors possible when working with the digital out
#[derive(Debug)]
pub enum DigitalOutError {
    CannotSetPinAsOutput,
    InvalidPeripheral(PeripheralError),
    InvalidPin,
}

/// Driver to handle a digital output for a particular pin
struct _DigitalOut<'a> {
    pin_driver: PinDriver<'a, AnyIOPin, Output>,
}

/// Driver to handle a digital output for a particular pin. Cloning shares
/// the underlying driver.
#[derive(Clone)]
pub struct DigitalOut<'a> {
    inner: SharableRef<_DigitalOut<'a>>,
}

impl<'a> _DigitalOut<'a> {
    fn new(per: Peripheral) -> Result<_DigitalOut<'a>, DigitalOutError> {
        let gpio = per
            .into_any_io_pin()
            .map_err(DigitalOutError::InvalidPeripheral)?;
        let pin_driver =
            PinDriver::output(gpio).map_err(|_| DigitalOutError::CannotSetPinAsOutput)?;

        Ok(_DigitalOut { pin_driver })
    }

    fn set_level(&mut self, level: Level) -> Result<(), DigitalOutError> {
        self.pin_driver
            .set_level(level)
            .map_err(|_| DigitalOutError::InvalidPin)
    }

    fn get_level(&self) -> Level {
        if self.pin_driver.is_set_high() {
            Level::High
        } else {
            Level::Low
        }
    }

    fn toggle(&mut self) -> Result<(), DigitalOutError> {
        if self.pin_driver.is_set_high() {
            self.set_level(Level::Low)
        } else {
            self.set_level(Level::High)
        }
    }
}

impl<'a> DigitalOut<'a> {
    /// Creates a new DigitalOut for a specified pin.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPeripheral`: If `per` cannot be turned into
    ///   an AnyIOPin, or the pin was already taken by another driver.
    /// - `DigitalOutError::CannotSetPinAsOutput`: If the pin does not support output.
    pub(crate) fn new(per: Peripheral) -> Result<DigitalOut<'a>, DigitalOutError> {
        Ok(DigitalOut {
            inner: SharableRef::new_sharable(_DigitalOut::new(per)?),
        })
    }

    /// Sets the pin level to either High or Low.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPin`: If the pin level cannot be set.
    pub fn set_level(&mut self, level: Level) -> Result<(), DigitalOutError> {
        self.inner.deref_mut().set_level(level)
    }

    /// Gets the level the pin is currently set to.
    pub fn get_level(&self) -> Level {
        self.inner.deref().get_level()
    }

    /// Sets the pin level to High.
    pub fn set_high(&mut self) -> Result<(), DigitalOutError> {
        self.set_level(Level::High)
    }

    /// Sets the pin level to Low.
    pub fn set_low(&mut self) -> Result<(), DigitalOutError> {
        self.set_level(Level::Low)
    }

    /// Changes the pin level, from High to Low or from Low to High.
    pub fn toggle(&mut self) -> Result<(), DigitalOutError> {
        self.inner.deref_mut().toggle()
    }
}

use crate::{
    microcontroller_src::peripherals::{Peripheral, PeripheralError},
    utils::{
        auxiliary::{SharableRef, SharableRefExt},
        error_text_parser::map_enable_disable_errors,
        notification::Notifier,
        pulse_counter_error::PulseCounterError,
        timer_driver::{TimerDriver, TimerDriverError},
    },
    InterruptDriver,
};
pub use esp_idf_svc::hal::gpio::InterruptType;
use esp_idf_svc::hal::gpio::*;
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

type AtomicInterruptUpdateCode = AtomicU8;

/// Enums the different errors possible when working with the digital in
#[derive(Debug)]
pub enum DigitalInError {
    CannotSetDebounceOnAnyEdgeInterruptType,
    CannotSetPinAsInput,
    CannotSetPullForPin,
    InvalidPeripheral(PeripheralError),
    InvalidPin,
    NoInterruptTypeSet,
    StateAlreadySet,
    TimerDriverError(TimerDriverError),
}

/// Driver for receiving digital inputs from a particular pin.
///
/// The pin ISR never runs user code: it stores an update code, wakes the
/// main loop up through the notifier, and the user callback then runs from
/// [crate::Microcontroller::update]. An update is therefore always handled
/// to completion before the polling code reads anything that depends on it.
///
/// With a debounce time set, an edge only counts if the pin still holds the
/// triggering level once the debounce timer expires. Edges closer together
/// than that window collapse into one detection.
struct _DigitalIn<'a> {
    pin_driver: PinDriver<'a, AnyIOPin, Input>,
    timer_driver: TimerDriver<'a>,
    interrupt_type: Option<InterruptType>,
    interrupt_update_code: Arc<AtomicInterruptUpdateCode>,
    user_callback: Box<dyn FnMut()>,
    debounce_micros: Option<u64>,
    notifier: Option<Notifier>,
}

/// Driver for receiving digital inputs from a particular pin. Cloning shares
/// the underlying driver.
#[derive(Clone)]
pub struct DigitalIn<'a> {
    inner: SharableRef<_DigitalIn<'a>>,
}

/// After an interrupt is triggered an InterruptUpdate will be set and handled
enum InterruptUpdate {
    EnableTimerDriver,
    ExecAndEnablePin,
    None,
    TimerReached,
}

impl InterruptUpdate {
    fn get_code(self) -> u8 {
        self as u8
    }

    fn get_atomic_code(self) -> AtomicInterruptUpdateCode {
        AtomicInterruptUpdateCode::new(self.get_code())
    }

    fn from_code(code: u8) -> Self {
        match code {
            x if x == Self::ExecAndEnablePin.get_code() => Self::ExecAndEnablePin,
            x if x == Self::EnableTimerDriver.get_code() => Self::EnableTimerDriver,
            x if x == Self::TimerReached.get_code() => Self::TimerReached,
            _ => Self::None,
        }
    }

    fn from_atomic_code(atomic_code: &Arc<AtomicInterruptUpdateCode>) -> Self {
        InterruptUpdate::from_code(atomic_code.load(Ordering::Acquire))
    }
}

impl<'a> _DigitalIn<'a> {
    /// Creates a new _DigitalIn for a pin. The pull is set to Up, since the
    /// usual wiring for a button input is active low against the internal
    /// pull-up resistor.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::InvalidPeripheral`: If `per` cannot be turned into
    ///   an AnyIOPin, or the pin was already taken by another driver.
    /// - `DigitalInError::CannotSetPinAsInput`: If the pin does not support input.
    /// - `DigitalInError::CannotSetPullForPin`: If the pull resistor cannot be set.
    fn new(
        timer_driver: TimerDriver<'a>,
        per: Peripheral,
        notifier: Option<Notifier>,
    ) -> Result<_DigitalIn<'a>, DigitalInError> {
        let gpio = per
            .into_any_io_pin()
            .map_err(DigitalInError::InvalidPeripheral)?;
        let pin_driver = PinDriver::input(gpio).map_err(|_| DigitalInError::CannotSetPinAsInput)?;

        let mut digital_in = _DigitalIn {
            pin_driver,
            timer_driver,
            interrupt_type: None,
            interrupt_update_code: Arc::from(InterruptUpdate::None.get_atomic_code()),
            user_callback: Box::new(|| {}),
            debounce_micros: None,
            notifier,
        };

        digital_in.set_pull(Pull::Up)?;
        Ok(digital_in)
    }

    /// Sets the pin pull either to Up or Down
    ///
    /// # Errors
    ///
    /// - `DigitalInError::CannotSetPullForPin`: If the pin driver does not
    ///   support the requested pull.
    fn set_pull(&mut self, pull_type: Pull) -> Result<(), DigitalInError> {
        self.pin_driver
            .set_pull(pull_type)
            .map_err(|_| DigitalInError::CannotSetPullForPin)
    }

    /// Changes the interrupt type, fails if a debounce time is set and the
    /// interrupt type is AnyEdge
    fn change_interrupt_type(
        &mut self,
        interrupt_type: InterruptType,
    ) -> Result<(), DigitalInError> {
        if let InterruptType::AnyEdge = interrupt_type {
            if self.debounce_micros.is_some() {
                return Err(DigitalInError::CannotSetDebounceOnAnyEdgeInterruptType);
            }
        }
        self.interrupt_type = Some(interrupt_type);
        self.pin_driver
            .set_interrupt_type(interrupt_type)
            .map_err(|_| DigitalInError::InvalidPin)
    }

    /// Arms the debounce timer so that, once it expires, the level is checked
    /// again. Returns the closure the pin ISR must run to start that timer.
    fn confirm_level_after(
        &mut self,
        time_micro: u64,
    ) -> impl FnMut() + Send + 'static {
        let interrupt_update_code_ref = self.interrupt_update_code.clone();
        let after_timer_cljr = move || {
            interrupt_update_code_ref
                .store(InterruptUpdate::TimerReached.get_code(), Ordering::SeqCst);
        };
        self.timer_driver.interrupt_after(time_micro, after_timer_cljr);

        let interrupt_update_code_ref = self.interrupt_update_code.clone();
        move || {
            interrupt_update_code_ref.store(
                InterruptUpdate::EnableTimerDriver.get_code(),
                Ordering::SeqCst,
            );
        }
    }

    /// Subscribes the function to the pin driver interrupt and enables it
    fn subscribe_trigger<F: FnMut() + Send + 'static>(
        &mut self,
        mut func: F,
    ) -> Result<(), DigitalInError> {
        match &self.notifier {
            Some(notifier) => {
                let notif = notifier.clone();
                let callback = move || {
                    func();
                    let _ = notif.notify();
                };
                unsafe {
                    self.pin_driver
                        .subscribe(callback)
                        .map_err(map_enable_disable_errors)?;
                };
            }
            None => unsafe {
                self.pin_driver
                    .subscribe(func)
                    .map_err(map_enable_disable_errors)?;
            },
        };

        self.pin_driver
            .enable_interrupt()
            .map_err(map_enable_disable_errors)
    }

    /// Sets the user callback to be executed after each interrupt of the
    /// received type. If a debounce time is set the level must hold for that
    /// long before the user callback is executed.
    fn trigger_on_interrupt<F: FnMut() + 'static>(
        &mut self,
        user_callback: F,
        interrupt_type: InterruptType,
    ) -> Result<(), DigitalInError> {
        self.change_interrupt_type(interrupt_type)?;
        self.user_callback = Box::new(user_callback);

        match self.debounce_micros {
            Some(debounce_micros) => {
                let starter = self.confirm_level_after(debounce_micros);
                self.subscribe_trigger(starter)
            }
            None => {
                let interrupt_update_code_ref = self.interrupt_update_code.clone();
                let callback = move || {
                    interrupt_update_code_ref.store(
                        InterruptUpdate::ExecAndEnablePin.get_code(),
                        Ordering::SeqCst,
                    );
                };
                self.subscribe_trigger(callback)
            }
        }
    }

    /// Checks if the level still corresponds to the set interrupt type. If it
    /// does the level did not change since before the debounce time, so the
    /// user callback is executed.
    fn timer_reached(&mut self) -> Result<(), DigitalInError> {
        let level = match self.interrupt_type {
            Some(InterruptType::PosEdge) => Level::High,
            Some(InterruptType::NegEdge) => Level::Low,
            Some(InterruptType::AnyEdge) => {
                Err(DigitalInError::CannotSetDebounceOnAnyEdgeInterruptType)?
            }
            Some(InterruptType::LowLevel) => Level::Low,
            Some(InterruptType::HighLevel) => Level::High,
            None => Err(DigitalInError::NoInterruptTypeSet)?,
        };

        if self.pin_driver.get_level() == level {
            (self.user_callback)();
        }

        self.pin_driver
            .enable_interrupt()
            .map_err(map_enable_disable_errors)
    }

    /// Handles the pending interrupt update, executing the user callback and
    /// reenabling the interrupt when necessary
    fn _update_interrupt(&mut self) -> Result<(), DigitalInError> {
        let interrupt_update = InterruptUpdate::from_atomic_code(&self.interrupt_update_code);
        self.interrupt_update_code
            .store(InterruptUpdate::None.get_code(), Ordering::SeqCst);

        match interrupt_update {
            InterruptUpdate::ExecAndEnablePin => {
                (self.user_callback)();
                self.pin_driver
                    .enable_interrupt()
                    .map_err(map_enable_disable_errors)
            }
            InterruptUpdate::EnableTimerDriver => self
                .timer_driver
                .enable()
                .map_err(DigitalInError::TimerDriverError),
            InterruptUpdate::TimerReached => self.timer_reached(),
            InterruptUpdate::None => Ok(()),
        }
    }

    fn get_level(&self) -> Level {
        self.pin_driver.get_level()
    }

    /// Sets the debounce time in microseconds. Edges closer together than
    /// this window are detected as a single pulse. Does not work with
    /// InterruptType::AnyEdge, an error will be returned.
    fn set_debounce(&mut self, time_micro: u64) -> Result<(), DigitalInError> {
        match self.interrupt_type {
            Some(InterruptType::AnyEdge) => {
                Err(DigitalInError::CannotSetDebounceOnAnyEdgeInterruptType)?
            }
            _ => self.debounce_micros = Some(time_micro),
        }
        Ok(())
    }
}

impl<'a> DigitalIn<'a> {
    /// Creates a new DigitalIn for a pin, with the pull set to Up.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::InvalidPeripheral`: If `per` cannot be turned into
    ///   an AnyIOPin, or the pin was already taken by another driver.
    /// - `DigitalInError::CannotSetPinAsInput`: If the pin does not support input.
    /// - `DigitalInError::CannotSetPullForPin`: If the pull resistor cannot be set.
    pub(crate) fn new(
        timer_driver: TimerDriver<'a>,
        per: Peripheral,
        notifier: Option<Notifier>,
    ) -> Result<DigitalIn<'a>, DigitalInError> {
        Ok(DigitalIn {
            inner: SharableRef::new_sharable(_DigitalIn::new(timer_driver, per, notifier)?),
        })
    }

    /// See [_DigitalIn::set_pull]
    pub fn set_pull(&mut self, pull_type: Pull) -> Result<(), DigitalInError> {
        self.inner.deref_mut().set_pull(pull_type)
    }

    /// See [_DigitalIn::trigger_on_interrupt]
    pub fn trigger_on_interrupt<F: FnMut() + 'static>(
        &mut self,
        user_callback: F,
        interrupt_type: InterruptType,
    ) -> Result<(), DigitalInError> {
        self.inner
            .deref_mut()
            .trigger_on_interrupt(user_callback, interrupt_type)
    }

    /// See [_DigitalIn::set_debounce]
    pub fn set_debounce(&mut self, time_micro: u64) -> Result<(), DigitalInError> {
        self.inner.deref_mut().set_debounce(time_micro)
    }

    /// Gets the current pin level
    pub fn get_level(&self) -> Level {
        self.inner.deref().get_level()
    }

    /// Verifies if the pin level is High
    pub fn is_high(&self) -> bool {
        self.get_level() == Level::High
    }

    /// Verifies if the pin level is Low
    pub fn is_low(&self) -> bool {
        self.get_level() == Level::Low
    }
}

impl<'a> InterruptDriver for DigitalIn<'a> {
    fn update_interrupt(&mut self) -> Result<(), PulseCounterError> {
        self.inner
            .deref_mut()
            ._update_interrupt()
            .map_err(PulseCounterError::DigitalIn)
    }
}

impl From<TimerDriverError> for DigitalInError {
    fn from(value: TimerDriverError) -> Self {
        DigitalInError::TimerDriverError(value)
    }
}

#[cfg(test)]
mod tests {
    use super::InterruptUpdate;

    #[test]
    fn update_codes_round_trip() {
        for code in [
            InterruptUpdate::EnableTimerDriver.get_code(),
            InterruptUpdate::ExecAndEnablePin.get_code(),
            InterruptUpdate::TimerReached.get_code(),
            InterruptUpdate::None.get_code(),
        ] {
            assert_eq!(InterruptUpdate::from_code(code).get_code(), code);
        }
    }

    #[test]
    fn unknown_codes_map_to_none() {
        let update = InterruptUpdate::from_code(u8::MAX);
        assert_eq!(update.get_code(), InterruptUpdate::None.get_code());
    }
}

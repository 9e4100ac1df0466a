use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use esp_idf_svc::hal::timer;

use crate::{
    microcontroller_src::peripherals::Peripheral,
    utils::{
        auxiliary::{SharableRef, SharableRefExt},
        notification::Notifier,
        pulse_counter_error::PulseCounterError,
    },
    InterruptDriver,
};

const MICRO_IN_SEC: u64 = 1_000_000;

#[derive(Debug, Clone, Copy)]
pub enum TimerDriverError {
    CannotSetTimerCounter,
    CouldNotSetTimer,
    InvalidTimer,
    NoTimersAvailable,
    SubscriptionError,
}

/// One-shot timer over one of the esp32C6 timer groups. A single deferred
/// callback can be armed with [TimerDriver::interrupt_after]; once enabled,
/// the hardware alarm ISR records an update and the callback runs on the
/// next [crate::Microcontroller::update].
///
/// Cloning shares the same underlying timer, so the [crate::Microcontroller]
/// can keep a handle for updates while a driver keeps another to arm it.
#[derive(Clone)]
pub struct TimerDriver<'a> {
    inner: SharableRef<_TimerDriver<'a>>,
}

struct _TimerDriver<'a> {
    driver: timer::TimerDriver<'a>,
    interrupt_update: InterruptUpdate,
    delay_ticks: u64,
    callback: Box<dyn FnMut()>,
}

/// After the alarm ISR fires an InterruptUpdate will be set and handled
#[derive(Clone)]
struct InterruptUpdate {
    update: Arc<AtomicBool>,
}

impl InterruptUpdate {
    fn new() -> InterruptUpdate {
        InterruptUpdate {
            update: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Checks for an update
    fn any_updates(&self) -> bool {
        self.update.load(Ordering::Relaxed)
    }

    /// Sets an update on the interrupt update
    fn new_update(&self) {
        self.update.store(true, Ordering::Relaxed);
    }

    /// Removes update
    fn handling_update(&self) {
        self.update.store(false, Ordering::Relaxed);
    }

    /// If there are any updates it consumes them
    fn handle_any_updates(&self) -> bool {
        if self.any_updates() {
            self.handling_update();
            true
        } else {
            false
        }
    }
}

impl<'a> _TimerDriver<'a> {
    fn new(timer: Peripheral, notifier: Notifier) -> Result<_TimerDriver<'a>, TimerDriverError> {
        let driver = match timer {
            Peripheral::Timer(timer_num) => match timer_num {
                0 => timer::TimerDriver::new(
                    unsafe { timer::TIMER00::new() },
                    &timer::TimerConfig::new(),
                ),
                1 => timer::TimerDriver::new(
                    unsafe { timer::TIMER10::new() },
                    &timer::TimerConfig::new(),
                ),
                _ => return Err(TimerDriverError::InvalidTimer),
            }
            .map_err(|_| TimerDriverError::InvalidTimer)?,
            _ => return Err(TimerDriverError::InvalidTimer),
        };

        let mut timer = _TimerDriver {
            driver,
            interrupt_update: InterruptUpdate::new(),
            delay_ticks: 0,
            callback: Box::new(|| {}),
        };
        timer.set_interrupt_update_callback(notifier).map(|_| timer)
    }

    /// Subscribes the alarm ISR, which only flags the update and wakes up the
    /// main loop.
    fn set_interrupt_update_callback(
        &mut self,
        notifier: Notifier,
    ) -> Result<(), TimerDriverError> {
        let interrupt_update_ref = self.interrupt_update.clone();
        unsafe {
            let alarm_callback = move || {
                interrupt_update_ref.new_update();
                let _ = notifier.notify();
            };

            self.driver
                .subscribe(alarm_callback)
                .map_err(|_| TimerDriverError::SubscriptionError)
        }
    }

    /// Sets the callback to trigger once, "micro_seconds" after enable() is
    /// called. Arming again replaces the previous callback. After it has
    /// triggered it can be rearmed by calling enable() once more.
    fn interrupt_after<F: FnMut() + 'static>(&mut self, micro_seconds: u64, callback: F) {
        self.delay_ticks = self.micro_to_counter(micro_seconds);
        self.callback = Box::new(callback);
    }

    /// Transforms microseconds to the timer tick_hz
    fn micro_to_counter(&self, micro_seconds: u64) -> u64 {
        micro_seconds * self.driver.tick_hz() / MICRO_IN_SEC
    }

    /// Starts the countdown towards the armed callback.
    fn enable(&mut self) -> Result<(), TimerDriverError> {
        self.driver
            .set_counter(0)
            .map_err(|_| TimerDriverError::CannotSetTimerCounter)?;
        self.driver
            .set_alarm(self.delay_ticks)
            .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
        self.driver
            .enable_interrupt()
            .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
        self.driver
            .enable_alarm(true)
            .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
        self.driver
            .enable(true)
            .map_err(|_| TimerDriverError::CouldNotSetTimer)
    }

    /// Stops the countdown and discards a pending update, if any.
    fn disable(&mut self) -> Result<(), TimerDriverError> {
        self.driver
            .enable(false)
            .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
        self.driver
            .enable_alarm(false)
            .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
        self.driver
            .disable_interrupt()
            .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
        self.interrupt_update.handling_update();
        Ok(())
    }

    /// If the alarm fired since the last update, stops the timer and executes
    /// the armed callback in the main-loop context.
    fn _update_interrupt(&mut self) -> Result<(), TimerDriverError> {
        if self.interrupt_update.handle_any_updates() {
            self.disable()?;
            (self.callback)();
        }
        Ok(())
    }
}

impl<'a> TimerDriver<'a> {
    pub fn new(timer: Peripheral, notifier: Notifier) -> Result<TimerDriver<'a>, TimerDriverError> {
        Ok(TimerDriver {
            inner: SharableRef::new_sharable(_TimerDriver::new(timer, notifier)?),
        })
    }

    /// See [_TimerDriver::interrupt_after]
    pub fn interrupt_after<F: FnMut() + 'static>(&mut self, micro_seconds: u64, callback: F) {
        self.inner.deref_mut().interrupt_after(micro_seconds, callback)
    }

    /// See [_TimerDriver::enable]
    pub fn enable(&mut self) -> Result<(), TimerDriverError> {
        self.inner.deref_mut().enable()
    }

    /// See [_TimerDriver::disable]
    pub fn disable(&mut self) -> Result<(), TimerDriverError> {
        self.inner.deref_mut().disable()
    }
}

impl<'a> InterruptDriver for TimerDriver<'a> {
    fn update_interrupt(&mut self) -> Result<(), PulseCounterError> {
        self.inner
            .deref_mut()
            ._update_interrupt()
            .map_err(PulseCounterError::TimerDriver)
    }
}

#[cfg(test)]
mod tests {
    use super::InterruptUpdate;

    #[test]
    fn updates_start_clear() {
        let update = InterruptUpdate::new();
        assert!(!update.any_updates());
        assert!(!update.handle_any_updates());
    }

    #[test]
    fn handling_consumes_the_update() {
        let update = InterruptUpdate::new();
        update.new_update();
        assert!(update.handle_any_updates());
        assert!(!update.any_updates());
    }

    #[test]
    fn clones_share_the_flag() {
        let update = InterruptUpdate::new();
        update.clone().new_update();
        assert!(update.handle_any_updates());
    }
}

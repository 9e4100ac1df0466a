use esp_idf_svc::hal::delay::FreeRtos;

use crate::{
    gpio::{DigitalIn, DigitalInError, DigitalOut, DigitalOutError},
    microcontroller_src::{interrupt_driver::InterruptDriver, peripherals::*},
    serial::{UARTError, UART},
    utils::{
        auxiliary::{SharableRef, SharableRefExt},
        notification::Notification,
        pulse_counter_error::PulseCounterError,
        timer_driver::{TimerDriver, TimerDriverError},
    },
};

/// Primary abstraction for interacting with the microcontroller, providing
/// access to the peripherals and the drivers configured on them.
///
/// Interrupt callbacks set up through the drivers do not run inside the ISR:
/// they are deferred until [Microcontroller::update] or
/// [Microcontroller::wait_for_updates] is called from the main loop, and run
/// to completion there before control returns to the caller.
///
/// - `peripherals`: The hardware peripherals still available for new drivers.
/// - `timer_drivers`: Handles to the created timer drivers, kept for updates.
/// - `interrupt_drivers`: The drivers with deferred interrupt work to handle.
/// - `loop_timer`: Timer reserved for bounded [Microcontroller::wait_for_updates].
/// - `notification`: Wake-up channel the ISRs signal after recording work.
pub struct Microcontroller<'a> {
    peripherals: Peripherals,
    timer_drivers: Vec<TimerDriver<'a>>,
    interrupt_drivers: Vec<Box<dyn InterruptDriver + 'a>>,
    loop_timer: Option<TimerDriver<'a>>,
    notification: Notification,
}

impl<'a> Microcontroller<'a> {
    /// Creates a new Microcontroller instance, linking the esp-idf runtime
    /// patches and installing the esp logger behind the `log` facade.
    pub fn new() -> Self {
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();

        Microcontroller {
            peripherals: Peripherals::new(),
            timer_drivers: vec![],
            interrupt_drivers: vec![],
            loop_timer: None,
            notification: Notification::new(),
        }
    }

    /// Takes the next unused timer group peripheral.
    fn take_next_timer(&mut self) -> Result<Peripheral, TimerDriverError> {
        let timer_num = self.timer_drivers.len() + usize::from(self.loop_timer.is_some());
        match self.peripherals.get_timer(timer_num) {
            Peripheral::None => Err(TimerDriverError::NoTimersAvailable),
            timer => Ok(timer),
        }
    }

    /// Creates a TimerDriver on the next free timer group. Each driver owns
    /// its timer group, so on the esp32C6 at most two can exist at a time,
    /// one of which is reserved once a bounded wait is used.
    ///
    /// # Errors
    ///
    /// - `TimerDriverError::NoTimersAvailable`: If every timer group is
    ///   already driving something.
    pub fn get_timer_driver(&mut self) -> Result<TimerDriver<'a>, TimerDriverError> {
        let timer = self.take_next_timer()?;
        let timer_driver = TimerDriver::new(timer, self.notification.notifier())?;
        self.timer_drivers.push(timer_driver.clone());
        Ok(timer_driver)
    }

    /// Creates a DigitalIn on the pin with number 'pin_num', with the pull
    /// set to Up. The driver gets its own timer for debouncing and is
    /// registered so its deferred interrupt work runs on updates.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::TimerDriverError`: If no timer group is free for
    ///   the debounce timer.
    /// - `DigitalInError::InvalidPeripheral`: If the pin does not exist or
    ///   was already taken.
    /// - `DigitalInError::CannotSetPinAsInput`: If the pin does not support input.
    pub fn set_pin_as_digital_in(
        &mut self,
        pin_num: usize,
    ) -> Result<DigitalIn<'a>, DigitalInError> {
        let timer_driver = self.get_timer_driver()?;
        let pin_peripheral = self.peripherals.get_digital_pin(pin_num);
        let dgin = DigitalIn::new(
            timer_driver,
            pin_peripheral,
            Some(self.notification.notifier()),
        )?;
        self.interrupt_drivers.push(Box::new(dgin.clone()));
        Ok(dgin)
    }

    /// Creates a DigitalOut on the pin with number 'pin_num'.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPeripheral`: If the pin does not exist or
    ///   was already taken.
    /// - `DigitalOutError::CannotSetPinAsOutput`: If the pin does not support output.
    pub fn set_pin_as_digital_out(
        &mut self,
        pin_num: usize,
    ) -> Result<DigitalOut<'a>, DigitalOutError> {
        let pin_peripheral = self.peripherals.get_digital_pin(pin_num);
        DigitalOut::new(pin_peripheral)
    }

    /// Configures the received pins as a UART with a default configuration:
    /// a baudrate of 115200.
    ///
    /// # Arguments
    ///
    /// - `tx_pin`: The pin number to be used for transmission (TX).
    /// - `rx_pin`: The pin number to be used for reception (RX).
    /// - `uart_num`: The UART peripheral number to be configured.
    pub fn set_pins_for_default_uart(
        &mut self,
        tx_pin: usize,
        rx_pin: usize,
        uart_num: usize,
    ) -> Result<UART<'a>, UARTError> {
        let tx_peripheral = self.peripherals.get_digital_pin(tx_pin);
        let rx_peripheral = self.peripherals.get_digital_pin(rx_pin);
        let uart_peripheral = self.peripherals.get_uart(uart_num);

        UART::default(tx_peripheral, rx_peripheral, uart_peripheral)
    }

    /// Configures the received pins as a UART with the received baudrate.
    pub fn set_pins_for_uart(
        &mut self,
        tx_pin: usize,
        rx_pin: usize,
        uart_num: usize,
        baudrate: u32,
    ) -> Result<UART<'a>, UARTError> {
        let tx_peripheral = self.peripherals.get_digital_pin(tx_pin);
        let rx_peripheral = self.peripherals.get_digital_pin(rx_pin);
        let uart_peripheral = self.peripherals.get_uart(uart_num);

        UART::new(tx_peripheral, rx_peripheral, uart_peripheral, baudrate)
    }

    /// Handles all the deferred interrupt work recorded since the last call,
    /// running user callbacks to completion before returning.
    pub fn update(&mut self) -> Result<(), PulseCounterError> {
        // timer drivers go first since their callbacks may queue updates on the other drivers
        for timer_driver in &mut self.timer_drivers {
            timer_driver.update_interrupt()?;
        }
        if let Some(loop_timer) = &mut self.loop_timer {
            loop_timer.update_interrupt()?;
        }
        for driver in &mut self.interrupt_drivers {
            driver.update_interrupt()?;
        }
        Ok(())
    }

    fn wait_for_updates_indefinitely(&mut self) -> Result<(), PulseCounterError> {
        loop {
            self.notification.blocking_wait();
            self.update()?;
        }
    }

    fn wait_for_updates_until(&mut self, milliseconds: u32) -> Result<(), PulseCounterError> {
        if self.loop_timer.is_none() {
            let timer = self.take_next_timer()?;
            self.loop_timer
                .replace(TimerDriver::new(timer, self.notification.notifier())?);
        }

        let timed_out = SharableRef::new_sharable(false);
        if let Some(loop_timer) = &mut self.loop_timer {
            let mut timed_out_ref = timed_out.clone();
            loop_timer.interrupt_after(milliseconds as u64 * 1000, move || {
                *timed_out_ref.deref_mut() = true
            });
            loop_timer.enable()?;
        }

        while !*timed_out.deref() {
            self.notification.blocking_wait();
            self.update()?;
        }
        Ok(())
    }

    /// Blocks until interrupt work arrives, handling it as it does. With
    /// `Some(milliseconds)` the wait returns after at most that long, so the
    /// caller can poll shared state between waits; with `None` it only
    /// returns on error.
    pub fn wait_for_updates(&mut self, milliseconds: Option<u32>) -> Result<(), PulseCounterError> {
        match milliseconds {
            Some(millis) => self.wait_for_updates_until(millis),
            None => self.wait_for_updates_indefinitely(),
        }
    }

    /// Puts the main task to sleep for the received milliseconds.
    pub fn sleep(&self, milliseconds: u32) {
        FreeRtos::delay_ms(milliseconds)
    }
}

impl<'a> Default for Microcontroller<'a> {
    fn default() -> Self {
        Self::new()
    }
}

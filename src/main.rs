//! Counts falling edges on GPIO18, wired to a button against the internal
//! pull-up resistor, and drives the indicator LED on GPIO13 high once more
//! than 4 pulses were counted. Diagnostic text goes out over UART1.
//!
//! The interrupt callback only increments the shared counter. Reporting
//! happens in the polling loop, since serial writes inside an interrupt
//! context are slow enough to lose pulses that arrive close together.

use pulsecounter::{
    gpio::InterruptType, pulse_counter_error::PulseCounterError, Microcontroller, PulseCounter,
};

const BUTTON_PIN: usize = 18;
const LED_PIN: usize = 13;
const UART_TX_PIN: usize = 4;
const UART_RX_PIN: usize = 5;
const UART_NUM: usize = 1;

const PULSE_THRESHOLD: u32 = 4;
const DEBOUNCE_MICROS: u64 = 200 * 1000;
const POLL_PERIOD_MS: u32 = 100;

fn main() -> Result<(), PulseCounterError> {
    let mut micro = Microcontroller::new();
    let mut button = micro.set_pin_as_digital_in(BUTTON_PIN)?;
    let mut led = micro.set_pin_as_digital_out(LED_PIN)?;
    let mut serial = micro.set_pins_for_default_uart(UART_TX_PIN, UART_RX_PIN, UART_NUM)?;

    let counter = PulseCounter::new(PULSE_THRESHOLD);
    let isr_counter = counter.clone();

    button.set_debounce(DEBOUNCE_MICROS)?;
    button.trigger_on_interrupt(move || isr_counter.increment(), InterruptType::NegEdge)?;

    led.set_low()?;
    let mut last_reported = 0;

    loop {
        micro.wait_for_updates(Some(POLL_PERIOD_MS))?;

        let pulses = counter.count();
        if pulses != last_reported {
            last_reported = pulses;
            log::info!("pulse count {}", pulses);
            serial.write_str(&format!("pulse count {}\r\n", pulses))?;
        }

        if counter.threshold_reached() {
            led.set_high()?;
        }
    }
}

use esp_idf_svc::hal::gpio::*;
use std::mem;

const PIN_COUNT: usize = 24;
const TIMER_COUNT: usize = 2;
const UART_COUNT: usize = 2;
const DIGITAL_PIN_BOUNDS: (usize, usize) = (0, 23);
const TIMER_BOUNDS: (usize, usize) = (0, 1);
const UART_BOUNDS: (usize, usize) = (0, 1);

#[derive(Debug)]
pub enum PeripheralError {
    NotAPin,
}

/// Represents one esp32 peripheral, allowing it to be turned into the
/// concrete esp-idf-svc type when a driver takes ownership of it.
#[derive(Debug, Default)]
pub enum Peripheral {
    Pin(u8),
    Timer(u8),
    Uart(u8),
    #[default]
    None,
}

impl Peripheral {
    fn take(&mut self) -> Peripheral {
        mem::take(self)
    }

    /// If the Peripheral is a Pin returns the corresponding AnyIOPin.
    /// If not it returns PeripheralError::NotAPin
    pub fn into_any_io_pin(self) -> Result<AnyIOPin, PeripheralError> {
        let pin = match self {
            Peripheral::Pin(pin_num) => match pin_num {
                0 => unsafe { Gpio0::new().downgrade() },
                1 => unsafe { Gpio1::new().downgrade() },
                2 => unsafe { Gpio2::new().downgrade() },
                3 => unsafe { Gpio3::new().downgrade() },
                4 => unsafe { Gpio4::new().downgrade() },
                5 => unsafe { Gpio5::new().downgrade() },
                6 => unsafe { Gpio6::new().downgrade() },
                7 => unsafe { Gpio7::new().downgrade() },
                8 => unsafe { Gpio8::new().downgrade() },
                9 => unsafe { Gpio9::new().downgrade() },
                10 => unsafe { Gpio10::new().downgrade() },
                11 => unsafe { Gpio11::new().downgrade() },
                12 => unsafe { Gpio12::new().downgrade() },
                13 => unsafe { Gpio13::new().downgrade() },
                15 => unsafe { Gpio15::new().downgrade() },
                16 => unsafe { Gpio16::new().downgrade() },
                17 => unsafe { Gpio17::new().downgrade() },
                18 => unsafe { Gpio18::new().downgrade() },
                19 => unsafe { Gpio19::new().downgrade() },
                20 => unsafe { Gpio20::new().downgrade() },
                21 => unsafe { Gpio21::new().downgrade() },
                22 => unsafe { Gpio22::new().downgrade() },
                23 => unsafe { Gpio23::new().downgrade() },
                _ => return Err(PeripheralError::NotAPin),
            },
            _ => return Err(PeripheralError::NotAPin),
        };
        Ok(pin)
    }
}

/// Tracks the peripherals of the esp32C6 that this crate uses. Each
/// peripheral can be obtained exactly once: subsequent gets of the same
/// peripheral return Peripheral::None, so two drivers can never end up
/// driving the same pin, timer or uart.
pub struct Peripherals {
    pins: [Peripheral; PIN_COUNT],
    timers: [Peripheral; TIMER_COUNT],
    uarts: [Peripheral; UART_COUNT],
}

impl Peripherals {
    pub fn new() -> Peripherals {
        let mut pins: [Peripheral; PIN_COUNT] = Default::default();
        for (pin_num, pin) in pins.iter_mut().enumerate() {
            // GPIO14 does not exist on the C6
            if pin_num != 14 {
                *pin = Peripheral::Pin(pin_num as u8);
            }
        }
        Peripherals {
            pins,
            timers: [Peripheral::Timer(0), Peripheral::Timer(1)],
            uarts: [Peripheral::Uart(0), Peripheral::Uart(1)],
        }
    }

    pub fn get_digital_pin(&mut self, pin_num: usize) -> Peripheral {
        if pin_num >= DIGITAL_PIN_BOUNDS.0 && pin_num <= DIGITAL_PIN_BOUNDS.1 {
            return self.pins[pin_num].take();
        }
        Peripheral::None
    }

    pub fn get_timer(&mut self, timer_num: usize) -> Peripheral {
        if timer_num >= TIMER_BOUNDS.0 && timer_num <= TIMER_BOUNDS.1 {
            return self.timers[timer_num].take();
        }
        Peripheral::None
    }

    pub fn get_uart(&mut self, uart_num: usize) -> Peripheral {
        if uart_num >= UART_BOUNDS.0 && uart_num <= UART_BOUNDS.1 {
            return self.uarts[uart_num].take();
        }
        Peripheral::None
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_can_only_be_taken_once() {
        let mut peripherals = Peripherals::new();
        assert!(matches!(peripherals.get_digital_pin(18), Peripheral::Pin(18)));
        assert!(matches!(peripherals.get_digital_pin(18), Peripheral::None));
    }

    #[test]
    fn out_of_bounds_pin_is_none() {
        let mut peripherals = Peripherals::new();
        assert!(matches!(peripherals.get_digital_pin(24), Peripheral::None));
    }

    #[test]
    fn gpio14_does_not_exist() {
        let mut peripherals = Peripherals::new();
        assert!(matches!(peripherals.get_digital_pin(14), Peripheral::None));
    }

    #[test]
    fn timers_and_uarts_can_only_be_taken_once() {
        let mut peripherals = Peripherals::new();
        assert!(matches!(peripherals.get_timer(0), Peripheral::Timer(0)));
        assert!(matches!(peripherals.get_timer(0), Peripheral::None));
        assert!(matches!(peripherals.get_uart(1), Peripheral::Uart(1)));
        assert!(matches!(peripherals.get_uart(1), Peripheral::None));
        assert!(matches!(peripherals.get_uart(2), Peripheral::None));
    }

    #[test]
    fn non_pin_peripherals_cannot_become_io_pins() {
        let mut peripherals = Peripherals::new();
        let timer = peripherals.get_timer(0);
        assert!(matches!(
            timer.into_any_io_pin(),
            Err(PeripheralError::NotAPin)
        ));
    }
}

use crate::microcontroller_src::peripherals::Peripheral;
use esp_idf_svc::hal::{
    gpio::{Gpio0, Gpio1},
    uart::{config, UartDriver, UART0, UART1},
    units::Hertz,
};

const DEFAULT_BAUDRATE: u32 = 115_200;

#[derive(Debug)]
pub enum UARTError {
    CannotStartDriver,
    InvalidPin,
    InvalidUartNumber,
    WriteError,
}

/// Write side of a uart serial port, used for diagnostic text. Writing
/// belongs in the polling loop: doing it from an interrupt callback would be
/// slow enough to lose pulses that arrive close together.
pub struct UART<'a> {
    driver: UartDriver<'a>,
}

impl<'a> UART<'a> {
    /// Creates a new UART on the received tx and rx pins.
    ///
    /// # Errors
    ///
    /// - `UARTError::InvalidPin`: If one of the pin peripherals cannot be
    ///   turned into an AnyIOPin, or was already taken by another driver.
    /// - `UARTError::InvalidUartNumber`: If the uart peripheral was already
    ///   taken or does not exist.
    /// - `UARTError::CannotStartDriver`: If the esp uart driver cannot be started.
    pub(crate) fn new(
        tx: Peripheral,
        rx: Peripheral,
        uart_peripheral: Peripheral,
        baudrate: u32,
    ) -> Result<UART<'a>, UARTError> {
        let tx_peripheral = tx.into_any_io_pin().map_err(|_| UARTError::InvalidPin)?;
        let rx_peripheral = rx.into_any_io_pin().map_err(|_| UARTError::InvalidPin)?;
        let config = config::Config::new().baudrate(Hertz(baudrate));

        let driver = match uart_peripheral {
            Peripheral::Uart(0) => UartDriver::new(
                unsafe { UART0::new() },
                tx_peripheral,
                rx_peripheral,
                Option::<Gpio0>::None,
                Option::<Gpio1>::None,
                &config,
            )
            .map_err(|_| UARTError::CannotStartDriver)?,
            Peripheral::Uart(1) => UartDriver::new(
                unsafe { UART1::new() },
                tx_peripheral,
                rx_peripheral,
                Option::<Gpio0>::None,
                Option::<Gpio1>::None,
                &config,
            )
            .map_err(|_| UARTError::CannotStartDriver)?,
            _ => return Err(UARTError::InvalidUartNumber),
        };

        Ok(UART { driver })
    }

    /// Creates a new UART on the received tx and rx pins with a baudrate of
    /// 115200.
    pub(crate) fn default(
        tx: Peripheral,
        rx: Peripheral,
        uart_peripheral: Peripheral,
    ) -> Result<UART<'a>, UARTError> {
        Self::new(tx, rx, uart_peripheral, DEFAULT_BAUDRATE)
    }

    /// Writes the bytes on the serial port, returning how many were written.
    pub fn write(&mut self, bytes_to_write: &[u8]) -> Result<usize, UARTError> {
        self.driver
            .write(bytes_to_write)
            .map_err(|_| UARTError::WriteError)
    }

    /// Writes the text on the serial port.
    pub fn write_str(&mut self, text: &str) -> Result<usize, UARTError> {
        self.write(text.as_bytes())
    }
}

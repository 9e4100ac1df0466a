use crate::{
    gpio::{DigitalInError, DigitalOutError},
    serial::UARTError,
    utils::timer_driver::TimerDriverError,
};

/// Umbrella error for the crate, so binaries can bubble any driver failure
/// up with `?`.
#[derive(Debug)]
pub enum PulseCounterError {
    DigitalIn(DigitalInError),
    DigitalOut(DigitalOutError),
    TimerDriver(TimerDriverError),
    Uart(UARTError),
}

impl From<DigitalInError> for PulseCounterError {
    fn from(value: DigitalInError) -> Self {
        PulseCounterError::DigitalIn(value)
    }
}

impl From<DigitalOutError> for PulseCounterError {
    fn from(value: DigitalOutError) -> Self {
        PulseCounterError::DigitalOut(value)
    }
}

impl From<TimerDriverError> for PulseCounterError {
    fn from(value: TimerDriverError) -> Self {
        PulseCounterError::TimerDriver(value)
    }
}

impl From<UARTError> for PulseCounterError {
    fn from(value: UARTError) -> Self {
        PulseCounterError::Uart(value)
    }
}

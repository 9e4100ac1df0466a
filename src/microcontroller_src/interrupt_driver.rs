use crate::utils::pulse_counter_error::PulseCounterError;

/// Drivers that defer interrupt work into the main-loop context. The ISR only
/// records what happened; [InterruptDriver::update_interrupt] runs the pending
/// work when [crate::Microcontroller::update] is called.
pub trait InterruptDriver {
    fn update_interrupt(&mut self) -> Result<(), PulseCounterError>;
}

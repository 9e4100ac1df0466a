mod microcontroller_src;
mod utils;

pub mod counter;
pub mod gpio;
pub mod serial;

pub(crate) use microcontroller_src::interrupt_driver::InterruptDriver;

pub use counter::PulseCounter;
pub use microcontroller_src::Microcontroller;
pub use utils::pulse_counter_error;
pub use utils::timer_driver;

pub(crate) mod auxiliary;
pub(crate) mod error_text_parser;
pub(crate) mod notification;

pub mod pulse_counter_error;
pub mod timer_driver;

mod uart;

pub use uart::*;

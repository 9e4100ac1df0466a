use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

/// Pulse counter shared between an interrupt callback and the polling loop.
///
/// Clones share the same underlying count, so one handle can be moved into
/// the callback passed to [crate::gpio::DigitalIn::trigger_on_interrupt]
/// while another stays in the main loop to read it. The increment performed
/// by the callback is visible to any later [PulseCounter::count] in the
/// polling context.
#[derive(Clone)]
pub struct PulseCounter {
    pulses: Arc<AtomicU32>,
    threshold: u32,
}

impl PulseCounter {
    /// Creates a new counter starting at zero.
    ///
    /// # Arguments
    ///
    /// - `threshold`: Amount of pulses that must be exceeded for
    ///   [PulseCounter::threshold_reached] to return `true`.
    pub fn new(threshold: u32) -> Self {
        PulseCounter {
            pulses: Arc::new(AtomicU32::new(0)),
            threshold,
        }
    }

    /// Counts one pulse. Safe to call from an interrupt callback.
    pub fn increment(&self) {
        self.pulses.fetch_add(1, Ordering::Release);
    }

    /// Gets the amount of pulses counted so far.
    pub fn count(&self) -> u32 {
        self.pulses.load(Ordering::Acquire)
    }

    /// Verifies if more pulses than the threshold were counted.
    ///
    /// The comparison is strict: with a threshold of 4 this returns `true`
    /// from the fifth pulse onwards.
    pub fn threshold_reached(&self) -> bool {
        self.count() > self.threshold
    }

    /// Gets the configured threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let counter = PulseCounter::new(4);
        assert_eq!(counter.count(), 0);
        assert!(!counter.threshold_reached());
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let counter = PulseCounter::new(4);
        for _ in 0..4 {
            counter.increment();
        }
        assert_eq!(counter.count(), 4);
        assert!(!counter.threshold_reached());

        counter.increment();
        assert!(counter.threshold_reached());
    }

    #[test]
    fn zero_threshold_reached_on_first_pulse() {
        let counter = PulseCounter::new(0);
        assert!(!counter.threshold_reached());
        counter.increment();
        assert!(counter.threshold_reached());
    }

    #[test]
    fn clones_share_the_count() {
        let counter = PulseCounter::new(2);
        let isr_handle = counter.clone();
        isr_handle.increment();
        isr_handle.increment();
        isr_handle.increment();
        assert_eq!(counter.count(), 3);
        assert!(counter.threshold_reached());
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counter = PulseCounter::new(0);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.increment();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.count(), 4000);
    }
}

use std::sync::Arc;

use esp_idf_svc::hal::task::{asynch::Notification as AsyncNotif, block_on};

#[derive(Debug)]
pub enum NotificationError {
    NoOneToNotify,
}

/// Waiting side of the wake-up channel between interrupt callbacks and the
/// main loop. The [crate::Microcontroller] blocks on it until some ISR
/// signals that there is interrupt work to be handled.
pub struct Notification {
    notif: Arc<AsyncNotif>,
}

/// Signaling side of the wake-up channel, cheap to clone into ISR closures.
#[derive(Clone)]
pub struct Notifier {
    notif: Arc<AsyncNotif>,
}

impl Notification {
    pub fn new() -> Self {
        Self {
            notif: Arc::new(AsyncNotif::new()),
        }
    }

    pub fn blocking_wait(&self) {
        block_on(self.notif.wait());
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::from(self)
    }
}

impl From<&Notification> for Notifier {
    fn from(value: &Notification) -> Self {
        Self {
            notif: value.notif.clone(),
        }
    }
}

impl Notifier {
    pub fn notify(&self) -> Result<(), NotificationError> {
        if self.notif.notify_lsb() {
            Ok(())
        } else {
            Err(NotificationError::NoOneToNotify)
        }
    }
}

use std::time::Duration;

use tokio::time::Instant;

/// How long a confirmation stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_millis(2400);

/// Transient confirmation message with its own expiry.
///
/// Showing a new message restarts the timer; an expired toast is invisible
/// even before [`Toast::expire`] clears it.
#[derive(Clone, Debug)]
pub struct Toast {
    message: Option<String>,
    expires_at: Option<Instant>,
    duration: Duration,
}

impl Default for Toast {
    fn default() -> Self {
        Self::new(TOAST_DURATION)
    }
}

impl Toast {
    pub fn new(duration: Duration) -> Self {
        Self {
            message: None,
            expires_at: None,
            duration,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.expires_at = Some(now + self.duration);
    }

    /// The message, if still within its display window at `now`.
    pub fn visible(&self, now: Instant) -> Option<&str> {
        match self.expires_at {
            Some(deadline) if now < deadline => self.message.as_deref(),
            _ => None,
        }
    }

    /// Drop the message once its window has passed. Returns true if cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) if now >= deadline => {
                self.message = None;
                self.expires_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.expires_at
    }
}

//! Toast notification bus
//!
//! Every failure or confirmation a screen wants the operator to see goes
//! through here as a transient toast; the renderers subscribe and handle
//! display/expiry themselves.

use tokio::sync::broadcast;

const TOAST_CHANNEL_CAPACITY: usize = 64;

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

/// A transient user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    /// How long the renderer should keep it on screen
    pub ttl_ms: u64,
}

/// Broadcast bus for toasts
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Toast>,
    ttl_ms: u64,
}

impl Notifier {
    pub fn new(ttl_ms: u64) -> Self {
        let (tx, _) = broadcast::channel(TOAST_CHANNEL_CAPACITY);
        Self { tx, ttl_ms }
    }

    /// Subscribe a renderer to the toast stream
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(ToastLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(ToastLevel::Error, message.into());
    }

    fn send(&self, level: ToastLevel, message: String) {
        // No subscribers is fine - the screen may run headless in tests
        let _ = self.tx.send(Toast {
            level,
            message,
            ttl_ms: self.ttl_ms,
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(3000)
    }
}

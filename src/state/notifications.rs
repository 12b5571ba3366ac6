use tokio::sync::mpsc;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Outbound half of the toast channel. Cloned into whatever needs to report
/// an outcome to the user; the UI loop owns the receiving half.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(Level::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    fn push(&self, level: Level, message: String) {
        // Receiver gone means the UI is shutting down.
        let _ = self.tx.send(Notification { level, message });
    }
}

/// Number of ticks a toast stays on screen (ticks are 80ms).
pub const TOAST_TICKS: u16 = 50;

/// The toast currently shown, if any.
#[derive(Debug, Default)]
pub struct ToastState {
    pub current: Option<Notification>,
    remaining: u16,
}

impl ToastState {
    pub fn show(&mut self, note: Notification) {
        self.current = Some(note);
        self.remaining = TOAST_TICKS;
    }

    pub fn tick(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_delivers_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.info("uno");
        notifier.warn("dos");
        assert_eq!(rx.try_recv().unwrap().message, "uno");
        assert_eq!(rx.try_recv().unwrap().level, Level::Warning);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn toast_expires_after_its_ticks() {
        let mut toast = ToastState::default();
        toast.show(Notification { level: Level::Info, message: "ok".into() });
        for _ in 0..TOAST_TICKS - 1 {
            toast.tick();
        }
        assert!(toast.current.is_some());
        toast.tick();
        assert!(toast.current.is_none());
    }
}

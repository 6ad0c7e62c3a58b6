use std::time::{Duration, Instant};

const TOAST_LIFETIME: Duration = Duration::from_secs(4);
/// Older toasts are dropped beyond this many.
const MAX_TOASTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
    expires_at: Instant,
}

/// Transient notifications, newest last.
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn success(&mut self, text: impl Into<String>, now: Instant) {
        self.push(ToastKind::Success, text.into(), now);
    }

    pub fn error(&mut self, text: impl Into<String>, now: Instant) {
        self.push(ToastKind::Error, text.into(), now);
    }

    fn push(&mut self, kind: ToastKind, text: String, now: Instant) {
        self.items.push(Toast {
            kind,
            text,
            expires_at: now + TOAST_LIFETIME,
        });
        if self.items.len() > MAX_TOASTS {
            self.items.remove(0);
        }
    }

    pub fn expire(&mut self, now: Instant) {
        self.items.retain(|t| t.expires_at > now);
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire_after_lifetime() {
        let t0 = Instant::now();
        let mut toasts = Toasts::default();
        toasts.success("Detected 2 face(s) in the image", t0);
        toasts.expire(t0 + Duration::from_secs(1));
        assert_eq!(toasts.iter().count(), 1);
        toasts.expire(t0 + TOAST_LIFETIME);
        assert_eq!(toasts.iter().count(), 0);
    }

    #[test]
    fn test_oldest_dropped_when_full() {
        let t0 = Instant::now();
        let mut toasts = Toasts::default();
        for i in 0..MAX_TOASTS + 1 {
            toasts.error(format!("error {i}"), t0);
        }
        let texts: Vec<_> = toasts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["error 1", "error 2", "error 3"]);
    }

    #[test]
    fn test_dismiss_out_of_range_is_ignored() {
        let mut toasts = Toasts::default();
        toasts.success("ok", Instant::now());
        toasts.dismiss(5);
        assert_eq!(toasts.iter().count(), 1);
        toasts.dismiss(0);
        assert_eq!(toasts.iter().count(), 0);
    }
}

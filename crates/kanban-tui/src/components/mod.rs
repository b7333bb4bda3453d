pub mod board;
pub mod card;
pub mod form;

use std::time::{Duration, Instant};

use ratatui::style::{Color, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Warning,
    Success,
}

/// A one-line message that hides itself after a fixed time.
#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub kind: BannerKind,
    expires_at: Instant,
}

impl Banner {
    pub fn new(text: impl Into<String>, kind: BannerKind, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            kind,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn style(&self) -> Style {
        match self.kind {
            BannerKind::Error => Style::default().fg(Color::Red),
            BannerKind::Warning => Style::default().fg(Color::Yellow),
            BannerKind::Success => Style::default().fg(Color::Green),
        }
    }
}

/// Drop `slot`'s banner once it has expired.
pub(crate) fn expire(slot: &mut Option<Banner>, now: Instant) {
    if slot.as_ref().is_some_and(|b| b.is_expired(now)) {
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_expires_after_ttl() {
        let mut slot = Some(Banner::new("x", BannerKind::Error, Duration::from_secs(5)));
        expire(&mut slot, Instant::now());
        assert!(slot.is_some());
        expire(&mut slot, Instant::now() + Duration::from_secs(6));
        assert!(slot.is_none());
    }
}

//! Single-slot feedback banner shown under the contact form.

use std::time::{Duration, Instant};

/// How long a banner stays fully visible.
pub const BANNER_LIFETIME: Duration = Duration::from_secs(5);
/// Fade-out transition that follows [`BANNER_LIFETIME`].
pub const BANNER_FADE_OUT: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    pub fn icon(self) -> &'static str {
        match self {
            BannerKind::Success => "check-circle-fill",
            BannerKind::Error => "exclamation-circle-fill",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    Visible,
    FadingOut,
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    shown_at: Instant,
}

impl Banner {
    pub fn phase(&self, now: Instant) -> BannerPhase {
        let age = now.saturating_duration_since(self.shown_at);
        if age < BANNER_LIFETIME {
            BannerPhase::Visible
        } else if age < BANNER_LIFETIME + BANNER_FADE_OUT {
            BannerPhase::FadingOut
        } else {
            BannerPhase::Dismissed
        }
    }
}

#[derive(Debug, Default)]
pub struct FeedbackSlot {
    current: Option<Banner>,
}

impl FeedbackSlot {
    /// Replaces whatever banner is showing.
    pub fn show(&mut self, kind: BannerKind, text: impl Into<String>, now: Instant) -> &Banner {
        self.current.insert(Banner {
            kind,
            text: text.into(),
            shown_at: now,
        })
    }

    pub fn current(&self) -> Option<&Banner> {
        self.current.as_ref()
    }

    /// Advances the auto-dismiss timer, dropping the banner once its fade-out
    /// has finished. Returns the phase of the banner still shown, if any.
    pub fn tick(&mut self, now: Instant) -> Option<BannerPhase> {
        let phase = self.current.as_ref()?.phase(now);
        if phase == BannerPhase::Dismissed {
            self.current = None;
            return None;
        }
        Some(phase)
    }
}

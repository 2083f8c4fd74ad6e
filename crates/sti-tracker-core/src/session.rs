//! Per-user session state threaded through every handler call.

use serde::{Deserialize, Serialize};

use crate::models::RegisterDraft;
use crate::view::ManageMode;

/// Top-level pages.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Page {
    #[default]
    Home,
    Register,
    History,
    Preferences,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Info,
    Warning,
}

/// A short message shown once after an explicit action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Warning,
            text: text.into(),
        }
    }
}

/// Hint shown the first time onboarding opens the preferences page.
pub const FIRST_TIME_HINT: &str = "First time here: configure your preferences to get started.";

/// Everything that survives between two interactions of one user.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub page: Page,
    /// Register wizard draft; `None` until the wizard is first shown
    pub register: Option<RegisterDraft>,
    pub manage: ManageMode,
    banner: Option<Banner>,
    first_time: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_banner(&mut self, banner: Banner) {
        self.banner = Some(banner);
    }

    /// Pending banner, consumed on read.
    pub fn take_banner(&mut self) -> Option<Banner> {
        self.banner.take()
    }

    pub(crate) fn mark_first_time(&mut self) {
        self.first_time = true;
    }

    /// The onboarding hint, returned only once and only on the preferences page.
    pub fn take_first_time_hint(&mut self) -> Option<&'static str> {
        if self.page == Page::Preferences && std::mem::take(&mut self.first_time) {
            Some(FIRST_TIME_HINT)
        } else {
            None
        }
    }
}

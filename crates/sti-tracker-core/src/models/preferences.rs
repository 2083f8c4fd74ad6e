//! User preference models.

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::DEFAULT_REMINDER_HOUR;

/// What the user tracks and how they want to be reminded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    /// STIs shown in the register wizard, in the order the user picked them
    pub tracked_stis: Vec<String>,
    /// Reminder time as `HH:00` (24h)
    pub reminder_hour: Option<String>,
    /// Free-chosen profile labels (e.g. "PrEP user")
    pub profile_tags: Vec<String>,
}

/// A partial preferences change. Absent fields leave the current value alone.
///
/// `reminder_hour` is doubly optional so that clearing the hour
/// (`Some(None)`) is distinct from not touching it (`None`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferencesUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_stis: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder_hour: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_tags: Option<Vec<String>>,
}

/// Maps a present JSON key (even `null`) to `Some`, so only absent keys stay `None`.
fn present_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Preferences {
    /// Overwrite only the fields present in `update`.
    pub fn apply(&mut self, update: PreferencesUpdate) {
        if let Some(tracked) = update.tracked_stis {
            self.tracked_stis = tracked;
        }
        if let Some(hour) = update.reminder_hour {
            self.reminder_hour = hour;
        }
        if let Some(tags) = update.profile_tags {
            self.profile_tags = tags;
        }
    }

    /// Onboarding is complete once at least one STI is tracked.
    pub fn is_configured(&self) -> bool {
        !self.tracked_stis.is_empty()
    }

    /// The stored reminder hour, or the form default.
    pub fn reminder_or_default(&self) -> &str {
        self.reminder_hour.as_deref().unwrap_or(DEFAULT_REMINDER_HOUR)
    }
}

impl From<Preferences> for PreferencesUpdate {
    fn from(prefs: Preferences) -> Self {
        Self {
            tracked_stis: Some(prefs.tracked_stis),
            reminder_hour: Some(prefs.reminder_hour),
            profile_tags: Some(prefs.profile_tags),
        }
    }
}

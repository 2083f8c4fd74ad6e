//! Application façade used by a UI shell: routing, onboarding gate and
//! the actions behind each page.

use tracing::{debug, error, info, warn};

use crate::catalog;
use crate::config::AppConfig;
use crate::models::{Preferences, PreferencesUpdate, WizardStep};
use crate::session::{Banner, Page, Session};
use crate::store::{ensure_parent_dir, HistoryStore, PreferencesLoad, PreferencesStore};
use crate::view::{HistoryFilter, HistoryPage};
use crate::wizard::{
    reset_draft, RegisterWizard, StepView, Transition, WizardError, WizardEvent, WizardResult,
};

/// Preferences form contents, prefilled from the stored preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesForm {
    pub sti_options: &'static [&'static str],
    pub tag_options: &'static [&'static str],
    pub hour_options: Vec<String>,
    pub tracked_stis: Vec<String>,
    pub reminder_hour: String,
    pub profile_tags: Vec<String>,
}

/// Owns both stores for one user.
#[derive(Debug)]
pub struct Tracker {
    config: AppConfig,
    preferences: PreferencesStore,
    history: HistoryStore,
}

impl Tracker {
    /// Set up stores at the configured paths, creating their directories.
    pub fn open(config: AppConfig) -> Self {
        for path in [&config.preferences_file, &config.history_file] {
            if let Err(e) = ensure_parent_dir(path) {
                error!(error = %e, "Could not create data directory");
            }
        }
        Self {
            preferences: PreferencesStore::new(&config.preferences_file),
            history: HistoryStore::new(&config.history_file),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        self.preferences.preferences()
    }

    pub fn history(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    /// Load preferences and apply the onboarding gate. Returns true while
    /// onboarding is required.
    pub fn start_session(&mut self, session: &mut Session) -> bool {
        if self.preferences.load() == PreferencesLoad::Malformed {
            warn!("Preferences unreadable, onboarding again");
        }
        let onboarding = !self.preferences.is_configured();
        if onboarding {
            session.page = Page::Preferences;
            session.mark_first_time();
        }
        onboarding
    }

    /// Move to a page. Until preferences are configured every page resolves
    /// to the preferences page.
    pub fn navigate(&mut self, session: &mut Session, page: Page) -> Page {
        let target = if self.preferences.is_configured() {
            page
        } else {
            Page::Preferences
        };

        if target == Page::Register && session.page != Page::Register {
            let resumable = session
                .register
                .as_ref()
                .is_some_and(|draft| draft.step != WizardStep::Exit);
            if resumable {
                if let Some(draft) = session.register.as_mut() {
                    draft.step = WizardStep::Date;
                }
            } else {
                reset_draft(&mut session.register);
            }
        }
        if target != session.page {
            debug!(from = ?session.page, to = ?target, "Navigate");
        }
        session.page = target;
        target
    }

    /// Current wizard step for rendering.
    pub fn register_view(&mut self, session: &mut Session) -> StepView {
        self.preferences.load();
        RegisterWizard::new(self.preferences.preferences(), &mut self.history)
            .view(&mut session.register)
    }

    /// Apply a wizard button press. Leaving through "Go to Home" returns the
    /// session to the home page.
    pub fn register_action(
        &mut self,
        session: &mut Session,
        event: WizardEvent,
    ) -> WizardResult<Transition> {
        self.preferences.load();
        let result = RegisterWizard::new(self.preferences.preferences(), &mut self.history)
            .handle(&mut session.register, event);

        match &result {
            Ok(t) if t.to == WizardStep::Complete && t.from == WizardStep::Details => {
                session.set_banner(Banner::success("Register completed!"));
            }
            Ok(t) if t.to == WizardStep::Exit => {
                session.page = Page::Home;
            }
            Ok(_) => {}
            Err(WizardError::Store(_)) => {
                session.set_banner(Banner::warning(
                    "Register recorded for this session but could not be saved.",
                ));
            }
            Err(WizardError::UnexpectedEvent { .. }) => {}
        }
        result
    }

    /// Filtered history for display.
    pub fn history_page(&mut self, filter: &HistoryFilter) -> HistoryPage {
        let snapshot = self.history.show();
        let page = HistoryPage::build(&snapshot, filter);
        if !filter.is_empty() {
            info!(
                stis = ?filter.stis,
                results = ?filter.results,
                start = ?filter.dates.start,
                end = ?filter.dates.end,
                shown = page.rows.len(),
                total = page.total,
                "Filters applied"
            );
        }
        page
    }

    /// Mark or unmark a history row by snapshot label. Returns whether the
    /// row is now marked; rows can only be marked in manage mode.
    pub fn toggle_delete_mark(&self, session: &mut Session, label: usize) -> bool {
        if !session.manage.is_enabled() {
            debug!(label, "Ignoring mark outside manage mode");
            return false;
        }
        session.manage.toggle(label)
    }

    /// "Clear" on the filter form: leaves manage mode and drops marks.
    pub fn clear_filters(&self, session: &mut Session) {
        session.manage.set_enabled(false);
        info!("Filters cleared, manage mode reset");
    }

    /// Delete the rows marked in manage mode.
    pub fn confirm_delete(&mut self, session: &mut Session) -> Banner {
        let banner = match session.manage.confirm(&mut self.history) {
            Ok(0) => return Banner::info("No records were deleted."),
            Ok(_) => Banner::success("Records deleted successfully."),
            Err(_) => Banner::warning("Records could not be deleted. Please try again."),
        };
        session.set_banner(banner.clone());
        banner
    }

    pub fn cancel_delete(&self, session: &mut Session) {
        session.manage.cancel();
    }

    /// Form contents for the preferences page.
    pub fn preferences_form(&mut self) -> PreferencesForm {
        self.preferences.load();
        let prefs = self.preferences.preferences();
        PreferencesForm {
            sti_options: catalog::STIS,
            tag_options: catalog::PROFILE_TAGS,
            hour_options: catalog::reminder_hours(),
            tracked_stis: prefs.tracked_stis.clone(),
            reminder_hour: prefs.reminder_or_default().to_string(),
            profile_tags: prefs.profile_tags.clone(),
        }
    }

    /// "Save" on the preferences page.
    pub fn save_preferences(&mut self, session: &mut Session, update: PreferencesUpdate) -> Banner {
        self.preferences.load();
        self.preferences.set(update);
        let banner = match self.preferences.save() {
            Ok(()) => {
                let prefs = self.preferences.preferences();
                info!(
                    tracked = ?prefs.tracked_stis,
                    reminder = ?prefs.reminder_hour,
                    tags = ?prefs.profile_tags,
                    "Preferences saved"
                );
                Banner::success("Preferences saved")
            }
            Err(_) => Banner::warning("Preferences could not be saved."),
        };
        session.set_banner(banner.clone());
        banner
    }

    /// "Reset to default" on the preferences page.
    pub fn reset_preferences(&mut self, session: &mut Session) -> Banner {
        let banner = match self.preferences.reset() {
            Ok(()) => Banner::info("Preferences reset to default values."),
            Err(_) => Banner::warning("Preferences were reset but could not be saved."),
        };
        session.set_banner(banner.clone());
        banner
    }
}

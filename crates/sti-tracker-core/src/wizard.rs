//! Register wizard: a five-step form that turns one visit into test records.
//!
//! ```text
//!  1 Date ──Next──▶ 2 STIs ──Next──▶ 3 Tests ──Next──▶ 4 Details ──Finish──▶ 5 Complete
//!           ◀─Back──         ◀─Back──          ◀─Back──                        │
//!                                                                 Add another ─┤─ Go home
//!                                                                  (back to 1) │    ▼
//!                                                                              6 Exit
//! ```
//!
//! The draft lives in the caller's session and is passed into every call.
//! Each entry point first checks the draft and starts over from step 1 if
//! it is missing or inconsistent.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::models::{records_from_draft, Preferences, RegisterDraft, WizardStep};
use crate::store::{HistoryStore, StoreError};

/// Wizard errors.
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("{event} is not available at step {step}")]
    UnexpectedEvent { event: &'static str, step: WizardStep },

    #[error("Register could not be saved: {0}")]
    Store(#[from] StoreError),
}

pub type WizardResult<T> = Result<T, WizardError>;

/// A user's pick for one STI in step 3. `None` keeps the prefilled option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestChoice {
    pub test_type: Option<String>,
    pub result: Option<String>,
}

/// A button press in the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    /// Step 1 "Next"
    SetDate(NaiveDate),
    /// Step 2 "Next" with the checked STIs
    SelectStis(Vec<String>),
    /// Step 3 "Next" with per-STI picks
    ChooseTests(BTreeMap<String, TestChoice>),
    /// Step 2 or 3 "Back"
    Back,
    /// Step 4 "Back", keeping what was typed
    DetailsBack { location: String, notes: String },
    /// Step 4 "Finish register"
    Finish { location: String, notes: String },
    /// Step 5 "Add another register"
    AddAnother,
    /// Step 5 "Go to Home"
    GoHome,
}

impl WizardEvent {
    fn name(&self) -> &'static str {
        match self {
            WizardEvent::SetDate(_) => "SetDate",
            WizardEvent::SelectStis(_) => "SelectStis",
            WizardEvent::ChooseTests(_) => "ChooseTests",
            WizardEvent::Back => "Back",
            WizardEvent::DetailsBack { .. } => "DetailsBack",
            WizardEvent::Finish { .. } => "Finish",
            WizardEvent::AddAnother => "AddAnother",
            WizardEvent::GoHome => "GoHome",
        }
    }
}

/// One checkbox in step 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StiOption {
    pub sti: String,
    pub checked: bool,
}

/// The two selectboxes for one STI in step 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestForm {
    pub sti: String,
    pub test_types: &'static [&'static str],
    /// Preselected entry in `test_types`
    pub test_index: usize,
    pub results: &'static [&'static str],
    /// Preselected entry in `results`
    pub result_index: usize,
}

impl TestForm {
    fn new(sti: &str, draft: &RegisterDraft) -> Self {
        let test_types = catalog::test_types_for(sti);
        let results = catalog::results_for(sti);
        Self {
            sti: sti.to_string(),
            test_types,
            test_index: index_of(test_types, draft.test_type_for(sti)),
            results,
            result_index: index_of(results, draft.result_for(sti)),
        }
    }

    pub fn selected_test_type(&self) -> &'static str {
        self.test_types[self.test_index]
    }

    pub fn selected_result(&self) -> &'static str {
        self.results[self.result_index]
    }

    /// Resolve a user pick against the options, falling back to the preselection.
    fn resolve(&self, choice: Option<&TestChoice>) -> (String, String) {
        let pick = |options: &'static [&'static str], wanted: Option<&str>, fallback: &'static str| {
            match wanted {
                Some(value) if options.contains(&value) => value.to_string(),
                Some(value) => {
                    warn!(sti = %self.sti, value, "Option not offered for this STI, keeping preselection");
                    fallback.to_string()
                }
                None => fallback.to_string(),
            }
        };
        let choice = choice.cloned().unwrap_or_default();
        (
            pick(self.test_types, choice.test_type.as_deref(), self.selected_test_type()),
            pick(self.results, choice.result.as_deref(), self.selected_result()),
        )
    }
}

fn index_of(options: &[&str], previous: Option<&str>) -> usize {
    previous
        .and_then(|prev| options.iter().position(|o| *o == prev))
        .unwrap_or(0)
}

/// What to render for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepView {
    Date { date: Option<NaiveDate> },
    Stis { options: Vec<StiOption> },
    Tests { forms: Vec<TestForm> },
    Details { location: String, notes: String },
    Complete,
    Exit,
}

/// Result of a handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: WizardStep,
    pub to: WizardStep,
    /// Test records written by this transition
    pub records_added: usize,
}

/// Start over from step 1 with an empty draft.
pub fn reset_draft(slot: &mut Option<RegisterDraft>) -> &mut RegisterDraft {
    info!("Register flow reset to initial state");
    slot.insert(RegisterDraft::default())
}

/// Return the session's draft, re-initializing it if missing or inconsistent.
pub fn ensure_draft(slot: &mut Option<RegisterDraft>) -> &mut RegisterDraft {
    let valid = slot.as_ref().map(RegisterDraft::is_consistent).unwrap_or(false);
    if !valid {
        warn!(present = slot.is_some(), "Invalid or incomplete register draft, resetting");
        return reset_draft(slot);
    }
    slot.get_or_insert_with(RegisterDraft::default)
}

/// Drives one wizard run against the user's preferences and history.
pub struct RegisterWizard<'a> {
    prefs: &'a Preferences,
    history: &'a mut HistoryStore,
}

impl<'a> RegisterWizard<'a> {
    pub fn new(prefs: &'a Preferences, history: &'a mut HistoryStore) -> Self {
        Self { prefs, history }
    }

    /// Describe the current step.
    pub fn view(&self, slot: &mut Option<RegisterDraft>) -> StepView {
        let draft = ensure_draft(slot);
        match draft.step {
            WizardStep::Date => StepView::Date { date: draft.date },
            WizardStep::Stis => StepView::Stis {
                options: self
                    .prefs
                    .tracked_stis
                    .iter()
                    .map(|sti| StiOption {
                        sti: sti.clone(),
                        checked: draft.tested_stis.contains(sti),
                    })
                    .collect(),
            },
            WizardStep::Tests => StepView::Tests {
                forms: draft
                    .tested_stis
                    .iter()
                    .map(|sti| TestForm::new(sti, draft))
                    .collect(),
            },
            WizardStep::Details => StepView::Details {
                location: draft.test_location.clone(),
                notes: draft.notes.clone(),
            },
            WizardStep::Complete => StepView::Complete,
            WizardStep::Exit => StepView::Exit,
        }
    }

    /// Apply one button press.
    ///
    /// On `Finish` the draft moves to step 5 before the records are written,
    /// so a failed write cannot be resubmitted into duplicate rows.
    pub fn handle(
        &mut self,
        slot: &mut Option<RegisterDraft>,
        event: WizardEvent,
    ) -> WizardResult<Transition> {
        let draft = ensure_draft(slot);
        let from = draft.step;
        let mut records_added = 0;

        match (from, event) {
            (WizardStep::Date, WizardEvent::SetDate(date)) => {
                draft.date = Some(date);
                draft.step = WizardStep::Stis;
                info!(%date, "Register step 1 -> 2: date set");
            }
            (WizardStep::Stis, WizardEvent::SelectStis(selected)) => {
                let tested: Vec<String> = self
                    .prefs
                    .tracked_stis
                    .iter()
                    .filter(|sti| selected.contains(sti))
                    .cloned()
                    .collect();
                if tested.len() != selected.len() {
                    debug!(?selected, "Ignoring selections outside the tracked STIs");
                }
                info!(count = tested.len(), stis = ?tested, "Register step 2 -> 3: STIs selected");
                draft.tested_stis = tested;
                draft.step = WizardStep::Tests;
            }
            (WizardStep::Stis, WizardEvent::Back) => {
                draft.step = WizardStep::Date;
                debug!("Register step 2 -> 1 (back)");
            }
            (WizardStep::Tests, WizardEvent::ChooseTests(choices)) => {
                let mut tests = BTreeMap::new();
                let mut results = BTreeMap::new();
                for sti in &draft.tested_stis {
                    let form = TestForm::new(sti, draft);
                    let (test_type, result) = form.resolve(choices.get(sti));
                    tests.insert(sti.clone(), test_type);
                    results.insert(sti.clone(), result);
                }
                info!(tests = ?tests, results = ?results, "Register step 3 -> 4");
                draft.sti_realised_tests = tests;
                draft.sti_results = results;
                draft.step = WizardStep::Details;
            }
            (WizardStep::Tests, WizardEvent::Back) => {
                draft.step = WizardStep::Stis;
                debug!("Register step 3 -> 2 (back)");
            }
            (WizardStep::Details, WizardEvent::DetailsBack { location, notes }) => {
                debug!(%location, notes_len = notes.len(), "Register step 4 -> 3 (back)");
                draft.test_location = location;
                draft.notes = notes;
                draft.step = WizardStep::Tests;
            }
            (WizardStep::Details, WizardEvent::Finish { location, notes }) => {
                draft.test_location = location;
                draft.notes = notes;
                let rows = records_from_draft(draft, Utc::now());
                info!(
                    rows = rows.len(),
                    location = %draft.test_location,
                    notes_len = draft.notes.len(),
                    "Register step 4 -> finish: appending rows"
                );
                draft.step = WizardStep::Complete;
                records_added = self.history.append_register(rows)?;
            }
            (WizardStep::Complete, WizardEvent::AddAnother) => {
                info!("Register finished: user chose to add another register");
                reset_draft(slot);
            }
            (WizardStep::Complete, WizardEvent::GoHome) => {
                info!("Register finished: user returned to Home");
                draft.step = WizardStep::Exit;
            }
            (step, event) => {
                warn!(%step, event = event.name(), "Event not available at this step");
                return Err(WizardError::UnexpectedEvent {
                    event: event.name(),
                    step,
                });
            }
        }

        let to = slot.as_ref().map(|d| d.step).unwrap_or(WizardStep::Date);
        debug!(%from, %to, "Wizard step change");
        Ok(Transition {
            from,
            to,
            records_added,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences {
        Preferences {
            tracked_stis: vec!["HIV".into(), "Syphilis".into(), "Chlamydia".into()],
            ..Default::default()
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store(dir: &tempfile::TempDir) -> HistoryStore {
        HistoryStore::new(dir.path().join("history.csv"))
    }

    #[test]
    fn test_missing_draft_starts_at_step_one() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let wizard = RegisterWizard::new(&prefs, &mut history);

        let mut slot = None;
        assert_eq!(wizard.view(&mut slot), StepView::Date { date: None });
        assert_eq!(slot, Some(RegisterDraft::default()));
    }

    #[test]
    fn test_inconsistent_draft_is_reset() {
        let mut slot = Some(RegisterDraft {
            step: WizardStep::Details,
            tested_stis: vec!["HIV".into()],
            ..Default::default()
        });
        let draft = ensure_draft(&mut slot);
        assert_eq!(draft, &RegisterDraft::default());
    }

    #[test]
    fn test_step_two_lists_tracked_stis() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let mut wizard = RegisterWizard::new(&prefs, &mut history);
        let mut slot = None;

        wizard
            .handle(&mut slot, WizardEvent::SetDate(ymd(2024, 5, 1)))
            .unwrap();
        let StepView::Stis { options } = wizard.view(&mut slot) else {
            panic!("expected step 2");
        };
        let names: Vec<_> = options.iter().map(|o| o.sti.as_str()).collect();
        assert_eq!(names, vec!["HIV", "Syphilis", "Chlamydia"]);
        assert!(options.iter().all(|o| !o.checked));
    }

    #[test]
    fn test_selection_keeps_tracked_order_and_drops_untracked() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let mut wizard = RegisterWizard::new(&prefs, &mut history);
        let mut slot = None;

        wizard
            .handle(&mut slot, WizardEvent::SetDate(ymd(2024, 5, 1)))
            .unwrap();
        wizard
            .handle(
                &mut slot,
                WizardEvent::SelectStis(vec!["Chlamydia".into(), "Scabies".into(), "HIV".into()]),
            )
            .unwrap();

        assert_eq!(
            slot.as_ref().unwrap().tested_stis,
            vec!["HIV".to_string(), "Chlamydia".to_string()]
        );
    }

    #[test]
    fn test_back_keeps_recorded_values() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let mut wizard = RegisterWizard::new(&prefs, &mut history);
        let mut slot = None;

        wizard
            .handle(&mut slot, WizardEvent::SetDate(ymd(2024, 5, 1)))
            .unwrap();
        wizard
            .handle(&mut slot, WizardEvent::SelectStis(vec!["HIV".into()]))
            .unwrap();
        let back = wizard.handle(&mut slot, WizardEvent::Back).unwrap();
        assert_eq!((back.from, back.to), (WizardStep::Tests, WizardStep::Stis));

        let StepView::Stis { options } = wizard.view(&mut slot) else {
            panic!("expected step 2");
        };
        assert!(options[0].checked);

        wizard.handle(&mut slot, WizardEvent::Back).unwrap();
        assert_eq!(
            wizard.view(&mut slot),
            StepView::Date {
                date: Some(ymd(2024, 5, 1))
            }
        );
    }

    #[test]
    fn test_step_three_prefills_previous_choice() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let mut wizard = RegisterWizard::new(&prefs, &mut history);
        let mut slot = None;

        wizard
            .handle(&mut slot, WizardEvent::SetDate(ymd(2024, 5, 1)))
            .unwrap();
        wizard
            .handle(&mut slot, WizardEvent::SelectStis(vec!["HIV".into()]))
            .unwrap();

        let StepView::Tests { forms } = wizard.view(&mut slot) else {
            panic!("expected step 3");
        };
        assert_eq!(forms[0].test_index, 0);
        assert_eq!(forms[0].selected_result(), "Negative / Non-reactive");

        let mut choices = BTreeMap::new();
        choices.insert(
            "HIV".to_string(),
            TestChoice {
                test_type: Some("Western blot".into()),
                result: Some("Indeterminate".into()),
            },
        );
        wizard
            .handle(&mut slot, WizardEvent::ChooseTests(choices))
            .unwrap();
        wizard
            .handle(
                &mut slot,
                WizardEvent::DetailsBack {
                    location: "Lab".into(),
                    notes: "n".into(),
                },
            )
            .unwrap();

        let StepView::Tests { forms } = wizard.view(&mut slot) else {
            panic!("expected step 3");
        };
        assert_eq!(forms[0].selected_test_type(), "Western blot");
        assert_eq!(forms[0].selected_result(), "Indeterminate");
        assert_eq!(slot.as_ref().unwrap().test_location, "Lab");
    }

    #[test]
    fn test_unoffered_choice_falls_back_to_preselection() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let mut wizard = RegisterWizard::new(&prefs, &mut history);
        let mut slot = None;

        wizard
            .handle(&mut slot, WizardEvent::SetDate(ymd(2024, 5, 1)))
            .unwrap();
        wizard
            .handle(&mut slot, WizardEvent::SelectStis(vec!["Syphilis".into()]))
            .unwrap();

        let mut choices = BTreeMap::new();
        choices.insert(
            "Syphilis".to_string(),
            TestChoice {
                test_type: Some("Made-up test".into()),
                result: None,
            },
        );
        wizard
            .handle(&mut slot, WizardEvent::ChooseTests(choices))
            .unwrap();

        let draft = slot.as_ref().unwrap();
        assert_eq!(
            draft.test_type_for("Syphilis"),
            Some("VDRL (Venereal Disease Research Laboratory)")
        );
        assert_eq!(draft.result_for("Syphilis"), Some("Non-reactive"));
    }

    #[test]
    fn test_wrong_event_for_step_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let mut wizard = RegisterWizard::new(&prefs, &mut history);
        let mut slot = None;

        let err = wizard.handle(&mut slot, WizardEvent::Back).unwrap_err();
        assert!(matches!(
            err,
            WizardError::UnexpectedEvent {
                event: "Back",
                step: WizardStep::Date
            }
        ));
        assert_eq!(slot.as_ref().unwrap().step, WizardStep::Date);
    }

    #[test]
    fn test_empty_selection_finishes_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let mut slot = None;
        {
            let mut wizard = RegisterWizard::new(&prefs, &mut history);
            wizard
                .handle(&mut slot, WizardEvent::SetDate(ymd(2024, 5, 1)))
                .unwrap();
            wizard
                .handle(&mut slot, WizardEvent::SelectStis(Vec::new()))
                .unwrap();
            wizard
                .handle(&mut slot, WizardEvent::ChooseTests(BTreeMap::new()))
                .unwrap();
            let done = wizard
                .handle(
                    &mut slot,
                    WizardEvent::Finish {
                        location: String::new(),
                        notes: String::new(),
                    },
                )
                .unwrap();
            assert_eq!(done.to, WizardStep::Complete);
            assert_eq!(done.records_added, 0);
        }
        assert_eq!(history.row_count(), 0);
    }

    #[test]
    fn test_add_another_and_go_home() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs();
        let mut history = store(&dir);
        let mut wizard = RegisterWizard::new(&prefs, &mut history);

        let mut slot = Some(RegisterDraft {
            step: WizardStep::Complete,
            date: Some(ymd(2024, 5, 1)),
            tested_stis: vec!["HIV".into()],
            ..Default::default()
        });
        let t = wizard.handle(&mut slot, WizardEvent::AddAnother).unwrap();
        assert_eq!(t.to, WizardStep::Date);
        assert_eq!(slot, Some(RegisterDraft::default()));

        let mut slot = Some(RegisterDraft {
            step: WizardStep::Complete,
            ..Default::default()
        });
        let t = wizard.handle(&mut slot, WizardEvent::GoHome).unwrap();
        assert_eq!(t.to, WizardStep::Exit);
        assert_eq!(wizard.view(&mut slot), StepView::Exit);
    }
}

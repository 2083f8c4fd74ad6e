//! Register draft: the in-progress state of one wizard run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wizard position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    /// Step 1: test date
    Date,
    /// Step 2: which tracked STIs were tested
    Stis,
    /// Step 3: test type and result per STI
    Tests,
    /// Step 4: location and notes
    Details,
    /// Step 5: register saved, choose what next
    Complete,
    /// Step 6: leave the wizard; handled by navigation
    Exit,
}

impl WizardStep {
    /// 1-based step number as shown to the user.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Date => 1,
            WizardStep::Stis => 2,
            WizardStep::Tests => 3,
            WizardStep::Details => 4,
            WizardStep::Complete => 5,
            WizardStep::Exit => 6,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(WizardStep::Date),
            2 => Some(WizardStep::Stis),
            3 => Some(WizardStep::Tests),
            4 => Some(WizardStep::Details),
            5 => Some(WizardStep::Complete),
            6 => Some(WizardStep::Exit),
            _ => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A register being filled in. Never persisted; only the test records
/// derived from it are.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterDraft {
    pub step: WizardStep,
    pub date: Option<NaiveDate>,
    pub tested_stis: Vec<String>,
    /// STI → chosen test type
    pub sti_realised_tests: BTreeMap<String, String>,
    /// STI → chosen result
    pub sti_results: BTreeMap<String, String>,
    pub test_location: String,
    pub notes: String,
}

impl Default for RegisterDraft {
    fn default() -> Self {
        Self {
            step: WizardStep::Date,
            date: None,
            tested_stis: Vec::new(),
            sti_realised_tests: BTreeMap::new(),
            sti_results: BTreeMap::new(),
            test_location: String::new(),
            notes: String::new(),
        }
    }
}

impl RegisterDraft {
    /// Check that every step already passed left its data behind.
    ///
    /// A draft past step 1 must carry a date; steps 3 and 4 only make sense
    /// for STIs that were selected in step 2.
    pub fn is_consistent(&self) -> bool {
        if self.step > WizardStep::Date && self.step < WizardStep::Complete && self.date.is_none() {
            return false;
        }
        if self.step == WizardStep::Details {
            return self
                .tested_stis
                .iter()
                .all(|sti| self.sti_realised_tests.contains_key(sti) && self.sti_results.contains_key(sti));
        }
        true
    }

    /// Chosen test type for an STI, if any.
    pub fn test_type_for(&self, sti: &str) -> Option<&str> {
        self.sti_realised_tests.get(sti).map(String::as_str)
    }

    /// Chosen result for an STI, if any.
    pub fn result_for(&self, sti: &str) -> Option<&str> {
        self.sti_results.get(sti).map(String::as_str)
    }
}

//! End-to-end register flow through the tracker façade.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sti_tracker_core::models::records_from_draft;
use sti_tracker_core::{
    AppConfig, BannerKind, HistoryStore, Page, PreferencesUpdate, Session, StepView, TestChoice,
    Tracker, WizardEvent, WizardStep,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn choice(test_type: &str, result: &str) -> TestChoice {
    TestChoice {
        test_type: Some(test_type.to_string()),
        result: Some(result.to_string()),
    }
}

fn configured_tracker(dir: &tempfile::TempDir) -> (Tracker, Session) {
    let mut tracker = Tracker::open(AppConfig::with_data_dir(dir.path()));
    let mut session = Session::new();
    tracker.start_session(&mut session);
    tracker.save_preferences(
        &mut session,
        PreferencesUpdate {
            tracked_stis: Some(vec![
                "HIV".into(),
                "Syphilis".into(),
                "Chlamydia".into(),
            ]),
            ..Default::default()
        },
    );
    session.take_banner();
    (tracker, session)
}

fn finish_two_sti_register(tracker: &mut Tracker, session: &mut Session) {
    tracker.navigate(session, Page::Register);
    tracker
        .register_action(session, WizardEvent::SetDate(ymd(2024, 5, 1)))
        .unwrap();
    tracker
        .register_action(
            session,
            WizardEvent::SelectStis(vec!["HIV".into(), "Chlamydia".into()]),
        )
        .unwrap();

    let mut choices = BTreeMap::new();
    choices.insert(
        "HIV".to_string(),
        choice("Rapid antibody test", "Negative / Non-reactive"),
    );
    choices.insert(
        "Chlamydia".to_string(),
        choice("PCR / NAAT (urine or swab)", "Detected"),
    );
    tracker
        .register_action(session, WizardEvent::ChooseTests(choices))
        .unwrap();

    let done = tracker
        .register_action(
            session,
            WizardEvent::Finish {
                location: "Clinic A".into(),
                notes: String::new(),
            },
        )
        .unwrap();
    assert_eq!(done.records_added, 2);
}

#[test]
fn test_two_sti_register_produces_two_records() {
    let dir = tempfile::tempdir().unwrap();
    let (mut tracker, mut session) = configured_tracker(&dir);

    finish_two_sti_register(&mut tracker, &mut session);

    assert_eq!(tracker.register_view(&mut session), StepView::Complete);
    let banner = session.take_banner().unwrap();
    assert_eq!(banner.kind, BannerKind::Success);
    assert_eq!(banner.text, "Register completed!");

    // Read back from disk with a fresh store
    let mut store = HistoryStore::new(&tracker.config().history_file);
    let records = store.records().to_vec();
    assert_eq!(records.len(), 2);

    let (hiv, chlamydia) = (&records[0], &records[1]);
    assert_eq!(hiv.sti, "HIV");
    assert_eq!(hiv.test_type.as_deref(), Some("Rapid antibody test"));
    assert_eq!(hiv.result.as_deref(), Some("Negative / Non-reactive"));
    assert_eq!(chlamydia.sti, "Chlamydia");
    assert_eq!(
        chlamydia.test_type.as_deref(),
        Some("PCR / NAAT (urine or swab)")
    );
    assert_eq!(chlamydia.result.as_deref(), Some("Detected"));

    for record in &records {
        assert_eq!(record.test_date, Some(ymd(2024, 5, 1)));
        assert_eq!(record.location, "Clinic A");
        assert_eq!(record.notes, "");
    }
    assert_eq!(hiv.entry_ts, chlamydia.entry_ts);
}

#[test]
fn test_add_another_restarts_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let (mut tracker, mut session) = configured_tracker(&dir);

    finish_two_sti_register(&mut tracker, &mut session);
    let t = tracker
        .register_action(&mut session, WizardEvent::AddAnother)
        .unwrap();
    assert_eq!(t.to, WizardStep::Date);
    assert_eq!(
        tracker.register_view(&mut session),
        StepView::Date { date: None }
    );

    tracker
        .register_action(&mut session, WizardEvent::SetDate(ymd(2024, 6, 2)))
        .unwrap();
    tracker
        .register_action(&mut session, WizardEvent::SelectStis(vec!["Syphilis".into()]))
        .unwrap();
    tracker
        .register_action(&mut session, WizardEvent::ChooseTests(BTreeMap::new()))
        .unwrap();
    tracker
        .register_action(
            &mut session,
            WizardEvent::Finish {
                location: "Home kit".into(),
                notes: "follow-up".into(),
            },
        )
        .unwrap();

    let records = tracker.history().records().to_vec();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].sti, "Syphilis");
    assert_eq!(
        records[2].test_type.as_deref(),
        Some("VDRL (Venereal Disease Research Laboratory)")
    );
}

#[test]
fn test_go_home_then_history_shows_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (mut tracker, mut session) = configured_tracker(&dir);

    finish_two_sti_register(&mut tracker, &mut session);
    tracker
        .register_action(&mut session, WizardEvent::GoHome)
        .unwrap();
    assert_eq!(session.page, Page::Home);

    tracker.navigate(&mut session, Page::History);
    let page = tracker.history_page(&Default::default());
    assert_eq!(page.total, 2);
    assert_eq!(page.caption(), "Showing 2 out of 2 records");
}

#[test]
fn test_records_from_draft_share_visit_fields() {
    let mut draft = sti_tracker_core::RegisterDraft {
        step: WizardStep::Details,
        date: Some(ymd(2024, 5, 1)),
        tested_stis: vec!["HIV".into(), "Chlamydia".into()],
        test_location: "Clinic A".into(),
        ..Default::default()
    };
    draft
        .sti_realised_tests
        .insert("HIV".into(), "Rapid antibody test".into());
    draft
        .sti_results
        .insert("HIV".into(), "Negative / Non-reactive".into());

    let ts = ymd(2024, 5, 3).and_hms_opt(17, 45, 12).unwrap().and_utc();
    let rows = records_from_draft(&draft, ts);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].test_type, None);
    assert_eq!(rows[1].result, None);
    let midnight = ymd(2024, 5, 3).and_hms_opt(0, 0, 0).unwrap().and_utc();
    assert!(rows.iter().all(|r| r.entry_ts == Some(midnight)));
}

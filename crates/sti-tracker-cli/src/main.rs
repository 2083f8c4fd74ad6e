//! Terminal front end for the STI tracker.
//!
//! Each invocation is one interaction: preferences are loaded, the command
//! runs against the stores and the result is printed. Logs go to stderr and
//! are appended to `log_files/app.log` under the data directory.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use sti_tracker_core::catalog::{self, PROFILE_TAGS, STIS};
use sti_tracker_core::config::LOG_FILENAME;
use sti_tracker_core::view::selector_for;
use sti_tracker_core::{
    AppConfig, Banner, BannerKind, DateRange, DisplayRecord, HistoryFilter, Page,
    PreferencesUpdate, Session, TestChoice, Tracker, WizardEvent,
};

#[derive(Parser, Debug)]
#[command(name = "sti-tracker", author, version, about = "Personal STI test tracker", long_about = None)]
struct Args {
    /// Data directory (defaults to $STI_TRACKER_DATA_DIR or the user data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show, change or reset preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Record the tests of one visit
    Register {
        /// Test date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Tested STI; only tracked STIs are kept
        #[arg(long = "sti")]
        stis: Vec<String>,

        /// Test type for an STI, as STI=TYPE
        #[arg(long = "test", value_parser = parse_pair)]
        tests: Vec<(String, String)>,

        /// Result for an STI, as STI=RESULT
        #[arg(long = "result", value_parser = parse_pair)]
        results: Vec<(String, String)>,

        #[arg(long, default_value = "")]
        location: String,

        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Show the test history
    History {
        #[arg(long = "sti")]
        stis: Vec<String>,

        #[arg(long = "result")]
        results: Vec<String>,

        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Delete history rows by label
    Delete {
        /// Row label as shown by `history`
        #[arg(long = "row", required = true, num_args = 1..)]
        rows: Vec<usize>,

        /// Delete without stopping at the preview
        #[arg(long)]
        yes: bool,
    },
    /// List STIs, test types, results, tags and reminder hours
    Options,
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    Show,
    Set {
        /// STI to track; replaces the tracked list
        #[arg(long = "track")]
        track: Vec<String>,

        /// Reminder hour (HH:00), or "none" to clear
        #[arg(long)]
        reminder: Option<String>,

        /// Profile tag; replaces the tag list
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Reset,
}

fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .ok_or_else(|| format!("expected STI=VALUE, got '{raw}'"))
}

/// Log to stderr and append to `<data_dir>/log_files/app.log`.
///
/// The returned guard flushes the file writer on drop and must be held
/// until `main` returns. Without a usable log directory only stderr is used.
fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let dir_error = std::fs::create_dir_all(&config.log_dir).err();

    let (file_layer, guard) = if dir_error.is_none() {
        let appender = tracing_appender::rolling::never(&config.log_dir, LOG_FILENAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(e) = dir_error {
        warn!(dir = %config.log_dir.display(), error = %e, "Log directory unavailable, logging to stderr only");
    }
    guard
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match args.data_dir {
        Some(dir) => AppConfig::with_data_dir(dir),
        None => AppConfig::from_env(),
    };
    let _log_guard = init_logging(&config);
    info!(data_dir = %config.data_dir.display(), "Starting STI tracker");

    let mut tracker = Tracker::open(config);
    let mut session = Session::new();
    let onboarding = tracker.start_session(&mut session);

    match args.command {
        Command::Prefs { action } => run_prefs(&mut tracker, &mut session, action),
        Command::Options => {
            print_options();
            Ok(())
        }
        _ if onboarding => {
            if let Some(hint) = session.take_first_time_hint() {
                eprintln!("{hint}");
            }
            bail!("no STIs tracked yet, run `sti-tracker prefs set --track <STI>` first")
        }
        Command::Register {
            date,
            stis,
            tests,
            results,
            location,
            notes,
        } => run_register(
            &mut tracker,
            &mut session,
            date,
            stis,
            choices_from(tests, results),
            location,
            notes,
        ),
        Command::History {
            stis,
            results,
            from,
            to,
        } => {
            tracker.navigate(&mut session, Page::History);
            let filter = HistoryFilter {
                stis,
                results,
                dates: DateRange::new(from, to),
            };
            print_history(&mut tracker, &filter);
            Ok(())
        }
        Command::Delete { rows, yes } => run_delete(&mut tracker, &mut session, rows, yes),
    }
}

fn run_prefs(tracker: &mut Tracker, session: &mut Session, action: PrefsAction) -> Result<()> {
    tracker.navigate(session, Page::Preferences);
    match action {
        PrefsAction::Show => {
            if let Some(hint) = session.take_first_time_hint() {
                println!("{hint}\n");
            }
            let form = tracker.preferences_form();
            println!("Tracked STIs:  {}", list_or_none(&form.tracked_stis));
            println!("Reminder hour: {}", form.reminder_hour);
            println!("Profile tags:  {}", list_or_none(&form.profile_tags));
        }
        PrefsAction::Set {
            track,
            reminder,
            tags,
        } => {
            if let Some(unknown) = track.iter().find(|s| !catalog::is_known_sti(s)) {
                bail!("unknown STI '{unknown}' (see `sti-tracker options`)");
            }
            if let Some(unknown) = tags.iter().find(|t| !PROFILE_TAGS.contains(&t.as_str())) {
                bail!("unknown profile tag '{unknown}' (see `sti-tracker options`)");
            }
            let reminder_hour = match reminder.as_deref() {
                None => None,
                Some("none") => Some(None),
                Some(hour) if catalog::is_valid_reminder_hour(hour) => Some(Some(hour.to_string())),
                Some(hour) => bail!("invalid reminder hour '{hour}', expected HH:00"),
            };
            let update = PreferencesUpdate {
                tracked_stis: (!track.is_empty()).then_some(track),
                reminder_hour,
                profile_tags: (!tags.is_empty()).then_some(tags),
            };
            print_banner(&tracker.save_preferences(session, update));
        }
        PrefsAction::Reset => print_banner(&tracker.reset_preferences(session)),
    }
    Ok(())
}

fn choices_from(
    tests: Vec<(String, String)>,
    results: Vec<(String, String)>,
) -> BTreeMap<String, TestChoice> {
    let mut choices: BTreeMap<String, TestChoice> = BTreeMap::new();
    for (sti, test_type) in tests {
        choices.entry(sti).or_default().test_type = Some(test_type);
    }
    for (sti, result) in results {
        choices.entry(sti).or_default().result = Some(result);
    }
    choices
}

fn run_register(
    tracker: &mut Tracker,
    session: &mut Session,
    date: NaiveDate,
    stis: Vec<String>,
    choices: BTreeMap<String, TestChoice>,
    location: String,
    notes: String,
) -> Result<()> {
    tracker.navigate(session, Page::Register);

    let events = [
        WizardEvent::SetDate(date),
        WizardEvent::SelectStis(stis),
        WizardEvent::ChooseTests(choices),
        WizardEvent::Finish { location, notes },
    ];
    let mut written = 0;
    for event in events {
        let transition = tracker
            .register_action(session, event)
            .context("register could not be completed")?;
        written += transition.records_added;
    }

    if let Some(banner) = session.take_banner() {
        print_banner(&banner);
    }
    println!("{written} record(s) written.");
    tracker.register_action(session, WizardEvent::GoHome)?;
    Ok(())
}

fn run_delete(
    tracker: &mut Tracker,
    session: &mut Session,
    rows: Vec<usize>,
    yes: bool,
) -> Result<()> {
    tracker.navigate(session, Page::History);
    let snapshot = tracker.history().show();
    let labels: BTreeSet<usize> = rows.into_iter().collect();

    if let Some(missing) = labels.iter().find(|l| **l >= snapshot.len()) {
        bail!("no history row with label {missing}");
    }

    session.manage.set_enabled(true);
    for label in &labels {
        tracker.toggle_delete_mark(session, *label);
    }

    let mask = selector_for(session.manage.marked(), snapshot.len());
    let marked: Vec<DisplayRecord> = snapshot
        .into_iter()
        .zip(mask)
        .filter_map(|(row, flag)| flag.then_some(row))
        .collect();
    print_rows(&marked);
    if let Some(message) = session.manage.pending_message() {
        println!("{message}");
    }

    if !yes {
        tracker.cancel_delete(session);
        println!("Re-run with --yes to confirm.");
        return Ok(());
    }

    print_banner(&tracker.confirm_delete(session));
    Ok(())
}

fn print_history(tracker: &mut Tracker, filter: &HistoryFilter) {
    let page = tracker.history_page(filter);
    if page.is_empty() {
        println!("No records yet.");
        return;
    }
    print_rows(&page.rows);
    println!("{}", page.caption());
}

fn print_rows(rows: &[DisplayRecord]) {
    println!(
        "{:>5}  {:<10}  {:<28}  {:<32}  {:<24}  {:<16}  {:<10}  Notes",
        "Row", "Test date", "STI", "Test type", "Result", "Location", "Registered"
    );
    for row in rows {
        println!(
            "{:>5}  {:<10}  {:<28}  {:<32}  {:<24}  {:<16}  {:<10}  {}",
            row.label,
            row.test_date.map(|d| d.to_string()).unwrap_or_default(),
            row.sti,
            row.test_type.as_deref().unwrap_or(""),
            row.result.as_deref().unwrap_or(""),
            row.location,
            row.register_date
                .map(|ts| ts.date_naive().to_string())
                .unwrap_or_default(),
            row.notes,
        );
    }
}

fn print_options() {
    println!("STIs:");
    for sti in STIS {
        println!("  {sti}");
        println!("    test types: {}", catalog::test_types_for(sti).join(" | "));
        println!("    results:    {}", catalog::results_for(sti).join(" | "));
    }
    println!("Profile tags:");
    for tag in PROFILE_TAGS {
        println!("  {tag}");
    }
    println!("Reminder hours: {}", catalog::reminder_hours().join(" "));
}

fn print_banner(banner: &Banner) {
    let prefix = match banner.kind {
        BannerKind::Success => "ok",
        BannerKind::Info => "info",
        BannerKind::Warning => "warning",
    };
    println!("[{prefix}] {}", banner.text);
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

//! Command-line front-end for the birthday reminder.
//!
//! # Responsibility
//! - Map subcommands onto `ReminderSession` actions.
//! - Print alerts and list views as plain text.

mod config;
mod image;
mod watch;

use anyhow::{bail, Context, Result};
use birthday_core::db::open_db;
use birthday_core::{
    init_logging, Alert, AlertSeverity, Clock, KeyValueStorage, ListView, PersonId, PersonStore,
    ReminderSession, SortOrder, SqliteStorage, SubmitOutcome, SystemClock,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use config::AppConfig;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "birthday-reminder", version)]
#[command(about = "Keep a list of birthdays and count down to the next one")]
struct Cli {
    /// Directory holding the birthday database
    #[arg(long, global = true, value_name = "DIR", env = "BIRTHDAY_REMINDER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "BIRTHDAY_REMINDER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files
    #[arg(long, global = true, value_name = "DIR", env = "BIRTHDAY_REMINDER_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a person
    Add {
        #[arg(long)]
        name: String,
        /// Birth date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Photo file (png, jpg, gif, webp, bmp, svg)
        #[arg(long, value_name = "FILE")]
        image: PathBuf,
    },
    /// Change details of a person
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },
    /// Remove a person
    Remove { id: String },
    /// Remove everyone
    Clear,
    /// Show the list
    List {
        /// Include the time left until each next birthday
        #[arg(long)]
        countdown: bool,
        #[arg(long, default_value = "insertion")]
        sort: SortOrder,
    },
    /// Live countdowns, refreshed every second
    Watch {
        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<u32>,
        #[arg(long, default_value = "upcoming")]
        sort: SortOrder,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.data_dir, cli.log_dir, cli.log_level)?;

    init_logging(&config.log_level, &config.log_dir).context("failed to start logging")?;
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "failed to create data directory `{}`",
            config.data_dir.display()
        )
    })?;

    let conn = open_db(config.db_path())
        .with_context(|| format!("failed to open `{}`", config.db_path().display()))?;
    let store = PersonStore::load(SqliteStorage::new(&conn)).context("failed to load list")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut session = ReminderSession::new(store, clock);

    info!("event=cli_start module=cli status=ok people={}", session.store().len());
    run(&mut session, cli.command)
}

fn run<S: KeyValueStorage>(session: &mut ReminderSession<S>, command: Command) -> Result<()> {
    match command {
        Command::Add { name, date, image } => {
            session.set_name(name);
            session.set_image(image::read_data_url(&image)?);
            session.set_date(Some(date))?;
            submit(session)
        }
        Command::Edit {
            id,
            name,
            date,
            image,
        } => {
            let id = PersonId::from(id);
            if !session.begin_edit(&id) {
                bail!("no person with id `{id}`");
            }
            if let Some(name) = name {
                session.set_name(name);
            }
            if let Some(path) = image {
                session.set_image(image::read_data_url(&path)?);
            }
            if date.is_some() {
                session.set_date(date)?;
            }
            submit(session)
        }
        Command::Remove { id } => {
            let id = PersonId::from(id);
            if !session.remove(&id)? {
                println!("no person with id `{id}`");
                return Ok(());
            }
            print_alert(session.alert());
            Ok(())
        }
        Command::Clear => {
            session.clear()?;
            print_alert(session.alert());
            Ok(())
        }
        Command::List { countdown, sort } => {
            session.refresh_ages()?;
            if countdown {
                session.toggle_countdowns();
            }
            print_list(&session.list_view(sort));
            Ok(())
        }
        Command::Watch { ticks, sort } => {
            session.refresh_ages()?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start timer runtime")?;
            runtime.block_on(watch::run(session, sort, ticks))
        }
    }
}

fn submit<S: KeyValueStorage>(session: &mut ReminderSession<S>) -> Result<()> {
    let outcome = session.submit()?;
    print_alert(session.alert());
    match outcome {
        SubmitOutcome::Created(id) | SubmitOutcome::Updated(id) => {
            println!("id: {id}");
            Ok(())
        }
        SubmitOutcome::Rejected(reason) => bail!("{reason}"),
    }
}

fn print_alert(alert: &Alert) {
    if !alert.visible {
        return;
    }
    match alert.severity {
        Some(AlertSeverity::Error) => eprintln!("{}", alert.message),
        _ => println!("{}", alert.message),
    }
}

fn print_list(view: &ListView) {
    let Some(heading) = &view.heading else {
        println!("no birthdays in the list");
        return;
    };
    println!("{heading} (today: {})", view.today_count);
    for row in &view.rows {
        let person = &row.person;
        let date = person
            .date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());
        match row.countdown {
            Some(countdown) => println!(
                "{}  {}  {}  {}  {}",
                person.id, person.name, date, person.age, countdown
            ),
            None => println!("{}  {}  {}  {}", person.id, person.name, date, person.age),
        }
    }
}

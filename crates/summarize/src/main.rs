use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use summarize_core::config;
use summarize_core::local::LocalStore;
use summarize_core::remote::IssueStore;
use summarize_core::runner::run_command;
use summarize_core::store::{ChecklistRecord, ChecklistStore};
use summarize_core::workflow::{RunOptions, RunOutcome, run_daily};

#[derive(Debug, Parser)]
#[command(
    name = "summarize",
    version,
    about = "Daily GitHub follow-up checklist automation"
)]
struct Cli {
    #[arg(long, help = "Regenerate the checklist even if today's record already exists")]
    force: bool,
    #[arg(long, help = "Display the current daily checklist without modifying anything")]
    show: bool,
    #[arg(
        long,
        help = "Generate the checklist and print the would-be body without persisting it"
    )]
    dry_run: bool,
    #[arg(long, value_name = "PATH", help = "Configuration file (JSON)")]
    config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Persist checklists as dated markdown files in this directory instead of issues"
    )]
    tasks_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("summarize: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    dotenvy::dotenv().ok();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let config = config::load_config(&config_path)?;

    let tasks_dir = cli.tasks_dir.or_else(|| config.tasks_dir.clone());
    let store: Box<dyn ChecklistStore> = match tasks_dir {
        Some(tasks_dir) => Box::new(LocalStore::new(tasks_dir)),
        None => Box::new(IssueStore::new(config.require_target_repository()?)),
    };

    let options = RunOptions {
        force: cli.force,
        show: cli.show,
        dry_run: cli.dry_run,
    };
    let outcome = run_daily(&config, store.as_ref(), options, Utc::now(), |argv| {
        run_command(argv)
    })?;
    report(outcome);
    Ok(())
}

fn report(outcome: RunOutcome) {
    match outcome {
        RunOutcome::Shown {
            record,
            fallback,
            already_existed,
        } => {
            if fallback {
                println!("Today's issue not found; showing the most recent entry instead:\n");
            }
            if already_existed {
                println!(
                    "Today's checklist already exists (detected `Todos` record for the current America/New_York day)."
                );
                println!("Showing the current body instead of regenerating.\n");
            }
            show_record(&record);
        }
        RunOutcome::DryRun { title, body } => {
            println!("{title}");
            println!("{}", "=".repeat(title.len()));
            println!("{body}");
        }
        RunOutcome::Created {
            record,
            closed_previous,
        } => match closed_previous {
            Some(number) => {
                println!("Closed previous issue #{number} and created: {}", record.url)
            }
            None => println!("Issue created: {}", record.url),
        },
        RunOutcome::Updated { record, reopened } => {
            if reopened {
                println!("Issue updated and reopened: {}", record.url);
            } else {
                println!("Issue updated: {}", record.url);
            }
        }
    }
}

fn show_record(record: &ChecklistRecord) {
    println!("{} — {}", record.title, record.url);
    println!();
    println!("{}", record.body);
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use campus_engine::{EngineError, ErrorKind};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

/// Campus event calendar, venue booking, and resource allocation queries
/// over a JSON dataset.
#[derive(Parser)]
#[command(name = "campus", version, about)]
struct Cli {
    /// Dataset file with venues, resources, events, and allocations
    #[arg(short, long, global = true, default_value = "campus.json")]
    data: PathBuf,

    /// Reference instant (RFC 3339); defaults to the system clock
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List upcoming events, or one month's calendar with recurring instances
    Calendar {
        /// Month to show, as YYYY-MM
        #[arg(short, long)]
        month: Option<String>,
        /// Only approved events
        #[arg(long)]
        approved_only: bool,
        /// Only events at this venue
        #[arg(long)]
        venue: Option<i64>,
    },
    /// Occurrence dates of one event between two dates (inclusive)
    Expand {
        #[arg(long)]
        event: i64,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Check whether a venue slot collides with an approved event
    CheckConflict {
        #[arg(long)]
        venue: i64,
        #[arg(long)]
        date: NaiveDate,
        /// Start time, HH:MM
        #[arg(long)]
        start: campus_engine::TimeOfDay,
        /// End time, HH:MM
        #[arg(long)]
        end: campus_engine::TimeOfDay,
    },
    /// Validate and store a new event from a JSON draft file
    CreateEvent {
        #[arg(long)]
        draft: PathBuf,
        /// Save the dataset after a successful change
        #[arg(long)]
        write: bool,
    },
    /// Approve a pending event
    ApproveEvent {
        #[arg(long)]
        event: i64,
        #[arg(long)]
        write: bool,
    },
    /// Supply, committed, and available counts of a resource
    Availability {
        #[arg(long)]
        resource: i64,
        /// Also report whether this quantity could be requested
        #[arg(long)]
        quantity: Option<u32>,
    },
    /// Request some of a resource for an event
    Allocate {
        #[arg(long)]
        event: i64,
        #[arg(long)]
        resource: i64,
        #[arg(long)]
        quantity: u32,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        write: bool,
    },
    /// Approve, deny, or cancel an allocation
    SetStatus {
        #[arg(long)]
        allocation: i64,
        #[arg(long, value_enum)]
        status: StatusArg,
        #[arg(long)]
        write: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Approved,
    Denied,
    Cancelled,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Validation => 2,
        ErrorKind::Conflict => 3,
        ErrorKind::NotFound => 4,
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = err
                .downcast_ref::<EngineError>()
                .map_or(ErrorKind::Internal, EngineError::kind);
            let label = serde_json::to_value(kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_else(|| "INTERNAL".to_string());
            eprintln!("error[{label}]: {err:#}");
            ExitCode::from(exit_code(kind))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = commands::Context::load(&cli.data, cli.now.unwrap_or_else(Utc::now))?;

    match cli.command {
        Command::Calendar {
            month,
            approved_only,
            venue,
        } => commands::calendar(&ctx, month.as_deref(), approved_only, venue),
        Command::Expand { event, from, to } => commands::expand(&ctx, event, from, to),
        Command::CheckConflict {
            venue,
            date,
            start,
            end,
        } => commands::check_conflict(&ctx, venue, date, start, end),
        Command::CreateEvent { draft, write } => commands::create_event(ctx, &draft, write),
        Command::ApproveEvent { event, write } => commands::approve_event(ctx, event, write),
        Command::Availability { resource, quantity } => {
            commands::availability(&ctx, resource, quantity)
        }
        Command::Allocate {
            event,
            resource,
            quantity,
            notes,
            write,
        } => commands::allocate(ctx, event, resource, quantity, notes, write),
        Command::SetStatus {
            allocation,
            status,
            write,
        } => {
            let status = match status {
                StatusArg::Approved => campus_engine::AllocationStatus::Approved,
                StatusArg::Denied => campus_engine::AllocationStatus::Denied,
                StatusArg::Cancelled => campus_engine::AllocationStatus::Cancelled,
            };
            commands::set_status(ctx, allocation, status, write)
        }
    }
}

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use dashboard_aggregates::aggregate::{self, SortDirection};
use dashboard_aggregates::config::{SummaryConfig, DEFAULT_RECENT_LIMIT, DEFAULT_TREND_DAYS};
use dashboard_aggregates::models::non_empty;
use dashboard_aggregates::snapshot::{self, DashboardSnapshot, SnapshotPaths};
use dashboard_aggregates::{dates, logging, report, summary};

#[derive(Parser)]
#[command(name = "dashboard-aggregates")]
#[command(about = "Dashboard statistics from school management API snapshots", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Users export (.json or .csv)
    #[arg(long)]
    users: Option<PathBuf>,
    /// Attendance submissions export
    #[arg(long)]
    submissions: Option<PathBuf>,
    /// Attendance log export
    #[arg(long)]
    logs: Option<PathBuf>,
    /// Students export
    #[arg(long)]
    students: Option<PathBuf>,
    /// Last day of every trend window (YYYY-MM-DD); defaults to today
    #[arg(long, env = "DASHBOARD_REFERENCE_DATE")]
    reference_date: Option<NaiveDate>,
    #[arg(long, env = "DASHBOARD_TREND_DAYS", default_value_t = DEFAULT_TREND_DAYS)]
    trend_days: usize,
    #[arg(long, env = "DASHBOARD_RECENT_LIMIT", default_value_t = DEFAULT_RECENT_LIMIT)]
    recent_limit: usize,
}

impl SnapshotArgs {
    fn paths(&self) -> SnapshotPaths {
        SnapshotPaths {
            users: self.users.clone(),
            submissions: self.submissions.clone(),
            logs: self.logs.clone(),
            students: self.students.clone(),
        }
    }

    fn config(&self) -> SummaryConfig {
        SummaryConfig::new(self.reference_date.unwrap_or_else(dates::today))
            .with_trend_days(self.trend_days)
            .with_recent_limit(self.recent_limit)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute dashboard statistics as JSON
    Summary {
        #[command(flatten)]
        snapshot: SnapshotArgs,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        snapshot: SnapshotArgs,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
    /// Filter and sort a users export
    Users {
        #[arg(long)]
        users: PathBuf,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// Earliest createdAt day to include (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Latest createdAt day to include (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
        #[arg(long, default_value = "createdAt")]
        sort_by: String,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        direction: SortDirection,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn load_snapshot(args: &SnapshotArgs) -> anyhow::Result<DashboardSnapshot> {
    DashboardSnapshot::load(&args.paths()).context("failed to load dashboard snapshot")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose).context("failed to initialize logging")?;

    match cli.command {
        Commands::Summary { snapshot, out } => {
            let data = load_snapshot(&snapshot)?;
            let summary = summary::summarize(&data, &snapshot.config());
            let json =
                serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;

            match out {
                Some(out) => {
                    std::fs::write(&out, json)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Summary written to {}.", out.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Report { snapshot, out } => {
            let data = load_snapshot(&snapshot)?;
            let summary = summary::summarize(&data, &snapshot.config());
            let report = report::build_report(&summary);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Users {
            users,
            role,
            gender,
            status,
            since,
            until,
            sort_by,
            direction,
            limit,
        } => {
            let records = snapshot::load_users(&users)
                .with_context(|| format!("failed to load users from {}", users.display()))?;

            let matching = aggregate::filter_by_exact_match(
                &records,
                &[
                    ("role", role.as_deref().unwrap_or_default()),
                    ("gender", gender.as_deref().unwrap_or_default()),
                    ("status", status.as_deref().unwrap_or_default()),
                ],
            );
            let in_range = aggregate::filter_by_date_range(
                &matching,
                |user| user.created_at.as_deref(),
                since,
                until,
            );
            let sorted = aggregate::sort_by(&in_range, &sort_by, direction);
            let shown = aggregate::top_n(&sorted, limit);

            if shown.is_empty() {
                println!("No users match these filters.");
                return Ok(());
            }

            println!("Showing {} of {} matching users:", shown.len(), sorted.len());
            for user in shown.iter() {
                println!(
                    "- {} <{}> {} ({}) joined {}",
                    non_empty(&user.name).unwrap_or("N/A"),
                    non_empty(&user.email).unwrap_or("N/A"),
                    user.role.map(|role| role.as_str()).unwrap_or("unknown"),
                    user.status.map(|status| status.as_str()).unwrap_or("unset"),
                    non_empty(&user.created_at).unwrap_or("N/A")
                );
            }
        }
    }

    Ok(())
}

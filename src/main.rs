//! trailmap CLI: terminal roadmap tracker.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use trailmap::backup::{self, Backup};
use trailmap::calendar::{self, PlanPosition};
use trailmap::config::TrailConfig;
use trailmap::error::TrailResult;
use trailmap::paths::TrailPaths;
use trailmap::plan::Plan;
use trailmap::progress::{DurableProgressStore, MemProgressStore, ProgressStore, TaskStatus};
use trailmap::report::WeekReport;
use trailmap::tui::{TrailTui, TuiSettings};

#[derive(Parser)]
#[command(name = "trailmap", version, about = "Terminal roadmap tracker")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/trailmap/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Plan file to use instead of the bundled reference plan.
    #[arg(long, global = true)]
    plan: Option<PathBuf>,

    /// Keep config, progress and logs under this directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use an in-memory store; nothing is saved.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the dashboard (default).
    Tui,

    /// Print overall progress and pace.
    Status,

    /// Inspect the plan.
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Read or change one action's progress.
    Action {
        #[command(subcommand)]
        action: ActionCommand,
    },

    /// Export, import or reset progress.
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Print a Markdown execution report for one week.
    Report {
        /// Month number (defaults to the current month).
        #[arg(long)]
        month: Option<u32>,

        /// Week number (defaults to the month's first week).
        #[arg(long)]
        week: Option<u32>,
    },

    /// Manage the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Validate the plan and print its size.
    Check,
    /// Print phases, months and weeks.
    Outline,
}

#[derive(Subcommand)]
enum ActionCommand {
    /// Show an action with its status and struggle time.
    Show { id: String },
    /// Advance the action to its next status.
    Cycle { id: String },
    /// Set the status explicitly (not-started, in-progress, blocked, completed).
    Set { id: String, status: TaskStatus },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write every progress entry to a JSON file.
    Export {
        /// Destination file, or `-` for stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Merge a backup file into the store.
    Import { file: PathBuf },
    /// Delete all progress.
    Reset {
        /// Required: confirms the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a config file with the default settings.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration.
    Show,
}

/// Everything resolved from flags, environment and the config file.
struct Context {
    paths: TrailPaths,
    config_path: PathBuf,
    config: TrailConfig,
    plan_override: Option<PathBuf>,
    ephemeral: bool,
}

impl Context {
    /// Directories from the command line or XDG. The config file may still
    /// move `data_dir`; the state dir (and the log file in it) is final here.
    fn base_paths(cli: &Cli) -> TrailResult<TrailPaths> {
        Ok(match &cli.data_dir {
            Some(dir) => TrailPaths::rooted(dir),
            None => TrailPaths::resolve()?,
        })
    }

    fn resolve(cli: &Cli, mut paths: TrailPaths) -> TrailResult<Self> {
        let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
        let config = TrailConfig::load_or_default(&config_path)?;
        if cli.data_dir.is_none() {
            if let Some(dir) = &config.data_dir {
                paths.data_dir = dir.clone();
            }
        }
        Ok(Self {
            paths,
            config_path,
            config,
            plan_override: cli.plan.clone(),
            ephemeral: cli.ephemeral,
        })
    }

    fn load_plan(&self) -> TrailResult<Plan> {
        let file = self.plan_override.as_ref().or(self.config.plan_file.as_ref());
        Ok(match file {
            Some(path) => Plan::load(path)?,
            None => Plan::reference()?,
        })
    }

    fn start_date(&self, plan: &Plan) -> NaiveDate {
        self.config.start_date.unwrap_or(plan.start_date)
    }

    fn open_store(&self) -> TrailResult<Box<dyn ProgressStore>> {
        if self.ephemeral {
            tracing::info!("using in-memory store; progress will not be saved");
            return Ok(Box::new(MemProgressStore::new()));
        }
        Ok(Box::new(DurableProgressStore::open(&self.paths.store_dir())?))
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match log_file {
        // The TUI owns the terminal, so logs go to a file.
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .into_diagnostic()?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Commands::Tui);
    let paths = Context::base_paths(&cli)?;
    let log_file = matches!(command, Commands::Tui).then(|| paths.log_file());
    init_logging(log_file.as_deref())?;
    let ctx = Context::resolve(&cli, paths)?;

    match &command {
        Commands::Tui => {
            let plan = ctx.load_plan()?;
            let store = ctx.open_store()?;
            let settings = TuiSettings {
                start_date: ctx.start_date(&plan),
                total_plan_days: ctx.config.total_plan_days,
                session: ctx.config.session_length(),
                backups_dir: ctx.paths.backups_dir(),
            };
            tracing::info!(plan = %plan.title, "starting dashboard");
            TrailTui::new(plan, store, settings).run()?;
        }

        Commands::Status => {
            let plan = ctx.load_plan()?;
            let store = ctx.open_store()?;
            print_status(&ctx, &plan, &*store)?;
        }

        Commands::Plan { action } => {
            let plan = ctx.load_plan()?;
            match action {
                PlanAction::Check => {
                    println!("Plan \"{}\" is valid.", plan.title);
                    println!(
                        "  {} phases, {} months, {} weeks, {} actions",
                        plan.phases.len(),
                        plan.months.len(),
                        plan.months.iter().map(|m| m.weeks.len()).sum::<usize>(),
                        plan.action_count()
                    );
                }
                PlanAction::Outline => print_outline(&plan),
            }
        }

        Commands::Action { action } => {
            let plan = ctx.load_plan()?;
            let store = ctx.open_store()?;
            let id = match action {
                ActionCommand::Show { id } | ActionCommand::Cycle { id } | ActionCommand::Set { id, .. } => id,
            };
            let Some(found) = plan.locate(id) else {
                miette::bail!("no action with id \"{id}\" in plan \"{}\"", plan.title);
            };
            match action {
                ActionCommand::Show { .. } => {
                    let a = found.action;
                    println!("{} [{}]", a.id, found.lane);
                    println!("  {}", a.description);
                    println!("  month {} · week {}", found.month.number, found.week.number);
                    println!("  effort:   {:.1} h", a.effort_hours);
                    println!("  ai:       {}", a.ai_policy);
                    if !a.output_artifact.is_empty() {
                        println!("  output:   {}", a.output_artifact);
                    }
                    if a.anchor {
                        println!("  anchor project");
                    }
                    println!("  status:   {}", store.status(id)?);
                    println!("  struggle: {} min", store.struggle_minutes(id)?);
                }
                ActionCommand::Cycle { .. } => {
                    let status = store.cycle_status(id)?;
                    println!("{id}: {status}");
                }
                ActionCommand::Set { status, .. } => {
                    store.set_status(id, *status)?;
                    println!("{id}: {status}");
                }
            }
        }

        Commands::Backup { action } => {
            let store = ctx.open_store()?;
            match action {
                BackupAction::Export { output } => {
                    let snapshot = backup::export(&store)?;
                    match output.as_deref() {
                        Some(path) if path == Path::new("-") => println!("{}", snapshot.to_json_pretty()),
                        Some(path) => {
                            snapshot.write_file(path)?;
                            println!("Exported {} entries to {}", snapshot.len(), path.display());
                        }
                        None => {
                            let path = backup::default_path(&ctx.paths.backups_dir(), today());
                            snapshot.write_file(&path)?;
                            println!("Exported {} entries to {}", snapshot.len(), path.display());
                        }
                    }
                }
                BackupAction::Import { file } => {
                    let snapshot = Backup::read_file(file)?;
                    let report = backup::import(&store, &snapshot)?;
                    println!("Restored {} entries", report.restored);
                    if report.skipped > 0 {
                        println!("Skipped {} keys outside the progress namespace", report.skipped);
                    }
                }
                BackupAction::Reset { yes } => {
                    if !yes {
                        miette::bail!("refusing to delete all progress without --yes; export a backup first");
                    }
                    let removed = backup::reset(&store)?;
                    println!("Removed {removed} entries");
                }
            }
        }

        Commands::Report { month, week } => {
            let plan = ctx.load_plan()?;
            let store = ctx.open_store()?;
            let month = match (month, week) {
                (Some(m), _) => *m,
                (None, Some(w)) => plan
                    .months
                    .iter()
                    .find(|m| m.week(*w).is_some())
                    .map(|m| m.number)
                    .ok_or_else(|| miette::miette!("no month contains week {w}"))?,
                (None, None) => PlanPosition::of(&plan, ctx.start_date(&plan), today()).month,
            };
            let Some(month_data) = plan.month(month) else {
                miette::bail!("month {month} is not part of the plan");
            };
            let week = match week {
                Some(w) => *w,
                None => month_data
                    .first_week()
                    .map(|w| w.number)
                    .ok_or_else(|| miette::miette!("month {month} has no weeks"))?,
            };
            let Some(report) = WeekReport::build(&plan, month, week, &store)? else {
                miette::bail!("week {week} is not part of month {month}");
            };
            print!("{}", report.render_markdown(today()));
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                if ctx.config_path.exists() && !force {
                    miette::bail!(
                        "config already exists at {} (pass --force to overwrite it)",
                        ctx.config_path.display()
                    );
                }
                TrailConfig::default().save(&ctx.config_path)?;
                ctx.paths.ensure_dirs()?;
                println!("Wrote {}", ctx.config_path.display());
            }
            ConfigAction::Show => {
                println!("# {}", ctx.config_path.display());
                print!("{}", toml::to_string_pretty(&ctx.config).into_diagnostic()?);
                println!("# data:  {}", ctx.paths.data_dir.display());
                println!("# log:   {}", ctx.paths.log_file().display());
            }
        },
    }

    Ok(())
}

fn print_status(ctx: &Context, plan: &Plan, store: &dyn ProgressStore) -> Result<()> {
    let clock = chrono::Local::now().naive_local();
    let today = clock.date();
    let start = ctx.start_date(plan);
    let position = PlanPosition::of(plan, start, today);
    let progress = calendar::aggregate_progress(plan, store)?;
    let expected = calendar::expected_progress(start, clock, ctx.config.total_plan_days);

    println!("{}", plan.title);
    println!("  started {start} · today {today}");
    let phase = plan
        .phase_for_month(position.month)
        .map_or("no phase", |p| p.title.as_str());
    match plan.month(position.month) {
        Some(m) => println!("  month {}: {} ({phase})", m.number, m.title),
        None => println!("  month {} ({phase})", position.month),
    }
    if position.past_end() {
        println!("  the plan's last month has passed");
    } else if position.before_start() {
        println!("  the plan has not started yet");
    }
    println!(
        "  progress {}/{} ({}%) · expected {}% · {}",
        progress.completed,
        progress.total,
        progress.percentage,
        expected,
        match calendar::pace(progress.percentage, expected) {
            calendar::Pace::OnTrack => "on track",
            calendar::Pace::Behind => "behind",
        }
    );
    Ok(())
}

fn print_outline(plan: &Plan) {
    println!("{}", plan.title);
    for phase in &plan.phases {
        println!("\n{} [{}]", phase.title, phase.mode);
        for month in plan.months_in_phase(phase) {
            println!("  Month {}: {} ({} weeks)", month.number, month.title, month.weeks.len());
            for week in &month.weeks {
                println!("    week {}: {} actions", week.number, week.lanes.len());
            }
        }
    }
}

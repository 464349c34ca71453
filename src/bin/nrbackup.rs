use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nrbackup::api::{NewRelicApi, UserFilter};
use nrbackup::backup::{run_backup, BackupKind, BackupOptions};
use nrbackup::client::Clients;
use nrbackup::config::AppConfig;
use nrbackup::error::Result;
use nrbackup::insert::insert_events_file;
use nrbackup::manage::{change, get, templates, OutputFormat};
use nrbackup::models::ConditionCategory;
use nrbackup::restore::input::split_file_list;
use nrbackup::restore::{restore, RestoreInput, RestoreKind, UpdateMode};
use nrbackup::tracker::{ItemReport, ResultTracker};
use nrbackup::version::VERSION;

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about = "Back up and restore New Relic configuration", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write live configuration to backup files
    Backup {
        #[command(subcommand)]
        target: BackupTarget,
    },
    /// Reconcile backup files against the live service
    Restore {
        #[command(subcommand)]
        target: RestoreTarget,
    },
    /// Send local data to the service
    Insert {
        #[command(subcommand)]
        target: InsertTarget,
    },
    /// List or show live items
    Get {
        #[command(subcommand)]
        target: GetTarget,
    },
    /// Create one item from a JSON file
    Create {
        #[command(subcommand)]
        target: CreateTarget,
    },
    /// Change one item from a JSON file
    Update {
        #[command(subcommand)]
        target: UpdateTarget,
    },
    /// Delete one item
    Delete {
        #[command(subcommand)]
        target: DeleteTarget,
    },
    /// Change some attributes of one item
    Patch {
        #[command(subcommand)]
        target: PatchTarget,
    },
    /// Attach something to an item
    Add {
        #[command(subcommand)]
        target: AddTarget,
    },
    /// Write a starter file for the create and update commands
    Take {
        #[command(subcommand)]
        target: TakeTarget,
    },
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

fn parse_category(value: &str) -> std::result::Result<ConditionCategory, String> {
    value.parse().map_err(|e: nrbackup::BackupError| e.to_string())
}

#[derive(Subcommand, Debug)]
enum GetTarget {
    Policies {
        /// Only policies whose name contains this text
        #[arg(short, long)]
        name: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    Channels(OutputArgs),
    Conditions {
        policy_id: i64,
        /// Only this condition type
        #[arg(short = 't', long = "type", value_parser = parse_category)]
        category: Option<ConditionCategory>,
        #[command(flatten)]
        output: OutputArgs,
    },
    Dashboards(OutputArgs),
    Dashboard {
        id: i64,
    },
    Monitors(OutputArgs),
    Monitor {
        id: String,
    },
    Labels(OutputArgs),
    /// Monitors carrying a `category:name` label
    LabelMonitors {
        label: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    Users {
        /// Comma separated user ids
        #[arg(short, long)]
        ids: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand, Debug)]
enum CreateTarget {
    Policy {
        #[arg(short, long)]
        file: PathBuf,
    },
    Channel {
        #[arg(short, long)]
        file: PathBuf,
    },
    Condition {
        policy_id: i64,
        #[arg(short = 't', long = "type", value_parser = parse_category)]
        category: ConditionCategory,
        #[arg(short, long)]
        file: PathBuf,
    },
    Dashboard {
        #[arg(short, long)]
        file: PathBuf,
    },
    Monitor {
        #[arg(short, long)]
        file: PathBuf,
        /// Script source for scripted monitors
        #[arg(short, long)]
        script_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum UpdateTarget {
    Policy {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace the channels a policy notifies
    Channels {
        /// JSON file with policy_id and channel_ids
        #[arg(short, long)]
        file: PathBuf,
    },
    Condition {
        condition_id: i64,
        #[arg(short = 't', long = "type", value_parser = parse_category)]
        category: ConditionCategory,
        #[arg(short, long)]
        file: PathBuf,
    },
    Dashboard {
        #[arg(short, long)]
        file: PathBuf,
    },
    Monitor {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        script_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum DeleteTarget {
    Policy {
        id: i64,
    },
    Channel {
        id: i64,
    },
    Condition {
        id: i64,
        #[arg(short = 't', long = "type", value_parser = parse_category)]
        category: ConditionCategory,
    },
    Dashboard {
        id: i64,
    },
    Monitor {
        id: String,
    },
    /// Remove a `category:name` label from a monitor
    Label {
        monitor_id: String,
        label: String,
    },
}

#[derive(Subcommand, Debug)]
enum PatchTarget {
    Monitor {
        /// JSON file with the monitor id and the attributes to change
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum AddTarget {
    /// Attach a `category:name` label to a monitor
    Label {
        monitor_id: String,
        label: String,
    },
}

#[derive(Subcommand, Debug)]
enum TakeTarget {
    Template {
        name: String,
        /// Directory the template file is written to
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum InsertTarget {
    /// Post custom events from a JSON file
    CustomEvents {
        /// Account the events belong to
        #[arg(short, long)]
        account_id: String,
        /// Insert key of the account
        #[arg(short = 'k', long)]
        insert_key: String,
        /// JSON file with one event or an array of events
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum BackupTarget {
    AlertConditions {
        #[command(flatten)]
        common: BackupArgs,
        /// Leave dependent monitors out of the backup
        #[arg(short, long)]
        no_deps: bool,
    },
    Monitors {
        #[command(flatten)]
        common: BackupArgs,
    },
    Dashboards {
        /// Directory the backup files are written to
        #[arg(short, long)]
        dir: PathBuf,
        /// Result file listing failed items
        #[arg(short, long)]
        result_file: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
struct BackupArgs {
    /// Directory the backup files are written to
    #[arg(short, long)]
    dir: PathBuf,
    /// Write one bundle file instead of one file per item
    #[arg(short, long)]
    single_file: bool,
    /// Result file listing failed items
    #[arg(short, long)]
    result_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum RestoreTarget {
    AlertConditions(RestoreArgs),
    Monitors(RestoreArgs),
    Dashboards(RestoreArgs),
}

#[derive(ClapArgs, Debug)]
struct RestoreArgs {
    /// Directory scanned for backup files
    #[arg(short, long)]
    dir: Option<PathBuf>,
    /// Comma separated backup files
    #[arg(short, long)]
    files: Option<String>,
    /// File listing backup files, one per line
    #[arg(short = 'F', long)]
    log_file: Option<PathBuf>,
    /// How existing items are treated
    #[arg(short = 'm', long, value_enum, default_value_t = UpdateMode::Skip)]
    update_mode: UpdateMode,
    /// Result file listing failed items
    #[arg(short, long)]
    result_file: Option<PathBuf>,
}

impl RestoreArgs {
    fn input(&self) -> RestoreInput {
        RestoreInput {
            dir: self.dir.clone(),
            files: self.files.as_deref().map(split_file_list).unwrap_or_default(),
            log_file: self.log_file.clone(),
        }
    }
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "nrbackup.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

fn print_results(tracker: &ResultTracker, report: &ItemReport) {
    println!("{}", tracker.render());
    println!("{}", report.render());
}

async fn run_backup_command(api: &NewRelicApi, target: BackupTarget) -> ExitCode {
    let (kind, options) = match target {
        BackupTarget::AlertConditions { common, no_deps } => {
            let mut options = backup_options(common, BackupKind::AlertConditions);
            options.no_deps = no_deps;
            (BackupKind::AlertConditions, options)
        }
        BackupTarget::Monitors { common } => {
            (BackupKind::Monitors, backup_options(common, BackupKind::Monitors))
        }
        BackupTarget::Dashboards { dir, result_file } => {
            let mut options = BackupOptions::new(dir, BackupKind::Dashboards);
            if let Some(result_file) = result_file {
                options.result_file = result_file;
            }
            (BackupKind::Dashboards, options)
        }
    };

    match run_backup(api, kind, &options).await {
        Ok(report) => {
            print_results(api.tracker(), &report);
            exit_for(&report)
        }
        Err(e) => {
            let report = ItemReport::not_started(kind.title(), options.dir.display().to_string(), &e);
            print_results(api.tracker(), &report);
            error!(error = %e, "Backup failed.");
            ExitCode::FAILURE
        }
    }
}

fn backup_options(args: BackupArgs, kind: BackupKind) -> BackupOptions {
    let mut options = BackupOptions::new(args.dir, kind);
    options.single_file = args.single_file;
    if let Some(result_file) = args.result_file {
        options.result_file = result_file;
    }
    options
}

async fn run_restore_command(api: &NewRelicApi, target: RestoreTarget) -> ExitCode {
    let (kind, args) = match target {
        RestoreTarget::AlertConditions(args) => (RestoreKind::AlertConditions, args),
        RestoreTarget::Monitors(args) => (RestoreKind::Monitors, args),
        RestoreTarget::Dashboards(args) => (RestoreKind::Dashboards, args),
    };
    let result_file = args
        .result_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(kind.default_result_file()));

    let input = args.input();
    match restore(api, kind, &input, args.update_mode, &result_file).await {
        Ok(report) => {
            print_results(api.tracker(), &report);
            exit_for(&report)
        }
        Err(e) => {
            let report = ItemReport::not_started(kind.title(), input.describe(), &e);
            print_results(api.tracker(), &report);
            error!(error = %e, "Restore failed.");
            ExitCode::FAILURE
        }
    }
}

async fn run_insert_command(api: &NewRelicApi, target: InsertTarget) -> ExitCode {
    let InsertTarget::CustomEvents {
        account_id,
        insert_key,
        file,
    } = target;
    let result = insert_events_file(api, &account_id, &insert_key, &file).await;
    println!("{}", api.tracker().render());
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Failed to insert custom events.");
            ExitCode::FAILURE
        }
    }
}

async fn run_get_command(api: &NewRelicApi, target: GetTarget) -> Result<String> {
    match target {
        GetTarget::Policies { name, output } => {
            get::get_policies(api, name.as_deref(), output.output).await
        }
        GetTarget::Channels(output) => get::get_channels(api, output.output).await,
        GetTarget::Conditions {
            policy_id,
            category,
            output,
        } => get::get_conditions(api, policy_id, category, output.output).await,
        GetTarget::Dashboards(output) => get::get_dashboards(api, output.output).await,
        GetTarget::Dashboard { id } => get::get_dashboard(api, id).await,
        GetTarget::Monitors(output) => get::get_monitors(api, output.output).await,
        GetTarget::Monitor { id } => get::get_monitor(api, &id).await,
        GetTarget::Labels(output) => get::get_labels(api, output.output).await,
        GetTarget::LabelMonitors { label, output } => {
            get::get_label_monitors(api, &label, output.output).await
        }
        GetTarget::Users { ids, email, output } => {
            get::get_users(api, &UserFilter { ids, email }, output.output).await
        }
    }
}

async fn run_create_command(api: &NewRelicApi, target: CreateTarget) -> Result<String> {
    match target {
        CreateTarget::Policy { file } => change::create_policy(api, &file).await,
        CreateTarget::Channel { file } => change::create_channel(api, &file).await,
        CreateTarget::Condition {
            policy_id,
            category,
            file,
        } => change::create_condition(api, policy_id, category, &file).await,
        CreateTarget::Dashboard { file } => change::create_dashboard(api, &file).await,
        CreateTarget::Monitor { file, script_file } => {
            change::create_monitor(api, &file, script_file.as_deref()).await
        }
    }
}

async fn run_update_command(api: &NewRelicApi, target: UpdateTarget) -> Result<String> {
    match target {
        UpdateTarget::Policy { file } => change::update_policy(api, &file).await,
        UpdateTarget::Channels { file } => change::update_channels(api, &file).await,
        UpdateTarget::Condition {
            condition_id,
            category,
            file,
        } => change::update_condition(api, condition_id, category, &file).await,
        UpdateTarget::Dashboard { file } => change::update_dashboard(api, &file).await,
        UpdateTarget::Monitor { file, script_file } => {
            change::update_monitor(api, &file, script_file.as_deref()).await
        }
    }
}

async fn run_delete_command(api: &NewRelicApi, target: DeleteTarget) -> Result<String> {
    match target {
        DeleteTarget::Policy { id } => change::delete_policy(api, id).await,
        DeleteTarget::Channel { id } => change::delete_channel(api, id).await,
        DeleteTarget::Condition { id, category } => {
            change::delete_condition(api, category, id).await
        }
        DeleteTarget::Dashboard { id } => change::delete_dashboard(api, id).await,
        DeleteTarget::Monitor { id } => change::delete_monitor(api, &id).await,
        DeleteTarget::Label { monitor_id, label } => {
            change::delete_monitor_label(api, &monitor_id, &label).await
        }
    }
}

/// Prints what a single-resource command produced, then the call counts.
fn finish_manage(api: &NewRelicApi, result: Result<String>) -> ExitCode {
    match result {
        Ok(output) => {
            println!("{output}");
            println!("{}", api.tracker().render());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", api.tracker().render());
            error!(error = %e, "Command failed.");
            ExitCode::FAILURE
        }
    }
}

fn run_take_command(target: TakeTarget) -> ExitCode {
    let TakeTarget::Template { name, dir } = target;
    match templates::take_template(&name, &dir) {
        Ok((_, printed)) => {
            println!("{printed}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Could not write template.");
            ExitCode::FAILURE
        }
    }
}

fn exit_for(report: &ItemReport) -> ExitCode {
    if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref());
    let log_dir = config
        .as_ref()
        .map(|c| c.log_dir.clone())
        .unwrap_or_else(|_| "logs".to_string());
    init_logging(&log_dir);
    info!(version = VERSION, "Starting nrbackup.");

    // Templates are local files; no account is needed.
    let command = match args.command {
        Command::Take { target } => return run_take_command(target),
        command => command,
    };

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Could not load configuration.");
            return ExitCode::FAILURE;
        }
    };
    let clients = match Clients::from_config(&config) {
        Ok(clients) => clients,
        Err(e) => {
            error!(error = %e, "Could not build API clients.");
            return ExitCode::FAILURE;
        }
    };
    let api = NewRelicApi::new(clients, ResultTracker::new());

    match command {
        Command::Backup { target } => run_backup_command(&api, target).await,
        Command::Restore { target } => run_restore_command(&api, target).await,
        Command::Insert { target } => run_insert_command(&api, target).await,
        Command::Get { target } => finish_manage(&api, run_get_command(&api, target).await),
        Command::Create { target } => finish_manage(&api, run_create_command(&api, target).await),
        Command::Update { target } => finish_manage(&api, run_update_command(&api, target).await),
        Command::Delete { target } => finish_manage(&api, run_delete_command(&api, target).await),
        Command::Patch {
            target: PatchTarget::Monitor { file },
        } => finish_manage(&api, change::patch_monitor(&api, &file).await),
        Command::Add {
            target: AddTarget::Label { monitor_id, label },
        } => finish_manage(
            &api,
            change::add_monitor_label(&api, &monitor_id, &label).await,
        ),
        Command::Take { target } => run_take_command(target),
    }
}

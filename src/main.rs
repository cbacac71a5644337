use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

use fis_results::bundle::{self, read_bundle};
use fis_results::{
    summarize_freshness, Athlete, Config, ConsistencyAuditor, MergePolicy, UnmatchedPolicy,
};

#[derive(Parser)]
#[command(name = "fis-results", version, about = "Reconcile and audit athlete result data")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Optional TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Replace,
    Union,
}

impl From<PolicyArg> for MergePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Replace => MergePolicy::Replace,
            PolicyArg::Union => MergePolicy::Union,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Merge an incoming athlete batch into the bundle's data block
    Patch {
        /// Site bundle holding the canonical athlete array
        #[arg(long)]
        target: PathBuf,

        /// Incoming batch (athletes.json)
        #[arg(long)]
        data: PathBuf,

        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Append incoming athletes that have no canonical record
        #[arg(long)]
        insert_new: bool,

        /// Reconcile and report without backing up or writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Check ordering and profile/modal consistency; exits 1 on any issue
    Audit {
        #[arg(long)]
        target: PathBuf,
    },

    /// Write one CSV row per athlete result
    Export {
        #[arg(long)]
        target: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },

    /// Report newest event date and stale athletes
    Freshness {
        #[arg(long)]
        target: PathBuf,

        #[arg(long)]
        stale_days: Option<i64>,
    },
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "fis_results=info",
        1 => "fis_results=debug",
        _ => "fis_results=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Patch {
            target,
            data,
            policy,
            insert_new,
            dry_run,
        } => run_patch(&config, &target, &data, policy, insert_new, dry_run),
        Commands::Audit { target } => {
            let passed = run_audit(&config, &target)?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Export { target, out } => run_export(&config, &target, &out),
        Commands::Freshness { target, stale_days } => run_freshness(&config, &target, stale_days),
    }
}

fn load_canonical(config: &Config, target: &Path) -> Result<(bundle::Bundle, Vec<Athlete>)> {
    let bundle = read_bundle(target, &config.bundle)?;
    let athletes = bundle
        .athletes()
        .with_context(|| format!("Invalid data block in {}", target.display()))?;
    Ok((bundle, athletes))
}

fn run_patch(
    config: &Config,
    target: &Path,
    data: &Path,
    policy: Option<PolicyArg>,
    insert_new: bool,
    dry_run: bool,
) -> Result<()> {
    let mut engine = config.engine()?;
    if let Some(policy) = policy {
        engine = engine.with_policy(policy.into());
    }
    if insert_new {
        engine = engine.with_unmatched(UnmatchedPolicy::InsertNew);
    }

    // Everything that can fail structurally happens before the backup
    let (bundle, canonical) = load_canonical(config, target)?;
    let incoming = bundle::load_incoming(data)?;
    let report = engine.reconcile(&canonical, &incoming);
    let patched = bundle.splice(&report.athletes)?;

    if dry_run {
        info!("dry run, {} left untouched", target.display());
    } else {
        let backup_path = bundle::backup(target)?;
        bundle::write_bundle(target, &patched)?;
        println!("backup={}", backup_path.display());
    }

    let stats = &report.stats;
    println!("athletes={}", stats.athlete_count);
    println!("updated_athletes={}", stats.updated_athlete_count);
    println!("inserted_athletes={}", stats.inserted_athlete_count);
    println!("ignored_athletes={}", stats.ignored_codes.len());
    println!("result_count={}", stats.total_result_count);
    println!("max_event_date={}", stats.max_event_date.as_deref().unwrap_or(""));

    Ok(())
}

fn run_audit(config: &Config, target: &Path) -> Result<bool> {
    let (_, athletes) = load_canonical(config, target)?;

    let report = ConsistencyAuditor::new().audit(&athletes);
    info!("{}", report.summary());

    let summary = report.to_summary(config.preview_limit);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(report.passed())
}

fn run_export(config: &Config, target: &Path, out: &Path) -> Result<()> {
    let (_, athletes) = load_canonical(config, target)?;

    let count = fis_results::export::export_csv(&athletes, out)?;
    println!("rows={}", count);
    println!("out={}", out.display());

    Ok(())
}

fn run_freshness(config: &Config, target: &Path, stale_days: Option<i64>) -> Result<()> {
    let (_, athletes) = load_canonical(config, target)?;

    let today = chrono::Local::now().date_naive();
    let threshold = stale_days.unwrap_or(config.stale_threshold_days);
    let summary = summarize_freshness(&athletes, today, threshold);
    info!("{}", summary.summary());

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

//! secret-santa - draw a gift ring and tell every santa who they give to
//!
//! ```text
//! secret-santa participants.tsv template.txt secret.json
//! ```
//!
//! Exit codes: 0 on success, 1 on a usage error or any fatal error before
//! notification, 3 when the draw succeeded but at least one message was not
//! delivered.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use secret_santa_core::dispatch::DEFAULT_SUBJECT;
use secret_santa_core::{
    DeliveryReport, Dispatcher, Mailer, Orchestrator, Registry, RunConfig, Template,
};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod mailer;

use mailer::{OutboxMailer, SmtpConfig, SmtpMailer, PASSWORD_ENV};

/// Exit code for bad arguments and errors before notification
const EXIT_FATAL: u8 = 1;

/// Exit code when some notifications could not be delivered
const EXIT_DELIVERY_FAILED: u8 = 3;

/// Send out secret santa assignments
#[derive(Parser, Debug)]
#[command(name = "secret-santa")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TAB-separated participant data: identity, address, comma-separated exclusions
    data_file: PathBuf,

    /// Message template; {santee} and {santa} are substituted per recipient
    template_file: PathBuf,

    /// File in which to place the secret assignments. SPOILER ALERT.
    secret_log: PathBuf,

    /// RNG seed (random when omitted); recorded in the secret log
    #[arg(long, env = "SANTA_SEED")]
    seed: Option<u64>,

    /// Give up after this many candidate draws (derived from the roster by default)
    #[arg(long, env = "SANTA_MAX_ATTEMPTS")]
    max_attempts: Option<usize>,

    /// Overwrite an existing secret log
    #[arg(long)]
    force: bool,

    /// Print the parsed participant data before drawing
    #[arg(long)]
    dump_registry: bool,

    /// Write messages into this directory instead of sending them
    #[arg(long, value_name = "DIR")]
    outbox: Option<PathBuf>,

    /// Subject line of every message
    #[arg(long, env = "SANTA_SUBJECT", default_value = DEFAULT_SUBJECT)]
    subject: String,

    #[command(flatten)]
    smtp: SmtpArgs,

    /// Log level (trace, debug, info, warn, error) or a tracing filter directive
    #[arg(long, env = "SANTA_LOG", default_value = "info", value_parser = parse_log_filter)]
    log_level: String,
}

#[derive(Args, Debug)]
struct SmtpArgs {
    /// SMTP relay (STARTTLS)
    #[arg(long, env = "SANTA_SMTP_HOST", default_value = "smtp.gmail.com")]
    smtp_host: String,

    #[arg(long, env = "SANTA_SMTP_PORT", default_value_t = 587)]
    smtp_port: u16,

    /// SMTP login; the password is read from SANTA_SMTP_PASSWORD
    #[arg(long, env = "SANTA_SMTP_USER")]
    smtp_user: Option<String>,

    /// Sender address (defaults to the SMTP login)
    #[arg(long, env = "SANTA_FROM")]
    from: Option<String>,

    /// Per-message send timeout
    #[arg(long, env = "SANTA_SEND_TIMEOUT_SECS", default_value_t = 30)]
    send_timeout_secs: u64,
}

impl From<&SmtpArgs> for SmtpConfig {
    fn from(args: &SmtpArgs) -> Self {
        SmtpConfig {
            host: args.smtp_host.clone(),
            port: args.smtp_port,
            user: args.smtp_user.clone(),
            from: args.from.clone(),
            send_timeout_secs: args.send_timeout_secs,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(report) if report.is_complete() => {
            info!(delivered = report.delivered.len(), "all santas notified");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            for failure in &report.failed {
                error!(santa = %failure.santa, error = %failure.error, "not notified");
            }
            error!(
                failed = report.failed.len(),
                attempted = report.attempted(),
                "some santas were not notified; the secret log is intact"
            );
            ExitCode::from(EXIT_DELIVERY_FAILED)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// `--help` and `--version` exit 0; every other parse failure is fatal
fn usage_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        EXIT_FATAL
    } else {
        0
    }
}

fn parse_log_filter(level: &str) -> Result<String, String> {
    EnvFilter::try_new(level)
        .map(|_| level.to_string())
        .map_err(|e| format!("invalid log filter: {e}"))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::new(level);

    // stderr keeps stdout free for --dump-registry
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parse inputs, draw, write the secret log, then notify
///
/// Everything that can fail for configuration reasons is checked before the
/// draw, so a fatal error never leaves a secret log behind.
fn run(cli: Cli) -> Result<DeliveryReport> {
    let data = File::open(&cli.data_file)
        .with_context(|| format!("failed to open {}", cli.data_file.display()))?;
    let registry = Registry::from_reader(BufReader::new(data))
        .with_context(|| format!("failed to parse {}", cli.data_file.display()))?;
    if cli.dump_registry {
        print!("{}", registry.dump());
    }

    let template_text = fs::read_to_string(&cli.template_file)
        .with_context(|| format!("failed to read {}", cli.template_file.display()))?;
    let template = Template::parse(&template_text)
        .with_context(|| format!("invalid template {}", cli.template_file.display()))?;

    let mailer = build_mailer(&cli)?;

    let config = RunConfig {
        seed: cli.seed.unwrap_or_else(random_seed),
        max_attempts: cli.max_attempts,
        overwrite_secret_log: cli.force,
    };
    info!(
        participants = registry.len(),
        seed = config.seed,
        "drawing assignment"
    );

    let mut orchestrator = Orchestrator::new(config, registry)?;
    let assignment = orchestrator.assign(&cli.secret_log)?;

    let mut dispatcher = Dispatcher::new(mailer).with_subject(cli.subject);
    Ok(orchestrator.notify(&assignment, &template, &mut dispatcher))
}

fn build_mailer(cli: &Cli) -> Result<Box<dyn Mailer>> {
    if let Some(dir) = &cli.outbox {
        info!(outbox = %dir.display(), "dry run: writing messages instead of sending");
        return Ok(Box::new(OutboxMailer::new(dir)?));
    }

    let password = std::env::var(PASSWORD_ENV).ok();
    let mailer = SmtpMailer::new(&SmtpConfig::from(&cli.smtp), password)
        .context("invalid SMTP configuration")?;
    Ok(Box::new(mailer))
}

fn random_seed() -> u64 {
    Uuid::new_v4().as_u128() as u64
}

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uplink_core::{DecodeOutcome, ProfileError, ProfileRegistry, RegistryConfig};

#[derive(Parser, Debug)]
#[command(name = "uplink")]
#[command(version)]
#[command(
    about = "Decoder for base64 LoRaWAN sensor uplinks (channel/type tagged frames).",
    long_about = None,
    after_help = "Examples:\n  uplink decode --profile EM500-CO2 AXVkA2fJ/w==\n  uplink decode --profile EM310-UDL --pretty BXEB\n  cat payloads.txt | uplink decode --profile EM500-CO2 -\n  uplink profiles --profiles my_profiles.json"
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. debug, uplink_core=trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode base64 payloads with a device profile.
    Decode {
        /// Device profile name (exact, case-sensitive)
        #[arg(short = 'p', long)]
        profile: String,

        /// JSON file with additional device profiles
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Base64 payloads; `-` reads one payload per line from stdin
        #[arg(required = true)]
        payloads: Vec<String>,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Exit with a non-zero code if any payload was malformed
        #[arg(long)]
        strict: bool,

        /// Suppress the summary line on stderr
        #[arg(long)]
        quiet: bool,
    },
    /// List the registered device profiles as JSON.
    Profiles {
        /// JSON file with additional device profiles
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Decode {
            profile,
            profiles,
            payloads,
            pretty,
            compact,
            strict,
            quiet,
        } => cmd_decode(
            &profile,
            profiles.as_deref(),
            &payloads,
            pretty,
            compact,
            strict,
            quiet,
        ),
        Commands::Profiles { profiles, pretty } => cmd_profiles(profiles.as_deref(), pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<ProfileError> for CliError {
    fn from(err: ProfileError) -> Self {
        let hint = match &err {
            ProfileError::UnknownProfile { available, .. } => {
                Some(format!("available profiles: {}", available.join(", ")))
            }
            ProfileError::DuplicateProfile { .. } => {
                Some("profile names must not repeat a built-in or another entry".to_string())
            }
            ProfileError::Config(_) => Some("check the --profiles JSON file".to_string()),
            _ => None,
        };
        CliError::new(err.to_string(), hint)
    }
}

/// One line of `decode` output.
#[derive(Debug, Serialize)]
struct PayloadReport<'a> {
    payload: &'a str,
    #[serde(flatten)]
    outcome: &'a DecodeOutcome,
}

#[derive(Debug, Default)]
struct Summary {
    total: usize,
    malformed: usize,
    invalid: usize,
}

impl Summary {
    fn record(&mut self, outcome: &DecodeOutcome) {
        self.total += 1;
        if outcome.is_invalid_encoding() {
            self.invalid += 1;
        } else if outcome.is_malformed() {
            self.malformed += 1;
        }
    }

    fn has_failures(&self) -> bool {
        self.invalid > 0 || self.malformed > 0
    }
}

fn cmd_decode(
    profile: &str,
    profiles: Option<&Path>,
    payloads: &[String],
    pretty: bool,
    compact: bool,
    strict: bool,
    quiet: bool,
) -> Result<(), CliError> {
    check_format(pretty, compact)?;
    let registry = load_registry(profiles)?;
    let profile = registry.get(profile)?;
    let payloads = expand_payloads(payloads)?;
    debug!(profile = profile.name(), count = payloads.len(), "decoding payloads");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut summary = Summary::default();
    for payload in &payloads {
        let outcome = profile.decode_payload(Some(payload.as_str()));
        summary.record(&outcome);
        let report = PayloadReport {
            payload,
            outcome: &outcome,
        };
        let json = serialize(&report, pretty)?;
        writeln!(out, "{}", json).context("failed to write output")?;
    }
    out.flush().context("failed to write output")?;

    if !quiet {
        eprintln!(
            "OK: {} payload(s) decoded with {} ({} malformed, {} invalid encoding)",
            summary.total,
            profile.name(),
            summary.malformed,
            summary.invalid
        );
    }
    if strict && summary.has_failures() {
        return Err(CliError::new(
            "malformed payloads detected",
            Some("inspect the `termination` and `status` fields of the output".to_string()),
        ));
    }
    Ok(())
}

fn cmd_profiles(profiles: Option<&Path>, pretty: bool) -> Result<(), CliError> {
    let registry = load_registry(profiles)?;
    let json = serialize(&registry.to_config(), pretty)?;
    println!("{}", json);
    Ok(())
}

fn check_format(pretty: bool, compact: bool) -> Result<(), CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    Ok(())
}

fn serialize<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn load_registry(path: Option<&Path>) -> Result<ProfileRegistry, CliError> {
    let Some(path) = path else {
        return Ok(ProfileRegistry::builtin());
    };
    if !path.is_file() {
        return Err(CliError::new(
            format!("profiles file not found: {}", path.display()),
            Some("pass a JSON file with a top-level `profiles` array".to_string()),
        ));
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profiles file: {}", path.display()))?;
    let config = RegistryConfig::from_json(&json)?;
    let registry = ProfileRegistry::with_config(config)?;
    debug!(path = %path.display(), profiles = registry.len(), "loaded profiles");
    Ok(registry)
}

/// Replace each `-` with the lines read from stdin.
fn expand_payloads(args: &[String]) -> Result<Vec<String>, CliError> {
    let mut payloads = Vec::with_capacity(args.len());
    let mut stdin_read = false;
    for arg in args {
        if arg != "-" {
            payloads.push(arg.clone());
            continue;
        }
        if stdin_read {
            warn!("stdin given more than once; ignoring repeat");
            continue;
        }
        stdin_read = true;
        for line in io::stdin().lock().lines() {
            payloads.push(line.context("Failed to read payloads from stdin")?);
        }
    }
    Ok(payloads)
}

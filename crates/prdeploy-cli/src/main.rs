#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Context;
use clap::Parser;
use prdeploy_core::output::{annotations, OutputWriter};
use prdeploy_core::telemetry;
use prdeploy_core::types::{DEFAULT_API_URL, DEFAULT_SERVER_URL, DEFAULT_TRIGGER_PHRASE};
use prdeploy_core::{InputConfig, OutputFormat, RunReport, Whitelist};
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "prdeploy",
    version,
    about = "Create GitHub deployments from pull request comments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Handle the issue_comment event of the current workflow run
    Run(RunArgs),
    /// Check an environment whitelist file and list its entries
    ValidateWhitelist {
        /// Whitelist file (JSON, or YAML for .yml/.yaml)
        path: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Phrase that marks a comment as a deployment request
    #[arg(long, env = "INPUT_TRIGGER_PHRASE")]
    trigger_phrase: Option<String>,

    /// Environment whitelist file; any environment is allowed when unset
    #[arg(long, env = "INPUT_ENVIRONMENT_VALIDATION_FILE")]
    environment_validation_file: Option<String>,

    /// Allow deploying draft pull requests
    #[arg(long, env = "INPUT_ALLOW_DRAFT")]
    allow_draft: Option<String>,

    /// Deploy regardless of status checks
    #[arg(long, env = "INPUT_IGNORE_STATUS_CHECKS")]
    ignore_status_checks: Option<String>,

    /// Post the outcome as a PR comment
    #[arg(long, env = "INPUT_COMMENT")]
    comment: Option<String>,

    /// React with a rocket to the triggering comment after deploying
    #[arg(long, env = "INPUT_REACT")]
    react: Option<String>,

    /// Output format: gha, json, or text
    #[arg(long, env = "INPUT_OUTPUT_FORMAT")]
    output_format: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "PRDEPLOY_LOG_JSON")]
    log_json: bool,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "GITHUB_SERVER_URL")]
    server_url: Option<String>,

    /// Event payload; defaults to GITHUB_EVENT_PATH
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run(args) => run_deploy(args),
        Commands::ValidateWhitelist { path } => match run_validate(&path) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {e:#}");
                1
            }
        },
    };
    std::process::exit(code);
}

fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn run_deploy(args: RunArgs) -> i32 {
    let runner_debug = std::env::var("RUNNER_DEBUG").ok();
    telemetry::init_tracing(args.log_json, telemetry::default_level(runner_debug.as_deref()));

    let output_format = OutputFormat::detect(clean_opt(&args.output_format));

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            print_error(output_format, &format!("{e:#}"));
            return 1;
        }
    };
    tracing::debug!(?config, "resolved inputs");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {e}");
            return 1;
        }
    };

    let result = rt.block_on(prdeploy_core::handle_comment_event(
        &config,
        args.event_path.as_deref(),
    ));

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "run failed");
            print_error(output_format, &e.to_string());
            return 1;
        }
    };

    let written = match output_format {
        OutputFormat::Gha => write_gha_output(&report),
        OutputFormat::Json => write_json_output(&report),
        OutputFormat::Text => write_text_output(&report),
    };
    if let Err(e) = written {
        eprintln!("Error: {e:#}");
        return 1;
    }

    0
}

fn build_config(args: &RunArgs) -> anyhow::Result<InputConfig<'_>> {
    let token = clean_opt(&args.token).context("GITHUB_TOKEN is required")?;

    let config = InputConfig {
        trigger_phrase: Cow::Borrowed(
            clean_opt(&args.trigger_phrase).unwrap_or(DEFAULT_TRIGGER_PHRASE),
        ),
        environment_validation_file: clean_opt(&args.environment_validation_file)
            .map(Cow::Borrowed),
        allow_draft: flag("allow_draft", &args.allow_draft, false)?,
        ignore_status_checks: flag("ignore_status_checks", &args.ignore_status_checks, false)?,
        comment: flag("comment", &args.comment, true)?,
        react: flag("react", &args.react, true)?,
        api_url: Cow::Borrowed(clean_opt(&args.api_url).unwrap_or(DEFAULT_API_URL)),
        server_url: Cow::Borrowed(clean_opt(&args.server_url).unwrap_or(DEFAULT_SERVER_URL)),
        token: Some(Cow::Borrowed(token)),
    };
    config.validate()?;
    Ok(config)
}

fn flag(name: &str, value: &Option<String>, default: bool) -> anyhow::Result<bool> {
    Ok(InputConfig::parse_flag(name, value.as_deref(), default)?)
}

fn run_validate(path: &Path) -> anyhow::Result<()> {
    let whitelist = Whitelist::load(path)
        .with_context(|| format!("invalid whitelist {}", path.display()))?;

    let stdout = std::io::stdout();
    let mut w = stdout.lock();
    match whitelist {
        Whitelist::Unrestricted => writeln!(w, "No restrictions")?,
        Whitelist::Restricted(entries) => {
            writeln!(w, "{}: {} environment(s)", path.display(), entries.len())?;
            for entry in entries {
                let mut tags = Vec::new();
                if entry.production {
                    tags.push("production");
                }
                if entry.transient {
                    tags.push("transient");
                }
                if tags.is_empty() {
                    writeln!(w, "  {}", entry.name)?;
                } else {
                    writeln!(w, "  {} ({})", entry.name, tags.join(", "))?;
                }
            }
        }
    }
    Ok(())
}

fn print_error(format: OutputFormat, message: &str) {
    match format {
        OutputFormat::Gha => println!("{}", annotations::error(message)),
        _ => eprintln!("Error: {message}"),
    }
}

/// Append outputs to `$GITHUB_OUTPUT` and summarize in the job log
fn write_gha_output(report: &RunReport) -> anyhow::Result<()> {
    match std::env::var_os("GITHUB_OUTPUT") {
        Some(file) => OutputWriter::append_to_file(Path::new(&file), &report.outputs)?,
        None => {
            eprintln!("Warning: GITHUB_OUTPUT not set, falling back to stdout");
            return write_json_output(report);
        }
    }

    let stdout = std::io::stdout();
    let mut w = stdout.lock();
    if let Some(ref message) = report.message {
        if report.outcome.is_failure() {
            writeln!(w, "{}", annotations::error(message))?;
        } else {
            writeln!(w, "{}", annotations::notice(message))?;
        }
    }
    writeln!(w, "Outcome: {}", report.outcome.label())?;
    Ok(())
}

/// Write the report as one JSON object to stdout
fn write_json_output(report: &RunReport) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "outcome": report.outcome.label(),
        "message": report.message,
        "deployment_id": report.outputs.deployment_id,
        "deployment_api_url": report.outputs.deployment_api_url,
        "comment_posted": report.comment_posted,
        "reacted": report.reacted,
    });

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer(&mut lock, &output)?;
    writeln!(lock)?;
    Ok(())
}

/// Write human-readable text to stdout
fn write_text_output(report: &RunReport) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    writeln!(w, "prdeploy")?;
    writeln!(w, "========")?;
    writeln!(w, "Outcome: {}", report.outcome.label())?;
    if let Some(ref message) = report.message {
        writeln!(w, "\n{message}\n")?;
    }
    for (name, value) in report.outputs.pairs() {
        writeln!(w, "{name}: {value}")?;
    }
    writeln!(w, "Comment posted: {}", report.comment_posted)?;
    Ok(())
}

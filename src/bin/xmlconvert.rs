//! CLI binary for xmlconvert-client.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ClientConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xmlconvert_client::{check_well_formed, sign_bytes, Client, ClientConfig, XmlCheck};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert to a file
  xmlconvert report.fo -o report.pdf --endpoint https://convert.example.com/api/Fop

  # Endpoint and secret from the environment, result on stdout
  export XMLCONVERT_ENDPOINT=https://convert.example.com/api/Fop
  export XMLCONVERT_SECRET=s3cr3t
  xmlconvert report.fo > report.pdf

  # Print the signature only (no request is sent)
  xmlconvert --sign-only report.fo

  # JSON summary of the conversion
  xmlconvert report.fo -o report.pdf --json

ENVIRONMENT VARIABLES:
  XMLCONVERT_ENDPOINT   Conversion endpoint URL
  XMLCONVERT_SECRET     Shared signing secret (empty when unset)
  XMLCONVERT_TIMEOUT    Whole-request timeout in seconds
  XMLCONVERT_OUTPUT     Output file (same as -o)
  XMLCONVERT_JSON       Print a JSON summary (true/false)
  XMLCONVERT_VERBOSE    Enable debug logging (true/false)
  XMLCONVERT_QUIET      Errors only (true/false)
  RUST_LOG              Overrides the log filter (e.g. xmlconvert_client=debug)
"#;

/// Validate, sign and submit an XML document to a remote conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "xmlconvert",
    version,
    about = "Validate, sign and submit an XML document to a remote conversion service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// XML input file.
    input: PathBuf,

    /// Write the converted document to this file instead of stdout.
    #[arg(short, long, env = "XMLCONVERT_OUTPUT")]
    output: Option<PathBuf>,

    /// Conversion endpoint URL.
    #[arg(long, env = "XMLCONVERT_ENDPOINT")]
    endpoint: Option<String>,

    /// Shared signing secret.
    #[arg(long, env = "XMLCONVERT_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "XMLCONVERT_TIMEOUT")]
    timeout: Option<u64>,

    /// Validate and print the signature; do not contact the service.
    #[arg(long)]
    sign_only: bool,

    /// Print a JSON summary (ConversionStats) on stdout. Requires --output.
    #[arg(long, env = "XMLCONVERT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "XMLCONVERT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "XMLCONVERT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Sign-only mode ───────────────────────────────────────────────────
    if cli.sign_only {
        let bytes = tokio::fs::read(&cli.input)
            .await
            .with_context(|| format!("Failed to read '{}'", cli.input.display()))?;
        if let XmlCheck::Malformed(reason) = check_well_formed(&bytes) {
            bail!("'{}' is not well-formed XML: {}", cli.input.display(), reason);
        }
        println!("{}", sign_bytes(cli.secret.as_deref(), &bytes));
        return Ok(());
    }

    if cli.json && cli.output.is_none() {
        bail!("--json writes the summary to stdout; pass --output for the document");
    }

    // ── Build client ─────────────────────────────────────────────────────
    let Some(endpoint) = cli.endpoint.clone() else {
        bail!("No endpoint given. Pass --endpoint or set XMLCONVERT_ENDPOINT.");
    };

    let mut builder = ClientConfig::builder(endpoint).maybe_secret(cli.secret.clone());
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    let client = Client::new(builder.build()?).context("Failed to create client")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let stats = if let Some(ref output_path) = cli.output {
        client
            .convert_file(&cli.input, output_path)
            .await
            .context("Conversion failed")?
    } else {
        let mut input = tokio::fs::File::open(&cli.input)
            .await
            .with_context(|| format!("Failed to open '{}'", cli.input.display()))?;
        let mut stdout = tokio::io::stdout();
        client
            .convert(&mut input, &mut stdout)
            .await
            .context("Conversion failed")?
    };
    client.close();

    if cli.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?;
        println!("{json}");
    } else if !cli.quiet {
        let target = cli
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string());
        eprintln!(
            "{}  {} bytes  →  {}  {}",
            green("✔"),
            stats.bytes_written,
            bold(&target),
            dim(&format!("{}ms, sig {}", stats.duration_ms, stats.signature)),
        );
    }

    Ok(())
}

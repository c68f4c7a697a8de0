/// formpack command-line tool: encode JSON form values into
/// multipart/form-data bodies, and inspect the result.
///
/// # Command overview
///
/// ```text
/// formpack <COMMAND> [OPTIONS]
///
/// Commands:
///   encode     Encode a JSON form value into a multipart body
///   inspect    List the parts of a multipart body
///   plan       Show the encoding path and blob references of an input
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log encoder decisions (debug level) to stderr
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                 |
/// |------|-----------------------------------------|
/// | 0    | Success                                 |
/// | 1    | Error (I/O failure, invalid input, etc.)|
///
/// All error details and logs are written to stderr so stdout can be
/// piped cleanly. `RUST_LOG` overrides the log level chosen by `-v`.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod cmd_encode;
mod cmd_inspect;
mod cmd_plan;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Encode nested form values into multipart/form-data.
#[derive(Parser)]
#[command(name = "formpack", version, about = "Multipart form encoder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug-level encoder logs on stderr).
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON form value into a multipart body.
    Encode(EncodeArgs),
    /// List the parts of a multipart body.
    Inspect(InspectArgs),
    /// Show the encoding path and blob references of an input.
    Plan(PlanArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `formpack encode`.
///
/// The input is any JSON value with a mapping or sequence at the root.
/// Objects with a non-empty string `uri` are file references:
///
/// ```json
/// {
///   "title": "Report",
///   "tags": ["q3", "draft"],
///   "cover": { "uri": "file:///tmp/cover.png", "type": "image/png" },
///   "scan": { "uri": "blob:app/scan-1", "name": "scan.pdf" }
/// }
/// ```
///
/// ```text
/// ┌──────────────────┬─────────────────────────────────────────────────┐
/// │ Flag             │ Effect                                          │
/// ├──────────────────┼─────────────────────────────────────────────────┤
/// │ --blob URI=PATH  │ Serve URI from the file at PATH (repeatable)    │
/// │ --mode           │ auto (default) | sync | async                   │
/// │ --concurrent     │ Fetch blobs concurrently in the async path      │
/// │ --boundary       │ Use this boundary instead of a generated one    │
/// │ --base-dir       │ Base for relative local paths (default: the     │
/// │                  │ input file's directory)                         │
/// └──────────────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct EncodeArgs {
    /// Path to the JSON form value.
    pub input: PathBuf,

    /// Output file for the multipart body.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Multipart boundary. Generated when omitted.
    #[arg(long)]
    pub boundary: Option<String>,

    /// Register the file at PATH under the blob URI (`blob:...=PATH`).
    #[arg(long = "blob", value_name = "URI=PATH", value_parser = parse_blob_mapping)]
    pub blobs: Vec<(String, PathBuf)>,

    /// Encoding path.
    #[arg(long, value_enum, default_value_t = Mode::Auto)]
    pub mode: Mode,

    /// Fetch blob references concurrently (async path only).
    #[arg(long)]
    pub concurrent: bool,

    /// Directory that relative local file paths are resolved against.
    /// Defaults to the directory holding the input file.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Pick the path from the input.
    Auto,
    /// Best-effort synchronous path; blob attachments land last.
    Sync,
    /// Complete, ordered asynchronous path.
    Async,
}

/// Arguments for `formpack inspect`.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the multipart body.
    pub file: PathBuf,

    /// Boundary of the body. Detected from the first line when omitted.
    #[arg(long)]
    pub boundary: Option<String>,

    /// Show part content (first 80 characters, UTF-8 lossy).
    #[arg(long)]
    pub show_body: bool,
}

/// Arguments for `formpack plan`.
#[derive(clap::Args)]
pub struct PlanArgs {
    /// Path to the JSON form value.
    pub input: PathBuf,
}

fn parse_blob_mapping(s: &str) -> Result<(String, PathBuf), String> {
    let (uri, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected URI=PATH, got `{s}`"))?;
    if uri.is_empty() || path.is_empty() {
        return Err(format!("expected URI=PATH, got `{s}`"));
    }
    Ok((uri.to_string(), PathBuf::from(path)))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Encode(args) => cmd_encode::run(&args).await,
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Plan(args) => cmd_plan::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

//! Override Hints
//!
//! Static method-override hints for Python workspaces, served either as a long-lived
//! newline-delimited JSON session or as a one-shot command.
//!
//! ## Usage
//!
//! ```text
//! override-hints serve                         # {"type":"ready"} then one reply per request
//! override-hints analyze pkg/child.py --pretty # JSON array of override records
//! override-hints schema                        # JSON Schema of every wire shape
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;

pub mod cache;
pub mod config;
pub mod root;
pub mod session;
pub mod standalone;

pub use cache::ResultCache;
pub use config::ServerConfig;
pub use root::{find_workspace_root, normalize_target};
pub use session::Session;
pub use standalone::StandaloneAnalyzer;

#[derive(Parser)]
#[command(name = "override-hints")]
#[command(about = "Method-override hints for Python source trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Minimum time between full workspace rescans (overrides OVERRIDE_HINTS_RESCAN_INTERVAL_MS)
    #[arg(long, global = true)]
    rescan_interval_ms: Option<u64>,

    /// Maximum number of source files indexed per workspace
    #[arg(long, global = true)]
    max_files: Option<usize>,

    /// Maximum number of workspaces kept in memory
    #[arg(long, global = true)]
    max_workspaces: Option<usize>,

    /// Additional directory name to skip while scanning (repeatable)
    #[arg(long = "exclude-dir", global = true, value_name = "NAME")]
    exclude_dirs: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve requests over stdin/stdout
    Serve,

    /// Print override records for one file
    Analyze(AnalyzeArgs),

    /// Print the JSON Schema of the protocol
    Schema(SchemaArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Python file to analyze
    file: PathBuf,

    /// Workspace root (defaults to the nearest directory with a project marker)
    workspace: Option<PathBuf>,

    /// Always recompute instead of reusing a cached result
    #[arg(long)]
    no_cache: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct SchemaArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::from_env().with_excluded_dirs(self.exclude_dirs.clone());
        if let Some(ms) = self.rescan_interval_ms {
            config = config.with_rescan_interval_ms(ms);
        }
        if let Some(max_files) = self.max_files {
            config = config.with_max_files(max_files);
        }
        if let Some(max_workspaces) = self.max_workspaces {
            config = config.with_max_workspaces(max_workspaces);
        }
        config
    }
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = cli.server_config();
    match cli.command {
        Commands::Serve => run_serve(config),
        Commands::Analyze(args) => run_analyze(args, config),
        Commands::Schema(args) => run_schema(&args),
    }
}

fn run_serve(config: ServerConfig) -> Result<()> {
    log::info!("Starting override-hints session");
    let stdin = io::stdin();
    let stdout = io::stdout();
    Session::new(config).run(stdin.lock(), stdout.lock())
}

fn run_analyze(args: AnalyzeArgs, config: ServerConfig) -> Result<()> {
    let mut analyzer = StandaloneAnalyzer::new(config);
    if let Some(root) = args.workspace {
        analyzer = analyzer.with_workspace_root(root);
    }
    if args.no_cache {
        analyzer = analyzer.without_cache();
    }

    let records = analyzer.analyze(&args.file)?;
    print_json(&records, args.pretty)
}

fn run_schema(args: &SchemaArgs) -> Result<()> {
    print_json(&override_protocol::protocol_schema(), args.pretty)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to encode output")?;
    println!("{json}");
    Ok(())
}

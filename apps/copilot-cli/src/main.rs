//! Compliance Copilot CLI
//!
//! Drives the dashboard from a terminal: each subcommand performs one user
//! action against the backend and prints the affected panel to stdout.
//! Logs go to stderr.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use copilot_client::{ApiClient, ClientConfig};
use copilot_dashboard::{Dashboard, ExportFormat};
use shared_types::{AnonymizationMethod, DocumentKind, Region};
use tracing::{debug, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Command-line arguments for the Compliance Copilot client
#[derive(Parser, Debug)]
#[command(name = "copilot")]
#[command(about = "Check contracts against regional compliance rules")]
pub struct Args {
    /// Backend base URL (overrides COPILOT_API_BASE)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Request timeout in seconds (overrides COPILOT_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Jurisdiction for region-scoped queries
    #[arg(short, long, global = true, default_value = "EU")]
    pub region: Region,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a contract and print the extracted fields
    Upload { file: PathBuf },

    /// Add a rule from a file or pasted text
    AddRule {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "")]
        text: String,
    },

    /// List uploaded rules
    Rules,

    /// Show or edit a single rule
    #[command(subcommand)]
    Rule(RuleCommand),

    /// Run the compliance check for the selected region
    Check {
        /// Upload this contract first
        #[arg(long)]
        contract: Option<PathBuf>,
    },

    /// Explain one flag
    Explain { id: String },

    /// Risk correlations for the selected region
    Correlations,

    /// Tables extracted from the last contract
    Tables,

    /// Backend reachability and capability flags
    Status,

    /// Semantic search over indexed documents
    Search { query: String },

    /// Pathway index statistics
    Stats,

    /// Recent Pathway indexing activity
    Activity,

    /// Add a document to the Pathway index
    AddDoc {
        #[arg(long)]
        name: String,
        #[arg(long)]
        content: String,
        #[arg(long, value_enum, default_value_t = KindArg::Rule)]
        kind: KindArg,
    },

    /// Run the check and write the flags to a file
    Export {
        format: ExportFormat,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Upload this contract first
        #[arg(long)]
        contract: Option<PathBuf>,
    },

    /// Refresh Pathway stats and activity until interrupted
    Watch {
        /// Polling interval in seconds (overrides COPILOT_POLL_INTERVAL_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Single-call analysis with generated rules
    Simplified {
        #[arg(long, default_value = "general")]
        domain: String,
    },

    /// Anonymize the current flags
    Anonymize {
        #[arg(long, default_value = "mask")]
        method: AnonymizationMethod,
        /// Upload this contract first
        #[arg(long)]
        contract: Option<PathBuf>,
    },

    /// Available anonymization methods
    AnonymizationInfo,

    /// Suggested corrections for the last contract
    Analyze,

    /// Generate a corrected document
    Correct {
        /// Also download the corrected document to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RuleCommand {
    /// Print a rule's text
    Show { name: String },

    /// Overwrite a rule's text
    Save(RuleSave),
}

#[derive(ClapArgs, Debug)]
pub struct RuleSave {
    pub name: String,
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    pub file: Option<PathBuf>,
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Rule,
    Contract,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Rule => DocumentKind::Rule,
            KindArg::Contract => DocumentKind::Contract,
        }
    }
}

/// Environment config (including `.env`) with command-line overrides applied
fn client_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base) = &args.api_base {
        config = config.with_base_url(base)?;
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Command::Watch {
        interval: Some(secs),
    } = args.command
    {
        config = config.with_poll_interval(Duration::from_secs(secs));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = client_config(&args)?;
    debug!(api_base = %config.base_url(), timeout = ?config.timeout, "Client configured");

    let dashboard = Dashboard::from_client(ApiClient::new(config)?);
    dashboard.set_region(args.region);

    let result = commands::run(&dashboard, args.command).await;
    dashboard.shutdown();
    result
}

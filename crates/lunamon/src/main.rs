mod config;
mod monitor;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use lunamon_logging::{Console, LogFormat};
use lunamon_source::{ChunkSource, CommandConfig, ProcessSource, ReaderSource};
use lunamon_trace::FilterSpec;

use config::MonitorConfig;
use monitor::WatchOptions;

#[derive(Parser, Debug)]
#[command(
    name = "lunamon",
    about = "Live inspector for bus call/return traffic",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for records and call trees
    #[arg(short, long, value_enum, global = true)]
    output: Option<FormatChoice>,

    /// Log level for diagnostics (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Format of diagnostic logs on stderr
    #[arg(long, value_enum, global = true, default_value = "pretty")]
    log_format: FormatChoice,

    /// Config file (default: ./lunamon.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream records live from the monitor
    Watch {
        /// Read a saved capture instead of running the monitor command
        #[arg(short, long, conflicts_with = "monitor_command")]
        file: Option<PathBuf>,

        /// Print the correlated call tree when the stream ends
        #[arg(long)]
        calls: bool,

        /// Include replay commands in the call tree
        #[arg(long, requires = "calls")]
        replay: bool,

        #[command(flatten)]
        filter: FilterArgs,

        /// Monitor command and arguments (default: from config, else stdin)
        #[arg(last = true)]
        monitor_command: Vec<String>,
    },

    /// Print the correlated call tree of a whole capture
    Calls {
        /// Capture file (default: stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print a replay command for every call
        #[arg(long)]
        replay: bool,
    },
}

/// Display filter flags, applied on top of the configured filter
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Hide outbound (TX) records
    #[arg(long)]
    no_tx: bool,

    /// Show inbound (RX) records
    #[arg(long, conflicts_with = "no_rx")]
    rx: bool,

    /// Hide inbound (RX) records
    #[arg(long)]
    no_rx: bool,

    /// Hide calls
    #[arg(long)]
    no_calls: bool,

    /// Hide returns
    #[arg(long)]
    no_returns: bool,

    /// Only show records whose client starts with this prefix
    #[arg(long)]
    client: Option<String>,

    /// Only show records whose service starts with this prefix
    #[arg(long)]
    service: Option<String>,
}

impl FilterArgs {
    fn apply(&self, mut spec: FilterSpec) -> FilterSpec {
        if self.no_tx {
            spec.include_outbound = false;
        }
        if self.rx {
            spec.include_inbound = true;
        }
        if self.no_rx {
            spec.include_inbound = false;
        }
        if self.no_calls {
            spec.include_calls = false;
        }
        if self.no_returns {
            spec.include_returns = false;
        }
        if let Some(ref client) = self.client {
            spec.client_prefix = client.clone();
        }
        if let Some(ref service) = self.service {
            spec.service_prefix = service.clone();
        }
        spec
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<FormatChoice> for LogFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Pretty => LogFormat::Pretty,
            FormatChoice::Json => LogFormat::Json,
            FormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => MonitorConfig::load_from(path)?,
        None => {
            let working_dir =
                std::env::current_dir().context("Failed to get current directory")?;
            MonitorConfig::load(&working_dir)?.unwrap_or_default()
        }
    };

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "warn".to_string());
    lunamon_logging::init_tracing(&log_level, cli.log_format.into());

    let output: LogFormat = match (cli.output, config.output.as_deref()) {
        (Some(choice), _) => choice.into(),
        (None, Some(name)) => name
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid output format in config")?,
        (None, None) => LogFormat::Pretty,
    };
    let mut console = Console::stdout(output);

    match cli.command {
        Commands::Watch {
            file,
            calls,
            replay,
            filter,
            monitor_command,
        } => {
            let command = if monitor_command.is_empty() {
                config.command().map(<[String]>::to_vec)
            } else {
                Some(monitor_command)
            };
            let mut source = open_source(file, command).await?;

            let options = WatchOptions {
                filter: filter.apply(config.filter()),
                show_calls: calls,
                replay,
            };
            monitor::watch(source.as_mut(), &mut console, &options, shutdown_signal()).await?;
        }
        Commands::Calls { file, replay } => {
            let mut source = open_source(file, None).await?;
            monitor::calls(source.as_mut(), &mut console, replay).await?;
        }
    }

    Ok(())
}

async fn open_source(
    file: Option<PathBuf>,
    command: Option<Vec<String>>,
) -> Result<Box<dyn ChunkSource>> {
    if let Some(path) = file {
        let source = ReaderSource::open(&path).await?;
        return Ok(Box::new(source));
    }

    if let Some(command) = command {
        let source = ProcessSource::spawn(&CommandConfig::new(command))
            .context("Failed to start monitor command")?;
        return Ok(Box::new(source));
    }

    Ok(Box::new(ReaderSource::stdin()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the stream ends
        std::future::pending::<()>().await;
    }
    eprintln!("\nStopping monitor...");
}

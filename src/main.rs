use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use etfview::cli::show::View;
use etfview::core::log::init_logging;
use etfview::core::query::DEFAULT_TOP_N;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the HTTP API server
    Serve {
        /// Address to bind, overrides the config
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides the config
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print a view of the uploaded data
    Show {
        /// Weights CSV to read instead of the stored upload
        #[arg(long, requires = "prices")]
        weights: Option<PathBuf>,
        /// Prices CSV to read instead of the stored upload
        #[arg(long, requires = "weights")]
        prices: Option<PathBuf>,

        #[command(subcommand)]
        view: ShowView,
    },
}

#[derive(Subcommand)]
enum ShowView {
    /// ETF value per date
    Performance,
    /// Holdings with their latest price
    Composition,
    /// Day-over-day price change per holding
    Change {
        /// Date to compare against the previous row (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Largest holdings by value
    Top {
        #[arg(short, long, default_value_t = DEFAULT_TOP_N, allow_negative_numbers = true)]
        n: i64,
    },
    /// Every price row with the ETF value
    History,
}

impl From<ShowView> for View {
    fn from(view: ShowView) -> View {
        match view {
            ShowView::Performance => View::Performance,
            ShowView::Composition => View::Composition,
            ShowView::Change { date } => View::Change { date },
            ShowView::Top { n } => View::Top { n },
            ShowView::History => View::History,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => etfview::cli::setup::setup(),
        Some(Commands::Serve { host, port }) => {
            etfview::run_command(
                etfview::AppCommand::Serve { host, port },
                cli.config_path.as_deref(),
            )
            .await
        }
        Some(Commands::Show {
            weights,
            prices,
            view,
        }) => {
            let files = weights.zip(prices);
            etfview::run_command(
                etfview::AppCommand::Show {
                    view: view.into(),
                    files,
                },
                cli.config_path.as_deref(),
            )
            .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

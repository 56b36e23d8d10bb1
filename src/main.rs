use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use msgpane::config::{HostCapabilities, PaneConfig};
use msgpane::container::RowContextBuilder;
use msgpane::core::{Id, Message, User};
use msgpane::tui::{self, DemoOptions, EndReachedMode};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    env!("MSGPANE_VERSION_SUFFIX")
);

#[derive(Parser)]
#[command(name = "msgpane")]
#[command(
    author,
    version = VERSION,
    about = "Chat message pane with load-earlier pagination",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal demo with a synthetic conversation
    Demo {
        /// Messages shown at start
        #[arg(short = 'n', long, default_value = "30")]
        count: usize,

        /// Messages per earlier page
        #[arg(long, default_value = "20")]
        page_size: usize,

        /// Earlier pages available
        #[arg(long, default_value = "5")]
        pages: usize,

        /// Simulated fetch latency in milliseconds
        #[arg(long, default_value = "600")]
        delay_ms: u64,

        /// Newest message at the top instead of the bottom
        #[arg(long)]
        no_inverted: bool,

        /// Load earlier pages automatically near the end
        #[arg(long)]
        infinite_scroll: bool,

        /// Engine reports end-reached without a distance (debounced path)
        #[arg(long)]
        no_distance: bool,

        /// Show the scroll-to-bottom affordance past this many lines
        #[arg(long)]
        offset: Option<f64>,

        /// Behave like a web host (no typing indicator, no end-reached pagination)
        #[arg(long)]
        web: bool,

        /// Theme preset (catppuccin_mocha, catppuccin_latte, nord)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Print the row contexts for a JSON array of messages
    Rows {
        /// JSON file with messages, newest first
        file: PathBuf,

        /// Id of the viewing user (integers match numeric sender ids)
        #[arg(long)]
        viewer: Option<Id>,

        /// Row order runs top-down
        #[arg(long)]
        no_inverted: bool,
    },

    /// Show the effective pane configuration
    Config {
        /// Print the config file path instead
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "msgpane=debug"
    } else {
        "msgpane=info"
    };
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    // the demo owns the terminal, so it logs to a file
    if matches!(cli.command, Commands::Demo { .. }) {
        let log_dir = PaneConfig::log_dir()?;
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;
        let file = std::fs::File::create(log_dir.join("demo.log"))?;
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let mut config = match &cli.config {
        Some(path) => PaneConfig::load_from_path(path)?,
        None => PaneConfig::load()?,
    };

    match cli.command {
        Commands::Demo {
            count,
            page_size,
            pages,
            delay_ms,
            no_inverted,
            infinite_scroll,
            no_distance,
            offset,
            web,
            theme,
        } => {
            if no_inverted {
                config.inverted = false;
            }
            if infinite_scroll {
                config.infinite_scroll = true;
            }
            if let Some(offset) = offset {
                config.scroll_to_bottom = true;
                config.scroll_to_bottom_offset = offset;
            }
            if web {
                config.host = HostCapabilities::web();
            }
            if let Some(theme) = theme {
                config.theme = theme;
            }

            let options = DemoOptions {
                initial: count,
                page_size,
                max_pages: pages,
                load_delay: Duration::from_millis(delay_ms),
                end_reached_mode: if no_distance {
                    EndReachedMode::NoDistance
                } else {
                    EndReachedMode::WithDistance
                },
            };
            tracing::info!(?options, inverted = config.inverted, "starting demo");
            tui::run_demo(config, options).await?;
        }
        Commands::Rows {
            file,
            viewer,
            no_inverted,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let messages: Vec<Message> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse messages in {}", file.display()))?;
            let viewer = viewer.map(User::new);
            let inverted = config.inverted && !no_inverted;

            let builder = RowContextBuilder::new(&messages, viewer.as_ref(), inverted);
            let rows = builder.build_range(0..messages.len());
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::Config { path } => {
            if path {
                let path = match cli.config {
                    Some(path) => path,
                    None => PaneConfig::config_path()?,
                };
                println!("{}", path.display());
            } else {
                print!("{}", config.to_toml()?);
            }
        }
    }

    Ok(())
}

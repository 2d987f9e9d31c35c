use std::path::PathBuf;

use clap::{
    Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use toplisten::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Path to the SQLite database (overrides DATABASE_PATH)
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// Defaults to `serve`
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the web service and the hourly collector
    Serve(ServeOptions),

    /// List recorded artists
    Artists(ArtistsOptions),

    /// Show the latest ranking of top artists
    Rankings,

    /// Count recorded artists per genre
    Genres,

    /// Summarize genres of the artists ranked in the last days
    Analyze(AnalyzeOptions),
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ServeOptions {
    /// Address to listen on (overrides SERVER_ADDRESS)
    #[clap(long)]
    pub addr: Option<String>,

    /// Open the login page in the default browser
    #[clap(long)]
    pub open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ArtistsOptions {
    /// Search for artists by name
    #[clap(long)]
    pub search: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeOptions {
    /// Size of the window in days
    #[clap(long, default_value_t = 7)]
    pub days: u32,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or_else(|| Command::Serve(ServeOptions::default())) {
        Command::Serve(opt) => cli::serve(opt.addr, cli.db, opt.open).await,
        Command::Artists(opt) => cli::list_artists(cli.db, opt.search),
        Command::Rankings => cli::list_rankings(cli.db),
        Command::Genres => cli::list_genres(cli.db),
        Command::Analyze(opt) => cli::analyze(cli.db, opt.days),
    }
}

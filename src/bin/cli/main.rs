mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "verbcard-cli", about = "French conjugation flashcards", version)]
struct Cli {
    /// Config file (default: ~/.config/verbcard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the remote datasets and update local content
    Sync,

    /// Show stored versions, progress and asset caches
    Status,

    /// Flashcard practice
    Practice {
        /// Practice tenses instead of conjugations, e.g. present,futur
        /// (no value: the configured default tenses)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        tenses: Option<String>,
    },

    /// Multiple-choice practice
    Quiz {
        /// Practice tenses instead of conjugations
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        tenses: Option<String>,
    },

    /// Reset progress
    Reset {
        /// Also delete cached assets and downloaded content
        #[arg(long)]
        all: bool,
        /// Don't ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Offline asset cache
    #[command(subcommand)]
    Assets(AssetsCommand),
}

#[derive(Subcommand)]
enum AssetsCommand {
    /// Download every manifest entry into the current generation
    Install,

    /// Make the current generation active and delete older ones
    Activate,

    /// Fetch a resource through the cache
    Fetch {
        /// Resource path, e.g. ./index.html
        path: String,
        /// Write the body here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List cache generations
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config.as_deref(), cli.data_dir.as_deref())?;

    match cli.command {
        Command::Sync => commands::sync::run(&app, &cli.format).await?,
        Command::Status => commands::status::run(&app, &cli.format)?,
        Command::Practice { tenses } => {
            commands::practice::run(&app, tenses.as_deref(), use_color).await?
        }
        Command::Quiz { tenses } => commands::quiz::run(&app, tenses.as_deref(), use_color).await?,
        Command::Reset { all, yes } => commands::reset::run(&app, all, yes, &cli.format)?,
        Command::Assets(subcmd) => match subcmd {
            AssetsCommand::Install => commands::assets::run_install(&app, &cli.format).await?,
            AssetsCommand::Activate => commands::assets::run_activate(&app, &cli.format)?,
            AssetsCommand::Fetch { path, output } => {
                commands::assets::run_fetch(&app, &path, output.as_deref()).await?
            }
            AssetsCommand::List => commands::assets::run_list(&app, &cli.format)?,
        },
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}

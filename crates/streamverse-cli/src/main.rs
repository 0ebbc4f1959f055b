use clap::{ArgAction, Parser, Subcommand};
use commands::context::AppContext;
use commands::{auth, browse, config, engage, home, play, profile};
use streamverse_config::{Config, PathManager};
use streamverse_models::{ContentType, SortOrder, YearRange};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "streamverse")]
#[command(about = "StreamVerse - movies, series, sports and music in one catalog")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Browse filters shared by `discover`.
#[derive(clap::Args, Debug, Clone)]
pub struct FilterArgs {
    /// Genre name, or a music section such as "Bengali Hits"
    #[arg(long, default_value = "All")]
    genre: String,

    /// Minimum rating on a 0-10 scale
    #[arg(long, default_value_t = 0.0)]
    min_rating: f32,

    /// Release years, e.g. 2000-2010 or 2019
    #[arg(long, value_name = "RANGE")]
    years: Option<YearRange>,

    /// Sort order, e.g. popularity-desc, rating-desc, release_year-asc
    #[arg(long)]
    sort: Option<SortOrder>,

    /// Original language: all, hindi, bengali, english or an ISO code
    #[arg(long)]
    language: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Featured, trending, Bollywood and popular movie rows
    Home {
        /// Original language for the trending and popular rows
        #[arg(long)]
        language: Option<String>,
    },
    /// Browse a category page by page
    #[command(long_about = "Browse movies, series, sports or music with optional filters. Pages are merged and de-duplicated the same way the feed loads them.")]
    Discover {
        /// movie, series, sports or music
        category: ContentType,

        #[command(flatten)]
        filters: FilterArgs,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search every provider at once
    Search {
        query: String,
    },
    /// Show one title
    Details {
        category: ContentType,
        id: String,
    },
    /// Sign in, sign up or sign out
    Auth {
        #[command(subcommand)]
        cmd: AuthCommands,
    },
    /// Like or unlike a title
    Like {
        category: ContentType,
        id: String,
    },
    /// Show "my list", or add/remove a title when one is given
    List {
        category: Option<ContentType>,
        #[arg(requires = "category")]
        id: Option<String>,
    },
    /// Play a title: streams music, records progress for video
    #[command(long_about = "Music tracks are loaded into a playback session (tracks without a preview fall back to a demo stream). Movies and series are counted as a view and their progress is written to watch history.")]
    Play {
        category: ContentType,
        id: String,

        /// Progress to record, 0-100
        #[arg(long, default_value_t = 0.0)]
        progress: f64,

        /// Queue the rest of this music section after the track
        #[arg(long)]
        section: Option<String>,
    },
    /// Recently watched titles
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Watch time and completed titles
    Stats,
    /// Profile overview: stats, history, my list and favourites
    Profile,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password
    SignIn {
        /// Account email (if not provided, will prompt)
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account with email and password
    SignUp {
        #[arg(long)]
        email: Option<String>,
    },
    /// Continue as a guest
    Guest,
    SignOut,
    /// Show the signed-in account
    Whoami,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a configuration file, prompting for API keys
    Init {
        /// TMDB API key (if not provided, will prompt)
        #[arg(long)]
        tmdb_api_key: Option<String>,

        /// Overwrite an existing file without asking
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);

    let paths = PathManager::default();
    let config = Config::load_or_default(&paths.config_file())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", paths.config_file().display(), e))?;

    // Initialize logging with verbose level and the configured log file
    logging::init_logging(cli.verbose, cli.quiet, &config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let command = match cli.command {
        Commands::Config { cmd } => return config::run_config(cmd, &paths, &output).await,
        command => command,
    };
    let context = AppContext::build(config, paths).await?;

    match command {
        Commands::Home { language } => home::run_home(&context, language, &output).await,
        Commands::Discover { category, filters, pages } => browse::run_discover(&context, category, filters, pages, &output).await,
        Commands::Search { query } => browse::run_search(&context, &query, &output).await,
        Commands::Details { category, id } => browse::run_details(&context, category, &id, &output).await,
        Commands::Auth { cmd } => auth::run_auth(context, cmd, &output).await,
        Commands::Like { category, id } => engage::run_like(&context, category, &id, &output).await,
        Commands::List { category, id } => engage::run_list(&context, category, id, &output).await,
        Commands::Play { category, id, progress, section } => {
            play::run_play(&context, category, &id, progress, section, &output).await
        }
        Commands::History { limit } => profile::run_history(&context, limit, &output).await,
        Commands::Stats => profile::run_stats(&context, &output).await,
        Commands::Profile => profile::run_profile(&context, &output).await,
        Commands::Config { .. } => Ok(()),
    }
}

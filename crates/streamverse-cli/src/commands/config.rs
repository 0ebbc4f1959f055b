use super::prompts;
use crate::output::{header, styled_table, Output};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use streamverse_config::{Config, FirebaseConfig, PathManager, StoreBackend};

pub async fn run_config(cmd: ConfigCommands, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, paths, output),
        ConfigCommands::Init { tmdb_api_key, force } => init_config(tmdb_api_key, force, paths, output),
    }
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_API_KEY" {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}

fn enabled_cell(enabled: bool) -> Cell {
    Cell::new(if enabled { "✓".green().to_string() } else { "✗".red().to_string() })
}

fn section(title: &str) -> Table {
    let mut table = styled_table();
    table.set_header(vec![header(title)]);
    table
}

fn show_config(full: bool, paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'streamverse config init' to create one.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let secret = |s: &str| if full { s.to_string() } else { mask_string(s) };

    if !output.is_human() {
        let mut redacted = config.clone();
        redacted.tmdb.api_key = secret(&redacted.tmdb.api_key);
        if let Some(firebase) = redacted.firebase.as_mut() {
            firebase.api_key = secret(&firebase.api_key);
        }
        output.data(&redacted);
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!("{} {}\n", "Config file:".bright_black(), config_file.display());

    let mut tmdb = section("TMDB (movies, series)");
    tmdb.add_row(vec![Cell::new("Enabled"), enabled_cell(config.tmdb.enabled)]);
    tmdb.add_row(vec![Cell::new("API key"), Cell::new(secret(&config.tmdb.api_key))]);
    tmdb.add_row(vec![Cell::new("Base URL"), Cell::new(&config.tmdb.base_url)]);
    println!("{}\n", tmdb);

    let mut sports = section("TheSportsDB (sports)");
    sports.add_row(vec![Cell::new("Enabled"), enabled_cell(config.sportsdb.enabled)]);
    sports.add_row(vec![Cell::new("League"), Cell::new(&config.sportsdb.league_id)]);
    println!("{}\n", sports);

    let mut music = section("iTunes (music)");
    music.add_row(vec![Cell::new("Enabled"), enabled_cell(config.itunes.enabled)]);
    music.add_row(vec![Cell::new("Page size"), Cell::new(config.itunes.page_size)]);
    println!("{}\n", music);

    match &config.firebase {
        Some(firebase) => {
            let mut table = section("Firebase");
            table.add_row(vec![Cell::new("Project"), Cell::new(&firebase.project_id)]);
            table.add_row(vec![Cell::new("API key"), Cell::new(secret(&firebase.api_key))]);
            println!("{}\n", table);
        }
        None => println!("{}\n", "Firebase: Not configured".bright_black()),
    }

    let mut feed = section("Store and feed");
    feed.add_row(vec![Cell::new("Store backend"), Cell::new(format!("{:?}", config.store.backend))]);
    feed.add_row(vec![Cell::new("Debounce"), Cell::new(format!("{} ms", config.feed.debounce_ms))]);
    feed.add_row(vec![Cell::new("Default sort"), Cell::new(config.feed.default_sort)]);
    feed.add_row(vec![Cell::new("Default language"), Cell::new(&config.feed.default_language)]);
    println!("{}", feed);

    if let Err(e) = config.validate() {
        output.warn(format!("Configuration is incomplete: {}", e));
    }
    Ok(())
}

fn parse_backend(value: &str) -> Result<StoreBackend> {
    match value.trim().to_lowercase().as_str() {
        "local" | "" => Ok(StoreBackend::Local),
        "memory" => Ok(StoreBackend::Memory),
        "firestore" => Ok(StoreBackend::Firestore),
        other => Err(eyre!("Unknown store backend '{}' (expected local, memory or firestore)", other)),
    }
}

fn init_config(tmdb_api_key: Option<String>, force: bool, paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    if config_file.exists()
        && !force
        && !prompts::prompt_yes_no(&format!("Update existing config at {}?", config_file.display()), Some(true))?
    {
        output.info("Configuration unchanged");
        return Ok(());
    }

    config.tmdb.api_key = match tmdb_api_key {
        Some(key) => key,
        None => prompts::prompt_string("TMDB API key (leave empty to disable movies and series)", None)?,
    };
    config.tmdb.enabled = !config.tmdb.api_key.trim().is_empty();

    if prompts::prompt_yes_no("Configure Firebase for accounts and cloud sync?", Some(config.firebase.is_some()))? {
        let current = config.firebase.clone();
        let api_key = prompts::prompt_string("Firebase web API key", current.as_ref().map(|f| f.api_key.as_str()))?;
        let project = prompts::prompt_string("Firebase project id", current.as_ref().map(|f| f.project_id.as_str()))?;
        config.firebase = Some(FirebaseConfig::new(api_key.trim(), project.trim()));

        let backend = prompts::prompt_string("Store backend (local, memory, firestore)", Some("firestore"))?;
        config.store.backend = parse_backend(&backend)?;
    } else {
        config.firebase = None;
        config.store.backend = StoreBackend::Local;
    }

    config
        .validate()
        .map_err(|e| eyre!("Configuration is not valid: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Configuration saved to {}", config_file.display()));
    Ok(())
}

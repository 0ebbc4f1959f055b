use super::context::AppContext;
use super::ui::Spinner;
use crate::output::{header, styled_table, Output};
use crate::FilterArgs;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use serde_json::json;
use streamverse_config::FeedConfig;
use streamverse_core::{LoadMoreOutcome, PaginatedFeed};
use streamverse_models::{ContentItem, ContentType, FeedKey, Filters, Language};
use streamverse_sources::ContentProvider;

pub fn feed_key(category: ContentType, args: FilterArgs, defaults: &FeedConfig) -> Result<FeedKey> {
    let filters = Filters {
        genre: args.genre,
        min_rating: args.min_rating,
        release_years: args.years,
    };
    filters.validate().map_err(|e| eyre!("Invalid filters: {}", e))?;

    let language = args
        .language
        .map(|l| Language::from(l.as_str()))
        .unwrap_or_else(|| defaults.default_language.clone());

    Ok(FeedKey::new(category)
        .with_filters(filters)
        .with_sort(args.sort.unwrap_or(defaults.default_sort))
        .with_language(language))
}

pub async fn run_discover(
    context: &AppContext,
    category: ContentType,
    filters: FilterArgs,
    pages: u32,
    output: &Output,
) -> Result<()> {
    let key = feed_key(category, filters, &context.config.feed)?;
    let catalog = context.catalog()?;
    if !catalog.serves(category) {
        return Err(eyre!("No enabled provider serves {}", category));
    }

    let spinner = Spinner::start(format!("Loading {}...", category));
    let feed = PaginatedFeed::from_config(catalog, &context.config.feed);
    feed.set_key(key);
    let mut snapshot = feed.settled().await;

    for _ in 1..pages.max(1) {
        spinner.set_message(format!("Loading page {}...", snapshot.page + 1));
        match feed.load_more().await {
            LoadMoreOutcome::Appended { .. } => snapshot = feed.snapshot(),
            LoadMoreOutcome::Failed(e) => {
                output.warn(format!("Stopped after page {}: {}", snapshot.page, e));
                break;
            }
            LoadMoreOutcome::Skipped | LoadMoreOutcome::Stale => break,
        }
    }
    spinner.finish();

    if let Some(error) = &snapshot.error {
        return Err(eyre!("Failed to load {}: {}", category, error));
    }

    let summary = json!({
        "category": category,
        "page": snapshot.page,
        "has_more": snapshot.has_more,
        "total_count": snapshot.total_count,
        "items": snapshot.items,
    });
    if output.data(&summary) {
        return Ok(());
    }

    output.items(&format!("{} ({} of {})", category, snapshot.items.len(), snapshot.total_count), &snapshot.items);
    if snapshot.has_more {
        output.info(format!(
            "{}",
            format!("More available: --pages {}", snapshot.page + 1).bright_black()
        ));
    }
    Ok(())
}

pub async fn run_search(context: &AppContext, query: &str, output: &Output) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        return Err(eyre!("Search query must not be empty"));
    }
    let catalog = context.catalog()?;

    let spinner = Spinner::start(format!("Searching for '{}'...", query));
    let results = catalog.search(query).await.map_err(|e| eyre!("Search failed: {}", e))?;
    spinner.finish();

    output.items(&format!("Results for '{}'", query), &results);
    Ok(())
}

fn detail_rows(item: &ContentItem) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Title", item.title.clone()),
        ("Type", item.content_type.to_string()),
        ("Year", item.year.clone()),
        ("Rating", item.rating.clone()),
        ("Genre", item.genre.clone()),
    ];
    let optional = [
        ("Runtime", &item.runtime),
        ("Artist", &item.artist),
        ("Home", &item.home_team),
        ("Away", &item.away_team),
        ("Status", &item.status),
        ("Date", &item.match_date),
        ("Trailer", &item.video_url),
        ("Preview", &item.audio_url),
    ];
    rows.extend(optional.into_iter().filter_map(|(label, value)| value.clone().map(|v| (label, v))));
    if !item.description.is_empty() {
        rows.push(("Description", item.description.clone()));
    }
    rows
}

pub async fn run_details(context: &AppContext, category: ContentType, id: &str, output: &Output) -> Result<()> {
    let catalog = context.catalog()?;
    let item = catalog
        .details(id, category)
        .await
        .map_err(|e| eyre!("Failed to load details: {}", e))?
        .ok_or_else(|| eyre!("No {} found with id {}", category, id))?;

    if output.data(&item) || output.is_quiet() {
        return Ok(());
    }

    let mut table = styled_table();
    table.set_header(vec![header(&item.title)]);
    for (label, value) in detail_rows(&item) {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!("{}", table);
    Ok(())
}

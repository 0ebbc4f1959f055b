use super::context::AppContext;
use super::ui::Spinner;
use crate::output::{header, styled_table, Output};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use streamverse_core::ProfileService;
use streamverse_models::{ContentItem, WatchHistoryEntry, WatchStats};

fn history_items(history: &[WatchHistoryEntry]) -> Vec<ContentItem> {
    history.iter().filter_map(|entry| entry.content.clone()).collect()
}

fn print_stats(stats: &WatchStats) {
    let mut table = styled_table();
    table.set_header(vec![header("Watch stats")]);
    table.add_row(vec![Cell::new("Hours watched"), Cell::new(stats.total_watch_time_hours)]);
    table.add_row(vec![Cell::new("Completed titles"), Cell::new(stats.completed_titles)]);
    println!("{}", table);
}

pub async fn run_history(context: &AppContext, limit: usize, output: &Output) -> Result<()> {
    let user = context.require_user()?;
    let profile = ProfileService::new(context.catalog()?, context.engagement());

    let spinner = Spinner::start("Loading watch history...");
    let history = profile
        .watch_history(Some(user), limit.max(1))
        .await
        .map_err(|e| eyre!("Failed to load watch history: {}", e))?;
    spinner.finish();

    if output.data(&history) {
        return Ok(());
    }
    output.items("Continue watching", &history_items(&history));
    Ok(())
}

pub async fn run_stats(context: &AppContext, output: &Output) -> Result<()> {
    let user = context.require_user()?;
    let stats = context
        .engagement()
        .fetch_watch_stats(Some(user))
        .await
        .map_err(|e| eyre!("Failed to load watch stats: {}", e))?;

    if output.data(&stats) || output.is_quiet() {
        return Ok(());
    }
    print_stats(&stats);
    Ok(())
}

pub async fn run_profile(context: &AppContext, output: &Output) -> Result<()> {
    let user = context.require_user()?;
    let profile = ProfileService::new(context.catalog()?, context.engagement());

    let spinner = Spinner::start("Loading profile...");
    let overview = profile
        .profile(Some(user))
        .await
        .map_err(|e| eyre!("Failed to load profile: {}", e))?;
    spinner.finish();

    if output.data(&overview) || output.is_quiet() {
        return Ok(());
    }

    let name = context
        .session()
        .and_then(|s| s.email.clone())
        .unwrap_or_else(|| "Guest".to_string());
    println!("{}\n", name.bright_white().bold());
    print_stats(&overview.stats);
    output.items("Continue watching", &history_items(&overview.history));
    output.items("My list", &overview.my_list);
    output.items("Favourites", &overview.favourites);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamverse_models::ContentType;

    #[test]
    fn test_history_items_skip_unresolved() {
        let resolved = ContentItem::new("1", "A", ContentType::Movie).with_progress(30);
        let entry = |content: Option<ContentItem>| WatchHistoryEntry {
            user_id: "u1".into(),
            content_id: "1".into(),
            content_type: ContentType::Movie,
            progress: 30,
            duration_minutes: 100,
            last_watched: None,
            content,
        };
        let items = history_items(&[entry(Some(resolved)), entry(None)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].progress, Some(30));
    }
}

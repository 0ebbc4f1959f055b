use super::context::AppContext;
use super::ui::Spinner;
use crate::output::{header, styled_table, Output};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;
use streamverse_core::PlaybackSession;
use streamverse_models::{ContentItem, ContentType};
use streamverse_sources::itunes::sections::is_section;
use streamverse_sources::{ContentProvider, ItunesProvider};
use tracing::debug;

/// Runtime assumed when the catalog does not report one.
const DEFAULT_DURATION_MINUTES: u32 = 120;

/// Minutes from a display runtime such as `2h 15m`.
fn runtime_minutes(runtime: Option<&str>) -> Option<u32> {
    let runtime = runtime?;
    let mut total = 0u32;
    let mut seen = false;
    for part in runtime.split_whitespace() {
        if let Some(hours) = part.strip_suffix('h') {
            total += hours.parse::<u32>().ok()? * 60;
            seen = true;
        } else if let Some(minutes) = part.strip_suffix('m') {
            total += minutes.parse::<u32>().ok()?;
            seen = true;
        }
    }
    (seen && total > 0).then_some(total)
}

pub async fn run_play(
    context: &AppContext,
    category: ContentType,
    id: &str,
    progress: f64,
    section: Option<String>,
    output: &Output,
) -> Result<()> {
    let catalog = context.catalog()?;
    let spinner = Spinner::start("Loading title...");
    let item = catalog
        .details(id, category)
        .await
        .map_err(|e| eyre!("Failed to load details: {}", e))?
        .ok_or_else(|| eyre!("No {} found with id {}", category, id))?;
    spinner.finish();

    let engagement = context.engagement();
    engagement.track_view(&item.key()).await;

    match category {
        ContentType::Music => play_music(context, item, section, output).await,
        ContentType::Movie | ContentType::Series => {
            let duration = runtime_minutes(item.runtime.as_deref()).unwrap_or(DEFAULT_DURATION_MINUTES);
            match context.user_id() {
                Some(user) => {
                    engagement
                        .upsert_watch_history(Some(user), &item.key(), progress, duration)
                        .await
                        .map_err(|e| eyre!("Failed to save progress: {}", e))?;
                }
                None => output.warn("Not signed in: progress is not saved"),
            }
            report_video(&item, progress, output);
            Ok(())
        }
        ContentType::Sports => {
            report_video(&item, progress, output);
            Ok(())
        }
    }
}

fn report_video(item: &ContentItem, progress: f64, output: &Output) {
    let data = json!({
        "content": item.key().to_string(),
        "title": item.title,
        "video_url": item.video_url,
        "progress": progress.clamp(0.0, 100.0).round(),
    });
    if output.data(&data) {
        return;
    }
    match &item.video_url {
        Some(url) => output.success(format!("Playing {} ({})", item.title, url)),
        None => output.warn(format!("{} has no trailer or highlight video", item.title)),
    }
}

async fn play_music(context: &AppContext, track: ContentItem, section: Option<String>, output: &Output) -> Result<()> {
    let mut session = PlaybackSession::new();

    match section {
        Some(section) => {
            if !is_section(&section) {
                return Err(eyre!("Unknown music section '{}'", section));
            }
            let itunes = ItunesProvider::new(&context.config.itunes);
            let page = itunes
                .fetch_section(&section, 1, itunes.page_size(), &context.config.feed.default_language)
                .await;
            let mut queue = page.tracks;
            if !queue.iter().any(|t| t.id == track.id) {
                queue.insert(0, track.clone());
            }
            debug!("Queued {} tracks from '{}'", queue.len(), section);
            session.play_queue(track, queue);
        }
        None => session.play_track(track),
    }

    let Some(current) = session.current.clone() else {
        return Err(eyre!("Nothing to play"));
    };
    let next_up: Option<ContentItem> = {
        let mut peek = session.clone();
        peek.play_next();
        peek.current.filter(|t| t.id != current.id)
    };

    let data = json!({
        "track": current,
        "source": session.source(),
        "is_playing": session.is_playing,
        "volume": session.volume,
        "queue_length": session.queue.len(),
        "next": next_up.as_ref().map(|t| t.title.clone()),
    });
    if output.data(&data) || output.is_quiet() {
        return Ok(());
    }

    let mut table = styled_table();
    table.set_header(vec![header("Now playing")]);
    table.add_row(vec![Cell::new("Track"), Cell::new(&current.title)]);
    table.add_row(vec![Cell::new("Artist"), Cell::new(current.artist.as_deref().unwrap_or("-"))]);
    table.add_row(vec![Cell::new("Stream"), Cell::new(session.source().unwrap_or("-"))]);
    table.add_row(vec![Cell::new("Volume"), Cell::new(format!("{:.0}%", session.volume * 100.0))]);
    if let Some(next) = &next_up {
        table.add_row(vec![Cell::new("Up next"), Cell::new(&next.title)]);
    }
    println!("{}", table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_minutes() {
        assert_eq!(runtime_minutes(Some("2h 15m")), Some(135));
        assert_eq!(runtime_minutes(Some("0h 45m")), Some(45));
        assert_eq!(runtime_minutes(Some("soon")), None);
        assert_eq!(runtime_minutes(None), None);
    }
}

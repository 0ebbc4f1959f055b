use super::context::AppContext;
use super::ui::Spinner;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use streamverse_core::ProfileService;
use streamverse_models::{ContentItem, FactKind, Language};
use streamverse_sources::{HomeRows, TmdbProvider};
use tracing::warn;

const TRENDING_ROW_LEN: usize = 5;
const MY_LIST_FALLBACK_LEN: usize = 5;

#[derive(Debug, Default, PartialEq, Serialize)]
struct HomeView {
    featured: Option<ContentItem>,
    trending: Vec<ContentItem>,
    top_bollywood: Vec<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    my_list: Option<Vec<ContentItem>>,
    popular: Vec<ContentItem>,
}

/// Lay out the home screen. The first trending title is featured and the
/// next few form the trending row. A signed-in user with an empty list
/// sees the top popular titles in its place.
fn home_view(rows: HomeRows, my_list: Option<Vec<ContentItem>>) -> HomeView {
    let HomeRows {
        trending,
        popular,
        top_bollywood,
    } = rows;
    let mut trending = trending.into_iter();
    let featured = trending.next();
    let my_list = my_list.map(|list| {
        if list.is_empty() {
            popular.iter().take(MY_LIST_FALLBACK_LEN).cloned().collect()
        } else {
            list
        }
    });

    HomeView {
        featured,
        trending: trending.take(TRENDING_ROW_LEN).collect(),
        top_bollywood,
        my_list,
        popular,
    }
}

pub async fn run_home(context: &AppContext, language: Option<String>, output: &Output) -> Result<()> {
    if !context.config.tmdb.enabled {
        return Err(eyre!("The home screen needs TMDB. Run 'streamverse config init' to add an API key."));
    }
    context
        .config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;

    let language = language
        .map(|l| Language::from(l.as_str()))
        .unwrap_or_else(|| context.config.feed.default_language.clone());
    let tmdb = TmdbProvider::new(&context.config.tmdb);

    let spinner = Spinner::start("Loading home...");
    let rows = tmdb.home(&language).await;
    let my_list = match context.user_id() {
        Some(user) => {
            let profile = ProfileService::new(context.catalog()?, context.engagement());
            match profile.content_list(Some(user), FactKind::MyList).await {
                Ok(items) => Some(items),
                Err(e) => {
                    warn!("Failed to load my list for home: {}", e);
                    Some(Vec::new())
                }
            }
        }
        None => None,
    };
    spinner.finish();

    let view = home_view(rows, my_list);
    if output.data(&view) || output.is_quiet() {
        return Ok(());
    }

    match &view.featured {
        Some(item) => println!(
            "{} {} ({})\n{}\n",
            "Featured:".bright_black(),
            item.title.bright_white().bold(),
            item.year,
            item.description
        ),
        None => output.warn("TMDB returned nothing for the home screen"),
    }
    output.items("Trending", &view.trending);
    if !view.top_bollywood.is_empty() {
        output.items("Top Bollywood", &view.top_bollywood);
    }
    if let Some(list) = &view.my_list {
        output.items("My list", list);
    }
    output.items("Popular movies", &view.popular);
    Ok(())
}

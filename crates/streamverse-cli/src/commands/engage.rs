use super::context::AppContext;
use super::ui::Spinner;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use streamverse_core::{EngagementToggle, ProfileService};
use streamverse_models::{ContentType, FactKind, ItemKey};

fn item_key(category: ContentType, id: &str) -> Result<ItemKey> {
    let id = id.trim();
    if id.is_empty() {
        return Err(eyre!("Content id must not be empty"));
    }
    Ok(ItemKey {
        content_type: category,
        id: id.to_string(),
    })
}

async fn toggle(context: &AppContext, kind: FactKind, key: ItemKey, output: &Output) -> Result<()> {
    let user = context.require_user()?.to_string();
    let engagement = context.engagement();
    let toggle = match kind {
        FactKind::Like => EngagementToggle::like(engagement, key.clone(), Some(user)),
        _ => EngagementToggle::my_list(engagement, key.clone(), Some(user)),
    };

    let before = toggle.load().await;
    let after = toggle.toggle().await;
    if before == after {
        return Err(eyre!("Could not update {} for {}", kind, key));
    }

    if output.data(&json!({ "content": key.to_string(), "kind": kind, "active": after })) {
        return Ok(());
    }
    let message = match (kind, after) {
        (FactKind::Like, true) => format!("Liked {}", key),
        (FactKind::Like, false) => format!("Removed like from {}", key),
        (_, true) => format!("Added {} to my list", key),
        (_, false) => format!("Removed {} from my list", key),
    };
    output.success(message);
    Ok(())
}

pub async fn run_like(context: &AppContext, category: ContentType, id: &str, output: &Output) -> Result<()> {
    toggle(context, FactKind::Like, item_key(category, id)?, output).await
}

pub async fn run_list(context: &AppContext, category: Option<ContentType>, id: Option<String>, output: &Output) -> Result<()> {
    match (category, id) {
        (Some(category), Some(id)) => toggle(context, FactKind::MyList, item_key(category, &id)?, output).await,
        (Some(_), None) => Err(eyre!("Give both a category and an id to add or remove a title")),
        _ => {
            let user = context.require_user()?;
            let profile = ProfileService::new(context.catalog()?, context.engagement());

            let spinner = Spinner::start("Loading my list...");
            let items = profile
                .content_list(Some(user), FactKind::MyList)
                .await
                .map_err(|e| eyre!("Failed to load my list: {}", e))?;
            spinner.finish();

            output.items("My list", &items);
            Ok(())
        }
    }
}

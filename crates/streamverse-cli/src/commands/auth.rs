use super::context::AppContext;
use super::prompts;
use crate::output::{header, styled_table, Output};
use crate::AuthCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;
use streamverse_core::fetch_profile;

pub async fn run_auth(mut context: AppContext, cmd: AuthCommands, output: &Output) -> Result<()> {
    match cmd {
        AuthCommands::SignIn { email } => {
            let email = match email {
                Some(email) => email,
                None => prompts::prompt_email("Email")?,
            };
            let password = prompts::prompt_password("Password", false)?;
            let session = context.auth()?.sign_in(&email, &password).await.map_err(|e| eyre!("{}", e))?;
            context.sign_in(session).await?;
            output.success(format!("Signed in as {}", email));
        }
        AuthCommands::SignUp { email } => {
            let email = match email {
                Some(email) => email,
                None => prompts::prompt_email("Email")?,
            };
            let password = prompts::prompt_password("Choose a password", true)?;
            let session = context.auth()?.sign_up(&email, &password).await.map_err(|e| eyre!("{}", e))?;
            context.sign_in(session).await?;
            output.success(format!("Account created for {}", email));
        }
        AuthCommands::Guest => {
            let session = context.auth()?.sign_in_anonymously().await.map_err(|e| eyre!("{}", e))?;
            let uid = session.user_id.clone();
            context.sign_in(session).await?;
            output.success(format!("Continuing as guest ({})", uid));
        }
        AuthCommands::SignOut => {
            if context.session().is_none() {
                output.info("Not signed in");
                return Ok(());
            }
            context.sign_out()?;
            output.success("Signed out");
        }
        AuthCommands::Whoami => whoami(&context, output).await?,
    }
    Ok(())
}

async fn whoami(context: &AppContext, output: &Output) -> Result<()> {
    let Some(session) = context.session() else {
        if !output.data(&json!({ "signed_in": false })) {
            output.info("Not signed in");
        }
        return Ok(());
    };

    let profile = match fetch_profile(context.store().as_ref(), &session.user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            output.warn(format!("Could not load profile: {}", e));
            None
        }
    };

    let display_name = profile
        .as_ref()
        .map(|p| p.display_name.clone())
        .unwrap_or_else(|| "Anonymous".to_string());
    let data = json!({
        "signed_in": true,
        "uid": session.user_id,
        "email": session.email,
        "display_name": display_name,
        "provider": session.provider,
        "expires_at": session.expires_at,
        "created_at": profile.as_ref().and_then(|p| p.created_at),
    });
    if output.data(&data) || output.is_quiet() {
        return Ok(());
    }

    let mut table = styled_table();
    table.set_header(vec![header("Account")]);
    table.add_row(vec![Cell::new("User ID"), Cell::new(&session.user_id)]);
    table.add_row(vec![Cell::new("Name"), Cell::new(display_name)]);
    table.add_row(vec![
        Cell::new("Email"),
        Cell::new(session.email.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![Cell::new("Provider"), Cell::new(session.provider.as_str())]);
    if let Some(created) = profile.as_ref().and_then(|p| p.created_at) {
        table.add_row(vec![Cell::new("Member since"), Cell::new(created.format("%Y-%m-%d").to_string())]);
    }
    println!("{}", table);
    Ok(())
}

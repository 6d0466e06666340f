//! `smartq login`

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{Input, Password};
use smartq_client::LoginCredentials;

use crate::context::{AppContext, Tone};

#[derive(Args)]
pub struct LoginArgs {
    /// Username or email
    identifier: Option<String>,

    /// Log in with a phone number instead
    #[arg(long, conflicts_with = "identifier")]
    phone: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long, env = "SMARTQ_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

pub async fn run(ctx: &AppContext, args: LoginArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => Password::with_theme(&ctx.theme())
            .with_prompt("Password")
            .interact()
            .context("failed to read password")?,
    };

    let credentials = match (args.phone, args.identifier) {
        (Some(phone_number), _) => LoginCredentials::Phone {
            phone_number,
            password,
        },
        (None, Some(username_or_email)) => LoginCredentials::UsernameOrEmail {
            username_or_email,
            password,
        },
        (None, None) => LoginCredentials::UsernameOrEmail {
            username_or_email: Input::with_theme(&ctx.theme())
                .with_prompt("Username or email")
                .interact_text()?,
            password,
        },
    };

    let user = ctx.session.login(&ctx.api, &credentials).await?;
    ctx.save_profile()?;

    let name = [&user.username, &user.email, &user.phone_number]
        .into_iter()
        .find(|s| !s.is_empty())
        .map(String::as_str)
        .unwrap_or("customer");
    ctx.say(Tone::Success, &format!("Welcome back, {name}!"));
    Ok(())
}

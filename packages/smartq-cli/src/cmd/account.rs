//! `smartq account`, `smartq change-username` and `smartq logout`

use anyhow::{bail, Result};
use console::style;
use smartq_client::ChangeUsername;

use crate::context::{AppContext, Tone};

fn field(value: &str) -> String {
    if value.is_empty() {
        style("-").dim().to_string()
    } else {
        value.to_string()
    }
}

/// Show the profile, applying local edits first.
pub fn show(ctx: &AppContext, username: Option<String>, email: Option<String>) -> Result<()> {
    if username.is_some() || email.is_some() {
        let current = ctx.session.user_data();
        ctx.session.update_profile(
            username.unwrap_or(current.username),
            email.unwrap_or(current.email),
        );
        ctx.save_profile()?;
        ctx.say(Tone::Success, "Profile updated.");
    }

    let user = ctx.session.user_data();
    ctx.say(Tone::Header, "Account");
    println!("  Username: {}", field(&user.username));
    println!("  Email:    {}", field(&user.email));
    println!("  Phone:    {}", field(&user.phone_number));
    println!("  Backend:  {}", ctx.config.base_url);
    if ctx.session.is_authenticated() {
        ctx.say(Tone::Info, "Logged in");
    } else {
        ctx.say(Tone::Warning, "Not logged in");
    }
    Ok(())
}

pub async fn change_username(ctx: &AppContext, username: &str) -> Result<()> {
    if username.trim().is_empty() {
        bail!("username cannot be empty");
    }

    let user = ctx.session.user_data();
    let payload = ChangeUsername {
        username: username.trim().to_string(),
        email: Some(user.email.clone()).filter(|s| !s.is_empty()),
        phone_number: Some(user.phone_number.clone()).filter(|s| !s.is_empty()),
        id: Some(user.id.clone()).filter(|s| !s.is_empty()),
    };

    let ack = ctx.api.change_username(&payload).await?;
    if !ack.success {
        bail!("{}", ack.message);
    }

    ctx.session.update_profile(payload.username.clone(), user.email);
    ctx.save_profile()?;
    if ack.message.is_empty() {
        ctx.say(Tone::Success, &format!("Username changed to {}.", payload.username));
    } else {
        ctx.say(Tone::Success, &ack.message);
    }
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.session.logout().await;
    ctx.profile.clear()?;
    ctx.say(Tone::Success, "Logged out.");
    Ok(())
}

//! `smartq register`: collect the account fields, send a one-time code and
//! run the verification loop until the code is accepted or the user quits.
//!
//! The code prompt blocks a worker thread while the resend countdown keeps
//! ticking on the runtime. Typing `resend` requests a fresh code once the
//! countdown has run out.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use smartq_client::otp::TimerState;
use smartq_client::{Contact, CountdownHandle, Navigation, OtpFlow, Registration};
use tokio::task::JoinHandle;

use crate::context::{AppContext, Tone};

#[derive(Args)]
pub struct RegisterArgs {
    /// Username
    #[arg(long)]
    username: Option<String>,

    /// Email or phone number to verify
    #[arg(long)]
    contact: Option<String>,
}

fn prompt_code(flow: &OtpFlow) -> JoinHandle<Result<String>> {
    let hint = match flow.timer().state() {
        TimerState::Cooling(secs) => format!("resend in {secs}s"),
        TimerState::Ready => "'resend' for a new code".to_string(),
    };
    let prompt = format!("6-digit code ({hint}, 'q' to quit)");

    tokio::task::spawn_blocking(move || {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()
            .context("failed to read code")
    })
}

pub async fn run(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let username = match args.username {
        Some(username) => username,
        None => Input::with_theme(&ctx.theme())
            .with_prompt("Username")
            .interact_text()?,
    };
    if username.trim().is_empty() {
        bail!("username cannot be empty");
    }

    let raw_contact = match args.contact {
        Some(contact) => contact,
        None => Input::with_theme(&ctx.theme())
            .with_prompt("Email or phone number")
            .interact_text()?,
    };
    let contact = Contact::parse(&raw_contact).context("an email or phone number is required")?;

    let password = Password::with_theme(&ctx.theme())
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let registration = Registration::new(username.trim(), contact, password);
    let mut flow = OtpFlow::start(&ctx.api, ctx.session.clone(), registration).await?;
    ctx.say(Tone::Info, &format!(
        "Code sent to {} {}",
        flow.contact().label().to_lowercase(),
        flow.contact().masked()
    ));

    let mut countdown = CountdownHandle::spawn(Duration::from_secs(1));
    let mut prompt = prompt_code(&flow);

    loop {
        tokio::select! {
            answer = &mut prompt => {
                let answer = answer.context("code prompt failed")??;
                match answer.trim() {
                    "q" | "quit" => {
                        countdown.cancel();
                        ctx.say(Tone::Warning, "Registration cancelled.");
                        return Ok(());
                    }
                    "resend" => match flow.resend(&ctx.api).await {
                        Ok(_) => ctx.say(Tone::Info, &format!("New code sent to {}", flow.contact().masked())),
                        Err(e) => ctx.say(Tone::Warning, &e.user_message()),
                    },
                    code => {
                        flow.enter_code(code);
                        match flow.verify(&ctx.api).await {
                            Ok(Navigation::ResetToHome) => {
                                countdown.cancel();
                                ctx.save_profile()?;
                                ctx.say(Tone::Success, "Account created. Run `smartq login` to sign in.");
                                return Ok(());
                            }
                            Err(e) => ctx.say(Tone::Warning, &e.user_message()),
                        }
                    }
                }
                prompt = prompt_code(&flow);
            }
            Some(seconds) = countdown.tick() => {
                let was_ready = flow.can_resend();
                flow.elapse(seconds);
                if !was_ready && flow.can_resend() {
                    println!();
                    ctx.say(Tone::Info, "You can now request a new code (type 'resend').");
                }
            }
        }
    }
}

//! `smartq`: log in, register with OTP verification and browse shops from
//! the terminal.

mod cmd;
mod context;
mod profile;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::context::AppContext;

#[derive(Parser)]
#[command(name = "smartq")]
#[command(about = "SmartQ customer client")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "SMARTQ_API_URL")]
    api_url: Option<String>,

    /// Request deadline in milliseconds
    #[arg(long, global = true, env = "SMARTQ_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a username, email or phone number
    Login(cmd::login::LoginArgs),

    /// Create an account, verifying the email or phone with a one-time code
    Register(cmd::register::RegisterArgs),

    /// List shops
    Shops {
        /// Only shops in this category ("All" for every shop)
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive match on name, cuisine and type
        #[arg(long)]
        search: Option<String>,

        /// Print the category chips instead of shops
        #[arg(long)]
        categories: bool,
    },

    /// Show or edit the cached profile
    Account {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Change the username on the backend
    ChangeUsername { username: String },

    /// Forget the stored token and profile
    Logout,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        "warn,smartq_client=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli.api_url, cli.timeout_ms).await?;

    match cli.command {
        Commands::Login(args) => cmd::login::run(&ctx, args).await,
        Commands::Register(args) => cmd::register::run(&ctx, args).await,
        Commands::Shops {
            category,
            search,
            categories,
        } => cmd::shops::run(&ctx, category.as_deref(), search.as_deref(), categories).await,
        Commands::Account { username, email } => cmd::account::show(&ctx, username, email),
        Commands::ChangeUsername { username } => cmd::account::change_username(&ctx, &username).await,
        Commands::Logout => cmd::account::logout(&ctx).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

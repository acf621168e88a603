use anyhow::Result;
use clap::Command;
use tracing_subscriber::EnvFilter;

mod cmd;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let matches = Command::new("splice")
        .about("Stitch HTML templates into static pages")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(cmd::build::make_subcommand())
        .subcommand(cmd::serve::make_subcommand())
        .get_matches();

    match matches.subcommand() {
        Some(("build", args)) => cmd::build::execute(args).await,
        Some(("serve", args)) => cmd::serve::execute(args).await,
        _ => unreachable!("subcommand is required"),
    }
}

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;

use super::{add_common_args, make_site, report, watch::watch_source_files};
use crate::config::load_build_config;

pub fn make_subcommand() -> Command {
    add_common_args(Command::new("build"))
        .about("Build static site from HTML sources")
        .arg(
            Arg::new("base_url")
                .long("base-url")
                .value_name("URL")
                .help("Base URL substituted for BASE_URL in production builds"),
        )
        .arg(
            Arg::new("dev")
                .long("dev")
                .help("Use page-relative links instead of the base URL")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("watch")
                .short('w')
                .long("watch")
                .help("Rebuild when source files change")
                .action(ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let mut config = load_build_config(args)?;
    if args.get_flag("dev") {
        config.site.dev();
    }

    let site = make_site(&config)?;
    report(&site.render_all()?);
    info!("Site built successfully in {}", site.output_dir().display());

    if args.get_flag("watch") {
        watch_source_files(site, config.build_config().config.clone().into()).await?;
    }

    Ok(())
}

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use splice_core::SiteBuilder;
use splice_dev_server::{LiveServer, LiveServerConfig, inject_livereload_script};
use std::path::PathBuf;
use tracing::error;

use super::{add_common_args, report, watch::watch_source_files};
use crate::config::load_serve_config;

pub fn make_subcommand() -> Command {
    add_common_args(Command::new("serve"))
        .about("Start development server with live reload")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to serve on"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration, always in dev mode
    let config = load_serve_config(args)?;
    let build_config = config.build_config();

    let source_dir = PathBuf::from(&build_config.source);
    let output_dir = PathBuf::from(&build_config.output);
    let config_file = PathBuf::from(&build_config.config);
    let host = build_config.host.clone();
    let port = build_config.port;
    let open = build_config.open;

    let site = SiteBuilder::new()
        .source_dir(&source_dir)
        .output_dir(&output_dir)
        .config(&config.site)
        .page_filter(|_, html| inject_livereload_script(&html))
        .build()?;

    report(&site.render_all()?);

    // The server watches the output dir itself and reloads the affected pages
    let server_config = LiveServerConfig {
        host,
        port,
        root: output_dir,
        open,
    };

    let server = LiveServer::new(server_config);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Dev server error: {}", e);
        }
    });

    // Watch source files and rebuild on changes
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watch_source_files(site, config_file).await {
            error!("Source watcher error: {}", e);
        }
    });

    // Wait for both tasks
    let _ = tokio::try_join!(server_handle, watcher_handle)?;

    Ok(())
}

use anyhow::Result;
use clap::{Arg, Command};
use splice_core::{BuildReport, Site, SiteBuilder};
use tracing::{info, warn};

use crate::config::SpliceConfig;

pub mod build;
pub mod serve;
pub mod watch;

/// Arguments shared by every subcommand.
pub fn add_common_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("DIR")
                .help("Source directory containing index.html, pages/ and templates"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for generated site"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .default_value("./splice.toml"),
        )
}

/// Site for the current configuration, without any page filter.
pub fn make_site(config: &SpliceConfig) -> Result<Site> {
    let build_config = config.build_config();

    Ok(SiteBuilder::new()
        .source_dir(&build_config.source)
        .output_dir(&build_config.output)
        .config(&config.site)
        .build()?)
}

pub fn report(report: &BuildReport) {
    let skipped = report.diagnostics().count();
    if skipped > 0 {
        warn!(
            "Built {} page(s), {} template tag(s) skipped",
            report.pages.len(),
            skipped
        );
    } else {
        info!("Built {} page(s)", report.pages.len());
    }
}

//! REST VOL inspector.
//!
//! Usage:
//!   restvol /home/user/data.h5 ls /
//!   restvol /home/user/data.h5 resolve /g1/dset
//!   restvol --config ~/.hscfg /home/user/data.h5 info /g1

use anyhow::Result;
use clap::Parser;
use restvol_cli::{run, Args};
use restvol_connector::Connector;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .compact()
        .init();

    let config = args.load_config()?;
    debug!("Using endpoint {}", config.base_url());
    let connector = Connector::connect(&config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&connector, &args, &mut out)
}

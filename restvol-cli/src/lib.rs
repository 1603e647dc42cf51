//! Command implementations for the `restvol` binary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use restvol_connector::{
    Connector, ConnectorConfig, IndexType, IterControl, IterOrder, LinkGetArgs, LinkSpecificArgs,
    LinkRecord, LinkTarget, LinkValue, Locator, ObjectGetArgs, ObjectInfo, Transport,
};

#[derive(Parser, Debug)]
#[command(name = "restvol")]
#[command(about = "Inspect domains stored on a REST VOL service")]
pub struct Args {
    /// Config file (.hscfg or .toml). Defaults to HSDS_* variables, then ~/.hscfg
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Domain path, e.g. /home/user/data.h5
    pub domain: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the kind and identifier a path resolves to
    Resolve { path: String },
    /// Print object metadata
    Info { path: String },
    /// List the links of a group
    Ls {
        #[arg(default_value = "/")]
        group: String,
        /// Order by creation time instead of name
        #[arg(long)]
        creation_order: bool,
        #[arg(long)]
        reverse: bool,
    },
    /// Print the value of a soft or external link
    Readlink { path: String },
}

impl Args {
    pub fn load_config(&self) -> Result<ConnectorConfig> {
        let config = match &self.config {
            Some(path) => ConnectorConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ConnectorConfig::discover().context("discovering connection settings")?,
        };
        Ok(config)
    }
}

/// Runs one command against an open connector, writing results to `out`.
pub fn run<T: Transport>(connector: &Connector<T>, args: &Args, out: &mut impl Write) -> Result<()> {
    let root = connector
        .open_domain(&args.domain)
        .with_context(|| format!("opening domain {}", args.domain))?;

    match &args.command {
        Command::Resolve { path } => {
            let result = connector.resolver().resolve(&root.location(), path)?;
            writeln!(
                out,
                "{}\t{}\t{}",
                result.kind,
                result.server_id,
                result.domain.path()
            )?;
        }
        Command::Info { path } => {
            let mut info = ObjectInfo::default();
            connector.object_get(&root, &Locator::by_name(path), ObjectGetArgs::Info { out: &mut info })?;
            let info_json = serde_json::json!({
                "kind": info.kind,
                "id": info.server_id,
                "fileno": info.fileno,
                "num_attrs": info.num_attrs,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&info_json)?)?;
        }
        Command::Ls {
            group,
            creation_order,
            reverse,
        } => {
            let index_type = if *creation_order {
                IndexType::CreationOrder
            } else {
                IndexType::Name
            };
            let order = if *reverse {
                IterOrder::Decreasing
            } else {
                IterOrder::Increasing
            };

            let mut lines = Vec::new();
            let mut visitor = |link: &LinkRecord| {
                let target = match &link.target {
                    LinkTarget::Hard { kind, id } => format!("{kind} {id}"),
                    LinkTarget::Soft { path } => format!("-> {path}"),
                    LinkTarget::External { domain, path } => format!("-> {domain}:{path}"),
                };
                lines.push(format!("{}\t{}", link.name, target));
                IterControl::Continue
            };
            connector.link_specific(
                &root,
                &Locator::by_name(group),
                LinkSpecificArgs::Iterate {
                    index_type,
                    order,
                    visitor: &mut visitor,
                },
            )?;
            for line in lines {
                writeln!(out, "{line}")?;
            }
        }
        Command::Readlink { path } => {
            let mut value = None;
            connector.link_get(&root, &Locator::by_name(path), LinkGetArgs::Value { out: &mut value })?;
            match value {
                Some(LinkValue::Soft { path }) => writeln!(out, "{path}")?,
                Some(LinkValue::External { domain, path }) => writeln!(out, "{domain}:{path}")?,
                None => {}
            }
        }
    }

    connector.close(root)?;
    Ok(())
}

/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use clap::Parser;
use hardware_ids::{
    render_text, CollectingDiagnostics, ContainerConfig, ContainerConfigOverrides, ResultRecord,
    ServiceContainer,
};
use log::debug;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum FileFormat {
    Text,
    Toml,
    Json,
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEXT" => Ok(FileFormat::Text),
            "TOML" => Ok(FileFormat::Toml),
            "JSON" => Ok(FileFormat::Json),
            _ => Err("Output format must be one of 'text', 'toml' or 'json'".to_string()),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FileFormat::Text => write!(f, "TEXT"),
            FileFormat::Toml => write!(f, "TOML"),
            FileFormat::Json => write!(f, "JSON"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "hardware_ids")]
#[command(about = "Name the PCI and USB devices present on this host")]
#[command(version)]
struct Opt {
    /// Path to pci.ids (searched for in the usual locations when omitted)
    #[arg(long)]
    pci_ids: Option<PathBuf>,

    /// Path to usb.ids (searched for in the usual locations when omitted)
    #[arg(long)]
    usb_ids: Option<PathBuf>,

    /// Path to the resolved-name cache document
    #[arg(long, env = "HARDWARE_IDS_CACHE")]
    cache: Option<PathBuf>,

    /// Root of the sysfs mount to probe
    #[arg(long)]
    sysfs_root: Option<PathBuf>,

    /// TOML configuration file; command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format (text, toml or json)
    #[arg(long, default_value = "text")]
    format: FileFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// TOML needs a table at the top level
#[derive(Serialize)]
struct RecordList<'a> {
    devices: &'a [ResultRecord],
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn render(records: &[ResultRecord], format: FileFormat) -> Result<String, Box<dyn Error>> {
    Ok(match format {
        FileFormat::Text => render_text(records),
        FileFormat::Toml => toml::to_string_pretty(&RecordList { devices: records })?,
        FileFormat::Json => serde_json::to_string_pretty(records)? + "\n",
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::parse();

    let base = match &opt.config {
        Some(path) => ContainerConfig::from_toml_file(path)?,
        None => ContainerConfig::default(),
    };
    let config = base.merge(ContainerConfigOverrides {
        pci_ids: opt.pci_ids,
        usb_ids: opt.usb_ids,
        cache: opt.cache,
        sysfs_root: opt.sysfs_root,
        verbose: opt.verbose,
    });

    init_logging(config.verbose);

    let container = ServiceContainer::new(config);
    let paths = container.resolution_paths();
    debug!(
        "Using pci.ids={}, usb.ids={}, cache={}",
        paths.pci_ids.display(),
        paths.usb_ids.display(),
        paths.cache.display()
    );

    let observed = container.create_device_probe().observed_devices().await?;

    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let resolver = container.create_resolver_with_diagnostics(diagnostics.clone());
    let records = resolver.resolve_records(&observed, &paths);

    print!("{}", render(&records, opt.format)?);

    for diagnostic in diagnostics.take() {
        eprintln!("warning: {}", diagnostic);
    }

    Ok(())
}

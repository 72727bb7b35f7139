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

//! Hardware ID Resolution Library
//!
//! This library turns PCI and USB vendor:device ids observed on a host into
//! human-readable names using the standard `pci.ids` / `usb.ids` databases,
//! caching the names it finds so later runs skip parsing altogether. It uses
//! a Ports and Adapters (Hexagonal) architecture for maintainability and
//! testability.
//!
//! # Architecture
//!
//! - **Domain**: Entities, the streaming ids parser, cache validity and the resolver
//! - **Ports**: Interfaces for ids databases, the cache, probes and diagnostics
//! - **Adapters**: File, JSON and sysfs implementations
//!
//! # Usage
//!
//! ```rust,no_run
//! use hardware_ids::{ContainerConfig, ObservedDevices};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut observed = ObservedDevices::default();
//!     observed.pci.insert_raw("10de", "2204")?;
//!
//!     let container = hardware_ids::ServiceContainer::new(ContainerConfig::default());
//!     let resolver = container.create_resolver();
//!     for record in resolver.resolve_records(&observed, &container.resolution_paths()) {
//!         println!("{}: {} {}", record.bus_type, record.vendor, record.device);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod container;
pub mod domain;
pub mod ports;

pub use adapters::{
    CollectingDiagnostics, FileIdsSource, JsonFileCacheStore, LogDiagnostics, SysfsDeviceProbe,
};
pub use container::{
    default_cache_path, ContainerConfig, ContainerConfigBuilder, ContainerConfigOverrides,
    ServiceContainer,
};
pub use domain::{
    flatten, render_text, BusResolution, BusType, CacheDocument, ConfigError, Diagnostic,
    DomainError, HardwareId, HardwareIdResolver, ObservedDevices, ObservedIdSet,
    ResolutionOutcome, ResolutionPaths, ResolvedCatalog, ResolvedEntry, ResultRecord,
    SystemError,
};
pub use ports::{CacheStore, DeviceIdProbe, DiagnosticsSink, HardwareIdResolution, IdsSource};

use std::sync::Arc;

/// Create a resolver with the default file and JSON cache adapters
///
/// # Arguments
/// * `config` - Optional container configuration (uses defaults if None)
///
/// # Returns
/// * `(resolver, paths)` - Resolver plus the file locations it should use
pub fn create_resolver(
    config: Option<ContainerConfig>,
) -> (Arc<dyn HardwareIdResolution>, ResolutionPaths) {
    let container = config
        .map(ServiceContainer::new)
        .unwrap_or_else(ServiceContainer::with_defaults);
    (container.create_resolver(), container.resolution_paths())
}

/// Probe the host and resolve every observed id
///
/// Diagnostics raised during resolution are collected and returned next to
/// the records rather than failing the call.
///
/// # Arguments
/// * `config` - Container configuration
///
/// # Returns
/// * `Ok((records, diagnostics))` - Flattened records and any diagnostics
/// * `Err(DomainError)` - The host could not be probed at all
///
/// # Example
///
/// ```rust,no_run
/// use hardware_ids::{resolve_host_ids, ContainerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (records, diagnostics) = resolve_host_ids(ContainerConfig::default()).await?;
///     for record in &records {
///         println!("{} {} {}", record.bus_type, record.vendor, record.device);
///     }
///     for diagnostic in &diagnostics {
///         eprintln!("warning: {}", diagnostic);
///     }
///     Ok(())
/// }
/// ```
pub async fn resolve_host_ids(
    config: ContainerConfig,
) -> Result<(Vec<ResultRecord>, Vec<Diagnostic>), DomainError> {
    let container = ServiceContainer::new(config);
    let observed = container.create_device_probe().observed_devices().await?;

    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let resolver = container.create_resolver_with_diagnostics(diagnostics.clone());
    let records = resolver.resolve_records(&observed, &container.resolution_paths());

    Ok((records, diagnostics.take()))
}

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

//! Dependency injection container for id resolution services

use crate::adapters::{FileIdsSource, JsonFileCacheStore, LogDiagnostics, SysfsDeviceProbe};
use crate::domain::{BusType, ConfigError, HardwareIdResolver, ResolutionPaths};
use crate::ports::{CacheStore, DeviceIdProbe, DiagnosticsSink, HardwareIdResolution, IdsSource};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where distributions install `pci.ids`, most common first
pub const PCI_IDS_CANDIDATES: &[&str] = &[
    "/usr/share/misc/pci.ids",
    "/usr/share/hwdata/pci.ids",
    "/usr/share/pci.ids",
    "/var/lib/pciutils/pci.ids",
    "/usr/local/share/pciids/pci.ids",
    "/usr/share/pciids/pci.ids",
];

/// Where distributions install `usb.ids`, most common first
pub const USB_IDS_CANDIDATES: &[&str] = &[
    "/usr/share/misc/usb.ids",
    "/usr/share/hwdata/usb.ids",
    "/usr/share/usb.ids",
    "/var/lib/usbutils/usb.ids",
    "/usr/local/share/usb.ids",
];

const CACHE_DIR_NAME: &str = "hardware_ids";
const CACHE_FILE_NAME: &str = "ids_cache.json";

/// Configuration for the dependency injection container
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// Explicit `pci.ids` location; searched for when unset
    pub pci_ids: Option<PathBuf>,
    /// Explicit `usb.ids` location; searched for when unset
    pub usb_ids: Option<PathBuf>,
    /// Cache document location; per-user cache dir when unset
    pub cache: Option<PathBuf>,
    /// Root of the sysfs mount used by the probe
    pub sysfs_root: PathBuf,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            pci_ids: None,
            usb_ids: None,
            cache: None,
            sysfs_root: PathBuf::from("/sys"),
            verbose: false,
        }
    }
}

impl ContainerConfig {
    /// Load configuration from a TOML file
    ///
    /// Every key is optional:
    ///
    /// ```toml
    /// pci_ids = "/usr/share/hwdata/pci.ids"
    /// cache = "/var/cache/hardware_ids/ids_cache.json"
    /// ```
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlay `other` on top of this config; set fields in `other` win
    pub fn merge(mut self, other: ContainerConfigOverrides) -> Self {
        if other.pci_ids.is_some() {
            self.pci_ids = other.pci_ids;
        }
        if other.usb_ids.is_some() {
            self.usb_ids = other.usb_ids;
        }
        if other.cache.is_some() {
            self.cache = other.cache;
        }
        if let Some(root) = other.sysfs_root {
            self.sysfs_root = root;
        }
        self.verbose |= other.verbose;
        self
    }
}

/// Settings that take precedence over a loaded [`ContainerConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerConfigOverrides {
    pub pci_ids: Option<PathBuf>,
    pub usb_ids: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub sysfs_root: Option<PathBuf>,
    pub verbose: bool,
}

/// Pick the first candidate that exists, else the first candidate
///
/// Falling back to a nonexistent path lets the resolver raise the usual
/// missing-database diagnostic instead of failing here.
pub fn locate_ids_file(candidates: &[&str]) -> PathBuf {
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
        .or_else(|| candidates.first().map(PathBuf::from))
        .unwrap_or_default()
}

/// Default cache document location
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
        .join(CACHE_FILE_NAME)
}

/// Dependency injection container
pub struct ServiceContainer {
    config: ContainerConfig,
}

impl ServiceContainer {
    /// Create a new service container with configuration
    pub fn new(config: ContainerConfig) -> Self {
        Self { config }
    }

    /// Create a service container with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ContainerConfig::default())
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Create the ids database source
    pub fn create_ids_source(&self) -> Arc<dyn IdsSource> {
        Arc::new(FileIdsSource::new())
    }

    /// Create the cache store
    pub fn create_cache_store(&self) -> Arc<dyn CacheStore> {
        Arc::new(JsonFileCacheStore::new())
    }

    /// Create the default diagnostics sink
    pub fn create_diagnostics_sink(&self) -> Arc<dyn DiagnosticsSink> {
        Arc::new(LogDiagnostics::new())
    }

    /// Create the bus probe
    pub fn create_device_probe(&self) -> Arc<dyn DeviceIdProbe> {
        Arc::new(SysfsDeviceProbe::new(self.config.sysfs_root.clone()))
    }

    /// Create the resolver, reporting diagnostics to `diagnostics`
    pub fn create_resolver_with_diagnostics(
        &self,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Arc<dyn HardwareIdResolution> {
        Arc::new(HardwareIdResolver::new(
            self.create_ids_source(),
            self.create_cache_store(),
            diagnostics,
        ))
    }

    /// Create the resolver with log-backed diagnostics
    pub fn create_resolver(&self) -> Arc<dyn HardwareIdResolution> {
        self.create_resolver_with_diagnostics(self.create_diagnostics_sink())
    }

    /// Resolve configured or discovered file locations
    pub fn resolution_paths(&self) -> ResolutionPaths {
        ResolutionPaths {
            pci_ids: self.ids_path(BusType::Pci),
            usb_ids: self.ids_path(BusType::Usb),
            cache: self.config.cache.clone().unwrap_or_else(default_cache_path),
        }
    }

    fn ids_path(&self, bus: BusType) -> PathBuf {
        let (configured, candidates) = match bus {
            BusType::Pci => (&self.config.pci_ids, PCI_IDS_CANDIDATES),
            BusType::Usb => (&self.config.usb_ids, USB_IDS_CANDIDATES),
        };
        configured
            .clone()
            .unwrap_or_else(|| locate_ids_file(candidates))
    }
}

/// Builder pattern for container configuration
pub struct ContainerConfigBuilder {
    config: ContainerConfig,
}

impl ContainerConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
        }
    }

    /// Set the `pci.ids` path
    pub fn pci_ids(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pci_ids = Some(path.into());
        self
    }

    /// Set the `usb.ids` path
    pub fn usb_ids(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.usb_ids = Some(path.into());
        self
    }

    /// Set the cache document path
    pub fn cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache = Some(path.into());
        self
    }

    /// Set the sysfs root
    pub fn sysfs_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.sysfs_root = path.into();
        self
    }

    /// Enable verbose logging
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContainerConfig {
        self.config
    }
}

impl Default for ContainerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

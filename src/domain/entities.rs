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

use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// A 16-bit vendor or device identifier rendered as 4 lowercase hex digits
///
/// Construction normalizes case and zero-pads, so `"46D"` and `"046d"` are
/// the same id. Serialized as the bare string, which lets it act as a JSON
/// object key in the cache document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HardwareId(String);

impl HardwareId {
    /// Parse 1-4 hex digits (case-insensitive) into a normalized id
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > 4
            || !trimmed.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(DomainError::InvalidHardwareId(raw.to_string()));
        }
        Ok(Self(format!("{:0>4}", trimmed.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HardwareId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HardwareId> for String {
    fn from(id: HardwareId) -> Self {
        id.0
    }
}

impl std::str::FromStr for HardwareId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Hardware domain an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BusType {
    #[serde(rename = "PCI")]
    Pci,
    #[serde(rename = "USB")]
    Usb,
}

impl BusType {
    /// All bus types in display order
    pub const ALL: [BusType; 2] = [BusType::Pci, BusType::Usb];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusType::Pci => "PCI",
            BusType::Usb => "USB",
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor id -> device ids actually present on the host for one bus type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservedIdSet(BTreeMap<HardwareId, BTreeSet<HardwareId>>);

impl ObservedIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one vendor:device pair
    pub fn insert(&mut self, vendor: HardwareId, device: HardwareId) {
        self.0.entry(vendor).or_default().insert(device);
    }

    /// Convenience for string ids, rejecting anything that isn't hex
    pub fn insert_raw(&mut self, vendor: &str, device: &str) -> Result<(), DomainError> {
        self.insert(HardwareId::parse(vendor)?, HardwareId::parse(device)?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct vendor:device pairs
    pub fn pair_count(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn devices(&self, vendor: &HardwareId) -> Option<&BTreeSet<HardwareId>> {
        self.0.get(vendor)
    }

    pub fn contains(&self, vendor: &HardwareId, device: &HardwareId) -> bool {
        self.0
            .get(vendor)
            .map(|devices| devices.contains(device))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HardwareId, &BTreeSet<HardwareId>)> {
        self.0.iter()
    }
}

impl FromIterator<(HardwareId, HardwareId)> for ObservedIdSet {
    fn from_iter<I: IntoIterator<Item = (HardwareId, HardwareId)>>(iter: I) -> Self {
        let mut set = ObservedIdSet::new();
        for (vendor, device) in iter {
            set.insert(vendor, device);
        }
        set
    }
}

/// Observed ids for both bus types, as produced by a probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedDevices {
    pub pci: ObservedIdSet,
    pub usb: ObservedIdSet,
}

impl ObservedDevices {
    pub fn new(pci: ObservedIdSet, usb: ObservedIdSet) -> Self {
        Self { pci, usb }
    }

    pub fn for_bus(&self, bus: BusType) -> &ObservedIdSet {
        match bus {
            BusType::Pci => &self.pci,
            BusType::Usb => &self.usb,
        }
    }

    pub fn for_bus_mut(&mut self, bus: BusType) -> &mut ObservedIdSet {
        match bus {
            BusType::Pci => &mut self.pci,
            BusType::Usb => &mut self.usb,
        }
    }
}

/// Human-readable names for one vendor:device pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    #[serde(rename = "vendor")]
    pub vendor_name: String,
    #[serde(rename = "device")]
    pub device_name: String,
}

/// Vendor id -> device id -> names, for a single bus type
pub type BusCatalog = BTreeMap<HardwareId, BTreeMap<HardwareId, ResolvedEntry>>;

/// Resolved names for both bus types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCatalog {
    #[serde(default)]
    pub pci: BusCatalog,
    #[serde(default)]
    pub usb: BusCatalog,
}

impl ResolvedCatalog {
    pub fn fragment(&self, bus: BusType) -> &BusCatalog {
        match bus {
            BusType::Pci => &self.pci,
            BusType::Usb => &self.usb,
        }
    }

    /// Replace a bus type's fragment wholesale
    pub fn set_fragment(&mut self, bus: BusType, fragment: BusCatalog) {
        match bus {
            BusType::Pci => self.pci = fragment,
            BusType::Usb => self.usb = fragment,
        }
    }

    pub fn get(
        &self,
        bus: BusType,
        vendor: &HardwareId,
        device: &HardwareId,
    ) -> Option<&ResolvedEntry> {
        self.fragment(bus).get(vendor)?.get(device)
    }

    /// Total resolved pairs across both bus types
    pub fn len(&self) -> usize {
        BusType::ALL
            .iter()
            .map(|bus| self.fragment(*bus).values().map(BTreeMap::len).sum::<usize>())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Persisted form of a [`ResolvedCatalog`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDocument {
    pub hw: ResolvedCatalog,
}

impl CacheDocument {
    pub fn new(hw: ResolvedCatalog) -> Self {
        Self { hw }
    }
}

/// Flattened, display-ready record for one resolved device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub vendor: String,
    pub device: String,
    #[serde(rename = "type")]
    pub bus_type: BusType,
}

/// Filesystem locations used by one resolution cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPaths {
    /// Path to `pci.ids`
    pub pci_ids: PathBuf,
    /// Path to `usb.ids`
    pub usb_ids: PathBuf,
    /// Path to the cache document
    pub cache: PathBuf,
}

impl ResolutionPaths {
    pub fn new(
        pci_ids: impl Into<PathBuf>,
        usb_ids: impl Into<PathBuf>,
        cache: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pci_ids: pci_ids.into(),
            usb_ids: usb_ids.into(),
            cache: cache.into(),
        }
    }

    pub fn ids_path(&self, bus: BusType) -> &PathBuf {
        match bus {
            BusType::Pci => &self.pci_ids,
            BusType::Usb => &self.usb_ids,
        }
    }
}

/// How a bus type's fragment was obtained during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BusResolution {
    /// Nothing observed; no lookup performed
    Empty,
    /// Every observed pair was already cached
    CacheHit,
    /// Every observed pair was cached, but so were pairs no longer present;
    /// those were dropped
    Pruned,
    /// The ids database was parsed
    Parsed,
}

/// Result of one resolution cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    pub catalog: ResolvedCatalog,
    pub pci: BusResolution,
    pub usb: BusResolution,
    /// Whether the cache document was rewritten successfully
    pub persisted: bool,
}

impl ResolutionOutcome {
    pub fn resolution(&self, bus: BusType) -> BusResolution {
        match bus {
            BusType::Pci => self.pci,
            BusType::Usb => self.usb,
        }
    }

    /// True when at least one ids database had to be parsed
    pub fn needed_parse(&self) -> bool {
        self.pci == BusResolution::Parsed || self.usb == BusResolution::Parsed
    }

    /// True when the catalog no longer matches the loaded cache document
    pub fn cache_changed(&self) -> bool {
        BusType::ALL.iter().any(|bus| {
            matches!(
                self.resolution(*bus),
                BusResolution::Parsed | BusResolution::Pruned
            )
        })
    }
}

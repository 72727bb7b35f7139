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

//! Linux sysfs bus probe

use crate::domain::{
    parse_pci_uevent, parse_usb_uevent, BusType, HardwareId, ObservedDevices, ObservedIdSet,
    SystemError,
};
use crate::ports::DeviceIdProbe;
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Enumerates PCI and USB ids from `/sys/bus/*/devices/*/uevent`
pub struct SysfsDeviceProbe {
    /// Root of the sysfs mount, normally `/sys`
    root: PathBuf,
}

impl SysfsDeviceProbe {
    /// Create a new sysfs probe rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn devices_dir(&self, bus: BusType) -> PathBuf {
        let bus_dir = match bus {
            BusType::Pci => "pci",
            BusType::Usb => "usb",
        };
        self.root.join("bus").join(bus_dir).join("devices")
    }

    /// Collect every id pair for one bus type
    ///
    /// A missing bus directory (no USB controller, non-Linux host) is an
    /// empty set, not an error.
    async fn probe_bus(&self, bus: BusType) -> Result<ObservedIdSet, SystemError> {
        let dir = self.devices_dir(bus);
        let mut observed = ObservedIdSet::new();

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} not present, no {} devices", dir.display(), bus);
                return Ok(observed);
            }
            Err(e) => return Err(SystemError::io(&dir, &e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SystemError::io(&dir, &e))?
        {
            if let Some((vendor, device)) = read_uevent(bus, &entry.path()).await {
                observed.insert(vendor, device);
            }
        }

        debug!("Found {} distinct {} id pairs", observed.pair_count(), bus);
        Ok(observed)
    }
}

impl Default for SysfsDeviceProbe {
    fn default() -> Self {
        Self::new("/sys")
    }
}

async fn read_uevent(bus: BusType, device_dir: &Path) -> Option<(HardwareId, HardwareId)> {
    let content = fs::read_to_string(device_dir.join("uevent")).await.ok()?;
    match bus {
        BusType::Pci => parse_pci_uevent(&content),
        BusType::Usb => parse_usb_uevent(&content),
    }
}

#[async_trait]
impl DeviceIdProbe for SysfsDeviceProbe {
    async fn observed_devices(&self) -> Result<ObservedDevices, SystemError> {
        let (pci, usb) = tokio::join!(self.probe_bus(BusType::Pci), self.probe_bus(BusType::Usb));
        Ok(ObservedDevices::new(pci?, usb?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::tempdir;

    fn write_uevent(root: &Path, bus: &str, device: &str, content: &str) {
        let dir = root.join("bus").join(bus).join("devices").join(device);
        std_fs::create_dir_all(&dir).unwrap();
        std_fs::write(dir.join("uevent"), content).unwrap();
    }

    #[tokio::test]
    async fn test_probe_fake_sysfs() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write_uevent(root, "pci", "0000:01:00.0", "DRIVER=nvidia\nPCI_ID=10DE:2204\n");
        write_uevent(root, "pci", "0000:01:00.1", "DRIVER=snd_hda_intel\nPCI_ID=10DE:1AEF\n");
        write_uevent(root, "pci", "0000:02:00.0", "PCI_ID=10DE:2204\n");
        write_uevent(root, "usb", "1-2", "DEVTYPE=usb_device\nPRODUCT=46d/c52b/1201\n");
        write_uevent(root, "usb", "1-2:1.0", "DEVTYPE=usb_interface\nPRODUCT=46d/c52b/1201\n");
        write_uevent(root, "usb", "usb1", "DEVTYPE=usb_device\nPRODUCT=1d6b/2/515\n");

        let observed = SysfsDeviceProbe::new(root).observed_devices().await.unwrap();

        assert_eq!(observed.pci.pair_count(), 2);
        assert_eq!(observed.usb.pair_count(), 2);
        assert!(observed.usb.contains(
            &HardwareId::parse("1d6b").unwrap(),
            &HardwareId::parse("0002").unwrap()
        ));
    }

    #[tokio::test]
    async fn test_missing_bus_directories_are_empty() {
        let temp_dir = tempdir().unwrap();
        let observed = SysfsDeviceProbe::new(temp_dir.path())
            .observed_devices()
            .await
            .unwrap();

        assert!(observed.pci.is_empty());
        assert!(observed.usb.is_empty());
    }
}

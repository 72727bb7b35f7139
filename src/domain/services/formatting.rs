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

use crate::domain::{BusType, ResolvedCatalog, ResultRecord};

/// Flatten a catalog into display records
///
/// PCI records come first, then USB. Within a bus type, vendors and devices
/// keep catalog order. One record per vendor:device pair, regardless of how
/// many physical slots carry it.
pub fn flatten(catalog: &ResolvedCatalog) -> Vec<ResultRecord> {
    BusType::ALL
        .iter()
        .flat_map(|bus| {
            catalog
                .fragment(*bus)
                .values()
                .flat_map(|devices| devices.values())
                .map(move |entry| ResultRecord {
                    vendor: entry.vendor_name.clone(),
                    device: entry.device_name.clone(),
                    bus_type: *bus,
                })
        })
        .collect()
}

/// Render records as aligned `TYPE  vendor  device` lines
pub fn render_text(records: &[ResultRecord]) -> String {
    let vendor_width = records
        .iter()
        .map(|r| r.vendor.chars().count())
        .max()
        .unwrap_or(0);

    records
        .iter()
        .map(|r| {
            format!(
                "{:<3}  {:<width$}  {}\n",
                r.bus_type.as_str(),
                r.vendor,
                r.device,
                width = vendor_width
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HardwareId, ResolvedEntry};

    fn entry(vendor: &str, device: &str) -> ResolvedEntry {
        ResolvedEntry {
            vendor_name: vendor.to_string(),
            device_name: device.to_string(),
        }
    }

    fn id(s: &str) -> HardwareId {
        HardwareId::parse(s).unwrap()
    }

    #[test]
    fn test_flatten_orders_pci_before_usb() {
        let mut catalog = ResolvedCatalog::default();
        catalog
            .usb
            .entry(id("046d"))
            .or_default()
            .insert(id("c52b"), entry("Logitech, Inc.", "Unifying Receiver"));
        catalog
            .pci
            .entry(id("8086"))
            .or_default()
            .insert(id("9a49"), entry("Intel Corporation", "Iris Xe Graphics"));
        catalog
            .pci
            .entry(id("10de"))
            .or_default()
            .insert(id("2204"), entry("NVIDIA Corporation", "GA102"));

        let records = flatten(&catalog);
        let types: Vec<BusType> = records.iter().map(|r| r.bus_type).collect();
        assert_eq!(types, vec![BusType::Pci, BusType::Pci, BusType::Usb]);
        assert_eq!(records[0].vendor, "NVIDIA Corporation");
        assert_eq!(records[1].vendor, "Intel Corporation");
        assert_eq!(records[2].device, "Unifying Receiver");
    }

    #[test]
    fn test_flatten_empty_catalog() {
        assert!(flatten(&ResolvedCatalog::default()).is_empty());
    }

    #[test]
    fn test_render_text_aligns_vendor_column() {
        let records = vec![
            ResultRecord {
                vendor: "Intel Corporation".to_string(),
                device: "Iris Xe Graphics".to_string(),
                bus_type: BusType::Pci,
            },
            ResultRecord {
                vendor: "Logitech".to_string(),
                device: "Unifying Receiver".to_string(),
                bus_type: BusType::Usb,
            },
        ];

        assert_eq!(
            render_text(&records),
            "PCI  Intel Corporation  Iris Xe Graphics\nUSB  Logitech           Unifying Receiver\n"
        );
    }
}

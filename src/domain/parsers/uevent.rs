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

//! Parsers for sysfs `uevent` files under `/sys/bus/{pci,usb}/devices/*`

use crate::domain::HardwareId;

/// Extract the vendor:device pair from a PCI device `uevent`
///
/// Expected line: `PCI_ID=10DE:2204`
pub fn parse_pci_uevent(content: &str) -> Option<(HardwareId, HardwareId)> {
    let value = uevent_value(content, "PCI_ID")?;
    let (vendor, device) = value.split_once(':')?;
    Some((HardwareId::parse(vendor).ok()?, HardwareId::parse(device).ok()?))
}

/// Extract the vendor:product pair from a USB device `uevent`
///
/// Expected line: `PRODUCT=46d/c52b/1201` (hex, not zero padded). Interface
/// entries carry the same key, so callers see each device once per
/// interface; the observed set collapses those duplicates.
pub fn parse_usb_uevent(content: &str) -> Option<(HardwareId, HardwareId)> {
    let value = uevent_value(content, "PRODUCT")?;
    let mut parts = value.split('/');
    let vendor = parts.next()?;
    let product = parts.next()?;
    Some((HardwareId::parse(vendor).ok()?, HardwareId::parse(product).ok()?))
}

fn uevent_value<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim())
    })
}

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

use crate::domain::{BusCatalog, BusType, ObservedDevices, ResolvedCatalog};
use std::collections::BTreeMap;

/// Whether `cached` already names every observed id for `bus`
///
/// Short-circuits on the first observed vendor:device pair missing from the
/// cache. Each bus type is judged on its own, so a USB miss never forces the
/// much larger PCI database to be re-read.
pub fn is_sufficient(bus: BusType, observed: &ObservedDevices, cached: &ResolvedCatalog) -> bool {
    for (vendor, devices) in observed.for_bus(bus).iter() {
        for device in devices {
            if cached.get(bus, vendor, device).is_none() {
                return false;
            }
        }
    }
    true
}

/// The cached fragment for `bus`, restricted to pairs still observed
///
/// Vendors left with no observed device are dropped as well.
pub fn retain_observed(bus: BusType, observed: &ObservedDevices, cached: &ResolvedCatalog) -> BusCatalog {
    let target = observed.for_bus(bus);
    cached
        .fragment(bus)
        .iter()
        .filter_map(|(vendor, devices)| {
            let kept: BTreeMap<_, _> = devices
                .iter()
                .filter(|(device, _)| target.contains(vendor, device))
                .map(|(device, entry)| (device.clone(), entry.clone()))
                .collect();
            (!kept.is_empty()).then(|| (vendor.clone(), kept))
        })
        .collect()
}

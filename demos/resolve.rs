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

//! Resolve a few well-known ids with the default file locations
//!
//! Pairs can be given as `pci:VVVV:DDDD` or `usb:VVVV:DDDD` arguments;
//! without arguments a small sample is used.

use hardware_ids::{create_resolver, flatten, BusType, ObservedDevices};
use std::error::Error;

const SAMPLE: &[&str] = &["pci:8086:1533", "pci:10de:2204", "usb:1d6b:0002"];

fn parse_pair(arg: &str) -> Result<(BusType, &str, &str), Box<dyn Error>> {
    let mut parts = arg.splitn(3, ':');
    let bus = match parts.next() {
        Some("pci") => BusType::Pci,
        Some("usb") => BusType::Usb,
        _ => return Err(format!("expected pci: or usb: prefix in {}", arg).into()),
    };
    match (parts.next(), parts.next()) {
        (Some(vendor), Some(device)) => Ok((bus, vendor, device)),
        _ => Err(format!("expected BUS:VENDOR:DEVICE, got {}", arg).into()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("Hardware ID Resolution Example");
    println!("==============================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let pairs: Vec<&str> = if args.is_empty() {
        SAMPLE.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    let mut observed = ObservedDevices::default();
    for arg in pairs {
        let (bus, vendor, device) = parse_pair(arg)?;
        observed.for_bus_mut(bus).insert_raw(vendor, device)?;
    }

    let (resolver, paths) = create_resolver(None);
    println!("\npci.ids: {}", paths.pci_ids.display());
    println!("usb.ids: {}", paths.usb_ids.display());
    println!("cache:   {}", paths.cache.display());

    let outcome = resolver.resolve(&observed, &paths);
    for bus in BusType::ALL {
        println!("{} resolved via {:?}", bus, outcome.resolution(bus));
    }

    println!();
    for record in flatten(&outcome.catalog) {
        println!("{:<3}  {}  {}", record.bus_type.as_str(), record.vendor, record.device);
    }

    Ok(())
}

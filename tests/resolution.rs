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

use assert_fs::prelude::*;
use assert_fs::TempDir;
use hardware_ids::{
    BusResolution, BusType, CacheDocument, CacheStore, CollectingDiagnostics,
    ContainerConfigBuilder, Diagnostic, HardwareId, JsonFileCacheStore, ObservedDevices,
    ResolutionPaths, ServiceContainer,
};
use predicates::prelude::*;
use std::sync::Arc;

const PCI_IDS: &str = "\
# List of PCI ID's
10de  NVIDIA Corporation
\t1aef  GA102 High Definition Audio Controller
\t2204  GA102 [GeForce RTX 3090]
\t\t10de 1454  RTX 3090 Founders Edition
8086  Intel Corporation
\t1533  I210 Gigabit Network Connection
C 02  Network controller
\t00  Ethernet controller
";

const USB_IDS: &str = "\
046d  Logitech, Inc.
\tc52b  Unifying Receiver
1d6b  Linux Foundation
\t0002  2.0 root hub
\t0003  3.0 root hub
";

fn id(raw: &str) -> HardwareId {
    HardwareId::parse(raw).unwrap()
}

fn observed(pci: &[(&str, &str)], usb: &[(&str, &str)]) -> ObservedDevices {
    let mut observed = ObservedDevices::default();
    for (bus, pairs) in [(BusType::Pci, pci), (BusType::Usb, usb)] {
        for (vendor, device) in pairs {
            observed.for_bus_mut(bus).insert_raw(vendor, device).unwrap();
        }
    }
    observed
}

struct Fixture {
    temp: TempDir,
    container: ServiceContainer,
    paths: ResolutionPaths,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        temp.child("pci.ids").write_str(PCI_IDS).unwrap();
        temp.child("usb.ids").write_str(USB_IDS).unwrap();

        let config = ContainerConfigBuilder::new()
            .pci_ids(temp.child("pci.ids").path())
            .usb_ids(temp.child("usb.ids").path())
            .cache(temp.child("cache").child("ids_cache.json").path())
            .build();
        let container = ServiceContainer::new(config);
        let paths = container.resolution_paths();

        Self {
            temp,
            container,
            paths,
        }
    }

    fn cached(&self) -> CacheDocument {
        JsonFileCacheStore::new().load(&self.paths.cache)
    }
}

#[test]
fn cold_cache_parses_and_persists() {
    let fixture = Fixture::new();
    let cache = fixture.temp.child("cache").child("ids_cache.json");
    cache.assert(predicate::path::missing());

    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let resolver = fixture
        .container
        .create_resolver_with_diagnostics(diagnostics.clone());
    let devices = observed(&[("10DE", "2204"), ("8086", "1533")], &[("46d", "c52b")]);

    let outcome = resolver.resolve(&devices, &fixture.paths);

    assert_eq!(outcome.pci, BusResolution::Parsed);
    assert_eq!(outcome.usb, BusResolution::Parsed);
    assert!(outcome.persisted);
    assert!(diagnostics.is_empty());
    cache.assert(predicate::path::is_file());
    cache.assert(predicate::str::contains("GA102 [GeForce RTX 3090]"));
    assert_eq!(fixture.cached().hw, outcome.catalog);

    let records = resolver.resolve_records(&devices, &fixture.paths);
    let names: Vec<_> = records
        .iter()
        .map(|r| (r.bus_type, r.vendor.as_str(), r.device.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            (BusType::Pci, "NVIDIA Corporation", "GA102 [GeForce RTX 3090]"),
            (BusType::Pci, "Intel Corporation", "I210 Gigabit Network Connection"),
            (BusType::Usb, "Logitech, Inc.", "Unifying Receiver"),
        ]
    );
}

#[test]
fn warm_cache_needs_no_database() {
    let fixture = Fixture::new();
    let devices = observed(&[("10de", "2204")], &[("1d6b", "0002")]);
    fixture
        .container
        .create_resolver()
        .resolve(&devices, &fixture.paths);

    // Databases gone: a sufficient cache must still answer
    let offline = ResolutionPaths::new(
        fixture.temp.child("gone-pci.ids").path(),
        fixture.temp.child("gone-usb.ids").path(),
        &fixture.paths.cache,
    );
    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let outcome = fixture
        .container
        .create_resolver_with_diagnostics(diagnostics.clone())
        .resolve(&devices, &offline);

    for bus in BusType::ALL {
        assert_eq!(outcome.resolution(bus), BusResolution::CacheHit);
    }
    assert!(!outcome.persisted);
    assert!(diagnostics.is_empty());
    assert_eq!(
        outcome
            .catalog
            .get(BusType::Usb, &id("1d6b"), &id("0002"))
            .map(|e| e.device_name.as_str()),
        Some("2.0 root hub")
    );
}

#[test]
fn repeated_runs_leave_cache_unchanged() {
    let fixture = Fixture::new();
    let resolver = fixture.container.create_resolver();
    let devices = observed(&[("10de", "1aef")], &[("046d", "c52b")]);

    let first = resolver.resolve(&devices, &fixture.paths);
    let written = std::fs::read_to_string(&fixture.paths.cache).unwrap();
    let second = resolver.resolve(&devices, &fixture.paths);

    assert_eq!(first.catalog, second.catalog);
    assert!(!second.needed_parse());
    assert_eq!(
        std::fs::read_to_string(&fixture.paths.cache).unwrap(),
        written
    );
}

#[test]
fn new_device_replaces_stale_fragment() {
    let fixture = Fixture::new();
    let resolver = fixture.container.create_resolver();

    resolver.resolve(
        &observed(&[("10de", "2204")], &[("046d", "c52b")]),
        &fixture.paths,
    );

    // The GPU was pulled and a NIC added; USB unchanged
    let outcome = resolver.resolve(
        &observed(&[("8086", "1533")], &[("046d", "c52b")]),
        &fixture.paths,
    );

    assert_eq!(outcome.pci, BusResolution::Parsed);
    assert_eq!(outcome.usb, BusResolution::CacheHit);
    assert!(outcome.catalog.pci.get(&id("10de")).is_none());
    assert!(outcome
        .catalog
        .get(BusType::Pci, &id("8086"), &id("1533"))
        .is_some());
    assert_eq!(fixture.cached().hw, outcome.catalog);
}

#[test]
fn removed_device_disappears_from_records_and_cache() {
    let fixture = Fixture::new();
    let resolver = fixture.container.create_resolver();
    let cache = fixture.temp.child("cache").child("ids_cache.json");

    resolver.resolve(
        &observed(&[("10de", "1aef"), ("10de", "2204")], &[]),
        &fixture.paths,
    );
    cache.assert(predicate::str::contains("GA102 [GeForce RTX 3090]"));

    // The GPU was pulled; its audio function is still there
    let devices = observed(&[("10de", "1aef")], &[]);
    let outcome = resolver.resolve(&devices, &fixture.paths);

    assert_eq!(outcome.resolution(BusType::Pci), BusResolution::Pruned);
    assert!(outcome.persisted);
    let records = resolver.resolve_records(&devices, &fixture.paths);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].device, "GA102 High Definition Audio Controller");
    assert!(!std::fs::read_to_string(cache.path())
        .unwrap()
        .contains("GA102 [GeForce RTX 3090]"));
    assert_eq!(fixture.cached().hw, outcome.catalog);
}

#[test]
fn missing_database_is_reported_not_fatal() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.temp.child("usb.ids").path()).unwrap();

    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let outcome = fixture
        .container
        .create_resolver_with_diagnostics(diagnostics.clone())
        .resolve(
            &observed(&[("10de", "2204")], &[("046d", "c52b")]),
            &fixture.paths,
        );

    assert_eq!(outcome.catalog.pci.len(), 1);
    assert!(outcome.catalog.usb.is_empty());

    let reported = diagnostics.take();
    assert_eq!(reported.len(), 1);
    assert!(matches!(
        &reported[0],
        Diagnostic::SourceUnavailable { bus: BusType::Usb, .. }
    ));
}

#[test]
fn nothing_observed_touches_nothing() {
    let fixture = Fixture::new();
    let outcome = fixture
        .container
        .create_resolver()
        .resolve(&ObservedDevices::default(), &fixture.paths);

    assert_eq!(outcome.pci, BusResolution::Empty);
    assert_eq!(outcome.usb, BusResolution::Empty);
    assert!(outcome.catalog.is_empty());
    fixture
        .temp
        .child("cache")
        .assert(predicate::path::missing());
}

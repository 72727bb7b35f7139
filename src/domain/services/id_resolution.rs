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

use crate::domain::{
    is_sufficient, parse_ids_reader, retain_observed, BusCatalog, BusResolution, BusType, CacheDocument,
    Diagnostic, ObservedDevices, ObservedIdSet, ResolutionOutcome, ResolutionPaths,
    ResolvedCatalog,
};
use crate::ports::{CacheStore, DiagnosticsSink, HardwareIdResolution, IdsSource};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// Domain service that resolves observed ids to names
///
/// Each cycle loads the cache, checks it per bus type, parses only the
/// databases whose bus type misses, and rewrites the cache only when a parse
/// happened or cached pairs were no longer observed. Nothing here returns an error: problems go to the diagnostics
/// sink and the affected bus type resolves to an empty fragment.
pub struct HardwareIdResolver {
    /// Access to pci.ids / usb.ids
    ids_source: Arc<dyn IdsSource>,
    /// Persistent name cache
    cache_store: Arc<dyn CacheStore>,
    /// Side-channel for non-fatal problems
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl HardwareIdResolver {
    /// Create a new resolver
    ///
    /// # Arguments
    /// * `ids_source` - Opens the ids databases
    /// * `cache_store` - Loads and saves the cache document
    /// * `diagnostics` - Receives non-fatal problems
    pub fn new(
        ids_source: Arc<dyn IdsSource>,
        cache_store: Arc<dyn CacheStore>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        Self {
            ids_source,
            cache_store,
            diagnostics,
        }
    }

    /// Parse one bus type's database against its observed ids
    fn parse_bus(&self, bus: BusType, path: &Path, target: &ObservedIdSet) -> BusCatalog {
        let reader = match self.ids_source.open(path) {
            Ok(reader) => reader,
            Err(e) => {
                self.diagnostics.report(Diagnostic::SourceUnavailable {
                    bus,
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                return BusCatalog::new();
            }
        };

        match parse_ids_reader(reader, target) {
            Ok(fragment) => {
                debug!(
                    "Parsed {} ids from {}: {} of {} observed pairs named",
                    bus,
                    path.display(),
                    fragment.values().map(|d| d.len()).sum::<usize>(),
                    target.pair_count()
                );
                fragment
            }
            Err(e) => {
                self.diagnostics.report(Diagnostic::SourceUnavailable {
                    bus,
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                BusCatalog::new()
            }
        }
    }

    /// Decide how a single bus type gets its fragment
    fn resolve_bus(
        &self,
        bus: BusType,
        observed: &ObservedDevices,
        cached: &ResolvedCatalog,
        paths: &ResolutionPaths,
    ) -> (BusCatalog, BusResolution) {
        let target = observed.for_bus(bus);

        if target.is_empty() {
            debug!("No {} devices observed, skipping lookup", bus);
            return (BusCatalog::new(), BusResolution::Empty);
        }

        if is_sufficient(bus, observed, cached) {
            debug!("{} cache covers all {} observed pairs", bus, target.pair_count());
            let fragment = retain_observed(bus, observed, cached);
            if &fragment == cached.fragment(bus) {
                return (fragment, BusResolution::CacheHit);
            }
            debug!("Dropping {} cached pairs no longer observed", bus);
            return (fragment, BusResolution::Pruned);
        }

        debug!("{} cache is stale, parsing {}", bus, paths.ids_path(bus).display());
        (
            self.parse_bus(bus, paths.ids_path(bus), target),
            BusResolution::Parsed,
        )
    }
}

impl HardwareIdResolution for HardwareIdResolver {
    fn resolve(&self, observed: &ObservedDevices, paths: &ResolutionPaths) -> ResolutionOutcome {
        let cached = self.cache_store.load(&paths.cache);

        let mut catalog = ResolvedCatalog::default();
        let (pci_fragment, pci) = self.resolve_bus(BusType::Pci, observed, &cached.hw, paths);
        catalog.set_fragment(BusType::Pci, pci_fragment);
        let (usb_fragment, usb) = self.resolve_bus(BusType::Usb, observed, &cached.hw, paths);
        catalog.set_fragment(BusType::Usb, usb_fragment);

        let mut outcome = ResolutionOutcome {
            catalog,
            pci,
            usb,
            persisted: false,
        };

        if !outcome.cache_changed() {
            return outcome;
        }

        let document = CacheDocument::new(outcome.catalog);
        match self.cache_store.save(&paths.cache, &document) {
            Ok(()) => {
                info!(
                    "Cached {} resolved ids at {}",
                    document.hw.len(),
                    paths.cache.display()
                );
                outcome.persisted = true;
            }
            Err(e) => self.diagnostics.report(Diagnostic::CacheUnwritable {
                path: paths.cache.clone(),
                reason: e.to_string(),
            }),
        }
        outcome.catalog = document.hw;

        outcome
    }
}

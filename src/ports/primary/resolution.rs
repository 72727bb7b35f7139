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
    flatten, ObservedDevices, ResolutionOutcome, ResolutionPaths, ResultRecord,
};

/// Primary port - Main interface offered by the id resolution domain
///
/// This is what external systems (CLI, display layers, library consumers) use
/// to turn observed vendor:device ids into names.
pub trait HardwareIdResolution: Send + Sync {
    /// Run one resolution cycle
    ///
    /// # Arguments
    /// * `observed` - Ids present on the host, per bus type
    /// * `paths` - Locations of `pci.ids`, `usb.ids` and the cache document
    ///
    /// # Returns
    /// * `ResolutionOutcome` - Catalog plus how each bus type was resolved.
    ///   Problems are reported through diagnostics, never returned.
    fn resolve(&self, observed: &ObservedDevices, paths: &ResolutionPaths) -> ResolutionOutcome;

    /// Run one resolution cycle and flatten it into display records
    fn resolve_records(
        &self,
        observed: &ObservedDevices,
        paths: &ResolutionPaths,
    ) -> Vec<ResultRecord> {
        flatten(&self.resolve(observed, paths).catalog)
    }
}

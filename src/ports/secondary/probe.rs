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

use crate::domain::{ObservedDevices, SystemError};
use async_trait::async_trait;

/// Secondary port - Bus enumeration
///
/// Implementations discover which vendor:device ids are present on the host.
/// They are responsible for normalizing case and padding; the resolver only
/// ever sees [`HardwareId`](crate::domain::HardwareId) values.
#[async_trait]
pub trait DeviceIdProbe: Send + Sync {
    /// Enumerate PCI and USB ids present on the host
    ///
    /// # Returns
    /// * `Ok(ObservedDevices)` - Observed ids (either side may be empty)
    /// * `Err(SystemError)` - Enumeration failed outright
    async fn observed_devices(&self) -> Result<ObservedDevices, SystemError>;
}

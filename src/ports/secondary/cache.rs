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

use crate::domain::{CacheDocument, SystemError};
use std::path::Path;

/// Secondary port - Persistence of resolved names between runs
///
/// The cache is an optimization only. Loading never fails: anything that
/// cannot be read or decoded is an empty document, which forces a parse.
pub trait CacheStore: Send + Sync {
    /// Load the cache document
    ///
    /// # Arguments
    /// * `path` - Cache file location
    ///
    /// # Returns
    /// * `CacheDocument` - The stored document, or an empty default
    fn load(&self, path: &Path) -> CacheDocument;

    /// Replace the cache document with `document`
    ///
    /// # Arguments
    /// * `path` - Cache file location
    /// * `document` - Complete document covering both bus types
    ///
    /// # Returns
    /// * `Ok(())` - Document written
    /// * `Err(SystemError)` - Directory or file not writable
    fn save(&self, path: &Path, document: &CacheDocument) -> Result<(), SystemError>;
}

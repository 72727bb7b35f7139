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

use crate::domain::SystemError;
use std::io::BufRead;
use std::path::Path;

/// Secondary port - Access to an ids database
///
/// Abstracts how `pci.ids` / `usb.ids` content is obtained so the resolver can
/// be exercised against in-memory databases or sources that must never be
/// opened.
pub trait IdsSource: Send + Sync {
    /// Open the database at `path` for line-by-line reading
    ///
    /// # Arguments
    /// * `path` - Location of the ids database
    ///
    /// # Returns
    /// * `Ok(Box<dyn BufRead>)` - Buffered reader over the database
    /// * `Err(SystemError)` - Database missing or unreadable
    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>, SystemError>;
}

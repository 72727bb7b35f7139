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

//! Diagnostics sink that keeps everything in memory

use crate::domain::Diagnostic;
use crate::ports::DiagnosticsSink;
use log::debug;
use std::sync::{Mutex, MutexGuard};

/// Collects diagnostics so a caller can display them after a cycle
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the Vec intact, so keep using it.
    fn entries(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of everything reported so far
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries().clone()
    }

    /// Drain everything reported so far
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries())
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl DiagnosticsSink for CollectingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        debug!("Diagnostic recorded: {}", diagnostic);
        self.entries().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_collect_and_take() {
        let sink = CollectingDiagnostics::new();
        assert!(sink.is_empty());

        sink.report(Diagnostic::CacheUnwritable {
            path: PathBuf::from("/root/.cache/hardware_ids/ids_cache.json"),
            reason: "Permission denied".to_string(),
        });

        assert_eq!(sink.snapshot().len(), 1);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }
}

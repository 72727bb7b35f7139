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

//! Filesystem-backed ids database source

use crate::domain::SystemError;
use crate::ports::IdsSource;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// pci.ids is several MB; read it in large chunks
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Opens ids databases straight from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct FileIdsSource;

impl FileIdsSource {
    /// Create a new file ids source
    pub fn new() -> Self {
        Self
    }
}

impl IdsSource for FileIdsSource {
    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>, SystemError> {
        let file = File::open(path).map_err(|e| SystemError::io(path, &e))?;
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_ids_reader, HardwareId, ObservedIdSet};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_and_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "10de  NVIDIA Corporation\n\t1234  GeForce Whatever\n").unwrap();

        let mut target = ObservedIdSet::new();
        target.insert_raw("10de", "1234").unwrap();

        let reader = FileIdsSource::new().open(file.path()).unwrap();
        let catalog = parse_ids_reader(reader, &target).unwrap();

        assert_eq!(
            catalog[&HardwareId::parse("10de").unwrap()][&HardwareId::parse("1234").unwrap()]
                .device_name,
            "GeForce Whatever"
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = FileIdsSource::new().open(Path::new("/nonexistent/hardware_ids/pci.ids"));
        assert!(matches!(result, Err(SystemError::Io { .. })));
    }
}

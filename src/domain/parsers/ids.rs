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

//! Streaming parser for the `pci.ids` / `usb.ids` database format
//!
//! The format is two-level and indentation driven:
//!
//! ```text
//! # comment
//! 10de  NVIDIA Corporation
//! 	1234  GeForce Whatever
//! 		1043 8233  Subsystem lines (ignored)
//! C 03  Display controller
//! ```
//!
//! Only vendor and device lines matter here. [`IdsParser`] keeps the vendor
//! most recently seen and records device lines whose vendor:device pair is
//! part of the requested target set, so a caller can feed it any line source
//! (a buffered file, or an in-memory slice in tests).

use crate::domain::{BusCatalog, HardwareId, ObservedIdSet, ResolvedEntry};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{self, BufRead};

lazy_static! {
    static ref VENDOR_LINE_RE: Regex = Regex::new(r"^([0-9A-Fa-f]{4})  (\S.*)$").unwrap();
    static ref DEVICE_LINE_RE: Regex = Regex::new(r"^[ \t]+([0-9A-Fa-f]{4})  (\S.*)$").unwrap();
}

/// One classified line of an ids database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdsLine<'a> {
    /// `vvvv  Vendor Name` at column 0
    Vendor { id: HardwareId, name: &'a str },
    /// Indented `dddd  Device Name`
    Device { id: HardwareId, name: &'a str },
    /// Any other top-level entry, e.g. a `C 03  Display controller` class
    Section,
    /// Comments, blank lines, subsystem and interface lines
    Ignored,
}

/// Classify a single line (without its line terminator)
pub fn classify_line(line: &str) -> IdsLine<'_> {
    let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');

    if line.is_empty() || line.starts_with('#') {
        return IdsLine::Ignored;
    }

    if line.starts_with(|c: char| c.is_whitespace()) {
        return match DEVICE_LINE_RE.captures(line) {
            Some(caps) => match (HardwareId::parse(&caps[1]), caps.get(2)) {
                (Ok(id), Some(name)) => IdsLine::Device {
                    id,
                    name: name.as_str().trim_end(),
                },
                _ => IdsLine::Ignored,
            },
            None => IdsLine::Ignored,
        };
    }

    match VENDOR_LINE_RE.captures(line) {
        Some(caps) => match (HardwareId::parse(&caps[1]), caps.get(2)) {
            (Ok(id), Some(name)) => IdsLine::Vendor {
                id,
                name: name.as_str().trim_end(),
            },
            _ => IdsLine::Section,
        },
        None => IdsLine::Section,
    }
}

#[derive(Debug, Clone)]
struct CurrentVendor {
    id: HardwareId,
    name: String,
    wanted: bool,
}

/// Vendor/device state machine restricted to a target set of ids
#[derive(Debug)]
pub struct IdsParser<'t> {
    target: &'t ObservedIdSet,
    current_vendor: Option<CurrentVendor>,
    catalog: BusCatalog,
    remaining: usize,
}

impl<'t> IdsParser<'t> {
    pub fn new(target: &'t ObservedIdSet) -> Self {
        Self {
            target,
            current_vendor: None,
            catalog: BusCatalog::new(),
            remaining: target.pair_count(),
        }
    }

    /// Feed one line of the database
    pub fn feed_line(&mut self, line: &str) {
        // Fast path: device lines under a vendor nobody asked for
        if line.starts_with(|c: char| c == '\t' || c == ' ')
            && !self.current_vendor.as_ref().is_some_and(|v| v.wanted)
        {
            return;
        }

        match classify_line(line) {
            IdsLine::Vendor { id, name } => {
                let wanted = self.target.devices(&id).is_some();
                self.current_vendor = Some(CurrentVendor {
                    id,
                    name: name.to_string(),
                    wanted,
                });
            }
            IdsLine::Device { id, name } => self.record_device(id, name),
            IdsLine::Section => self.current_vendor = None,
            IdsLine::Ignored => {}
        }
    }

    fn record_device(&mut self, device: HardwareId, device_name: &str) {
        let Some(vendor) = self.current_vendor.as_ref() else {
            return;
        };
        if !self.target.contains(&vendor.id, &device) {
            return;
        }

        let devices = self.catalog.entry(vendor.id.clone()).or_default();
        if devices.contains_key(&device) {
            return;
        }
        devices.insert(
            device,
            ResolvedEntry {
                vendor_name: vendor.name.clone(),
                device_name: device_name.to_string(),
            },
        );
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// True once every target pair has been found
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn finish(self) -> BusCatalog {
        self.catalog
    }
}

/// Parse an in-memory sequence of lines
pub fn parse_ids_lines<I, S>(lines: I, target: &ObservedIdSet) -> BusCatalog
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = IdsParser::new(target);
    for line in lines {
        if parser.is_complete() {
            break;
        }
        parser.feed_line(line.as_ref());
    }
    parser.finish()
}

/// Parse a buffered reader line by line without loading it whole
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, since
/// older `usb.ids` files carry Latin-1 names.
pub fn parse_ids_reader<R: BufRead>(mut reader: R, target: &ObservedIdSet) -> io::Result<BusCatalog> {
    let mut parser = IdsParser::new(target);
    let mut buf = Vec::with_capacity(256);

    while !parser.is_complete() {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        parser.feed_line(&String::from_utf8_lossy(&buf));
    }

    Ok(parser.finish())
}

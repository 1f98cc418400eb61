//! Maps target virtual addresses to offsets within the ELF file using the section
//! headers.
use crate::elf::{Bytes, Offset, SectionHeader, VirtualAddr};
use tracing::debug;

/// A section with bytes: [vbytes.start, vbytes.end()) lives at file_offset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SectionMapEntry {
    pub vbytes: Bytes<VirtualAddr>,
    pub file_offset: Offset,
}

impl SectionMapEntry {
    pub fn va_start(&self) -> VirtualAddr {
        self.vbytes.start
    }

    /// One past the last address.
    pub fn va_end(&self) -> u64 {
        self.vbytes.end()
    }

    pub fn to_offset(&self, vaddr: VirtualAddr) -> Option<u64> {
        if self.vbytes.contains(vaddr) {
            let delta = (vaddr.0 - self.vbytes.start.0) as u64;
            Some(self.file_offset.0 as u64 + delta)
        } else {
            None
        }
    }
}

/// Entries sorted by start address. Ranges are assumed to not overlap: overlaps are
/// logged but not rejected, and lookups within an overlap return one of the
/// candidates.
#[derive(Clone, Debug, Default)]
pub struct SectionMap {
    entries: Vec<SectionMapEntry>,
}

impl SectionMap {
    /// Zero sized sections are dropped.
    pub fn new(sections: &[SectionHeader]) -> Self {
        let mut entries: Vec<SectionMapEntry> = sections
            .iter()
            .filter(|h| !h.vbytes.is_empty())
            .map(|h| SectionMapEntry {
                vbytes: h.vbytes,
                file_offset: h.obytes.start,
            })
            .collect();
        entries.sort_by_key(|e| e.vbytes.start);

        for pair in entries.windows(2) {
            if pair[0].vbytes.overlaps(&pair[1].vbytes) {
                debug!(
                    "sections at {} and {} overlap",
                    pair[0].vbytes.start, pair[1].vbytes.start
                );
            }
        }
        SectionMap { entries }
    }

    pub fn entries(&self) -> &[SectionMapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binary search for the entry containing vaddr. Not finding one is normal, e.g.
    /// for addresses within a zero sized section.
    pub fn find(&self, vaddr: VirtualAddr) -> Option<&SectionMapEntry> {
        let mut left = 0;
        let mut right = self.entries.len();
        while left < right {
            let mid = left + (right - left) / 2;
            let entry = &self.entries[mid];
            if vaddr < entry.vbytes.start {
                right = mid;
            } else if vaddr.0 as u64 >= entry.vbytes.end() {
                left = mid + 1;
            } else {
                return Some(entry);
            }
        }
        None
    }
}

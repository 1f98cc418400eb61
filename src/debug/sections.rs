//! Finds the DWARF sections a debug info parser needs. The DWARF itself isn't decoded
//! here.
use crate::elf::{Bytes, Offset, Section, SectionType};

pub const DEBUG_ABBREV: &str = ".debug_abbrev";
pub const DEBUG_INFO: &str = ".debug_info";
pub const DEBUG_STR: &str = ".debug_str";

/// File locations of .debug_abbrev, .debug_info, and .debug_str.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DebugSections {
    pub abbrev: Option<Bytes<Offset>>,
    pub info: Option<Bytes<Offset>>,
    pub strings: Option<Bytes<Offset>>,
}

impl DebugSections {
    /// Only PROGBITS sections are considered. If a name appears more than once the
    /// last one wins.
    pub fn new(sections: &[Section]) -> Self {
        let mut result = DebugSections::default();
        for section in sections
            .iter()
            .filter(|s| s.header.stype == SectionType::ProgBits)
        {
            match section.name.as_str() {
                DEBUG_ABBREV => result.abbrev = Some(section.header.obytes),
                DEBUG_INFO => result.info = Some(section.header.obytes),
                DEBUG_STR => result.strings = Some(section.header.obytes),
                _ => (),
            }
        }
        result
    }

    /// All three sections are needed to decode debug info.
    pub fn is_present(&self) -> bool {
        self.abbrev.is_some() && self.info.is_some() && self.strings.is_some()
    }

    pub fn abbrev_offset(&self) -> u32 {
        offset(self.abbrev)
    }

    pub fn abbrev_len(&self) -> u32 {
        len(self.abbrev)
    }

    pub fn info_offset(&self) -> u32 {
        offset(self.info)
    }

    pub fn info_len(&self) -> u32 {
        len(self.info)
    }

    pub fn str_offset(&self) -> u32 {
        offset(self.strings)
    }

    pub fn str_len(&self) -> u32 {
        len(self.strings)
    }
}

fn offset(bytes: Option<Bytes<Offset>>) -> u32 {
    bytes.map_or(0, |b| b.start.0)
}

fn len(bytes: Option<Bytes<Offset>>) -> u32 {
    bytes.map_or(0, |b| b.size)
}

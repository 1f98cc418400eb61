//! Used by the linker and debugger. Also see segments.
use super::{Reader, Stream};
use crate::elf::{Bytes, Offset, VirtualAddr};
use crate::error::Result;
use tracing::debug;

const WRITE_FLAG: u32 = 1 << 0; // Writable
const ALLOC_FLAG: u32 = 1 << 1; // Occupies memory during execution
const EXECINSTR_FLAG: u32 = 1 << 2; // Executable
const MERGE_FLAG: u32 = 1 << 4; // Might be merged
const STRINGS_FLAG: u32 = 1 << 5; // Contains nul-terminated strings
const INFO_LINK_FLAG: u32 = 1 << 6; // `sh_info' contains SHT index
const LINK_ORDER_FLAG: u32 = 1 << 7; // Preserve order after combining
const GROUP_FLAG: u32 = 1 << 9; // Section is member of a group.
const TLS_FLAG: u32 = 1 << 10; // Section hold thread-local data.
const MASKPROC_FLAG: u32 = 0xf0000000; // Processor-specific

/// Describes a section.
#[derive(Clone, Debug)]
pub struct SectionHeader {
    // Elf32_Shdr, see https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
    /// Index into the section name string table. Zero means no name.
    pub name: u32,

    /// Type of the section.
    pub stype: SectionType,

    /// Write, alloc, and/or exec.
    pub flags: u32,

    /// Addressing for the bytes in the section using offsets from the start of the ELF file.
    pub obytes: Bytes<Offset>,

    /// Addressing for the bytes in the section using virtual addresses on the target.
    pub vbytes: Bytes<VirtualAddr>,

    /// Link to another section with related information, usually a string
    /// or symbol table.
    pub link: u32,

    /// Additional section info.
    pub info: u32,

    pub align: u32,

    /// Set if the section holds a table of entries.
    pub entry_size: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionType {
    /// Not to be used.
    Null,

    /// CPU instructions, constant data, and debug info.
    ProgBits,

    /// Symbols for the linker and debugger.
    SymbolTable,

    /// Strings for use by the linker and debugger.
    StringTable,

    /// Relocation entries with addends.
    RelocationsWith,

    SymbolHashTable,

    /// Dynamic linking information.
    Dynamic,

    /// Arbitrary metadata.
    Note,

    /// Uninitialized data.
    NoBits,

    /// Relocation entries without addends.
    RelocationsWithout,

    DynamicSymbolTable,
    InitArray,
    FiniArray,
    PreinitArray,
    Group,

    /// OS, processor, or application specific.
    Other(u32),
}

impl SectionType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x0 => SectionType::Null,
            0x1 => SectionType::ProgBits,
            0x2 => SectionType::SymbolTable,
            0x3 => SectionType::StringTable,
            0x4 => SectionType::RelocationsWith,
            0x5 => SectionType::SymbolHashTable,
            0x6 => SectionType::Dynamic,
            0x7 => SectionType::Note,
            0x8 => SectionType::NoBits,
            0x9 => SectionType::RelocationsWithout,
            0xb => SectionType::DynamicSymbolTable,
            0xe => SectionType::InitArray,
            0xf => SectionType::FiniArray,
            0x10 => SectionType::PreinitArray,
            0x11 => SectionType::Group,
            _ => {
                debug!("section type {value:#x} isn't a standard type");
                SectionType::Other(value)
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SectionType::Null => "unused",
            SectionType::ProgBits => "program data",
            SectionType::SymbolTable => "symbol table",
            SectionType::StringTable => "string table",
            SectionType::RelocationsWith => "relocations with addends",
            SectionType::SymbolHashTable => "symbol hash table",
            SectionType::Dynamic => "dynamic linking info",
            SectionType::Note => "notes",
            SectionType::NoBits => "no data (bss)",
            SectionType::RelocationsWithout => "relocations without addends",
            SectionType::DynamicSymbolTable => "dynamic linker symbol table",
            SectionType::InitArray => "constructors",
            SectionType::FiniArray => "destructors",
            SectionType::PreinitArray => "pre-constructors",
            SectionType::Group => "section group",
            SectionType::Other(_) => "other",
        }
    }
}

impl SectionHeader {
    pub fn new(reader: &Reader, offset: Offset) -> Result<Self> {
        let mut s = Stream::new(reader, offset);
        let name = s.read_word()?;
        let stype = SectionType::from_u32(s.read_word()?);
        let flags = s.read_word()?;
        let vaddr = s.read_word()?;
        let offset = s.read_word()?;
        let size = s.read_word()?;
        let link = s.read_word()?;
        let info = s.read_word()?;
        let align = s.read_word()?;
        let entry_size = s.read_word()?;
        Ok(SectionHeader {
            name,
            stype,
            flags,
            obytes: Bytes::<Offset>::from_raw(offset, size),
            vbytes: Bytes::<VirtualAddr>::from_raw(vaddr, size),
            link,
            info,
            align,
            entry_size,
        })
    }

    pub fn flags(flags: u32) -> String {
        let mut result = Vec::new();
        if flags & WRITE_FLAG != 0 {
            result.push("WRITE");
        }
        if flags & ALLOC_FLAG != 0 {
            result.push("ALLOC");
        }
        if flags & EXECINSTR_FLAG != 0 {
            result.push("EXEC");
        }
        if flags & MERGE_FLAG != 0 {
            result.push("MERGE");
        }
        if flags & STRINGS_FLAG != 0 {
            result.push("STRINGS");
        }
        if flags & INFO_LINK_FLAG != 0 {
            result.push("INFO");
        }
        if flags & LINK_ORDER_FLAG != 0 {
            result.push("LINK");
        }
        if flags & GROUP_FLAG != 0 {
            result.push("GROUP");
        }
        if flags & TLS_FLAG != 0 {
            result.push("TLS");
        }
        if flags & MASKPROC_FLAG != 0 {
            result.push("MASKPROC");
        }
        if result.is_empty() {
            result.push("none");
        }
        result.join(" ")
    }
}

/// A section header along with its resolved name.
#[derive(Clone, Debug)]
pub struct Section {
    pub name: String,
    pub header: SectionHeader,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_names() {
        assert_eq!(SectionHeader::flags(0), "none");
        assert_eq!(SectionHeader::flags(ALLOC_FLAG | EXECINSTR_FLAG), "ALLOC EXEC");
    }

    #[test]
    fn unknown_types_are_kept() {
        assert_eq!(SectionType::from_u32(0x7000_0003), SectionType::Other(0x7000_0003));
        assert_eq!(SectionType::from_u32(1), SectionType::ProgBits);
    }
}

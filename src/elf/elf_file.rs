//! A parsed ELF32 executable. This is the authority for where symbols live: virtual
//! addresses are resolved to file offsets through the section headers.
use super::{
    ElfHeader, ProgramHeader, Reader, SYMBOL_ENTRY_SIZE, Section, SectionHeader, SectionMap,
    SectionType, SymbolTableEntry,
};
use crate::debug::DebugSections;
use crate::elf::{Offset, VirtualAddr};
use crate::error::{CalibError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ElfFile {
    pub path: PathBuf,
    pub header: ElfHeader,
    pub segments: Vec<ProgramHeader>,
    sections: Vec<Section>,
    map: SectionMap,
    symtab: Option<usize>,
    string_tables: Vec<usize>,
    debug: DebugSections,
    reader: Reader,
}

impl ElfFile {
    /// Either the whole file is loaded or an error is returned. The file stays mapped
    /// until the ElfFile is dropped.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| CalibError::FileOpen {
            path: path.clone(),
            source,
        })?;

        // This is unsafe because it has undefined behavior if the underlying file is
        // modified while the memory map is in use.
        let bytes = unsafe { Mmap::map(&file) }.map_err(|source| CalibError::FileOpen {
            path: path.clone(),
            source,
        })?;
        let reader = Reader::new(bytes)?;
        let header = ElfHeader::new(&reader)?;
        if !header.tables_fit(reader.len()) {
            return Err(CalibError::InvalidHeaderOffsets);
        }

        let segments = ElfFile::load_segments(&reader, &header)?;
        let headers = ElfFile::load_sections(&reader, &header)?;
        let sections = ElfFile::name_sections(&reader, &header, headers)?;
        let map = SectionMap::new(
            &sections
                .iter()
                .map(|s| s.header.clone())
                .collect::<Vec<_>>(),
        );
        let symtab = sections
            .iter()
            .position(|s| s.header.stype == SectionType::SymbolTable);
        let string_tables = sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.header.stype == SectionType::StringTable)
            .map(|(i, _)| i)
            .collect();
        let debug_sections = DebugSections::new(&sections);
        debug!(
            "loaded {}: {} sections, {} mapped, debug info {}",
            path.display(),
            sections.len(),
            map.len(),
            if debug_sections.is_present() {
                "present"
            } else {
                "absent"
            }
        );

        Ok(ElfFile {
            path,
            header,
            segments,
            sections,
            map,
            symtab,
            string_tables,
            debug: debug_sections,
            reader,
        })
    }

    /// Returns exactly len bytes starting at vaddr. The bytes come from the ELF file,
    /// so for NOBITS sections they are whatever follows the section's offset.
    pub fn read_bytes(&self, vaddr: VirtualAddr, len: usize) -> Result<&[u8]> {
        let offset = self
            .map
            .find(vaddr)
            .and_then(|entry| entry.to_offset(vaddr))
            .ok_or(CalibError::AddressNotMapped(vaddr.0))?;
        self.reader.slice(offset, len)
    }

    /// Every section header, including the null section, with resolved names.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn find_section_named(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_map(&self) -> &SectionMap {
        &self.map
    }

    /// Indexes of the STRTAB sections.
    pub fn string_tables(&self) -> &[usize] {
        &self.string_tables
    }

    pub fn debug_sections(&self) -> &DebugSections {
        &self.debug
    }

    pub fn is_debug_info_present(&self) -> bool {
        self.debug.is_present()
    }

    pub fn file_len(&self) -> usize {
        self.reader.len()
    }

    /// Entries from the SYMTAB section with names resolved through its linked string
    /// table. Empty for stripped files.
    pub fn find_symbols(&self) -> Vec<SymbolTableEntry> {
        let mut entries = Vec::new();
        let Some(section) = self.symtab.and_then(|i| self.sections.get(i)) else {
            return entries;
        };
        let strings = self.sections.get(section.header.link as usize);

        let stride = section.header.entry_size.max(SYMBOL_ENTRY_SIZE) as u64;
        // A corrupt size can't walk past the end of the file.
        let end = section.header.obytes.end().min(self.reader.len() as u64);
        let mut offset = section.header.obytes.start.0 as u64;
        while offset + SYMBOL_ENTRY_SIZE as u64 <= end {
            match SymbolTableEntry::new(&self.reader, Offset(offset as u32)) {
                Ok(mut entry) => {
                    if let Some(strings) = strings
                        && entry.name_index.0 != 0
                    {
                        let table = strings.header.obytes;
                        let start = table.start.0 as u64 + entry.name_index.0 as u64;
                        match self.reader.read_string(start, table.end()) {
                            Ok(name) => entry.name = name,
                            Err(err) => warn!("bad symbol name at offset {offset:#x}: {err}"),
                        }
                    }
                    entries.push(entry);
                }
                Err(err) => warn!("failed to read symbol at offset {offset:#x}: {err}"),
            }
            offset += stride;
        }
        entries
    }

    /// Returns the data object with the given name.
    pub fn find_symbol(&self, name: &str) -> Option<SymbolTableEntry> {
        self.find_symbols()
            .into_iter()
            .find(|s| s.is_object() && s.name == name)
    }
}

impl ElfFile {
    fn load_segments(reader: &Reader, header: &ElfHeader) -> Result<Vec<ProgramHeader>> {
        let mut offset = header.ph_offset as u64;
        let mut segments = Vec::with_capacity(header.num_ph_entries as usize);
        for _ in 0..header.num_ph_entries {
            segments.push(ProgramHeader::new(reader, Offset(offset as u32))?);
            offset += header.ph_stride();
        }
        Ok(segments)
    }

    fn load_sections(reader: &Reader, header: &ElfHeader) -> Result<Vec<SectionHeader>> {
        let mut offset = header.section_offset as u64;
        let mut sections = Vec::with_capacity(header.num_section_entries as usize);
        for _ in 0..header.num_section_entries {
            sections.push(SectionHeader::new(reader, Offset(offset as u32))?);
            offset += header.section_stride();
        }
        Ok(sections)
    }

    fn name_sections(
        reader: &Reader,
        header: &ElfHeader,
        headers: Vec<SectionHeader>,
    ) -> Result<Vec<Section>> {
        // SHN_UNDEF means there are no section names
        let index = header.string_table_index as usize;
        if index == 0 {
            return Ok(headers
                .into_iter()
                .map(|header| Section {
                    name: String::new(),
                    header,
                })
                .collect());
        }

        let table = headers.get(index).ok_or(CalibError::InvalidStringTable)?;
        if table.obytes.end() > reader.len() as u64 {
            return Err(CalibError::InvalidStringTable);
        }
        let start = table.obytes.start.0 as u64;
        let limit = table.obytes.end();

        let mut sections = Vec::with_capacity(headers.len());
        for header in headers {
            let name = if header.stype == SectionType::Null {
                String::new()
            } else {
                match reader.read_string(start + header.name as u64, limit) {
                    Ok(name) => name,
                    Err(err) => {
                        warn!("bad section name index {}: {err}", header.name);
                        String::new()
                    }
                }
            };
            sections.push(Section { name, header });
        }
        Ok(sections)
    }
}

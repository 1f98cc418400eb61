//! Builds small little endian ELF32 files for tests.
use std::io::Write;
use tempfile::NamedTempFile;

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOBITS: u32 = 8;

const SHF_WRITE_ALLOC: u32 = 0x3;
const PT_LOAD: u32 = 1;

struct TestSection {
    name: String,
    stype: u32,
    flags: u32,
    addr: u32,
    offset: Option<u32>,
    size: u32,
    data: Vec<u8>,
    link: u32,
    entry_size: u32,
}

struct TestSegment {
    vaddr: u32,
    paddr: u32,
    size: u32,
}

#[derive(Default)]
pub struct ElfBuilder {
    machine: u16,
    sections: Vec<TestSection>,
    segments: Vec<TestSegment>,
}

impl ElfBuilder {
    pub fn new() -> Self {
        ElfBuilder {
            machine: 40, // ARM
            ..Default::default()
        }
    }

    /// Data is placed after whatever came before it.
    pub fn section(self, name: &str, stype: u32, addr: u32, data: &[u8]) -> Self {
        self.push(name, stype, addr, None, data.len() as u32, data.to_vec())
    }

    /// Data is placed at the given file offset.
    pub fn section_at(self, name: &str, stype: u32, addr: u32, offset: u32, data: &[u8]) -> Self {
        self.push(name, stype, addr, Some(offset), data.len() as u32, data.to_vec())
    }

    pub fn nobits(self, name: &str, addr: u32, size: u32) -> Self {
        self.push(name, SHT_NOBITS, addr, None, size, Vec::new())
    }

    pub fn segment(mut self, vaddr: u32, paddr: u32, size: u32) -> Self {
        self.segments.push(TestSegment { vaddr, paddr, size });
        self
    }

    /// Adds .strtab and .symtab sections holding global data objects. Symbols are
    /// (name, address, size).
    pub fn symbols(mut self, symbols: &[(&str, u32, u32)]) -> Self {
        let mut strings = vec![0u8];
        let mut entries = vec![0u8; 16];
        for (name, value, size) in symbols {
            let name_index = strings.len() as u32;
            strings.extend_from_slice(name.as_bytes());
            strings.push(0);

            entries.extend_from_slice(&name_index.to_le_bytes());
            entries.extend_from_slice(&value.to_le_bytes());
            entries.extend_from_slice(&size.to_le_bytes());
            entries.push(0x11); // STB_GLOBAL, STT_OBJECT
            entries.push(0);
            entries.extend_from_slice(&1u16.to_le_bytes());
        }

        self = self.section(".strtab", SHT_STRTAB, 0, &strings);
        let strtab_index = self.sections.len() as u32; // the null section is index 0
        let size = entries.len() as u32;
        self = self.push(".symtab", SHT_SYMTAB, 0, None, size, entries);
        if let Some(symtab) = self.sections.last_mut() {
            symtab.link = strtab_index;
            symtab.entry_size = 16;
        }
        self
    }

    fn push(
        mut self,
        name: &str,
        stype: u32,
        addr: u32,
        offset: Option<u32>,
        size: u32,
        data: Vec<u8>,
    ) -> Self {
        let flags = if addr != 0 { SHF_WRITE_ALLOC } else { 0 };
        self.sections.push(TestSection {
            name: name.to_string(),
            stype,
            flags,
            addr,
            offset,
            size,
            data,
            link: 0,
            entry_size: 0,
        });
        self
    }

    /// Layout is header, program headers, section data, .shstrtab, section headers.
    /// The null section is first and .shstrtab is last.
    pub fn build(&self) -> Vec<u8> {
        let num_ph = self.segments.len() as u32;
        let mut bytes = vec![0u8; 52 + 32 * num_ph as usize];

        let mut offsets = Vec::new();
        let mut cursor = bytes.len() as u32;
        for section in self.sections.iter() {
            let offset = section.offset.unwrap_or_else(|| align4(cursor));
            let end = offset as usize + section.data.len();
            if bytes.len() < end {
                bytes.resize(end, 0);
            }
            bytes[offset as usize..end].copy_from_slice(&section.data);
            offsets.push(offset);
            cursor = cursor.max(end as u32);
        }

        let mut names = vec![0u8];
        let mut name_indexes = Vec::new();
        for section in self.sections.iter() {
            name_indexes.push(names.len() as u32);
            names.extend_from_slice(section.name.as_bytes());
            names.push(0);
        }
        let shstrtab_name = names.len() as u32;
        names.extend_from_slice(b".shstrtab\0");

        let shstrtab_offset = align4(cursor);
        bytes.resize(shstrtab_offset as usize, 0);
        bytes.extend_from_slice(&names);

        let shoff = align4(bytes.len() as u32);
        bytes.resize(shoff as usize, 0);
        bytes.extend_from_slice(&[0u8; 40]);
        for (i, section) in self.sections.iter().enumerate() {
            let fields = [
                name_indexes[i],
                section.stype,
                section.flags,
                section.addr,
                offsets[i],
                section.size,
                section.link,
                0,
                4,
                section.entry_size,
            ];
            push_words(&mut bytes, &fields);
        }
        let fields = [
            shstrtab_name,
            SHT_STRTAB,
            0,
            0,
            shstrtab_offset,
            names.len() as u32,
            0,
            0,
            1,
            0,
        ];
        push_words(&mut bytes, &fields);

        let num_sections = self.sections.len() as u16 + 2;
        let mut header = Vec::new();
        header.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1, 0]);
        header.extend_from_slice(&[0u8; 8]);
        header.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        header.extend_from_slice(&self.machine.to_le_bytes());
        push_words(&mut header, &[1, 0, if num_ph > 0 { 52 } else { 0 }, shoff, 0]);
        for half in [52u16, 32, num_ph as u16, 40, num_sections, num_sections - 1] {
            header.extend_from_slice(&half.to_le_bytes());
        }
        bytes[..52].copy_from_slice(&header);

        for (i, segment) in self.segments.iter().enumerate() {
            let fields = [
                PT_LOAD,
                0,
                segment.vaddr,
                segment.paddr,
                segment.size,
                segment.size,
                0x6,
                4,
            ];
            let mut ph = Vec::new();
            push_words(&mut ph, &fields);
            let start = 52 + 32 * i;
            bytes[start..start + 32].copy_from_slice(&ph);
        }
        bytes
    }

    pub fn write(&self) -> NamedTempFile {
        write_temp(&self.build())
    }
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// File offset of the header for section index (the null section is 0).
pub fn section_header_offset(bytes: &[u8], index: usize) -> usize {
    let shoff = u32::from_le_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]);
    shoff as usize + 40 * index
}

pub fn patch_word(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn patch_half(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn push_words(bytes: &mut Vec<u8>, words: &[u32]) {
    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
}

fn align4(value: u32) -> u32 {
    (value + 3) & !3
}

//! The fixed size header at the start of every ELF file.
use super::{ELF_HEADER_SIZE, Reader, Stream};
use crate::elf::Offset;
use crate::error::Result;

/// Size of Elf32_Phdr.
pub const PROGRAM_HEADER_SIZE: u16 = 32;

/// Size of Elf32_Shdr.
pub const SECTION_HEADER_SIZE: u16 = 40;

/// Elf32_Ehdr, see https://refspecs.linuxfoundation.org/elf/gabi4+/ch4.eheader.html
#[derive(Clone, Debug)]
pub struct ElfHeader {
    /// EI_CLASS: 1 for 32-bit, 2 for 64-bit.
    pub class: u8,

    /// EI_DATA: 1 for little endian, 2 for big endian.
    pub encoding: u8,

    pub ident_version: u8,

    /// EI_OSABI
    pub abi: u8,
    pub abi_version: u8,

    /// Relocatable, executable, shared object, core.
    pub etype: u16,

    /// CPU architecture.
    pub machine: u16,

    pub version: u32,
    pub entry: u32,
    pub ph_offset: u32,
    pub section_offset: u32,
    pub flags: u32,
    pub header_size: u16,
    pub ph_entry_size: u16,
    pub num_ph_entries: u16,
    pub section_entry_size: u16,
    pub num_section_entries: u16,

    /// Index of the section holding section names.
    pub string_table_index: u16,
}

impl ElfHeader {
    /// The reader has already checked the magic number and class.
    pub fn new(reader: &Reader) -> Result<Self> {
        let ident = reader.slice(0, 16)?;
        let mut s = Stream::new(reader, Offset(16));
        let header = ElfHeader {
            class: ident[4],
            encoding: ident[5],
            ident_version: ident[6],
            abi: ident[7],
            abi_version: ident[8],
            etype: s.read_half()?,
            machine: s.read_half()?,
            version: s.read_word()?,
            entry: s.read_word()?,
            ph_offset: s.read_word()?,
            section_offset: s.read_word()?,
            flags: s.read_word()?,
            header_size: s.read_half()?,
            ph_entry_size: s.read_half()?,
            num_ph_entries: s.read_half()?,
            section_entry_size: s.read_half()?,
            num_section_entries: s.read_half()?,
            string_table_index: s.read_half()?,
        };
        debug_assert_eq!(s.offset, ELF_HEADER_SIZE as u64);
        Ok(header)
    }

    /// Stride between program headers. Declared sizes smaller than Elf32_Phdr are
    /// treated as Elf32_Phdr so that headers never overlap.
    pub fn ph_stride(&self) -> u64 {
        self.ph_entry_size.max(PROGRAM_HEADER_SIZE) as u64
    }

    pub fn section_stride(&self) -> u64 {
        self.section_entry_size.max(SECTION_HEADER_SIZE) as u64
    }

    /// True if both header tables fit within a file of file_len bytes.
    pub fn tables_fit(&self, file_len: usize) -> bool {
        let file_len = file_len as u64;
        let ph_end = self.ph_offset as u64 + self.num_ph_entries as u64 * self.ph_stride();
        let sh_end =
            self.section_offset as u64 + self.num_section_entries as u64 * self.section_stride();
        ph_end <= file_len && sh_end <= file_len
    }

    pub fn class_name(&self) -> &'static str {
        match self.class {
            1 => "32-bit",
            2 => "64-bit",
            _ => "invalid class",
        }
    }

    pub fn encoding_name(&self) -> &'static str {
        match self.encoding {
            1 => "2's complement, little endian",
            2 => "2's complement, big endian",
            _ => "invalid data encoding",
        }
    }

    pub fn abi_name(&self) -> String {
        let name = match self.abi {
            0 => "UNIX System V",
            1 => "HP-UX",
            2 => "NetBSD",
            3 => "GNU",
            6 => "Sun Solaris",
            7 => "IBM AIX",
            8 => "SGI Irix",
            9 => "FreeBSD",
            10 => "Compaq TRU64 UNIX",
            11 => "Novell Modesto",
            12 => "OpenBSD",
            64 => "ARM EABI",
            97 => "ARM",
            255 => "standalone (embedded) application",
            _ => return format!("unknown ({:#x})", self.abi),
        };
        name.to_string()
    }

    pub fn type_name(&self) -> String {
        let name = match self.etype {
            0 => "none",
            1 => "relocatable",
            2 => "executable",
            3 => "shared object",
            4 => "core",
            0xfe00..=0xfeff => "OS-specific",
            0xff00..=0xffff => "processor-specific",
            _ => return format!("unknown ({:#x})", self.etype),
        };
        name.to_string()
    }

    /// Covers the architectures firmware is usually built for.
    pub fn machine_name(&self) -> String {
        let name = match self.machine {
            0 => "no machine",
            2 => "SPARC",
            3 => "Intel 80386",
            4 => "Motorola m68k",
            8 => "MIPS",
            20 => "PowerPC",
            21 => "PowerPC 64-bit",
            36 => "NEC V800",
            40 => "ARM",
            42 => "Hitachi SH",
            44 => "Infineon TriCore",
            46 => "Hitachi H8/300",
            48 => "Hitachi H8S",
            52 => "Motorola ColdFire",
            53 => "Motorola M68HC12",
            55 => "Siemens PCP",
            62 => "AMD x86-64",
            68 => "STMicroelectronics ST7",
            69 => "Motorola MC68HC16",
            70 => "Motorola MC68HC11",
            71 => "Motorola MC68HC08",
            72 => "Motorola MC68HC05",
            83 => "Atmel AVR",
            87 => "NEC v850",
            88 => "Mitsubishi M32R",
            94 => "Tensilica Xtensa",
            113 => "Altera Nios II",
            183 => "ARM AArch64",
            189 => "Xilinx MicroBlaze",
            243 => "RISC-V",
            _ => return format!("unknown ({:#x})", self.machine),
        };
        name.to_string()
    }
}

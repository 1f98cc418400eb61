//! Used by loaders and flashers. Also see sections.
use super::{Reader, Stream};
use crate::elf::{Bytes, Offset, VirtualAddr};
use crate::error::Result;

const EXECUTE_FLAG: u32 = 0x1;
const WRITE_FLAG: u32 = 0x2;
const READ_FLAG: u32 = 0x4;

/// Describes a segment, Elf32_Phdr.
#[derive(Clone, Debug)]
pub struct ProgramHeader {
    pub stype: SegmentType,

    /// Where the segment's bytes are within the ELF file.
    pub obytes: Bytes<Offset>,

    /// Virtual address of the first byte in the segment.
    pub vaddr: VirtualAddr,

    /// Physical (load) address of the first byte in the segment. For firmware this is
    /// usually where the bytes live in flash.
    pub paddr: u32,

    /// Number of bytes in the segment in memory.
    pub mem_size: u32,

    /// Read/Write/Execute flags.
    pub flags: u32,

    pub align: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SegmentType {
    /// Not to be used: either it's a segment that is intended to be not used or one
    /// that is not recognized.
    Null,

    /// A loadable segment, described by p_filesz and p_memsz.
    Load,

    /// Specifies dynamic linking information.
    Dynamic,

    /// Location and size of a null-terminated path name to invoke as an interpreter.
    Interpreter,

    /// The location and size of auxiliary information.
    Note,

    /// The location and size of the program header table itself.
    Phdr,

    // The Thread-Local Storage template.
    Tls,

    /// OS or processor specific, e.g. ARM exception index tables.
    Other(u32),
}

impl SegmentType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => SegmentType::Null,
            1 => SegmentType::Load,
            2 => SegmentType::Dynamic,
            3 => SegmentType::Interpreter,
            4 => SegmentType::Note,
            6 => SegmentType::Phdr,
            7 => SegmentType::Tls,
            _ => SegmentType::Other(value),
        }
    }
}

impl ProgramHeader {
    pub fn new(reader: &Reader, offset: Offset) -> Result<Self> {
        let mut s = Stream::new(reader, offset);
        let p_type = SegmentType::from_u32(s.read_word()?);
        let p_offset = s.read_word()?;
        let p_vaddr = s.read_word()?;
        let p_paddr = s.read_word()?;
        let p_filesz = s.read_word()?;
        let p_memsz = s.read_word()?;
        let p_flags = s.read_word()?;
        let p_align = s.read_word()?;
        Ok(ProgramHeader {
            stype: p_type,
            obytes: Bytes::<Offset>::from_raw(p_offset, p_filesz),
            vaddr: VirtualAddr(p_vaddr),
            paddr: p_paddr,
            mem_size: p_memsz,
            flags: p_flags,
            align: p_align,
        })
    }

    pub fn flags(flags: u32) -> String {
        let mut result = String::new();
        result.push(if flags & READ_FLAG != 0 { 'r' } else { '-' });
        result.push(if flags & WRITE_FLAG != 0 { 'w' } else { '-' });
        result.push(if flags & EXECUTE_FLAG != 0 { 'x' } else { '-' });
        result
    }
}

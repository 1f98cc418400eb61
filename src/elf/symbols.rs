use crate::elf::{Offset, Reader, SectionIndex, Stream, StringIndex, VirtualAddr};
use crate::error::Result;

/// Size of Elf32_Sym.
pub const SYMBOL_ENTRY_SIZE: u32 = 16;

#[derive(Clone, Debug)]
pub struct SymbolTableEntry {
    // see https://refspecs.linuxbase.org/elf/gabi4+/ch4.symtab.html
    /// Index into the symbol string table.
    pub name_index: StringIndex,

    /// Resolved through the string table linked to the symbol table.
    pub name: String,

    /// For data objects this is the address of the object.
    pub value: VirtualAddr,

    /// Size of the symbol. Zero if the symbol has no or unknown size.
    pub size: u32,

    pub stype: SymbolType,

    pub binding: SymbolBinding,

    pub index: SymbolIndex,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolIndex {
    /// Symbol has an absolute value that will not change with relocation.
    Abs,

    /// A common block that has not yet been allocated. Value has alignment.
    Common,

    /// Symbol value refers to another section at this index.
    Index(SectionIndex),

    /// Value is undefined. Linker will fix these up.
    Undef,

    /// Used when Index overflows.
    XIndex,
}

/// Linkage visibility and behavior
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolBinding {
    /// Not visible outside the object file containing its definition.
    Local,

    /// Visible to all object files.
    Global,

    /// Similar to Global but has lower precedence.
    Weak,

    /// For use by OS or CPU.
    Reserved,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolType {
    None,

    /// A data object, variable, array, etc.
    Object,

    /// Function or other executable code.
    Func,

    Section,

    /// Source file associated with the symbol table.
    File,

    Common,
    Tls,
    Reserved,
}

impl SymbolTableEntry {
    /// Reads the fixed part of an entry. The name is filled in by the caller.
    pub fn new(reader: &Reader, offset: Offset) -> Result<Self> {
        let mut s = Stream::new(reader, offset);
        let name = s.read_word()?;
        let value = s.read_word()?;
        let size = s.read_word()?;
        let info = s.read_byte()?;
        let _other = s.read_byte()?;
        let index = s.read_half()?;
        Ok(SymbolTableEntry {
            name_index: StringIndex(name),
            name: String::new(),
            value: VirtualAddr(value),
            size,
            stype: SymbolType::from_u8(info),
            binding: SymbolBinding::from_u8(info),
            index: SymbolIndex::from_u16(index),
        })
    }

    /// True for variables, which are what calibration cares about.
    pub fn is_object(&self) -> bool {
        self.stype == SymbolType::Object
            && matches!(self.binding, SymbolBinding::Local | SymbolBinding::Global)
    }
}

impl SymbolIndex {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => SymbolIndex::Undef,
            0xfff1 => SymbolIndex::Abs,
            0xfff2 => SymbolIndex::Common,
            0xffff => SymbolIndex::XIndex,
            _ => SymbolIndex::Index(SectionIndex(value as u32)),
        }
    }
}

impl SymbolBinding {
    pub fn from_u8(value: u8) -> Self {
        match value >> 4 {
            0 => SymbolBinding::Local,
            1 => SymbolBinding::Global,
            2 => SymbolBinding::Weak,
            _ => SymbolBinding::Reserved,
        }
    }
}

impl SymbolType {
    pub fn from_u8(value: u8) -> Self {
        match value & 0xf {
            0 => SymbolType::None,
            1 => SymbolType::Object,
            2 => SymbolType::Func,
            3 => SymbolType::Section,
            4 => SymbolType::File,
            5 => SymbolType::Common,
            6 => SymbolType::Tls,
            _ => SymbolType::Reserved,
        }
    }
}

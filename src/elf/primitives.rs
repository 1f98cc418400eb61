use std::fmt;

/// Index into the section table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SectionIndex(pub u32);

/// Index into a string table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct StringIndex(pub u32);

/// An index into a byte within an ELF file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Offset(pub u32);

/// The address of a byte as the firmware sees it at run time. Symbols from the debug
/// info are keyed by these.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddr(pub u32);

/// Something that can be used as the start of a `Bytes` range.
pub trait Address: Copy + Ord {
    fn raw(self) -> u64;
}

impl Address for Offset {
    fn raw(self) -> u64 {
        self.0 as u64
    }
}

impl Address for VirtualAddr {
    fn raw(self) -> u64 {
        self.0 as u64
    }
}

/// A range of bytes that can be addressed using either offsets into an ELF file or
/// virtual addresses. Ends are computed in 64 bits so a range touching the top of the
/// 32-bit address space doesn't wrap.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Bytes<A: Address> {
    pub start: A,
    pub size: u32,
}

impl Bytes<Offset> {
    pub fn from_raw(start: u32, size: u32) -> Self {
        Bytes {
            start: Offset(start),
            size,
        }
    }
}

impl Bytes<VirtualAddr> {
    pub fn from_raw(start: u32, size: u32) -> Self {
        Bytes {
            start: VirtualAddr(start),
            size,
        }
    }
}

impl<A: Address> Bytes<A> {
    pub fn contains(&self, addr: A) -> bool {
        addr >= self.start && addr.raw() < self.end()
    }

    /// One past the last byte.
    pub fn end(&self) -> u64 {
        self.start.raw() + self.size as u64
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn overlaps(&self, other: &Bytes<A>) -> bool {
        self.start.raw() < other.end() && other.start.raw() < self.end()
    }
}

impl fmt::Display for VirtualAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

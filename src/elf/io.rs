use crate::elf::Offset;
use crate::error::{CalibError, Result};
use memmap2::Mmap;

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
pub const ELF_CLASS_32: u8 = 1;
pub const ELF_DATA_LSB: u8 = 1;

/// Size of Elf32_Ehdr.
pub const ELF_HEADER_SIZE: usize = 52;

/// Read-only view of a memory mapped ELF file. The mapping is released when the
/// reader is dropped.
pub struct Reader {
    pub little_endian: bool,
    bytes: Mmap,
}

impl Reader {
    pub fn new(bytes: Mmap) -> Result<Self> {
        // see https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
        if bytes.len() < ELF_HEADER_SIZE {
            return Err(CalibError::TruncatedHeader { size: bytes.len() });
        }
        if bytes[0..4] != ELF_MAGIC {
            return Err(CalibError::NotElf);
        }
        let ei_class = bytes[0x04];
        if ei_class != ELF_CLASS_32 {
            return Err(CalibError::UnsupportedClass(ei_class));
        }
        let ei_data = bytes[0x05];

        Ok(Reader {
            bytes,
            little_endian: ei_data == ELF_DATA_LSB,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns exactly size bytes or an error: ReadBounds if offset is outside the
    /// file, ShortRead if the file ends before size bytes.
    pub fn slice(&self, offset: u64, size: usize) -> Result<&[u8]> {
        let len = self.bytes.len() as u64;
        if offset > len || (offset == len && size > 0) {
            return Err(CalibError::ReadBounds { offset, len: size });
        }
        let start = offset as usize;
        let available = self.bytes.len() - start;
        if size > available {
            return Err(CalibError::ShortRead {
                offset,
                wanted: size,
                available,
            });
        }
        Ok(&self.bytes[start..start + size])
    }

    pub fn read_byte(&self, offset: u64) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_half(&self, offset: u64) -> Result<u16> {
        let slice = self.slice(offset, 2)?;
        let raw = [slice[0], slice[1]];
        if self.little_endian {
            Ok(u16::from_le_bytes(raw))
        } else {
            Ok(u16::from_be_bytes(raw))
        }
    }

    pub fn read_word(&self, offset: u64) -> Result<u32> {
        let slice = self.slice(offset, 4)?;
        let raw = [slice[0], slice[1], slice[2], slice[3]];
        if self.little_endian {
            Ok(u32::from_le_bytes(raw))
        } else {
            Ok(u32::from_be_bytes(raw))
        }
    }

    /// Reads a null-terminated string that must end before limit.
    pub fn read_string(&self, offset: u64, limit: u64) -> Result<String> {
        let mut s = Stream {
            reader: self,
            offset,
        };
        let mut bytes = Vec::new();
        loop {
            if s.offset >= limit {
                return Err(CalibError::ReadBounds {
                    offset: s.offset,
                    len: 1,
                });
            }
            let byte = s.read_byte()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Sequential reads from a Reader.
pub struct Stream<'a> {
    pub reader: &'a Reader,
    pub offset: u64,
}

impl<'a> Stream<'a> {
    pub fn new(reader: &'a Reader, offset: Offset) -> Self {
        Stream {
            reader,
            offset: offset.0 as u64,
        }
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self.reader.read_byte(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_half(&mut self) -> Result<u16> {
        let half = self.reader.read_half(self.offset)?;
        self.offset += 2;
        Ok(half)
    }

    pub fn read_word(&mut self) -> Result<u32> {
        let word = self.reader.read_word(self.offset)?;
        self.offset += 4;
        Ok(word)
    }
}

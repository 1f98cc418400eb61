//! Memory images hold the bytes that get flashed onto the target. Calibration values
//! are read from and written to these, while the ELF says where the values live.
use crate::calib::codec::{ScalarType, Value, decode};
use crate::calib::ihex::{self, StartAddress};
use crate::error::{CalibError, Result};
use rangemap::RangeInclusiveMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

/// A byte addressable store keyed by absolute target address.
pub trait MemoryImage {
    /// Fills buf with the bytes starting at addr. Fails if any of them are missing.
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Overwrites existing bytes. Nothing is written if any address is missing.
    fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<()>;

    fn save(&self, path: &Path) -> Result<()>;

    fn read_value(&self, addr: u32, ty: ScalarType) -> Result<Value> {
        let mut buf = vec![0u8; ty.width()];
        self.read(addr, &mut buf)?;
        decode(&buf, ty)
    }

    fn write_value(&mut self, addr: u32, value: &Value) -> Result<()> {
        self.write(addr, &value.encode())
    }
}

#[derive(Clone, Debug)]
struct Segment {
    start: u32,
    data: Vec<u8>,
}

impl Segment {
    fn end(&self) -> u64 {
        self.start as u64 + self.data.len() as u64
    }

    fn range(&self) -> RangeInclusive<u32> {
        self.start..=(self.end() - 1) as u32
    }
}

/// A sparse image loaded from Intel HEX. Contiguous bytes are merged into segments and
/// an interval map finds the segment for an address.
#[derive(Clone, Debug, Default)]
pub struct HexImage {
    segments: Vec<Segment>,
    index: RangeInclusiveMap<u32, usize>,
    start: Option<StartAddress>,
}

impl HexImage {
    pub fn new() -> Self {
        HexImage::default()
    }

    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| CalibError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        HexImage::from_ihex(&text)
    }

    pub fn from_ihex(text: &str) -> Result<Self> {
        let hex = ihex::parse(text)?;
        let mut image = HexImage {
            start: hex.start,
            ..Default::default()
        };
        image.load_chunks(&hex.chunks)?;
        Ok(image)
    }

    pub fn to_ihex(&self) -> String {
        let chunks = self.segments.iter().map(|s| (s.start, s.data.as_slice()));
        ihex::write(chunks, self.start)
    }

    /// Adds bytes, replacing any that are already present. Unlike `write` this can
    /// create new addresses.
    pub fn insert(&mut self, addr: u32, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let start = addr as u64;
        let end = start + bytes.len() as u64;
        if end > 1 << 32 {
            return Err(CalibError::UnmappedImageAddress(addr));
        }

        // Segments that overlap or touch the new bytes are folded into one.
        let (touching, mut kept): (Vec<Segment>, Vec<Segment>) = self
            .segments
            .drain(..)
            .partition(|s| s.start as u64 <= end && start <= s.end());
        let merged_start = touching.iter().map(|s| s.start as u64).fold(start, u64::min);
        let merged_end = touching.iter().map(|s| s.end()).fold(end, u64::max);

        let mut data = vec![0u8; (merged_end - merged_start) as usize];
        for segment in touching.iter() {
            let offset = (segment.start as u64 - merged_start) as usize;
            data[offset..offset + segment.data.len()].copy_from_slice(&segment.data);
        }
        let offset = (start - merged_start) as usize;
        data[offset..offset + bytes.len()].copy_from_slice(bytes);

        kept.push(Segment {
            start: merged_start as u32,
            data,
        });
        kept.sort_by_key(|s| s.start);
        self.segments = kept;
        self.rebuild_index();
        Ok(())
    }

    /// Address ranges holding data, in ascending order.
    pub fn ranges(&self) -> impl Iterator<Item = RangeInclusive<u32>> + '_ {
        self.segments.iter().map(|s| s.range())
    }

    /// Number of bytes in the image.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.data.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Replaces the contents with chunks of (address, bytes). Chunks that overlap or
    /// touch become one segment and where they overlap the later chunk wins.
    fn load_chunks(&mut self, chunks: &[(u32, Vec<u8>)]) -> Result<()> {
        let mut extents = Vec::with_capacity(chunks.len());
        for (addr, bytes) in chunks.iter().filter(|(_, b)| !b.is_empty()) {
            let start = *addr as u64;
            let end = start + bytes.len() as u64;
            if end > 1 << 32 {
                return Err(CalibError::UnmappedImageAddress(*addr));
            }
            extents.push((start, end));
        }
        extents.sort_unstable();

        let mut merged: Vec<(u64, u64)> = Vec::new();
        for (start, end) in extents {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        self.segments = merged
            .iter()
            .map(|&(start, end)| Segment {
                start: start as u32,
                data: vec![0u8; (end - start) as usize],
            })
            .collect();

        // Copied in file order so later records overwrite earlier ones.
        for (addr, bytes) in chunks.iter().filter(|(_, b)| !b.is_empty()) {
            let i = self.segments.partition_point(|s| s.start <= *addr);
            if let Some(segment) = i.checked_sub(1).and_then(|i| self.segments.get_mut(i)) {
                let offset = (*addr - segment.start) as usize;
                segment.data[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
        }
        self.rebuild_index();
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, s)| (s.range(), i))
            .collect();
    }

    /// Splits [addr, addr + len) into (segment index, offset within segment, byte count)
    /// pieces. Fails if any byte is missing.
    fn locate(&self, addr: u32, len: usize) -> Result<Vec<(usize, usize, usize)>> {
        let mut pieces = Vec::new();
        let mut current = addr as u64;
        let end = addr as u64 + len as u64;
        while current < end {
            let missing = CalibError::UnmappedImageAddress(current as u32);
            if current > u32::MAX as u64 {
                return Err(missing);
            }
            let (_, &i) = self
                .index
                .get_key_value(&(current as u32))
                .ok_or(missing)?;
            let segment = &self.segments[i];
            let offset = (current - segment.start as u64) as usize;
            let count = (segment.data.len() - offset).min((end - current) as usize);
            pieces.push((i, offset, count));
            current += count as u64;
        }
        Ok(pieces)
    }
}

impl MemoryImage for HexImage {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let mut done = 0;
        for (i, offset, count) in self.locate(addr, buf.len())? {
            buf[done..done + count].copy_from_slice(&self.segments[i].data[offset..offset + count]);
            done += count;
        }
        Ok(())
    }

    fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<()> {
        let mut done = 0;
        for (i, offset, count) in self.locate(addr, bytes.len())? {
            self.segments[i].data[offset..offset + count].copy_from_slice(&bytes[done..done + count]);
            done += count;
        }
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_ihex())?;
        Ok(())
    }
}

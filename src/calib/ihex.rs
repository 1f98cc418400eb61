//! Intel HEX, the usual format for flashable calibration images. Each line is a record:
//! `:` count(1) address(2) type(1) data(count) checksum(1), all as hex digits.
//! See https://en.wikipedia.org/wiki/Intel_HEX
use crate::error::{CalibError, Result};
use std::fmt::Write;

const DATA: u8 = 0x00;
const END_OF_FILE: u8 = 0x01;
const EXTENDED_SEGMENT_ADDRESS: u8 = 0x02;
const START_SEGMENT_ADDRESS: u8 = 0x03;
const EXTENDED_LINEAR_ADDRESS: u8 = 0x04;
const START_LINEAR_ADDRESS: u8 = 0x05;

/// Data bytes per record when writing.
const RECORD_LEN: usize = 16;

/// Where execution starts. Not used for calibration but kept so that saving an image
/// doesn't lose it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartAddress {
    /// CS:IP
    Segment(u16, u16),
    Linear(u32),
}

#[derive(Clone, Debug, Default)]
pub struct HexData {
    /// Absolute address and the bytes from one data record.
    pub chunks: Vec<(u32, Vec<u8>)>,
    pub start: Option<StartAddress>,
}

pub fn parse(text: &str) -> Result<HexData> {
    let mut result = HexData::default();
    let mut base = 0u32;
    for (i, line) in text.lines().enumerate() {
        let line_num = i + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let bad = |reason: &str| CalibError::ImageFormat {
            line: line_num,
            reason: reason.to_string(),
        };

        let digits = line.strip_prefix(':').ok_or_else(|| bad("missing ':'"))?;
        let bytes = decode_hex(digits).ok_or_else(|| bad("invalid hex digits"))?;
        if bytes.len() < 5 || bytes.len() != bytes[0] as usize + 5 {
            return Err(bad("record length doesn't match its byte count"));
        }
        if bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b)) != 0 {
            return Err(bad("bad checksum"));
        }

        let address = u16::from_be_bytes([bytes[1], bytes[2]]);
        let data = &bytes[4..bytes.len() - 1];
        match bytes[3] {
            DATA => {
                let start = base.wrapping_add(address as u32);
                result.chunks.push((start, data.to_vec()));
            }
            END_OF_FILE => return Ok(result),
            EXTENDED_SEGMENT_ADDRESS => {
                let value = half(data).ok_or_else(|| bad("segment record needs 2 bytes"))?;
                base = (value as u32) << 4;
            }
            EXTENDED_LINEAR_ADDRESS => {
                let value = half(data).ok_or_else(|| bad("linear record needs 2 bytes"))?;
                base = (value as u32) << 16;
            }
            START_SEGMENT_ADDRESS => {
                if data.len() != 4 {
                    return Err(bad("start segment record needs 4 bytes"));
                }
                let cs = u16::from_be_bytes([data[0], data[1]]);
                let ip = u16::from_be_bytes([data[2], data[3]]);
                result.start = Some(StartAddress::Segment(cs, ip));
            }
            START_LINEAR_ADDRESS => {
                if data.len() != 4 {
                    return Err(bad("start linear record needs 4 bytes"));
                }
                let eip = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                result.start = Some(StartAddress::Linear(eip));
            }
            other => return Err(bad(&format!("unknown record type {other:02X}"))),
        }
    }
    Err(CalibError::ImageFormat {
        line: text.lines().count(),
        reason: "missing end of file record".to_string(),
    })
}

/// Chunks must be sorted by address. Data records never cross a 64K boundary so only
/// extended linear address records are needed.
pub fn write<'a>(
    chunks: impl IntoIterator<Item = (u32, &'a [u8])>,
    start: Option<StartAddress>,
) -> String {
    let mut out = String::new();
    let mut upper: Option<u16> = None;
    for (chunk_start, bytes) in chunks {
        let mut addr = chunk_start as u64;
        let mut rest = bytes;
        while !rest.is_empty() {
            let hi = (addr >> 16) as u16;
            if upper != Some(hi) {
                record(&mut out, EXTENDED_LINEAR_ADDRESS, 0, &hi.to_be_bytes());
                upper = Some(hi);
            }
            let lo = (addr & 0xffff) as u16;
            let room = 0x1_0000 - lo as usize;
            let n = rest.len().min(RECORD_LEN).min(room);
            record(&mut out, DATA, lo, &rest[..n]);
            rest = &rest[n..];
            addr += n as u64;
        }
    }
    match start {
        Some(StartAddress::Segment(cs, ip)) => {
            let mut data = cs.to_be_bytes().to_vec();
            data.extend_from_slice(&ip.to_be_bytes());
            record(&mut out, START_SEGMENT_ADDRESS, 0, &data);
        }
        Some(StartAddress::Linear(eip)) => {
            record(&mut out, START_LINEAR_ADDRESS, 0, &eip.to_be_bytes());
        }
        None => (),
    }
    record(&mut out, END_OF_FILE, 0, &[]);
    out
}

fn record(out: &mut String, kind: u8, address: u16, data: &[u8]) {
    let mut bytes = vec![data.len() as u8];
    bytes.extend_from_slice(&address.to_be_bytes());
    bytes.push(kind);
    bytes.extend_from_slice(data);
    let sum = bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
    bytes.push(sum.wrapping_neg());

    out.push(':');
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
    out.push('\n');
}

fn half(data: &[u8]) -> Option<u16> {
    match data {
        [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

fn decode_hex(digits: &str) -> Option<Vec<u8>> {
    if digits.len() % 2 != 0 || !digits.is_ascii() {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_and_extended_addresses() {
        let text = "\
:0400100001020304E2
:020000040800F2
:02000000AABB99
:020000021000EC
:0100040055A6
:0400000508000131BD
:00000001FF
";
        let hex = parse(text).unwrap();
        assert_eq!(
            hex.chunks,
            vec![
                (0x0010, vec![1, 2, 3, 4]),
                (0x0800_0000, vec![0xaa, 0xbb]),
                (0x0001_0004, vec![0x55]),
            ]
        );
        assert_eq!(hex.start, Some(StartAddress::Linear(0x0800_0131)));
    }

    #[test]
    fn errors() {
        let line = |text: &str| match parse(text) {
            Err(CalibError::ImageFormat { line, .. }) => line,
            other => panic!("expected a format error, got {other:?}"),
        };
        assert_eq!(line(":0400100001020304E3\n:00000001FF\n"), 1); // checksum
        assert_eq!(line("\n0400100001020304E2\n"), 2); // no colon
        assert_eq!(line(":0500100001020304E2\n"), 1); // count
        assert_eq!(line(":0400100001020304E2\n"), 1); // no end of file
        assert_eq!(line(":00000007F9\n"), 1); // unknown type
    }

    #[test]
    fn writes_records() {
        let bytes: Vec<u8> = (0..20).collect();
        let text = write([(0x0800_fff8u32, &bytes[..])], None);
        let lines: Vec<&str> = text.lines().collect();
        insta::assert_snapshot!(lines.join("\n"), @r"
        :020000040800F2
        :08FFF8000001020304050607E5
        :020000040801F1
        :0C00000008090A0B0C0D0E0F1011121352
        :00000001FF
        ");

        let hex = parse(&text).unwrap();
        let joined: Vec<u8> = hex.chunks.iter().flat_map(|(_, d)| d.clone()).collect();
        assert_eq!(hex.chunks[0].0, 0x0800_fff8);
        assert_eq!(hex.chunks[1].0, 0x0801_0000);
        assert_eq!(joined, bytes);
    }
}

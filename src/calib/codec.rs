//! Converts between the bytes of a calibration variable and its value. Everything is
//! little endian.
use crate::debug::DataType;
use crate::error::{CalibError, Result};
use std::fmt;

/// The types that can be read or written as a single value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarType {
    Bool,
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    F32,
    F64,

    /// One byte ordinal.
    Enum,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    S8(i8),
    U16(u16),
    S16(i16),
    U32(u32),
    S32(i32),
    F32(f32),
    F64(f64),
    Enum(u8),
}

impl ScalarType {
    /// Structs and unknown types have no codec.
    pub fn from_data_type(dtype: DataType) -> Option<Self> {
        match dtype {
            DataType::Boolean => Some(ScalarType::Bool),
            DataType::U8 => Some(ScalarType::U8),
            DataType::S8 => Some(ScalarType::S8),
            DataType::U16 => Some(ScalarType::U16),
            DataType::S16 => Some(ScalarType::S16),
            DataType::U32 => Some(ScalarType::U32),
            DataType::S32 => Some(ScalarType::S32),
            DataType::Float32 => Some(ScalarType::F32),
            DataType::Float64 => Some(ScalarType::F64),
            DataType::Enum => Some(ScalarType::Enum),
            DataType::Struct | DataType::Unknown => None,
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            ScalarType::Bool => DataType::Boolean,
            ScalarType::U8 => DataType::U8,
            ScalarType::S8 => DataType::S8,
            ScalarType::U16 => DataType::U16,
            ScalarType::S16 => DataType::S16,
            ScalarType::U32 => DataType::U32,
            ScalarType::S32 => DataType::S32,
            ScalarType::F32 => DataType::Float32,
            ScalarType::F64 => DataType::Float64,
            ScalarType::Enum => DataType::Enum,
        }
    }

    /// Number of bytes the value occupies.
    pub fn width(self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::U8 | ScalarType::S8 | ScalarType::Enum => 1,
            ScalarType::U16 | ScalarType::S16 => 2,
            ScalarType::U32 | ScalarType::S32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }
}

/// bytes must be exactly ty.width() long.
pub fn decode(bytes: &[u8], ty: ScalarType) -> Result<Value> {
    if bytes.len() != ty.width() {
        return Err(CalibError::WidthMismatch {
            expected: ty.width(),
            actual: bytes.len(),
        });
    }
    let value = match ty {
        ScalarType::Bool => Value::Bool(bytes[0] != 0),
        ScalarType::U8 => Value::U8(bytes[0]),
        ScalarType::S8 => Value::S8(bytes[0] as i8),
        ScalarType::U16 => Value::U16(u16::from_le_bytes([bytes[0], bytes[1]])),
        ScalarType::S16 => Value::S16(i16::from_le_bytes([bytes[0], bytes[1]])),
        ScalarType::U32 => Value::U32(u32::from_le_bytes(word(bytes))),
        ScalarType::S32 => Value::S32(i32::from_le_bytes(word(bytes))),
        ScalarType::F32 => Value::F32(f32::from_bits(u32::from_le_bytes(word(bytes)))),
        ScalarType::F64 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Value::F64(f64::from_bits(u64::from_le_bytes(raw)))
        }
        ScalarType::Enum => Value::Enum(bytes[0]),
    };
    Ok(value)
}

fn word(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

impl Value {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Value::Bool(_) => ScalarType::Bool,
            Value::U8(_) => ScalarType::U8,
            Value::S8(_) => ScalarType::S8,
            Value::U16(_) => ScalarType::U16,
            Value::S16(_) => ScalarType::S16,
            Value::U32(_) => ScalarType::U32,
            Value::S32(_) => ScalarType::S32,
            Value::F32(_) => ScalarType::F32,
            Value::F64(_) => ScalarType::F64,
            Value::Enum(_) => ScalarType::Enum,
        }
    }

    /// Always returns scalar_type().width() bytes.
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Value::Bool(b) => vec![b as u8],
            Value::U8(v) => vec![v],
            Value::S8(v) => v.to_le_bytes().to_vec(),
            Value::U16(v) => v.to_le_bytes().to_vec(),
            Value::S16(v) => v.to_le_bytes().to_vec(),
            Value::U32(v) => v.to_le_bytes().to_vec(),
            Value::S32(v) => v.to_le_bytes().to_vec(),
            Value::F32(v) => v.to_bits().to_le_bytes().to_vec(),
            Value::F64(v) => v.to_bits().to_le_bytes().to_vec(),
            Value::Enum(v) => vec![v],
        }
    }

    /// Parses user input. Integers may be decimal or 0x prefixed hex and must fit the
    /// type. Enums may be given as a label or an ordinal.
    pub fn parse(text: &str, ty: ScalarType, labels: &[String]) -> Result<Value> {
        let text = text.trim();
        let invalid = || CalibError::InvalidValue {
            text: text.to_string(),
            expected: ty.to_string(),
        };
        let value = match ty {
            ScalarType::Bool => match text.to_ascii_lowercase().as_str() {
                "0" | "false" => Value::Bool(false),
                "1" | "true" => Value::Bool(true),
                _ => return Err(invalid()),
            },
            ScalarType::U8 => Value::U8(parse_int(text).ok_or_else(invalid)?),
            ScalarType::S8 => Value::S8(parse_int(text).ok_or_else(invalid)?),
            ScalarType::U16 => Value::U16(parse_int(text).ok_or_else(invalid)?),
            ScalarType::S16 => Value::S16(parse_int(text).ok_or_else(invalid)?),
            ScalarType::U32 => Value::U32(parse_int(text).ok_or_else(invalid)?),
            ScalarType::S32 => Value::S32(parse_int(text).ok_or_else(invalid)?),
            ScalarType::F32 => Value::F32(text.parse().map_err(|_| invalid())?),
            ScalarType::F64 => Value::F64(text.parse().map_err(|_| invalid())?),
            ScalarType::Enum => {
                let ordinal = match labels.iter().position(|l| l == text) {
                    Some(i) => u8::try_from(i).ok(),
                    None => parse_int::<u8>(text),
                };
                match ordinal {
                    Some(o) if labels.is_empty() || (o as usize) < labels.len() => Value::Enum(o),
                    _ => return Err(invalid()),
                }
            }
        };
        Ok(value)
    }

    /// Like Display except that enums use their label when there is one.
    pub fn display_with(&self, labels: &[String]) -> String {
        match self {
            Value::Enum(o) => match labels.get(*o as usize) {
                Some(label) => label.clone(),
                None => o.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

/// Returns None if text isn't a number or doesn't fit in T.
fn parse_int<T: TryFrom<i64>>(text: &str) -> Option<T> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // from_str_radix accepts its own sign which would allow "--5" or "0x-5".
    if !digits.starts_with(|c: char| c.is_ascii_hexdigit()) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative {
        magnitude.checked_neg()?
    } else {
        magnitude
    };
    T::try_from(value).ok()
}

/// Multi-dimensional arrays are shown as e.g. "<4 x 8>" instead of a value.
pub fn dimension_descriptor(dims: &[u32]) -> Option<String> {
    if dims.len() > 1 {
        let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
        Some(format!("<{}>", dims.join(" x ")))
    } else {
        None
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.data_type())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", *b as u8),
            Value::U8(v) => write!(f, "{v}"),
            Value::S8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::S16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::S32(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Enum(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["OFF".to_string(), "ON".to_string(), "AUTO".to_string()]
    }

    #[test]
    fn little_endian() {
        assert_eq!(decode(&[1, 0, 0, 0], ScalarType::U32).unwrap(), Value::U32(1));
        assert_eq!(decode(&[0x34, 0x12], ScalarType::U16).unwrap(), Value::U16(0x1234));
        assert_eq!(decode(&[0xff, 0xff], ScalarType::S16).unwrap(), Value::S16(-1));
        assert_eq!(decode(&[0xff, 0xff], ScalarType::U16).unwrap(), Value::U16(0xffff));
        assert_eq!(
            decode(&[0x00, 0x00, 0x00, 0x80], ScalarType::S32).unwrap(),
            Value::S32(i32::MIN)
        );
        assert_eq!(decode(&[0x80], ScalarType::S8).unwrap(), Value::S8(-128));
        assert_eq!(decode(&[2], ScalarType::Bool).unwrap(), Value::Bool(true));
    }

    #[test]
    fn float_bits() {
        assert_eq!(
            decode(&[0x00, 0x00, 0x80, 0x3f], ScalarType::F32).unwrap(),
            Value::F32(1.0)
        );
        assert_eq!(Value::F32(-2.5).encode(), (-2.5f32).to_bits().to_le_bytes());
        assert_eq!(
            decode(&1.5f64.to_le_bytes(), ScalarType::F64).unwrap(),
            Value::F64(1.5)
        );
    }

    #[test]
    fn round_trips() {
        let values = [
            Value::Bool(false),
            Value::Bool(true),
            Value::U8(0),
            Value::U8(u8::MAX),
            Value::S8(i8::MIN),
            Value::S8(-1),
            Value::U16(u16::MAX),
            Value::S16(i16::MIN),
            Value::S16(-1),
            Value::U32(u32::MAX),
            Value::S32(i32::MAX),
            Value::S32(-1),
            Value::F32(f32::MAX),
            Value::F32(-0.125),
            Value::F64(f64::MIN),
            Value::Enum(2),
        ];
        for value in values {
            let ty = value.scalar_type();
            let bytes = value.encode();
            assert_eq!(bytes.len(), ty.width());
            assert_eq!(decode(&bytes, ty).unwrap(), value);
        }
    }

    #[test]
    fn wrong_width() {
        assert!(matches!(
            decode(&[1, 2, 3], ScalarType::U32),
            Err(CalibError::WidthMismatch {
                expected: 4,
                actual: 3
            })
        ));
        assert!(decode(&[1, 2], ScalarType::U8).is_err());
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(Value::parse("0x7f", ScalarType::U8, &[]).unwrap(), Value::U8(0x7f));
        assert_eq!(Value::parse(" -32768 ", ScalarType::S16, &[]).unwrap(), Value::S16(i16::MIN));
        assert_eq!(Value::parse("-0x10", ScalarType::S32, &[]).unwrap(), Value::S32(-16));
        assert_eq!(Value::parse("1.25", ScalarType::F32, &[]).unwrap(), Value::F32(1.25));
        assert_eq!(Value::parse("True", ScalarType::Bool, &[]).unwrap(), Value::Bool(true));

        assert!(Value::parse("256", ScalarType::U8, &[]).is_err());
        assert!(Value::parse("-1", ScalarType::U32, &[]).is_err());
        assert!(Value::parse("2", ScalarType::Bool, &[]).is_err());
        assert!(Value::parse("fast", ScalarType::F64, &[]).is_err());
    }

    #[test]
    fn doubled_signs() {
        for text in ["--5", "0x-5", "-+5", "+5", "-0x-5", "-", "0x", "--9223372036854775808"] {
            assert!(
                matches!(
                    Value::parse(text, ScalarType::S32, &[]),
                    Err(CalibError::InvalidValue { .. })
                ),
                "{text} should be rejected"
            );
        }
        assert!(Value::parse("--1", ScalarType::Enum, &[]).is_err());
        assert_eq!(Value::parse("-5", ScalarType::S32, &[]).unwrap(), Value::S32(-5));
    }

    #[test]
    fn parse_enums() {
        let labels = labels();
        assert_eq!(Value::parse("AUTO", ScalarType::Enum, &labels).unwrap(), Value::Enum(2));
        assert_eq!(Value::parse("1", ScalarType::Enum, &labels).unwrap(), Value::Enum(1));
        assert!(Value::parse("3", ScalarType::Enum, &labels).is_err());
        assert!(Value::parse("MAYBE", ScalarType::Enum, &labels).is_err());
        assert_eq!(Value::parse("200", ScalarType::Enum, &[]).unwrap(), Value::Enum(200));
    }

    #[test]
    fn display() {
        let labels = labels();
        assert_eq!(Value::Enum(1).display_with(&labels), "ON");
        assert_eq!(Value::Enum(7).display_with(&labels), "7");
        assert_eq!(Value::Bool(true).display_with(&labels), "1");
        assert_eq!(Value::S8(-3).to_string(), "-3");
    }

    #[test]
    fn descriptors() {
        assert_eq!(dimension_descriptor(&[]), None);
        assert_eq!(dimension_descriptor(&[8]), None);
        insta::assert_snapshot!(dimension_descriptor(&[4, 8]).unwrap(), @"<4 x 8>");
        insta::assert_snapshot!(dimension_descriptor(&[2, 3, 5]).unwrap(), @"<2 x 3 x 5>");
    }
}

//! Command line definitions, e.g. `elfcal firmware.elf sections --titles`.
use crate::calib::ScalarType;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Inspect and tune calibration values in firmware images", long_about = None)]
#[command(infer_subcommands(true))] // allow abreviations
pub struct Cli {
    /// Path to a 32-bit ELF file
    pub elf: PathBuf,

    #[command(subcommand)]
    pub command: MainCommand,
}

#[derive(Subcommand)]
pub enum MainCommand {
    /// Show ELF header
    Header(ExplainArgs),

    /// Show sections
    Sections(TableArgs),

    /// Show segments
    Segments(TableArgs),

    /// Show data objects from the symbol table
    Symbols(TableArgs),

    /// Show where the DWARF sections are
    Debug(ExplainArgs),

    /// Read a value from the ELF or from an image
    Read(ReadArgs),

    /// Print bytes from the ELF as hex and ascii
    Hexdump(HexdumpArgs),

    /// Write a value into an Intel HEX image
    Write(WriteArgs),
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,
}

#[derive(Args)]
pub struct TableArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,
}

#[derive(Args)]
pub struct ReadArgs {
    /// Virtual address or symbol name
    pub location: String,

    /// How to interpret the bytes
    #[arg(long = "type", value_enum, default_value_t = TypeArg::Uint32)]
    pub ty: TypeArg,

    /// Read from this Intel HEX image instead of the ELF
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Args)]
pub struct HexdumpArgs {
    /// Number of bytes to dump
    #[arg(short, long)]
    #[arg(default_value_t = 16)]
    pub count: usize,

    /// Virtual address or symbol name
    pub location: String,
}

#[derive(Args)]
pub struct WriteArgs {
    /// Intel HEX image to modify
    #[arg(long)]
    pub image: PathBuf,

    /// Where to save the modified image, defaults to overwriting --image
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Virtual address or symbol name
    pub location: String,

    /// How to encode the value
    #[arg(long = "type", value_enum, default_value_t = TypeArg::Uint32)]
    pub ty: TypeArg,

    /// Decimal or 0x prefixed hex, true/false for bools
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum TypeArg {
    Bool,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
    Float32,
    Float64,

    /// One byte ordinal
    Enum,
}

impl From<TypeArg> for ScalarType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Bool => ScalarType::Bool,
            TypeArg::Uint8 => ScalarType::U8,
            TypeArg::Sint8 => ScalarType::S8,
            TypeArg::Uint16 => ScalarType::U16,
            TypeArg::Sint16 => ScalarType::S16,
            TypeArg::Uint32 => ScalarType::U32,
            TypeArg::Sint32 => ScalarType::S32,
            TypeArg::Float32 => ScalarType::F32,
            TypeArg::Float64 => ScalarType::F64,
            TypeArg::Enum => ScalarType::Enum,
        }
    }
}

/// Accepts decimal or 0x prefixed hex.
pub fn parse_u32_expr(s: &str) -> Result<u32, String> {
    if let Some(t) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(t, 16).map_err(|_| format!("`{s}` isn't a hex or decimal number"))
    } else {
        s.parse()
            .map_err(|_| format!("`{s}` isn't a hex or decimal number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(parse_u32_expr("0x1008"), Ok(0x1008));
        assert_eq!(parse_u32_expr("4104"), Ok(4104));
        assert!(parse_u32_expr("gain").is_err());
        assert!(parse_u32_expr("0x1_0000_0000").is_err());
    }

    #[test]
    fn parses_write() {
        let cli = Cli::try_parse_from([
            "elfcal", "fw.elf", "write", "--image", "cal.hex", "0x1004", "--type", "sint16", "-5",
        ])
        .unwrap();
        match cli.command {
            MainCommand::Write(args) => {
                assert_eq!(args.location, "0x1004");
                assert_eq!(ScalarType::from(args.ty), ScalarType::S16);
                assert_eq!(args.value, "-5");
                assert!(args.out.is_none());
            }
            _ => panic!("expected write"),
        }
    }
}

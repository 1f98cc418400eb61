//! Handlers for the commands users type, e.g. `elfcal fw.elf sections`.
pub mod elf;
pub mod memory;
pub mod tables;

pub use elf::*;
pub use memory::*;

use crate::cli::{Cli, MainCommand};
use crate::elf::ElfFile;
use crate::error::Result;
use std::io::Write;

pub fn run_command(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let file = ElfFile::new(&cli.elf)?;
    match &cli.command {
        MainCommand::Header(args) => info_header(&file, args, out),
        MainCommand::Sections(args) => info_sections(&file, args, out),
        MainCommand::Segments(args) => info_segments(&file, args, out),
        MainCommand::Symbols(args) => info_symbols(&file, args, out),
        MainCommand::Debug(args) => info_debug(&file, args, out),
        MainCommand::Read(args) => read(&file, args, out),
        MainCommand::Hexdump(args) => hexdump(&file, args, out),
        MainCommand::Write(args) => write(&file, args, out),
    }
}

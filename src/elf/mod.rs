//! ELF32 support for firmware images. Only the parts needed to find where variables
//! live are parsed: the header, program headers, section headers, and the symbol table.
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * The class (32 or 64 bit) and byte order.
//! * The offset to and number of program headers.
//! * The offset to and number of section headers.
//!
//! Section headers identify sections. Each has a name, type, virtual address, file
//! offset, and size. Variables are found by mapping their virtual address to the
//! section containing it and then to an offset within the file.
pub mod elf_file;
pub mod header;
pub mod io;
pub mod primitives;
pub mod section_map;
pub mod sections;
pub mod segments;
pub mod symbols;

#[cfg(test)]
pub mod test_elf;

pub use elf_file::*;
pub use header::*;
pub use io::*;
pub use primitives::*;
pub use section_map::*;
pub use sections::*;
pub use segments::*;
pub use symbols::*;

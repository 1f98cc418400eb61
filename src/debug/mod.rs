//! Support for the debugging info encoded into ELF files. The DWARF sections
//! (".debug_info", ".debug_abbrev", ".debug_str") are located here and handed to a
//! parser which produces the symbol tree. DWARF is documented at
//! https://dwarfstd.org/doc/DWARF5.pdf.
pub mod sections;
pub mod tree;

pub use sections::*;
pub use tree::*;

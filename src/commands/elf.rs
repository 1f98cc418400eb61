use super::tables::{SimpleTableBuilder, TableBuilder, add_field, add_simple};
use crate::cli::{ExplainArgs, TableArgs};
use crate::elf::{Bytes, ElfFile, Offset, ProgramHeader, SectionHeader, SymbolIndex};
use crate::error::Result;
use std::io::Write;

pub fn info_header(file: &ElfFile, args: &ExplainArgs, out: &mut impl Write) -> Result<()> {
    let header = &file.header;
    let mut b = SimpleTableBuilder::new();
    add_simple!(b, "class", header.class_name(), "ELF32 or ELF64");
    add_simple!(
        b,
        "encoding",
        header.encoding_name(),
        "byte order of multi-byte fields in the file"
    );
    add_simple!(b, "osabi", header.abi_name(), "the OS or ABI the binary targets");
    add_simple!(b, "abiversion", header.abi_version, "usually zero");
    add_simple!(b, "type", header.type_name(), "type of ELF file");
    add_simple!(b, "machine", header.machine_name(), "CPU architecture");
    add_simple!(b, "entry", "0x{:x}", header.entry, "where execution starts");
    add_simple!(b, "flags", "0x{:x}", header.flags, "processor specific flags");
    add_simple!(
        b,
        "ph_offset",
        header.ph_offset,
        "offset in the ELF file to the program header table"
    );
    add_simple!(
        b,
        "num_ph_entries",
        header.num_ph_entries,
        "number of entries in the program header table"
    );
    add_simple!(
        b,
        "section_offset",
        header.section_offset,
        "offset in the ELF file to the section header table"
    );
    add_simple!(
        b,
        "num_section_entries",
        header.num_section_entries,
        "number of entries in the section header table"
    );
    add_simple!(
        b,
        "string_table_index",
        header.string_table_index,
        "section index containing the section names"
    );
    b.writeln(out, args.explain)
}

pub fn info_sections(file: &ElfFile, args: &TableArgs, out: &mut impl Write) -> Result<()> {
    let mut builder = TableBuilder::new();
    builder.add_col_r("index", "index into the section header table");
    builder.add_col_l("name", "resolved through the section name string table");
    builder.add_col_l("type", "type of the section");
    builder.add_col_r("vaddr", "virtual address at execution");
    builder.add_col_r("offset", "offset into the ELF file for the start of the section");
    builder.add_col_r("size", "section size in bytes");
    builder.add_col_r("entry_size", "set if the section holds a table of entries");
    builder.add_col_r("align", "section alignment");
    builder.add_col_r("link", "index of a related section, usually a string table");
    builder.add_col_l("flags", "write, alloc, exec, etc");

    // Sections are referenced by index so they aren't sorted.
    for (i, section) in file.sections().iter().enumerate() {
        let header = &section.header;
        add_field!(builder, "index", i);
        add_field!(builder, "name", section.name);
        add_field!(builder, "type", header.stype.description());
        add_field!(builder, "vaddr", "{:x}", header.vbytes.start.0);
        add_field!(builder, "offset", "{:x}", header.obytes.start.0);
        add_field!(builder, "size", "{:x}", header.vbytes.size);
        add_field!(builder, "entry_size", header.entry_size);
        add_field!(builder, "align", header.align);
        add_field!(builder, "link", header.link);
        add_field!(builder, "flags", SectionHeader::flags(header.flags));
    }

    builder.writeln(out, args.titles, args.explain)
}

pub fn info_segments(file: &ElfFile, args: &TableArgs, out: &mut impl Write) -> Result<()> {
    let mut builder = TableBuilder::new();
    builder.add_col_l("type", "the segment type");
    builder.add_col_r("offset", "the offset into the ELF file at which the segment appears");
    builder.add_col_r("vaddr", "the virtual address the segment starts at");
    builder.add_col_r("paddr", "the load address, usually in flash");
    builder.add_col_r("file size", "the size of the segment in the ELF file");
    builder.add_col_r("memory size", "the size of the segment in memory");
    builder.add_col_r("flags", "readable, writeable, and/or executable");

    for segment in file.segments.iter() {
        add_field!(builder, "type", "{:?}", segment.stype);
        add_field!(builder, "offset", "{:x}", segment.obytes.start.0);
        add_field!(builder, "vaddr", "{:x}", segment.vaddr.0);
        add_field!(builder, "paddr", "{:x}", segment.paddr);
        add_field!(builder, "file size", "{:x}", segment.obytes.size);
        add_field!(builder, "memory size", "{:x}", segment.mem_size);
        add_field!(builder, "flags", ProgramHeader::flags(segment.flags));
    }

    builder.writeln(out, args.titles, args.explain)?;
    if args.explain {
        writeln!(out)?;
        writeln!(out, "Numeric fields are all in hex.")?;
    }
    Ok(())
}

/// Only data objects are listed since those are what can be calibrated.
pub fn info_symbols(file: &ElfFile, args: &TableArgs, out: &mut impl Write) -> Result<()> {
    let mut builder = TableBuilder::new();
    builder.add_col_l("name", "symbol name from the linked string table");
    builder.add_col_r("vaddr", "address of the object");
    builder.add_col_r("size", "size of the object in bytes");
    builder.add_col_l("binding", "local or global");
    builder.add_col_l("section", "index of the section holding the object");

    let mut symbols: Vec<_> = file
        .find_symbols()
        .into_iter()
        .filter(|s| s.is_object())
        .collect();
    symbols.sort_by_key(|s| s.value.0);
    for symbol in symbols.iter() {
        let section = match symbol.index {
            SymbolIndex::Index(index) => index.0.to_string(),
            other => format!("{other:?}"),
        };
        add_field!(builder, "name", symbol.name);
        add_field!(builder, "vaddr", "{:x}", symbol.value.0);
        add_field!(builder, "size", symbol.size);
        add_field!(builder, "binding", "{:?}", symbol.binding);
        add_field!(builder, "section", section);
    }

    builder.writeln(out, args.titles, args.explain)
}

pub fn info_debug(file: &ElfFile, args: &ExplainArgs, out: &mut impl Write) -> Result<()> {
    let debug = file.debug_sections();
    let mut b = SimpleTableBuilder::new();
    add_simple!(
        b,
        "present",
        debug.is_present(),
        "true if .debug_abbrev, .debug_info, and .debug_str were all found"
    );
    add_simple!(
        b,
        "abbrev",
        "{}",
        extent(debug.abbrev),
        "file offset and size of .debug_abbrev"
    );
    add_simple!(
        b,
        "info",
        "{}",
        extent(debug.info),
        "file offset and size of .debug_info"
    );
    add_simple!(
        b,
        "str",
        "{}",
        extent(debug.strings),
        "file offset and size of .debug_str"
    );
    b.writeln(out, args.explain)
}

fn extent(bytes: Option<Bytes<Offset>>) -> String {
    match bytes {
        Some(b) => format!("0x{:x} ({} bytes)", b.start.0, b.size),
        None => "missing".to_string(),
    }
}

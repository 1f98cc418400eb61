//! Commands that read or write calibration values.
use crate::calib::{CalibrationSet, HexImage, ScalarType, decode};
use crate::cli::{HexdumpArgs, ReadArgs, WriteArgs, parse_u32_expr};
use crate::debug::{NodeId, SymbolNode, SymbolTree};
use crate::elf::{ElfFile, VirtualAddr};
use crate::error::{CalibError, Result};
use std::io::Write;
use std::path::Path;

/// Locations are either numbers or the names of data objects in the symbol table.
pub fn resolve_location(file: &ElfFile, location: &str) -> Result<VirtualAddr> {
    if let Ok(addr) = parse_u32_expr(location) {
        return Ok(VirtualAddr(addr));
    }
    file.find_symbol(location)
        .map(|s| s.value)
        .ok_or_else(|| CalibError::UnknownSymbol(location.to_string()))
}

pub fn read(file: &ElfFile, args: &ReadArgs, out: &mut impl Write) -> Result<()> {
    let addr = resolve_location(file, &args.location)?;
    let ty = ScalarType::from(args.ty);
    match &args.image {
        Some(path) => {
            let (tree, node) = single_variable(&args.location, addr, ty);
            let (set, index) = bind_image(file, &tree, node, path)?;
            let binding = set.binding(0, index)?;
            if binding.value.is_none() {
                return Err(CalibError::UnmappedImageAddress(addr.0));
            }
            write!(out, "{} = {}", args.location, binding.display_value())?;
            if binding.is_modified()
                && let Some(default) = binding.default
            {
                write!(out, " (ELF has {default})")?;
            }
            writeln!(out)?;
        }
        None => {
            let value = decode(file.read_bytes(addr, ty.width())?, ty)?;
            writeln!(out, "{} = {value}", args.location)?;
        }
    }
    Ok(())
}

pub fn write(file: &ElfFile, args: &WriteArgs, out: &mut impl Write) -> Result<()> {
    let addr = resolve_location(file, &args.location)?;
    let ty = ScalarType::from(args.ty);
    let (tree, node) = single_variable(&args.location, addr, ty);
    let (mut set, index) = bind_image(file, &tree, node, &args.image)?;
    let old = set.binding(0, index)?.display_value();
    set.write_text(0, index, &args.value)?;
    let new = set.binding(0, index)?.display_value();

    let path = args.out.as_deref().unwrap_or(&args.image);
    set.save_image(0, path)?;
    writeln!(out, "{}: {old} -> {new}", args.location)?;
    Ok(())
}

pub fn hexdump(file: &ElfFile, args: &HexdumpArgs, out: &mut impl Write) -> Result<()> {
    let addr = resolve_location(file, &args.location)?;
    let bytes = file.read_bytes(addr, args.count)?;
    for (i, line) in bytes.chunks(16).enumerate() {
        write!(out, "{:08x}: ", addr.0 as u64 + 16 * i as u64)?;
        for j in 0..16 {
            if j == 8 {
                write!(out, " ")?;
            }
            match line.get(j) {
                Some(b) => write!(out, "{b:02x} ")?,
                None => write!(out, "   ")?,
            }
        }
        write!(out, "  ")?;
        for &b in line {
            let ch = b as char;
            if ch.is_ascii_graphic() {
                write!(out, "{ch}")?;
            } else {
                write!(out, ".")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// There's no debug info to build a symbol tree from so the tree is just the one
/// variable.
fn single_variable(name: &str, addr: VirtualAddr, ty: ScalarType) -> (SymbolTree, NodeId) {
    let mut tree = SymbolTree::new();
    let node = tree.add(None, SymbolNode::new(name, addr.0, ty.data_type()));
    (tree, node)
}

/// Binds node to the Intel HEX image at path, returning the set and the binding index.
fn bind_image<'a>(
    file: &'a ElfFile,
    tree: &'a SymbolTree,
    node: NodeId,
    path: &Path,
) -> Result<(CalibrationSet<'a>, usize)> {
    let image = HexImage::open(path)?;
    let mut set = CalibrationSet::new(file, tree);
    set.attach_image(&path.display().to_string(), Box::new(image));
    set.select_subtree(node)?;
    let index = set.find_binding(0, node)?;
    Ok((set, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calib::{MemoryImage, Value};
    use crate::cli::TypeArg;
    use crate::elf::test_elf::{ElfBuilder, SHT_PROGBITS};
    use std::path::PathBuf;
    use tempfile::{NamedTempFile, TempDir};

    fn defaults() -> Vec<u8> {
        let mut bytes = b"cal:v1\0\0".to_vec();
        bytes.extend_from_slice(&100u32.to_le_bytes()); // gain
        bytes.extend_from_slice(&(-5i16).to_le_bytes()); // offset
        bytes.extend_from_slice(&[0, 0]);
        bytes
    }

    fn elf() -> (NamedTempFile, ElfFile) {
        let file = ElfBuilder::new()
            .section_at(".calib", SHT_PROGBITS, 0x1000, 0x200, &defaults())
            .symbols(&[("gain", 0x1008, 4), ("offset", 0x100c, 2)])
            .write();
        let elf = ElfFile::new(file.path()).unwrap();
        (file, elf)
    }

    /// An image with gain changed to 250.
    fn image() -> (TempDir, PathBuf) {
        let mut bytes = defaults();
        bytes[8..12].copy_from_slice(&250u32.to_le_bytes());
        let mut image = HexImage::new();
        image.insert(0x1000, &bytes).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cal.hex");
        image.save(&path).unwrap();
        (dir, path)
    }

    fn read_args(location: &str, ty: TypeArg, image: Option<PathBuf>) -> ReadArgs {
        ReadArgs {
            location: location.to_string(),
            ty,
            image,
        }
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn locations() {
        let (_file, elf) = elf();
        assert_eq!(resolve_location(&elf, "0x100c").unwrap(), VirtualAddr(0x100c));
        assert_eq!(resolve_location(&elf, "offset").unwrap(), VirtualAddr(0x100c));
        assert!(matches!(
            resolve_location(&elf, "gian"),
            Err(CalibError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn reads_from_elf() {
        let (_file, elf) = elf();
        let args = read_args("offset", TypeArg::Sint16, None);
        assert_eq!(output(|out| read(&elf, &args, out)), "offset = -5\n");

        let args = read_args("0x2000", TypeArg::Uint8, None);
        let mut out = Vec::new();
        assert!(matches!(
            read(&elf, &args, &mut out),
            Err(CalibError::AddressNotMapped(0x2000))
        ));
    }

    #[test]
    fn reads_from_image() {
        let (_file, elf) = elf();
        let (_dir, path) = image();
        let args = read_args("gain", TypeArg::Uint32, Some(path.clone()));
        assert_eq!(
            output(|out| read(&elf, &args, out)),
            "gain = 250 (ELF has 100)\n"
        );

        let args = read_args("offset", TypeArg::Sint16, Some(path.clone()));
        assert_eq!(output(|out| read(&elf, &args, out)), "offset = -5\n");

        let args = read_args("0x1020", TypeArg::Uint8, Some(path));
        let mut out = Vec::new();
        assert!(read(&elf, &args, &mut out).is_err());
    }

    #[test]
    fn writes_to_a_copy() {
        let (_file, elf) = elf();
        let (dir, path) = image();
        let copy = dir.path().join("copy.hex");
        let args = WriteArgs {
            image: path.clone(),
            out: Some(copy.clone()),
            location: "offset".to_string(),
            ty: TypeArg::Sint16,
            value: "-0x20".to_string(),
        };
        assert_eq!(output(|out| write(&elf, &args, out)), "offset: -5 -> -32\n");

        let saved = HexImage::open(&copy).unwrap();
        assert_eq!(
            saved.read_value(0x100c, ScalarType::S16).unwrap(),
            Value::S16(-32)
        );
        let original = HexImage::open(&path).unwrap();
        assert_eq!(
            original.read_value(0x100c, ScalarType::S16).unwrap(),
            Value::S16(-5)
        );
    }

    #[test]
    fn bad_writes_leave_the_image_alone() {
        let (_file, elf) = elf();
        let (_dir, path) = image();
        let before = std::fs::read_to_string(&path).unwrap();
        let args = WriteArgs {
            image: path.clone(),
            out: None,
            location: "gain".to_string(),
            ty: TypeArg::Uint8,
            value: "300".to_string(),
        };
        let mut out = Vec::new();
        assert!(matches!(
            write(&elf, &args, &mut out),
            Err(CalibError::InvalidValue { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn dumps() {
        let (_file, elf) = elf();
        let args = HexdumpArgs {
            count: 20,
            location: "0x1000".to_string(),
        };
        let text = output(|out| hexdump(&elf, &args, out));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00001000: 63 61 6c 3a 76 31 00 00  64 00 00 00"));
        assert!(lines[0].ends_with("cal:v1..d......."));
        assert!(lines[1].starts_with("00001010: "));
    }
}

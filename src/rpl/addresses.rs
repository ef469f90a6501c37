//! Loader virtual-address relocation.
//!
//! Linker scripts won't place symbol and string tables in the loader address
//! window at `0xC000_0000`, so the converter moves them there itself and
//! rewrites every symbol and relocation that pointed into the moved range.

use crate::elf::constants::*;
use crate::elf::file::RplFile;
use crate::elf::{align_up, read_u32_be, write_u32_be};

/// Move every `SHT_SYMTAB` and `SHT_STRTAB` section to the end of the loader
/// window and mark it `SHF_ALLOC`.
///
/// The running watermark starts past the highest existing section and
/// advances by each moved section's raw payload length; the next section's
/// address is the watermark aligned up to its own alignment.
pub fn fix_loader_virtual_addresses(file: &mut RplFile) -> Result<(), String> {
    let mut load_max = LOAD_BASE_ADDRESS;
    for section in &file.sections {
        if section.header.addr >= load_max {
            load_max = section.header.addr.wrapping_add(section.data.len() as u32);
        }
    }

    for index in 0..file.sections.len() {
        let sh_type = file.sections[index].header.sh_type;
        if sh_type != SHT_SYMTAB && sh_type != SHT_STRTAB {
            continue;
        }
        let new_addr = align_up(load_max, file.sections[index].header.addralign);
        relocate_section(file, index, new_addr);
        file.sections[index].header.flags |= SHF_ALLOC;
        load_max = load_max.wrapping_add(file.sections[index].data.len() as u32);
    }

    Ok(())
}

/// Move section `index` to `new_addr`, translating everything that pointed
/// into its old range.
///
/// The old range is inclusive at both ends, so a zero-size symbol sitting at
/// the exact end address of the section still moves with it. Translated are
/// object/function/section symbols in every symbol table, and the offsets of
/// every relocation section targeting this one.
fn relocate_section(file: &mut RplFile, index: usize, new_addr: u32) {
    let section_size = if file.sections[index].data.is_empty() {
        file.sections[index].header.size
    } else {
        file.sections[index].data.len() as u32
    };
    let old_addr = file.sections[index].header.addr;
    let old_end = old_addr.wrapping_add(section_size);

    for section in &mut file.sections {
        if section.header.sh_type != SHT_SYMTAB {
            continue;
        }
        for i in 0..section.data.len() / SYMBOL_ENTRY_SIZE {
            let entry = i * SYMBOL_ENTRY_SIZE;
            let sym_type = section.data[entry + 12] & 0xF;
            if sym_type != STT_OBJECT && sym_type != STT_FUNC && sym_type != STT_SECTION {
                continue;
            }
            let value = read_u32_be(&section.data, entry + 4);
            if value >= old_addr && value <= old_end {
                write_u32_be(&mut section.data, entry + 4, value.wrapping_sub(old_addr).wrapping_add(new_addr));
            }
        }
    }

    for section in &mut file.sections {
        if section.header.sh_type != SHT_RELA || section.header.info != index as u32 {
            continue;
        }
        for i in 0..section.data.len() / RELA_ENTRY_SIZE {
            let entry = i * RELA_ENTRY_SIZE;
            let offset = read_u32_be(&section.data, entry);
            if offset >= old_addr && offset <= old_end {
                write_u32_be(&mut section.data, entry, offset.wrapping_sub(old_addr).wrapping_add(new_addr));
            }
        }
    }

    file.sections[index].header.addr = new_addr;
}

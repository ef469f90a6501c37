//! File header rewriting.
//!
//! Stamps the RPL identification onto the ELF header: the Cafe ABI bytes,
//! the `0xFE01` file type, a section-header table aligned to 64 bytes, and
//! the final section count. Program headers are not part of the format and
//! their fields are zeroed.

use crate::elf::constants::*;
use crate::elf::file::RplFile;
use crate::elf::align_up;

pub fn fix_file_header(file: &mut RplFile) -> Result<(), String> {
    let shstrndx = file
        .section_index(".shstrtab")
        .ok_or_else(|| "no .shstrtab section".to_string())?;

    let header = &mut file.header;
    header.magic = ELF_MAGIC;
    header.class = ELFCLASS32;
    header.encoding = ELFDATA2MSB;
    header.elf_version = EV_CURRENT;
    header.abi = EABI_CAFE;
    header.pad = [0; 7];
    header.file_type = ET_RPL;
    header.machine = EM_PPC;
    header.version = 1;
    header.flags = 0;
    header.phoff = 0;
    header.phentsize = 0;
    header.phnum = 0;
    header.shoff = align_up(ELF_HEADER_SIZE as u32, 64);
    header.shnum = file.sections.len() as u16;
    header.shentsize = SECTION_HEADER_SIZE as u16;
    header.ehsize = ELF_HEADER_SIZE as u16;
    header.shstrndx = shstrndx as u16;
    Ok(())
}

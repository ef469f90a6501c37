//! Relocation rewriting.
//!
//! The Cafe loader accepts only a reduced set of PowerPC relocation types.
//! Types in that set pass through untouched; `R_PPC_REL32` is split into a
//! `GHS_REL16_HI`/`GHS_REL16_LO` pair; anything else is unsupported and
//! fails the stage after the whole walk, so one run reports every offending
//! type.

use std::collections::HashSet;

use crate::elf::constants::*;
use crate::elf::file::RplFile;
use crate::elf::{push_i32_be, push_u32_be, read_i32_be, read_u32_be, write_u32_be};

/// Rewrite every `SHT_RELA` section in place.
///
/// Each relocation section's flags are cleared first (the input toolchain
/// marks some of them ALLOC; the RPL layout treats them as temp sections).
/// Entries produced by the `REL32` split are appended to the section's
/// payload after its walk completes.
pub fn fix_relocations(file: &mut RplFile) -> Result<(), String> {
    let mut unsupported: HashSet<u32> = HashSet::new();
    let mut bad_symbols = 0usize;

    for index in 0..file.sections.len() {
        if file.sections[index].header.sh_type != SHT_RELA {
            continue;
        }
        file.sections[index].header.flags = 0;

        // Symbol count of the table this section links to, for index checks.
        let link = file.sections[index].header.link as usize;
        let num_symbols = file.sections.get(link).map_or(0, |s| s.symbol_count());

        let mut appended: Vec<u8> = Vec::new();
        let section = &mut file.sections[index];
        let count = section.data.len() / RELA_ENTRY_SIZE;
        for i in 0..count {
            let entry = i * RELA_ENTRY_SIZE;
            let offset = read_u32_be(&section.data, entry);
            let info = read_u32_be(&section.data, entry + 4);
            let addend = read_i32_be(&section.data, entry + 8);
            let symbol = info >> 8;
            let rel_type = info & 0xFF;

            match rel_type {
                // Valid on the target loader, pass through unchanged.
                R_PPC_NONE
                | R_PPC_ADDR32
                | R_PPC_ADDR16_LO
                | R_PPC_ADDR16_HI
                | R_PPC_ADDR16_HA
                | R_PPC_REL24
                | R_PPC_REL14
                | R_PPC_DTPMOD32
                | R_PPC_DTPREL32
                | R_PPC_EMB_SDA21
                | R_PPC_EMB_RELSDA
                | R_PPC_DIAB_SDA21_LO
                | R_PPC_DIAB_SDA21_HI
                | R_PPC_DIAB_SDA21_HA
                | R_PPC_DIAB_RELSDA_LO
                | R_PPC_DIAB_RELSDA_HI
                | R_PPC_DIAB_RELSDA_HA => {}

                // Split a 32-bit PC-relative relocation into two 16-bit halves.
                R_PPC_REL32 => {
                    if symbol as usize >= num_symbols {
                        println!(
                            "ERROR: could not find symbol {} for fixing a R_PPC_REL32 relocation",
                            symbol
                        );
                        bad_symbols += 1;
                    } else {
                        write_u32_be(&mut section.data, entry + 4, (symbol << 8) | R_PPC_GHS_REL16_HI);
                        push_u32_be(&mut appended, offset.wrapping_add(2));
                        push_u32_be(&mut appended, (symbol << 8) | R_PPC_GHS_REL16_LO);
                        push_i32_be(&mut appended, addend.wrapping_add(2));
                    }
                }

                _ => {
                    // Report each distinct unsupported type once.
                    if unsupported.insert(rel_type) {
                        println!("ERROR: unsupported relocation type {}", rel_type);
                    }
                }
            }
        }

        section.data.extend_from_slice(&appended);
    }

    if bad_symbols > 0 {
        return Err(format!("{} relocation(s) referenced a missing symbol", bad_symbols));
    }
    if !unsupported.is_empty() {
        return Err(format!("{} unsupported relocation type(s)", unsupported.len()));
    }
    Ok(())
}

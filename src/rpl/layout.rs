//! Section file-offset assignment.
//!
//! The loader expects section payloads in a fixed physical order:
//!
//! CRCS > FILEINFO > data > read-only > imports > text > temp
//!
//! Each phase walks the whole section list and emits only the sections
//! matching its predicate, so the on-disk byte order follows phase order
//! while the section-header order stays untouched.

use crate::elf::constants::*;
use crate::elf::file::{RplFile, Section};
use crate::elf::align_up;

/// Sections no payload phase may emit: the two synthetic tables get their
/// own phases, imports get theirs, and NOBITS/empty sections own no bytes.
fn skipped_by_payload_phases(section: &Section) -> bool {
    section.header.size == 0
        || section.header.sh_type == SHT_RPL_FILEINFO
        || section.header.sh_type == SHT_RPL_IMPORTS
        || section.header.sh_type == SHT_RPL_CRCS
        || section.header.sh_type == SHT_NOBITS
}

fn emit(section: &mut Section, offset: &mut u32) {
    section.header.offset = *offset;
    section.header.size = section.data.len() as u32;
    *offset += section.header.size;
}

/// Assign every section's file offset (and final stored size) in RPL phase
/// order. Fails if any section that owns file bytes was left unplaced.
pub fn calculate_section_offsets(file: &mut RplFile) -> Result<(), String> {
    let table_size = file.sections.len() as u32 * SECTION_HEADER_SIZE as u32;
    let mut offset = file.header.shoff + align_up(table_size, 64);

    // NOBITS and NULL sections consume no file bytes; their size stays as
    // previously set (the reserved bss size, or zero).
    for section in &mut file.sections {
        if section.header.sh_type == SHT_NOBITS || section.header.sh_type == SHT_NULL {
            section.header.offset = 0;
            section.data.clear();
        }
    }

    for section in &mut file.sections {
        if section.header.sh_type == SHT_RPL_CRCS {
            emit(section, &mut offset);
        }
    }

    for section in &mut file.sections {
        if section.header.sh_type == SHT_RPL_FILEINFO {
            emit(section, &mut offset);
        }
    }

    // Data sections: writable, allocated, not executable.
    for section in &mut file.sections {
        if skipped_by_payload_phases(section) {
            continue;
        }
        let flags = section.header.flags;
        if flags & SHF_EXECINSTR == 0 && flags & SHF_WRITE != 0 && flags & SHF_ALLOC != 0 {
            emit(section, &mut offset);
        }
    }

    // Read-only sections. Export tables carry the exec flag but live with
    // the read-only group.
    for section in &mut file.sections {
        if skipped_by_payload_phases(section) {
            continue;
        }
        let flags = section.header.flags;
        if (flags & SHF_EXECINSTR == 0 || section.header.sh_type == SHT_RPL_EXPORTS)
            && flags & SHF_WRITE == 0
            && flags & SHF_ALLOC != 0
        {
            emit(section, &mut offset);
        }
    }

    // Import stubs sit with the read-only group but have the exec flag set,
    // so they get their own phase instead of complicating the predicates.
    for section in &mut file.sections {
        if section.header.sh_type == SHT_RPL_IMPORTS {
            emit(section, &mut offset);
        }
    }

    // Text sections.
    for section in &mut file.sections {
        if skipped_by_payload_phases(section) {
            continue;
        }
        if section.header.flags & SHF_EXECINSTR != 0 && section.header.sh_type != SHT_RPL_EXPORTS {
            emit(section, &mut offset);
        }
    }

    // Temp sections: whatever is neither executable nor allocated (symbol
    // tables before relocation, debug info, relocation sections).
    for section in &mut file.sections {
        if skipped_by_payload_phases(section) {
            continue;
        }
        let flags = section.header.flags;
        if flags & SHF_EXECINSTR == 0 && flags & SHF_ALLOC == 0 {
            emit(section, &mut offset);
        }
    }

    for (index, section) in file.sections.iter().enumerate() {
        if section.header.offset == 0
            && section.header.sh_type != SHT_NULL
            && section.header.sh_type != SHT_NOBITS
        {
            println!("ERROR: failed to calculate offset for section {}", index);
            return Err(format!("no offset assigned to section {}", index));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::file::{Header, SectionHeader};

    fn section(sh_type: u32, flags: u32, size: usize) -> Section {
        Section {
            header: SectionHeader {
                sh_type,
                flags,
                size: size as u32,
                ..Default::default()
            },
            name: String::new(),
            data: vec![0u8; size],
        }
    }

    fn file(shoff: u32, sections: Vec<Section>) -> RplFile {
        let mut header = Header::parse(&[0u8; ELF_HEADER_SIZE]);
        header.shoff = shoff;
        header.shnum = sections.len() as u16;
        RplFile { header, sections }
    }

    #[test]
    fn payloads_follow_phase_order() {
        // Section-header order: text, temp, data, rodata, imports, crcs, fileinfo.
        let mut f = file(
            64,
            vec![
                section(SHT_NULL, 0, 0),
                section(SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, 0x10),
                section(SHT_STRTAB, 0, 0x08),
                section(SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, 0x20),
                section(SHT_PROGBITS, SHF_ALLOC, 0x0C),
                section(SHT_RPL_IMPORTS, SHF_ALLOC | SHF_EXECINSTR, 0x18),
                section(SHT_RPL_CRCS, 0, 0x1C),
                section(SHT_RPL_FILEINFO, 0, 0x60),
            ],
        );
        calculate_section_offsets(&mut f).unwrap();

        // 8 headers = 320 bytes, aligned to 64 -> payloads start at 64 + 320.
        let base = 64 + 320;
        assert_eq!(f.sections[6].header.offset, base); // crcs
        assert_eq!(f.sections[7].header.offset, base + 0x1C); // fileinfo
        assert_eq!(f.sections[3].header.offset, base + 0x1C + 0x60); // data
        assert_eq!(f.sections[4].header.offset, base + 0x1C + 0x60 + 0x20); // rodata
        assert_eq!(f.sections[5].header.offset, base + 0x1C + 0x60 + 0x20 + 0x0C); // imports
        assert_eq!(f.sections[1].header.offset, base + 0x1C + 0x60 + 0x20 + 0x0C + 0x18); // text
        assert_eq!(f.sections[2].header.offset, base + 0x1C + 0x60 + 0x20 + 0x0C + 0x18 + 0x10); // temp
    }

    #[test]
    fn offsets_are_monotonic_and_non_overlapping() {
        let mut f = file(
            64,
            vec![
                section(SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, 40),
                section(SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, 10),
                section(SHT_RPL_CRCS, 0, 12),
                section(SHT_RPL_FILEINFO, 0, 96),
            ],
        );
        calculate_section_offsets(&mut f).unwrap();

        let mut placed: Vec<(u32, u32)> = f
            .sections
            .iter()
            .map(|s| (s.header.offset, s.header.size))
            .collect();
        placed.sort();
        for pair in placed.windows(2) {
            assert!(pair[0].0 + pair[0].1 <= pair[1].0);
        }
    }

    #[test]
    fn exports_sort_with_read_only_not_text() {
        let mut f = file(
            64,
            vec![
                section(SHT_RPL_EXPORTS, SHF_ALLOC | SHF_EXECINSTR, 0x10),
                section(SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, 0x10),
                section(SHT_RPL_CRCS, 0, 4),
                section(SHT_RPL_FILEINFO, 0, 96),
            ],
        );
        calculate_section_offsets(&mut f).unwrap();
        // Exports precede text in the file.
        assert!(f.sections[0].header.offset < f.sections[1].header.offset);
    }

    #[test]
    fn nobits_and_null_are_cleared() {
        let mut bss = section(SHT_NOBITS, SHF_ALLOC | SHF_WRITE, 0);
        bss.header.size = 0x100;
        bss.header.offset = 0x999;
        let mut f = file(
            64,
            vec![
                section(SHT_NULL, 0, 0),
                bss,
                section(SHT_RPL_CRCS, 0, 4),
                section(SHT_RPL_FILEINFO, 0, 96),
            ],
        );
        calculate_section_offsets(&mut f).unwrap();
        assert_eq!(f.sections[1].header.offset, 0);
        assert_eq!(f.sections[1].header.size, 0x100); // reserved bss size kept
        assert!(f.sections[1].data.is_empty());
    }

    #[test]
    fn stored_size_follows_compressed_payload() {
        let mut odd = section(SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, 10);
        odd.header.size = 0x40; // stale pre-compression size
        let mut f = file(64, vec![odd, section(SHT_RPL_CRCS, 0, 4), section(SHT_RPL_FILEINFO, 0, 96)]);
        calculate_section_offsets(&mut f).unwrap();
        assert_eq!(f.sections[0].header.size, 10);
    }

    #[test]
    fn unplaced_section_is_a_layout_error() {
        // A writable executable export table matches no phase predicate.
        let mut f = file(
            64,
            vec![section(SHT_RPL_EXPORTS, SHF_ALLOC | SHF_WRITE | SHF_EXECINSTR, 8)],
        );
        let err = calculate_section_offsets(&mut f).unwrap_err();
        assert!(err.contains("section 0"));
    }
}

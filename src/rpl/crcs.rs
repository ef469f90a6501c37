//! CRC table synthesis.
//!
//! The loader verifies each section payload against a table of 32-bit
//! big-endian CRC-32 values, one per section in section order. The table's
//! own slot must read zero. CRCs are taken over the uncompressed payloads,
//! so this stage runs before the deflater.

use crate::elf::constants::*;
use crate::elf::file::{RplFile, Section, SectionHeader};
use crate::elf::push_u32_be;

/// CRC-32 (IEEE polynomial, reflected, zlib-compatible).
fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320u32 & mask);
        }
    }
    !crc
}

/// Build the CRC table over every current section and insert the `RPL_CRCS`
/// section immediately before the `RPL_FILEINFO` section at the list's end.
///
/// The zero entry for the table itself is inserted at the second-to-last
/// position of the value sequence, which is exactly the slot the CRCS
/// section occupies once it joins the list ahead of FILEINFO.
pub fn generate_crc_section(file: &mut RplFile) -> Result<(), String> {
    let mut crcs: Vec<u32> = file
        .sections
        .iter()
        .map(|s| if s.data.is_empty() { 0 } else { crc32(&s.data) })
        .collect();
    crcs.insert(crcs.len() - 1, 0);

    let mut data = Vec::with_capacity(crcs.len() * 4);
    for crc in &crcs {
        push_u32_be(&mut data, *crc);
    }

    let section = Section {
        header: SectionHeader {
            sh_type: SHT_RPL_CRCS,
            addralign: 4,
            entsize: 4,
            ..Default::default()
        },
        name: String::new(),
        data,
    };

    let insert_at = file.sections.len() - 1;
    file.sections.insert(insert_at, section);
    Ok(())
}

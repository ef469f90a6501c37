//! Section payload compression.
//!
//! Eligible payloads are replaced by a 4-byte big-endian uncompressed-size
//! sentinel followed by a zlib stream at level 6, and the section gains the
//! `SHF_DEFLATED` flag. The CRC and file info tables stay uncompressed (the
//! loader reads them before it can inflate anything), as do payloads below
//! the minimum profitable size.

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::elf::constants::*;
use crate::elf::file::RplFile;
use crate::elf::push_u32_be;

/// Deflate level matching the `compressionLevel` stamped into the file info.
const COMPRESSION_LEVEL: u8 = 6;

pub fn deflate_sections(file: &mut RplFile) -> Result<(), String> {
    for section in &mut file.sections {
        if section.data.len() < DEFLATE_MIN_SECTION_SIZE
            || section.header.sh_type == SHT_RPL_CRCS
            || section.header.sh_type == SHT_RPL_FILEINFO
        {
            continue;
        }

        let compressed = compress_to_vec_zlib(&section.data, COMPRESSION_LEVEL);
        let mut deflated = Vec::with_capacity(4 + compressed.len());
        push_u32_be(&mut deflated, section.data.len() as u32);
        deflated.extend_from_slice(&compressed);

        section.data = deflated;
        section.header.flags |= SHF_DEFLATED;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::file::{Header, Section, SectionHeader};
    use crate::elf::read_u32_be;
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    fn file_with(sh_type: u32, payload: Vec<u8>) -> RplFile {
        RplFile {
            header: Header::parse(&[0u8; ELF_HEADER_SIZE]),
            sections: vec![Section {
                header: SectionHeader {
                    sh_type,
                    size: payload.len() as u32,
                    ..Default::default()
                },
                name: String::new(),
                data: payload,
            }],
        }
    }

    #[test]
    fn deflated_section_roundtrips() {
        let payload: Vec<u8> = (0..200u32).map(|i| (i % 7) as u8).collect();
        let mut f = file_with(SHT_PROGBITS, payload.clone());
        deflate_sections(&mut f).unwrap();

        let section = &f.sections[0];
        assert_ne!(section.header.flags & SHF_DEFLATED, 0);
        assert_eq!(read_u32_be(&section.data, 0), payload.len() as u32);
        let inflated = decompress_to_vec_zlib(&section.data[4..]).unwrap();
        assert_eq!(inflated, payload);
    }

    #[test]
    fn minimum_size_boundary() {
        let mut f = file_with(SHT_PROGBITS, vec![0xAB; 24]);
        deflate_sections(&mut f).unwrap();
        assert_ne!(f.sections[0].header.flags & SHF_DEFLATED, 0);

        let mut f = file_with(SHT_PROGBITS, vec![0xAB; 23]);
        deflate_sections(&mut f).unwrap();
        assert_eq!(f.sections[0].header.flags & SHF_DEFLATED, 0);
        assert_eq!(f.sections[0].data, vec![0xAB; 23]);
    }

    #[test]
    fn crc_and_fileinfo_sections_stay_uncompressed() {
        for sh_type in [SHT_RPL_CRCS, SHT_RPL_FILEINFO] {
            let mut f = file_with(sh_type, vec![0u8; 96]);
            deflate_sections(&mut f).unwrap();
            assert_eq!(f.sections[0].header.flags & SHF_DEFLATED, 0);
            assert_eq!(f.sections[0].data.len(), 96);
        }
    }
}

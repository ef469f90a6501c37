//! RPL file info synthesis.
//!
//! The loader reads a fixed 96-byte descriptor from the `RPL_FILEINFO`
//! section: how much text/data/load/temp memory the module needs, stack and
//! heap sizes, and toolchain version stamps. The size fields are accounted
//! from the virtual-address window each section's address falls in.

use crate::elf::constants::*;
use crate::elf::file::{RplFile, Section, SectionHeader};
use crate::elf::{align_up, push_i32_be, push_u16_be, push_u32_be};

/// The `RPL_FILEINFO` record. All scalars serialise big-endian, in field
/// order.
#[derive(Clone, Debug, Default)]
pub struct RplFileInfo {
    pub version: u32,
    pub text_size: u32,
    pub text_align: u32,
    pub data_size: u32,
    pub data_align: u32,
    pub load_size: u32,
    pub load_align: u32,
    pub temp_size: u32,
    pub tramp_adjust: u32,
    pub sda_base: u32,
    pub sda2_base: u32,
    pub stack_size: u32,
    pub filename: u32,
    pub flags: u32,
    pub heap_size: u32,
    pub tag_offset: u32,
    pub min_version: u32,
    pub compression_level: i32,
    pub tramp_addition: u32,
    pub file_info_pad: u32,
    pub cafe_sdk_version: u32,
    pub cafe_sdk_revision: u32,
    pub tls_module_index: u16,
    pub tls_align_shift: u16,
    pub runtime_file_info_size: u32,
}

impl RplFileInfo {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FILE_INFO_SIZE);
        push_u32_be(&mut out, self.version);
        push_u32_be(&mut out, self.text_size);
        push_u32_be(&mut out, self.text_align);
        push_u32_be(&mut out, self.data_size);
        push_u32_be(&mut out, self.data_align);
        push_u32_be(&mut out, self.load_size);
        push_u32_be(&mut out, self.load_align);
        push_u32_be(&mut out, self.temp_size);
        push_u32_be(&mut out, self.tramp_adjust);
        push_u32_be(&mut out, self.sda_base);
        push_u32_be(&mut out, self.sda2_base);
        push_u32_be(&mut out, self.stack_size);
        push_u32_be(&mut out, self.filename);
        push_u32_be(&mut out, self.flags);
        push_u32_be(&mut out, self.heap_size);
        push_u32_be(&mut out, self.tag_offset);
        push_u32_be(&mut out, self.min_version);
        push_i32_be(&mut out, self.compression_level);
        push_u32_be(&mut out, self.tramp_addition);
        push_u32_be(&mut out, self.file_info_pad);
        push_u32_be(&mut out, self.cafe_sdk_version);
        push_u32_be(&mut out, self.cafe_sdk_revision);
        push_u16_be(&mut out, self.tls_module_index);
        push_u16_be(&mut out, self.tls_align_shift);
        push_u32_be(&mut out, self.runtime_file_info_size);
        out
    }
}

/// Account the text/data/load/temp sizes from the current section addresses
/// and append the `RPL_FILEINFO` section.
///
/// `flags` is zero for RPL output or `RPL_IS_RPX` for RPX output.
pub fn generate_fileinfo_section(file: &mut RplFile, flags: u32) -> Result<(), String> {
    let mut info = RplFileInfo {
        version: 0xCAFE_0402,
        text_align: 32,
        data_align: 4096,
        load_align: 4,
        stack_size: 0x10000,
        heap_size: 0x8000,
        flags,
        min_version: 0x5078,
        compression_level: 6,
        cafe_sdk_version: 0x5335,
        cafe_sdk_revision: 0x10D4B,
        ..Default::default()
    };

    for section in &file.sections {
        let size = if section.header.sh_type == SHT_NOBITS {
            section.header.size
        } else {
            section.data.len() as u32
        };
        let addr = section.header.addr;

        if addr >= CODE_BASE_ADDRESS && addr < DATA_BASE_ADDRESS {
            let val = addr.wrapping_add(section.header.size).wrapping_sub(CODE_BASE_ADDRESS);
            if val > info.text_size {
                info.text_size = val;
            }
        } else if addr >= DATA_BASE_ADDRESS && addr < LOAD_BASE_ADDRESS {
            let val = addr.wrapping_add(section.header.size).wrapping_sub(DATA_BASE_ADDRESS);
            if val > info.data_size {
                info.data_size = val;
            }
        } else if addr >= LOAD_BASE_ADDRESS {
            let val = addr.wrapping_add(section.header.size).wrapping_sub(LOAD_BASE_ADDRESS);
            if val > info.load_size {
                info.load_size = val;
            }
        } else if addr == 0
            && section.header.sh_type != SHT_RPL_CRCS
            && section.header.sh_type != SHT_RPL_FILEINFO
        {
            info.temp_size = info.temp_size.wrapping_add(size).wrapping_add(128);
        }
    }

    info.text_size = align_up(info.text_size, info.text_align);
    info.data_size = align_up(info.data_size, info.data_align);
    info.load_size = align_up(info.load_size, info.load_align);

    file.sections.push(Section {
        header: SectionHeader {
            sh_type: SHT_RPL_FILEINFO,
            addralign: 4,
            ..Default::default()
        },
        name: String::new(),
        data: info.to_bytes(),
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::file::Header;
    use crate::elf::read_u32_be;

    fn section(sh_type: u32, flags: u32, addr: u32, size: usize) -> Section {
        Section {
            header: SectionHeader {
                sh_type,
                flags,
                addr,
                size: size as u32,
                ..Default::default()
            },
            name: String::new(),
            data: vec![0u8; size],
        }
    }

    fn file(sections: Vec<Section>) -> RplFile {
        RplFile { header: Header::parse(&[0u8; ELF_HEADER_SIZE]), sections }
    }

    fn fileinfo_field(file: &RplFile, offset: usize) -> u32 {
        read_u32_be(&file.sections.last().unwrap().data, offset)
    }

    #[test]
    fn record_is_96_bytes_with_preset_constants() {
        let mut f = file(vec![]);
        generate_fileinfo_section(&mut f, RPL_IS_RPX).unwrap();

        let section = f.sections.last().unwrap();
        assert_eq!(section.header.sh_type, SHT_RPL_FILEINFO);
        assert_eq!(section.header.addralign, 4);
        assert_eq!(section.header.entsize, 0);
        assert_eq!(section.data.len(), FILE_INFO_SIZE);

        assert_eq!(fileinfo_field(&f, 0), 0xCAFE_0402); // version
        assert_eq!(fileinfo_field(&f, 8), 32); // textAlign
        assert_eq!(fileinfo_field(&f, 16), 4096); // dataAlign
        assert_eq!(fileinfo_field(&f, 24), 4); // loadAlign
        assert_eq!(fileinfo_field(&f, 44), 0x10000); // stackSize
        assert_eq!(fileinfo_field(&f, 52), RPL_IS_RPX); // flags
        assert_eq!(fileinfo_field(&f, 56), 0x8000); // heapSize
        assert_eq!(fileinfo_field(&f, 64), 0x5078); // minVersion
        assert_eq!(fileinfo_field(&f, 68), 6); // compressionLevel
        assert_eq!(fileinfo_field(&f, 80), 0x5335); // cafeSdkVersion
        assert_eq!(fileinfo_field(&f, 84), 0x10D4B); // cafeSdkRevision
    }

    #[test]
    fn rpl_flag_selects_zero_flags() {
        let mut f = file(vec![]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        assert_eq!(fileinfo_field(&f, 52), 0);
    }

    #[test]
    fn text_size_from_code_window() {
        let mut f = file(vec![section(SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, 0x0200_0000, 64)]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        assert_eq!(fileinfo_field(&f, 4), 64); // textSize = align_up(64, 32)
    }

    #[test]
    fn data_size_from_data_window_aligns_to_page() {
        let mut f = file(vec![section(SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, 0x1000_1000, 100)]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        assert_eq!(fileinfo_field(&f, 12), 0x2000); // dataSize = align_up(0x1064, 4096)
    }

    #[test]
    fn load_size_from_loader_window() {
        let mut f = file(vec![section(SHT_STRTAB, SHF_ALLOC, 0xC000_0000, 10)]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        assert_eq!(fileinfo_field(&f, 20), 12); // loadSize = align_up(10, 4)
    }

    #[test]
    fn temp_size_accumulates_with_slack() {
        let mut f = file(vec![
            section(SHT_RELA, 0, 0, 24),
            section(SHT_STRTAB, 0, 0, 8),
        ]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        assert_eq!(fileinfo_field(&f, 28), (24 + 128) + (8 + 128));
    }

    #[test]
    fn nobits_uses_header_size_for_temp() {
        let mut bss = section(SHT_NOBITS, SHF_ALLOC | SHF_WRITE, 0, 0);
        bss.header.size = 0x40;
        let mut f = file(vec![bss]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        assert_eq!(fileinfo_field(&f, 28), 0x40 + 128);
    }

    #[test]
    fn window_maxima_take_the_largest_member() {
        let mut f = file(vec![
            section(SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, 0x0200_0000, 0x20),
            section(SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, 0x0200_0100, 0x10),
        ]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        assert_eq!(fileinfo_field(&f, 4), 0x120); // 0x110 aligned to 32
    }

    #[test]
    fn window_size_wraps_like_u32_arithmetic() {
        // addr + size wraps past u32::MAX back below the window base; the
        // accounted value keeps the native modulo-2^32 result.
        let mut big = section(SHT_PROGBITS, SHF_ALLOC, 0xC000_0000, 0);
        big.header.size = 0x5000_0000; // addr + size = 0x1_1000_0000
        let mut f = file(vec![big]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        assert_eq!(fileinfo_field(&f, 20), 0x5000_0000); // loadSize
    }

    #[test]
    fn temp_size_wraps_like_u32_arithmetic() {
        let mut a = section(SHT_NOBITS, 0, 0, 0);
        a.header.size = 0xFFFF_FF00;
        let mut b = section(SHT_NOBITS, 0, 0, 0);
        b.header.size = 0x200;
        let mut f = file(vec![a, b]);
        generate_fileinfo_section(&mut f, 0).unwrap();
        // (0xFFFFFF00 + 128) + (0x200 + 128) mod 2^32
        assert_eq!(fileinfo_field(&f, 28), 0x200);
    }
}

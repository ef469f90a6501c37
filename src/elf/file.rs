//! In-memory model of a 32-bit big-endian PowerPC ELF file, with the parser
//! that loads one from raw bytes and the serialiser that writes the final
//! RPL back out.
//!
//! Section order in `RplFile::sections` is significant: it determines the
//! indices referenced by `shstrndx`, by relocation `link`/`info` fields, and
//! the on-disk section-header order.

use super::constants::*;
use super::{read_cstr, read_u16_be, read_u32_be, push_u16_be, push_u32_be};

/// The 52-byte ELF32 file header, held host-native and (de)serialised
/// through the big-endian helpers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub class: u8,
    pub encoding: u8,
    pub elf_version: u8,
    /// OS/ABI identification; two bytes so `EABI_CAFE` fits.
    pub abi: u16,
    pub pad: [u8; 7],
    pub file_type: u16,
    pub machine: u16,
    pub version: u32,
    pub entry: u32,
    pub phoff: u32,
    pub shoff: u32,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

impl Header {
    pub(crate) fn parse(data: &[u8]) -> Header {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[0..4]);
        let mut pad = [0u8; 7];
        pad.copy_from_slice(&data[9..16]);
        Header {
            magic,
            class: data[4],
            encoding: data[5],
            elf_version: data[6],
            abi: read_u16_be(data, 7),
            pad,
            file_type: read_u16_be(data, 16),
            machine: read_u16_be(data, 18),
            version: read_u32_be(data, 20),
            entry: read_u32_be(data, 24),
            phoff: read_u32_be(data, 28),
            shoff: read_u32_be(data, 32),
            flags: read_u32_be(data, 36),
            ehsize: read_u16_be(data, 40),
            phentsize: read_u16_be(data, 42),
            phnum: read_u16_be(data, 44),
            shentsize: read_u16_be(data, 46),
            shnum: read_u16_be(data, 48),
            shstrndx: read_u16_be(data, 50),
        }
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ELF_HEADER_SIZE);
        out.extend_from_slice(&self.magic);
        out.push(self.class);
        out.push(self.encoding);
        out.push(self.elf_version);
        push_u16_be(&mut out, self.abi);
        out.extend_from_slice(&self.pad);
        push_u16_be(&mut out, self.file_type);
        push_u16_be(&mut out, self.machine);
        push_u32_be(&mut out, self.version);
        push_u32_be(&mut out, self.entry);
        push_u32_be(&mut out, self.phoff);
        push_u32_be(&mut out, self.shoff);
        push_u32_be(&mut out, self.flags);
        push_u16_be(&mut out, self.ehsize);
        push_u16_be(&mut out, self.phentsize);
        push_u16_be(&mut out, self.phnum);
        push_u16_be(&mut out, self.shentsize);
        push_u16_be(&mut out, self.shnum);
        push_u16_be(&mut out, self.shstrndx);
        out
    }
}

/// The ten fields of an ELF32 section header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: u32,
    pub sh_type: u32,
    pub flags: u32,
    pub addr: u32,
    pub offset: u32,
    pub size: u32,
    pub link: u32,
    pub info: u32,
    pub addralign: u32,
    pub entsize: u32,
}

impl SectionHeader {
    pub(crate) fn parse(data: &[u8]) -> SectionHeader {
        SectionHeader {
            name: read_u32_be(data, 0),
            sh_type: read_u32_be(data, 4),
            flags: read_u32_be(data, 8),
            addr: read_u32_be(data, 12),
            offset: read_u32_be(data, 16),
            size: read_u32_be(data, 20),
            link: read_u32_be(data, 24),
            info: read_u32_be(data, 28),
            addralign: read_u32_be(data, 32),
            entsize: read_u32_be(data, 36),
        }
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SECTION_HEADER_SIZE);
        push_u32_be(&mut out, self.name);
        push_u32_be(&mut out, self.sh_type);
        push_u32_be(&mut out, self.flags);
        push_u32_be(&mut out, self.addr);
        push_u32_be(&mut out, self.offset);
        push_u32_be(&mut out, self.size);
        push_u32_be(&mut out, self.link);
        push_u32_be(&mut out, self.info);
        push_u32_be(&mut out, self.addralign);
        push_u32_be(&mut out, self.entsize);
        out
    }
}

/// A section: header, resolved name, and raw payload.
///
/// The payload is empty for `SHT_NOBITS` sections (their size lives in the
/// header only). Sections synthesised mid-pipeline leave `name` empty and
/// `header.name` zero; the writer never consults `name`.
#[derive(Clone, Debug, Default)]
pub struct Section {
    pub header: SectionHeader,
    pub name: String,
    pub data: Vec<u8>,
}

impl Section {
    /// Number of symbol entries in this section's payload.
    pub fn symbol_count(&self) -> usize {
        self.data.len() / SYMBOL_ENTRY_SIZE
    }
}

/// The mutable file model handed from stage to stage.
#[derive(Debug)]
pub struct RplFile {
    pub header: Header,
    pub sections: Vec<Section>,
}

impl RplFile {
    /// Index of the first section with the given name, if any.
    pub fn section_index(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }
}

/// Parse a 32-bit big-endian PowerPC ELF file into the editable model.
///
/// Validates the five identification fields up front, then reads `shnum`
/// section headers at `shoff` and each non-empty, non-NOBITS payload at its
/// stored offset. Section names are resolved from the `.shstrtab` payload
/// named by `shstrndx`.
pub fn parse_elf(data: &[u8], filename: &str) -> Result<RplFile, String> {
    if data.len() < ELF_HEADER_SIZE {
        return Err(format!("{}: too small for ELF header", filename));
    }

    let header = Header::parse(data);
    if header.magic != ELF_MAGIC {
        return Err(format!(
            "{}: invalid ELF magic {:02X}{:02X}{:02X}{:02X}, expected 7F454C46",
            filename, header.magic[0], header.magic[1], header.magic[2], header.magic[3]
        ));
    }
    if header.class != ELFCLASS32 {
        return Err(format!(
            "{}: unexpected ELF file class {}, expected {}",
            filename, header.class, ELFCLASS32
        ));
    }
    if header.encoding != ELFDATA2MSB {
        return Err(format!(
            "{}: unexpected ELF encoding {}, expected {}",
            filename, header.encoding, ELFDATA2MSB
        ));
    }
    if header.machine != EM_PPC {
        return Err(format!(
            "{}: unexpected ELF machine type {}, expected {}",
            filename, header.machine, EM_PPC
        ));
    }
    if header.elf_version != EV_CURRENT {
        return Err(format!(
            "{}: unexpected ELF version {}, expected {}",
            filename, header.elf_version, EV_CURRENT
        ));
    }

    // Read section headers and payloads
    let shoff = header.shoff as usize;
    let shnum = header.shnum as usize;
    let mut sections = Vec::with_capacity(shnum);
    for i in 0..shnum {
        let off = shoff + i * SECTION_HEADER_SIZE;
        if off + SECTION_HEADER_SIZE > data.len() {
            return Err(format!("{}: truncated section header table (section {})", filename, i));
        }
        let sh = SectionHeader::parse(&data[off..off + SECTION_HEADER_SIZE]);

        let payload = if sh.size == 0 || sh.sh_type == SHT_NOBITS {
            Vec::new()
        } else {
            let start = sh.offset as usize;
            let end = start + sh.size as usize;
            if end > data.len() {
                return Err(format!("{}: truncated payload for section {}", filename, i));
            }
            data[start..end].to_vec()
        };

        sections.push(Section { header: sh, name: String::new(), data: payload });
    }

    // Resolve section names from the section-name string table
    let shstrndx = header.shstrndx as usize;
    if shstrndx >= sections.len() {
        return Err(format!(
            "{}: section name table index {} out of range ({} sections)",
            filename, shstrndx, sections.len()
        ));
    }
    let shstrtab = sections[shstrndx].data.clone();
    for section in &mut sections {
        section.name = read_cstr(&shstrtab, section.header.name as usize);
    }

    Ok(RplFile { header, sections })
}

/// Serialise the final RPL: file header at 0, section-header table at
/// `shoff`, each non-empty payload at its assigned offset. Writing into a
/// zero-grown buffer at absolute offsets reproduces the seek-based layout.
pub fn write_rpl(file: &RplFile) -> Vec<u8> {
    let mut out = Vec::new();
    put_bytes(&mut out, 0, &file.header.to_bytes());

    let shoff = file.header.shoff as usize;
    for (i, section) in file.sections.iter().enumerate() {
        put_bytes(&mut out, shoff + i * SECTION_HEADER_SIZE, &section.header.to_bytes());
    }

    for section in &file.sections {
        if !section.data.is_empty() {
            put_bytes(&mut out, section.header.offset as usize, &section.data);
        }
    }

    out
}

fn put_bytes(out: &mut Vec<u8>, offset: usize, bytes: &[u8]) {
    if out.len() < offset + bytes.len() {
        out.resize(offset + bytes.len(), 0);
    }
    out[offset..offset + bytes.len()].copy_from_slice(bytes);
}

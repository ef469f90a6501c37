//! ELF and RPL format constants: identification bytes, section types, flags,
//! symbol attributes, PowerPC relocation types, and fixed structure sizes.
//!
//! The RPL-specific values (section types `0x8000_0001..`, the deflated flag,
//! the Cafe ABI identification and the address windows) must be reproduced
//! bit-exactly; the loader rejects files that deviate.

// ── ELF identification ───────────────────────────────────────────────────────

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

// ELF class
pub const ELFCLASS32: u8 = 1;

// Data encoding
pub const ELFDATA2MSB: u8 = 2;

// Version
pub const EV_CURRENT: u8 = 1;

// OS/ABI. Spans the OSABI and ABI-version identification bytes, so RPL files
// carry `CA FE` at offsets 7-8.
pub const EABI_CAFE: u16 = 0xCAFE;

// ── ELF object types ─────────────────────────────────────────────────────────

/// File type stamped on RPL/RPX output.
pub const ET_RPL: u16 = 0xFE01;

// ── Machine types ────────────────────────────────────────────────────────────

pub const EM_PPC: u16 = 20;

// ── Section header types ─────────────────────────────────────────────────────

pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_RPL_EXPORTS: u32 = 0x8000_0001;
pub const SHT_RPL_IMPORTS: u32 = 0x8000_0002;
pub const SHT_RPL_CRCS: u32 = 0x8000_0003;
pub const SHT_RPL_FILEINFO: u32 = 0x8000_0004;

// ── Section header flags ─────────────────────────────────────────────────────

pub const SHF_WRITE: u32 = 0x1;
pub const SHF_ALLOC: u32 = 0x2;
pub const SHF_EXECINSTR: u32 = 0x4;
/// Payload is a 4-byte big-endian uncompressed size followed by a zlib stream.
pub const SHF_DEFLATED: u32 = 0x0800_0000;

// ── Symbol types ─────────────────────────────────────────────────────────────

pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;

// ── PowerPC relocation types ─────────────────────────────────────────────────

pub const R_PPC_NONE: u32 = 0;
pub const R_PPC_ADDR32: u32 = 1;
pub const R_PPC_ADDR16_LO: u32 = 4;
pub const R_PPC_ADDR16_HI: u32 = 5;
pub const R_PPC_ADDR16_HA: u32 = 6;
pub const R_PPC_REL24: u32 = 10;
pub const R_PPC_REL14: u32 = 11;
pub const R_PPC_REL32: u32 = 26;
pub const R_PPC_DTPMOD32: u32 = 68;
pub const R_PPC_DTPREL32: u32 = 78;
pub const R_PPC_EMB_SDA21: u32 = 109;
pub const R_PPC_EMB_RELSDA: u32 = 116;
pub const R_PPC_DIAB_SDA21_LO: u32 = 180;
pub const R_PPC_DIAB_SDA21_HI: u32 = 181;
pub const R_PPC_DIAB_SDA21_HA: u32 = 182;
pub const R_PPC_DIAB_RELSDA_LO: u32 = 183;
pub const R_PPC_DIAB_RELSDA_HI: u32 = 184;
pub const R_PPC_DIAB_RELSDA_HA: u32 = 185;
pub const R_PPC_GHS_REL16_HA: u32 = 251;
pub const R_PPC_GHS_REL16_HI: u32 = 252;
pub const R_PPC_GHS_REL16_LO: u32 = 253;

// ── RPL file info ────────────────────────────────────────────────────────────

/// FileInfo flag bit distinguishing an RPX executable from an RPL library.
pub const RPL_IS_RPX: u32 = 0x2;

// ── Virtual address windows ──────────────────────────────────────────────────

pub const CODE_BASE_ADDRESS: u32 = 0x0200_0000;
pub const DATA_BASE_ADDRESS: u32 = 0x1000_0000;
pub const LOAD_BASE_ADDRESS: u32 = 0xC000_0000;

// ── ELF/RPL sizes ────────────────────────────────────────────────────────────

/// Size of the ELF32 file header in bytes.
pub const ELF_HEADER_SIZE: usize = 52;
/// Size of an ELF32 section header in bytes.
pub const SECTION_HEADER_SIZE: usize = 40;
/// Size of an ELF32 symbol table entry in bytes.
pub const SYMBOL_ENTRY_SIZE: usize = 16;
/// Size of an ELF32 RELA relocation entry in bytes.
pub const RELA_ENTRY_SIZE: usize = 12;
/// Size of the serialised RPL file info record in bytes.
pub const FILE_INFO_SIZE: usize = 96;

/// Sections smaller than this are stored uncompressed.
pub const DEFLATE_MIN_SECTION_SIZE: usize = 0x18;

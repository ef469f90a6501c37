//! The conversion pipeline.
//!
//! Stages run strictly in order over the single in-memory file model; each
//! stage observes exactly the postconditions of its predecessor. A stage
//! either completes or fails fast, and no output file is written after a
//! failure.

use crate::elf::constants::RPL_IS_RPX;
use crate::elf::file::{parse_elf, write_rpl};
use crate::rpl::addresses::fix_loader_virtual_addresses;
use crate::rpl::compress::deflate_sections;
use crate::rpl::crcs::generate_crc_section;
use crate::rpl::fileinfo::generate_fileinfo_section;
use crate::rpl::header::fix_file_header;
use crate::rpl::layout::calculate_section_offsets;
use crate::rpl::relocations::fix_relocations;

/// Orchestrates the ELF-to-RPL conversion.
///
/// Configuration is done through `parse_cli_args()`; `run()` executes the
/// stage sequence and returns the failing stage's diagnostic, if any.
pub struct Driver {
    pub(super) src: String,
    pub(super) dst: String,
    /// Emit an RPL (file info flags zero) instead of an RPX.
    pub(super) is_rpl: bool,
}

impl Driver {
    pub fn new() -> Self {
        Driver {
            src: String::new(),
            dst: String::new(),
            is_rpl: false,
        }
    }

    /// Run the full pipeline: load, transform, write.
    pub fn run(&self) -> Result<(), String> {
        let input = std::fs::read(&self.src)
            .map_err(|e| format!("read_elf failed: could not open {} for reading: {}", self.src, e))?;
        let mut file = parse_elf(&input, &self.src)
            .map_err(|e| format!("read_elf failed: {}", e))?;

        fix_relocations(&mut file)
            .map_err(|e| format!("fix_relocations failed: {}", e))?;
        fix_loader_virtual_addresses(&mut file)
            .map_err(|e| format!("fix_loader_virtual_addresses failed: {}", e))?;

        let info_flags = if self.is_rpl { 0 } else { RPL_IS_RPX };
        generate_fileinfo_section(&mut file, info_flags)
            .map_err(|e| format!("generate_fileinfo_section failed: {}", e))?;
        generate_crc_section(&mut file)
            .map_err(|e| format!("generate_crc_section failed: {}", e))?;

        fix_file_header(&mut file)
            .map_err(|e| format!("fix_file_header failed: {}", e))?;
        deflate_sections(&mut file)
            .map_err(|e| format!("deflate_sections failed: {}", e))?;
        calculate_section_offsets(&mut file)
            .map_err(|e| format!("calculate_section_offsets failed: {}", e))?;

        let output = write_rpl(&file);
        std::fs::write(&self.dst, &output)
            .map_err(|e| format!("write_rpl failed: could not open {} for writing: {}", self.dst, e))?;
        Ok(())
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

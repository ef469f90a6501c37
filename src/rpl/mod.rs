//! The ELF-to-RPL transform stages.
//!
//! Stages run in a fixed order because each depends on its predecessor's
//! postcondition: relocations are rewritten before the symbol/string tables
//! move into the loader window, file info is accounted from the relocated
//! addresses, CRCs are taken over uncompressed payloads, compression happens
//! before file offsets are assigned, and the offset assigner works over the
//! final compressed sizes.

pub mod relocations;
pub mod addresses;
pub mod fileinfo;
pub mod crcs;
pub mod header;
pub mod compress;
pub mod layout;
